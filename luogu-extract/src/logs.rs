//! Judgement log collections and the pure strategies that locate them.
//!
//! Every strategy has the shape `(&Value) -> Option<LogCollection>` so the
//! classifier can walk them as an ordered table and each one can be tested on
//! its own.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const LOGS_KEY: &str = "logs";

/// Paths probed, in order, when neither `data.logs` nor a top-level `logs`
/// is present.
pub const CANDIDATE_PATHS: [&str; 3] = ["data", "currentData", "result"];

/// A JSON object whose `logs` field is guaranteed to be an array.
///
/// The remaining fields of the source object are kept untouched, so a
/// collection lifted from `payload.data` serializes back to that object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LogCollection {
    fields: Map<String, Value>,
}

impl LogCollection {
    /// `{"logs": []}`, the "no logs yet" state.
    pub fn empty() -> Self {
        let mut fields = Map::new();
        fields.insert(LOGS_KEY.to_string(), Value::Array(Vec::new()));
        Self { fields }
    }

    /// Copy `candidate` when it is an object carrying a `logs` array.
    pub fn from_candidate(candidate: &Value) -> Option<Self> {
        candidate
            .as_object()
            .filter(|fields| fields.get(LOGS_KEY).is_some_and(Value::is_array))
            .map(|fields| Self {
                fields: fields.clone(),
            })
    }

    pub fn logs(&self) -> &[Value] {
        self.fields
            .get(LOGS_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.logs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs().is_empty()
    }

    /// Any other field the source object carried next to `logs`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Decode every entry into `T`.
    pub fn entries<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        self.logs()
            .iter()
            .map(|entry| T::deserialize(entry))
            .collect()
    }
}

impl TryFrom<Value> for LogCollection {
    type Error = Value;

    /// Hands the value back unchanged when it is not a log collection.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) if fields.get(LOGS_KEY).is_some_and(Value::is_array) => {
                Ok(Self { fields })
            }
            other => Err(other),
        }
    }
}

impl From<LogCollection> for Value {
    fn from(collection: LogCollection) -> Self {
        collection.into_value()
    }
}

pub type LogStrategy = fn(&Value) -> Option<LogCollection>;

/// Strategies applied to an already-decoded judgement payload, in priority
/// order. The first hit wins.
pub const JSON_STRATEGIES: [(&str, LogStrategy); 3] = [
    ("data.logs", nested_data_logs),
    ("top-level logs", top_level_logs),
    ("candidate path", candidate_path_logs),
];

/// `payload.data` when `payload.data.logs` is an array.
pub fn nested_data_logs(payload: &Value) -> Option<LogCollection> {
    payload.get("data").and_then(LogCollection::from_candidate)
}

/// `payload` itself when it carries `logs` at the top level.
pub fn top_level_logs(payload: &Value) -> Option<LogCollection> {
    LogCollection::from_candidate(payload)
}

/// First of `data`, `currentData`, `result` whose `logs` is an array.
pub fn candidate_path_logs(payload: &Value) -> Option<LogCollection> {
    CANDIDATE_PATHS
        .iter()
        .find_map(|path| payload.get(*path).and_then(LogCollection::from_candidate))
}

/// Recognizer shared by the hydration root and every fallback element:
/// `{logs}`, then `{data: {logs}}`, then `{currentData: {logs}}`.
pub fn recognize_logs(candidate: &Value) -> Option<LogCollection> {
    LogCollection::from_candidate(candidate)
        .or_else(|| candidate.get("data").and_then(LogCollection::from_candidate))
        .or_else(|| {
            candidate
                .get("currentData")
                .and_then(LogCollection::from_candidate)
        })
}
