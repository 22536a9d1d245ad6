use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::logs::LogCollection;

/// A response body as handed over by the transport.
///
/// `data` is either a decoded JSON value or markup/plain text carried as a
/// JSON string; its shape is only discovered during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub data: Value,
}

impl RawResponse {
    pub fn from_json(data: Value) -> Self {
        Self { data }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            data: Value::String(text.into()),
        }
    }

    /// Decode `body` as JSON when it is JSON, otherwise keep it as text.
    pub fn sniff(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(data) => Self::from_json(data),
            Err(_) => Self::from_text(body),
        }
    }
}

/// Which record the caller wants out of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseKind {
    Article,
    Paste,
    JudgementLog,
    UserProfile,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 4] = [
        ResponseKind::Article,
        ResponseKind::Paste,
        ResponseKind::JudgementLog,
        ResponseKind::UserProfile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::Article => "article",
            ResponseKind::Paste => "paste",
            ResponseKind::JudgementLog => "judgement-log",
            ResponseKind::UserProfile => "user-profile",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ResponseKind {
    type Err = UnknownKind;

    /// Accepts kebab/snake names and the numeric codes older callers used
    /// (`0` article, `1` paste, `3` judgement log, `4` user profile).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "article" | "0" => Ok(ResponseKind::Article),
            "paste" | "1" => Ok(ResponseKind::Paste),
            "judgement-log" | "judgement" | "3" => Ok(ResponseKind::JudgementLog),
            "user-profile" | "user" | "4" => Ok(ResponseKind::UserProfile),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Result of a successful normalization, one variant per kind.
///
/// Article, paste and user profile lookups propagate an absent field as
/// `None` rather than failing.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedValue {
    Article(Option<Value>),
    Paste(Option<Value>),
    JudgementLog(LogCollection),
    UserProfile(Option<Value>),
}

impl ExtractedValue {
    pub fn kind(&self) -> ResponseKind {
        match self {
            ExtractedValue::Article(_) => ResponseKind::Article,
            ExtractedValue::Paste(_) => ResponseKind::Paste,
            ExtractedValue::JudgementLog(_) => ResponseKind::JudgementLog,
            ExtractedValue::UserProfile(_) => ResponseKind::UserProfile,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ExtractedValue::Article(v) | ExtractedValue::Paste(v) | ExtractedValue::UserProfile(v) => v,
            ExtractedValue::JudgementLog(logs) => Some(logs.into_value()),
        }
    }

    pub fn into_logs(self) -> Option<LogCollection> {
        match self {
            ExtractedValue::JudgementLog(logs) => Some(logs),
            _ => None,
        }
    }
}
