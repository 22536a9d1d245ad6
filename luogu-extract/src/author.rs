use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of an article, paste or log entry, whichever field it came from.
///
/// `uid` is `None` when the source omitted it or it held no leading integer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub uid: Option<i64>,
    pub name: Option<String>,
    pub color: Option<Value>,
}

/// Coalesce `record.author` / `record.user` into an [`AuthorInfo`].
///
/// `author` wins when both are set. A missing record, or one with neither
/// field, produces an all-missing author rather than an error.
pub fn normalize_author(record: Option<&Value>) -> AuthorInfo {
    let source = record.and_then(|r| {
        r.get("author")
            .filter(|v| is_truthy(v))
            .or_else(|| r.get("user").filter(|v| is_truthy(v)))
    });
    let Some(source) = source else {
        return AuthorInfo::default();
    };

    AuthorInfo {
        uid: source.get("uid").and_then(parse_uid),
        name: source.get("name").and_then(Value::as_str).map(str::to_string),
        color: source.get("color").filter(|v| !v.is_null()).cloned(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Integer prefix of a uid, accepting numbers and numeric strings alike.
fn parse_uid(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
