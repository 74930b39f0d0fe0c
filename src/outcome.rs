//! Outcome of a mutating ledger call.
//!
//! The ledger answers mutations in more than one shape: a bare string, or a
//! tagged `{"Ok": msg}` / `{"Err": msg}`. Decode once here; nothing else
//! looks at the raw reply.

use serde_json::Value;
use std::fmt;

const UNKNOWN: &str = "Unknown error.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Plain(String),
    Success(String),
    Failure(String),
    Unknown,
}

impl Outcome {
    pub fn decode(raw: &Value) -> Self {
        if let Some(text) = raw.as_str() {
            return Outcome::Plain(text.to_string());
        }
        // Empty payloads count as missing, same as an absent tag.
        if let Some(err) = tag(raw, "Err") {
            return Outcome::Failure(err);
        }
        if let Some(ok) = tag(raw, "Ok") {
            return Outcome::Success(ok);
        }
        Outcome::Unknown
    }

    pub fn is_failure(&self) -> bool { matches!(self, Outcome::Failure(_) | Outcome::Unknown) }

    pub fn message(&self) -> String {
        match self {
            Outcome::Plain(text) | Outcome::Success(text) => text.clone(),
            Outcome::Failure(err) => format!("Error: {err}"),
            Outcome::Unknown => UNKNOWN.to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.message()) }
}

fn tag(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}
