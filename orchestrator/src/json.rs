//! Decoding of the JSON payloads embedded in requests.
//!
//! Payloads arrive as strings inside the request. Blank strings are valid and
//! decode to an empty object or array.

use std::fmt;

use serde_json::{Map, Value};

/// A decoding failure for a request payload.
#[derive(Debug)]
pub enum JsonError {
    /// The text is not JSON.
    Syntax(serde_json::Error),
    /// The text is JSON but not an object.
    NotAnObject,
    /// The text is JSON but not an array.
    NotAnArray,
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(e) => write!(f, "Invalid JSON: {e}"),
            Self::NotAnObject => write!(f, "Invalid JSON object."),
            Self::NotAnArray => write!(f, "Invalid JSON array."),
        }
    }
}

impl std::error::Error for JsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for JsonError {
    fn from(e: serde_json::Error) -> Self {
        Self::Syntax(e)
    }
}

/// Decodes any JSON text. Blank text decodes to `null`.
pub fn parse(text: &str) -> Result<Value, JsonError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Decodes a JSON object. Blank text decodes to an empty object.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, JsonError> {
    match parse(text)? {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        _ => Err(JsonError::NotAnObject),
    }
}

/// Decodes a JSON array. Blank text decodes to an empty array.
pub fn parse_array(text: &str) -> Result<Vec<Value>, JsonError> {
    match parse(text)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        _ => Err(JsonError::NotAnArray),
    }
}

/// Reads a string field, treating absent and blank values alike.
pub fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
