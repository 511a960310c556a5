//! Typed reads over a JSON content payload.

use serde_json::{Map, Value};

use crate::model::EntityId;

/// Errors raised while applying client content to a state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Content missing a required key or holding a value of the wrong shape.
    #[error("malformed state of `{path}`: {reason}")]
    Malformed { path: String, reason: String },
    #[error("component `{path}` has no field value")]
    ValueNotSupported { path: String },
}

/// A content object plus the path of the component it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct Content<'a> {
    path: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Content<'a> {
    /// Wrap a payload, which must be a JSON object.
    pub fn new(path: &'a str, value: &'a Value) -> Result<Self, StateError> {
        match value {
            Value::Object(map) => Ok(Self { path, map }),
            other => Err(malformed(path, format!("expected an object, got {other}"))),
        }
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn malformed(&self, reason: impl Into<String>) -> StateError {
        malformed(self.path, reason)
    }

    /// A key that must be present, possibly null.
    pub fn required(&self, key: &str) -> Result<&'a Value, StateError> {
        self.map
            .get(key)
            .ok_or_else(|| self.malformed(format!("missing `{key}`")))
    }

    /// Text of a scalar. Missing and null read as `None`; numbers and
    /// booleans are stringified.
    pub fn string(&self, key: &str) -> Result<Option<String>, StateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(value.to_string())),
            Some(other) => Err(self.wrong_type(key, "a scalar", other)),
        }
    }

    /// Entity id: a number, a numeric string, `"null"`, `""` or null.
    pub fn id(&self, key: &str) -> Result<Option<EntityId>, StateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.malformed(format!("`{key}` is not a valid id: {number}"))),
            Some(Value::String(text)) => parse_id(text)
                .map_err(|_| self.malformed(format!("`{key}` is not a valid id: {text:?}"))),
            Some(other) => Err(self.wrong_type(key, "an id", other)),
        }
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, StateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(Value::String(text)) if text == "true" || text == "false" => {
                Ok(Some(text == "true"))
            }
            Some(other) => Err(self.wrong_type(key, "a boolean", other)),
        }
    }

    pub fn usize(&self, key: &str) -> Result<Option<usize>, StateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.wrong_type(key, "a count", &Value::Number(number.clone()))),
            Some(Value::String(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.malformed(format!("`{key}` is not a count: {text:?}"))),
            Some(other) => Err(self.wrong_type(key, "a count", other)),
        }
    }

    /// Nested object, sharing this content's path.
    pub fn object(&self, key: &str) -> Result<Option<Content<'a>>, StateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Object(_)) => Content::new(self.path, value).map(Some),
            Some(other) => Err(self.wrong_type(key, "an object", other)),
        }
    }

    pub fn array(&self, key: &str) -> Result<Option<&'a [Value]>, StateError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(self.wrong_type(key, "an array", other)),
        }
    }

    /// Every key with its text value, for flat string maps like grid filters.
    pub fn strings(&self) -> Result<Vec<(String, String)>, StateError> {
        self.map
            .keys()
            .filter_map(|key| match self.string(key) {
                Ok(Some(text)) => Some(Ok((key.clone(), text))),
                Ok(None) => None,
                Err(err) => Some(Err(err)),
            })
            .collect()
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &Value) -> StateError {
        self.malformed(format!("`{key}` must be {expected}, got {found}"))
    }
}

fn malformed(path: &str, reason: impl Into<String>) -> StateError {
    StateError::Malformed {
        path: path.to_owned(),
        reason: reason.into(),
    }
}

/// Parse an id sent as text. Empty and `"null"` mean no id.
pub fn parse_id(text: &str) -> Result<Option<EntityId>, std::num::ParseIntError> {
    match text.trim() {
        "" | "null" => Ok(None),
        digits => digits.parse().map(Some),
    }
}

/// Entity id held in a JSON value, as rendered by widgets.
pub fn value_as_id(value: &Value) -> Option<EntityId> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => parse_id(text).ok().flatten(),
        _ => None,
    }
}
