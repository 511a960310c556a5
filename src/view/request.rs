//! JSON wire types for one request/response exchange.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::ViewError;
use crate::tree::node::PATH_SEPARATOR;

/// Key holding child components in a rendered or snapshot component.
pub const COMPONENTS_KEY: &str = "components";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Request body: the triggering event plus component snapshots.
///
/// Top-level snapshot keys are component paths; a snapshot may nest child
/// snapshots under `components`, keyed by child name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    pub event: Option<EventRequest>,
    #[serde(default)]
    pub components: Map<String, Value>,
}

impl ViewRequest {
    pub fn from_value(value: &Value) -> Result<Self, ViewError> {
        Ok(Self::deserialize(value)?)
    }
}

/// The event to dispatch. A null component broadcasts to every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub event_name: String,
    #[serde(default)]
    pub event_component: Option<String>,
    #[serde(default, deserialize_with = "stringified")]
    pub event_args: Vec<String>,
}

/// Event arguments of any JSON type, as strings.
fn stringified<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// One entry of the response `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub code: String,
    pub message: String,
}

impl From<&ViewError> for ResponseError {
    fn from(err: &ViewError) -> Self {
        Self {
            component: err.component().map(str::to_owned),
            code: err.code().to_owned(),
            message: err.to_string(),
        }
    }
}

/// Response body: rendered component tree plus transport metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewResponse {
    pub components: Map<String, Value>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ResponseError>,
}

impl ViewResponse {
    /// A response carrying only an error; nothing is rendered.
    pub fn failure(err: &ViewError) -> Self {
        Self {
            components: Map::new(),
            success: false,
            errors: vec![err.into()],
        }
    }

    /// Rendered component at a dotted path.
    pub fn component(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let mut current = self.components.get(segments.next()?)?;
        for segment in segments {
            current = current.get(COMPONENTS_KEY)?.get(segment)?;
        }
        Some(current)
    }

    /// Rendered content of the component at a dotted path.
    pub fn content(&self, path: &str) -> Option<&Value> {
        self.component(path)?.get("content")
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
