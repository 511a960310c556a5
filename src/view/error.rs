//! View-level errors.

use crate::pattern::OptionError;
use crate::state::StateError;

/// Errors raised while defining, initializing or serving a view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Initialization stopped making progress: the listed patterns depend on
    /// each other.
    #[error("view `{view}` cannot be initialized, unresolved dependencies among: {}", .pending.join(", "))]
    DependencyCycle { view: String, pending: Vec<String> },

    #[error("event `{event}` not found on component `{component}`")]
    EventNotFound { component: String, event: String },

    #[error("component `{0}` not found")]
    ComponentNotFound(String),

    #[error("duplicate component path `{0}`")]
    DuplicatePath(String),

    #[error("invalid component name `{0}`")]
    InvalidName(String),

    #[error("component `{0}` cannot have children")]
    NotAContainer(String),

    #[error("view `{0}` is not initialized")]
    NotInitialized(String),

    #[error("component `{0}` has no data definition")]
    MissingDataDefinition(String),

    #[error("component `{component}` references unknown model `{model}`")]
    UnknownModel { component: String, model: String },

    #[error("component `{component}` references unknown field `{field}`")]
    UnknownField { component: String, field: String },

    #[error("component `{component}` has invalid source reference `{reference}`")]
    InvalidSourceReference { component: String, reference: String },

    #[error("invalid argument `{argument}` for event `{event}` of `{component}`")]
    InvalidEventArgument {
        component: String,
        event: String,
        argument: String,
    },

    #[error("component `{0}` is not a lookup")]
    NotALookup(String),

    #[error("hook `{hook}` failed: {message}")]
    Hook { hook: String, message: String },

    #[error(transparent)]
    Option(#[from] OptionError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("malformed request: {0}")]
    Request(#[from] serde_json::Error),
}

impl ViewError {
    /// Stable code sent to the client in the response `errors` array.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DependencyCycle { .. } => "dependencyCycle",
            Self::EventNotFound { .. } => "eventNotFound",
            Self::ComponentNotFound(_) => "componentNotFound",
            Self::DuplicatePath(_) => "duplicatePath",
            Self::InvalidName(_) => "invalidName",
            Self::NotAContainer(_) => "notAContainer",
            Self::NotInitialized(_) => "notInitialized",
            Self::MissingDataDefinition(_) => "missingDataDefinition",
            Self::UnknownModel { .. } => "unknownModel",
            Self::UnknownField { .. } => "unknownField",
            Self::InvalidSourceReference { .. } => "invalidSourceReference",
            Self::InvalidEventArgument { .. } => "invalidEventArgument",
            Self::NotALookup(_) => "notALookup",
            Self::Hook { .. } => "hookFailed",
            Self::Option(_) => "invalidOption",
            Self::State(StateError::Malformed { .. }) => "malformedState",
            Self::State(StateError::ValueNotSupported { .. }) => "valueNotSupported",
            Self::Request(_) => "malformedRequest",
        }
    }

    /// Path of the component the error is about, when there is one.
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::EventNotFound { component, .. }
            | Self::UnknownModel { component, .. }
            | Self::UnknownField { component, .. }
            | Self::InvalidSourceReference { component, .. }
            | Self::InvalidEventArgument { component, .. } => Some(component),
            Self::ComponentNotFound(path)
            | Self::DuplicatePath(path)
            | Self::NotAContainer(path)
            | Self::MissingDataDefinition(path)
            | Self::NotALookup(path) => Some(path),
            Self::State(StateError::Malformed { path, .. })
            | Self::State(StateError::ValueNotSupported { path }) => Some(path),
            _ => None,
        }
    }

    /// Error raised by a hook or listener with a free-form message.
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}
