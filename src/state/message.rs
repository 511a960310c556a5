//! User-facing messages attached to a component state.

use serde::{Deserialize, Serialize};

/// Severity of a state message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Success,
    Failure,
    Info,
}

/// A message rendered next to a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    pub title: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
}

impl StateMessage {
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: content.into(),
            message_type,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self::new(MessageType::Failure, content)
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(MessageType::Info, content)
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::new(MessageType::Success, content)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.message_type == MessageType::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_type_lowercase() {
        let message = StateMessage::failure("Code not found").with_title("Error");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"title": "Error", "content": "Code not found", "type": "failure"})
        );
        assert!(message.is_failure());
        assert!(!StateMessage::info("x").is_failure());
    }
}
