//! Engine configuration.
//!
//! [`ViewConfig`] is attached to a [`ViewDefinition`](crate::view::ViewDefinition)
//! and copied into every lookup popup synthesized from it. It can be built
//! in code or loaded from JSON, where every key is optional.

use serde::{Deserialize, Serialize};

/// Configuration for pattern initialization and widget defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Consecutive initialization passes without progress before the view
    /// is declared cyclic.
    pub max_stalled_passes: usize,
    /// Grid page size when the grid pattern does not set `maxEntities`.
    pub default_page_size: usize,
    /// Whether lookup code searches match codes by prefix (`code*`).
    pub lookup_prefix_search: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_stalled_passes: 3,
            default_page_size: 30,
            lookup_prefix_search: true,
        }
    }
}

impl ViewConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the stalled pass limit (builder). Values below 1 are raised to 1.
    pub fn with_max_stalled_passes(mut self, passes: usize) -> Self {
        self.max_stalled_passes = passes.max(1);
        self
    }

    /// Set the default grid page size (builder).
    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Enable or disable prefix matching of lookup codes (builder).
    pub fn with_lookup_prefix_search(mut self, prefix: bool) -> Self {
        self.lookup_prefix_search = prefix;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ViewConfig::new();
        assert_eq!(config.max_stalled_passes, 3);
        assert_eq!(config.default_page_size, 30);
        assert!(config.lookup_prefix_search);
    }

    #[test]
    fn builder_chain() {
        let config = ViewConfig::new()
            .with_max_stalled_passes(5)
            .with_default_page_size(10)
            .with_lookup_prefix_search(false);
        assert_eq!(config.max_stalled_passes, 5);
        assert_eq!(config.default_page_size, 10);
        assert!(!config.lookup_prefix_search);
    }

    #[test]
    fn stalled_passes_at_least_one() {
        assert_eq!(ViewConfig::new().with_max_stalled_passes(0).max_stalled_passes, 1);
    }

    #[test]
    fn from_partial_json() {
        let config = ViewConfig::from_json(r#"{"defaultPageSize": 50}"#).unwrap();
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.max_stalled_passes, 3);
        assert!(config.lookup_prefix_search);
    }

    #[test]
    fn from_invalid_json() {
        assert!(ViewConfig::from_json(r#"{"defaultPageSize": "many"}"#).is_err());
    }
}
