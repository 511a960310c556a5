//! Node identity: PatternId and path helpers.

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a pattern in a view. Copy, lightweight (u64).
    pub struct PatternId;
}

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Whether `name` can be used as a component name.
///
/// Names are non-empty and must not contain the path separator.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(PATH_SEPARATOR)
}

/// Path of a child named `name` under `parent_path`.
pub fn child_path(parent_path: &str, name: &str) -> String {
    format!("{parent_path}{PATH_SEPARATOR}{name}")
}
