//! Dotted-path traversal.

use super::arena::PatternTree;
use super::node::{PatternId, PATH_SEPARATOR};

impl PatternTree {
    /// Resolve `a.b.c` by walking from the root named `a` through children.
    ///
    /// Unlike [`PatternTree::find`], this never consults the path index and
    /// stops at the first missing segment.
    pub fn resolve_path(&self, path: &str) -> Option<PatternId> {
        let mut segments = path.split(PATH_SEPARATOR);
        let root = segments.next()?;
        let mut current = self.root_by_name(root)?;
        for segment in segments {
            current = self.child_by_name(current, segment)?;
        }
        Some(current)
    }
}
