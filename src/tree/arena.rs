//! Tree operations: insert, lookup, walk.

use std::collections::HashMap;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{child_path, is_valid_name, PatternId};
use crate::pattern::ComponentPattern;
use crate::view::ViewError;

/// Empty slice constant for returning when a pattern has no children.
const EMPTY_CHILDREN: &[PatternId] = &[];

/// The pattern tree of one view, backed by a slotmap arena.
///
/// Containers own their children; the parent link is a plain id stored in a
/// secondary map, so no pattern holds a reference to another. Every pattern's
/// dotted path is unique and indexed for O(1) lookup.
#[derive(Debug)]
pub struct PatternTree {
    nodes: SlotMap<PatternId, ComponentPattern>,
    children: SecondaryMap<PatternId, Vec<PatternId>>,
    parent: SecondaryMap<PatternId, PatternId>,
    roots: Vec<PatternId>,
    paths: HashMap<String, PatternId>,
}

impl PatternTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            roots: Vec::new(),
            paths: HashMap::new(),
        }
    }

    /// Insert a root-level pattern. Its path is its name.
    pub fn insert_root(&mut self, pattern: ComponentPattern) -> Result<PatternId, ViewError> {
        self.insert(None, pattern)
    }

    /// Insert a pattern as a child of the container `parent`.
    pub fn insert_child(
        &mut self,
        parent: PatternId,
        pattern: ComponentPattern,
    ) -> Result<PatternId, ViewError> {
        self.insert(Some(parent), pattern)
    }

    fn insert(
        &mut self,
        parent: Option<PatternId>,
        mut pattern: ComponentPattern,
    ) -> Result<PatternId, ViewError> {
        if !is_valid_name(pattern.name()) {
            return Err(ViewError::InvalidName(pattern.name().to_owned()));
        }

        let path = match parent {
            Some(parent_id) => {
                let parent = self
                    .nodes
                    .get(parent_id)
                    .ok_or_else(|| ViewError::ComponentNotFound(pattern.name().to_owned()))?;
                if !parent.kind().is_container() {
                    return Err(ViewError::NotAContainer(parent.path().to_owned()));
                }
                child_path(parent.path(), pattern.name())
            }
            None => pattern.name().to_owned(),
        };

        if self.paths.contains_key(&path) {
            return Err(ViewError::DuplicatePath(path));
        }

        pattern.attach(path.clone(), parent);
        let id = self.nodes.insert(pattern);
        self.children.insert(id, Vec::new());
        match parent {
            Some(parent_id) => {
                self.parent.insert(id, parent_id);
                if let Some(siblings) = self.children.get_mut(parent_id) {
                    siblings.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.paths.insert(path, id);
        Ok(id)
    }

    /// Get the parent of a pattern, if it has one.
    pub fn parent(&self, id: PatternId) -> Option<PatternId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a pattern in insertion order.
    pub fn children(&self, id: PatternId) -> &[PatternId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to its root, collecting ancestor ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: PatternId) -> Vec<PatternId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    pub fn get(&self, id: PatternId) -> Option<&ComponentPattern> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: PatternId) -> Option<&mut ComponentPattern> {
        self.nodes.get_mut(id)
    }

    /// Root patterns in insertion order.
    pub fn roots(&self) -> &[PatternId] {
        &self.roots
    }

    /// Number of patterns in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: PatternId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look a pattern up by its full dotted path.
    pub fn find(&self, path: &str) -> Option<PatternId> {
        self.paths.get(path).copied()
    }

    /// Root pattern with the given name.
    pub fn root_by_name(&self, name: &str) -> Option<PatternId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.nodes.get(id).is_some_and(|p| p.name() == name))
    }

    /// Direct child of `parent` with the given relative name.
    pub fn child_by_name(&self, parent: PatternId, name: &str) -> Option<PatternId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&id| self.nodes.get(id).is_some_and(|p| p.name() == name))
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: PatternId) -> Vec<PatternId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Pre-order depth-first traversal of every root, in root order.
    pub fn depth_first(&self) -> Vec<PatternId> {
        self.roots
            .iter()
            .flat_map(|&root| self.walk_depth_first(root))
            .collect()
    }
}

impl Default for PatternTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       window
    ///      /      \
    ///    form     grid
    ///   /    \
    ///  name  product
    /// ```
    fn build_tree() -> (PatternTree, [PatternId; 5]) {
        let mut tree = PatternTree::new();
        let window = tree.insert_root(ComponentPattern::window("window")).unwrap();
        let form = tree.insert_child(window, ComponentPattern::form("form")).unwrap();
        let grid = tree.insert_child(window, ComponentPattern::grid("grid")).unwrap();
        let name = tree.insert_child(form, ComponentPattern::field("name")).unwrap();
        let product = tree.insert_child(form, ComponentPattern::lookup("product")).unwrap();
        (tree, [window, form, grid, name, product])
    }

    #[test]
    fn debug_output_lists_patterns() {
        let (tree, _) = build_tree();
        let debug = format!("{tree:?}");
        assert!(debug.starts_with("PatternTree"));
        assert!(debug.contains("window.form.product"));
    }

    #[test]
    fn paths_are_prefixed_by_parent() {
        let (tree, [window, form, grid, name, product]) = build_tree();
        assert_eq!(tree.get(window).unwrap().path(), "window");
        assert_eq!(tree.get(form).unwrap().path(), "window.form");
        assert_eq!(tree.get(grid).unwrap().path(), "window.grid");
        assert_eq!(tree.get(name).unwrap().path(), "window.form.name");
        assert_eq!(tree.get(product).unwrap().path(), "window.form.product");
    }

    #[test]
    fn parent_links() {
        let (tree, [window, form, _, name, _]) = build_tree();
        assert_eq!(tree.parent(window), None);
        assert_eq!(tree.parent(form), Some(window));
        assert_eq!(tree.get(name).unwrap().parent(), Some(form));
        assert_eq!(tree.ancestors(name), vec![form, window]);
    }

    #[test]
    fn children_in_insertion_order() {
        let (tree, [window, form, grid, name, product]) = build_tree();
        assert_eq!(tree.children(window), &[form, grid]);
        assert_eq!(tree.children(form), &[name, product]);
        assert!(tree.children(name).is_empty());
    }

    #[test]
    fn find_by_path_and_name() {
        let (tree, [window, form, _, name, _]) = build_tree();
        assert_eq!(tree.find("window.form.name"), Some(name));
        assert_eq!(tree.find("window.missing"), None);
        assert_eq!(tree.root_by_name("window"), Some(window));
        assert_eq!(tree.child_by_name(window, "form"), Some(form));
        assert_eq!(tree.child_by_name(window, "name"), None);
    }

    #[test]
    fn depth_first_order() {
        let (tree, [window, form, grid, name, product]) = build_tree();
        assert_eq!(tree.depth_first(), vec![window, form, name, product, grid]);
        assert_eq!(tree.walk_depth_first(form), vec![form, name, product]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn duplicate_path_is_rejected() {
        let (mut tree, [_, form, ..]) = build_tree();
        let err = tree
            .insert_child(form, ComponentPattern::field("name"))
            .unwrap_err();
        assert!(matches!(err, ViewError::DuplicatePath(path) if path == "window.form.name"));
    }

    #[test]
    fn duplicate_root_is_rejected() {
        let (mut tree, _) = build_tree();
        assert!(matches!(
            tree.insert_root(ComponentPattern::field("window")),
            Err(ViewError::DuplicatePath(_))
        ));
    }

    #[test]
    fn leaf_cannot_have_children() {
        let (mut tree, [.., name, _]) = build_tree();
        let err = tree
            .insert_child(name, ComponentPattern::field("inner"))
            .unwrap_err();
        assert!(matches!(err, ViewError::NotAContainer(path) if path == "window.form.name"));
    }

    #[test]
    fn dotted_name_is_rejected() {
        let mut tree = PatternTree::new();
        assert!(matches!(
            tree.insert_root(ComponentPattern::field("a.b")),
            Err(ViewError::InvalidName(_))
        ));
        assert!(tree.is_empty());
    }
}
