//! Pattern arena: slotmap-backed component tree with dotted-path lookup.

pub mod arena;
pub mod node;
pub mod path;

pub use arena::PatternTree;
pub use node::PatternId;
