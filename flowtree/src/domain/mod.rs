//! Domain layer: node tree, events and layout
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod event;
pub mod layout;
pub mod tree;

pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use layout::{
    display_text, layout_node, layout_tree, ChildRow, LayoutMetrics, LayoutOptions, NodeLayout,
    Spine, ELLIPSIS,
};
pub use tree::{Node, NodeId, NodePatch, Tree, TreeIter, DEFAULT_ROOT_LABEL};
