//! Immutable-update node tree.
//!
//! Every mutation returns a new [`Tree`]. Only the nodes on the path from
//! the root to the target are rebuilt; all other subtrees are shared with
//! the previous tree through their `Rc`, so `Rc::ptr_eq` tells a renderer
//! which subtrees are untouched.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::{debug, instrument, trace};

use crate::domain::error::DomainError;

/// Label given to the root when nothing else is configured.
pub const DEFAULT_ROOT_LABEL: &str = "Start";

/// Opaque node identifier, unique within a tree and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Fixed id of the root node.
    pub const ROOT: NodeId = NodeId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "root")
        } else {
            write!(f, "n{}", self.0)
        }
    }
}

impl FromStr for NodeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "root" {
            return Ok(Self::ROOT);
        }
        s.strip_prefix('n')
            .and_then(|digits| digits.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .map(NodeId)
            .ok_or_else(|| DomainError::InvalidNodeId(s.to_string()))
    }
}

/// A labeled node owning its ordered children.
///
/// Fields are read-only from outside the crate; new states are produced
/// through [`Tree`] operations only.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    label: String,
    children: Vec<Rc<Node>>,
    editing: bool,
    children_visible: bool,
}

impl Node {
    fn leaf(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            children: Vec::new(),
            editing: false,
            children_visible: true,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Children in creation order (left to right).
    pub fn children(&self) -> &[Rc<Node>] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// A node without children is a leaf, whatever its visibility flag says.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn children_visible(&self) -> bool {
        self.children_visible
    }

    /// Shallow merge: every `Some` field of the patch replaces ours.
    fn patched(&self, patch: &NodePatch) -> Self {
        Self {
            id: self.id,
            label: patch.label.clone().unwrap_or_else(|| self.label.clone()),
            children: self.children.clone(),
            editing: patch.editing.unwrap_or(self.editing),
            children_visible: patch.children_visible.unwrap_or(self.children_visible),
        }
    }

    /// Same content, one child slot swapped.
    fn with_child_replaced(&self, index: usize, child: Rc<Node>) -> Self {
        let mut children = self.children.clone();
        children[index] = child;
        Self {
            id: self.id,
            label: self.label.clone(),
            children,
            editing: self.editing,
            children_visible: self.children_visible,
        }
    }
}

/// Field-wise update for [`Tree::update`]. `None` leaves the field as is.
///
/// There is no way to patch `id` or `children`: updates never change the
/// shape of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub editing: Option<bool>,
    pub children_visible: Option<bool>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = Some(editing);
        self
    }

    pub fn children_visible(mut self, visible: bool) -> Self {
        self.children_visible = Some(visible);
        self
    }
}

/// Rooted, single-parent tree with structural sharing between versions.
///
/// Lookups and queries walk the tree with an explicit stack. Path copying,
/// layout and dropping recurse per level; `Session` bounds the depth a
/// host can grow through `AddChild`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: Rc<Node>,
    /// Lowest id never handed out by this tree lineage.
    next_id: u64,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_LABEL)
    }
}

impl Tree {
    pub fn new(root_label: impl Into<String>) -> Self {
        Self {
            root: Rc::new(Node::leaf(NodeId::ROOT, root_label)),
            next_id: 1,
        }
    }

    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    /// Depth-first lookup.
    pub fn find(&self, id: NodeId) -> Option<&Rc<Node>> {
        self.iter().map(|(_, node)| node).find(|node| node.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Ids from the root down to `id` (both inclusive).
    pub fn path_to(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        path_in(&self.root, id, &mut path).then_some(path)
    }

    /// Pre-order traversal yielding `(depth, node)`.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter {
            stack: vec![(0, &self.root)],
        }
    }

    /// Ids in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|(_, node)| node.id).collect()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Never true: the root exists for the whole session.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of levels; a lone root has depth 1.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(1)
    }

    /// Ids of nodes without children, left to right.
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.id)
            .collect()
    }

    /// Shallow-merges `patch` into the node with `id`.
    ///
    /// Ancestors are rebuilt, everything else is shared. An unknown id
    /// returns an identical tree.
    #[instrument(level = "debug", skip_all, fields(%id))]
    pub fn update(&self, id: NodeId, patch: &NodePatch) -> Self {
        match rebuild(&self.root, id, &|node: &Node| node.patched(patch)) {
            Some(root) => Self {
                root,
                next_id: self.next_id,
            },
            None => {
                debug!("update target not found, tree unchanged");
                self.clone()
            }
        }
    }

    /// Appends a new leaf `"Button {n+1}"` to `parent_id`.
    ///
    /// An unknown parent returns an identical tree.
    #[instrument(level = "debug", skip_all, fields(parent = %parent_id))]
    pub fn insert_child(&self, parent_id: NodeId) -> Self {
        let id = self.fresh_id();
        let appended = rebuild(&self.root, parent_id, &|parent: &Node| {
            let mut next = parent.clone();
            let label = format!("Button {}", parent.child_count() + 1);
            next.children.push(Rc::new(Node::leaf(id, label)));
            next
        });
        match appended {
            Some(root) => {
                trace!(child = %id, "child appended");
                Self {
                    root,
                    next_id: id.0 + 1,
                }
            }
            None => {
                debug!("parent not found, tree unchanged");
                self.clone()
            }
        }
    }

    /// Marks `id` as being edited.
    pub fn begin_edit(&self, id: NodeId) -> Self {
        self.update(id, &NodePatch::new().editing(true))
    }

    /// Finalizes a label edit.
    ///
    /// The text is trimmed. Non-empty text becomes the label; empty text
    /// keeps the previous label. Either way the node leaves edit mode.
    pub fn commit_edit(&self, id: NodeId, text: &str) -> Self {
        let trimmed = text.trim();
        let patch = if trimmed.is_empty() {
            debug!(%id, "empty label commit reverted");
            NodePatch::new().editing(false)
        } else {
            NodePatch::new().label(trimmed).editing(false)
        };
        self.update(id, &patch)
    }

    /// Leaves edit mode with the label untouched.
    pub fn cancel_edit(&self, id: NodeId) -> Self {
        self.update(id, &NodePatch::new().editing(false))
    }

    /// Flips `children_visible` on `id`.
    pub fn toggle_visibility(&self, id: NodeId) -> Self {
        match self.find(id) {
            Some(node) => {
                let visible = !node.children_visible;
                self.update(id, &NodePatch::new().children_visible(visible))
            }
            None => self.clone(),
        }
    }

    fn fresh_id(&self) -> NodeId {
        let mut candidate = NodeId(self.next_id);
        while self.contains(candidate) {
            candidate = NodeId(candidate.0 + 1);
        }
        candidate
    }
}

/// Rebuilds the path from `node` to `target`, applying `f` to the target.
///
/// Returns `None` when `target` is not below `node`; in that case nothing
/// has been allocated.
fn rebuild<F>(node: &Rc<Node>, target: NodeId, f: &F) -> Option<Rc<Node>>
where
    F: Fn(&Node) -> Node,
{
    if node.id == target {
        return Some(Rc::new(f(&**node)));
    }
    node.children.iter().enumerate().find_map(|(index, child)| {
        rebuild(child, target, f)
            .map(|new_child| Rc::new(node.with_child_replaced(index, new_child)))
    })
}

fn path_in(node: &Node, id: NodeId, path: &mut Vec<NodeId>) -> bool {
    path.push(node.id);
    if node.id == id || node.children.iter().any(|child| path_in(child, id, path)) {
        return true;
    }
    path.pop();
    false
}

/// Pre-order iterator over a [`Tree`].
pub struct TreeIter<'a> {
    stack: Vec<(usize, &'a Rc<Node>)>,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = (usize, &'a Rc<Node>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}
