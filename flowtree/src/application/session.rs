//! Session controller: the single owner of the editable state.
//!
//! The host keeps one [`Session`], feeds it [`Event`]s and asks for a
//! fresh [`NodeLayout`] after every applied event.

use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::{layout_tree, Event, LayoutMetrics, LayoutOptions, NodeId, NodeLayout, Tree};

/// Default limit on tree levels a session lets `AddChild` create.
///
/// Layout, rendering and dropping a tree recurse once per level.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// The label edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub node: NodeId,
    /// Live text of the edit box
    pub buffer: String,
}

/// What [`Session::apply`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No node with that id
    UnknownNode,
    /// Edit event for a node that is not being edited
    NotEditing,
    /// The event would not change anything
    Unchanged,
    /// The new child would lie below the session's depth limit
    TooDeep,
}

/// Current tree, display flag and the one edit in progress.
///
/// Every transition replaces the tree wholesale; old trees handed out by
/// [`Session::tree`] stay valid and share unchanged subtrees with the new
/// one.
#[derive(Debug, Clone)]
pub struct Session {
    tree: Tree,
    truncate: bool,
    edit: Option<EditSession>,
    metrics: LayoutMetrics,
    max_depth: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Tree::default(), false, LayoutMetrics::default())
    }
}

impl Session {
    pub fn new(tree: Tree, truncate: bool, metrics: LayoutMetrics) -> Self {
        Self {
            tree,
            truncate,
            edit: None,
            metrics,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Levels `AddChild` may grow the tree to, the root being level 1.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Tree::new(settings.root_label.clone()),
            settings.truncate,
            settings.metrics,
        )
        .with_max_depth(settings.max_depth)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn truncate(&self) -> bool {
        self.truncate
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Edit in progress, if any.
    pub fn edit(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.edit.as_ref().map(|edit| edit.node)
    }

    /// Reduces one event into the next state.
    #[instrument(level = "debug", skip_all, fields(%event))]
    pub fn apply(&mut self, event: Event) -> Outcome {
        let outcome = match event {
            Event::BeginEdit(id) => self.reduce_begin_edit(id),
            Event::EditBuffer(id, text) => self.reduce_edit_buffer(id, text),
            Event::CommitEdit(id, text) => self.reduce_commit_edit(id, &text),
            Event::CancelEdit(id) => self.reduce_cancel_edit(id),
            Event::AddChild(id) => self.reduce_add_child(id),
            Event::ToggleVisibility(id) => self.reduce_toggle_visibility(id),
            Event::SetTruncateMode(on) => self.reduce_set_truncate(on),
        };
        if let Outcome::Ignored(reason) = outcome {
            debug!(?reason, "event ignored");
        }
        outcome
    }

    /// Derives the geometry of the current state from scratch.
    pub fn layout(&self) -> NodeLayout {
        let mut options = LayoutOptions::new(self.truncate, &self.metrics);
        if let Some(edit) = &self.edit {
            options = options.with_edit(edit.node, &edit.buffer);
        }
        layout_tree(&self.tree, &options)
    }

    fn reduce_begin_edit(&mut self, id: NodeId) -> Outcome {
        let Some(node) = self.tree.find(id) else {
            return Outcome::Ignored(IgnoreReason::UnknownNode);
        };
        if self.editing() == Some(id) {
            return Outcome::Ignored(IgnoreReason::Unchanged);
        }
        let buffer = node.label().to_string();

        // Leaving a pending edit behaves like the edit box losing focus.
        if let Some(pending) = self.edit.take() {
            debug!(node = %pending.node, "committing pending edit");
            self.tree = self.tree.commit_edit(pending.node, &pending.buffer);
        }

        self.tree = self.tree.begin_edit(id);
        self.edit = Some(EditSession { node: id, buffer });
        Outcome::Applied
    }

    fn reduce_edit_buffer(&mut self, id: NodeId, text: String) -> Outcome {
        match self.edit.as_mut() {
            Some(edit) if edit.node == id => {
                edit.buffer = text;
                Outcome::Applied
            }
            _ => Outcome::Ignored(IgnoreReason::NotEditing),
        }
    }

    fn reduce_commit_edit(&mut self, id: NodeId, text: &str) -> Outcome {
        if self.editing() != Some(id) {
            return Outcome::Ignored(IgnoreReason::NotEditing);
        }
        self.tree = self.tree.commit_edit(id, text);
        self.edit = None;
        Outcome::Applied
    }

    fn reduce_cancel_edit(&mut self, id: NodeId) -> Outcome {
        if self.editing() != Some(id) {
            return Outcome::Ignored(IgnoreReason::NotEditing);
        }
        self.tree = self.tree.cancel_edit(id);
        self.edit = None;
        Outcome::Applied
    }

    fn reduce_add_child(&mut self, id: NodeId) -> Outcome {
        let Some(path) = self.tree.path_to(id) else {
            return Outcome::Ignored(IgnoreReason::UnknownNode);
        };
        if path.len() >= self.max_depth {
            return Outcome::Ignored(IgnoreReason::TooDeep);
        }
        self.tree = self.tree.insert_child(id);
        Outcome::Applied
    }

    fn reduce_toggle_visibility(&mut self, id: NodeId) -> Outcome {
        if !self.tree.contains(id) {
            return Outcome::Ignored(IgnoreReason::UnknownNode);
        }
        self.tree = self.tree.toggle_visibility(id);
        Outcome::Applied
    }

    fn reduce_set_truncate(&mut self, on: bool) -> Outcome {
        if self.truncate == on {
            return Outcome::Ignored(IgnoreReason::Unchanged);
        }
        self.truncate = on;
        Outcome::Applied
    }
}
