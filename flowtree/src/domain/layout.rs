//! Top-down flowchart layout.
//!
//! [`layout_node`] is a pure function of a node, its depth and the
//! display options. It is recomputed from the whole tree after every
//! change; nothing here is cached.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::tree::{Node, NodeId, Tree};

/// Appended to labels cut at [`LayoutMetrics::truncate_at`].
pub const ELLIPSIS: &str = "...";

/// Geometry constants, all lengths in the same abstract unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    /// Lower bound for any box width
    pub min_width: f64,
    /// Width contributed by each character of box text
    pub char_width: f64,
    /// Horizontal padding added to the text width
    pub padding: f64,
    /// Distance between neighbouring child ticks on the spine
    pub child_spacing: f64,
    /// Extra spine length beyond the outermost ticks
    pub spine_pad: f64,
    /// Labels longer than this many characters are elided in truncate mode
    pub truncate_at: usize,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            min_width: 8.0,
            char_width: 0.7,
            padding: 4.0,
            child_spacing: 14.0,
            spine_pad: 6.0,
            truncate_at: 20,
        }
    }
}

impl LayoutMetrics {
    /// `max(min_width, chars * char_width + padding)`
    pub fn box_width(&self, text: &str) -> f64 {
        let chars = text.chars().count() as f64;
        (chars * self.char_width + self.padding).max(self.min_width)
    }

    /// Spine length for `child_count` children, `None` below two children.
    pub fn spine_length(&self, child_count: usize) -> Option<f64> {
        (child_count >= 2)
            .then(|| (child_count - 1) as f64 * self.child_spacing + self.spine_pad)
    }
}

/// Inputs of a layout pass besides the tree itself.
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions<'a> {
    pub truncate: bool,
    pub metrics: &'a LayoutMetrics,
    /// Node being edited and its live buffer
    pub edit: Option<(NodeId, &'a str)>,
}

impl<'a> LayoutOptions<'a> {
    pub fn new(truncate: bool, metrics: &'a LayoutMetrics) -> Self {
        Self {
            truncate,
            metrics,
            edit: None,
        }
    }

    pub fn with_edit(mut self, id: NodeId, buffer: &'a str) -> Self {
        self.edit = Some((id, buffer));
        self
    }
}

/// Horizontal line joining the child ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Spine {
    pub length: f64,
    /// Tick positions along the spine, one per child, left to right
    pub ticks: Vec<f64>,
}

/// Geometry below a node whose children are shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRow {
    /// Absent with a single child
    pub spine: Option<Spine>,
    /// Child centers relative to the parent's center
    pub offsets: Vec<f64>,
    pub children: Vec<NodeLayout>,
}

/// Everything a renderer needs to draw one box and its connectors.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: NodeId,
    pub depth: usize,
    /// Text shown in the box: the edit buffer while editing, otherwise the
    /// (possibly elided) label
    pub text: String,
    /// Full label when `text` was elided
    pub tooltip: Option<String>,
    pub width: f64,
    pub editing: bool,
    /// Vertical line from the parent's spine, absent on the root
    pub connector_above: bool,
    /// Present iff the node has children and they are visible
    pub child_row: Option<ChildRow>,
}

impl NodeLayout {
    /// Pre-order walk over this layout and all visible descendants.
    pub fn iter(&self) -> impl Iterator<Item = &NodeLayout> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let current = stack.pop()?;
            if let Some(row) = &current.child_row {
                stack.extend(row.children.iter().rev());
            }
            Some(current)
        })
    }

    pub fn find(&self, id: NodeId) -> Option<&NodeLayout> {
        self.iter().find(|layout| layout.id == id)
    }

    /// Number of boxes drawn.
    pub fn visible_count(&self) -> usize {
        self.iter().count()
    }
}

/// Display text and tooltip for `label`.
pub fn display_text(label: &str, truncate: bool, limit: usize) -> (String, Option<String>) {
    if !truncate || label.chars().count() <= limit {
        return (label.to_string(), None);
    }
    let mut shown: String = label.chars().take(limit).collect();
    shown.push_str(ELLIPSIS);
    (shown, Some(label.to_string()))
}

/// Lays out the whole tree starting at depth 0.
#[instrument(level = "debug", skip_all, fields(truncate = options.truncate))]
pub fn layout_tree(tree: &Tree, options: &LayoutOptions<'_>) -> NodeLayout {
    layout_node(tree.root(), 0, options)
}

/// Lays out `node` and its visible subtree.
pub fn layout_node(node: &Node, depth: usize, options: &LayoutOptions<'_>) -> NodeLayout {
    let metrics = options.metrics;
    let buffer = options
        .edit
        .filter(|(id, _)| *id == node.id())
        .map(|(_, buffer)| buffer)
        .or_else(|| node.is_editing().then(|| node.label()));

    let (text, tooltip) = match buffer {
        Some(buffer) => (buffer.to_string(), None),
        None => display_text(node.label(), options.truncate, metrics.truncate_at),
    };
    let width = metrics.box_width(&text);

    let child_row = (!node.is_leaf() && node.children_visible())
        .then(|| layout_child_row(node, depth, options));

    NodeLayout {
        id: node.id(),
        depth,
        text,
        tooltip,
        width,
        editing: buffer.is_some(),
        connector_above: depth > 0,
        child_row,
    }
}

fn layout_child_row(node: &Node, depth: usize, options: &LayoutOptions<'_>) -> ChildRow {
    let metrics = options.metrics;
    let count = node.child_count();
    let ticks: Vec<f64> = (0..count).map(|i| i as f64 * metrics.child_spacing).collect();
    // center the group under the parent
    let half_span = (count - 1) as f64 * metrics.child_spacing / 2.0;
    let offsets = ticks.iter().map(|tick| tick - half_span).collect();

    let spine = metrics
        .spine_length(count)
        .map(|length| Spine { length, ticks });

    let children = node
        .children()
        .iter()
        .map(|child| layout_node(child, depth + 1, options))
        .collect();

    ChildRow {
        spine,
        offsets,
        children,
    }
}
