//! Text rendering of trees and layouts via `termtree`.

use termtree::Tree;

use crate::domain::{Node, NodeLayout};

/// Logical tree: every node with its id; collapsed subtrees are folded
/// into a single marker line.
pub fn render_tree(node: &Node) -> Tree<String> {
    let mut line = format!("{} [{}]", node.label(), node.id());
    if node.is_editing() {
        line.push_str(" (editing)");
    }
    if !node.children_visible() && !node.is_leaf() {
        line.push_str(&format!(" (+{} hidden)", node.child_count()));
        return Tree::new(line);
    }

    let leaves: Vec<_> = node.children().iter().map(|child| render_tree(child)).collect();
    Tree::new(line).with_leaves(leaves)
}

/// Geometry view: box text and width per node, spine and offsets per row.
pub fn render_layout(layout: &NodeLayout) -> Tree<String> {
    render_layout_at(layout, None)
}

fn render_layout_at(layout: &NodeLayout, offset: Option<f64>) -> Tree<String> {
    let mut line = format!("{:?} [{}] w={:.1}", layout.text, layout.id, layout.width);
    if let Some(offset) = offset {
        line.push_str(&format!(" x={offset:+.1}"));
    }
    if layout.tooltip.is_some() {
        line.push_str(" (elided)");
    }
    if layout.editing {
        line.push_str(" (editing)");
    }

    let Some(row) = &layout.child_row else {
        return Tree::new(line);
    };
    if let Some(spine) = &row.spine {
        let ticks: Vec<String> = spine.ticks.iter().map(|t| format!("{t:.1}")).collect();
        line.push_str(&format!(" spine={:.1} ticks=[{}]", spine.length, ticks.join(", ")));
    }

    let leaves: Vec<_> = row
        .children
        .iter()
        .zip(&row.offsets)
        .map(|(child, offset)| render_layout_at(child, Some(*offset)))
        .collect();
    Tree::new(line).with_leaves(leaves)
}
