//! Tests for the path-copying node tree

use std::collections::HashSet;
use std::rc::Rc;

use rstest::{fixture, rstest};

use flowtree::domain::{NodeId, NodePatch, Tree};
use flowtree::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn id(s: &str) -> NodeId {
    s.parse().expect("valid node id")
}

// root
// ├── Button 1 (n1)
// │   ├── Button 1 (n3)
// │   └── Button 2 (n4)
// └── Button 2 (n2)
#[fixture]
fn tree() -> Tree {
    Tree::new("Start")
        .insert_child(NodeId::ROOT)
        .insert_child(NodeId::ROOT)
        .insert_child(id("n1"))
        .insert_child(id("n1"))
}

/// Every node not on the root→target path is the very same allocation.
fn assert_shared_off_path(before: &Tree, after: &Tree, target: NodeId) {
    let path: HashSet<NodeId> = before.path_to(target).unwrap_or_default().into_iter().collect();
    for (_, old) in before.iter() {
        let new = after.find(old.id()).expect("node survives");
        if path.contains(&old.id()) {
            assert!(!Rc::ptr_eq(old, new), "{} is on the path and must be rebuilt", old.id());
        } else {
            assert!(Rc::ptr_eq(old, new), "{} is off the path and must be shared", old.id());
        }
    }
}

fn shape(tree: &Tree) -> Vec<(NodeId, Vec<NodeId>)> {
    tree.iter()
        .map(|(_, node)| (node.id(), node.children().iter().map(|c| c.id()).collect()))
        .collect()
}

// ============================================================
// insert_child
// ============================================================

#[test]
fn given_root_when_inserting_twice_then_has_two_numbered_buttons() {
    let tree = Tree::new("Start")
        .insert_child(NodeId::ROOT)
        .insert_child(NodeId::ROOT);

    let root = tree.root();
    assert_eq!(root.label(), "Start");
    assert_eq!(root.child_count(), 2);
    assert_eq!(root.children()[0].label(), "Button 1");
    assert_eq!(root.children()[1].label(), "Button 2");
    assert_ne!(root.children()[0].id(), root.children()[1].id());
    for child in root.children() {
        assert!(child.is_leaf());
        assert!(!child.is_editing());
        assert!(child.children_visible());
    }
}

#[rstest]
fn given_tree_when_inserting_then_only_parent_path_is_rebuilt(tree: Tree) {
    let after = tree.insert_child(id("n2"));

    assert_shared_off_path(&tree, &after, id("n2"));
    let parent = after.find(id("n2")).unwrap();
    assert_eq!(parent.child_count(), 1);
    assert_eq!(parent.children()[0].label(), "Button 1");
}

#[rstest]
fn given_tree_when_inserting_then_existing_children_are_reused(tree: Tree) {
    let after = tree.insert_child(id("n1"));

    let old = tree.find(id("n1")).unwrap();
    let new = after.find(id("n1")).unwrap();
    assert_eq!(new.child_count(), 3);
    assert_eq!(new.children()[2].label(), "Button 3");
    for (a, b) in old.children().iter().zip(new.children()) {
        assert!(Rc::ptr_eq(a, b));
    }
}

#[rstest]
fn given_missing_parent_when_inserting_then_tree_is_unchanged(tree: Tree) {
    let after = tree.insert_child(id("n99"));

    assert!(Rc::ptr_eq(tree.root(), after.root()));
    assert_eq!(after, tree);
}

#[test]
fn given_many_inserts_when_collecting_ids_then_all_distinct() {
    let mut tree = Tree::default();
    // spread the inserts over every node that exists so far
    for round in 0..40 {
        let ids = tree.ids();
        let parent = ids[round % ids.len()];
        tree = tree.insert_child(parent);
    }

    let ids = tree.ids();
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(ids.len(), 41);
    assert_eq!(unique.len(), ids.len());
}

#[rstest]
fn given_old_version_when_inserting_again_then_ids_do_not_collide(tree: Tree) {
    // branching from the same version twice yields two independent trees
    let left = tree.insert_child(NodeId::ROOT);
    let right = tree.insert_child(id("n4"));
    let new_left = left.root().children()[2].id();
    let new_right = right.find(id("n4")).unwrap().children()[0].id();

    assert!(!tree.contains(new_left));
    assert!(!tree.contains(new_right));
}

// ============================================================
// update
// ============================================================

#[rstest]
fn given_nested_target_when_updating_then_siblings_are_shared(tree: Tree) {
    let after = tree.update(id("n4"), &NodePatch::new().label("Renamed"));

    assert_eq!(after.find(id("n4")).unwrap().label(), "Renamed");
    assert_shared_off_path(&tree, &after, id("n4"));
}

#[rstest]
#[case("root")]
#[case("n1")]
#[case("n2")]
#[case("n3")]
fn given_any_target_when_updating_then_shape_is_preserved(tree: Tree, #[case] target: &str) {
    let after = tree.update(
        id(target),
        &NodePatch::new()
            .label("X")
            .editing(true)
            .children_visible(false),
    );

    assert_eq!(shape(&after), shape(&tree));
    let node = after.find(id(target)).unwrap();
    assert_eq!(node.label(), "X");
    assert!(node.is_editing());
    assert!(!node.children_visible());
}

#[rstest]
fn given_partial_patch_when_updating_then_other_fields_kept(tree: Tree) {
    let after = tree.update(id("n1"), &NodePatch::new().editing(true));

    let node = after.find(id("n1")).unwrap();
    assert_eq!(node.label(), "Button 1");
    assert!(node.is_editing());
    assert!(node.children_visible());
}

#[rstest]
fn given_missing_id_when_updating_then_tree_is_unchanged(tree: Tree) {
    let after = tree.update(id("n42"), &NodePatch::new().label("ghost"));

    assert!(Rc::ptr_eq(tree.root(), after.root()));
    assert_eq!(after, tree);
    assert_eq!(after.len(), 5);
}

// ============================================================
// edit conventions
// ============================================================

#[rstest]
fn given_whitespace_commit_when_editing_then_label_kept_and_edit_ends(tree: Tree) {
    let editing = tree.begin_edit(id("n2"));
    assert!(editing.find(id("n2")).unwrap().is_editing());

    let after = editing.commit_edit(id("n2"), "  ");

    let node = after.find(id("n2")).unwrap();
    assert_eq!(node.label(), "Button 2");
    assert!(!node.is_editing());
}

#[rstest]
fn given_padded_text_when_committing_then_label_is_trimmed(tree: Tree) {
    let after = tree.begin_edit(id("n3")).commit_edit(id("n3"), "  Check stock \t");

    assert_eq!(after.find(id("n3")).unwrap().label(), "Check stock");
}

#[rstest]
fn given_same_text_when_committing_twice_then_same_as_once(tree: Tree) {
    let once = tree.begin_edit(id("n1")).commit_edit(id("n1"), "Approve");
    let twice = once.commit_edit(id("n1"), "Approve");

    assert_eq!(twice, once);
}

#[rstest]
fn given_edit_when_cancelled_then_pre_edit_label_restored(tree: Tree) {
    let after = tree.begin_edit(id("n1")).cancel_edit(id("n1"));

    let node = after.find(id("n1")).unwrap();
    assert_eq!(node.label(), "Button 1");
    assert!(!node.is_editing());
    assert_eq!(after, tree);
}

// ============================================================
// visibility & growth
// ============================================================

#[rstest]
fn given_node_with_children_when_toggling_then_shape_is_untouched(tree: Tree) {
    let hidden = tree.toggle_visibility(id("n1"));

    assert!(!hidden.find(id("n1")).unwrap().children_visible());
    assert_eq!(hidden.find(id("n1")).unwrap().child_count(), 2);
    assert_eq!(shape(&hidden), shape(&tree));

    let shown = hidden.toggle_visibility(id("n1"));
    assert_eq!(shown, tree);
}

#[test]
fn given_hidden_leaf_when_queried_then_still_a_leaf() {
    let tree = Tree::default().toggle_visibility(NodeId::ROOT);

    assert!(tree.root().is_leaf());
    assert!(!tree.root().children_visible());
}

#[rstest]
fn given_mixed_operations_when_applied_then_child_counts_never_shrink(tree: Tree) {
    let steps: Vec<Box<dyn Fn(&Tree) -> Tree>> = vec![
        Box::new(|t: &Tree| t.insert_child(id("n3"))),
        Box::new(|t: &Tree| t.update(id("n1"), &NodePatch::new().label("A"))),
        Box::new(|t: &Tree| t.toggle_visibility(id("n1"))),
        Box::new(|t: &Tree| t.begin_edit(id("n2")).commit_edit(id("n2"), "")),
        Box::new(|t: &Tree| t.insert_child(NodeId::ROOT)),
        Box::new(|t: &Tree| t.cancel_edit(id("n5"))),
    ];

    let mut current = tree;
    for step in steps {
        let next = step(&current);
        for (_, node) in current.iter() {
            let later = next.find(node.id()).expect("nodes are never removed");
            assert!(later.child_count() >= node.child_count());
        }
        current = next;
    }
    assert_eq!(current.len(), 7);
}
