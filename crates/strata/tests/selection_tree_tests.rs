//! Integration tests for `SelectionTree`.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use strata::model::{KeyComparer, NodeId, SelectionError, SelectionMode, SelectionState, SelectionTree};

use SelectionState::{Indeterminate, Selected, Unselected};

/// R -> (A -> (A1, A2), B)
struct Sample {
    tree: SelectionTree<&'static str>,
    r: NodeId,
    a: NodeId,
    b: NodeId,
    a1: NodeId,
    a2: NodeId,
}

fn sample(mode: SelectionMode) -> Sample {
    let tree = SelectionTree::with_mode(mode);
    let r = tree.add_root("R");
    let a = tree.attach_child(r, "A").unwrap();
    let b = tree.attach_child(r, "B").unwrap();
    let a1 = tree.attach_child(a, "A1").unwrap();
    let a2 = tree.attach_child(a, "A2").unwrap();
    Sample { tree, r, a, b, a1, a2 }
}

/// A three-level tree with a fan-out of three at each level.
fn wide_tree() -> (SelectionTree<u32>, Vec<NodeId>) {
    let tree = SelectionTree::new();
    let root = tree.add_root(0);
    let mut ids = vec![root];
    let mut next = 1;
    for _ in 0..3 {
        let child = tree.attach_child(root, next).unwrap();
        next += 1;
        ids.push(child);
        for _ in 0..3 {
            let grandchild = tree.attach_child(child, next).unwrap();
            next += 1;
            ids.push(grandchild);
        }
    }
    (tree, ids)
}

fn assert_aggregates_consistent<T>(tree: &SelectionTree<T>, ids: &[NodeId]) {
    for &id in ids {
        let children = tree.children(id);
        if children.is_empty() {
            assert_ne!(tree.state(id), Some(Indeterminate), "leaf {id:?} is indeterminate");
            continue;
        }
        let states = children.iter().filter_map(|c| tree.state(*c));
        assert_eq!(tree.state(id), SelectionState::aggregate(states), "node {id:?}");
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// =========================================================================
// Propagation
// =========================================================================

#[test]
fn test_select_root_then_deselect_leaf() {
    let s = sample(SelectionMode::ALL_SYNCHRONIZED);

    s.tree.set_selected(s.r, true).unwrap();
    for id in [s.r, s.a, s.b, s.a1, s.a2] {
        assert_eq!(s.tree.state(id), Some(Selected));
    }

    s.tree.set_selected(s.a1, false).unwrap();
    assert_eq!(s.tree.state(s.a1), Some(Unselected));
    assert_eq!(s.tree.state(s.a), Some(Indeterminate));
    assert_eq!(s.tree.state(s.r), Some(Indeterminate));
    assert_eq!(s.tree.state(s.b), Some(Selected));
    assert_eq!(s.tree.state(s.a2), Some(Selected));
    assert_eq!(s.tree.is_selected(s.r), None);
}

#[test]
fn test_upward_aggregation_holds_after_every_assignment() {
    let (tree, ids) = wide_tree();
    let script = [(5, true), (2, true), (11, false), (0, true), (7, false), (3, false), (12, true), (1, true), (9, false)];

    for (index, selected) in script {
        tree.set_selected(ids[index], selected).unwrap();
        assert_aggregates_consistent(&tree, &ids);
    }
}

#[test]
fn test_downward_cascade_leaves_no_indeterminate_descendant() {
    let (tree, ids) = wide_tree();
    tree.set_selected(ids[2], true).unwrap();
    tree.set_selected(ids[7], true).unwrap();
    assert_eq!(tree.state(ids[0]), Some(Indeterminate));

    for selected in [true, false] {
        tree.set_selected(ids[0], selected).unwrap();
        for descendant in tree.descendants(ids[0]) {
            assert_eq!(tree.state(descendant), Some(SelectionState::from(selected)));
        }
    }
}

#[test]
fn test_unsynchronized_assignment_is_local() {
    let s = sample(SelectionMode::ALL);
    s.tree.set_selected(s.r, true).unwrap();
    s.tree.set_selected(s.a1, true).unwrap();

    assert_eq!(s.tree.state(s.r), Some(Selected));
    assert_eq!(s.tree.state(s.a), Some(Unselected));
    assert_eq!(s.tree.state(s.a1), Some(Selected));
    assert_eq!(s.tree.state(s.a2), Some(Unselected));
}

// =========================================================================
// Leaf scope
// =========================================================================

#[test]
fn test_leaf_scope_rejects_internal_assignment() {
    let s = sample(SelectionMode::LEAF_SYNCHRONIZED);

    let err = s.tree.set_selected(s.a, true).unwrap_err();
    assert!(matches!(err, SelectionError::PolicyViolation { node, .. } if node == s.a));
    assert_eq!(s.tree.state(s.a), Some(Unselected));
    assert_eq!(s.tree.state(s.a1), Some(Unselected));

    assert!(s.tree.toggle(s.r).is_err());
    assert_eq!(s.tree.state(s.r), Some(Unselected));
}

#[test]
fn test_leaf_scope_aggregates_internal_nodes() {
    let s = sample(SelectionMode::LEAF_SYNCHRONIZED);

    s.tree.set_selected(s.a1, true).unwrap();
    assert_eq!(s.tree.state(s.a), Some(Indeterminate));
    s.tree.set_selected(s.a2, true).unwrap();
    assert_eq!(s.tree.state(s.a), Some(Selected));
    assert_eq!(s.tree.state(s.r), Some(Indeterminate));
    s.tree.set_selected(s.b, true).unwrap();
    assert_eq!(s.tree.state(s.r), Some(Selected));
}

#[test]
fn test_leaf_scope_without_synchronize_leaves_internal_nodes_alone() {
    let s = sample(SelectionMode::LEAF);

    s.tree.set_selected(s.a1, true).unwrap();
    s.tree.set_selected(s.a2, true).unwrap();
    assert_eq!(s.tree.state(s.a), Some(Unselected));
    assert_eq!(s.tree.state(s.r), Some(Unselected));
}

// =========================================================================
// Identity
// =========================================================================

#[test]
fn test_equal_values_at_different_depths_are_distinct() {
    let tree = SelectionTree::new();
    let root = tree.add_root("shared");
    let child = tree.attach_child(root, "shared").unwrap();
    let sibling_root = tree.add_root("shared");

    let at_root = tree.node_ref(root).unwrap();
    let at_child = tree.node_ref(child).unwrap();
    assert_ne!(at_root, at_child);
    assert_ne!(hash_of(&at_root), hash_of(&at_child));

    let other_root = tree.node_ref(sibling_root).unwrap();
    assert_eq!(at_root, other_root);
    assert_eq!(hash_of(&at_root), hash_of(&other_root));

    let set: HashSet<_> = [at_root, at_child, other_root].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_node_refs_use_tree_comparer() {
    #[derive(Debug, Clone)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    let tree: SelectionTree<Row> = SelectionTree::with_comparer(
        SelectionMode::default(),
        Arc::new(KeyComparer::new(|row: &Row| row.id)),
    );
    let first = tree.add_root(Row { id: 7, label: "first" });
    let second = tree.add_root(Row { id: 7, label: "renamed" });

    let first = tree.node_ref(first).unwrap();
    let second = tree.node_ref(second).unwrap();
    assert_ne!(first.value().label, second.value().label);
    assert_eq!(first, second);
    assert_eq!(tree.find(&Row { id: 7, label: "" }).map(|id| tree.depth(id)), Some(Some(0)));
}

// =========================================================================
// Structural changes
// =========================================================================

#[test]
fn test_attach_and_detach_recompute_parent() {
    let s = sample(SelectionMode::ALL_SYNCHRONIZED);
    s.tree.set_selected(s.a, true).unwrap();
    assert_eq!(s.tree.state(s.a), Some(Selected));

    let a3 = s.tree.attach_child(s.a, "A3").unwrap();
    assert_eq!(s.tree.state(s.a), Some(Indeterminate));

    s.tree.detach(a3).unwrap();
    assert_eq!(s.tree.state(s.a), Some(Selected));

    let a4 = s.tree.attach_child_with_state(s.a, "A4", true).unwrap();
    assert_eq!(s.tree.state(a4), Some(Selected));
    assert_eq!(s.tree.state(s.a), Some(Selected));

    s.tree.detach(s.b).unwrap();
    assert_eq!(s.tree.state(s.r), Some(Selected));
}

#[test]
fn test_detach_ripples_to_grandparent() {
    let s = sample(SelectionMode::ALL_SYNCHRONIZED);
    s.tree.set_selected(s.a1, true).unwrap();
    s.tree.set_selected(s.b, true).unwrap();
    assert_eq!(s.tree.state(s.r), Some(Indeterminate));

    s.tree.detach(s.a2).unwrap();
    assert_eq!(s.tree.state(s.a), Some(Selected));
    assert_eq!(s.tree.state(s.r), Some(Selected));
}

#[test]
fn test_synchronize_children_with_source() {
    let tree = SelectionTree::new();
    let parent = tree.add_root("P");
    let x = tree.attach_child(parent, "x").unwrap();
    let y = tree.attach_child(parent, "y").unwrap();
    let z = tree.attach_child(parent, "z").unwrap();
    tree.attach_child(z, "z1").unwrap();
    tree.set_selected(y, true).unwrap();

    let detached = Arc::new(Mutex::new(Vec::new()));
    let log = detached.clone();
    tree.signals().node_detached.connect(move |id| log.lock().push(*id));

    tree.synchronize_children(parent, &["y", "w", "x"]).unwrap();

    let children = tree.children(parent);
    let values: Vec<_> = children.iter().filter_map(|id| tree.value(*id)).collect();
    assert_eq!(values, vec!["y", "w", "x"]);
    assert_eq!(children[0], y);
    assert_eq!(children[2], x);
    assert_eq!(tree.state(y), Some(Selected));
    assert_eq!(tree.state(children[1]), Some(Unselected));
    assert!(!tree.contains(z));
    assert_eq!(tree.len(), 4);
    assert_eq!(*detached.lock(), vec![z]);
    assert_eq!(tree.state(parent), Some(Indeterminate));
}

#[test]
fn test_synchronize_children_unknown_parent() {
    let tree = SelectionTree::new();
    let root = tree.add_root(1);
    tree.detach(root).unwrap();
    assert_eq!(
        tree.synchronize_children(root, &[2, 3]),
        Err(SelectionError::UnknownNode(root))
    );
    assert!(tree.is_empty());
}

#[test]
fn test_structure_signals() {
    let tree = SelectionTree::new();
    let attached = Arc::new(Mutex::new(0usize));
    let log = attached.clone();
    tree.signals().node_attached.connect(move |_| *log.lock() += 1);

    let root = tree.add_root('r');
    tree.attach_child(root, 'a').unwrap();
    tree.insert_child(root, 0, 'b').unwrap();
    assert_eq!(*attached.lock(), 3);
    assert_eq!(tree.selected_values(), Vec::<char>::new());
}
