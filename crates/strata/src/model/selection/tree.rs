//! Tri-state selection over an arena-backed tree.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};
use strata_core::logging::targets;
use strata_core::{PerfSpan, Signal, TreeDebug};

use super::mode::{SelectionMode, SelectionState};
use crate::model::comparer::{DefaultComparer, SharedComparer};
use crate::model::error::{SelectionError, SelectionResult};

new_key_type! {
    /// Handle to a node in a [`SelectionTree`].
    pub struct NodeId;
}

struct SelectionNode<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    state: SelectionState,
}

impl<T> SelectionNode<T> {
    fn new(value: T, parent: Option<NodeId>, state: SelectionState) -> Self {
        Self {
            value,
            parent,
            children: Vec::new(),
            state,
        }
    }
}

/// Notifications collected under the storage lock and emitted after it is
/// released.
#[derive(Default)]
struct Changes {
    attached: Vec<NodeId>,
    detached: Vec<NodeId>,
    states: Vec<(NodeId, SelectionState)>,
}

struct TreeStorage<T> {
    nodes: SlotMap<NodeId, SelectionNode<T>>,
    roots: Vec<NodeId>,
    mode: SelectionMode,
}

impl<T> TreeStorage<T> {
    fn node(&self, id: NodeId) -> SelectionResult<&SelectionNode<T>> {
        self.nodes.get(id).ok_or(SelectionError::UnknownNode(id))
    }

    fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.roots,
            Some(id) => self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[]),
        }
    }

    fn depth(&self, id: NodeId) -> Option<usize> {
        let mut parent = self.nodes.get(id)?.parent;
        let mut depth = 0;
        while let Some(ancestor) = parent {
            depth += 1;
            parent = self.nodes.get(ancestor).and_then(|n| n.parent);
        }
        Some(depth)
    }

    /// Descendants of `id` in depth-first pre-order, excluding `id`.
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(Some(id)).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.children_of(Some(next)).iter().rev());
        }
        order
    }

    /// Every node in depth-first pre-order.
    fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            order.push(root);
            order.extend(self.descendants(root));
        }
        order
    }

    fn aggregate_of(&self, id: NodeId) -> Option<SelectionState> {
        let children = self.children_of(Some(id));
        SelectionState::aggregate(children.iter().filter_map(|c| self.nodes.get(*c)).map(|c| c.state))
    }

    fn set_state(&mut self, id: NodeId, state: SelectionState, changes: &mut Changes) {
        if let Some(node) = self.nodes.get_mut(id) {
            if node.state != state {
                node.state = state;
                changes.states.push((id, state));
            }
        }
    }

    fn cascade_down(&mut self, id: NodeId, state: SelectionState, changes: &mut Changes) {
        for descendant in self.descendants(id) {
            self.set_state(descendant, state, changes);
        }
    }

    /// Recompute `start` and its ancestors from their children, stopping at
    /// the first node whose state does not change. A node left without
    /// children keeps its state unless it was indeterminate.
    fn recompute_up(&mut self, start: Option<NodeId>, changes: &mut Changes) {
        let mut current = start;
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            let (state, parent) = (node.state, node.parent);
            let next = match self.aggregate_of(id) {
                Some(aggregate) => aggregate,
                None if state == SelectionState::Indeterminate => SelectionState::Unselected,
                None => state,
            };
            if next == state {
                break;
            }
            self.set_state(id, next, changes);
            current = parent;
        }
    }

    fn unlink(&mut self, id: NodeId) {
        match self.nodes.get(id).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.retain(|&child| child != id);
                }
            }
            None => self.roots.retain(|&root| root != id),
        }
    }

    fn remove_subtree(&mut self, id: NodeId) -> Option<T> {
        for descendant in self.descendants(id) {
            self.nodes.remove(descendant);
        }
        self.nodes.remove(id).map(|node| node.value)
    }
}

/// Signals emitted by a [`SelectionTree`].
pub struct SelectionTreeSignals {
    /// Emitted for every node whose state changed. Args: (node, new state).
    pub state_changed: Signal<(NodeId, SelectionState)>,
    /// Emitted after a node was added.
    pub node_attached: Signal<NodeId>,
    /// Emitted after a subtree was removed. Args: the subtree's root.
    pub node_detached: Signal<NodeId>,
}

impl Default for SelectionTreeSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTreeSignals {
    /// Creates a new set of tree signals.
    pub fn new() -> Self {
        Self {
            state_changed: Signal::new(),
            node_attached: Signal::new(),
            node_detached: Signal::new(),
        }
    }
}

/// A tree whose nodes carry a tri-state selection.
///
/// Nodes live in an arena owned by the tree; each node owns its ordered
/// child list and refers to its parent by handle only. Under a
/// synchronizing [`SelectionMode`], assigning a node forces every descendant
/// to the same state and recomputes each ancestor as selected when all of
/// its children are, unselected when none are, and indeterminate otherwise.
///
/// # Example
///
/// ```
/// use strata::model::{SelectionState, SelectionTree};
///
/// let tree = SelectionTree::new();
/// let root = tree.add_root("root");
/// let a = tree.attach_child(root, "a").unwrap();
/// let b = tree.attach_child(root, "b").unwrap();
///
/// tree.set_selected(a, true).unwrap();
/// assert_eq!(tree.state(root), Some(SelectionState::Indeterminate));
///
/// tree.set_selected(b, true).unwrap();
/// assert_eq!(tree.state(root), Some(SelectionState::Selected));
/// ```
pub struct SelectionTree<T> {
    storage: RwLock<TreeStorage<T>>,
    comparer: SharedComparer<T>,
    signals: SelectionTreeSignals,
}

impl<T: Eq + Hash + 'static> Default for SelectionTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + 'static> SelectionTree<T> {
    /// Create an empty tree with the default mode and natural equality.
    pub fn new() -> Self {
        Self::with_mode(SelectionMode::default())
    }

    /// Create an empty tree with the given mode and natural equality.
    pub fn with_mode(mode: SelectionMode) -> Self {
        Self::with_comparer(mode, Arc::new(DefaultComparer))
    }
}

impl<T> SelectionTree<T> {
    /// Create an empty tree that compares values through `comparer`.
    pub fn with_comparer(mode: SelectionMode, comparer: SharedComparer<T>) -> Self {
        Self {
            storage: RwLock::new(TreeStorage {
                nodes: SlotMap::with_key(),
                roots: Vec::new(),
                mode,
            }),
            comparer,
            signals: SelectionTreeSignals::new(),
        }
    }

    /// The tree's signals.
    pub fn signals(&self) -> &SelectionTreeSignals {
        &self.signals
    }

    /// The active selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.storage.read().mode
    }

    /// Change the selection mode. Existing states are kept as they are;
    /// call [`recompute_all`](Self::recompute_all) to re-derive them.
    pub fn set_mode(&self, mode: SelectionMode) {
        self.storage.write().mode = mode;
        tracing::debug!(target: targets::SELECTION, ?mode, "selection mode changed");
    }

    fn emit(&self, changes: Changes) {
        for id in changes.attached {
            self.signals.node_attached.emit(id);
        }
        for id in changes.detached {
            self.signals.node_detached.emit(id);
        }
        for change in changes.states {
            self.signals.state_changed.emit(change);
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Add an unselected root node.
    pub fn add_root(&self, value: T) -> NodeId {
        let id = {
            let mut storage = self.storage.write();
            let id = storage
                .nodes
                .insert(SelectionNode::new(value, None, SelectionState::Unselected));
            storage.roots.push(id);
            id
        };
        self.signals.node_attached.emit(id);
        id
    }

    /// Append an unselected child to `parent`.
    pub fn attach_child(&self, parent: NodeId, value: T) -> SelectionResult<NodeId> {
        self.insert(parent, None, value, SelectionState::Unselected)
    }

    /// Append a child with an initial selection to `parent`.
    pub fn attach_child_with_state(&self, parent: NodeId, value: T, selected: bool) -> SelectionResult<NodeId> {
        self.insert(parent, None, value, selected.into())
    }

    /// Insert an unselected child at `index` among `parent`'s children.
    pub fn insert_child(&self, parent: NodeId, index: usize, value: T) -> SelectionResult<NodeId> {
        self.insert(parent, Some(index), value, SelectionState::Unselected)
    }

    fn insert(&self, parent: NodeId, index: Option<usize>, value: T, state: SelectionState) -> SelectionResult<NodeId> {
        let mut changes = Changes::default();
        let id = {
            let mut guard = self.storage.write();
            let storage = &mut *guard;
            let len = storage.node(parent)?.children.len();
            let index = index.unwrap_or(len);
            if index > len {
                return Err(SelectionError::InvalidIndex { index, len });
            }
            let id = storage.nodes.insert(SelectionNode::new(value, Some(parent), state));
            if let Some(node) = storage.nodes.get_mut(parent) {
                node.children.insert(index, id);
            }
            changes.attached.push(id);
            if storage.mode.synchronize {
                storage.recompute_up(Some(parent), &mut changes);
            }
            id
        };
        self.emit(changes);
        Ok(id)
    }

    /// Remove `id` and its subtree, returning its value. Under a
    /// synchronizing mode the former parent is recomputed.
    pub fn detach(&self, id: NodeId) -> SelectionResult<T> {
        let mut changes = Changes::default();
        let value = {
            let mut guard = self.storage.write();
            let storage = &mut *guard;
            let parent = storage.node(id)?.parent;
            storage.unlink(id);
            let value = storage.remove_subtree(id).ok_or(SelectionError::UnknownNode(id))?;
            changes.detached.push(id);
            if storage.mode.synchronize {
                storage.recompute_up(parent, &mut changes);
            }
            value
        };
        self.emit(changes);
        Ok(value)
    }

    /// Reconcile `parent`'s children with `source`.
    ///
    /// Children matching a source value (through the comparer) are kept,
    /// with their subtrees and states, in source order; missing values get
    /// new unselected children; children with no source value are removed.
    /// Under a synchronizing mode `parent` is then recomputed.
    pub fn synchronize_children(&self, parent: NodeId, source: &[T]) -> SelectionResult<()>
    where
        T: Clone,
    {
        let _perf = PerfSpan::new("synchronize_children");
        let mut changes = Changes::default();
        {
            let mut guard = self.storage.write();
            let storage = &mut *guard;
            let mut unused: Vec<Option<NodeId>> = storage.node(parent)?.children.iter().copied().map(Some).collect();
            let mut children = Vec::with_capacity(source.len());

            for value in source {
                let matched = unused.iter().position(|slot| match slot {
                    Some(child) => storage
                        .nodes
                        .get(*child)
                        .is_some_and(|node| self.comparer.equals(&node.value, value)),
                    None => false,
                });
                let child = match matched.and_then(|i| unused[i].take()) {
                    Some(child) => child,
                    None => {
                        let child = storage.nodes.insert(SelectionNode::new(
                            value.clone(),
                            Some(parent),
                            SelectionState::Unselected,
                        ));
                        changes.attached.push(child);
                        child
                    }
                };
                children.push(child);
            }

            for stale in unused.into_iter().flatten() {
                storage.remove_subtree(stale);
                changes.detached.push(stale);
            }
            if let Some(node) = storage.nodes.get_mut(parent) {
                node.children = children;
            }
            if storage.mode.synchronize {
                storage.recompute_up(Some(parent), &mut changes);
            }
        }
        tracing::debug!(
            target: targets::SELECTION,
            attached = changes.attached.len(),
            detached = changes.detached.len(),
            "children synchronized"
        );
        self.emit(changes);
        Ok(())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Assign a node's selection.
    ///
    /// Under a synchronizing mode every descendant takes the same state and
    /// the ancestors are recomputed; otherwise only the node changes. In
    /// leaf scope, assigning a node that has children fails with
    /// [`SelectionError::PolicyViolation`] and changes nothing.
    pub fn set_selected(&self, id: NodeId, selected: bool) -> SelectionResult<()> {
        let mut changes = Changes::default();
        {
            let mut guard = self.storage.write();
            let storage = &mut *guard;
            let node = storage.node(id)?;
            if !storage.mode.allows_internal() && !node.children.is_empty() {
                tracing::debug!(target: targets::SELECTION, ?id, "direct assignment of internal node rejected");
                return Err(SelectionError::PolicyViolation {
                    node: id,
                    reason: "internal nodes are derived from their children in leaf scope",
                });
            }
            let parent = node.parent;
            let state = SelectionState::from(selected);
            storage.set_state(id, state, &mut changes);
            if storage.mode.synchronize {
                storage.cascade_down(id, state, &mut changes);
                storage.recompute_up(parent, &mut changes);
            }
        }
        tracing::trace!(target: targets::SELECTION, ?id, selected, changed = changes.states.len(), "selection assigned");
        self.emit(changes);
        Ok(())
    }

    /// Flip a node: unselected becomes selected, anything else becomes
    /// unselected. Returns the new state.
    pub fn toggle(&self, id: NodeId) -> SelectionResult<SelectionState> {
        let current = self.state(id).ok_or(SelectionError::UnknownNode(id))?;
        let selected = current == SelectionState::Unselected;
        self.set_selected(id, selected)?;
        Ok(selected.into())
    }

    /// Re-derive every internal node from its children, bottom-up.
    pub fn recompute_all(&self) {
        let _perf = PerfSpan::new("recompute_all");
        let mut changes = Changes::default();
        {
            let mut storage = self.storage.write();
            for id in storage.walk().into_iter().rev() {
                if let Some(aggregate) = storage.aggregate_of(id) {
                    storage.set_state(id, aggregate, &mut changes);
                }
            }
        }
        self.emit(changes);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.storage.read().nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.storage.read().nodes.contains_key(id)
    }

    /// Root nodes in order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.storage.read().roots.clone()
    }

    /// Children of `id` in order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.storage.read().children_of(Some(id)).to_vec()
    }

    /// Parent of `id`, or `None` for roots and unknown nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.storage.read().nodes.get(id).and_then(|n| n.parent)
    }

    /// Distance from the root: `0` for roots.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.storage.read().depth(id)
    }

    /// Returns `true` if `id` exists and has no children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.storage.read().nodes.get(id).is_some_and(|n| n.children.is_empty())
    }

    /// Descendants of `id`, depth-first, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.storage.read().descendants(id)
    }

    /// Selection state of `id`.
    pub fn state(&self, id: NodeId) -> Option<SelectionState> {
        self.storage.read().nodes.get(id).map(|n| n.state)
    }

    /// `Some(true)` or `Some(false)` for a determinate node; `None` for an
    /// indeterminate or unknown one.
    pub fn is_selected(&self, id: NodeId) -> Option<bool> {
        self.state(id).and_then(SelectionState::as_bool)
    }

    /// Run `f` against the value at `id`.
    pub fn with_value<F, R>(&self, id: NodeId, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.storage.read().nodes.get(id).map(|n| f(&n.value))
    }

    /// The value at `id`.
    pub fn value(&self, id: NodeId) -> Option<T>
    where
        T: Clone,
    {
        self.with_value(id, T::clone)
    }

    /// First node, depth-first, whose value equals `value`.
    pub fn find(&self, value: &T) -> Option<NodeId> {
        let storage = self.storage.read();
        storage.walk().into_iter().find(|id| {
            storage
                .nodes
                .get(*id)
                .is_some_and(|n| self.comparer.equals(&n.value, value))
        })
    }

    /// Values of every selected node, depth-first.
    pub fn selected_values(&self) -> Vec<T>
    where
        T: Clone,
    {
        let storage = self.storage.read();
        storage
            .walk()
            .into_iter()
            .filter_map(|id| storage.nodes.get(id))
            .filter(|n| n.state == SelectionState::Selected)
            .map(|n| n.value.clone())
            .collect()
    }

    /// A value snapshot of `id` that compares by value and depth.
    pub fn node_ref(&self, id: NodeId) -> Option<NodeRef<T>>
    where
        T: Clone,
    {
        let storage = self.storage.read();
        let node = storage.nodes.get(id)?;
        Some(NodeRef {
            id,
            value: node.value.clone(),
            depth: storage.depth(id)?,
            comparer: Arc::clone(&self.comparer),
        })
    }
}

impl<T: fmt::Debug> TreeDebug for SelectionTree<T> {
    type NodeId = NodeId;

    fn debug_roots(&self) -> Vec<NodeId> {
        self.roots()
    }

    fn debug_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
    }

    fn debug_label(&self, id: NodeId) -> String {
        let storage = self.storage.read();
        match storage.nodes.get(id) {
            Some(node) => format!("{} {:?}", node.state.glyph(), node.value),
            None => "<detached>".to_string(),
        }
    }
}

static_assertions::assert_impl_all!(SelectionTree<String>: Send, Sync);

/// A node's value and depth, detached from the tree.
///
/// Two refs are equal when their values are equal under the tree's comparer
/// *and* they sit at the same depth; the hash covers both.
#[derive(Clone)]
pub struct NodeRef<T> {
    id: NodeId,
    value: T,
    depth: usize,
    comparer: SharedComparer<T>,
}

impl<T> NodeRef<T> {
    /// The node this ref was taken from.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The node's depth.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<T> PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.comparer.equals(&self.value, &other.value)
    }
}

impl<T> Eq for NodeRef<T> {}

impl<T> Hash for NodeRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.comparer.hash_of(&self.value));
        self.depth.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
