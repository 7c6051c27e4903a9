//! Hierarchical tri-state selection.
//!
//! A [`SelectionTree`] keeps a [`SelectionState`] per node and, under a
//! synchronizing [`SelectionMode`], keeps those states consistent: every
//! internal node is selected when all of its children are, unselected when
//! none are, and indeterminate otherwise.
//!
//! # Modes
//!
//! | Mode | Direct assignment | Cascade |
//! |------|-------------------|---------|
//! | [`SelectionMode::ALL_SYNCHRONIZED`] | any node | down and up |
//! | [`SelectionMode::LEAF_SYNCHRONIZED`] | leaves only | up |
//! | [`SelectionMode::ALL`] | any node | none |
//! | [`SelectionMode::LEAF`] | leaves only | none |

mod mode;
mod tree;

pub use mode::{SelectionMode, SelectionScope, SelectionState};
pub use tree::{NodeId, NodeRef, SelectionTree, SelectionTreeSignals};
