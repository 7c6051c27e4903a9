//! Prelude module for Strata.
//!
//! ```ignore
//! use strata::prelude::*;
//! ```

// ============================================================================
// Signal/Slot and Property System
// ============================================================================

pub use crate::property::Property;
pub use crate::signal::{CancelableSignal, ConnectionGuard, ConnectionId, Signal};

// ============================================================================
// Paged Collections
// ============================================================================

pub use crate::model::{
    CollectionChange, CollectionError, CollectionProperty, FrozenItemPosition, Page, PageSource,
    PageSourceError, PagedCollection, PagedCollectionConfig, VecPageSource,
};

// ============================================================================
// Selection
// ============================================================================

pub use crate::model::{NodeId, SelectionError, SelectionMode, SelectionState, SelectionTree};
