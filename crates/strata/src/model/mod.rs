//! View-model collections for Strata.
//!
//! # Core Types
//!
//! - [`PagedCollection`]: a window over an asynchronous [`PageSource`],
//!   merged with always-visible frozen items
//! - [`SelectionTree`]: a tree with tri-state selection propagation
//! - [`CollectionSignals`] / [`SelectionTreeSignals`]: change notifications
//! - [`ItemComparer`]: injectable equality used for lookups and node identity
//!
//! # Signal Flow
//!
//! ```text
//! ┌─────────────┐  fetch_page   ┌─────────────────┐  signals   ┌──────────┐
//! │ PageSource  │<──────────────│ PagedCollection │───────────>│  Views   │
//! └─────────────┘               └─────────────────┘            └──────────┘
//! ```

mod change;
mod comparer;
mod error;
mod frozen;
mod page_source;
pub mod paged;
pub mod selection;

pub use change::{CollectionChange, CollectionProperty, CollectionSignals};
pub use comparer::{DefaultComparer, ItemComparer, KeyComparer, SharedComparer};
pub use error::{BoxError, CollectionError, Result, SelectionError, SelectionResult};
pub use frozen::{FrozenItemPosition, FrozenMerge};
pub use page_source::{FnPageSource, Page, PageResult, PageSource, PageSourceError, VecPageSource};
pub use paged::{DEFAULT_PAGE_SIZE, DeferScope, PageWindow, PagedCollection, PagedCollectionConfig};
pub use selection::{
    NodeId, NodeRef, SelectionMode, SelectionScope, SelectionState, SelectionTree, SelectionTreeSignals,
};
