//! Strata - paged virtual collections and tri-state selection trees.
//!
//! This is the main crate; it re-exports the reactive plumbing from
//! `strata-core` alongside the collections.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strata::prelude::*;
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let source = Arc::new(VecPageSource::new((0..25).collect::<Vec<u32>>()));
//! let view = PagedCollection::new(source);
//!
//! view.signals().page_changed.connect(|page| println!("now on page {page}"));
//! view.move_to_page(2).await?;
//! assert_eq!(view.items(), (20..25).collect::<Vec<_>>());
//! # Ok::<(), CollectionError>(())
//! # }).unwrap().unwrap();
//! ```

pub use strata_core::*;

pub mod model;
pub mod prelude;
