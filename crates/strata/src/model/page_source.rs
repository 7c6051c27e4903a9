//! The asynchronous data source behind a paged collection.
//!
//! A [`PageSource`] answers one question: given a page index and a page size,
//! which items are on that page and how many items exist in total? The
//! collection owns no data beyond the loaded window, so everything else
//! (caching, retries, remote queries) is the source's business.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::{self, BoxFuture};
use parking_lot::RwLock;
use thiserror::Error;

use super::error::BoxError;

/// One page of items plus the size of the whole virtual collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on the requested page, in order.
    pub items: Vec<T>,
    /// Number of items in the whole virtual collection.
    pub total_count: usize,
}

impl<T> Page<T> {
    /// Create a page.
    pub fn new(items: Vec<T>, total_count: usize) -> Self {
        Self { items, total_count }
    }
}

/// Failure outcomes of a page fetch.
#[derive(Debug, Error)]
pub enum PageSourceError {
    /// The fetch failed.
    #[error("page fetch failed: {0}")]
    Failed(#[source] BoxError),

    /// The fetch was cancelled before it completed.
    #[error("page fetch cancelled")]
    Cancelled,
}

impl PageSourceError {
    /// Wrap any error as a fetch failure.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// A fetch failure carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Failed(message.into())
    }
}

/// Result of a page fetch.
pub type PageResult<T> = std::result::Result<Page<T>, PageSourceError>;

/// Asynchronous provider of pages.
///
/// Implementations must be idempotent for the same `(page_index, page_size)`
/// modulo changes to the underlying data. They may fail or report
/// cancellation; the collection never retries.
pub trait PageSource<T>: Send + Sync {
    /// Fetch the page at `page_index` holding at most `page_size` items.
    fn fetch_page(&self, page_index: usize, page_size: usize) -> BoxFuture<'_, PageResult<T>>;
}

/// Adapts a closure returning a future into a [`PageSource`].
///
/// ```
/// use strata::model::{FnPageSource, Page, PageSource};
///
/// let source = FnPageSource::new(|index: usize, size: usize| async move {
///     let items: Vec<usize> = (index * size..(index + 1) * size).collect();
///     Ok(Page::new(items, 100))
/// });
/// # let _ = source.fetch_page(0, 10);
/// ```
pub struct FnPageSource<F> {
    fetch: F,
}

impl<F> FnPageSource<F> {
    /// Create a source from `fetch(page_index, page_size)`.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<T, F, Fut> PageSource<T> for FnPageSource<F>
where
    F: Fn(usize, usize) -> Fut + Send + Sync,
    Fut: Future<Output = PageResult<T>> + Send + 'static,
{
    fn fetch_page(&self, page_index: usize, page_size: usize) -> BoxFuture<'_, PageResult<T>> {
        Box::pin((self.fetch)(page_index, page_size))
    }
}

/// An in-memory page source over a vector.
///
/// Pages are slices of the vector; the total count is its length. The data
/// can be replaced at any time, which the next fetch observes.
pub struct VecPageSource<T> {
    items: RwLock<Vec<T>>,
    fetches: AtomicUsize,
}

impl<T: Clone + Send + Sync> VecPageSource<T> {
    /// Create a source over `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the underlying data.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
    }

    /// Append an item to the underlying data.
    pub fn push(&self, item: T) {
        self.items.write().push(item);
    }

    /// Number of items in the underlying data.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the underlying data is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn slice(&self, page_index: usize, page_size: usize) -> Page<T> {
        let items = self.items.read();
        let start = page_index.saturating_mul(page_size).min(items.len());
        let end = start.saturating_add(page_size).min(items.len());
        Page::new(items[start..end].to_vec(), items.len())
    }
}

impl<T: Clone + Send + Sync> PageSource<T> for VecPageSource<T> {
    fn fetch_page(&self, page_index: usize, page_size: usize) -> BoxFuture<'_, PageResult<T>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(Ok(self.slice(page_index, page_size))))
    }
}
