//! Deferred-load scopes.

use strata_core::logging::targets;

use super::PagedCollection;
use crate::model::error::Result;

/// A reentrant deferral scope returned by [`PagedCollection::begin_defer`].
///
/// While any scope is open, page loads are recorded instead of executed.
/// Call [`end`](Self::end) to close the scope: when the last open scope ends
/// and a load was requested meanwhile, exactly one consolidated load runs
/// for the last requested page.
///
/// Dropping a scope without calling `end` still closes it, but cannot await
/// the load; the recorded request stays queued and is served by the next
/// [`PagedCollection::load_more`].
#[must_use = "a defer scope should be closed with `end().await`"]
pub struct DeferScope<'a, T: Clone + Send + Sync + 'static> {
    collection: &'a PagedCollection<T>,
    closed: bool,
}

impl<'a, T: Clone + Send + Sync + 'static> DeferScope<'a, T> {
    pub(super) fn new(collection: &'a PagedCollection<T>) -> Self {
        Self {
            collection,
            closed: false,
        }
    }

    /// Close the scope.
    ///
    /// Returns `Some(count)` with the visible count if this was the outermost
    /// scope and a consolidated load ran, `None` otherwise.
    pub async fn end(mut self) -> Result<Option<usize>> {
        self.closed = true;
        if !self.collection.exit_defer() {
            return Ok(None);
        }
        self.collection.load_more(0).await.map(Some)
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for DeferScope<'_, T> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if self.collection.exit_defer() {
            tracing::debug!(
                target: targets::COLLECTION,
                "defer scope dropped without end(); load left queued"
            );
        }
    }
}
