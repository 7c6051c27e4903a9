//! A paged view over an asynchronous page source.
//!
//! [`PagedCollection`] keeps one page of items loaded from a [`PageSource`],
//! merged with a small set of *frozen* items that stay visible on every page.
//! Page loads replace the window wholesale and are reported through
//! [`CollectionSignals`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strata::model::{PagedCollection, PagedCollectionConfig, VecPageSource};
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let source = Arc::new(VecPageSource::new((0..7).collect::<Vec<u32>>()));
//! let config = PagedCollectionConfig::default().with_page_size(3);
//! let view = PagedCollection::with_config(source, config)?;
//!
//! view.move_to_first_page().await?;
//! assert_eq!(view.items(), vec![0, 1, 2]);
//! assert_eq!(view.page_count(), 3);
//! # Ok::<(), strata::model::CollectionError>(())
//! # }).unwrap().unwrap();
//! ```
//!
//! # Concurrency
//!
//! Every operation takes `&self`. Locks are never held across an `.await` or
//! while a signal is emitted, so slots may read the collection freely. When
//! the host lets operations interleave, a load for a window that is already
//! being fetched is skipped, and a newer fetch supersedes an older one.

mod current;
mod defer;
mod window;

pub use defer::DeferScope;
pub use window::{DEFAULT_PAGE_SIZE, PageWindow};

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strata_core::Property;
use strata_core::logging::targets;
use tracing::Instrument;

use super::change::{CollectionChange, CollectionProperty, CollectionSignals};
use super::comparer::{DefaultComparer, SharedComparer};
use super::error::{CollectionError, Result};
use super::frozen::{FrozenItemPosition, FrozenMerge};
use super::page_source::{Page, PageSource, PageSourceError};

/// Construction-time settings for a [`PagedCollection`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedCollectionConfig {
    /// Items per page, frozen items included. Must be greater than zero.
    pub page_size: usize,
    /// Where frozen items are shown.
    pub frozen_position: FrozenItemPosition,
}

impl Default for PagedCollectionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            frozen_position: FrozenItemPosition::default(),
        }
    }
}

impl PagedCollectionConfig {
    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the frozen position.
    pub fn with_frozen_position(mut self, position: FrozenItemPosition) -> Self {
        self.frozen_position = position;
        self
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(CollectionError::invalid_argument(
                "page_size",
                "page size must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Identifies a fetch: page index and the page size actually requested.
type FetchKey = (usize, usize);

/// Bookkeeping for deferral and in-flight fetches.
#[derive(Debug, Default)]
struct LoadState {
    defer_level: usize,
    deferred_page_index: Option<usize>,
    reload_requested: bool,
    in_flight: Option<FetchKey>,
    generation: u64,
}

/// Snapshot of every observable attribute, diffed to raise notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observed {
    page_index: Option<usize>,
    page_size: usize,
    page_count: usize,
    item_count: usize,
    total_item_count: Option<usize>,
    can_change_page: bool,
    is_page_changing: bool,
    count: usize,
    frozen_position: FrozenItemPosition,
    current_position: isize,
    before_first: bool,
    after_last: bool,
}

/// A fixed-size window over an asynchronously sourced collection.
///
/// The visible sequence is the loaded page merged with the frozen items at
/// the configured [`FrozenItemPosition`]. Page requests ask the source for
/// `max(page_size - frozen_count, 1)` items, so frozen items share the page
/// without starving it.
pub struct PagedCollection<T: Clone + Send + Sync + 'static> {
    source: Arc<dyn PageSource<T>>,
    comparer: SharedComparer<T>,
    items: RwLock<FrozenMerge<T>>,
    page_index: Property<Option<usize>>,
    page_size: Property<usize>,
    item_count: Property<usize>,
    total_item_count: Property<Option<usize>>,
    is_page_changing: Property<bool>,
    current_position: Property<isize>,
    loads: Mutex<LoadState>,
    signals: CollectionSignals<T>,
}

impl<T: Clone + Send + Sync + Eq + Hash + 'static> PagedCollection<T> {
    /// Create a collection with default settings and natural item equality.
    pub fn new(source: Arc<dyn PageSource<T>>) -> Self {
        Self::build(
            source,
            PagedCollectionConfig::default(),
            Arc::new(DefaultComparer),
        )
    }

    /// Create a collection with the given settings and natural item equality.
    pub fn with_config(source: Arc<dyn PageSource<T>>, config: PagedCollectionConfig) -> Result<Self> {
        Self::with_comparer(source, config, Arc::new(DefaultComparer))
    }
}

impl<T: Clone + Send + Sync + 'static> PagedCollection<T> {
    /// Create a collection that matches items through `comparer`.
    pub fn with_comparer(
        source: Arc<dyn PageSource<T>>,
        config: PagedCollectionConfig,
        comparer: SharedComparer<T>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(source, config, comparer))
    }

    fn build(source: Arc<dyn PageSource<T>>, config: PagedCollectionConfig, comparer: SharedComparer<T>) -> Self {
        Self {
            source,
            comparer,
            items: RwLock::new(FrozenMerge::new(config.frozen_position)),
            page_index: Property::new(None),
            page_size: Property::new(config.page_size),
            item_count: Property::new(0),
            total_item_count: Property::new(None),
            is_page_changing: Property::new(false),
            current_position: Property::new(-1),
            loads: Mutex::new(LoadState::default()),
            signals: CollectionSignals::new(),
        }
    }

    /// The collection's signals.
    pub fn signals(&self) -> &CollectionSignals<T> {
        &self.signals
    }

    /// The comparer used for lookups.
    pub fn comparer(&self) -> &SharedComparer<T> {
        &self.comparer
    }

    // =========================================================================
    // Window state
    // =========================================================================

    /// Index of the loaded page, or `None` before the first load.
    pub fn page_index(&self) -> Option<usize> {
        self.page_index.get()
    }

    /// Items per page, frozen items included.
    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Virtual item count reported by the source, excluding frozen items.
    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    /// `item_count + visible frozen count`, or `None` before the first load.
    pub fn total_item_count(&self) -> Option<usize> {
        self.total_item_count.get()
    }

    /// Whether a page transition is in progress.
    pub fn is_page_changing(&self) -> bool {
        self.is_page_changing.get()
    }

    /// Whether at least one page has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.total_item_count.get().is_some()
    }

    fn window(&self) -> PageWindow {
        PageWindow::new(self.page_size.get(), self.item_count.get())
    }

    /// Number of pages in the virtual collection.
    pub fn page_count(&self) -> usize {
        self.window().page_count()
    }

    /// Index of the last page, or `None` when there are no pages.
    pub fn last_page_index(&self) -> Option<usize> {
        self.window().last_page_index()
    }

    /// Whether there is more than one page.
    pub fn can_change_page(&self) -> bool {
        self.window().can_change_page()
    }

    /// `true` until the first load, then while the loaded page is not the
    /// last one.
    pub fn has_more_items(&self) -> bool {
        match (self.page_index.get(), self.last_page_index()) {
            (None, _) => true,
            (Some(page), Some(last)) => page < last,
            (Some(_), None) => false,
        }
    }

    // =========================================================================
    // Visible items
    // =========================================================================

    /// Number of visible items.
    pub fn count(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The visible item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    /// All visible items in order.
    pub fn items(&self) -> Vec<T> {
        self.items.read().to_vec()
    }

    /// The frozen items, visible or not.
    pub fn frozen_items(&self) -> Vec<T> {
        self.items.read().frozen().to_vec()
    }

    /// The items of the loaded page.
    pub fn paged_items(&self) -> Vec<T> {
        self.items.read().paged().to_vec()
    }

    /// Where frozen items are shown.
    pub fn frozen_position(&self) -> FrozenItemPosition {
        self.items.read().position()
    }

    /// Visible index of the first item equal to `item`.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items
            .read()
            .iter()
            .position(|candidate| self.comparer.equals(candidate, item))
    }

    /// Whether an item equal to `item` is visible.
    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    // =========================================================================
    // Page navigation
    // =========================================================================

    /// Load the page at `page_index`.
    ///
    /// Returns `Ok(false)` without any state change when the index is past
    /// the last page of a loaded collection, when a `page_changing` slot
    /// vetoes the move, or when the same window is already being fetched.
    /// Otherwise the page is always fetched, even if it is the current one.
    /// While deferred, the request is recorded and `Ok(true)` is returned.
    pub async fn move_to_page(&self, page_index: usize) -> Result<bool> {
        if !self.accepts_page(page_index) {
            tracing::debug!(target: targets::COLLECTION, page_index, "page index out of range");
            return Ok(false);
        }
        if self.defer_page(page_index) {
            return Ok(true);
        }
        let key = self.fetch_key(page_index);
        if self.loads.lock().in_flight == Some(key) {
            tracing::debug!(target: targets::COLLECTION, page_index, "page already being fetched");
            return Ok(false);
        }
        if self.signals.page_changing.emit(page_index) {
            tracing::debug!(target: targets::COLLECTION, page_index, "page change vetoed");
            return Ok(false);
        }

        let before = self.observe();
        self.is_page_changing.set(true);
        self.publish(before, false);

        Ok(self.fetch_window(page_index, true).await?.is_some())
    }

    /// Load the first page.
    pub async fn move_to_first_page(&self) -> Result<bool> {
        self.move_to_page(0).await
    }

    /// Load the last page. Fails without fetching when nothing is visible.
    pub async fn move_to_last_page(&self) -> Result<bool> {
        if self.count() == 0 {
            return Ok(false);
        }
        match self.last_page_index() {
            Some(last) => self.move_to_page(last).await,
            None => Ok(false),
        }
    }

    /// Load the page after the current one, or the first page if none is set.
    pub async fn move_to_next_page(&self) -> Result<bool> {
        let target = self.page_index.get().map_or(0, |page| page + 1);
        self.move_to_page(target).await
    }

    /// Load the page before the current one.
    pub async fn move_to_previous_page(&self) -> Result<bool> {
        match self.page_index.get() {
            Some(page) if page > 0 => self.move_to_page(page - 1).await,
            _ => Ok(false),
        }
    }

    /// Incremental-load entry point.
    ///
    /// While deferred, records the request and returns the visible count.
    /// Otherwise loads the first page if none is set, the page recorded
    /// while deferred if any, or reloads the current page; then returns the
    /// visible count. `requested` is advisory: the window size is governed
    /// by the page size.
    pub async fn load_more(&self, requested: usize) -> Result<usize> {
        let deferred_target = {
            let mut loads = self.loads.lock();
            if loads.defer_level > 0 {
                loads.reload_requested = true;
                drop(loads);
                tracing::trace!(target: targets::COLLECTION, requested, "load deferred");
                return Ok(self.count());
            }
            loads.reload_requested = false;
            loads.deferred_page_index.take()
        };

        let current = self.page_index.get();
        match (current, deferred_target) {
            (_, Some(target)) if Some(target) != current => {
                self.move_to_page(target).await?;
            }
            (Some(page), _) => {
                self.fetch_window(page, false).await?;
            }
            (None, _) => {
                self.move_to_first_page().await?;
            }
        }
        Ok(self.count())
    }

    /// Change the page size.
    ///
    /// Fails with [`CollectionError::InvalidArgument`] for zero, leaving the
    /// collection untouched. Once a page is loaded, moves to the new last
    /// page if the current one no longer exists, otherwise reloads the
    /// current page with the new size.
    pub async fn set_page_size(&self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(CollectionError::invalid_argument(
                "page_size",
                "page size must be greater than zero",
            ));
        }

        let before = self.observe();
        if !self.page_size.set(page_size) {
            return Ok(());
        }
        self.publish(before, false);

        let Some(current) = self.page_index.get() else {
            return Ok(());
        };
        match self.last_page_index() {
            Some(last) if current > last => {
                self.move_to_page(last).await?;
            }
            _ => {
                self.reload_page(current).await?;
            }
        }
        Ok(())
    }

    /// Refetch `page_index` without a page transition, or record a reload
    /// while deferred.
    async fn reload_page(&self, page_index: usize) -> Result<()> {
        {
            let mut loads = self.loads.lock();
            if loads.defer_level > 0 {
                loads.reload_requested = true;
                return Ok(());
            }
        }
        self.fetch_window(page_index, false).await?;
        Ok(())
    }

    // =========================================================================
    // Deferral
    // =========================================================================

    /// Open a deferral scope. Loads requested while any scope is open are
    /// coalesced into one load when the outermost scope ends.
    pub fn begin_defer(&self) -> DeferScope<'_, T> {
        let level = {
            let mut loads = self.loads.lock();
            loads.defer_level += 1;
            loads.defer_level
        };
        tracing::trace!(target: targets::COLLECTION, level, "defer begin");
        DeferScope::new(self)
    }

    /// Number of open deferral scopes.
    pub fn defer_level(&self) -> usize {
        self.loads.lock().defer_level
    }

    /// Whether any deferral scope is open.
    pub fn is_deferred(&self) -> bool {
        self.defer_level() > 0
    }

    /// Close one deferral level. Returns `true` when the outermost scope
    /// closed with a load pending.
    fn exit_defer(&self) -> bool {
        let mut loads = self.loads.lock();
        loads.defer_level = loads.defer_level.saturating_sub(1);
        let pending = loads.defer_level == 0 && (loads.deferred_page_index.is_some() || loads.reload_requested);
        tracing::trace!(target: targets::COLLECTION, level = loads.defer_level, pending, "defer end");
        pending
    }

    /// Record `page_index` as the deferred target if deferred.
    fn defer_page(&self, page_index: usize) -> bool {
        let mut loads = self.loads.lock();
        if loads.defer_level == 0 {
            return false;
        }
        loads.deferred_page_index = Some(page_index);
        tracing::trace!(target: targets::COLLECTION, page_index, "page move deferred");
        true
    }

    fn accepts_page(&self, page_index: usize) -> bool {
        if !self.is_loaded() {
            return true;
        }
        self.last_page_index().is_some_and(|last| page_index <= last)
    }

    // =========================================================================
    // Frozen items
    // =========================================================================

    /// Append a frozen item.
    pub async fn add_frozen(&self, item: T) -> Result<()> {
        let before = self.observe();
        let change = self.items.write().push_frozen(item);
        self.frozen_changed(before, change).await
    }

    /// Insert a frozen item at `index` among the frozen items.
    pub async fn insert_frozen(&self, index: usize, item: T) -> Result<()> {
        let before = self.observe();
        let change = self.items.write().insert_frozen(index, item)?;
        self.frozen_changed(before, change).await
    }

    /// Remove the first frozen item equal to `item`. Returns whether one was
    /// found.
    pub async fn remove_frozen(&self, item: &T) -> Result<bool> {
        let index = self
            .items
            .read()
            .frozen()
            .iter()
            .position(|candidate| self.comparer.equals(candidate, item));
        match index {
            Some(index) => {
                self.remove_frozen_at(index).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the frozen item at `index`.
    pub async fn remove_frozen_at(&self, index: usize) -> Result<T> {
        let before = self.observe();
        let (removed, change) = self.items.write().remove_frozen_at(index)?;
        self.frozen_changed(before, change).await?;
        Ok(removed)
    }

    /// Replace the frozen item at `index`, returning the old value. Never
    /// reloads.
    pub fn replace_frozen(&self, index: usize, item: T) -> Result<T> {
        let before = self.observe();
        let (old, change) = self.items.write().replace_frozen(index, item)?;
        if let Some(change) = change {
            self.signals.collection_changed.emit(change);
            self.publish(before, true);
        }
        Ok(old)
    }

    /// Remove every frozen item.
    pub async fn clear_frozen(&self) -> Result<()> {
        let before = self.observe();
        let change = self.items.write().clear_frozen();
        self.frozen_changed(before, change).await
    }

    /// Move the frozen items relative to the page.
    pub async fn set_frozen_position(&self, position: FrozenItemPosition) -> Result<()> {
        let before = self.observe();
        if before.frozen_position == position {
            return Ok(());
        }
        let change = self.items.write().set_position(position);
        self.frozen_changed(before, change).await
    }

    /// Publish a frozen-item change, then refill the window if it shrank
    /// below a full page while not on the last page.
    async fn frozen_changed(&self, before: Observed, change: Option<CollectionChange<T>>) -> Result<()> {
        if self.is_loaded() {
            self.total_item_count
                .set(Some(self.item_count.get() + self.items.read().visible_frozen_count()));
        }
        let items_changed = change.is_some();
        if let Some(change) = change {
            self.adjust_current(&change);
            self.signals.collection_changed.emit(change);
        }
        self.publish(before, items_changed);
        if before.current_position != self.current_position.get() {
            self.signals.current_changed.emit(self.current_position.get());
        }

        if let Some(page) = self.page_index.get().filter(|_| self.needs_refill()) {
            tracing::debug!(target: targets::COLLECTION, page, "frozen change left the page short, reloading");
            self.reload_page(page).await?;
        }
        Ok(())
    }

    fn needs_refill(&self) -> bool {
        let Some(page) = self.page_index.get() else {
            return false;
        };
        let on_last_page = self.last_page_index().is_none_or(|last| page >= last);
        self.count() < self.page_size.get() && !on_last_page
    }

    // =========================================================================
    // Fetch protocol
    // =========================================================================

    /// Fetch `page_index` and commit it.
    ///
    /// Returns `Ok(None)` if the same window is already in flight or a newer
    /// fetch superseded this one; `Ok(Some(count))` once committed.
    async fn fetch_window(&self, page_index: usize, transition: bool) -> Result<Option<usize>> {
        let key = self.fetch_key(page_index);
        let (_, page_size) = key;

        let ticket = {
            let mut loads = self.loads.lock();
            if loads.in_flight == Some(key) {
                tracing::debug!(target: targets::COLLECTION, page_index, page_size, "fetch already in flight");
                return Ok(None);
            }
            if loads.defer_level == 0 {
                loads.deferred_page_index = None;
                loads.reload_requested = false;
            }
            loads.in_flight = Some(key);
            loads.generation += 1;
            loads.generation
        };

        tracing::debug!(target: targets::COLLECTION, page_index, page_size, transition, "fetching page");
        let span = tracing::debug_span!(target: targets::PERF, "fetch_page", page_index, page_size);
        let result = self.source.fetch_page(page_index, page_size).instrument(span).await;

        let latest = {
            let mut loads = self.loads.lock();
            let latest = loads.generation == ticket;
            if latest {
                loads.in_flight = None;
            }
            latest
        };

        match result {
            Ok(page) if latest => {
                let count = self.commit(page, page_index, transition);
                tracing::debug!(target: targets::COLLECTION, page_index, count, "page committed");
                Ok(Some(count))
            }
            Ok(_) => {
                tracing::debug!(target: targets::COLLECTION, page_index, "fetch superseded, result discarded");
                Ok(None)
            }
            Err(err) => {
                if latest {
                    self.abandon_transition();
                }
                Err(match err {
                    PageSourceError::Cancelled => {
                        tracing::warn!(target: targets::COLLECTION, page_index, "page fetch cancelled");
                        CollectionError::Cancelled
                    }
                    PageSourceError::Failed(source) => {
                        tracing::debug!(target: targets::COLLECTION, page_index, error = %source, "page fetch failed");
                        CollectionError::SourceFailure(source)
                    }
                })
            }
        }
    }

    fn fetch_key(&self, page_index: usize) -> FetchKey {
        let frozen = self.items.read().visible_frozen_count();
        (page_index, self.window().actual_page_size(frozen))
    }

    /// Apply a fetched page. Emits the reset, the property changes, the
    /// current-position reset and, for transitions, `page_changed`.
    fn commit(&self, page: Page<T>, page_index: usize, transition: bool) -> usize {
        let before = self.observe();
        let frozen = {
            let mut items = self.items.write();
            items.replace_paged(page.items);
            items.visible_frozen_count()
        };
        self.item_count.set(page.total_count);
        self.total_item_count.set(Some(page.total_count + frozen));
        self.current_position.set(-1);
        self.page_index.set(Some(page_index));
        self.is_page_changing.set(false);

        self.signals.collection_changed.emit(CollectionChange::Reset);
        self.publish(before, true);
        self.signals.current_changed.emit(-1);
        if transition {
            self.signals.page_changed.emit(page_index);
        }
        self.count()
    }

    fn abandon_transition(&self) {
        let before = self.observe();
        if self.is_page_changing.set(false) {
            self.publish(before, false);
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    fn observe(&self) -> Observed {
        let window = self.window();
        let (count, frozen_position) = {
            let items = self.items.read();
            (items.len(), items.position())
        };
        let current_position = self.current_position.get();
        Observed {
            page_index: self.page_index.get(),
            page_size: window.page_size,
            page_count: window.page_count(),
            item_count: window.item_count,
            total_item_count: self.total_item_count.get(),
            can_change_page: window.can_change_page(),
            is_page_changing: self.is_page_changing.get(),
            count,
            frozen_position,
            current_position,
            before_first: current_position < 0,
            after_last: current_position >= count as isize,
        }
    }

    /// Emit `property_changed` for every attribute that differs from
    /// `before`. `CurrentItem` is also raised when the items changed under a
    /// current position that points into the sequence.
    fn publish(&self, before: Observed, items_changed: bool) {
        use CollectionProperty as P;

        let after = self.observe();
        if before == after && !items_changed {
            return;
        }
        let current_in_view = !after.before_first && !after.after_last;
        let changes = [
            (before.page_index != after.page_index, P::PageIndex),
            (before.page_size != after.page_size, P::PageSize),
            (before.page_count != after.page_count, P::PageCount),
            (before.item_count != after.item_count, P::ItemCount),
            (before.total_item_count != after.total_item_count, P::TotalItemCount),
            (before.can_change_page != after.can_change_page, P::CanChangePage),
            (before.is_page_changing != after.is_page_changing, P::IsPageChanging),
            (before.count != after.count, P::Count),
            (before.frozen_position != after.frozen_position, P::FrozenItemPosition),
            (before.current_position != after.current_position, P::CurrentPosition),
            (
                before.current_position != after.current_position || (items_changed && current_in_view),
                P::CurrentItem,
            ),
            (before.before_first != after.before_first, P::IsCurrentBeforeFirst),
            (before.after_last != after.after_last, P::IsCurrentAfterLast),
        ];
        self.signals
            .emit_properties(changes.into_iter().filter_map(|(changed, property)| changed.then_some(property)));
    }
}

static_assertions::assert_impl_all!(PagedCollection<String>: Send, Sync);
