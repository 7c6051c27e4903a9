//! Change notifications published by collections.
//!
//! Views (or tests) subscribe to [`CollectionSignals`] to stay synchronized
//! with a collection. Structural changes arrive as [`CollectionChange`]
//! values whose indices are expressed in the collection's visible (merged)
//! index space; scalar attribute changes arrive as [`CollectionProperty`]
//! names.

use std::fmt;

use strata_core::{CancelableSignal, Signal};

/// A structural change to a visible item sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange<T> {
    /// `items` were inserted starting at `index`.
    Add {
        /// Position of the first inserted item.
        index: usize,
        /// The inserted items, in order.
        items: Vec<T>,
    },
    /// `items` were removed starting at `index`.
    Remove {
        /// Position of the first removed item.
        index: usize,
        /// The removed items, in order.
        items: Vec<T>,
    },
    /// The item at `index` was replaced.
    Replace {
        /// Position of the replaced item.
        index: usize,
        /// The previous value.
        old: T,
        /// The new value.
        new: T,
    },
    /// The sequence changed wholesale; re-read everything.
    Reset,
}

impl<T> CollectionChange<T> {
    /// Shift the change's index by `offset` (for merging sub-sequences).
    pub fn offset(self, offset: usize) -> Self {
        match self {
            Self::Add { index, items } => Self::Add {
                index: index + offset,
                items,
            },
            Self::Remove { index, items } => Self::Remove {
                index: index + offset,
                items,
            },
            Self::Replace { index, old, new } => Self::Replace {
                index: index + offset,
                old,
                new,
            },
            Self::Reset => Self::Reset,
        }
    }

    /// The first visible index touched, or `None` for a reset.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Add { index, .. } | Self::Remove { index, .. } | Self::Replace { index, .. } => {
                Some(*index)
            }
            Self::Reset => None,
        }
    }
}

/// Observable attributes of a paged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionProperty {
    /// Index of the loaded page.
    PageIndex,
    /// Requested page size.
    PageSize,
    /// Number of pages in the virtual collection.
    PageCount,
    /// Virtual item count excluding frozen items.
    ItemCount,
    /// Virtual item count including visible frozen items.
    TotalItemCount,
    /// Whether more than one page exists.
    CanChangePage,
    /// Whether a page transition is in progress.
    IsPageChanging,
    /// Number of visible items.
    Count,
    /// Position of the frozen items relative to the page.
    FrozenItemPosition,
    /// The current item.
    CurrentItem,
    /// The current position.
    CurrentPosition,
    /// Whether the current position is before the first item.
    IsCurrentBeforeFirst,
    /// Whether the current position is after the last item.
    IsCurrentAfterLast,
}

impl CollectionProperty {
    /// The property's conventional name.
    pub fn name(self) -> &'static str {
        match self {
            Self::PageIndex => "PageIndex",
            Self::PageSize => "PageSize",
            Self::PageCount => "PageCount",
            Self::ItemCount => "ItemCount",
            Self::TotalItemCount => "TotalItemCount",
            Self::CanChangePage => "CanChangePage",
            Self::IsPageChanging => "IsPageChanging",
            Self::Count => "Count",
            Self::FrozenItemPosition => "FrozenItemPosition",
            Self::CurrentItem => "CurrentItem",
            Self::CurrentPosition => "CurrentPosition",
            Self::IsCurrentBeforeFirst => "IsCurrentBeforeFirst",
            Self::IsCurrentAfterLast => "IsCurrentAfterLast",
        }
    }
}

impl fmt::Display for CollectionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collection of signals emitted by a paged collection.
///
/// # Signal Order
///
/// A page load emits, in order: `page_changing` (cancelable, only for page
/// transitions), `collection_changed(Reset)`, property notifications for the
/// counts, `current_changed` with the reset position, then `page_changed`.
pub struct CollectionSignals<T> {
    /// Emitted after the visible sequence changed.
    pub collection_changed: Signal<CollectionChange<T>>,

    /// Emitted after an observable attribute changed.
    pub property_changed: Signal<CollectionProperty>,

    /// Emitted before a page transition. Args: target page index.
    /// Any slot returning `true` cancels the transition.
    pub page_changing: CancelableSignal<usize>,

    /// Emitted after a page transition completed. Args: new page index.
    pub page_changed: Signal<usize>,

    /// Emitted before the current position moves. Args: target position.
    /// Any slot returning `true` cancels the move.
    pub current_changing: CancelableSignal<isize>,

    /// Emitted after the current position moved. Args: new position.
    pub current_changed: Signal<isize>,
}

impl<T: 'static> Default for CollectionSignals<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> CollectionSignals<T> {
    /// Creates a new set of collection signals.
    pub fn new() -> Self {
        Self {
            collection_changed: Signal::new(),
            property_changed: Signal::new(),
            page_changing: CancelableSignal::new(),
            page_changed: Signal::new(),
            current_changing: CancelableSignal::new(),
            current_changed: Signal::new(),
        }
    }

    /// Emits `property_changed` for each property in order.
    pub fn emit_properties<I>(&self, properties: I)
    where
        I: IntoIterator<Item = CollectionProperty>,
    {
        for property in properties {
            self.property_changed.emit(property);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_change_offset() {
        let change = CollectionChange::Add {
            index: 1,
            items: vec!["x"],
        };
        assert_eq!(
            change.offset(2),
            CollectionChange::Add {
                index: 3,
                items: vec!["x"]
            }
        );
        assert_eq!(CollectionChange::<u8>::Reset.offset(4), CollectionChange::Reset);
        assert_eq!(CollectionChange::<u8>::Reset.index(), None);
    }

    #[test]
    fn test_emit_properties_in_order() {
        let signals = CollectionSignals::<u32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let recv = received.clone();
        signals.property_changed.connect(move |p| recv.lock().push(*p));
        signals.emit_properties([CollectionProperty::ItemCount, CollectionProperty::PageCount]);

        assert_eq!(
            *received.lock(),
            vec![CollectionProperty::ItemCount, CollectionProperty::PageCount]
        );
    }

    #[test]
    fn test_property_names() {
        assert_eq!(CollectionProperty::TotalItemCount.to_string(), "TotalItemCount");
        assert_eq!(CollectionProperty::IsPageChanging.name(), "IsPageChanging");
    }
}
