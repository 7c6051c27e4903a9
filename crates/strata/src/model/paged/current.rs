//! Current-item tracking.
//!
//! The current position is `-1` before the first item and `count` after the
//! last one. Every move raises the cancelable `current_changing` first, then
//! the property notifications and `current_changed`.

use strata_core::logging::targets;

use super::PagedCollection;
use crate::model::change::CollectionChange;

impl<T: Clone + Send + Sync + 'static> PagedCollection<T> {
    /// The current position.
    pub fn current_position(&self) -> isize {
        self.current_position.get()
    }

    /// The item at the current position, if it points into the sequence.
    pub fn current_item(&self) -> Option<T> {
        let position = usize::try_from(self.current_position.get()).ok()?;
        self.get(position)
    }

    /// Whether the current position is before the first item.
    pub fn is_current_before_first(&self) -> bool {
        self.current_position.get() < 0
    }

    /// Whether the current position is past the last item.
    pub fn is_current_after_last(&self) -> bool {
        self.current_position.get() >= self.count() as isize
    }

    /// Move the current position to `position` (`-1..=count`).
    ///
    /// Returns whether the new current item is inside the sequence. Returns
    /// `false` without moving if the position is out of range or a
    /// `current_changing` slot vetoes the move.
    pub fn move_current_to_position(&self, position: isize) -> bool {
        let count = self.count() as isize;
        if !(-1..=count).contains(&position) {
            return false;
        }
        if position != self.current_position.get() {
            if self.signals.current_changing.emit(position) {
                tracing::debug!(target: targets::COLLECTION, position, "current change vetoed");
                return false;
            }
            let before = self.observe();
            self.current_position.set(position);
            self.publish(before, false);
            self.signals.current_changed.emit(position);
        }
        (0..count).contains(&position)
    }

    /// Move to the first item.
    pub fn move_current_to_first(&self) -> bool {
        self.move_current_to_position(0)
    }

    /// Move to the last item.
    pub fn move_current_to_last(&self) -> bool {
        self.move_current_to_position(self.count() as isize - 1)
    }

    /// Move to the next item, or past the last one.
    pub fn move_current_to_next(&self) -> bool {
        let position = self.current_position.get();
        position < self.count() as isize && self.move_current_to_position(position + 1)
    }

    /// Move to the previous item, or before the first one.
    pub fn move_current_to_previous(&self) -> bool {
        let position = self.current_position.get();
        position >= 0 && self.move_current_to_position(position - 1)
    }

    /// Move to the first item equal to `item`, or before the first item if
    /// there is none.
    pub fn move_current_to(&self, item: &T) -> bool {
        let position = self.index_of(item).map_or(-1, |index| index as isize);
        self.move_current_to_position(position)
    }

    /// Keep the current position on the same item across a structural
    /// change. A removed current item leaves the position before the first.
    pub(super) fn adjust_current(&self, change: &CollectionChange<T>) {
        let position = self.current_position.get();
        if position < 0 {
            return;
        }
        let adjusted = match change {
            CollectionChange::Add { index, items } if position >= *index as isize => position + items.len() as isize,
            CollectionChange::Remove { index, items } => {
                let start = *index as isize;
                let end = start + items.len() as isize;
                if position >= end {
                    position - items.len() as isize
                } else if position >= start {
                    -1
                } else {
                    position
                }
            }
            CollectionChange::Reset => -1,
            _ => position,
        };
        self.current_position.set(adjusted);
    }
}
