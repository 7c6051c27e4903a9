//! Frozen-item merging.
//!
//! A paged collection shows two sub-sequences as one: the *frozen* items,
//! which stay visible regardless of the loaded page, and the *paged* items
//! of the current window. [`FrozenMerge`] owns both and translates every
//! mutation into a single [`CollectionChange`] in the merged index space.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::change::CollectionChange;
use super::error::{CollectionError, Result};

/// Where frozen items appear relative to the paged items.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrozenItemPosition {
    /// Frozen items are held but not shown, and do not reduce page capacity.
    None,
    /// Frozen items precede the paged items.
    #[default]
    Before,
    /// Frozen items follow the paged items.
    After,
}

/// The merged frozen + paged item sequence.
///
/// Visible order is `frozen ++ paged` for [`FrozenItemPosition::Before`],
/// `paged ++ frozen` for [`FrozenItemPosition::After`], and just `paged`
/// for [`FrozenItemPosition::None`].
#[derive(Debug, Clone)]
pub struct FrozenMerge<T> {
    frozen: Vec<T>,
    paged: Vec<T>,
    position: FrozenItemPosition,
}

impl<T> Default for FrozenMerge<T> {
    fn default() -> Self {
        Self::new(FrozenItemPosition::default())
    }
}

impl<T> FrozenMerge<T> {
    /// Creates an empty merge with the given frozen position.
    pub fn new(position: FrozenItemPosition) -> Self {
        Self {
            frozen: Vec::new(),
            paged: Vec::new(),
            position,
        }
    }

    /// The frozen position.
    pub fn position(&self) -> FrozenItemPosition {
        self.position
    }

    /// Number of visible items.
    pub fn len(&self) -> usize {
        self.paged.len() + self.visible_frozen_count()
    }

    /// Returns `true` if nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All frozen items, visible or not.
    pub fn frozen(&self) -> &[T] {
        &self.frozen
    }

    /// The paged items of the current window.
    pub fn paged(&self) -> &[T] {
        &self.paged
    }

    /// Number of frozen items that take part in the visible sequence.
    pub fn visible_frozen_count(&self) -> usize {
        match self.position {
            FrozenItemPosition::None => 0,
            _ => self.frozen.len(),
        }
    }

    /// Visible index of the first frozen item.
    fn frozen_offset(&self) -> usize {
        match self.position {
            FrozenItemPosition::After => self.paged.len(),
            _ => 0,
        }
    }

    /// Visible index of the first paged item.
    pub fn paged_offset(&self) -> usize {
        match self.position {
            FrozenItemPosition::Before => self.frozen.len(),
            _ => 0,
        }
    }

    /// The visible item at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.position {
            FrozenItemPosition::None => self.paged.get(index),
            FrozenItemPosition::Before => {
                if index < self.frozen.len() {
                    self.frozen.get(index)
                } else {
                    self.paged.get(index - self.frozen.len())
                }
            }
            FrozenItemPosition::After => {
                if index < self.paged.len() {
                    self.paged.get(index)
                } else {
                    self.frozen.get(index - self.paged.len())
                }
            }
        }
    }

    /// Iterate the visible sequence in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (head, tail) = match self.position {
            FrozenItemPosition::None => (self.paged.as_slice(), &[][..]),
            FrozenItemPosition::Before => (self.frozen.as_slice(), self.paged.as_slice()),
            FrozenItemPosition::After => (self.paged.as_slice(), self.frozen.as_slice()),
        };
        head.iter().chain(tail.iter())
    }

    /// Lift a frozen-relative change into the visible index space.
    fn lift(&self, change: CollectionChange<T>) -> Option<CollectionChange<T>> {
        match self.position {
            FrozenItemPosition::None => None,
            _ => Some(change.offset(self.frozen_offset())),
        }
    }

    /// Replace the paged window wholesale.
    pub fn replace_paged(&mut self, items: Vec<T>) -> CollectionChange<T> {
        self.paged = items;
        CollectionChange::Reset
    }

    /// Change the frozen position. Returns a reset if anything visible moved.
    pub fn set_position(&mut self, position: FrozenItemPosition) -> Option<CollectionChange<T>> {
        if self.position == position {
            return None;
        }
        self.position = position;
        (!self.frozen.is_empty()).then_some(CollectionChange::Reset)
    }
}

impl<T: Clone> FrozenMerge<T> {
    /// The visible sequence as an owned vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Append a frozen item.
    pub fn push_frozen(&mut self, item: T) -> Option<CollectionChange<T>> {
        let index = self.frozen.len();
        self.frozen.push(item.clone());
        self.lift(CollectionChange::Add {
            index,
            items: vec![item],
        })
    }

    /// Insert a frozen item at `index` within the frozen items.
    pub fn insert_frozen(&mut self, index: usize, item: T) -> Result<Option<CollectionChange<T>>> {
        if index > self.frozen.len() {
            return Err(CollectionError::invalid_argument(
                "index",
                format!("frozen index {index} out of range (len {})", self.frozen.len()),
            ));
        }
        self.frozen.insert(index, item.clone());
        Ok(self.lift(CollectionChange::Add {
            index,
            items: vec![item],
        }))
    }

    /// Remove the frozen item at `index`.
    pub fn remove_frozen_at(&mut self, index: usize) -> Result<(T, Option<CollectionChange<T>>)> {
        if index >= self.frozen.len() {
            return Err(CollectionError::invalid_argument(
                "index",
                format!("frozen index {index} out of range (len {})", self.frozen.len()),
            ));
        }
        let item = self.frozen.remove(index);
        let change = self.lift(CollectionChange::Remove {
            index,
            items: vec![item.clone()],
        });
        Ok((item, change))
    }

    /// Replace the frozen item at `index`, returning the old value.
    pub fn replace_frozen(&mut self, index: usize, item: T) -> Result<(T, Option<CollectionChange<T>>)> {
        let len = self.frozen.len();
        let Some(slot) = self.frozen.get_mut(index) else {
            return Err(CollectionError::invalid_argument(
                "index",
                format!("frozen index {index} out of range (len {len})"),
            ));
        };
        let old = std::mem::replace(slot, item.clone());
        let change = self.lift(CollectionChange::Replace {
            index,
            old: old.clone(),
            new: item,
        });
        Ok((old, change))
    }

    /// Remove every frozen item.
    pub fn clear_frozen(&mut self) -> Option<CollectionChange<T>> {
        if self.frozen.is_empty() {
            return None;
        }
        let items = std::mem::take(&mut self.frozen);
        self.lift(CollectionChange::Remove { index: 0, items })
    }
}
