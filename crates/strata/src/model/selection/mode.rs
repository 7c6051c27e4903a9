//! Selection policy and tri-state values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which nodes carry their own selection.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionScope {
    /// Only leaves are assigned directly; internal nodes are derived.
    Leaf,
    /// Every node can be assigned directly.
    #[default]
    All,
}

/// Selection policy for a [`SelectionTree`](super::SelectionTree).
///
/// Combines a [`SelectionScope`] with the `synchronize` flag, which cascades
/// every change down to descendants and recomputes ancestors.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionMode {
    /// Which nodes may be assigned directly.
    pub scope: SelectionScope,
    /// Whether changes cascade through the tree.
    pub synchronize: bool,
}

impl SelectionMode {
    /// Leaves only, no cascade.
    pub const LEAF: Self = Self {
        scope: SelectionScope::Leaf,
        synchronize: false,
    };

    /// Every node, no cascade.
    pub const ALL: Self = Self {
        scope: SelectionScope::All,
        synchronize: false,
    };

    /// Leaves only; internal nodes aggregate their children.
    pub const LEAF_SYNCHRONIZED: Self = Self {
        scope: SelectionScope::Leaf,
        synchronize: true,
    };

    /// Every node, with downward cascade and upward aggregation.
    pub const ALL_SYNCHRONIZED: Self = Self {
        scope: SelectionScope::All,
        synchronize: true,
    };

    /// Set the cascade flag.
    pub const fn with_synchronize(mut self, synchronize: bool) -> Self {
        self.synchronize = synchronize;
        self
    }

    /// Whether internal nodes may be assigned directly.
    pub fn allows_internal(&self) -> bool {
        self.scope == SelectionScope::All
    }
}

impl Default for SelectionMode {
    fn default() -> Self {
        Self::ALL_SYNCHRONIZED
    }
}

/// Tri-state selection of a node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionState {
    /// The node is selected.
    Selected,
    /// The node is not selected.
    #[default]
    Unselected,
    /// Some but not all children are selected.
    Indeterminate,
}

impl SelectionState {
    /// `Some(true)` for selected, `Some(false)` for unselected, `None` for
    /// indeterminate.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Selected => Some(true),
            Self::Unselected => Some(false),
            Self::Indeterminate => None,
        }
    }

    /// Check-box glyph used in tree dumps.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Selected => "[x]",
            Self::Unselected => "[ ]",
            Self::Indeterminate => "[-]",
        }
    }

    /// Aggregate of a sequence of child states: selected if all are,
    /// unselected if none are, otherwise indeterminate. `None` when empty.
    pub fn aggregate<I>(states: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut states = states.into_iter();
        let first = states.next()?;
        if first == Self::Indeterminate {
            return Some(Self::Indeterminate);
        }
        for state in states {
            if state != first {
                return Some(Self::Indeterminate);
            }
        }
        Some(first)
    }
}

impl From<bool> for SelectionState {
    fn from(selected: bool) -> Self {
        if selected {
            Self::Selected
        } else {
            Self::Unselected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_constants() {
        assert_eq!(SelectionMode::default(), SelectionMode::ALL_SYNCHRONIZED);
        assert_eq!(SelectionMode::LEAF.with_synchronize(true), SelectionMode::LEAF_SYNCHRONIZED);
        assert!(!SelectionMode::LEAF.allows_internal());
        assert!(SelectionMode::ALL.allows_internal());
    }

    #[test]
    fn test_aggregate() {
        use SelectionState::*;
        assert_eq!(SelectionState::aggregate([]), None);
        assert_eq!(SelectionState::aggregate([Selected, Selected]), Some(Selected));
        assert_eq!(SelectionState::aggregate([Unselected]), Some(Unselected));
        assert_eq!(SelectionState::aggregate([Selected, Unselected]), Some(Indeterminate));
        assert_eq!(SelectionState::aggregate([Indeterminate]), Some(Indeterminate));
        assert_eq!(SelectionState::aggregate([Unselected, Indeterminate]), Some(Indeterminate));
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(SelectionState::from(true).as_bool(), Some(true));
        assert_eq!(SelectionState::from(false).as_bool(), Some(false));
        assert_eq!(SelectionState::Indeterminate.as_bool(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&SelectionMode::LEAF_SYNCHRONIZED).unwrap();
        let mode: SelectionMode = serde_json::from_str(&json).unwrap();
        assert_eq!(mode, SelectionMode::LEAF_SYNCHRONIZED);
    }
}
