//! Injectable item equality.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Equality and hashing for collection items.
///
/// Collections never rely on `T: PartialEq` directly; they go through a
/// comparer so callers can match items by key instead of by full value.
/// `hash_of` must agree with `equals`: equal items produce equal hashes.
pub trait ItemComparer<T>: Send + Sync {
    /// Returns `true` if the two items are considered the same.
    fn equals(&self, a: &T, b: &T) -> bool;

    /// Hash of `value`, consistent with [`equals`](Self::equals).
    fn hash_of(&self, value: &T) -> u64;
}

/// Natural equality via `Eq` and `Hash`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComparer;

impl<T: Eq + Hash> ItemComparer<T> for DefaultComparer {
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn hash_of(&self, value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }
}

/// Compares items by a projected key.
///
/// ```
/// use strata::model::{ItemComparer, KeyComparer};
///
/// struct Row { id: u32, label: String }
///
/// let by_id = KeyComparer::new(|row: &Row| row.id);
/// let a = Row { id: 1, label: "a".into() };
/// let b = Row { id: 1, label: "renamed".into() };
/// assert!(by_id.equals(&a, &b));
/// ```
pub struct KeyComparer<T, K> {
    key: Arc<dyn Fn(&T) -> K + Send + Sync>,
}

impl<T, K> KeyComparer<T, K> {
    /// Create a comparer that matches items whose keys are equal.
    pub fn new<F>(key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { key: Arc::new(key) }
    }
}

impl<T, K: Eq + Hash> ItemComparer<T> for KeyComparer<T, K> {
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.key)(a) == (self.key)(b)
    }

    fn hash_of(&self, value: &T) -> u64 {
        ItemComparer::<K>::hash_of(&DefaultComparer, &(self.key)(value))
    }
}

/// Shared handle to a comparer.
pub type SharedComparer<T> = Arc<dyn ItemComparer<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_comparer() {
        let cmp = DefaultComparer;
        assert!(cmp.equals(&"a", &"a"));
        assert!(!cmp.equals(&"a", &"b"));
        assert_eq!(cmp.hash_of(&7u32), cmp.hash_of(&7u32));
    }

    #[test]
    fn test_key_comparer_ignores_other_fields() {
        let cmp = KeyComparer::new(|pair: &(u32, &str)| pair.0);
        assert!(cmp.equals(&(1, "x"), &(1, "y")));
        assert!(!cmp.equals(&(1, "x"), &(2, "x")));
        assert_eq!(cmp.hash_of(&(3, "x")), cmp.hash_of(&(3, "z")));
    }
}
