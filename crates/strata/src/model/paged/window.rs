//! Page window arithmetic.

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Derived page geometry for a page size and a virtual item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Requested items per page. Always greater than zero.
    pub page_size: usize,
    /// Virtual item count, excluding frozen items.
    pub item_count: usize,
}

impl PageWindow {
    /// Create a window.
    pub fn new(page_size: usize, item_count: usize) -> Self {
        Self {
            page_size,
            item_count,
        }
    }

    /// `ceil(item_count / page_size)`.
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.item_count.div_ceil(self.page_size)
    }

    /// Index of the last page, or `None` when there are no pages.
    pub fn last_page_index(&self) -> Option<usize> {
        self.page_count().checked_sub(1)
    }

    /// Whether there is more than one page to move between.
    pub fn can_change_page(&self) -> bool {
        self.page_count() > 1
    }

    /// Items to request from the source when `frozen_count` slots are taken
    /// by frozen items. Never less than one.
    pub fn actual_page_size(&self, frozen_count: usize) -> usize {
        self.page_size.saturating_sub(frozen_count).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        for page_size in 1..6 {
            for item_count in 0..30 {
                let window = PageWindow::new(page_size, item_count);
                let expected = (item_count + page_size - 1) / page_size;
                assert_eq!(window.page_count(), expected);
                assert_eq!(window.can_change_page(), expected > 1);
            }
        }
    }

    #[test]
    fn test_seven_items_in_threes() {
        let window = PageWindow::new(3, 7);
        assert_eq!(window.page_count(), 3);
        assert_eq!(window.last_page_index(), Some(2));
        assert!(window.can_change_page());
    }

    #[test]
    fn test_empty_window_has_no_last_page() {
        let window = PageWindow::new(10, 0);
        assert_eq!(window.page_count(), 0);
        assert_eq!(window.last_page_index(), None);
        assert!(!window.can_change_page());
    }

    #[test]
    fn test_actual_page_size_never_zero() {
        let window = PageWindow::new(3, 0);
        assert_eq!(window.actual_page_size(0), 3);
        assert_eq!(window.actual_page_size(1), 2);
        assert_eq!(window.actual_page_size(3), 1);
        assert_eq!(window.actual_page_size(8), 1);
    }
}
