use serde::Serialize;

pub const PER_PAGE: usize = 25;

/// One page of an already fully fetched result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
}

impl<T> Page<T> {
    /// Slice `items` down to the requested 1-based page. Page 0 is treated as
    /// page 1; pages past the end are empty but keep `total`.
    pub fn new(items: Vec<T>, page: usize) -> Self {
        Self::with_size(items, page, PER_PAGE)
    }

    pub fn with_size(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len();
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Self {
            items,
            total,
            page,
            per_page,
        }
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    /// 1-based index of the first item on this page, 0 when the page is empty.
    pub fn start(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last item on this page, 0 when the page is empty.
    pub fn end(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.start() + self.items.len() - 1
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let page = Page::new((1..=60).collect::<Vec<_>>(), 1);
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.items[0], 1);
        assert_eq!(page.total, 60);
        assert_eq!(page.page_count(), 3);
        assert_eq!((page.start(), page.end()), (1, 25));
        assert!(!page.has_prev());
        assert!(page.has_next());
    }

    #[test]
    fn test_last_partial_page() {
        let page = Page::new((1..=60).collect::<Vec<_>>(), 3);
        assert_eq!(page.items, (51..=60).collect::<Vec<_>>());
        assert_eq!((page.start(), page.end()), (51, 60));
        assert!(page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = Page::new((1..=10).collect::<Vec<_>>(), 4);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 10);
        assert_eq!((page.start(), page.end()), (0, 0));
    }

    #[test]
    fn test_page_zero_is_first_page() {
        let page = Page::new(vec!["a", "b"], 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_results() {
        let page: Page<u8> = Page::new(vec![], 1);
        assert_eq!(page.page_count(), 0);
        assert!(!page.has_next());
        assert_eq!(page.start(), 0);
    }
}
