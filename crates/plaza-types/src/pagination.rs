use serde::{Deserialize, Serialize};

pub const MAX_PER_PAGE: u32 = 100;

pub const FEED_PER_PAGE: u32 = 10;
pub const USER_POSTS_PER_PAGE: u32 = 10;
pub const FOLLOWS_PER_PAGE: u32 = 20;
pub const COMMENTS_PER_PAGE: u32 = 20;

/// A resolved page request. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Missing values fall back to page 1 and `default_per_page`; page 0 is
    /// treated as page 1 and `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

/// One page of results as read from the store.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let per_page = i64::from(pagination.per_page);
        Self {
            items,
            total,
            pages: (total + per_page - 1) / per_page,
            current_page: pagination.page,
            per_page: pagination.per_page,
        }
    }

    /// Split into the items and the counters that accompany them on the wire.
    pub fn into_parts(self) -> (Vec<T>, PageMeta) {
        let meta = PageMeta {
            total: self.total,
            pages: self.pages,
            current_page: self.current_page,
            per_page: self.per_page,
        };
        (self.items, meta)
    }
}

/// Counters flattened next to the list in every paginated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
    pub per_page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = Pagination::new(None, None, FEED_PER_PAGE);
        assert_eq!(p, Pagination { page: 1, per_page: 10 });

        let p = Pagination::new(Some(0), Some(0), FEED_PER_PAGE);
        assert_eq!(p, Pagination { page: 1, per_page: 1 });

        let p = Pagination::new(Some(3), Some(5000), FOLLOWS_PER_PAGE);
        assert_eq!(p.per_page, MAX_PER_PAGE);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn page_count_rounds_up() {
        let p = Pagination::new(Some(1), Some(10), FEED_PER_PAGE);
        assert_eq!(Page::<()>::new(vec![], 0, p).pages, 0);
        assert_eq!(Page::<()>::new(vec![], 10, p).pages, 1);
        assert_eq!(Page::<()>::new(vec![], 11, p).pages, 2);
    }

    #[test]
    fn parts_carry_the_counters() {
        let p = Pagination::new(Some(2), Some(2), FEED_PER_PAGE);
        let (items, meta) = Page::new(vec!['c'], 3, p).into_parts();
        assert_eq!(items, vec!['c']);
        assert_eq!(
            meta,
            PageMeta {
                total: 3,
                pages: 2,
                current_page: 2,
                per_page: 2
            }
        );
    }
}
