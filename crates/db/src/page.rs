use serde::Serialize;

/// One page of query results plus the cursor math list endpoints need to
/// render previous/next links.
///
/// `offset` is always `page * page_size` for the page size the query ran
/// with; `prev`/`next` are derived once at construction and serialized
/// alongside the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub offset: u64,
    pub total: u64,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total: u64) -> Self {
        let offset = u64::from(page) * u64::from(page_size);
        let prev = page.checked_sub(1);
        let next = if offset + (items.len() as u64) < total {
            Some(page + 1)
        } else {
            None
        };

        Self {
            items,
            page,
            offset,
            total,
            prev,
            next,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_page_times_page_size() {
        for (page, page_size) in [(0u32, 10u32), (1, 10), (3, 25), (7, 1)] {
            let page_result = Page::new(vec![0u8; 1], page, page_size, 1000);
            assert_eq!(page_result.offset, u64::from(page) * u64::from(page_size));
        }
    }

    #[test]
    fn first_page_has_no_prev() {
        let page = Page::new(vec![1, 2, 3], 0, 10, 3);
        assert_eq!(page.prev, None);
        assert_eq!(page.next, None);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = Page::new(vec![1; 10], 1, 10, 30);
        assert_eq!(page.prev, Some(0));
        assert_eq!(page.next, Some(2));
    }

    #[test]
    fn next_absent_when_page_reaches_total() {
        let page = Page::new(vec![1; 5], 2, 10, 25);
        assert_eq!(page.offset, 20);
        assert_eq!(page.next, None);
        assert_eq!(page.prev, Some(1));
    }

    #[test]
    fn empty_page_past_the_end_still_links_back() {
        // Five matching rows, ten per page: page 1 is empty but reachable.
        let page: Page<u8> = Page::new(vec![], 1, 10, 5);
        assert!(page.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.prev, Some(0));
        assert_eq!(page.next, None);
    }

    #[test]
    fn serializes_with_links() {
        let page = Page::new(vec![42u8], 0, 10, 11);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["offset"], 0);
        assert_eq!(value["total"], 11);
        assert_eq!(value["prev"], serde_json::Value::Null);
        assert_eq!(value["next"], 1);
    }
}
