use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page request coming off the query string.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Clamps the size into a sane range so a caller cannot request a
    /// zero-sized or unbounded page.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page,
            size: self.size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub is_last: bool,
}

impl<T> PagedResponse<T> {
    pub fn new(items: Vec<T>, params: PageParams, total_elements: u64) -> Self {
        let size = u64::from(params.size.max(1));
        let total_pages = total_elements.div_ceil(size);
        let is_last = total_elements == 0 || u64::from(params.page) + 1 >= total_pages;
        Self {
            items,
            page: params.page,
            size: params.size,
            total_elements,
            total_pages,
            is_last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_accurate_counts() {
        let page = PagedResponse::<i32>::new(Vec::new(), PageParams::default(), 0);
        assert_eq!(page.total_elements, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.is_last);
        assert!(page.items.is_empty());
    }

    #[test]
    fn partial_last_page_counts() {
        let page = PagedResponse::new(vec![1], PageParams::new(2, 5), 11);
        assert_eq!(page.total_pages, 3);
        assert!(page.is_last);
    }

    #[test]
    fn middle_page_is_not_last() {
        let page = PagedResponse::new(vec![1, 2, 3, 4, 5], PageParams::new(0, 5), 11);
        assert_eq!(page.total_pages, 3);
        assert!(!page.is_last);
    }

    #[test]
    fn size_is_clamped() {
        let params = PageParams::new(0, 0).normalized();
        assert_eq!(params.size, 1);
        let params = PageParams::new(0, 10_000).normalized();
        assert_eq!(params.size, 100);
    }
}
