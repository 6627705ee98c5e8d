//! This module defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of transactions to load per page when not specified in a request.
    pub default_page_size: u64,
    /// The upper bound on the page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A normalized request for a single page of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// The 1-indexed page number.
    pub page: u64,
    /// The number of rows per page.
    pub per_page: u64,
}

impl PageQuery {
    /// Create a page query from optional request parameters, clamping the
    /// values to sensible bounds.
    pub fn new(page: Option<u64>, per_page: Option<u64>, config: &PaginationConfig) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);

        Self { page, per_page }
    }

    /// The number of rows to skip for this page.
    pub fn offset(self) -> u64 {
        (self.page - 1) * self.per_page
    }

    /// The number of rows to fetch, including one look-ahead row used to
    /// detect whether another page follows this one.
    pub fn limit_with_lookahead(self) -> u64 {
        self.per_page + 1
    }
}

/// A single page of rows plus whether more pages follow.
#[derive(Debug, PartialEq)]
pub struct Page<T> {
    /// The rows on this page.
    pub items: Vec<T>,
    /// The 1-indexed page number.
    pub number: u64,
    /// Whether at least one more row exists past this page.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Assemble a page from rows fetched with [PageQuery::limit_with_lookahead].
    ///
    /// The look-ahead row, if present, is dropped from the page and recorded
    /// as `has_more`.
    pub fn from_rows(mut rows: Vec<T>, query: PageQuery) -> Self {
        let has_more = rows.len() as u64 > query.per_page;
        rows.truncate(query.per_page as usize);

        Self {
            items: rows,
            number: query.page,
            has_more,
        }
    }
}
