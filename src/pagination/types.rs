//! Pagination types
//!
//! Defines the page request/result pair exchanged with a page-fetch closure
//! and the state carried across the pages of one load.

/// Offset and size of one page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based index of the first item
    pub offset: u32,
    /// Maximum number of items to return, always positive
    pub limit: u32,
}

impl PageRequest {
    /// Create a page request
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Query fragment in the server's convention, `start=..&max-results=..`
    pub fn query(&self) -> String {
        format!("start={}&max-results={}", self.offset, self.limit)
    }
}

/// One decoded page of a collection resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    /// Items on this page, in server order
    pub items: Vec<T>,
    /// Size of the whole collection as reported by the server
    pub total_results: u32,
}

impl<T> PageResult<T> {
    /// Create a page result
    pub fn new(items: Vec<T>, total_results: u32) -> Self {
        Self {
            items,
            total_results,
        }
    }

    /// Create an empty page reporting the given total
    pub fn empty(total_results: u32) -> Self {
        Self::new(Vec::new(), total_results)
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page carries no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Tracks a paged load from the first request to completion
#[derive(Debug, Clone)]
pub struct PagedFetchState<T> {
    /// Items gathered so far, in offset order
    pub accumulated: Vec<T>,
    /// Offset of the next page to request
    pub next_offset: u32,
    /// Server total, known once the first page is in
    pub total_results: Option<u32>,
    /// Client-side cap on the number of items
    pub cap: Option<u32>,
    /// Whether the last absorbed page came back without items
    pub last_page_empty: bool,
}

impl<T> PagedFetchState<T> {
    /// Create a fresh state
    pub fn new(cap: Option<u32>) -> Self {
        Self {
            accumulated: Vec::new(),
            next_offset: 0,
            total_results: None,
            cap,
            last_page_empty: false,
        }
    }

    /// Number of items gathered so far
    pub fn fetched(&self) -> u32 {
        self.accumulated.len() as u32
    }

    /// Number of items the load is expected to produce, once known
    pub fn expected(&self) -> Option<u32> {
        let total = self.total_results?;
        Some(match self.cap {
            Some(cap) => cap.min(total),
            None => total,
        })
    }

    /// Build the next request, shrinking the limit to what the cap still needs
    pub fn next_request(&self, page_size: u32) -> PageRequest {
        let limit = match self.cap {
            Some(cap) => page_size.min(cap.saturating_sub(self.fetched())),
            None => page_size,
        };
        PageRequest::new(self.next_offset, limit)
    }

    /// Fold one page into the state.
    ///
    /// The total is taken from the first page only, and the accumulated
    /// items never grow past it or past the cap.
    pub fn absorb(&mut self, request: PageRequest, page: PageResult<T>) {
        let total = *self.total_results.get_or_insert(page.total_results);
        let ceiling = self.cap.map_or(total, |cap| cap.min(total));
        self.last_page_empty = page.items.is_empty();
        let room = ceiling.saturating_sub(self.fetched()) as usize;
        self.accumulated.extend(page.items.into_iter().take(room));
        self.next_offset = request.offset.saturating_add(request.limit);
    }

    /// Whether the server total or the cap has been reached
    pub fn is_complete(&self) -> bool {
        let fetched = self.fetched();
        let total_reached = self.total_results.is_some_and(|total| fetched >= total);
        let cap_reached = self.cap.is_some_and(|cap| fetched >= cap);
        total_reached || cap_reached
    }

    /// Consume the state, trimming to the cap
    pub fn into_items(mut self) -> Vec<T> {
        if let Some(cap) = self.cap {
            self.accumulated.truncate(cap as usize);
        }
        self.accumulated
    }
}
