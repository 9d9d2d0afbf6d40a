//! Paged loader
//!
//! Walks an offset/limit paginated collection until the server total or a
//! client cap is reached. The page fetch itself is a closure supplied by the
//! caller, so one loop serves every collection resource.

use super::types::{PageRequest, PageResult, PagedFetchState};
use crate::error::{Error, Result};
use crate::progress::Progress;
use tracing::{debug, warn};

/// Default number of items requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Loads every page of a collection resource
#[derive(Debug, Clone)]
pub struct PagedLoader {
    /// Items requested per page
    page_size: u32,
    /// Overall cap on the number of items returned
    limit: Option<u32>,
    /// Label reported to the progress sink
    task: String,
}

impl Default for PagedLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PagedLoader {
    /// Create a loader requesting `page_size` items per page
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            limit: None,
            task: "Loading".to_string(),
        }
    }

    /// Cap the number of items returned
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Optionally cap the number of items returned
    #[must_use]
    pub fn with_optional_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Set the task label reported to the progress sink
    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    /// Items requested per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Configured cap, if any
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Fetch pages in offset order and return the accumulated items.
    ///
    /// Cancellation is polled after each page and returns what has been
    /// gathered so far. A failing fetch aborts the load and nothing
    /// gathered before it is returned.
    pub fn load<T, F>(&self, progress: &dyn Progress, mut fetch_page: F) -> Result<Vec<T>>
    where
        F: FnMut(PageRequest) -> Result<PageResult<T>>,
    {
        if self.page_size == 0 {
            return Err(Error::invalid_argument("page size must be positive"));
        }

        let mut state = PagedFetchState::new(self.limit);
        if self.limit == Some(0) {
            return Ok(state.into_items());
        }

        loop {
            let request = state.next_request(self.page_size);
            let page = fetch_page(request)?;
            let first_page = state.total_results.is_none();
            let page_items = page.len() as u64;

            if let Some(total) = state.total_results {
                if page.total_results != total {
                    debug!(
                        task = %self.task,
                        first = total,
                        reported = page.total_results,
                        "total changed between pages, keeping the first"
                    );
                }
            }

            state.absorb(request, page);

            if first_page {
                progress.begin(&self.task, u64::from(state.expected().unwrap_or(0)));
            }
            progress.advance(page_items);

            debug!(
                task = %self.task,
                offset = request.offset,
                limit = request.limit,
                items = page_items,
                fetched = state.fetched(),
                total = state.total_results.unwrap_or(0),
                "fetched page"
            );

            if progress.is_cancelled() {
                debug!(task = %self.task, fetched = state.fetched(), "load cancelled");
                break;
            }

            if state.is_complete() {
                break;
            }

            if state.last_page_empty {
                warn!(
                    task = %self.task,
                    offset = request.offset,
                    fetched = state.fetched(),
                    total = state.total_results.unwrap_or(0),
                    "empty page before reaching the reported total, stopping"
                );
                break;
            }
        }

        progress.done();
        Ok(state.into_items())
    }
}

/// Load every page of a collection with a one-off loader
pub fn load_all<T, F>(
    page_size: u32,
    cap: Option<u32>,
    progress: &dyn Progress,
    fetch_page: F,
) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Result<PageResult<T>>,
{
    PagedLoader::new(page_size)
        .with_optional_limit(cap)
        .load(progress, fetch_page)
}
