//! Pagination module
//!
//! Supports: offset/limit collections reporting a `total_results` count
//!
//! # Overview
//!
//! The server pages every collection resource with `start` and
//! `max-results` query parameters and reports the collection size in each
//! response. [`PagedLoader`] drives that protocol: it asks a page-fetch
//! closure for successive pages until the reported total or an optional
//! client cap is reached, and never requests more than the cap still needs.

mod loader;
mod types;

pub use loader::{load_all, PagedLoader, DEFAULT_PAGE_SIZE};
pub use types::{PageRequest, PageResult, PagedFetchState};
