//! Review Board API client
//!
//! [`ReviewboardClient`] exposes one operation per server resource. Paged
//! collections go through [`PagedLoader`], everything else is a single
//! fetch followed by a decode. All network access goes through the
//! [`Transport`] the client was built with.
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewboard_client::{ClientConfig, NoProgress, ReviewboardClient};
//!
//! let config = ClientConfig::from_file("reviewboard.yaml")?;
//! let mut client = ReviewboardClient::from_config(&config)?;
//!
//! client.update_repository_data(false, &NoProgress)?;
//! let pending = client.review_requests("?status=pending", 25, &NoProgress)?;
//! ```

mod query;
mod snapshot;
mod validate;

pub use snapshot::RepositoryData;
pub use validate::{ValidationStatus, MINIMUM_SERVER_VERSION};

use crate::config::ClientConfig;
use crate::decode::ResponseDecoder;
use crate::error::{Error, Result};
use crate::http::HttpTransport;
use crate::model::{
    Diff, DiffComment, Repository, Review, ReviewGroup, ReviewReply, ReviewRequest,
    ReviewRequestStatus, Screenshot, ScreenshotComment, ServerInfo, User,
};
use crate::pagination::{PageRequest, PageResult, PagedLoader, DEFAULT_PAGE_SIZE};
use crate::progress::{Progress, SubProgress};
use crate::transport::Transport;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Share of refresh progress given to each metadata fetch
const USERS_WEIGHT: u64 = 90;
const GROUPS_WEIGHT: u64 = 5;
const REPOSITORIES_WEIGHT: u64 = 4;
const SERVER_INFO_WEIGHT: u64 = 1;

/// Typed access to a Review Board server
pub struct ReviewboardClient<T: Transport> {
    transport: T,
    decoder: ResponseDecoder,
    page_size: u32,
    repository_data: Option<Arc<RepositoryData>>,
}

impl ReviewboardClient<HttpTransport> {
    /// Build an HTTP-backed client from a validated configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.http_config())?;
        Ok(Self::new(transport).with_page_size(config.page_size))
    }
}

impl<T: Transport> ReviewboardClient<T> {
    /// Create a client over `transport` with the default page size
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: ResponseDecoder::new(),
            page_size: DEFAULT_PAGE_SIZE,
            repository_data: None,
        }
    }

    /// Set the number of items requested per page
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Seed the client with a previously saved snapshot
    #[must_use]
    pub fn with_repository_data(mut self, data: Arc<RepositoryData>) -> Self {
        self.repository_data = Some(data);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // ========================================================================
    // Paged collections
    // ========================================================================

    /// Reviews posted on a review request
    pub fn reviews(&self, review_request_id: u32, progress: &dyn Progress) -> Result<Vec<Review>> {
        let path = query::reviews(review_request_id);
        self.load_paged(
            "Retrieving reviews",
            None,
            progress,
            |request| query::paged(&path, request),
            ResponseDecoder::read_reviews,
        )
    }

    /// Replies to one review
    pub fn review_replies(
        &self,
        review_request_id: u32,
        review_id: u32,
        progress: &dyn Progress,
    ) -> Result<Vec<ReviewReply>> {
        let path = query::review_replies(review_request_id, review_id);
        self.load_paged(
            "Retrieving review replies",
            None,
            progress,
            |request| query::paged(&path, request),
            ResponseDecoder::read_review_replies,
        )
    }

    /// Diff comments attached to one review
    pub fn diff_comments(
        &self,
        review_request_id: u32,
        review_id: u32,
        progress: &dyn Progress,
    ) -> Result<Vec<DiffComment>> {
        let path = query::diff_comments(review_request_id, review_id);
        self.load_paged(
            "Retrieving diff comments",
            None,
            progress,
            |request| query::paged(&path, request),
            ResponseDecoder::read_diff_comments,
        )
    }

    /// Comments attached to one screenshot
    pub fn screenshot_comments(
        &self,
        review_request_id: u32,
        screenshot_id: u32,
        progress: &dyn Progress,
    ) -> Result<Vec<ScreenshotComment>> {
        let path = query::screenshot_comments(review_request_id, screenshot_id);
        self.load_paged(
            "Retrieving screenshot comments",
            None,
            progress,
            |request| query::paged(&path, request),
            ResponseDecoder::read_screenshot_comments,
        )
    }

    pub fn users(&self, progress: &dyn Progress) -> Result<Vec<User>> {
        self.load_paged(
            "Retrieving users",
            None,
            progress,
            |request| query::paged(query::USERS, request),
            ResponseDecoder::read_users,
        )
    }

    pub fn review_groups(&self, progress: &dyn Progress) -> Result<Vec<ReviewGroup>> {
        self.load_paged(
            "Retrieving review groups",
            None,
            progress,
            |request| query::paged(query::GROUPS, request),
            ResponseDecoder::read_groups,
        )
    }

    pub fn repositories(&self, progress: &dyn Progress) -> Result<Vec<Repository>> {
        self.load_paged(
            "Retrieving repositories",
            None,
            progress,
            |request| query::paged(query::REPOSITORIES, request),
            ResponseDecoder::read_repositories,
        )
    }

    /// Search review requests.
    ///
    /// `search` is a review request query string such as
    /// `?status=pending&to-users=alice`. Any `max-results` it carries is
    /// replaced by the client's own paging, and at most `max_results`
    /// review requests are returned.
    pub fn review_requests(
        &self,
        search: &str,
        max_results: u32,
        progress: &dyn Progress,
    ) -> Result<Vec<ReviewRequest>> {
        self.load_paged(
            "Loading review requests",
            Some(max_results),
            progress,
            |request| query::review_request_search(search, request),
            ResponseDecoder::read_review_requests,
        )
    }

    // ========================================================================
    // Counts
    // ========================================================================

    pub fn count_diff_comments(
        &self,
        review_request_id: u32,
        review_id: u32,
        progress: &dyn Progress,
    ) -> Result<u32> {
        self.count(&query::diff_comments(review_request_id, review_id), progress)
    }

    pub fn count_diff_comments_for_reply(
        &self,
        review_request_id: u32,
        review_id: u32,
        reply_id: u32,
        progress: &dyn Progress,
    ) -> Result<u32> {
        let path = query::reply_diff_comments(review_request_id, review_id, reply_id);
        self.count(&path, progress)
    }

    pub fn count_screenshot_comments_for_reply(
        &self,
        review_request_id: u32,
        review_id: u32,
        reply_id: u32,
        progress: &dyn Progress,
    ) -> Result<u32> {
        let path = query::reply_screenshot_comments(review_request_id, review_id, reply_id);
        self.count(&path, progress)
    }

    // ========================================================================
    // Single resources
    // ========================================================================

    pub fn review_request(
        &self,
        review_request_id: u32,
        progress: &dyn Progress,
    ) -> Result<ReviewRequest> {
        let body = self
            .transport
            .get_text(&query::review_request(review_request_id), progress)?;
        self.decoder.read_review_request(&body)
    }

    pub fn server_info(&self, progress: &dyn Progress) -> Result<ServerInfo> {
        let body = self.transport.get_text(query::SERVER_INFO, progress)?;
        self.decoder.read_server_info(&body)
    }

    /// Every diff revision of a review request
    pub fn diffs(&self, review_request_id: u32, progress: &dyn Progress) -> Result<Vec<Diff>> {
        let body = self
            .transport
            .get_text(&query::diffs(review_request_id), progress)?;
        self.decoder.read_diffs(&body)
    }

    pub fn screenshots(
        &self,
        review_request_id: u32,
        progress: &dyn Progress,
    ) -> Result<Vec<Screenshot>> {
        let body = self
            .transport
            .get_text(&query::screenshots(review_request_id), progress)?;
        self.decoder.read_screenshots(&body)
    }

    /// Patch text of one diff revision
    pub fn raw_diff(
        &self,
        review_request_id: u32,
        revision: u32,
        progress: &dyn Progress,
    ) -> Result<Bytes> {
        self.transport.get_bytes(
            &query::raw_diff(review_request_id, revision),
            "text/x-patch",
            progress,
        )
    }

    /// Image data of a screenshot, given its server-relative `url`
    pub fn screenshot(&self, url: &str, progress: &dyn Progress) -> Result<Bytes> {
        self.transport
            .get_bytes(&query::screenshot(url), "image/*", progress)
    }

    /// Ids of review requests in any status updated at or after `timestamp`
    pub fn review_request_ids_changed_since(
        &self,
        timestamp: &DateTime<Utc>,
        progress: &dyn Progress,
    ) -> Result<Vec<u32>> {
        let body = self
            .transport
            .get_text(&query::changed_since(timestamp), progress)?;
        self.decoder.read_review_request_ids(&body)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Move a review request to `status`.
    ///
    /// The filter-only statuses `All` and `None` are rejected before any
    /// request is sent.
    pub fn update_status(
        &self,
        review_request_id: u32,
        status: ReviewRequestStatus,
        progress: &dyn Progress,
    ) -> Result<()> {
        let value = status.as_submittable_value().ok_or_else(|| {
            Error::invalid_argument(format!("Invalid status to update to: {status}"))
        })?;

        let body = self.transport.put_form(
            &query::review_request(review_request_id),
            &[("status", value)],
            progress,
        )?;
        self.decoder.ensure_success(&body)?;

        info!(review_request_id, %status, "Updated review request status");
        Ok(())
    }

    // ========================================================================
    // Repository data
    // ========================================================================

    pub fn has_repository_data(&self) -> bool {
        self.repository_data.is_some()
    }

    /// Current metadata snapshot, if one has been loaded
    pub fn repository_data(&self) -> Option<Arc<RepositoryData>> {
        self.repository_data.clone()
    }

    /// Refresh users, groups, repositories and the server time zone.
    ///
    /// Does nothing when a snapshot exists and `force` is false. The new
    /// snapshot replaces the old one only once every fetch has succeeded;
    /// a cancelled refresh keeps the old snapshot.
    pub fn update_repository_data(&mut self, force: bool, progress: &dyn Progress) -> Result<()> {
        if self.has_repository_data() && !force {
            debug!("Repository data present, skipping refresh");
            return Ok(());
        }

        info!("Refreshing repository data");
        progress.begin(
            "Refreshing repository data",
            USERS_WEIGHT + GROUPS_WEIGHT + REPOSITORIES_WEIGHT + SERVER_INFO_WEIGHT,
        );
        let fetched = self.fetch_repository_data(progress);
        progress.done();

        let Some(data) = fetched? else {
            debug!("Refresh cancelled, keeping previous repository data");
            return Ok(());
        };

        info!(
            users = data.users.len(),
            groups = data.groups.len(),
            repositories = data.repositories.len(),
            "Repository data refreshed"
        );
        self.repository_data = Some(Arc::new(data));
        Ok(())
    }

    /// Fetch a complete snapshot, or `None` once `progress` is cancelled.
    ///
    /// Cancellation is checked after every fetch so no further request is
    /// sent once it is observed.
    fn fetch_repository_data(&self, progress: &dyn Progress) -> Result<Option<RepositoryData>> {
        let users = self.users(&SubProgress::new(progress, USERS_WEIGHT))?;
        if progress.is_cancelled() {
            return Ok(None);
        }
        let groups = self.review_groups(&SubProgress::new(progress, GROUPS_WEIGHT))?;
        if progress.is_cancelled() {
            return Ok(None);
        }
        let repositories = self.repositories(&SubProgress::new(progress, REPOSITORIES_WEIGHT))?;
        if progress.is_cancelled() {
            return Ok(None);
        }

        let info_progress = SubProgress::new(progress, SERVER_INFO_WEIGHT);
        info_progress.begin("Retrieving server information", 1);
        let info = self.server_info(&info_progress)?;
        info_progress.done();
        if progress.is_cancelled() {
            return Ok(None);
        }

        Ok(Some(RepositoryData {
            users,
            groups,
            repositories,
            time_zone: info.time_zone,
            last_updated: Utc::now(),
        }))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn load_paged<U, P, D>(
        &self,
        task: &str,
        cap: Option<u32>,
        progress: &dyn Progress,
        page_path: P,
        decode: D,
    ) -> Result<Vec<U>>
    where
        P: Fn(PageRequest) -> String,
        D: Fn(&ResponseDecoder, &str) -> Result<PageResult<U>>,
    {
        PagedLoader::new(self.page_size)
            .with_optional_limit(cap)
            .with_task(task)
            .load(progress, |request| {
                let body = self.transport.get_text(&page_path(request), progress)?;
                decode(&self.decoder, &body)
            })
    }

    fn count(&self, path: &str, progress: &dyn Progress) -> Result<u32> {
        let body = self
            .transport
            .get_text(&query::counts_only(path), progress)?;
        self.decoder.read_count(&body)
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for ReviewboardClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewboardClient")
            .field("transport", &self.transport)
            .field("page_size", &self.page_size)
            .field("has_repository_data", &self.repository_data.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
