//! Response decoder implementation
//!
//! One method per resource shape. Each validates the envelope first, then
//! maps the payload into domain types.

use super::root::checked_root;
use super::wire::{
    WireComment, WireDiff, WireGroup, WireId, WireRepository, WireReview, WireReviewReply,
    WireReviewRequest, WireScreenshot, WireServerInfo, WireUser,
};
use crate::error::{Error, Result};
use crate::model::{
    Diff, DiffComment, Repository, Review, ReviewGroup, ReviewReply, ReviewRequest, Screenshot,
    ScreenshotComment, ServerInfo, User,
};
use crate::pagination::PageResult;
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Converts API response bodies into domain objects
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }

    // ========================================================================
    // Paged collections
    // ========================================================================

    pub fn read_users(&self, body: &str) -> Result<PageResult<User>> {
        read_page::<WireUser, _>(body, "users")
    }

    pub fn read_groups(&self, body: &str) -> Result<PageResult<ReviewGroup>> {
        read_page::<WireGroup, _>(body, "groups")
    }

    pub fn read_review_requests(&self, body: &str) -> Result<PageResult<ReviewRequest>> {
        read_page::<WireReviewRequest, _>(body, "review_requests")
    }

    pub fn read_repositories(&self, body: &str) -> Result<PageResult<Repository>> {
        read_page::<WireRepository, _>(body, "repositories")
    }

    pub fn read_reviews(&self, body: &str) -> Result<PageResult<Review>> {
        read_page::<WireReview, _>(body, "reviews")
    }

    pub fn read_review_replies(&self, body: &str) -> Result<PageResult<ReviewReply>> {
        read_page::<WireReviewReply, _>(body, "replies")
    }

    pub fn read_diff_comments(&self, body: &str) -> Result<PageResult<DiffComment>> {
        let page = read_page::<WireComment, _>(body, "diff_comments")?;
        Ok(PageResult::new(
            page.items.into_iter().map(DiffComment).collect(),
            page.total_results,
        ))
    }

    pub fn read_screenshot_comments(&self, body: &str) -> Result<PageResult<ScreenshotComment>> {
        let page = read_page::<WireComment, _>(body, "screenshot_comments")?;
        Ok(PageResult::new(
            page.items.into_iter().map(ScreenshotComment).collect(),
            page.total_results,
        ))
    }

    // ========================================================================
    // Unpaged collections
    // ========================================================================

    pub fn read_diffs(&self, body: &str) -> Result<Vec<Diff>> {
        let mut root = checked_root(body)?;
        read_items::<WireDiff, _>(take_field(&mut root, "diffs")?, "diffs")
    }

    pub fn read_screenshots(&self, body: &str) -> Result<Vec<Screenshot>> {
        let mut root = checked_root(body)?;
        read_items::<WireScreenshot, _>(take_field(&mut root, "screenshots")?, "screenshots")
    }

    /// Ids of the review requests in a listing, ignoring everything else
    pub fn read_review_request_ids(&self, body: &str) -> Result<Vec<u32>> {
        let mut root = checked_root(body)?;
        read_items::<WireId, u32>(take_field(&mut root, "review_requests")?, "review_requests")
    }

    // ========================================================================
    // Single entities and scalars
    // ========================================================================

    pub fn read_review_request(&self, body: &str) -> Result<ReviewRequest> {
        let mut root = checked_root(body)?;
        let value = take_field(&mut root, "review_request")?;
        read_entity::<WireReviewRequest, _>(value, "review_request")
    }

    pub fn read_server_info(&self, body: &str) -> Result<ServerInfo> {
        let mut root = checked_root(body)?;
        read_entity::<WireServerInfo, _>(take_field(&mut root, "info")?, "info")
    }

    /// The `count` of a `counts-only` query
    pub fn read_count(&self, body: &str) -> Result<u32> {
        let root = checked_root(body)?;
        read_u32(&root, "count")
    }

    /// Validate the envelope of a write response
    pub fn ensure_success(&self, body: &str) -> Result<()> {
        checked_root(body).map(|_| ())
    }
}

fn read_page<W, T>(body: &str, key: &str) -> Result<PageResult<T>>
where
    W: DeserializeOwned + Into<T>,
{
    let mut root = checked_root(body)?;
    let total_results = read_u32(&root, "total_results")?;
    let mut items = read_items::<W, T>(take_field(&mut root, key)?, key)?;
    items.truncate(total_results as usize);

    debug!(key, items = items.len(), total_results, "decoded page");
    Ok(PageResult::new(items, total_results))
}

fn read_items<W, T>(value: JsonValue, key: &str) -> Result<Vec<T>>
where
    W: DeserializeOwned + Into<T>,
{
    let JsonValue::Array(elements) = value else {
        return Err(Error::decode(format!("'{key}' is not an array")));
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            serde_json::from_value::<W>(element)
                .map(Into::into)
                .map_err(|e| Error::decode_with(format!("{key}[{index}]: {e}"), e))
        })
        .collect()
}

fn read_entity<W, T>(value: JsonValue, key: &str) -> Result<T>
where
    W: DeserializeOwned + Into<T>,
{
    serde_json::from_value::<W>(value)
        .map(Into::into)
        .map_err(|e| Error::decode_with(format!("{key}: {e}"), e))
}

fn take_field(root: &mut JsonValue, key: &str) -> Result<JsonValue> {
    root.get_mut(key)
        .map(JsonValue::take)
        .ok_or_else(|| Error::decode(format!("missing field '{key}'")))
}

fn read_u32(root: &JsonValue, key: &str) -> Result<u32> {
    let value = root
        .get(key)
        .ok_or_else(|| Error::decode(format!("missing field '{key}'")))?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::decode(format!("'{key}' is not a non-negative integer: {value}")))
}
