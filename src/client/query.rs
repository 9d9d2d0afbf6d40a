//! Resource paths and query strings

use crate::model::format_timestamp;
use crate::pagination::PageRequest;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use url::form_urlencoded;

pub(crate) const USERS: &str = "/api/users/";
pub(crate) const GROUPS: &str = "/api/groups/";
pub(crate) const REPOSITORIES: &str = "/api/repositories/";
pub(crate) const SERVER_INFO: &str = "/api/info/";

/// Upper bound on ids returned by a change-since query
pub(crate) const CHANGED_SINCE_LIMIT: u32 = 10_000;

static MAX_RESULTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]max-results=[^&]*").expect("valid regex"));

/// Collection path with the page's `start`/`max-results` appended
pub(crate) fn paged(path: &str, request: PageRequest) -> String {
    append_query(path, &request.query())
}

/// Append `params` to a path that may already carry a query
pub(crate) fn append_query(path: &str, params: &str) -> String {
    let separator = if path.ends_with('?') || path.ends_with('&') {
        ""
    } else if path.contains('?') {
        "&"
    } else {
        "?"
    };
    format!("{path}{separator}{params}")
}

/// Remove every `max-results` pair from a caller-supplied query.
///
/// `?max-results=20&status=pending` becomes `?status=pending` and
/// `?max-results=20` becomes the empty string.
pub(crate) fn strip_max_results(query: &str) -> String {
    let stripped = MAX_RESULTS.replace_all(query, "");
    match stripped.strip_prefix('&') {
        Some(rest) => format!("?{rest}"),
        None => stripped.into_owned(),
    }
}

/// One page of a review request search
pub(crate) fn review_request_search(query: &str, request: PageRequest) -> String {
    paged(
        &format!("/api/review-requests/{}", strip_max_results(query)),
        request,
    )
}

/// Ids of review requests in any status updated at or after `timestamp`
pub(crate) fn changed_since(timestamp: &DateTime<Utc>) -> String {
    let formatted = format_timestamp(timestamp);
    let encoded: String = form_urlencoded::byte_serialize(formatted.as_bytes()).collect();
    format!(
        "/api/review-requests/?status=all&max-results={CHANGED_SINCE_LIMIT}&last-updated-from={encoded}"
    )
}

pub(crate) fn review_request(review_request_id: u32) -> String {
    format!("/api/review-requests/{review_request_id}/")
}

pub(crate) fn reviews(review_request_id: u32) -> String {
    format!("/api/review-requests/{review_request_id}/reviews/")
}

pub(crate) fn review_replies(review_request_id: u32, review_id: u32) -> String {
    format!("/api/review-requests/{review_request_id}/reviews/{review_id}/replies/")
}

pub(crate) fn diff_comments(review_request_id: u32, review_id: u32) -> String {
    format!("/api/review-requests/{review_request_id}/reviews/{review_id}/diff-comments/")
}

pub(crate) fn reply_diff_comments(review_request_id: u32, review_id: u32, reply_id: u32) -> String {
    format!(
        "/api/review-requests/{review_request_id}/reviews/{review_id}/replies/{reply_id}/diff-comments/"
    )
}

pub(crate) fn reply_screenshot_comments(
    review_request_id: u32,
    review_id: u32,
    reply_id: u32,
) -> String {
    format!(
        "/api/review-requests/{review_request_id}/reviews/{review_id}/replies/{reply_id}/screenshot-comments/"
    )
}

pub(crate) fn screenshot_comments(review_request_id: u32, screenshot_id: u32) -> String {
    format!(
        "/api/review-requests/{review_request_id}/screenshots/{screenshot_id}/screenshot-comments/"
    )
}

pub(crate) fn diffs(review_request_id: u32) -> String {
    format!("/api/review-requests/{review_request_id}/diffs/")
}

pub(crate) fn raw_diff(review_request_id: u32, revision: u32) -> String {
    format!("/api/review-requests/{review_request_id}/diffs/{revision}/")
}

pub(crate) fn screenshots(review_request_id: u32) -> String {
    format!("/api/review-requests/{review_request_id}/screenshots/")
}

/// Server-relative screenshot URL as reported by the screenshot resource
pub(crate) fn screenshot(url: &str) -> String {
    format!("/{}", url.trim_start_matches('/'))
}

/// Count-only variant of a collection path
pub(crate) fn counts_only(path: &str) -> String {
    append_query(path, "counts-only=1")
}
