//! Wire representations
//!
//! Serde mirrors of the JSON shapes the server returns. They are converted
//! into the domain model once deserialization has fully succeeded, so a
//! half-decoded entity never escapes.

use crate::model::{
    timestamp, Comment, Diff, Repository, Review, ReviewGroup, ReviewReply, ReviewRequest,
    ReviewRequestStatus, Screenshot, ServerInfo, User,
};
use crate::types::{JsonValue, OptionStringExt};
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// A `links.<name>` entry; only the display title is kept
#[derive(Debug, Deserialize)]
pub(super) struct Link {
    title: String,
}

// ============================================================================
// Review requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct ReviewRequestLinks {
    submitter: Link,
    #[serde(default)]
    repository: Option<Link>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireReviewRequest {
    id: u32,
    links: ReviewRequestLinks,
    #[serde(deserialize_with = "review_request_status")]
    status: ReviewRequestStatus,
    summary: String,
    testing_done: String,
    description: String,
    public: bool,
    #[serde(with = "timestamp::wire")]
    last_updated: DateTime<Utc>,
    #[serde(with = "timestamp::wire")]
    time_added: DateTime<Utc>,
    branch: String,
    #[serde(deserialize_with = "change_number")]
    changenum: Option<u32>,
    bugs_closed: Vec<String>,
    target_people: Vec<Link>,
    target_groups: Vec<Link>,
}

impl From<WireReviewRequest> for ReviewRequest {
    fn from(wire: WireReviewRequest) -> Self {
        Self {
            id: wire.id,
            submitter: wire.links.submitter.title,
            status: wire.status,
            summary: wire.summary,
            testing_done: wire.testing_done,
            description: wire.description,
            public: wire.public,
            last_updated: wire.last_updated,
            time_added: wire.time_added,
            branch: wire.branch,
            repository: wire.links.repository.map(|link| link.title),
            change_number: wire.changenum,
            bugs_closed: wire.bugs_closed,
            target_people: wire.target_people.into_iter().map(|l| l.title).collect(),
            target_groups: wire.target_groups.into_iter().map(|l| l.title).collect(),
        }
    }
}

/// Listing entry when only the id is wanted
#[derive(Debug, Deserialize)]
pub(super) struct WireId {
    id: u32,
}

impl From<WireId> for u32 {
    fn from(wire: WireId) -> Self {
        wire.id
    }
}

// ============================================================================
// Reviews, replies and comments
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct UserLinks {
    user: Link,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireReview {
    id: u32,
    body_top: String,
    body_bottom: String,
    links: UserLinks,
    public: bool,
    ship_it: bool,
    #[serde(with = "timestamp::wire")]
    timestamp: DateTime<Utc>,
}

impl From<WireReview> for Review {
    fn from(wire: WireReview) -> Self {
        Self {
            id: wire.id,
            body_top: wire.body_top,
            body_bottom: wire.body_bottom,
            user: wire.links.user.title,
            public: wire.public,
            ship_it: wire.ship_it,
            timestamp: wire.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireReviewReply {
    id: u32,
    body_top: String,
    body_bottom: String,
    links: UserLinks,
    public: bool,
    #[serde(with = "timestamp::wire")]
    timestamp: DateTime<Utc>,
}

impl From<WireReviewReply> for ReviewReply {
    fn from(wire: WireReviewReply) -> Self {
        Self {
            id: wire.id,
            body_top: wire.body_top,
            body_bottom: wire.body_bottom,
            user: wire.links.user.title,
            public: wire.public,
            timestamp: wire.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireComment {
    id: u32,
    links: UserLinks,
    text: String,
    #[serde(with = "timestamp::wire")]
    timestamp: DateTime<Utc>,
}

impl From<WireComment> for Comment {
    fn from(wire: WireComment) -> Self {
        Self {
            id: wire.id,
            username: wire.links.user.title,
            text: wire.text,
            timestamp: wire.timestamp,
        }
    }
}

// ============================================================================
// Users, groups, repositories
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct WireUser {
    id: u32,
    url: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            url: wire.url,
            username: wire.username,
            email: wire.email,
            first_name: wire.first_name,
            last_name: wire.last_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireGroup {
    id: u32,
    name: String,
    display_name: String,
    url: String,
    mailing_list: String,
}

impl From<WireGroup> for ReviewGroup {
    fn from(wire: WireGroup) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            display_name: wire.display_name,
            url: wire.url,
            mailing_list: wire.mailing_list,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireRepository {
    id: u32,
    name: String,
    tool: String,
    path: String,
}

impl From<WireRepository> for Repository {
    fn from(wire: WireRepository) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            tool: wire.tool,
            path: wire.path,
        }
    }
}

// ============================================================================
// Diffs and screenshots
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct WireDiff {
    id: u32,
    revision: u32,
    #[serde(with = "timestamp::wire")]
    timestamp: DateTime<Utc>,
}

impl From<WireDiff> for Diff {
    fn from(wire: WireDiff) -> Self {
        Self {
            id: wire.id,
            revision: wire.revision,
            timestamp: wire.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireScreenshot {
    id: u32,
    caption: String,
    url: String,
}

impl From<WireScreenshot> for Screenshot {
    fn from(wire: WireScreenshot) -> Self {
        Self {
            id: wire.id,
            caption: wire.caption,
            url: wire.url,
        }
    }
}

// ============================================================================
// Server info
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireProduct {
    name: String,
    version: String,
    package_version: String,
    is_release: bool,
}

#[derive(Debug, Deserialize)]
struct WireSite {
    #[serde(default, deserialize_with = "nullable_string")]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireServerInfo {
    product: WireProduct,
    site: WireSite,
}

impl From<WireServerInfo> for ServerInfo {
    fn from(wire: WireServerInfo) -> Self {
        Self {
            name: wire.product.name,
            version: wire.product.version,
            package_version: wire.product.package_version,
            is_release: wire.product.is_release,
            time_zone: wire.site.time_zone,
        }
    }
}

// ============================================================================
// Field helpers
// ============================================================================

/// Optional string where the server may send `null` or the text `"null"`
fn nullable_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.none_if_null())
}

/// Status of an actual review request; the filter-only values are refused
fn review_request_status<'de, D>(deserializer: D) -> Result<ReviewRequestStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let status = ReviewRequestStatus::deserialize(deserializer)?;
    match status.as_submittable_value() {
        Some(_) => Ok(status),
        None => Err(D::Error::custom(format!(
            "'{status}' is not the status of a review request"
        ))),
    }
}

/// Change number: a number, `null`, the text `"null"`, or a numeric string
fn change_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid change number {n}"))),
        Some(JsonValue::String(s)) => match s.none_if_null() {
            None => Ok(None),
            Some(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid change number '{s}': {e}"))),
        },
        Some(other) => Err(D::Error::custom(format!(
            "invalid change number {other}"
        ))),
    }
}
