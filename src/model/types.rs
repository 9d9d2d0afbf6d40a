//! Domain entities
//!
//! Plain records decoded from API responses. None of them keep a link back
//! to the server; linked entities are referenced by display name.

use super::status::ReviewRequestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub id: u32,
    /// Display name of the submitter
    pub submitter: String,
    pub status: ReviewRequestStatus,
    pub summary: String,
    pub testing_done: String,
    pub description: String,
    pub public: bool,
    pub last_updated: DateTime<Utc>,
    pub time_added: DateTime<Utc>,
    pub branch: String,
    /// Display name of the repository, when the request references one
    pub repository: Option<String>,
    pub change_number: Option<u32>,
    pub bugs_closed: Vec<String>,
    /// Display names of the target people
    pub target_people: Vec<String>,
    /// Display names of the target groups
    pub target_groups: Vec<String>,
}

/// A review posted on a review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: u32,
    pub body_top: String,
    pub body_bottom: String,
    /// Display name of the reviewer
    pub user: String,
    pub public: bool,
    pub ship_it: bool,
    pub timestamp: DateTime<Utc>,
}

/// A reply to a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReply {
    pub id: u32,
    pub body_top: String,
    pub body_bottom: String,
    pub user: String,
    pub public: bool,
    pub timestamp: DateTime<Utc>,
}

/// Fields shared by every kind of comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u32,
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A comment attached to a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffComment(pub Comment);

/// A comment attached to a screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenshotComment(pub Comment);

impl Deref for DiffComment {
    type Target = Comment;

    fn deref(&self) -> &Comment {
        &self.0
    }
}

impl Deref for ScreenshotComment {
    type Target = Comment;

    fn deref(&self) -> &Comment {
        &self.0
    }
}

/// A source code repository known to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u32,
    pub name: String,
    /// SCM tool name, e.g. "Subversion" or "Git"
    pub tool: String,
    pub path: String,
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub url: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// First and last name joined by a space, skipping blank parts
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A review group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewGroup {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub mailing_list: String,
}

/// Server product and site information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub package_version: String,
    pub is_release: bool,
    /// IANA time zone name configured for the site, if reported
    pub time_zone: Option<String>,
}

impl ServerInfo {
    /// Leading numeric components of the product version.
    ///
    /// `"1.5.2"` yields `[1, 5, 2]`, `"1.6 beta 2"` yields `[1, 6]`.
    pub fn version_components(&self) -> Vec<u32> {
        self.version
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('.')
            .map_while(|part| part.parse().ok())
            .collect()
    }

    /// Whether the server version is `major.minor` or newer
    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        let components = self.version_components();
        let actual_major = components.first().copied().unwrap_or(0);
        let actual_minor = components.get(1).copied().unwrap_or(0);
        (actual_major, actual_minor) >= (major, minor)
    }
}

/// One revision of the diff attached to a review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub id: u32,
    pub revision: u32,
    pub timestamp: DateTime<Utc>,
}

/// A screenshot attached to a review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub id: u32,
    pub caption: String,
    /// Server-relative URL of the image
    pub url: String,
}
