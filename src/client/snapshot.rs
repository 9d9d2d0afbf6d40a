//! Cached server metadata
//!
//! Users, groups and repositories change rarely, so the client fetches them
//! in one refresh and keeps the result as an immutable snapshot. The
//! snapshot can be written to disk and used to seed a later client.

use crate::error::{Error, Result, ResultExt};
use crate::model::{Repository, ReviewGroup, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Server metadata captured by one refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryData {
    pub users: Vec<User>,
    pub groups: Vec<ReviewGroup>,
    pub repositories: Vec<Repository>,
    /// Server time zone, when the server reports one
    pub time_zone: Option<String>,
    /// When the refresh completed
    pub last_updated: DateTime<Utc>,
}

impl RepositoryData {
    /// Look up a user by username
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    /// Look up a review group by name
    pub fn group(&self, name: &str) -> Option<&ReviewGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Look up a repository by name
    pub fn repository(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|repo| repo.name == name)
    }

    /// Write the snapshot as JSON.
    ///
    /// The content goes to a sibling temp file first and is renamed into
    /// place, so readers never see a half-written snapshot.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Other(format!("Failed to serialize repository data: {e}")))?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, contents)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename {}", temp_path.display()))?;

        debug!(path = %path.display(), "Saved repository data");
        Ok(())
    }

    /// Read a snapshot written by [`Self::save_to_file`], or `None` when
    /// the file does not exist
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let data = serde_json::from_str(&contents)
            .map_err(|e| Error::Other(format!("Failed to parse {}: {e}", path.display())))?;
        Ok(Some(data))
    }
}
