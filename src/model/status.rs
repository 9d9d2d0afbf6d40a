//! Review request status

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a review request.
///
/// `All` and `None` only make sense as query filters; a review request
/// itself is always pending, submitted or discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewRequestStatus {
    Pending,
    Submitted,
    Discarded,
    All,
    None,
}

impl ReviewRequestStatus {
    /// Wire value used in `status=` query filters
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Discarded => "discarded",
            Self::All => "all",
            Self::None => "none",
        }
    }

    /// Value accepted by the server when updating a review request, or
    /// `None` for the filter-only sentinels
    pub fn as_submittable_value(self) -> Option<&'static str> {
        match self {
            Self::Pending | Self::Submitted | Self::Discarded => Some(self.as_str()),
            Self::All | Self::None => None,
        }
    }
}

impl fmt::Display for ReviewRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewRequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "submitted" => Ok(Self::Submitted),
            "discarded" => Ok(Self::Discarded),
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            other => Err(Error::decode(format!(
                "Unknown review request status '{other}'"
            ))),
        }
    }
}
