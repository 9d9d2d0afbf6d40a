//! Connection probe

use super::{query, ReviewboardClient};
use crate::error::Result;
use crate::progress::Progress;
use crate::transport::Transport;
use std::fmt;
use tracing::{info, warn};

/// Oldest server release the client supports, as `(major, minor)`
pub const MINIMUM_SERVER_VERSION: (u32, u32) = (1, 5);

/// Outcome of [`ReviewboardClient::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
    Ok,
    Failed { message: String },
}

impl ValidationStatus {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Failure message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Failed { message } => Some(message),
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Failed { message } => f.write_str(message),
        }
    }
}

impl<T: Transport> ReviewboardClient<T> {
    /// Check that the server is reachable, accepts the credentials and runs
    /// a supported version.
    ///
    /// Never fails: every error along the way becomes
    /// [`ValidationStatus::Failed`].
    pub fn validate(
        &self,
        username: &str,
        password: &str,
        progress: &dyn Progress,
    ) -> ValidationStatus {
        progress.begin("Validating connection", 3);
        let status = match self.probe(username, password, progress) {
            Ok(status) => status,
            Err(e) if e.is_domain() => ValidationStatus::failed(e.to_string()),
            Err(e) => ValidationStatus::failed(format!("Unexpected error: {e}")),
        };
        progress.done();

        match &status {
            ValidationStatus::Ok => info!(username, "Connection validated"),
            ValidationStatus::Failed { message } => warn!(username, "Validation failed: {message}"),
        }
        status
    }

    fn probe(
        &self,
        username: &str,
        password: &str,
        progress: &dyn Progress,
    ) -> Result<ValidationStatus> {
        let (major, minor) = MINIMUM_SERVER_VERSION;

        if !self.transport.api_entry_point_exists(progress)? {
            return Ok(ValidationStatus::failed(format!(
                "Repository not found. Please make sure that the path to the repository is correct and the server version is at least {major}.{minor}"
            )));
        }
        progress.advance(1);

        self.transport.login(username, password, progress)?;
        progress.advance(1);

        let body = self.transport.get_text(query::SERVER_INFO, progress)?;
        let info = self.decoder.read_server_info(&body)?;
        progress.advance(1);

        if !info.is_at_least(major, minor) {
            return Ok(ValidationStatus::failed(format!(
                "The version {} is not supported. Please use a repository version of {major}.{minor} or newer.",
                info.version
            )));
        }

        Ok(ValidationStatus::Ok)
    }
}
