//! Transport seam
//!
//! The client never talks HTTP directly. Everything it needs from the
//! network goes through this trait, which [`crate::http::HttpTransport`]
//! implements over `reqwest` and tests implement over canned responses.

use crate::error::Result;
use crate::progress::Progress;
use bytes::Bytes;

/// Authenticated access to the Review Board server
pub trait Transport {
    /// GET `path` and return the response body as text
    fn get_text(&self, path: &str, progress: &dyn Progress) -> Result<String>;

    /// GET `path` asking for `mime_type` and return the raw body
    fn get_bytes(&self, path: &str, mime_type: &str, progress: &dyn Progress) -> Result<Bytes>;

    /// PUT a form-encoded body to `path` and return the response body as text
    fn put_form(
        &self,
        path: &str,
        params: &[(&str, &str)],
        progress: &dyn Progress,
    ) -> Result<String>;

    /// Whether the server exposes the web API root
    fn api_entry_point_exists(&self, progress: &dyn Progress) -> Result<bool>;

    /// Authenticate and keep the resulting session for later calls
    fn login(&self, username: &str, password: &str, progress: &dyn Progress) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_text(&self, path: &str, progress: &dyn Progress) -> Result<String> {
        (**self).get_text(path, progress)
    }

    fn get_bytes(&self, path: &str, mime_type: &str, progress: &dyn Progress) -> Result<Bytes> {
        (**self).get_bytes(path, mime_type, progress)
    }

    fn put_form(
        &self,
        path: &str,
        params: &[(&str, &str)],
        progress: &dyn Progress,
    ) -> Result<String> {
        (**self).put_form(path, params, progress)
    }

    fn api_entry_point_exists(&self, progress: &dyn Progress) -> Result<bool> {
        (**self).api_entry_point_exists(progress)
    }

    fn login(&self, username: &str, password: &str, progress: &dyn Progress) -> Result<()> {
        (**self).login(username, password, progress)
    }
}
