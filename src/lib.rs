// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # Review Board Client
//!
//! A typed, blocking client for the Review Board web API.
//!
//! ## Features
//!
//! - **Paged collections**: users, groups, repositories, review requests,
//!   reviews, replies and comments, walked page by page with an optional cap
//! - **Strict decoding**: every response is checked for a server failure
//!   envelope before its payload is read
//! - **Repository data**: a cached snapshot of users, groups, repositories
//!   and the server time zone, refreshed on demand and saved to disk
//! - **Connection validation**: entry point, credentials and server version
//! - **Retry and rate limiting**: backoff on transient failures, governed
//!   request rate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reviewboard_client::{ClientConfig, NoProgress, ReviewboardClient, Result};
//!
//! fn main() -> Result<()> {
//!     let config = ClientConfig::new("https://reviews.example.com")
//!         .with_credentials("alice", "secret");
//!     let mut client = ReviewboardClient::from_config(&config)?;
//!
//!     let status = client.validate("alice", "secret", &NoProgress);
//!     println!("{status}");
//!
//!     client.update_repository_data(false, &NoProgress)?;
//!     for request in client.review_requests("?status=pending", 25, &NoProgress)? {
//!         println!("#{} {}", request.id, request.summary);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ReviewboardClient                        │
//! │  users()  review_requests()  update_status()  validate()     │
//! └──────────────────────────────────────────────────────────────┘
//!          │                    │                     │
//! ┌────────┴───────┬────────────┴─────────┬───────────┴─────────┐
//! │  PagedLoader   │   ResponseDecoder    │      Transport      │
//! ├────────────────┼──────────────────────┼─────────────────────┤
//! │ start/max-     │ stat envelope        │ HttpTransport       │
//! │ results paging │ wire → model         │ Retry, Rate limit   │
//! │ cap, cancel    │ total_results        │ Basic auth, cookies │
//! └────────────────┴──────────────────────┴─────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Domain entities and wire formats
pub mod model;

/// Progress reporting and cancellation
pub mod progress;

/// Network seam used by the client
pub mod transport;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Offset/limit pagination
pub mod pagination;

/// Response decoders
pub mod decode;

/// Client configuration
pub mod config;

/// The API facade
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, ResultExt};
pub use types::*;

pub use client::{RepositoryData, ReviewboardClient, ValidationStatus};
pub use config::{BackoffConfig, ClientConfig};
pub use decode::ResponseDecoder;
pub use http::{HttpTransport, HttpTransportConfig, RateLimiterConfig};
pub use model::{
    Comment, Diff, DiffComment, Repository, Review, ReviewGroup, ReviewReply, ReviewRequest,
    ReviewRequestStatus, Screenshot, ScreenshotComment, ServerInfo, User,
};
pub use pagination::{load_all, PageRequest, PageResult, PagedLoader};
pub use progress::{CancellationToken, NoProgress, Progress, SubProgress};
pub use transport::Transport;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
