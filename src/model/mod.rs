//! Domain model
//!
//! Entities exposed by the client, the review request status enum and the
//! timestamp wire format shared by decoding and query building.

mod status;
pub mod timestamp;
mod types;

pub use status::ReviewRequestStatus;
pub use timestamp::{format_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
pub use types::{
    Comment, Diff, DiffComment, Repository, Review, ReviewGroup, ReviewReply, ReviewRequest,
    Screenshot, ScreenshotComment, ServerInfo, User,
};
