//! Response decoder module
//!
//! Supports: every JSON resource shape the client reads
//!
//! # Overview
//!
//! [`checked_root`] parses a body and turns a `"stat": "fail"` envelope into
//! [`crate::Error::ServerReported`] before anything else is read.
//! [`ResponseDecoder`] builds on it with one method per resource. List
//! methods return a [`crate::pagination::PageResult`] carrying the
//! server-reported total. Single-entity methods return the entity itself.
//! Each decode either produces complete entities or fails with one error.

mod decoders;
mod root;
mod wire;

pub use decoders::ResponseDecoder;
pub use root::checked_root;
