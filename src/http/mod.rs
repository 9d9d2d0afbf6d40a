//! HTTP transport module
//!
//! Provides the blocking [`HttpTransport`] with retry, rate limiting, and
//! backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: 429, 5xx, timeouts and connect errors, with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Sessions**: Cookie jar kept across calls after login

mod client;
mod rate_limit;

pub use client::{HttpTransport, HttpTransportConfig, HttpTransportConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
