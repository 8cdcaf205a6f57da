//! Reddit API client and effect interpreter.
//!
//! This module executes platform effects against Reddit's OAuth API with
//! `reqwest`. It implements the `PlatformInterpreter` trait defined in the
//! effects module.
//!
//! Key features:
//! - Password-grant OAuth with a cached, self-refreshing bearer token
//! - Exponential backoff retry for transient failures, honouring rate-limit hints
//! - Distinguishes transient, not-found, and permanent errors

mod client;
mod error;
mod interpreter;
mod listing;

pub use client::{API_BASE, AUTH_BASE, Credentials, RedditClient};
pub use error::{classify_status, parse_retry_hint};
