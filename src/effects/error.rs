//! Platform error types.
//!
//! Errors are categorized for retry decisions:
//!
//! - **Transient** errors are retriable (5xx, 429, network failures, `RATELIMIT`)
//! - **NotFound** means the thing asked for doesn't exist; never retried
//! - **Permanent** errors are returned immediately

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The kind of platform error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    /// Safe to retry with backoff.
    Transient,

    /// The requested thread, comment or user does not exist.
    NotFound,

    /// Retrying won't help.
    Permanent,
}

impl PlatformErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, PlatformErrorKind::Transient)
    }
}

/// A platform API error.
#[derive(Debug, Error)]
pub struct PlatformError {
    pub kind: PlatformErrorKind,

    /// The HTTP status code, if the error came from a response.
    pub status_code: Option<u16>,

    pub message: String,

    /// How long the platform asked us to wait before trying again.
    pub retry_after: Option<Duration>,

    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "platform error (HTTP {}): {}", code, self.message),
            None => write!(f, "platform error: {}", self.message),
        }
    }
}

impl PlatformError {
    fn with_kind(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
            retry_after: None,
            source: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::with_kind(PlatformErrorKind::Transient, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::with_kind(PlatformErrorKind::Permanent, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(PlatformErrorKind::NotFound, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == PlatformErrorKind::NotFound
    }
}
