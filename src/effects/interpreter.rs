//! Effect interpreter trait.
//!
//! The Reddit client implements this against the live API; tests use a mock
//! that records every effect it receives.

use std::future::Future;

use super::error::PlatformError;
use super::platform::{PlatformEffect, PlatformResponse};

/// Interprets platform effects.
///
/// Implementations are cheap to clone; each worker holds its own handle.
/// Retry policy belongs to the implementation, so every caller gets the same
/// behaviour.
pub trait PlatformInterpreter: Clone + Send + Sync + 'static {
    /// Execute a platform effect and return its response.
    fn interpret(
        &self,
        effect: PlatformEffect,
    ) -> impl Future<Output = Result<PlatformResponse, PlatformError>> + Send;
}
