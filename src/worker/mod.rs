//! The three polling workers and their supervisor.
//!
//! Each worker is an independent tokio task, sequential inside, that shares
//! nothing with the others except the two store namespaces.
//!
//! - [`ThreadScanner`]: posts a tracking artifact under each new matching thread
//! - [`RequestHandler`]: turns private messages into subscriptions
//! - [`SolutionDetector`]: notifies subscribers when a thread is marked solved
//!
//! [`supervise`] restarts a worker that fails, with exponential backoff.

mod detector;
mod poll;
mod requests;
mod scanner;
mod stream;
mod supervisor;


use thiserror::Error;

use crate::effects::EffectError;
use crate::messages::LinkError;
use crate::store::StoreError;
use crate::types::Username;

pub use detector::{DetectionOutcome, SolutionDetector};
pub use poll::{DEFAULT_POLL_INTERVAL_SECS, PollConfig};
pub use requests::{RequestHandler, RequestOutcome};
pub use scanner::{ScanOutcome, ThreadFilter, ThreadScanner};
pub use stream::{Identified, NewItemStream, RecentIds};
pub use supervisor::{Stopped, supervise};

/// Errors from worker operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("platform error: {0}")]
    Effect(#[from] EffectError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// The accounts a worker acts as and reports to.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    /// The account the bot is logged in as.
    pub bot: Username,
    /// Receives forwarded replies and rejected requests.
    pub operator: Username,
}

impl BotIdentity {
    pub fn new(bot: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            bot: Username::new(bot),
            operator: Username::new(operator),
        }
    }
}
