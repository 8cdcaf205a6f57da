//! Polling configuration shared by the three workers.
//!
//! Every worker polls a platform listing, handles what is new, then sleeps.
//!
//! - **Poll interval**: 15 seconds by default (`NOTIFIER_POLL_INTERVAL_SECS`)
//! - **Listing limit**: how many items each listing call asks for
//! - **Recent capacity**: how many ids the stream remembers for deduplication.
//!   Must exceed the listing limit, or items at the tail of a full listing
//!   would be forgotten and handled again.

use std::time::Duration;

/// Default poll interval (15 seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Largest page the platform serves.
const DEFAULT_LISTING_LIMIT: u32 = 100;

/// Remembered ids: three full listings plus one.
const DEFAULT_RECENT_CAPACITY: usize = 301;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between polls.
    pub poll_interval: Duration,

    /// Items requested per listing call.
    pub listing_limit: u32,

    /// Ids remembered per stream.
    pub recent_capacity: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    pub fn new() -> Self {
        PollConfig {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            listing_limit: DEFAULT_LISTING_LIMIT,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Recent capacity, raised to at least one more than the listing limit.
    pub fn effective_capacity(&self) -> usize {
        self.recent_capacity.max(self.listing_limit as usize + 1)
    }
}
