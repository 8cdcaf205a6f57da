//! Key-value storage for the Post Index and the Subscription Index.
//!
//! The two namespaces are the only state the workers share. Each is a
//! `KeyValueStore`, injected into every worker that needs it. The store gives
//! single-key atomicity only: no transactions span two keys or two
//! namespaces.
//!
//! Besides the basic operations, four compound operations are atomic per key:
//!
//! - `take`: get-and-delete, used to claim a thread as solved
//! - `take_list`: get-and-delete of a list, used for notification fan-out
//! - `append_unique`: check-and-append, used to subscribe
//! - `remove_from_list`: remove one element, deleting the key once empty
//!
//! Two backends are provided: `MemoryStore` for tests and ephemeral runs, and
//! `FileStore`, which persists each namespace as an atomically replaced JSON
//! snapshot.

mod file;
mod fsync;
mod index;
mod memory;
mod table;

use std::future::Future;
use std::io;

use thiserror::Error;

pub use file::FileStore;
pub use index::{PostIndex, Subscription, SubscriptionIndex};
pub use memory::MemoryStore;
pub use table::{Table, Value};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key holds the other kind of value.
    #[error("key {key:?} holds a {found}, expected a {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// The blocking snapshot write panicked or was cancelled.
    #[error("snapshot write task failed: {0}")]
    WriteTask(#[from] tokio::task::JoinError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of `append_unique`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The value was appended; the list now has this many elements.
    Appended(u64),
    /// The value was already in the list; nothing changed.
    AlreadyPresent,
}

/// A single key-value namespace.
///
/// Implementations are cheap to clone and share their contents across clones.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Removes `key`. Returns whether it existed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Appends to the list at `key`, creating it. Returns the new length.
    fn append_to_list(&self, key: &str, value: &str)
    -> impl Future<Output = Result<u64>> + Send;

    /// Length of the list at `key`; 0 if absent.
    fn list_length(&self, key: &str) -> impl Future<Output = Result<u64>> + Send;

    /// Elements `start..=end` of the list at `key`. Negative indexes count
    /// from the end, so `(0, -1)` is the whole list.
    fn list_range(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Atomically gets and deletes the string at `key`.
    fn take(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Atomically gets and deletes the list at `key`; empty if absent.
    fn take_list(&self, key: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Atomically appends `value` unless the list already contains it.
    fn append_unique(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<AppendOutcome>> + Send;

    /// Atomically removes `value` from the list at `key`, deleting the key if
    /// the list becomes empty. Returns whether the value was present.
    fn remove_from_list(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<bool>> + Send;
}
