//! Typed views over the two namespaces.
//!
//! `PostIndex` maps thread id → tracking artifact id and exists only while a
//! thread is unresolved. Resolving a thread also records a solved marker under
//! `solved:<thread id>` in the same namespace; thread ids are base-36, so the
//! marker keys never collide with entries. `SubscriptionIndex` maps thread id → subscribers in
//! subscription order, never containing duplicates, and is deleted rather
//! than left empty once notified.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::types::{CommentId, Resolution, ThreadId, ThreadLifecycle, Username};

use super::{AppendOutcome, KeyValueStore, Result};

/// Thread id → tracking artifact id.
#[derive(Debug, Clone)]
pub struct PostIndex<S> {
    store: S,
}

impl<S: KeyValueStore> PostIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn contains(&self, thread: &ThreadId) -> Result<bool> {
        self.store.exists(thread.as_str()).await
    }

    pub async fn artifact(&self, thread: &ThreadId) -> Result<Option<CommentId>> {
        Ok(self.store.get(thread.as_str()).await?.map(CommentId))
    }

    /// When the thread was resolved, if it was.
    pub async fn solved_at(&self, thread: &ThreadId) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(&solved_key(thread)).await? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Ok(Some(at.with_timezone(&Utc))),
            Err(e) => {
                warn!(thread = %thread, value = %raw, error = %e, "Unreadable solved marker");
                Ok(Some(DateTime::<Utc>::default()))
            }
        }
    }

    pub async fn lifecycle(&self, thread: &ThreadId) -> Result<ThreadLifecycle> {
        let entry = self.artifact(thread).await?;
        let solved_at = self.solved_at(thread).await?;
        Ok(ThreadLifecycle::observe(entry, solved_at))
    }

    /// Records the artifact for a newly tracked thread.
    pub async fn track(&self, thread: &ThreadId, artifact: &CommentId) -> Result<()> {
        self.store.set(thread.as_str(), artifact.as_str()).await
    }

    /// Claims the Tracked → Solved transition with a single take.
    ///
    /// At most one caller ever receives `Claimed` for a given registration.
    /// The winner records the solved marker; failing to write it is logged
    /// and does not undo the claim, since the entry is already gone.
    pub async fn resolve(&self, thread: &ThreadId) -> Result<Resolution> {
        let Some(artifact) = self.store.take(thread.as_str()).await? else {
            let state = self.lifecycle(thread).await?;
            return Ok(Resolution::Unclaimed { state });
        };

        let solved_at = Utc::now();
        if let Err(e) = self
            .store
            .set(&solved_key(thread), &solved_at.to_rfc3339())
            .await
        {
            warn!(thread = %thread, error = %e, "Failed to record solved marker");
        }
        Ok(Resolution::Claimed {
            artifact: CommentId(artifact),
            solved_at,
        })
    }
}

fn solved_key(thread: &ThreadId) -> String {
    format!("solved:{}", thread.as_str())
}

/// Result of `SubscriptionIndex::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// The user was added; `count` subscribers are now on the list.
    Added { count: u64 },
    AlreadySubscribed,
}

/// Thread id → ordered subscriber list.
#[derive(Debug, Clone)]
pub struct SubscriptionIndex<S> {
    store: S,
}

impl<S: KeyValueStore> SubscriptionIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn subscribers(&self, thread: &ThreadId) -> Result<Vec<Username>> {
        let names = self.store.list_range(thread.as_str(), 0, -1).await?;
        Ok(names.into_iter().map(Username).collect())
    }

    pub async fn count(&self, thread: &ThreadId) -> Result<u64> {
        self.store.list_length(thread.as_str()).await
    }

    pub async fn has_subscribers(&self, thread: &ThreadId) -> Result<bool> {
        self.store.exists(thread.as_str()).await
    }

    /// Takes `user` back off the list. Returns whether they were on it.
    pub async fn unsubscribe(&self, thread: &ThreadId, user: &Username) -> Result<bool> {
        self.store
            .remove_from_list(thread.as_str(), user.as_str())
            .await
    }

    pub async fn subscribe(&self, thread: &ThreadId, user: &Username) -> Result<Subscription> {
        match self
            .store
            .append_unique(thread.as_str(), user.as_str())
            .await?
        {
            AppendOutcome::Appended(count) => Ok(Subscription::Added { count }),
            AppendOutcome::AlreadyPresent => Ok(Subscription::AlreadySubscribed),
        }
    }

    /// Removes and returns the whole list for notification.
    pub async fn drain(&self, thread: &ThreadId) -> Result<Vec<Username>> {
        let names = self.store.take_list(thread.as_str()).await?;
        Ok(names.into_iter().map(Username).collect())
    }
}
