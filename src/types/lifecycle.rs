//! Per-thread lifecycle as recorded in the Post Index.
//!
//! ```text
//! Untracked ──(scanner posts artifact)──► Tracked ──(solved signal, atomic take)──► Solved
//! ```
//!
//! `Tracked` is the thread's Post Index entry. Taking that entry is the only
//! way into `Solved`, and the caller that wins the take records a solved
//! marker so the state stays observable and terminal afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::CommentId;

/// The lifecycle state of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ThreadLifecycle {
    /// No tracking artifact exists.
    Untracked,

    /// A tracking artifact has been posted and registered.
    Tracked { artifact: CommentId },

    /// A solved signal claimed the thread. Terminal.
    Solved { solved_at: DateTime<Utc> },
}

impl ThreadLifecycle {
    /// Derives the state from the Post Index entry and the solved marker.
    /// The marker wins: a solved thread never reads as tracked again.
    pub fn observe(entry: Option<CommentId>, solved_at: Option<DateTime<Utc>>) -> Self {
        match (solved_at, entry) {
            (Some(solved_at), _) => ThreadLifecycle::Solved { solved_at },
            (None, Some(artifact)) => ThreadLifecycle::Tracked { artifact },
            (None, None) => ThreadLifecycle::Untracked,
        }
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, ThreadLifecycle::Tracked { .. })
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, ThreadLifecycle::Solved { .. })
    }

    /// Returns the tracking artifact, if the thread is tracked.
    pub fn artifact(&self) -> Option<&CommentId> {
        match self {
            ThreadLifecycle::Tracked { artifact } => Some(artifact),
            _ => None,
        }
    }

    /// Returns true if `next` is a legal successor of this state.
    ///
    /// `Untracked → Solved` is legal: a thread whose Post Index entry was lost
    /// can still be solved.
    pub fn can_transition_to(&self, next: &ThreadLifecycle) -> bool {
        matches!(
            (self, next),
            (ThreadLifecycle::Untracked, ThreadLifecycle::Tracked { .. })
                | (ThreadLifecycle::Untracked, ThreadLifecycle::Solved { .. })
                | (ThreadLifecycle::Tracked { .. }, ThreadLifecycle::Solved { .. })
        )
    }
}

/// Result of `PostIndex::resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// This caller moved the thread from `Tracked` to `Solved` and owns
    /// cleanup of the artifact.
    Claimed {
        artifact: CommentId,
        solved_at: DateTime<Utc>,
    },
    /// Nothing to claim; `state` is what the thread was found in.
    Unclaimed { state: ThreadLifecycle },
}

impl Resolution {
    /// The artifact to delete, if this caller claimed the thread.
    pub fn artifact(&self) -> Option<&CommentId> {
        match self {
            Resolution::Claimed { artifact, .. } => Some(artifact),
            Resolution::Unclaimed { .. } => None,
        }
    }
}
