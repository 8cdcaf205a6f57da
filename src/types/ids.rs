//! Newtype wrappers for platform identifiers.
//!
//! Reddit identifies everything with short base-36 strings, and "fullnames"
//! prefix those with a type tag (`t1_` for comments, `t3_` for threads, `t4_`
//! for private messages). Wrapping them keeps a thread id from being used
//! where a comment id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fullname prefix for comments.
pub const COMMENT_PREFIX: &str = "t1_";

/// Fullname prefix for threads (Reddit "links").
pub const THREAD_PREFIX: &str = "t3_";

/// Error returned when a string is not a valid base-36 identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier {0:?}: expected lowercase base-36 characters")]
pub struct InvalidId(pub String);

fn is_base36(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}

/// A thread (submission) identifier, without the `t3_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl ThreadId {
    /// Creates a thread id without validation.
    pub fn new(s: impl Into<String>) -> Self {
        ThreadId(s.into())
    }

    /// Parses a thread id, requiring a non-empty lowercase base-36 string.
    ///
    /// A leading `t3_` fullname prefix is accepted and stripped.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        let bare = s.strip_prefix(THREAD_PREFIX).unwrap_or(s);
        if is_base36(bare) {
            Ok(ThreadId(bare.to_string()))
        } else {
            Err(InvalidId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `t3_`-prefixed fullname.
    pub fn fullname(&self) -> String {
        format!("{}{}", THREAD_PREFIX, self.0)
    }

    /// Returns the short link to the thread.
    pub fn shortlink(&self) -> String {
        format!("https://redd.it/{}", self.0)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        ThreadId(s.to_string())
    }
}

/// A comment identifier, without the `t1_` prefix.
///
/// Tracking artifacts are comments, so the Post Index stores these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn new(s: impl Into<String>) -> Self {
        CommentId(s.into())
    }

    /// Parses a comment id, accepting an optional `t1_` prefix.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        let bare = s.strip_prefix(COMMENT_PREFIX).unwrap_or(s);
        if is_base36(bare) {
            Ok(CommentId(bare.to_string()))
        } else {
            Err(InvalidId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `t1_`-prefixed fullname.
    pub fn fullname(&self) -> String {
        format!("{}{}", COMMENT_PREFIX, self.0)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        CommentId(s.to_string())
    }
}

/// A Reddit username, without the `u/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    pub fn new(s: impl Into<String>) -> Self {
        Username(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Username {
    fn from(s: &str) -> Self {
        Username(s.to_string())
    }
}

impl PartialEq<str> for Username {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// The fullname of an inbox item (`t1_...` for comment replies, `t4_...` for messages).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fullname(pub String);

impl Fullname {
    pub fn new(s: impl Into<String>) -> Self {
        Fullname(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fullname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
