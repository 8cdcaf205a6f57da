//! Core domain types for the solved notifier.
//!
//! Identifier newtypes and the per-thread lifecycle.

pub mod ids;
pub mod lifecycle;

pub use ids::{CommentId, Fullname, InvalidId, ThreadId, Username};
pub use lifecycle::{Resolution, ThreadLifecycle};
