//! Effects-as-data for platform operations.
//!
//! Workers describe what they want done as `PlatformEffect` values; an
//! interpreter executes them. This enables:
//! - Testability via a recording mock interpreter
//! - One place to apply retry and error categorization
//! - Logging of intended operations

pub mod error;
pub mod executor;
pub mod interpreter;
pub mod platform;

pub use error::{PlatformError, PlatformErrorKind};
pub use executor::{EffectError, PlatformExecutor};
pub use interpreter::PlatformInterpreter;
pub use platform::{
    CommentData, InboxItem, InboxKind, ParentRef, PlatformEffect, PlatformResponse, SITE_URL,
    ThreadData,
};
