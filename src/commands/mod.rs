//! Parsing user input into bot decisions.
//!
//! Two pure parsers live here:
//!
//! - `decode_thread_id`: the thread a subscription request targets, taken
//!   from a private message subject
//! - `SolvedSignalRules`: whether a comment marks its thread solved
//!
//! # Example
//!
//! ```
//! use solved_notifier::commands::{contains_word, decode_thread_id};
//! use solved_notifier::types::ThreadId;
//!
//! assert_eq!(decode_thread_id("'abc123'", 7), Some(ThreadId::new("abc123")));
//! assert!(contains_word("Solved! Thanks all", "solved"));
//! assert!(!contains_word("still unsolved", "solved"));
//! ```

mod signal;
mod subject;

pub use signal::{
    AUTOMODERATOR, PARTICIPATION_REMINDER, SOLVED_KEYWORD, SolvedSignalRules, Verdict,
    contains_word,
};
pub use subject::{DEFAULT_ID_LEN, decode_thread_id, is_reply_subject};
