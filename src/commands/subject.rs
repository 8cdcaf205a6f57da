//! Decoding subscription requests.
//!
//! A subscription request is a private message whose subject is the id of the
//! thread to follow. The invitation link pre-fills it, but users retype,
//! quote, and space it, so decoding is forgiving.

use crate::types::ThreadId;
use crate::types::ids::THREAD_PREFIX;

/// Default number of characters kept from the subject.
pub const DEFAULT_ID_LEN: usize = 7;

/// Extracts a thread id from a message subject.
///
/// # Rules
///
/// - Single quotes, double quotes and spaces are removed anywhere
/// - The result is lowercased and a `t3_` fullname prefix is dropped
/// - What remains is truncated to `max_len` characters
/// - Shorter ids are accepted as-is
/// - Returns `None` if nothing is left or a character is outside `[0-9a-z]`
///
/// # Examples
///
/// ```
/// use solved_notifier::commands::decode_thread_id;
/// use solved_notifier::types::ThreadId;
///
/// assert_eq!(decode_thread_id("'ABC123'", 7), Some(ThreadId::new("abc123")));
/// assert_eq!(decode_thread_id("abc 1234 extra", 7), Some(ThreadId::new("abc1234")));
/// assert_eq!(decode_thread_id("t3_abc1234", 7), Some(ThreadId::new("abc1234")));
/// assert_eq!(decode_thread_id("re: abc123", 7), None);
/// assert_eq!(decode_thread_id("  ", 7), None);
/// ```
pub fn decode_thread_id(subject: &str, max_len: usize) -> Option<ThreadId> {
    let cleaned: String = subject
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | ' '))
        .flat_map(char::to_lowercase)
        .collect();
    let bare = cleaned.strip_prefix(THREAD_PREFIX).unwrap_or(&cleaned);
    let decoded: String = bare.chars().take(max_len).collect();

    ThreadId::parse(&decoded).ok()
}

/// Whether a subject looks like a reply to one of our own messages.
///
/// Replies to error notices must not get another error notice back.
pub fn is_reply_subject(subject: &str) -> bool {
    subject.contains("re: ")
}
