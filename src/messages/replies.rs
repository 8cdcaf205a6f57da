//! Fixed texts the bot sends in private messages and replies.

use crate::effects::ThreadData;
use crate::types::{ThreadId, Username};

/// Page explaining how the bot works.
pub const INFO_URL: &str = "https://www.reddit.com/user/notifier-bot/comments/cy1egg/unotifierbot_info/";

/// Subject of solution notifications.
pub const NOTIFICATION_SUBJECT: &str = "Potential answer found!";

/// Subject used when forwarding a rejected request to the operator.
pub const INVALID_REQUEST_SUBJECT: &str = "invalid req";

const ERROR_PREAMBLE: &str = "Sorry, an error occurred while attempting to respond to your message.";

/// Why a request couldn't be honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnosis {
    /// The thread exists and its flair says it's solved.
    JustSolved(ThreadId),
    /// Anything else: bad id, deleted thread, lookup failure.
    Unknown,
}

/// Reply to a request that targets no tracked thread.
pub fn invalid_request(diagnosis: &Diagnosis) -> String {
    match diagnosis {
        Diagnosis::JustSolved(thread) => format!(
            "{ERROR_PREAMBLE} It looks like [that post]({}) was just marked solved.",
            thread.shortlink()
        ),
        Diagnosis::Unknown => format!(
            "{ERROR_PREAMBLE} If you want to subscribe to a post, make sure the message subject \
             correctly contains the post ID of the post you want to subscribe to. \
             Click [here]({INFO_URL}) for more information."
        ),
    }
}

pub fn already_subscribed(thread: &ThreadData) -> String {
    format!(
        "Sorry, it looks like you're already subscribed to '[{}]({})'.",
        thread.title,
        thread.shortlink()
    )
}

pub fn subscribed(thread: &ThreadData) -> String {
    format!(
        "You have successfully subscribed to '[{}]({})'.",
        thread.title,
        thread.shortlink()
    )
}

/// Body of the "Potential answer found!" message.
pub fn notification(answer_link: &str) -> String {
    format!(
        "Hello,\n\nI've detected that a post you're subscribed to might have been solved. \
         [Here's]({answer_link}) the possible answer."
    )
}

/// Subject for a comment reply forwarded to the operator.
pub fn forwarded_reply_subject(author: Option<&Username>) -> String {
    match author {
        Some(author) => format!("comment reply from u/{author}"),
        None => "comment reply from u/[deleted]".to_string(),
    }
}

/// Body for a comment reply forwarded to the operator.
pub fn forwarded_reply_body(body: &str, context: Option<&str>) -> String {
    format!("{}\n\n{}", body, context.unwrap_or_default())
}

/// Body for a rejected request forwarded to the operator.
pub fn forwarded_request_body(subject: &str, body: &str) -> String {
    format!("{subject}\n{body}")
}
