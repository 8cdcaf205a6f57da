//! The tracking artifact: the invitation reply posted under each thread.
//!
//! The body is two sentences, an invitation link and a footnote, and ends at
//! the first `". "`. Subscriber counts are appended after that boundary, and
//! rewriting the count replaces everything after it, so the body never carries
//! more than one count.
//!
//! ```text
//! Click [here](<compose link>) if you'd like to be notified when this post is solved.
//!
//! ^^Type ^^'abc123' ^^in ^^the ^^message ^^subject ^^if ^^it ^^hasn't ^^already ^^been ^^filled ^^in. ^^2 ^^users ^^are ^^currently ^^subscribed ^^to ^^this ^^post.
//! ```

use reqwest::Url;
use thiserror::Error;

use crate::types::{ThreadId, Username};

/// Platform page for writing a private message.
pub const COMPOSE_URL: &str = "https://www.reddit.com/message/compose/";

/// Boundary after which the subscriber count lives.
const ANNOTATION_BOUNDARY: &str = ". ";

/// The compose link couldn't be built.
#[derive(Debug, Error)]
#[error("invalid compose link: {0}")]
pub struct LinkError(String);

/// Prefilled message body explaining the subscription flow.
fn prefill(title: &str, thread: &ThreadId, operator: &Username) -> String {
    format!(
        "Click 'send' to be notified if OP marks '{title}' as solved. \
         You should receive a confirmation PM soon.\n\n\
         ----------\n\n\
         Make sure the message subject says '{thread}' before sending.\n\n\
         Official reddit app users might need to type something in the message body \
         before the send button is enabled.\n\n\
         PM u/{operator} if you have any questions/comments/complaints."
    )
}

/// Link to a compose page addressed to `bot`, with the thread id as subject.
pub fn compose_link(
    bot: &Username,
    thread: &ThreadId,
    title: &str,
    operator: &Username,
) -> Result<String, LinkError> {
    let message = prefill(title, thread, operator);
    let url = Url::parse_with_params(
        COMPOSE_URL,
        &[
            ("to", bot.as_str()),
            ("subject", thread.as_str()),
            ("message", message.as_str()),
        ],
    )
    .map_err(|e| LinkError(e.to_string()))?;
    Ok(url.into())
}

/// Body of the tracking artifact for a newly seen thread.
pub fn invitation_body(
    bot: &Username,
    thread: &ThreadId,
    title: &str,
    operator: &Username,
) -> Result<String, LinkError> {
    let link = compose_link(bot, thread, title, operator)?;
    Ok(format!(
        "Click [here]({link}) if you'd like to be notified when this post is solved.\n\n\
         ^^Type ^^'{thread}' ^^in ^^the ^^message ^^subject ^^if ^^it ^^hasn't ^^already \
         ^^been ^^filled ^^in. "
    ))
}

/// The superscript subscriber-count sentence.
pub fn subscriber_suffix(count: u64) -> String {
    if count == 1 {
        "^^1 ^^user ^^is ^^currently ^^subscribed ^^to ^^this ^^post. ".to_string()
    } else {
        format!("^^{count} ^^users ^^are ^^currently ^^subscribed ^^to ^^this ^^post. ")
    }
}

/// Rewrites `body` so it ends with exactly one count suffix for `count`.
pub fn annotate_subscriber_count(body: &str, count: u64) -> String {
    let suffix = subscriber_suffix(count);
    match body.split_once(ANNOTATION_BOUNDARY) {
        Some((head, _)) => format!("{head}{ANNOTATION_BOUNDARY}{suffix}"),
        None => format!("{} {suffix}", body.trim_end()),
    }
}
