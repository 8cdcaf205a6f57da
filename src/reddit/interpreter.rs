//! Platform effect interpreter for the Reddit API.
//!
//! Every effect is executed through `retry_with_backoff`, so transient
//! failures (5xx, 429, rate-limit errors, expired tokens) are retried with the
//! client's configured schedule before the worker sees them.

use tracing::warn;

use crate::effects::{PlatformEffect, PlatformError, PlatformInterpreter, PlatformResponse};
use crate::retry::retry_with_backoff;
use crate::types::{CommentId, Fullname, ThreadId, Username};

use super::client::RedditClient;
use super::listing::{Listing, RawComment, RawInboxItem, RawThread};

/// Page size for the unread inbox.
const INBOX_LIMIT: u32 = 100;

impl PlatformInterpreter for RedditClient {
    async fn interpret(&self, effect: PlatformEffect) -> Result<PlatformResponse, PlatformError> {
        let result = retry_with_backoff(self.retry_config, self.retry_policy, || {
            execute_effect(self, effect.clone())
        })
        .await;

        result.into_result()
    }
}

/// Executes a single effect without retry.
async fn execute_effect(
    client: &RedditClient,
    effect: PlatformEffect,
) -> Result<PlatformResponse, PlatformError> {
    match effect {
        PlatformEffect::ListNewThreads { limit } => list_new_threads(client, limit).await,
        PlatformEffect::ListNewComments { limit } => list_new_comments(client, limit).await,
        PlatformEffect::ListUnread => list_unread(client).await,
        PlatformEffect::GetThread { id } => get_thread(client, &id).await,
        PlatformEffect::GetComment { id } => get_comment(client, &id).await,
        PlatformEffect::PostReply { thread, body } => post_reply(client, &thread, &body).await,
        PlatformEffect::EditComment { id, body } => edit_comment(client, &id, &body).await,
        PlatformEffect::DeleteComment { id } => delete_comment(client, &id).await,
        PlatformEffect::SendMessage { to, subject, body } => {
            send_message(client, &to, &subject, &body).await
        }
        PlatformEffect::ReplyToMessage { item, body } => reply_to(client, &item, &body).await,
        PlatformEffect::MarkRead { item } => mark_read(client, &item).await,
    }
}

// ─── Listings ─────────────────────────────────────────────────────────────────

async fn list_new_threads(
    client: &RedditClient,
    limit: u32,
) -> Result<PlatformResponse, PlatformError> {
    let path = format!("/r/{}/new", client.subreddits());
    let listing: Listing<RawThread> = client
        .get_json(&path, &[("limit", limit.to_string())])
        .await?;
    Ok(PlatformResponse::Threads(
        listing.into_items().map(RawThread::into_thread).collect(),
    ))
}

async fn list_new_comments(
    client: &RedditClient,
    limit: u32,
) -> Result<PlatformResponse, PlatformError> {
    let path = format!("/r/{}/comments", client.subreddits());
    let listing: Listing<RawComment> = client
        .get_json(&path, &[("limit", limit.to_string())])
        .await?;

    let mut comments = Vec::new();
    for raw in listing.into_items() {
        match raw.into_comment() {
            Ok(comment) => comments.push(comment),
            Err(e) => warn!(error = %e, "Skipping malformed comment in listing"),
        }
    }
    Ok(PlatformResponse::Comments(comments))
}

async fn list_unread(client: &RedditClient) -> Result<PlatformResponse, PlatformError> {
    let listing: Listing<RawInboxItem> = client
        .get_json("/message/unread", &[("limit", INBOX_LIMIT.to_string())])
        .await?;
    Ok(PlatformResponse::Inbox(
        listing.into_items().map(RawInboxItem::into_item).collect(),
    ))
}

// ─── Lookups ──────────────────────────────────────────────────────────────────

async fn get_thread(client: &RedditClient, id: &ThreadId) -> Result<PlatformResponse, PlatformError> {
    let listing: Listing<RawThread> = client
        .get_json("/api/info", &[("id", id.fullname())])
        .await?;
    listing
        .into_items()
        .next()
        .map(|raw| PlatformResponse::Thread(raw.into_thread()))
        .ok_or_else(|| PlatformError::not_found(format!("thread {} does not exist", id)))
}

async fn get_comment(
    client: &RedditClient,
    id: &CommentId,
) -> Result<PlatformResponse, PlatformError> {
    let listing: Listing<RawComment> = client
        .get_json("/api/info", &[("id", id.fullname())])
        .await?;
    match listing.into_items().next() {
        Some(raw) => Ok(PlatformResponse::Comment(raw.into_comment()?)),
        None => Err(PlatformError::not_found(format!(
            "comment {} does not exist",
            id
        ))),
    }
}

// ─── Mutations ────────────────────────────────────────────────────────────────

async fn post_reply(
    client: &RedditClient,
    thread: &ThreadId,
    body: &str,
) -> Result<PlatformResponse, PlatformError> {
    let thing_id = thread.fullname();
    let json = client
        .post_api("/api/comment", &[("thing_id", thing_id.as_str()), ("text", body)])
        .await?;

    let id = json
        .data
        .and_then(|data| data.things.into_iter().next())
        .map(|thing| CommentId(thing.data.id))
        .ok_or_else(|| PlatformError::permanent("comment response has no created thing"))?;
    Ok(PlatformResponse::ReplyPosted { id })
}

async fn edit_comment(
    client: &RedditClient,
    id: &CommentId,
    body: &str,
) -> Result<PlatformResponse, PlatformError> {
    let thing_id = id.fullname();
    client
        .post_api("/api/editusertext", &[("thing_id", thing_id.as_str()), ("text", body)])
        .await?;
    Ok(PlatformResponse::CommentEdited)
}

async fn delete_comment(
    client: &RedditClient,
    id: &CommentId,
) -> Result<PlatformResponse, PlatformError> {
    let fullname = id.fullname();
    client.post_form("/api/del", &[("id", fullname.as_str())]).await?;
    Ok(PlatformResponse::CommentDeleted)
}

async fn send_message(
    client: &RedditClient,
    to: &Username,
    subject: &str,
    body: &str,
) -> Result<PlatformResponse, PlatformError> {
    client
        .post_api(
            "/api/compose",
            &[("to", to.as_str()), ("subject", subject), ("text", body)],
        )
        .await?;
    Ok(PlatformResponse::MessageSent)
}

async fn reply_to(
    client: &RedditClient,
    item: &Fullname,
    body: &str,
) -> Result<PlatformResponse, PlatformError> {
    client
        .post_api("/api/comment", &[("thing_id", item.as_str()), ("text", body)])
        .await?;
    Ok(PlatformResponse::Replied)
}

async fn mark_read(client: &RedditClient, item: &Fullname) -> Result<PlatformResponse, PlatformError> {
    client
        .post_form("/api/read_message", &[("id", item.as_str())])
        .await?;
    Ok(PlatformResponse::MarkedRead)
}
