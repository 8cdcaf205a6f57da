//! Platform effect types.
//!
//! These types describe Reddit API operations as data, without executing them.
//! Interpreters (the OAuth client in production, a recording mock in tests)
//! execute them.

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, Fullname, ThreadId, Username};

/// Base URL prepended to relative permalinks.
pub const SITE_URL: &str = "https://www.reddit.com";

/// A platform effect.
///
/// Listing effects are scoped to the interpreter's configured subreddits;
/// the effects themselves don't carry that scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEffect {
    // ─── Listings ─────────────────────────────────────────────────────────────
    /// Newest threads, newest first.
    ListNewThreads { limit: u32 },

    /// Newest comments, newest first.
    ListNewComments { limit: u32 },

    /// All unread inbox items.
    ListUnread,

    // ─── Lookups ──────────────────────────────────────────────────────────────
    /// Fetch a thread by id. Fails with a not-found error if it doesn't exist.
    GetThread { id: ThreadId },

    /// Fetch a comment by id. Fails with a not-found error if it doesn't exist.
    GetComment { id: CommentId },

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Post a top-level reply under a thread.
    PostReply { thread: ThreadId, body: String },

    /// Replace the body of a comment the bot authored.
    EditComment { id: CommentId, body: String },

    /// Delete a comment the bot authored.
    DeleteComment { id: CommentId },

    /// Send a private message.
    SendMessage {
        to: Username,
        subject: String,
        body: String,
    },

    /// Reply to an inbox item.
    ReplyToMessage { item: Fullname, body: String },

    /// Mark an inbox item read.
    MarkRead { item: Fullname },
}

impl PlatformEffect {
    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            PlatformEffect::ListNewThreads { .. } => "list_new_threads",
            PlatformEffect::ListNewComments { .. } => "list_new_comments",
            PlatformEffect::ListUnread => "list_unread",
            PlatformEffect::GetThread { .. } => "get_thread",
            PlatformEffect::GetComment { .. } => "get_comment",
            PlatformEffect::PostReply { .. } => "post_reply",
            PlatformEffect::EditComment { .. } => "edit_comment",
            PlatformEffect::DeleteComment { .. } => "delete_comment",
            PlatformEffect::SendMessage { .. } => "send_message",
            PlatformEffect::ReplyToMessage { .. } => "reply_to_message",
            PlatformEffect::MarkRead { .. } => "mark_read",
        }
    }
}

// ─── Data Types ───────────────────────────────────────────────────────────────

/// Thread data returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadData {
    pub id: ThreadId,
    pub title: String,
    /// `None` when the account was deleted.
    pub author: Option<Username>,
    pub flair: Option<String>,
    /// Relative permalink, e.g. `/r/tipofmytongue/comments/abc123/title/`.
    pub permalink: String,
}

impl ThreadData {
    pub fn shortlink(&self) -> String {
        self.id.shortlink()
    }

    /// Returns true if the flair marks the thread solved.
    pub fn is_flaired_solved(&self) -> bool {
        self.flair
            .as_deref()
            .is_some_and(|f| f.to_lowercase().contains("solved"))
    }
}

/// What a comment replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    /// A top-level comment; its parent is the thread.
    Thread(ThreadId),
    /// A nested reply.
    Comment(CommentId),
}

/// Comment data returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    pub id: CommentId,
    pub thread: ThreadId,
    /// Author of the thread the comment belongs to, when the listing includes it.
    pub thread_author: Option<Username>,
    pub author: Option<Username>,
    pub body: String,
    /// True if the comment is distinguished (moderator or admin).
    pub distinguished: bool,
    pub parent: ParentRef,
    /// Relative permalink to the comment.
    pub permalink: String,
}

impl CommentData {
    /// Absolute URL of the comment.
    pub fn url(&self) -> String {
        format!("{}{}", SITE_URL, self.permalink)
    }
}

/// The kind of an inbox item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxKind {
    /// A reply to one of the bot's comments.
    CommentReply,
    /// A private message.
    Message,
}

/// An unread inbox item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxItem {
    pub name: Fullname,
    pub kind: InboxKind,
    pub author: Option<Username>,
    pub subject: String,
    pub body: String,
    /// Relative link to the comment context (comment replies only).
    pub context: Option<String>,
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// Response from a platform effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PlatformResponse {
    /// Response to `ListNewThreads`.
    Threads(Vec<ThreadData>),

    /// Response to `ListNewComments`.
    Comments(Vec<CommentData>),

    /// Response to `ListUnread`.
    Inbox(Vec<InboxItem>),

    /// Response to `GetThread`.
    Thread(ThreadData),

    /// Response to `GetComment`.
    Comment(CommentData),

    /// Response to `PostReply`.
    ReplyPosted { id: CommentId },

    /// Response to `EditComment`.
    CommentEdited,

    /// Response to `DeleteComment`.
    CommentDeleted,

    /// Response to `SendMessage`.
    MessageSent,

    /// Response to `ReplyToMessage`.
    Replied,

    /// Response to `MarkRead`.
    MarkedRead,
}
