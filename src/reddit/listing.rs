//! Wire types for Reddit JSON responses.
//!
//! Listings wrap "things": `{"kind": "t3", "data": {...}}`. Only the fields the
//! bot reads are declared; serde ignores the rest.

use serde::Deserialize;

use crate::effects::{CommentData, InboxItem, InboxKind, ParentRef, PlatformError, ThreadData};
use crate::types::{CommentId, Fullname, ThreadId, Username, ids::COMMENT_PREFIX};

/// Placeholder author name for deleted accounts.
const DELETED_AUTHOR: &str = "[deleted]";

#[derive(Debug, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData<T> {
    pub children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

impl<T> Listing<T> {
    pub fn into_items(self) -> impl Iterator<Item = T> {
        self.data.children.into_iter().map(|thing| thing.data)
    }
}

fn author(raw: Option<String>) -> Option<Username> {
    raw.filter(|a| a != DELETED_AUTHOR && !a.is_empty())
        .map(Username)
}

/// A thread ("link") as returned by listings and `/api/info`.
#[derive(Debug, Deserialize)]
pub struct RawThread {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub link_flair_text: Option<String>,
    pub permalink: String,
}

impl RawThread {
    pub fn into_thread(self) -> ThreadData {
        ThreadData {
            id: ThreadId(self.id),
            title: self.title,
            author: author(self.author),
            flair: self.link_flair_text,
            permalink: self.permalink,
        }
    }
}

/// A comment as returned by `/r/{sub}/comments` and `/api/info`.
#[derive(Debug, Deserialize)]
pub struct RawComment {
    pub id: String,
    pub body: String,
    pub author: Option<String>,
    /// `"moderator"`, `"admin"`, or null.
    pub distinguished: Option<String>,
    /// Fullname of the thread (`t3_...`).
    pub link_id: String,
    #[serde(default)]
    pub link_author: Option<String>,
    /// Fullname of the parent (`t3_...` or `t1_...`).
    pub parent_id: String,
    pub permalink: String,
}

impl RawComment {
    pub fn into_comment(self) -> Result<CommentData, PlatformError> {
        let thread = ThreadId::parse(&self.link_id).map_err(|e| {
            PlatformError::permanent(format!("comment {} has bad link_id: {}", self.id, e))
        })?;
        let parent = if self.parent_id.starts_with(COMMENT_PREFIX) {
            let id = CommentId::parse(&self.parent_id).map_err(|e| {
                PlatformError::permanent(format!("comment {} has bad parent_id: {}", self.id, e))
            })?;
            ParentRef::Comment(id)
        } else {
            ParentRef::Thread(thread.clone())
        };

        Ok(CommentData {
            id: CommentId(self.id),
            thread,
            thread_author: author(self.link_author),
            author: author(self.author),
            body: self.body,
            distinguished: self.distinguished.is_some(),
            parent,
            permalink: self.permalink,
        })
    }
}

/// An inbox item from `/message/unread`.
#[derive(Debug, Deserialize)]
pub struct RawInboxItem {
    pub name: String,
    pub author: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub was_comment: bool,
}

impl RawInboxItem {
    pub fn into_item(self) -> InboxItem {
        let kind = if self.was_comment {
            InboxKind::CommentReply
        } else {
            InboxKind::Message
        };
        InboxItem {
            name: Fullname(self.name),
            kind,
            // System messages from "reddit" keep their author; only deleted accounts map to None.
            author: author(self.author),
            subject: self.subject,
            body: self.body,
            context: self.context.filter(|c| !c.is_empty()),
        }
    }
}

/// Envelope for `api_type=json` form endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub json: ApiJson,
}

#[derive(Debug, Deserialize)]
pub struct ApiJson {
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
pub struct ApiData {
    #[serde(default)]
    pub things: Vec<Thing<CreatedThing>>,
}

/// The part of a newly created comment we need.
#[derive(Debug, Deserialize)]
pub struct CreatedThing {
    pub id: String,
}

/// Response of `/api/v1/access_token`.
///
/// Bad credentials come back as 200 with only `error` set.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}
