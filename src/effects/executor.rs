//! Typed effect execution.
//!
//! `PlatformExecutor` wraps an interpreter and turns each effect/response pair
//! into a method with a concrete return type, so workers never match on
//! `PlatformResponse` themselves.

use thiserror::Error;
use tracing::trace;

use crate::types::{CommentId, Fullname, ThreadId, Username};

use super::error::PlatformError;
use super::interpreter::PlatformInterpreter;
use super::platform::{CommentData, InboxItem, PlatformEffect, PlatformResponse, ThreadData};

/// Errors from effect execution.
#[derive(Debug, Error)]
pub enum EffectError {
    /// The platform call failed (after retries, if the interpreter retries).
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The interpreter answered with the wrong response variant.
    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse {
        effect: &'static str,
        response: String,
    },
}

impl EffectError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EffectError::Platform(e) if e.is_not_found())
    }
}

/// Result type for effect execution.
pub type Result<T> = std::result::Result<T, EffectError>;

/// Executes platform effects with typed results.
#[derive(Debug, Clone)]
pub struct PlatformExecutor<P> {
    platform: P,
}

fn unexpected<T>(effect: &'static str, response: PlatformResponse) -> Result<T> {
    Err(EffectError::UnexpectedResponse {
        effect,
        response: format!("{:?}", response),
    })
}

impl<P: PlatformInterpreter> PlatformExecutor<P> {
    pub fn new(platform: P) -> Self {
        PlatformExecutor { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    async fn run(&self, effect: PlatformEffect) -> Result<(&'static str, PlatformResponse)> {
        let name = effect.name();
        trace!(effect = name, "Executing platform effect");
        let response = self.platform.interpret(effect).await?;
        Ok((name, response))
    }

    pub async fn list_new_threads(&self, limit: u32) -> Result<Vec<ThreadData>> {
        match self.run(PlatformEffect::ListNewThreads { limit }).await? {
            (_, PlatformResponse::Threads(threads)) => Ok(threads),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn list_new_comments(&self, limit: u32) -> Result<Vec<CommentData>> {
        match self.run(PlatformEffect::ListNewComments { limit }).await? {
            (_, PlatformResponse::Comments(comments)) => Ok(comments),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn list_unread(&self) -> Result<Vec<InboxItem>> {
        match self.run(PlatformEffect::ListUnread).await? {
            (_, PlatformResponse::Inbox(items)) => Ok(items),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn get_thread(&self, id: &ThreadId) -> Result<ThreadData> {
        match self.run(PlatformEffect::GetThread { id: id.clone() }).await? {
            (_, PlatformResponse::Thread(thread)) => Ok(thread),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn get_comment(&self, id: &CommentId) -> Result<CommentData> {
        match self.run(PlatformEffect::GetComment { id: id.clone() }).await? {
            (_, PlatformResponse::Comment(comment)) => Ok(comment),
            (name, other) => unexpected(name, other),
        }
    }

    /// Posts a reply under a thread and returns the new comment's id.
    pub async fn post_reply(&self, thread: &ThreadId, body: String) -> Result<CommentId> {
        let effect = PlatformEffect::PostReply {
            thread: thread.clone(),
            body,
        };
        match self.run(effect).await? {
            (_, PlatformResponse::ReplyPosted { id }) => Ok(id),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn edit_comment(&self, id: &CommentId, body: String) -> Result<()> {
        let effect = PlatformEffect::EditComment {
            id: id.clone(),
            body,
        };
        match self.run(effect).await? {
            (_, PlatformResponse::CommentEdited) => Ok(()),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn delete_comment(&self, id: &CommentId) -> Result<()> {
        match self.run(PlatformEffect::DeleteComment { id: id.clone() }).await? {
            (_, PlatformResponse::CommentDeleted) => Ok(()),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn send_message(
        &self,
        to: &Username,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<()> {
        let effect = PlatformEffect::SendMessage {
            to: to.clone(),
            subject: subject.into(),
            body: body.into(),
        };
        match self.run(effect).await? {
            (_, PlatformResponse::MessageSent) => Ok(()),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn reply_to(&self, item: &Fullname, body: impl Into<String>) -> Result<()> {
        let effect = PlatformEffect::ReplyToMessage {
            item: item.clone(),
            body: body.into(),
        };
        match self.run(effect).await? {
            (_, PlatformResponse::Replied) => Ok(()),
            (name, other) => unexpected(name, other),
        }
    }

    pub async fn mark_read(&self, item: &Fullname) -> Result<()> {
        match self.run(PlatformEffect::MarkRead { item: item.clone() }).await? {
            (_, PlatformResponse::MarkedRead) => Ok(()),
            (name, other) => unexpected(name, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockPlatform;

    #[tokio::test]
    async fn post_reply_returns_new_comment_id() {
        let mock = MockPlatform::new();
        let executor = PlatformExecutor::new(mock.clone());

        let id = executor
            .post_reply(&ThreadId::new("abc123"), "hello".to_string())
            .await
            .unwrap();

        assert_eq!(mock.comment_body(&id).as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn missing_thread_is_not_found() {
        let executor = PlatformExecutor::new(MockPlatform::new());

        let err = executor
            .get_thread(&ThreadId::new("zzz999"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn wrong_response_variant_is_reported() {
        let mock = MockPlatform::new();
        mock.override_response("mark_read", PlatformResponse::CommentDeleted);
        let executor = PlatformExecutor::new(mock);

        let err = executor.mark_read(&Fullname::new("t4_x")).await.unwrap_err();

        assert!(matches!(
            err,
            EffectError::UnexpectedResponse {
                effect: "mark_read",
                ..
            }
        ));
        assert!(!err.is_not_found());
    }
}
