//! Shared test utilities: a recording platform mock, fixtures, and arbitrary
//! generators for property-based testing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use proptest::prelude::*;

use crate::effects::{
    CommentData, InboxItem, InboxKind, ParentRef, PlatformEffect, PlatformError,
    PlatformInterpreter, PlatformResponse, ThreadData,
};
use crate::types::{CommentId, Fullname, ThreadId, Username};

// ─── Strategies ───────────────────────────────────────────────────────────────

pub fn arb_thread_id() -> impl Strategy<Value = ThreadId> {
    "[a-z0-9]{6,7}".prop_map(ThreadId)
}

pub fn arb_username() -> impl Strategy<Value = Username> {
    "[A-Za-z0-9_-]{3,20}".prop_map(Username)
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub const BOT: &str = "notifier-bot";
pub const OPERATOR: &str = "operator";

pub fn thread(id: &str, title: &str, author: &str) -> ThreadData {
    ThreadData {
        id: ThreadId::new(id),
        title: title.to_string(),
        author: Some(Username::new(author)),
        flair: None,
        permalink: format!("/r/tipofmytongue/comments/{}/post/", id),
    }
}

/// A top-level comment.
pub fn comment(id: &str, thread: &str, author: &str, body: &str) -> CommentData {
    CommentData {
        id: CommentId::new(id),
        thread: ThreadId::new(thread),
        thread_author: None,
        author: Some(Username::new(author)),
        body: body.to_string(),
        distinguished: false,
        parent: ParentRef::Thread(ThreadId::new(thread)),
        permalink: format!("/r/tipofmytongue/comments/{}/post/{}/", thread, id),
    }
}

/// A private message.
pub fn message(name: &str, author: &str, subject: &str, body: &str) -> InboxItem {
    InboxItem {
        name: Fullname::new(name),
        kind: InboxKind::Message,
        author: Some(Username::new(author)),
        subject: subject.to_string(),
        body: body.to_string(),
        context: None,
    }
}

/// A reply to one of the bot's comments.
pub fn comment_reply(name: &str, author: &str, body: &str, context: &str) -> InboxItem {
    InboxItem {
        name: Fullname::new(name),
        kind: InboxKind::CommentReply,
        author: Some(Username::new(author)),
        subject: "comment reply".to_string(),
        body: body.to_string(),
        context: Some(context.to_string()),
    }
}

// ─── MockPlatform ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MockState {
    threads: HashMap<ThreadId, ThreadData>,
    comments: HashMap<CommentId, CommentData>,
    new_threads: Vec<ThreadData>,
    new_comments: Vec<CommentData>,
    inbox: Vec<InboxItem>,
    effects: Vec<PlatformEffect>,
    next_comment: u64,
    failures: HashMap<String, VecDeque<PlatformError>>,
    unreachable_users: HashSet<Username>,
    overrides: HashMap<String, PlatformResponse>,
}

/// A private message the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: Username,
    pub subject: String,
    pub body: String,
}

/// An in-memory platform that records every effect.
///
/// Replies are numbered `art1`, `art2`, ... in posting order. Listings return
/// whatever the test last set, newest first.
#[derive(Debug, Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn add_thread(&self, thread: ThreadData) {
        self.state().threads.insert(thread.id.clone(), thread);
    }

    pub fn add_comment(&self, comment: CommentData) {
        self.state().comments.insert(comment.id.clone(), comment);
    }

    /// Sets the new-thread listing (newest first) and registers the threads.
    pub fn set_new_threads(&self, threads: Vec<ThreadData>) {
        let mut state = self.state();
        for thread in &threads {
            state.threads.insert(thread.id.clone(), thread.clone());
        }
        state.new_threads = threads;
    }

    /// Sets the new-comment listing (newest first) and registers the comments.
    pub fn set_new_comments(&self, comments: Vec<CommentData>) {
        let mut state = self.state();
        for comment in &comments {
            state.comments.insert(comment.id.clone(), comment.clone());
        }
        state.new_comments = comments;
    }

    pub fn push_inbox(&self, item: InboxItem) {
        self.state().inbox.push(item);
    }

    pub fn unread(&self) -> Vec<InboxItem> {
        self.state().inbox.clone()
    }

    /// Makes the next `effect_name` call fail with `error`.
    pub fn fail_next(&self, effect_name: &str, error: PlatformError) {
        self.state()
            .failures
            .entry(effect_name.to_string())
            .or_default()
            .push_back(error);
    }

    /// Makes every message to `user` fail.
    pub fn make_unreachable(&self, user: &str) {
        self.state().unreachable_users.insert(Username::new(user));
    }

    /// Answers every `effect_name` call with `response`.
    pub fn override_response(&self, effect_name: &str, response: PlatformResponse) {
        self.state()
            .overrides
            .insert(effect_name.to_string(), response);
    }

    pub fn effects(&self) -> Vec<PlatformEffect> {
        self.state().effects.clone()
    }

    pub fn count(&self, effect_name: &str) -> usize {
        self.state()
            .effects
            .iter()
            .filter(|e| e.name() == effect_name)
            .count()
    }

    pub fn comment_body(&self, id: &CommentId) -> Option<String> {
        self.state().comments.get(id).map(|c| c.body.clone())
    }

    pub fn comment_exists(&self, id: &CommentId) -> bool {
        self.state().comments.contains_key(id)
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state()
            .effects
            .iter()
            .filter_map(|e| match e {
                PlatformEffect::SendMessage { to, subject, body } => Some(SentMessage {
                    to: to.clone(),
                    subject: subject.clone(),
                    body: body.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn messages_to(&self, user: &str) -> Vec<SentMessage> {
        self.sent_messages()
            .into_iter()
            .filter(|m| m.to.as_str() == user)
            .collect()
    }

    /// Replies to inbox items, in order.
    pub fn replies(&self) -> Vec<(Fullname, String)> {
        self.state()
            .effects
            .iter()
            .filter_map(|e| match e {
                PlatformEffect::ReplyToMessage { item, body } => Some((item.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn marked_read(&self) -> Vec<Fullname> {
        self.state()
            .effects
            .iter()
            .filter_map(|e| match e {
                PlatformEffect::MarkRead { item } => Some(item.clone()),
                _ => None,
            })
            .collect()
    }

    fn respond(&self, effect: PlatformEffect) -> Result<PlatformResponse, PlatformError> {
        let mut state = self.state();
        state.effects.push(effect.clone());

        let name = effect.name();
        if let Some(error) = state.failures.get_mut(name).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        if let Some(response) = state.overrides.get(name) {
            return Ok(response.clone());
        }

        match effect {
            PlatformEffect::ListNewThreads { limit } => Ok(PlatformResponse::Threads(
                state.new_threads.iter().take(limit as usize).cloned().collect(),
            )),
            PlatformEffect::ListNewComments { limit } => Ok(PlatformResponse::Comments(
                state.new_comments.iter().take(limit as usize).cloned().collect(),
            )),
            PlatformEffect::ListUnread => Ok(PlatformResponse::Inbox(state.inbox.clone())),
            PlatformEffect::GetThread { id } => state
                .threads
                .get(&id)
                .cloned()
                .map(PlatformResponse::Thread)
                .ok_or_else(|| PlatformError::not_found(format!("thread {}", id)).with_status(404)),
            PlatformEffect::GetComment { id } => state
                .comments
                .get(&id)
                .cloned()
                .map(PlatformResponse::Comment)
                .ok_or_else(|| PlatformError::not_found(format!("comment {}", id)).with_status(404)),
            PlatformEffect::PostReply { thread, body } => {
                state.next_comment += 1;
                let id = CommentId(format!("art{}", state.next_comment));
                let reply = CommentData {
                    id: id.clone(),
                    thread: thread.clone(),
                    thread_author: None,
                    author: Some(Username::new(BOT)),
                    body,
                    distinguished: false,
                    parent: ParentRef::Thread(thread.clone()),
                    permalink: format!("/r/tipofmytongue/comments/{}/post/{}/", thread, id),
                };
                state.comments.insert(id.clone(), reply);
                Ok(PlatformResponse::ReplyPosted { id })
            }
            PlatformEffect::EditComment { id, body } => match state.comments.get_mut(&id) {
                Some(existing) => {
                    existing.body = body;
                    Ok(PlatformResponse::CommentEdited)
                }
                None => Err(PlatformError::not_found(format!("comment {}", id))),
            },
            PlatformEffect::DeleteComment { id } => {
                state.comments.remove(&id);
                Ok(PlatformResponse::CommentDeleted)
            }
            PlatformEffect::SendMessage { to, .. } => {
                if state.unreachable_users.contains(&to) {
                    Err(PlatformError::permanent(format!("cannot message {}", to)))
                } else {
                    Ok(PlatformResponse::MessageSent)
                }
            }
            PlatformEffect::ReplyToMessage { .. } => Ok(PlatformResponse::Replied),
            PlatformEffect::MarkRead { item } => {
                state.inbox.retain(|i| i.name != item);
                Ok(PlatformResponse::MarkedRead)
            }
        }
    }
}

impl PlatformInterpreter for MockPlatform {
    async fn interpret(&self, effect: PlatformEffect) -> Result<PlatformResponse, PlatformError> {
        self.respond(effect)
    }
}
