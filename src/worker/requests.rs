//! Request Handler: turns private messages into subscriptions.
//!
//! Every unread item is handled once and then marked read, whichever branch
//! it took and whether or not handling failed. Items are never retried from
//! the inbox: a failed request is the requester's to resend.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::commands::{DEFAULT_ID_LEN, decode_thread_id, is_reply_subject};
use crate::effects::{InboxItem, InboxKind, PlatformExecutor, PlatformInterpreter};
use crate::messages::replies::{self, Diagnosis, INVALID_REQUEST_SUBJECT};
use crate::messages::annotate_subscriber_count;
use crate::store::{KeyValueStore, PostIndex, Subscription, SubscriptionIndex};
use crate::types::{ThreadId, ThreadLifecycle, Username};

use super::poll::PollConfig;
use super::{BotIdentity, Result};

/// Sender of platform system messages.
const SYSTEM_SENDER: &str = "reddit";

/// What happened to one inbox item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A reply to one of our comments, passed on to the operator.
    ForwardedReply,
    /// A system or authorless message; only marked read.
    Ignored,
    /// The subject named no tracked thread.
    Invalid { diagnosis: Diagnosis, replied: bool },
    AlreadySubscribed { thread: ThreadId },
    /// The thread was solved while the subscription was being added; the
    /// subscription was withdrawn and the requester told.
    SolvedMeanwhile { thread: ThreadId },
    /// `annotated` is false if the artifact couldn't be updated.
    Subscribed {
        thread: ThreadId,
        count: u64,
        annotated: bool,
    },
}

pub struct RequestHandler<P, S> {
    executor: PlatformExecutor<P>,
    posts: PostIndex<S>,
    subscriptions: SubscriptionIndex<S>,
    identity: BotIdentity,
    config: PollConfig,
    id_len: usize,
}

impl<P: PlatformInterpreter, S: KeyValueStore> RequestHandler<P, S> {
    pub fn new(
        platform: P,
        posts: PostIndex<S>,
        subscriptions: SubscriptionIndex<S>,
        identity: BotIdentity,
        config: PollConfig,
    ) -> Self {
        Self {
            executor: PlatformExecutor::new(platform),
            posts,
            subscriptions,
            identity,
            config,
            id_len: DEFAULT_ID_LEN,
        }
    }

    /// Characters of the subject kept when decoding a thread id.
    pub fn with_id_len(mut self, id_len: usize) -> Self {
        self.id_len = id_len;
        self
    }

    /// Handles one item without marking it read.
    #[instrument(skip(self, item), fields(item = %item.name))]
    pub async fn handle_item(&self, item: &InboxItem) -> Result<RequestOutcome> {
        if item.kind == InboxKind::CommentReply {
            self.forward_reply(item).await?;
            return Ok(RequestOutcome::ForwardedReply);
        }

        let Some(requester) = item.author.as_ref().filter(|a| a.as_str() != SYSTEM_SENDER) else {
            debug!("System or authorless message, ignoring");
            return Ok(RequestOutcome::Ignored);
        };

        let Some(thread) = decode_thread_id(&item.subject, self.id_len) else {
            return Ok(self.reject(item, Diagnosis::Unknown).await);
        };
        match self.posts.lifecycle(&thread).await? {
            ThreadLifecycle::Tracked { .. } => self.subscribe(item, requester, thread).await,
            ThreadLifecycle::Solved { .. } => {
                Ok(self.reject(item, Diagnosis::JustSolved(thread)).await)
            }
            ThreadLifecycle::Untracked => {
                let diagnosis = self.diagnose(thread).await;
                Ok(self.reject(item, diagnosis).await)
            }
        }
    }

    async fn subscribe(
        &self,
        item: &InboxItem,
        requester: &Username,
        thread_id: ThreadId,
    ) -> Result<RequestOutcome> {
        let thread = self.executor.get_thread(&thread_id).await?;

        let count = match self.subscriptions.subscribe(&thread_id, requester).await? {
            Subscription::AlreadySubscribed => {
                debug!(thread = %thread_id, user = %requester, "Already subscribed");
                self.executor
                    .reply_to(&item.name, replies::already_subscribed(&thread))
                    .await?;
                return Ok(RequestOutcome::AlreadySubscribed { thread: thread_id });
            }
            Subscription::Added { count } => count,
        };

        // The detector may have claimed the thread and drained its list after
        // the lifecycle check; an entry appended now would never be notified.
        if !self.posts.contains(&thread_id).await? {
            let withdrawn = self.subscriptions.unsubscribe(&thread_id, requester).await?;
            info!(thread = %thread_id, user = %requester, withdrawn, "Thread solved while subscribing");
            self.executor
                .reply_to(
                    &item.name,
                    replies::invalid_request(&Diagnosis::JustSolved(thread_id.clone())),
                )
                .await?;
            return Ok(RequestOutcome::SolvedMeanwhile { thread: thread_id });
        }

        info!(thread = %thread_id, user = %requester, count, "Subscribed");
        self.executor
            .reply_to(&item.name, replies::subscribed(&thread))
            .await?;

        let annotated = match self.annotate(&thread_id, count).await {
            Ok(done) => done,
            Err(e) => {
                warn!(thread = %thread_id, error = %e, "Failed to update subscriber count");
                false
            }
        };

        Ok(RequestOutcome::Subscribed {
            thread: thread_id,
            count,
            annotated,
        })
    }

    /// Rewrites the artifact's subscriber count. Returns false if the thread
    /// was resolved in the meantime.
    async fn annotate(&self, thread: &ThreadId, count: u64) -> Result<bool> {
        let Some(artifact) = self.posts.artifact(thread).await? else {
            return Ok(false);
        };
        let current = self.executor.get_comment(&artifact).await?;
        let body = annotate_subscriber_count(&current.body, count);
        self.executor.edit_comment(&artifact, body).await?;
        Ok(true)
    }

    /// Tells the requester and the operator that a request was rejected.
    async fn reject(&self, item: &InboxItem, diagnosis: Diagnosis) -> RequestOutcome {
        info!(subject = %item.subject, ?diagnosis, "Invalid subscription request");

        let mut replied = false;
        if !is_reply_subject(&item.subject) {
            match self
                .executor
                .reply_to(&item.name, replies::invalid_request(&diagnosis))
                .await
            {
                Ok(()) => replied = true,
                Err(e) => warn!(error = %e, "Failed to reply to invalid request"),
            }
        }

        if let Err(e) = self
            .executor
            .send_message(
                &self.identity.operator,
                INVALID_REQUEST_SUBJECT,
                replies::forwarded_request_body(&item.subject, &item.body),
            )
            .await
        {
            warn!(error = %e, "Failed to forward invalid request");
        }

        RequestOutcome::Invalid { diagnosis, replied }
    }

    async fn diagnose(&self, thread: ThreadId) -> Diagnosis {
        match self.executor.get_thread(&thread).await {
            Ok(data) if data.is_flaired_solved() => Diagnosis::JustSolved(thread),
            Ok(_) => Diagnosis::Unknown,
            Err(e) => {
                debug!(thread = %thread, error = %e, "Diagnosis lookup failed");
                Diagnosis::Unknown
            }
        }
    }

    async fn forward_reply(&self, item: &InboxItem) -> Result<()> {
        self.executor
            .send_message(
                &self.identity.operator,
                replies::forwarded_reply_subject(item.author.as_ref()),
                replies::forwarded_reply_body(&item.body, item.context.as_deref()),
            )
            .await?;
        Ok(())
    }

    /// Handles an item, then marks it read exactly once.
    pub async fn process_item(&self, item: &InboxItem) -> Option<RequestOutcome> {
        let outcome = match self.handle_item(item).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(item = %item.name, error = %e, "Failed to handle inbox item");
                None
            }
        };
        if let Err(e) = self.executor.mark_read(&item.name).await {
            error!(item = %item.name, error = %e, "Failed to mark item read");
        }
        outcome
    }

    /// Handles every unread item once.
    pub async fn drain_once(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<Vec<Option<RequestOutcome>>> {
        let unread = self.executor.list_unread().await?;
        let mut outcomes = Vec::with_capacity(unread.len());
        for item in &unread {
            if shutdown.is_cancelled() {
                debug!("Shutdown requested, leaving remaining items unread");
                break;
            }
            outcomes.push(self.process_item(item).await);
        }
        Ok(outcomes)
    }

    /// Drains the inbox, sleeps, repeats until shutdown.
    #[instrument(skip_all, name = "request_handler")]
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!("Request handler started");
        loop {
            match self.drain_once(&shutdown).await {
                Ok(outcomes) if !outcomes.is_empty() => {
                    debug!(items = outcomes.len(), "Drained inbox")
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Inbox listing failed, will retry next poll"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping request handler");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }
}
