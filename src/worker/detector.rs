//! Solution Detector: notifies subscribers when a thread is marked solved.
//!
//! Resolution claims the Post Index entry and then the subscriber list, each
//! with a single atomic take. Two solved comments on the same thread can both
//! pass the signal check, but only one of them receives the artifact and only
//! one receives the subscribers.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::commands::{SOLVED_KEYWORD, SolvedSignalRules, Verdict, contains_word};
use crate::effects::{CommentData, ParentRef, PlatformExecutor, PlatformInterpreter};
use crate::messages::replies::{self, NOTIFICATION_SUBJECT};
use crate::store::{KeyValueStore, PostIndex, SubscriptionIndex};
use crate::types::{CommentId, Resolution, Username};

use super::poll::PollConfig;
use super::stream::NewItemStream;
use super::{BotIdentity, Result};

/// Query string that opens a comment with its full parent chain.
const FULL_CONTEXT: &str = "?context=1000";

/// What happened to one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// Not a solved signal.
    Ignored(Verdict),
    /// The thread was resolved.
    Resolved {
        /// The artifact claimed from the Post Index, if any.
        artifact: Option<CommentId>,
        artifact_deleted: bool,
        notified: Vec<Username>,
        failed: Vec<Username>,
    },
}

pub struct SolutionDetector<P, S> {
    executor: PlatformExecutor<P>,
    posts: PostIndex<S>,
    subscriptions: SubscriptionIndex<S>,
    rules: SolvedSignalRules,
    config: PollConfig,
    stream: NewItemStream,
}

impl<P: PlatformInterpreter, S: KeyValueStore> SolutionDetector<P, S> {
    /// Comments already listed at startup are checked too.
    pub fn new(
        platform: P,
        posts: PostIndex<S>,
        subscriptions: SubscriptionIndex<S>,
        identity: BotIdentity,
        config: PollConfig,
    ) -> Self {
        let stream = NewItemStream::new(config.effective_capacity(), false);
        Self {
            executor: PlatformExecutor::new(platform),
            posts,
            subscriptions,
            rules: SolvedSignalRules::new(identity.bot),
            config,
            stream,
        }
    }

    #[instrument(skip(self, comment), fields(comment = %comment.id, thread = %comment.thread))]
    pub async fn handle_comment(&self, comment: &CommentData) -> Result<DetectionOutcome> {
        if !contains_word(&comment.body, SOLVED_KEYWORD) {
            return Ok(DetectionOutcome::Ignored(Verdict::NoKeyword));
        }

        // Distinguished comments qualify without knowing the thread author.
        let thread_author = match (&comment.thread_author, comment.distinguished) {
            (Some(author), _) => Some(author.clone()),
            (None, true) => None,
            (None, false) => self.executor.get_thread(&comment.thread).await?.author,
        };

        let verdict = self.rules.evaluate(comment, thread_author.as_ref());
        if verdict != Verdict::Solved {
            debug!(?verdict, "Keyword present but not a solved signal");
            return Ok(DetectionOutcome::Ignored(verdict));
        }

        info!(author = ?comment.author, "Thread marked solved");
        self.resolve(comment).await
    }

    async fn resolve(&self, comment: &CommentData) -> Result<DetectionOutcome> {
        let (artifact, artifact_deleted) = match self.posts.resolve(&comment.thread).await? {
            Resolution::Claimed {
                artifact,
                solved_at,
            } => {
                info!(artifact = %artifact, %solved_at, "Claimed thread as solved");
                let deleted = match self.executor.delete_comment(&artifact).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(artifact = %artifact, error = %e, "Failed to delete tracking artifact");
                        false
                    }
                };
                (Some(artifact), deleted)
            }
            Resolution::Unclaimed { state } => {
                debug!(?state, "Nothing to claim, draining leftover subscribers only");
                (None, false)
            }
        };

        let subscribers = self.subscriptions.drain(&comment.thread).await?;
        if subscribers.is_empty() {
            return Ok(DetectionOutcome::Resolved {
                artifact,
                artifact_deleted,
                notified: Vec::new(),
                failed: Vec::new(),
            });
        }

        let link = self.answer_link(comment).await;
        let body = replies::notification(&link);
        let mut notified = Vec::with_capacity(subscribers.len());
        let mut failed = Vec::new();
        for user in subscribers {
            match self
                .executor
                .send_message(&user, NOTIFICATION_SUBJECT, body.as_str())
                .await
            {
                Ok(()) => notified.push(user),
                Err(e) => {
                    warn!(user = %user, error = %e, "Failed to notify subscriber");
                    failed.push(user);
                }
            }
        }
        info!(notified = notified.len(), failed = failed.len(), "Notified subscribers");

        Ok(DetectionOutcome::Resolved {
            artifact,
            artifact_deleted,
            notified,
            failed,
        })
    }

    /// The parent comment with full context, or the thread for a top-level comment.
    async fn answer_link(&self, comment: &CommentData) -> String {
        match &comment.parent {
            ParentRef::Comment(parent) => match self.executor.get_comment(parent).await {
                Ok(parent) => format!("{}{}", parent.url(), FULL_CONTEXT),
                Err(e) => {
                    warn!(parent = %parent, error = %e, "Failed to fetch parent, linking the thread");
                    comment.thread.shortlink()
                }
            },
            ParentRef::Thread(thread) => thread.shortlink(),
        }
    }

    /// Fetches one listing and checks every new comment in it.
    pub async fn poll_once(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Result<Vec<DetectionOutcome>> {
        let listing = self
            .executor
            .list_new_comments(self.config.listing_limit)
            .await?;
        let fresh = self.stream.accept(listing);

        let mut outcomes = Vec::with_capacity(fresh.len());
        for comment in &fresh {
            if shutdown.is_cancelled() {
                debug!("Shutdown requested, skipping remaining comments");
                break;
            }
            match self.handle_comment(comment).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(comment = %comment.id, error = %e, "Failed to check comment"),
            }
        }
        Ok(outcomes)
    }

    /// Polls until shutdown.
    #[instrument(skip_all, name = "solution_detector")]
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!("Solution detector started");
        loop {
            if let Err(e) = self.poll_once(&shutdown).await {
                warn!(error = %e, "Comment listing failed, will retry next poll");
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping solution detector");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }
}
