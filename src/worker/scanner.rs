//! Thread Scanner: posts the tracking artifact under new threads.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::effects::{PlatformExecutor, PlatformInterpreter, ThreadData};
use crate::messages::invitation_body;
use crate::store::{KeyValueStore, PostIndex};
use crate::types::{CommentId, ThreadLifecycle};

use super::poll::PollConfig;
use super::stream::NewItemStream;
use super::{BotIdentity, Result};

/// Which thread titles get an artifact.
#[derive(Debug, Clone)]
pub struct ThreadFilter {
    /// Lowercase tag the title must contain.
    pub include: String,
    /// Lowercase markers that disqualify a title.
    pub exclude: Vec<String>,
}

impl Default for ThreadFilter {
    fn default() -> Self {
        Self {
            include: "[tomt]".to_string(),
            exclude: vec!["[mod]".to_string(), "solved".to_string()],
        }
    }
}

impl ThreadFilter {
    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        title.contains(&self.include) && !self.exclude.iter().any(|m| title.contains(m))
    }
}

/// What happened to one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The title didn't pass the filter.
    Filtered,
    /// The Post Index already has an entry.
    AlreadyTracked,
    /// The thread was solved earlier; solved threads are never tracked again.
    AlreadySolved,
    /// An artifact was posted and recorded.
    Tracked { artifact: CommentId },
}

pub struct ThreadScanner<P, S> {
    executor: PlatformExecutor<P>,
    posts: PostIndex<S>,
    identity: BotIdentity,
    filter: ThreadFilter,
    config: PollConfig,
    stream: NewItemStream,
}

impl<P: PlatformInterpreter, S: KeyValueStore> ThreadScanner<P, S> {
    /// Threads already listed at startup are skipped.
    pub fn new(platform: P, posts: PostIndex<S>, identity: BotIdentity, config: PollConfig) -> Self {
        let stream = NewItemStream::new(config.effective_capacity(), true);
        Self {
            executor: PlatformExecutor::new(platform),
            posts,
            identity,
            filter: ThreadFilter::default(),
            config,
            stream,
        }
    }

    /// Also handles threads present in the first listing.
    pub fn with_skip_existing(mut self, skip: bool) -> Self {
        self.stream = NewItemStream::new(self.config.effective_capacity(), skip);
        self
    }

    pub fn with_filter(mut self, filter: ThreadFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Posts the artifact for one thread, recording it only once posted.
    #[instrument(skip(self, thread), fields(thread = %thread.id))]
    pub async fn scan_thread(&self, thread: &ThreadData) -> Result<ScanOutcome> {
        if !self.filter.matches(&thread.title) {
            return Ok(ScanOutcome::Filtered);
        }
        match self.posts.lifecycle(&thread.id).await? {
            ThreadLifecycle::Untracked => {}
            ThreadLifecycle::Tracked { .. } => {
                debug!("Thread already tracked");
                return Ok(ScanOutcome::AlreadyTracked);
            }
            ThreadLifecycle::Solved { solved_at } => {
                debug!(%solved_at, "Thread already solved");
                return Ok(ScanOutcome::AlreadySolved);
            }
        }

        let body = invitation_body(
            &self.identity.bot,
            &thread.id,
            &thread.title,
            &self.identity.operator,
        )?;
        let artifact = self.executor.post_reply(&thread.id, body).await?;
        self.posts.track(&thread.id, &artifact).await?;

        info!(artifact = %artifact, title = %thread.title, "Tracking thread");
        Ok(ScanOutcome::Tracked { artifact })
    }

    /// Fetches one listing and scans every new thread in it.
    ///
    /// Failing to list is an error; a failure on one thread is logged and
    /// the rest are still scanned.
    pub async fn poll_once(&mut self, shutdown: &CancellationToken) -> Result<Vec<ScanOutcome>> {
        let listing = self
            .executor
            .list_new_threads(self.config.listing_limit)
            .await?;
        let fresh = self.stream.accept(listing);

        let mut outcomes = Vec::with_capacity(fresh.len());
        for thread in &fresh {
            if shutdown.is_cancelled() {
                debug!("Shutdown requested, skipping remaining threads");
                break;
            }
            match self.scan_thread(thread).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(thread = %thread.id, error = %e, "Failed to scan thread"),
            }
        }
        Ok(outcomes)
    }

    /// Polls until shutdown.
    #[instrument(skip_all, name = "thread_scanner")]
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!("Thread scanner started");
        loop {
            if let Err(e) = self.poll_once(&shutdown).await {
                warn!(error = %e, "Thread listing failed, will retry next poll");
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping thread scanner");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::PlatformError;
    use crate::store::MemoryStore;
    use crate::test_utils::{BOT, MockPlatform, OPERATOR, thread};
    use crate::types::ThreadId;

    fn scanner(mock: &MockPlatform) -> ThreadScanner<MockPlatform, MemoryStore> {
        ThreadScanner::new(
            mock.clone(),
            PostIndex::new(MemoryStore::new()),
            BotIdentity::new(BOT, OPERATOR),
            PollConfig::new(),
        )
        .with_skip_existing(false)
    }

    #[test]
    fn filter_rules() {
        let filter = ThreadFilter::default();
        assert!(filter.matches("[TOMT][Song] catchy tune"));
        assert!(filter.matches("[tomt] lowercase"));
        assert!(!filter.matches("[Song] no tag"));
        assert!(!filter.matches("[TOMT][MOD] announcement"));
        assert!(!filter.matches("[TOMT] SOLVED already"));
    }

    #[tokio::test]
    async fn tracks_matching_thread() {
        let mock = MockPlatform::new();
        let scanner = scanner(&mock);

        let outcome = scanner
            .scan_thread(&thread("abc123", "[TOMT] a song", "op"))
            .await
            .unwrap();

        let artifact = CommentId::new("art1");
        assert_eq!(outcome, ScanOutcome::Tracked { artifact: artifact.clone() });
        assert_eq!(
            scanner.posts.artifact(&ThreadId::new("abc123")).await.unwrap(),
            Some(artifact.clone())
        );
        let body = mock.comment_body(&artifact).unwrap();
        assert!(body.contains("subject=abc123"));
        assert!(body.contains("to=notifier-bot"));
    }

    #[tokio::test]
    async fn second_scan_does_not_post_again() {
        let mock = MockPlatform::new();
        let scanner = scanner(&mock);
        let t = thread("abc123", "[TOMT] a song", "op");

        scanner.scan_thread(&t).await.unwrap();
        assert_eq!(scanner.scan_thread(&t).await.unwrap(), ScanOutcome::AlreadyTracked);
        assert_eq!(mock.count("post_reply"), 1);
    }

    #[tokio::test]
    async fn solved_thread_is_not_tracked_again() {
        let mock = MockPlatform::new();
        let scanner = scanner(&mock);
        let t = thread("abc123", "[TOMT] a song", "op");
        scanner.scan_thread(&t).await.unwrap();
        scanner.posts.resolve(&t.id).await.unwrap();

        assert_eq!(scanner.scan_thread(&t).await.unwrap(), ScanOutcome::AlreadySolved);
        assert_eq!(mock.count("post_reply"), 1);
        assert!(!scanner.posts.contains(&t.id).await.unwrap());
    }

    #[tokio::test]
    async fn filtered_threads_touch_nothing() {
        let mock = MockPlatform::new();
        let scanner = scanner(&mock);

        let outcome = scanner
            .scan_thread(&thread("abc123", "[TOMT][MOD] rules", "mod"))
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Filtered);
        assert!(mock.effects().is_empty());
        assert!(!scanner.posts.contains(&ThreadId::new("abc123")).await.unwrap());
    }

    #[tokio::test]
    async fn failed_post_leaves_thread_untracked() {
        let mock = MockPlatform::new();
        mock.fail_next("post_reply", PlatformError::permanent("forbidden").with_status(403));
        let scanner = scanner(&mock);

        let result = scanner
            .scan_thread(&thread("abc123", "[TOMT] a song", "op"))
            .await;

        assert!(result.is_err());
        assert!(!scanner.posts.contains(&ThreadId::new("abc123")).await.unwrap());
    }

    #[tokio::test]
    async fn poll_continues_past_a_failed_thread() {
        let mock = MockPlatform::new();
        mock.set_new_threads(vec![
            thread("ccc333", "[TOMT] third", "op3"),
            thread("bbb222", "[TOMT] second", "op2"),
            thread("aaa111", "[TOMT] first", "op1"),
        ]);
        mock.fail_next("post_reply", PlatformError::permanent("forbidden"));
        let mut scanner = scanner(&mock);

        let outcomes = scanner.poll_once(&CancellationToken::new()).await.unwrap();

        // The oldest thread failed; the other two are tracked.
        assert_eq!(outcomes.len(), 2);
        assert!(!scanner.posts.contains(&ThreadId::new("aaa111")).await.unwrap());
        assert!(scanner.posts.contains(&ThreadId::new("bbb222")).await.unwrap());
        assert!(scanner.posts.contains(&ThreadId::new("ccc333")).await.unwrap());
    }

    #[tokio::test]
    async fn threads_listed_at_startup_are_skipped() {
        let mock = MockPlatform::new();
        mock.set_new_threads(vec![thread("aaa111", "[TOMT] old", "op")]);
        let mut scanner = scanner(&mock).with_skip_existing(true);

        assert!(scanner.poll_once(&CancellationToken::new()).await.unwrap().is_empty());

        mock.set_new_threads(vec![
            thread("bbb222", "[TOMT] new", "op"),
            thread("aaa111", "[TOMT] old", "op"),
        ]);
        let outcomes = scanner.poll_once(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!scanner.posts.contains(&ThreadId::new("aaa111")).await.unwrap());
        assert!(scanner.posts.contains(&ThreadId::new("bbb222")).await.unwrap());
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let mock = MockPlatform::new();
        mock.fail_next("list_new_threads", PlatformError::transient("503"));
        let mut scanner = scanner(&mock);

        assert!(scanner.poll_once(&CancellationToken::new()).await.is_err());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let mock = MockPlatform::new();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        scanner(&mock).run(shutdown).await.unwrap();
        assert_eq!(mock.count("list_new_threads"), 1);
    }
}
