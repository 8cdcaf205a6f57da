use std::process::ExitCode;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solved_notifier::config::{Config, ConfigError};
use solved_notifier::effects::PlatformError;
use solved_notifier::reddit::RedditClient;
use solved_notifier::retry::RetryConfig;
use solved_notifier::server::{AppState, build_router};
use solved_notifier::store::{
    FileStore, KeyValueStore, MemoryStore, PostIndex, StoreError, SubscriptionIndex,
};
use solved_notifier::worker::{
    BotIdentity, RequestHandler, SolutionDetector, ThreadScanner, supervise,
};

const POSTS_NAMESPACE: &str = "posts";
const SUBSCRIPTIONS_NAMESPACE: &str = "subscriptions";

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("platform client: {0}")]
    Platform(#[from] PlatformError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solved_notifier=debug,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    let client = RedditClient::new(config.credentials.clone(), config.subreddits.clone())?;
    info!(
        bot = client.username(),
        subreddits = %config.subreddits,
        operator = %config.operator,
        "Starting solved notifier"
    );

    match &config.store_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Using file store");
            let posts = FileStore::open(dir, POSTS_NAMESPACE)?;
            let subscriptions = FileStore::open(dir, SUBSCRIPTIONS_NAMESPACE)?;
            run(config, client, posts, subscriptions).await
        }
        None => {
            warn!("NOTIFIER_STORE_DIR not set, state will not survive a restart");
            run(config, client, MemoryStore::new(), MemoryStore::new()).await
        }
    }
}

async fn run<S: KeyValueStore>(
    config: Config,
    client: RedditClient,
    posts: S,
    subscriptions: S,
) -> Result<(), StartupError> {
    let shutdown = CancellationToken::new();
    let identity = BotIdentity::new(client.username(), config.operator.clone());
    let poll = config.poll_config();
    let posts = PostIndex::new(posts);
    let subscriptions = SubscriptionIndex::new(subscriptions);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!(error = %e, "Failed to listen for ctrl-c, shutting down"),
            }
            shutdown.cancel();
        });
    }

    let scanner = tokio::spawn({
        let (client, posts, identity, poll, token) = (
            client.clone(),
            posts.clone(),
            identity.clone(),
            poll.clone(),
            shutdown.clone(),
        );
        supervise("thread_scanner", shutdown.clone(), RetryConfig::RESTART, move || {
            ThreadScanner::new(client.clone(), posts.clone(), identity.clone(), poll.clone())
                .run(token.clone())
        })
    });

    let handler = tokio::spawn({
        let (client, posts, subscriptions, identity, poll, token) = (
            client.clone(),
            posts.clone(),
            subscriptions.clone(),
            identity.clone(),
            poll.clone(),
            shutdown.clone(),
        );
        let id_len = config.id_len;
        supervise("request_handler", shutdown.clone(), RetryConfig::RESTART, move || {
            RequestHandler::new(
                client.clone(),
                posts.clone(),
                subscriptions.clone(),
                identity.clone(),
                poll.clone(),
            )
            .with_id_len(id_len)
            .run(token.clone())
        })
    });

    let detector = tokio::spawn({
        let (client, posts, subscriptions, identity, poll, token) = (
            client.clone(),
            posts.clone(),
            subscriptions.clone(),
            identity.clone(),
            poll.clone(),
            shutdown.clone(),
        );
        supervise("solution_detector", shutdown.clone(), RetryConfig::RESTART, move || {
            SolutionDetector::new(
                client.clone(),
                posts.clone(),
                subscriptions.clone(),
                identity.clone(),
                poll.clone(),
            )
            .run(token.clone())
        })
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", config.listen_addr);
    let app = build_router(AppState::new(posts, subscriptions));
    let server = {
        let token = shutdown.clone();
        axum::serve(listener, app).with_graceful_shutdown(async move { token.cancelled().await })
    };
    if let Err(e) = server.await {
        error!(error = %e, "Inspection server failed, shutting down");
        shutdown.cancel();
    }

    for (name, task) in [
        ("thread_scanner", scanner),
        ("request_handler", handler),
        ("solution_detector", detector),
    ] {
        match task.await {
            Ok(stopped) => info!(worker = name, ?stopped, "Worker finished"),
            Err(e) => error!(worker = name, error = %e, "Supervisor task failed"),
        }
    }
    info!("Shutdown complete");
    Ok(())
}
