//! Read-only HTTP inspection server.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns 200 if both store namespaces answer
//! - `GET /api/v1/threads/{id}` - Returns what the stores hold for a thread

use std::sync::Arc;

use crate::store::{KeyValueStore, PostIndex, SubscriptionIndex};

pub mod health;
pub mod threads;

pub use health::health_handler;
pub use threads::{ThreadView, thread_handler};

/// Shared application state, passed to handlers via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

#[derive(Debug)]
struct AppStateInner<S> {
    posts: PostIndex<S>,
    subscriptions: SubscriptionIndex<S>,
}

// Manual impl: cloning shares the `Arc` and needs no `S: Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(posts: PostIndex<S>, subscriptions: SubscriptionIndex<S>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                posts,
                subscriptions,
            }),
        }
    }

    pub fn posts(&self) -> &PostIndex<S> {
        &self.inner.posts
    }

    pub fn subscriptions(&self) -> &SubscriptionIndex<S> {
        &self.inner.subscriptions
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<S: KeyValueStore>(app_state: AppState<S>) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/api/v1/threads/{id}", get(thread_handler::<S>))
        .route("/health", get(health_handler::<S>))
        .with_state(app_state)
}
