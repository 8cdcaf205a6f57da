//! Thread inspection endpoint.
//!
//! Shows what both namespaces hold for one thread. Nothing here calls the
//! platform.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppState;
use crate::store::{KeyValueStore, StoreError};
use crate::types::{CommentId, InvalidId, ThreadId, ThreadLifecycle, Username};

/// Errors that can occur when inspecting a thread.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("{0}")]
    InvalidId(#[from] InvalidId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for InspectError {
    fn into_response(self) -> Response {
        let status = match &self {
            InspectError::InvalidId(_) => StatusCode::BAD_REQUEST,
            InspectError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// What the stores hold for a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadView {
    pub thread: ThreadId,
    pub lifecycle: ThreadLifecycle,
    /// True while the Post Index has an entry.
    pub tracked: bool,
    pub artifact: Option<CommentId>,
    /// In subscription order.
    pub subscribers: Vec<Username>,
}

/// `GET /api/v1/threads/{id}`
///
/// The id may be bare (`abc123`) or a fullname (`t3_abc123`). Unknown threads
/// are reported as untracked with no subscribers rather than 404, since the
/// platform is never asked whether they exist.
pub async fn thread_handler<S: KeyValueStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<ThreadView>, InspectError> {
    let thread = ThreadId::parse(&id)?;
    let lifecycle = state.posts().lifecycle(&thread).await?;
    let subscribers = state.subscriptions().subscribers(&thread).await?;

    Ok(Json(ThreadView {
        thread,
        tracked: lifecycle.is_tracked(),
        artifact: lifecycle.artifact().cloned(),
        lifecycle,
        subscribers,
    }))
}
