//! Liveness endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use super::AppState;
use crate::store::{KeyValueStore, StoreError};

/// Key that is never written; reading it only proves the store answers.
const PROBE_KEY: &str = "__health__";

async fn probe<S: KeyValueStore>(state: &AppState<S>) -> Result<(), StoreError> {
    state.posts().store().exists(PROBE_KEY).await?;
    state.subscriptions().store().exists(PROBE_KEY).await?;
    Ok(())
}

/// Returns 200 "OK", or 503 if either store namespace fails to answer.
pub async fn health_handler<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, &'static str) {
    match probe(&state).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            warn!(error = %e, "Health probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
        }
    }
}
