use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use notes_core::sync::{PullSnapshot, PushOutcome, SyncBatch};

use crate::auth::{user_fingerprint, AuthenticatedUser};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::AppState;

pub async fn pull(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<PullSnapshot>, AppError> {
    let snapshot = state.sync.pull(&user.user_id).await?;
    tracing::debug!(
        user = user_fingerprint(&user.user_id),
        notes = snapshot.notes.created.len(),
        categories = snapshot.categories.created.len(),
        "Served sync pull"
    );
    Ok(ApiResponse::ok(snapshot))
}

pub async fn push(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<SyncBatch>, JsonRejection>,
) -> Result<ApiResponse<PushOutcome>, AppError> {
    let Json(batch) = body?;
    let outcome = state.sync.push(&user.user_id, batch).await?;
    tracing::info!(
        user = user_fingerprint(&user.user_id),
        mapped = outcome.created_ids.notes.len(),
        "Applied sync push"
    );
    Ok(ApiResponse::ok(outcome).with_message("Sync completed successfully"))
}
