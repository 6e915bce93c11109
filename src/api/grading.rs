use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::grading::{BatchStartedResponse, CancelReviewResponse, StartReviewRequest};
use crate::services::grading_events::BatchProgress;
use crate::services::review_desk::{EditingSnapshot, ReviewEdit, SavedReview};
use crate::services::submission_filter::{filter_list, ListCriteria};
use crate::tasks::batch_grading::run_batch;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/batch", post(start_batch))
        .route("/batch/progress", get(batch_progress))
        .route(
            "/review",
            get(current_review).post(start_review).patch(edit_review).delete(cancel_review),
        )
        .route("/review/ai-assist", post(ai_assist))
        .route("/review/save", post(save_review))
}

/// Grades the pending part of the list selected by `criteria` in the
/// background. Only one run may be active.
async fn start_batch(
    State(state): State<AppState>,
    Json(criteria): Json<ListCriteria>,
) -> Result<(StatusCode, Json<BatchStartedResponse>), ApiError> {
    let guard = state.desk().try_begin_batch()?;

    let all = state
        .store()
        .list()
        .await
        .map_err(|err| ApiError::internal(err, "Failed to load submissions"))?;
    let visible = filter_list(&all, &criteria);
    let pending = visible.iter().filter(|record| record.is_pending()).count();

    let batch_id = Uuid::new_v4();
    state.monitor().begin(batch_id, pending);
    tracing::info!(%batch_id, visible = visible.len(), pending, "Batch grading accepted");

    let task_state = state.clone();
    tokio::spawn(async move {
        let _guard = guard;
        run_batch(
            batch_id,
            &visible,
            task_state.scorer(),
            task_state.store(),
            task_state.monitor(),
        )
        .await;
    });

    Ok((StatusCode::ACCEPTED, Json(BatchStartedResponse { batch_id, pending })))
}

async fn batch_progress(State(state): State<AppState>) -> Json<BatchProgress> {
    Json(state.monitor().snapshot())
}

async fn current_review(State(state): State<AppState>) -> Json<Option<EditingSnapshot>> {
    Json(state.desk().current().await)
}

async fn start_review(
    State(state): State<AppState>,
    Json(payload): Json<StartReviewRequest>,
) -> Result<Json<EditingSnapshot>, ApiError> {
    let record = state
        .store()
        .get(payload.row_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    Ok(Json(state.desk().start(record).await?))
}

async fn edit_review(
    State(state): State<AppState>,
    Json(edit): Json<ReviewEdit>,
) -> Result<Json<EditingSnapshot>, ApiError> {
    Ok(Json(state.desk().edit(edit).await?))
}

async fn ai_assist(State(state): State<AppState>) -> Result<Json<EditingSnapshot>, ApiError> {
    Ok(Json(state.desk().ai_assist(state.scorer()).await?))
}

async fn save_review(State(state): State<AppState>) -> Result<Json<SavedReview>, ApiError> {
    Ok(Json(state.desk().save(state.store(), state.monitor()).await?))
}

async fn cancel_review(State(state): State<AppState>) -> Json<CancelReviewResponse> {
    Json(CancelReviewResponse { cancelled_row_id: state.desk().cancel().await })
}
