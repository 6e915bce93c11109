use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::submission::{SubmissionListResponse, SummaryQuery, SummaryResponse};
use crate::services::submission_filter::{build_summary, filter_list, ListCriteria};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_submissions)).route("/summary", get(summary))
}

async fn list_submissions(
    State(state): State<AppState>,
    Query(criteria): Query<ListCriteria>,
) -> Result<Json<SubmissionListResponse>, ApiError> {
    let all = state
        .store()
        .list()
        .await
        .map_err(|err| ApiError::internal(err, "Failed to load submissions"))?;

    Ok(Json(SubmissionListResponse::from_visible(filter_list(&all, &criteria))))
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let all = state
        .store()
        .list()
        .await
        .map_err(|err| ApiError::internal(err, "Failed to load submissions"))?;

    let items = build_summary(&all, query.grade, query.activity_type, &query.room);
    Ok(Json(SummaryResponse {
        grade: query.grade,
        activity_type: query.activity_type,
        room: query.room,
        items,
    }))
}
