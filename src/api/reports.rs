use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::submission::SummaryQuery;
use crate::services::scorecard::{build_scorecard, Scorecard};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/scorecard", get(scorecard))
}

async fn scorecard(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Scorecard>, ApiError> {
    let all = state
        .store()
        .list()
        .await
        .map_err(|err| ApiError::internal(err, "Failed to load submissions"))?;

    let card = build_scorecard(
        &all,
        query.grade,
        query.activity_type,
        query.room,
        &state.settings().classroom().teacher_name,
        OffsetDateTime::now_utc(),
    )?;

    Ok(Json(card))
}
