use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub(crate) struct BatchStartedResponse {
    pub(crate) batch_id: Uuid,
    pub(crate) pending: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartReviewRequest {
    pub(crate) row_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CancelReviewResponse {
    pub(crate) cancelled_row_id: Option<i64>,
}
