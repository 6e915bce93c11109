use serde::{Deserialize, Serialize};

use crate::db::models::SubmissionRecord;
use crate::db::types::{ActivityType, Grade};
use crate::services::submission_filter::Selection;

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionListResponse {
    pub(crate) items: Vec<SubmissionRecord>,
    pub(crate) total: usize,
    pub(crate) pending_count: usize,
}

impl SubmissionListResponse {
    pub(crate) fn from_visible(items: Vec<SubmissionRecord>) -> Self {
        let pending_count = items.iter().filter(|record| record.is_pending()).count();
        Self { total: items.len(), pending_count, items }
    }
}

/// Grade and activity are required; the room defaults to every room.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SummaryQuery {
    pub(crate) grade: Grade,
    pub(crate) activity_type: ActivityType,
    #[serde(default)]
    pub(crate) room: Selection<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse {
    pub(crate) grade: Grade,
    pub(crate) activity_type: ActivityType,
    pub(crate) room: Selection<String>,
    pub(crate) items: Vec<SubmissionRecord>,
}
