use time::PrimitiveDateTime;

use crate::db::types::{ActivityType, ReviewStatus};

#[derive(Debug, Clone)]
pub(crate) struct ReviewUpdate<'a> {
    pub(crate) content_accuracy: i16,
    pub(crate) participation: i16,
    pub(crate) presentation: i16,
    pub(crate) discipline: i16,
    pub(crate) total_score: i16,
    pub(crate) percentage: i16,
    pub(crate) comment: &'a str,
    pub(crate) status: ReviewStatus,
    pub(crate) activity_type: ActivityType,
    pub(crate) reviewed_at: PrimitiveDateTime,
}
