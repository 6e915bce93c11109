use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{ActivityType, Grade, ReviewStatus};
use crate::services::rubric::{recompute, PartialReview, RubricReview, RubricScores, Score};

/// One student's video submission for one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SubmissionRecord {
    pub(crate) row_id: Option<i64>,
    pub(crate) name: String,
    pub(crate) student_number: String,
    pub(crate) grade: Grade,
    pub(crate) room: String,
    pub(crate) activity_type: ActivityType,
    pub(crate) file_url: String,
    pub(crate) review: Option<RubricReview>,
}

impl SubmissionRecord {
    pub(crate) fn is_graded(&self) -> bool {
        self.review.as_ref().is_some_and(RubricReview::is_graded)
    }

    pub(crate) fn is_pending(&self) -> bool {
        !self.is_graded()
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SubmissionRow {
    pub(crate) row_id: i64,
    pub(crate) name: String,
    pub(crate) student_number: String,
    pub(crate) grade: Grade,
    pub(crate) room: String,
    pub(crate) activity_type: ActivityType,
    pub(crate) file_url: String,
    pub(crate) review_content_accuracy: Option<i16>,
    pub(crate) review_participation: Option<i16>,
    pub(crate) review_presentation: Option<i16>,
    pub(crate) review_discipline: Option<i16>,
    pub(crate) review_comment: Option<String>,
    pub(crate) review_status: Option<ReviewStatus>,
    #[allow(dead_code)]
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
}

impl From<SubmissionRow> for SubmissionRecord {
    fn from(row: SubmissionRow) -> Self {
        // Stored totals are ignored; they are always rebuilt from the components.
        let review = row.review_status.map(|status| {
            recompute(PartialReview {
                scores: RubricScores {
                    content_accuracy: column_score(row.review_content_accuracy),
                    participation: column_score(row.review_participation),
                    presentation: column_score(row.review_presentation),
                    discipline: column_score(row.review_discipline),
                },
                comment: row.review_comment.clone().unwrap_or_default(),
                status,
            })
        });

        Self {
            row_id: Some(row.row_id),
            name: row.name,
            student_number: row.student_number,
            grade: row.grade,
            room: row.room,
            activity_type: row.activity_type,
            file_url: row.file_url,
            review,
        }
    }
}

fn column_score(value: Option<i16>) -> Score {
    Score::coerce(value.map(i64::from).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: Option<ReviewStatus>) -> SubmissionRow {
        SubmissionRow {
            row_id: 7,
            name: "Somchai".to_string(),
            student_number: "12".to_string(),
            grade: Grade::Prathom5,
            room: "Room 1".to_string(),
            activity_type: ActivityType::SportsDay,
            file_url: "https://videos.example/7".to_string(),
            review_content_accuracy: Some(5),
            review_participation: Some(4),
            review_presentation: Some(9),
            review_discipline: None,
            review_comment: Some("Nice".to_string()),
            review_status: status,
            reviewed_at: None,
        }
    }

    #[test]
    fn row_without_status_has_no_review() {
        let record = SubmissionRecord::from(row(None));
        assert_eq!(record.row_id, Some(7));
        assert!(record.review.is_none());
        assert!(record.is_pending());
    }

    #[test]
    fn row_review_is_recomputed_from_components() {
        let record = SubmissionRecord::from(row(Some(ReviewStatus::Graded)));
        let review = record.review.as_ref().expect("review");
        assert_eq!(review.total_score(), 9);
        assert_eq!(review.percentage(), 45);
        assert!(record.is_graded());
    }
}
