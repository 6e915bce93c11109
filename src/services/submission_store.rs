use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::core::time::primitive_now_utc;
use crate::db::models::SubmissionRecord;
use crate::db::types::{ActivityType, ReviewStatus};
use crate::repositories;
use crate::services::rubric::{PartialReview, RubricReview, RubricScores};

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("submission store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            other => Self::Database(other),
        }
    }
}

/// The review as handed to the store. Built only from a [`RubricReview`], so
/// totals always agree with the components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RubricReviewPayload {
    #[serde(flatten)]
    scores: RubricScores,
    total_score: u8,
    percentage: u8,
    comment: String,
    status: ReviewStatus,
    activity_type: ActivityType,
}

impl RubricReviewPayload {
    /// Payload for a completed review; the status is always `Graded`.
    pub(crate) fn graded(review: &RubricReview, activity_type: ActivityType) -> Self {
        Self {
            scores: review.scores(),
            total_score: review.total_score(),
            percentage: review.percentage(),
            comment: review.comment().to_string(),
            status: ReviewStatus::Graded,
            activity_type,
        }
    }

    pub(crate) fn scores(&self) -> RubricScores {
        self.scores
    }

    pub(crate) fn total_score(&self) -> u8 {
        self.total_score
    }

    pub(crate) fn percentage(&self) -> u8 {
        self.percentage
    }

    pub(crate) fn comment(&self) -> &str {
        &self.comment
    }

    pub(crate) fn status(&self) -> ReviewStatus {
        self.status
    }

    pub(crate) fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub(crate) fn to_partial(&self) -> PartialReview {
        PartialReview { scores: self.scores, comment: self.comment.clone(), status: self.status }
    }
}

/// Owner of the submission list. `update_review` reports whether the update
/// was durably applied.
#[async_trait]
pub(crate) trait SubmissionStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SubmissionRecord>, StoreError>;

    async fn get(&self, row_id: i64) -> Result<Option<SubmissionRecord>, StoreError>;

    async fn update_review(
        &self,
        row_id: i64,
        review: &RubricReviewPayload,
    ) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub(crate) struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn list(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        let rows = repositories::submissions::list_all(&self.pool).await?;
        Ok(rows.into_iter().map(SubmissionRecord::from).collect())
    }

    async fn get(&self, row_id: i64) -> Result<Option<SubmissionRecord>, StoreError> {
        let row = repositories::submissions::find_by_row_id(&self.pool, row_id).await?;
        Ok(row.map(SubmissionRecord::from))
    }

    async fn update_review(
        &self,
        row_id: i64,
        review: &RubricReviewPayload,
    ) -> Result<bool, StoreError> {
        let scores = review.scores();
        let applied = repositories::submissions::update_review(
            &self.pool,
            row_id,
            repositories::submissions::ReviewUpdate {
                content_accuracy: i16::from(scores.content_accuracy.value()),
                participation: i16::from(scores.participation.value()),
                presentation: i16::from(scores.presentation.value()),
                discipline: i16::from(scores.discipline.value()),
                total_score: i16::from(review.total_score()),
                percentage: i16::from(review.percentage()),
                comment: review.comment(),
                status: review.status(),
                activity_type: review.activity_type(),
                reviewed_at: primitive_now_utc(),
            },
        )
        .await?;

        if !applied {
            tracing::warn!(row_id, "Review update matched no submission row");
        }

        Ok(applied)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        repositories::health::ping(&self.pool).await?;
        Ok(())
    }
}
