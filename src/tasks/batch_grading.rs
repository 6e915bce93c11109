//! Sequential AI grading over the pending part of a visible list.
//!
//! Each item is scored, aggregated and persisted on its own; a failure on one
//! item is recorded and the loop moves on. Nothing from the scorer or the
//! store escapes [`run_batch`].

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::SubmissionRecord;
use crate::db::types::ReviewStatus;
use crate::services::grading_events::GradingEvents;
use crate::services::rubric::{recompute, PartialReview};
use crate::services::scoring::{Scorer, ScoringError, AI_BATCH_COMMENT_PREFIX};
use crate::services::submission_store::{RubricReviewPayload, StoreError, SubmissionStore};

/// Progress report emitted before an item is scored. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct BatchStep {
    pub(crate) batch_id: Uuid,
    pub(crate) index: usize,
    pub(crate) total: usize,
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct BatchFailure {
    pub(crate) row_id: Option<i64>,
    pub(crate) name: String,
    pub(crate) reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct BatchOutcome {
    pub(crate) batch_id: Uuid,
    pub(crate) attempted: usize,
    pub(crate) succeeded: usize,
    pub(crate) failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub(crate) fn empty(batch_id: Uuid) -> Self {
        Self { batch_id, attempted: 0, succeeded: 0, failures: Vec::new() }
    }
}

#[derive(Debug, Error)]
enum ItemFailure {
    #[error("submission has no row id")]
    MissingRowId,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("store did not apply the review")]
    NotApplied,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ItemFailure {
    fn metric_label(&self) -> &'static str {
        match self {
            Self::MissingRowId => "missing_row_id",
            Self::Scoring(_) => "scoring_failed",
            Self::NotApplied => "not_applied",
            Self::Store(_) => "store_failed",
        }
    }
}

/// Grades every pending record in `visible`, one after another.
pub(crate) async fn run_batch(
    batch_id: Uuid,
    visible: &[SubmissionRecord],
    scorer: &dyn Scorer,
    store: &dyn SubmissionStore,
    events: &dyn GradingEvents,
) -> BatchOutcome {
    metrics::counter!("batch_runs_total").increment(1);

    let pending: Vec<&SubmissionRecord> =
        visible.iter().filter(|record| record.is_pending()).collect();
    let total = pending.len();
    let mut outcome = BatchOutcome::empty(batch_id);

    if total == 0 {
        tracing::info!(%batch_id, "No pending submissions in the visible list");
        events.on_batch_complete(&outcome);
        return outcome;
    }

    tracing::info!(%batch_id, total, "Starting batch grading");

    for (position, record) in pending.into_iter().enumerate() {
        events.on_progress(&BatchStep {
            batch_id,
            index: position + 1,
            total,
            name: record.name.clone(),
        });

        outcome.attempted += 1;
        match grade_item(record, scorer, store).await {
            Ok(row_id) => {
                outcome.succeeded += 1;
                metrics::counter!("batch_items_total", "status" => "graded").increment(1);
                tracing::info!(%batch_id, row_id, "Submission graded");
            }
            Err(failure) => {
                metrics::counter!("batch_items_total", "status" => failure.metric_label())
                    .increment(1);
                tracing::warn!(
                    %batch_id,
                    row_id = ?record.row_id,
                    name = %record.name,
                    error = %failure,
                    "Batch item failed"
                );
                outcome.failures.push(BatchFailure {
                    row_id: record.row_id,
                    name: record.name.clone(),
                    reason: failure.to_string(),
                });
            }
        }
    }

    events.on_batch_complete(&outcome);
    outcome
}

async fn grade_item(
    record: &SubmissionRecord,
    scorer: &dyn Scorer,
    store: &dyn SubmissionStore,
) -> Result<i64, ItemFailure> {
    let row_id = record.row_id.ok_or(ItemFailure::MissingRowId)?;

    let result = scorer.score(record).await?;
    let review = recompute(PartialReview {
        scores: result.scores(),
        comment: result.prefixed_comment(AI_BATCH_COMMENT_PREFIX),
        status: ReviewStatus::Graded,
    });
    let payload = RubricReviewPayload::graded(&review, record.activity_type);

    if store.update_review(row_id, &payload).await? {
        Ok(row_id)
    } else {
        Err(ItemFailure::NotApplied)
    }
}
