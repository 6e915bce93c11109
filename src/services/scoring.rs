use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::db::models::SubmissionRecord;
use crate::services::rubric::{RubricScores, Score};

/// Marks comments written by the batch run.
pub(crate) const AI_BATCH_COMMENT_PREFIX: &str = "[AI auto-graded]: ";
/// Marks comments written by a teacher-requested AI assessment.
pub(crate) const AI_ASSIST_COMMENT_PREFIX: &str = "[AI assessed]: ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct ScoreResult {
    pub(crate) content_accuracy: Score,
    pub(crate) participation: Score,
    pub(crate) presentation: Score,
    pub(crate) discipline: Score,
    pub(crate) comment: String,
}

impl ScoreResult {
    pub(crate) fn scores(&self) -> RubricScores {
        RubricScores {
            content_accuracy: self.content_accuracy,
            participation: self.participation,
            presentation: self.presentation,
            discipline: self.discipline,
        }
    }

    pub(crate) fn prefixed_comment(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.comment.trim())
    }
}

#[derive(Debug, Error)]
pub(crate) enum ScoringError {
    #[error("scoring request failed: {0}")]
    Transport(String),
    #[error("scoring service returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed scoring response: {0}")]
    Malformed(String),
}

/// Produces rubric scores and a comment for one submission.
#[async_trait]
pub(crate) trait Scorer: Send + Sync {
    async fn score(&self, submission: &SubmissionRecord) -> Result<ScoreResult, ScoringError>;
}
