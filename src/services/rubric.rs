//! Four-criterion rubric: score coercion and total/percentage aggregation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db::types::ReviewStatus;

pub(crate) const MAX_CRITERION_SCORE: u8 = 5;
pub(crate) const MAX_TOTAL_SCORE: u8 = MAX_CRITERION_SCORE * 4;

/// A single criterion score in `0..=5`.
///
/// Decoding never fails: out-of-range, fractional or non-numeric input
/// becomes zero so the rubric form always stays computable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub(crate) struct Score(u8);

impl Score {
    pub(crate) const ZERO: Score = Score(0);

    pub(crate) fn coerce(value: i64) -> Self {
        if (0..=i64::from(MAX_CRITERION_SCORE)).contains(&value) {
            Self(value as u8)
        } else {
            Self::ZERO
        }
    }

    pub(crate) fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    return Self::coerce(int);
                }
                match number.as_f64() {
                    Some(float) if float.is_finite() && float.fract() == 0.0 => {
                        Self::coerce(float as i64)
                    }
                    _ => Self::ZERO,
                }
            }
            Value::String(raw) => raw.trim().parse::<i64>().map(Self::coerce).unwrap_or(Self::ZERO),
            _ => Self::ZERO,
        }
    }

    pub(crate) fn value(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Criterion {
    ContentAccuracy,
    Participation,
    Presentation,
    Discipline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RubricScores {
    pub(crate) content_accuracy: Score,
    pub(crate) participation: Score,
    pub(crate) presentation: Score,
    pub(crate) discipline: Score,
}

impl RubricScores {
    pub(crate) fn with(mut self, criterion: Criterion, score: Score) -> Self {
        match criterion {
            Criterion::ContentAccuracy => self.content_accuracy = score,
            Criterion::Participation => self.participation = score,
            Criterion::Presentation => self.presentation = score,
            Criterion::Discipline => self.discipline = score,
        }
        self
    }

    pub(crate) fn total(&self) -> u8 {
        self.content_accuracy.value()
            + self.participation.value()
            + self.presentation.value()
            + self.discipline.value()
    }
}

/// The editable inputs of a review; totals are derived by [`recompute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PartialReview {
    pub(crate) scores: RubricScores,
    pub(crate) comment: String,
    pub(crate) status: ReviewStatus,
}

/// A scored review. Total and percentage are private so they can only come
/// out of [`recompute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RubricReview {
    #[serde(flatten)]
    scores: RubricScores,
    total_score: u8,
    percentage: u8,
    comment: String,
    status: ReviewStatus,
}

impl RubricReview {
    pub(crate) fn pending() -> Self {
        recompute(PartialReview::default())
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

    pub(crate) fn is_graded(&self) -> bool {
        self.status == ReviewStatus::Graded
    }

    pub(crate) fn into_partial(self) -> PartialReview {
        PartialReview { scores: self.scores, comment: self.comment, status: self.status }
    }

    pub(crate) fn with_score(self, criterion: Criterion, score: Score) -> Self {
        let mut partial = self.into_partial();
        partial.scores = partial.scores.with(criterion, score);
        recompute(partial)
    }

    pub(crate) fn with_scores(self, scores: RubricScores) -> Self {
        let mut partial = self.into_partial();
        partial.scores = scores;
        recompute(partial)
    }

    pub(crate) fn with_comment(self, comment: String) -> Self {
        let mut partial = self.into_partial();
        partial.comment = comment;
        recompute(partial)
    }

    pub(crate) fn with_status(self, status: ReviewStatus) -> Self {
        let mut partial = self.into_partial();
        partial.status = status;
        recompute(partial)
    }
}

pub(crate) fn recompute(partial: PartialReview) -> RubricReview {
    let total_score = partial.scores.total();
    RubricReview {
        scores: partial.scores,
        total_score,
        percentage: percentage_of(total_score),
        comment: partial.comment,
        status: partial.status,
    }
}

/// `round(total / 20 * 100)`, rounding halves up.
pub(crate) fn percentage_of(total: u8) -> u8 {
    let max = u32::from(MAX_TOTAL_SCORE);
    let scaled = u32::from(total.min(MAX_TOTAL_SCORE)) * 100;
    ((scaled * 2 + max) / (max * 2)) as u8
}
