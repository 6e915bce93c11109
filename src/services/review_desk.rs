use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::models::SubmissionRecord;
use crate::services::grading_events::GradingEvents;
use crate::services::rubric::{recompute, Criterion, RubricReview, Score};
use crate::services::scoring::{Scorer, ScoringError, AI_ASSIST_COMMENT_PREFIX};
use crate::services::submission_store::{RubricReviewPayload, StoreError, SubmissionStore};

#[derive(Debug, Error)]
pub(crate) enum DeskError {
    #[error("a batch grading run is in progress")]
    BatchInProgress,
    #[error("no submission is being reviewed")]
    NotEditing,
    #[error("submission has no row id")]
    MissingRowId,
    #[error("an AI assessment is already running for this submission")]
    AssistInFlight,
    #[error("the review was closed while the AI assessment was running")]
    Superseded,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("the review was not saved")]
    NotSaved,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Partial update of the draft. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReviewEdit {
    pub(crate) content_accuracy: Option<Score>,
    pub(crate) participation: Option<Score>,
    pub(crate) presentation: Option<Score>,
    pub(crate) discipline: Option<Score>,
    pub(crate) comment: Option<String>,
}

impl ReviewEdit {
    fn apply(self, mut draft: RubricReview) -> RubricReview {
        let edits = [
            (Criterion::ContentAccuracy, self.content_accuracy),
            (Criterion::Participation, self.participation),
            (Criterion::Presentation, self.presentation),
            (Criterion::Discipline, self.discipline),
        ];
        for (criterion, score) in edits {
            if let Some(score) = score {
                draft = draft.with_score(criterion, score);
            }
        }
        if let Some(comment) = self.comment {
            draft = draft.with_comment(comment);
        }
        draft
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct EditingSnapshot {
    pub(crate) row_id: i64,
    pub(crate) submission: SubmissionRecord,
    pub(crate) draft: RubricReview,
    pub(crate) ai_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SavedReview {
    pub(crate) row_id: i64,
    pub(crate) review: RubricReview,
}

#[derive(Debug)]
struct EditSession {
    generation: u64,
    row_id: i64,
    record: SubmissionRecord,
    draft: RubricReview,
}

impl EditSession {
    fn snapshot(&self, assisting: u64) -> EditingSnapshot {
        EditingSnapshot {
            row_id: self.row_id,
            submission: self.record.clone(),
            draft: self.draft.clone(),
            ai_pending: assisting == self.generation,
        }
    }
}

#[derive(Debug, Default)]
struct DeskState {
    session: Option<EditSession>,
    opened: u64,
}

/// Clears the batch flag when the run ends, even if the task panics.
#[derive(Debug)]
pub(crate) struct BatchGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Marks an AI assessment in flight for one session generation. Dropping it,
/// including when the caller's future is dropped mid-call, clears the mark.
struct AssistGuard<'a> {
    slot: &'a AtomicU64,
    generation: u64,
}

impl Drop for AssistGuard<'_> {
    fn drop(&mut self) {
        let _ = self.slot.compare_exchange(self.generation, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// Single-item editing state plus the batch-in-flight flag.
///
/// The state lock is never held across a scorer or store call.
#[derive(Debug, Default)]
pub(crate) struct ReviewDesk {
    state: Mutex<DeskState>,
    batch_running: Arc<AtomicBool>,
    // Generation of the session with an AI assessment in flight, 0 for none.
    assisting: AtomicU64,
}

impl ReviewDesk {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn try_begin_batch(&self) -> Result<BatchGuard, DeskError> {
        self.batch_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DeskError::BatchInProgress)?;
        Ok(BatchGuard { flag: self.batch_running.clone() })
    }

    pub(crate) fn is_batch_running(&self) -> bool {
        self.batch_running.load(Ordering::Acquire)
    }

    fn ensure_no_batch(&self) -> Result<(), DeskError> {
        if self.is_batch_running() {
            return Err(DeskError::BatchInProgress);
        }
        Ok(())
    }

    fn begin_assist(&self, generation: u64) -> Result<AssistGuard<'_>, DeskError> {
        self.assisting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != generation).then_some(generation)
            })
            .map_err(|_| DeskError::AssistInFlight)?;
        Ok(AssistGuard { slot: &self.assisting, generation })
    }

    fn snapshot(&self, session: &EditSession) -> EditingSnapshot {
        session.snapshot(self.assisting.load(Ordering::Acquire))
    }

    pub(crate) async fn current(&self) -> Option<EditingSnapshot> {
        self.state.lock().await.session.as_ref().map(|session| self.snapshot(session))
    }

    /// Opens `record` for editing, replacing any open draft.
    pub(crate) async fn start(&self, record: SubmissionRecord) -> Result<EditingSnapshot, DeskError> {
        self.ensure_no_batch()?;
        let row_id = record.row_id.ok_or(DeskError::MissingRowId)?;
        let draft = record.review.clone().unwrap_or_else(RubricReview::pending);

        let mut state = self.state.lock().await;
        state.opened += 1;
        let session = EditSession { generation: state.opened, row_id, record, draft };
        let snapshot = self.snapshot(&session);
        state.session = Some(session);

        tracing::debug!(row_id, "Review started");
        Ok(snapshot)
    }

    pub(crate) async fn edit(&self, edit: ReviewEdit) -> Result<EditingSnapshot, DeskError> {
        let mut state = self.state.lock().await;
        let session = state.session.as_mut().ok_or(DeskError::NotEditing)?;
        session.draft = edit.apply(session.draft.clone());
        Ok(self.snapshot(session))
    }

    pub(crate) async fn ai_assist(&self, scorer: &dyn Scorer) -> Result<EditingSnapshot, DeskError> {
        self.ensure_no_batch()?;

        let (assist, record) = {
            let state = self.state.lock().await;
            let session = state.session.as_ref().ok_or(DeskError::NotEditing)?;
            (self.begin_assist(session.generation)?, session.record.clone())
        };
        let generation = assist.generation;

        let result = scorer.score(&record).await;
        drop(assist);

        let mut state = self.state.lock().await;
        let session = match state.session.as_mut() {
            Some(session) if session.generation == generation => session,
            _ => return Err(DeskError::Superseded),
        };

        match result {
            Ok(result) => {
                session.draft = session
                    .draft
                    .clone()
                    .with_scores(result.scores())
                    .with_comment(result.prefixed_comment(AI_ASSIST_COMMENT_PREFIX));
                tracing::info!(row_id = session.row_id, "AI assessment applied to draft");
                Ok(self.snapshot(session))
            }
            Err(err) => {
                tracing::warn!(row_id = session.row_id, error = %err, "AI assessment failed");
                Err(DeskError::Scoring(err))
            }
        }
    }

    /// Persists the draft as `Graded`. The draft stays open when the store
    /// does not confirm the update.
    pub(crate) async fn save(
        &self,
        store: &dyn SubmissionStore,
        events: &dyn GradingEvents,
    ) -> Result<SavedReview, DeskError> {
        self.ensure_no_batch()?;

        let (generation, row_id, payload) = {
            let state = self.state.lock().await;
            let session = state.session.as_ref().ok_or(DeskError::NotEditing)?;
            (
                session.generation,
                session.row_id,
                RubricReviewPayload::graded(&session.draft, session.record.activity_type),
            )
        };

        let applied = store.update_review(row_id, &payload).await.map_err(|err| {
            tracing::warn!(row_id, error = %err, "Saving review failed");
            DeskError::Store(err)
        })?;
        if !applied {
            tracing::warn!(row_id, "Store did not apply the review");
            return Err(DeskError::NotSaved);
        }

        {
            let mut state = self.state.lock().await;
            if state.session.as_ref().is_some_and(|session| session.generation == generation) {
                state.session = None;
            }
        }

        events.on_save_complete(row_id);
        Ok(SavedReview { row_id, review: recompute(payload.to_partial()) })
    }

    /// Discards the open draft. Returns the row that was being edited.
    pub(crate) async fn cancel(&self) -> Option<i64> {
        self.state.lock().await.session.take().map(|session| session.row_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;
    use crate::db::types::ReviewStatus;
    use crate::services::scoring::ScoreResult;
    use crate::test_support::{sample_record, CallLog, MemoryStore, RecordingEvents, ScriptedScorer};

    fn edit_scores(values: [i64; 4]) -> ReviewEdit {
        ReviewEdit {
            content_accuracy: Some(Score::coerce(values[0])),
            participation: Some(Score::coerce(values[1])),
            presentation: Some(Score::coerce(values[2])),
            discipline: Some(Score::coerce(values[3])),
            comment: None,
        }
    }

    #[tokio::test]
    async fn start_uses_zeroed_draft_for_unreviewed_record() {
        let desk = ReviewDesk::new();
        let snapshot = desk.start(sample_record(5, "Ploy", "5")).await.expect("start");
        assert_eq!(snapshot.row_id, 5);
        assert_eq!(snapshot.draft, RubricReview::pending());
        assert!(!snapshot.ai_pending);
    }

    #[tokio::test]
    async fn start_rejects_record_without_row_id() {
        let desk = ReviewDesk::new();
        let mut record = sample_record(1, "Ploy", "5");
        record.row_id = None;
        assert!(matches!(desk.start(record).await, Err(DeskError::MissingRowId)));
    }

    #[tokio::test]
    async fn edits_recompute_totals() {
        let desk = ReviewDesk::new();
        desk.start(sample_record(1, "Ploy", "5")).await.expect("start");

        let snapshot = desk.edit(edit_scores([3, 0, 2, 1])).await.expect("edit");
        assert_eq!(snapshot.draft.total_score(), 6);
        assert_eq!(snapshot.draft.percentage(), 30);

        let snapshot = desk
            .edit(ReviewEdit {
                discipline: Some(Score::coerce(9)),
                comment: Some("Try again".to_string()),
                ..Default::default()
            })
            .await
            .expect("edit");
        assert_eq!(snapshot.draft.total_score(), 5);
        assert_eq!(snapshot.draft.comment(), "Try again");
    }

    #[tokio::test]
    async fn edit_without_session_is_rejected() {
        let desk = ReviewDesk::new();
        assert!(matches!(desk.edit(ReviewEdit::default()).await, Err(DeskError::NotEditing)));
    }

    #[tokio::test]
    async fn save_success_clears_session_and_notifies_once() {
        let log = CallLog::default();
        let record = sample_record(4, "Ploy", "5");
        let store = MemoryStore::new(vec![record.clone()], log.clone());
        let events = RecordingEvents::default();
        let desk = ReviewDesk::new();

        desk.start(record).await.expect("start");
        desk.edit(edit_scores([5, 4, 3, 2])).await.expect("edit");
        let saved = desk.save(&store, &events).await.expect("save");

        assert_eq!(saved.row_id, 4);
        assert_eq!(saved.review.total_score(), 14);
        assert_eq!(saved.review.status(), ReviewStatus::Graded);
        assert!(desk.current().await.is_none());
        assert_eq!(events.saved(), vec![4]);
        assert_eq!(log.entries(), vec!["update:4".to_string()]);
        assert!(store.record(4).expect("record").is_graded());
    }

    #[tokio::test]
    async fn save_failure_keeps_session_for_retry() {
        let log = CallLog::default();
        let record = sample_record(4, "Ploy", "5");
        let store = MemoryStore::new(vec![record.clone()], log.clone()).reject_update(4);
        let events = RecordingEvents::default();
        let desk = ReviewDesk::new();

        desk.start(record).await.expect("start");
        desk.edit(edit_scores([1, 1, 1, 1])).await.expect("edit");

        assert!(matches!(desk.save(&store, &events).await, Err(DeskError::NotSaved)));
        let current = desk.current().await.expect("still editing");
        assert_eq!(current.draft.total_score(), 4);
        assert!(events.saved().is_empty());
    }

    #[tokio::test]
    async fn save_store_error_keeps_session() {
        let log = CallLog::default();
        let record = sample_record(4, "Ploy", "5");
        let store = MemoryStore::new(vec![record.clone()], log).fail_update(4, "timeout");
        let events = RecordingEvents::default();
        let desk = ReviewDesk::new();

        desk.start(record).await.expect("start");
        assert!(matches!(desk.save(&store, &events).await, Err(DeskError::Store(_))));
        assert!(desk.current().await.is_some());
    }

    #[tokio::test]
    async fn ai_assist_fills_draft_with_prefix() {
        let log = CallLog::default();
        let scorer = ScriptedScorer::new(log).with_result(
            2,
            Ok(ScoreResult {
                content_accuracy: Score::coerce(5),
                participation: Score::coerce(4),
                presentation: Score::coerce(4),
                discipline: Score::coerce(5),
                comment: " เก่งมาก ".to_string(),
            }),
        );
        let desk = ReviewDesk::new();
        desk.start(sample_record(2, "Ploy", "5")).await.expect("start");

        let snapshot = desk.ai_assist(&scorer).await.expect("assist");
        assert_eq!(snapshot.draft.total_score(), 18);
        assert_eq!(snapshot.draft.percentage(), 90);
        assert_eq!(snapshot.draft.comment(), "[AI assessed]: เก่งมาก");
        assert!(!snapshot.ai_pending);
    }

    #[tokio::test]
    async fn ai_assist_failure_leaves_draft_unchanged() {
        let log = CallLog::default();
        let scorer = ScriptedScorer::new(log)
            .with_result(2, Err(ScoringError::Upstream { status: 503, body: "busy".into() }));
        let desk = ReviewDesk::new();
        desk.start(sample_record(2, "Ploy", "5")).await.expect("start");
        let before = desk.edit(edit_scores([2, 2, 2, 2])).await.expect("edit");

        assert!(matches!(desk.ai_assist(&scorer).await, Err(DeskError::Scoring(_))));
        let after = desk.current().await.expect("editing");
        assert_eq!(after.draft, before.draft);
        assert!(!after.ai_pending);
    }

    #[tokio::test]
    async fn second_assist_is_refused_while_first_runs() {
        let log = CallLog::default();
        let gate = Arc::new(Notify::new());
        let scorer = Arc::new(ScriptedScorer::new(log).with_gate(gate.clone()));
        let desk = Arc::new(ReviewDesk::new());
        desk.start(sample_record(2, "Ploy", "5")).await.expect("start");

        let first = {
            let desk = desk.clone();
            let scorer = scorer.clone();
            tokio::spawn(async move { desk.ai_assist(scorer.as_ref()).await })
        };

        while !desk.current().await.expect("editing").ai_pending {
            tokio::task::yield_now().await;
        }

        assert!(matches!(desk.ai_assist(scorer.as_ref()).await, Err(DeskError::AssistInFlight)));

        gate.notify_one();
        let snapshot = first.await.expect("join").expect("assist");
        assert!(!snapshot.ai_pending);
        assert_eq!(scorer.scored_row_ids(), vec![2]);
    }

    #[tokio::test]
    async fn abandoned_assist_does_not_block_retry() {
        let log = CallLog::default();
        let gate = Arc::new(Notify::new());
        let gated = Arc::new(ScriptedScorer::new(log.clone()).with_gate(gate));
        let desk = Arc::new(ReviewDesk::new());
        desk.start(sample_record(2, "Ploy", "5")).await.expect("start");

        let abandoned = {
            let desk = desk.clone();
            let scorer = gated.clone();
            tokio::spawn(async move { desk.ai_assist(scorer.as_ref()).await })
        };
        while !desk.current().await.expect("editing").ai_pending {
            tokio::task::yield_now().await;
        }

        abandoned.abort();
        assert!(abandoned.await.expect_err("aborted").is_cancelled());
        assert!(!desk.current().await.expect("editing").ai_pending);

        let fresh = ScriptedScorer::new(log);
        let snapshot = desk.ai_assist(&fresh).await.expect("retry");
        assert_eq!(snapshot.draft.total_score(), 12);
        assert!(!snapshot.ai_pending);
    }

    #[tokio::test]
    async fn assist_result_is_dropped_after_cancel() {
        let log = CallLog::default();
        let gate = Arc::new(Notify::new());
        let scorer = Arc::new(ScriptedScorer::new(log).with_gate(gate.clone()));
        let desk = Arc::new(ReviewDesk::new());
        desk.start(sample_record(2, "Ploy", "5")).await.expect("start");

        let pending = {
            let desk = desk.clone();
            let scorer = scorer.clone();
            tokio::spawn(async move { desk.ai_assist(scorer.as_ref()).await })
        };
        while !desk.current().await.expect("editing").ai_pending {
            tokio::task::yield_now().await;
        }

        assert_eq!(desk.cancel().await, Some(2));
        gate.notify_one();
        assert!(matches!(pending.await.expect("join"), Err(DeskError::Superseded)));
        assert!(desk.current().await.is_none());
    }

    #[tokio::test]
    async fn batch_guard_blocks_single_item_operations() {
        let log = CallLog::default();
        let record = sample_record(3, "Ploy", "5");
        let store = MemoryStore::new(vec![record.clone()], log.clone());
        let scorer = ScriptedScorer::new(log.clone());
        let events = RecordingEvents::default();
        let desk = ReviewDesk::new();
        desk.start(record.clone()).await.expect("start");

        let guard = desk.try_begin_batch().expect("guard");
        assert!(matches!(desk.try_begin_batch(), Err(DeskError::BatchInProgress)));
        assert!(matches!(desk.start(record.clone()).await, Err(DeskError::BatchInProgress)));
        assert!(matches!(desk.ai_assist(&scorer).await, Err(DeskError::BatchInProgress)));
        assert!(matches!(desk.save(&store, &events).await, Err(DeskError::BatchInProgress)));
        assert!(log.entries().is_empty());

        drop(guard);
        assert!(!desk.is_batch_running());
        desk.save(&store, &events).await.expect("save after batch");
    }

    #[tokio::test]
    async fn cancel_discards_draft() {
        let desk = ReviewDesk::new();
        assert_eq!(desk.cancel().await, None);
        desk.start(sample_record(8, "Ploy", "5")).await.expect("start");
        desk.edit(edit_scores([5, 5, 5, 5])).await.expect("edit");
        assert_eq!(desk.cancel().await, Some(8));
        assert!(desk.current().await.is_none());
    }
}
