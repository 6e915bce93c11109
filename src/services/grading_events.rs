use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::tasks::batch_grading::{BatchOutcome, BatchStep};

/// Notifications emitted by the batch run and the review desk.
pub(crate) trait GradingEvents: Send + Sync {
    fn on_progress(&self, _step: &BatchStep) {}

    /// Called exactly once per batch run, after the last item.
    fn on_batch_complete(&self, outcome: &BatchOutcome);

    fn on_save_complete(&self, row_id: i64);
}

/// Latest observable state of the batch runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub(crate) enum BatchProgress {
    #[default]
    Idle,
    Running {
        batch_id: Uuid,
        current: usize,
        total: usize,
        scoring: Option<String>,
    },
    Finished(BatchOutcome),
}

/// Publishes batch progress over a `watch` channel so the API can poll it.
#[derive(Debug)]
pub(crate) struct BatchMonitor {
    progress: watch::Sender<BatchProgress>,
}

impl Default for BatchMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchMonitor {
    pub(crate) fn new() -> Self {
        let (progress, _) = watch::channel(BatchProgress::Idle);
        Self { progress }
    }

    pub(crate) fn begin(&self, batch_id: Uuid, total: usize) {
        self.progress.send_replace(BatchProgress::Running {
            batch_id,
            current: 0,
            total,
            scoring: None,
        });
    }

    pub(crate) fn snapshot(&self) -> BatchProgress {
        self.progress.borrow().clone()
    }

    #[cfg(test)]
    pub(crate) fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }
}

impl GradingEvents for BatchMonitor {
    fn on_progress(&self, step: &BatchStep) {
        self.progress.send_modify(|progress| {
            *progress = BatchProgress::Running {
                batch_id: step.batch_id,
                current: step.index,
                total: step.total,
                scoring: Some(step.name.clone()),
            };
        });
    }

    fn on_batch_complete(&self, outcome: &BatchOutcome) {
        tracing::info!(
            batch_id = %outcome.batch_id,
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            "Batch grading finished"
        );
        self.progress.send_replace(BatchProgress::Finished(outcome.clone()));
    }

    fn on_save_complete(&self, row_id: i64) {
        metrics::counter!("reviews_saved_total").increment(1);
        tracing::info!(row_id, "Review saved");
    }
}
