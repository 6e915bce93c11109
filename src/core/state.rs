use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::grading_events::BatchMonitor;
use crate::services::review_desk::ReviewDesk;
use crate::services::scoring::Scorer;
use crate::services::submission_store::SubmissionStore;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Arc<dyn SubmissionStore>,
    scorer: Arc<dyn Scorer>,
    desk: ReviewDesk,
    monitor: BatchMonitor,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        store: Arc<dyn SubmissionStore>,
        scorer: Arc<dyn Scorer>,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                settings,
                store,
                scorer,
                desk: ReviewDesk::new(),
                monitor: BatchMonitor::new(),
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> &dyn SubmissionStore {
        self.inner.store.as_ref()
    }

    pub(crate) fn scorer(&self) -> &dyn Scorer {
        self.inner.scorer.as_ref()
    }

    pub(crate) fn desk(&self) -> &ReviewDesk {
        &self.inner.desk
    }

    pub(crate) fn monitor(&self) -> &BatchMonitor {
        &self.inner.monitor
    }
}
