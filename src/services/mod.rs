pub(crate) mod ai_scoring;
pub(crate) mod grading_events;
pub(crate) mod review_desk;
pub(crate) mod rubric;
pub(crate) mod scorecard;
pub(crate) mod scoring;
pub(crate) mod submission_filter;
pub(crate) mod submission_store;
