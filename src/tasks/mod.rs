pub(crate) mod batch_grading;
