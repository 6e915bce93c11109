mod commands;
mod queries;
mod types;

pub(crate) use commands::update_review;
pub(crate) use queries::{find_by_row_id, list_all};
pub(crate) use types::ReviewUpdate;
