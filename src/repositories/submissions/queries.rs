use sqlx::PgPool;

use crate::db::models::SubmissionRow;

pub(crate) const COLUMNS: &str = "\
    row_id, name, student_number, grade, room, activity_type, file_url, \
    review_content_accuracy, review_participation, review_presentation, review_discipline, \
    review_comment, review_status, reviewed_at";

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {COLUMNS}
         FROM submissions
         ORDER BY created_at, row_id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_row_id(
    pool: &PgPool,
    row_id: i64,
) -> Result<Option<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {COLUMNS}
         FROM submissions
         WHERE row_id = $1"
    ))
    .bind(row_id)
    .fetch_optional(pool)
    .await
}
