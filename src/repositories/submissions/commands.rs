use sqlx::PgPool;

use super::types::ReviewUpdate;

/// Writes a review onto the submission row. The activity must match the
/// stored one so a payload can never land on another activity's row.
pub(crate) async fn update_review(
    pool: &PgPool,
    row_id: i64,
    params: ReviewUpdate<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE submissions
         SET review_content_accuracy = $1,
             review_participation = $2,
             review_presentation = $3,
             review_discipline = $4,
             review_total_score = $5,
             review_percentage = $6,
             review_comment = $7,
             review_status = $8,
             reviewed_at = $9
         WHERE row_id = $10
           AND activity_type = $11",
    )
    .bind(params.content_accuracy)
    .bind(params.participation)
    .bind(params.presentation)
    .bind(params.discipline)
    .bind(params.total_score)
    .bind(params.percentage)
    .bind(params.comment)
    .bind(params.status)
    .bind(params.reviewed_at)
    .bind(row_id)
    .bind(params.activity_type)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
