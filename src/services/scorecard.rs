use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::time::format_offset;
use crate::db::models::SubmissionRecord;
use crate::db::types::{ActivityType, Grade};
use crate::services::rubric::MAX_TOTAL_SCORE;
use crate::services::submission_filter::{build_summary, Selection};

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ReportError {
    #[error("no submissions for {grade} {activity} ({room})")]
    Empty { grade: &'static str, activity: &'static str, room: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ScorecardRow {
    pub(crate) room: String,
    pub(crate) student_number: String,
    pub(crate) name: String,
    pub(crate) total_score: Option<u8>,
    pub(crate) percentage: Option<u8>,
    pub(crate) comment: Option<String>,
}

/// Printable roster for one grade and activity, optionally narrowed to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Scorecard {
    pub(crate) grade_label: &'static str,
    pub(crate) activity_label: &'static str,
    pub(crate) room: Selection<String>,
    pub(crate) includes_room_column: bool,
    pub(crate) teacher_name: String,
    pub(crate) generated_at: String,
    pub(crate) max_score: u8,
    pub(crate) graded_count: usize,
    pub(crate) pending_count: usize,
    pub(crate) rows: Vec<ScorecardRow>,
}

pub(crate) fn build_scorecard(
    all: &[SubmissionRecord],
    grade: Grade,
    activity_type: ActivityType,
    room: Selection<String>,
    teacher_name: &str,
    generated_at: OffsetDateTime,
) -> Result<Scorecard, ReportError> {
    let summary = build_summary(all, grade, activity_type, &room);
    if summary.is_empty() {
        return Err(ReportError::Empty {
            grade: grade.label(),
            activity: activity_type.label(),
            room: room.to_string(),
        });
    }

    let graded_count = summary.iter().filter(|record| record.is_graded()).count();
    let pending_count = summary.len() - graded_count;
    let rows = summary.into_iter().map(scorecard_row).collect();

    Ok(Scorecard {
        grade_label: grade.label(),
        activity_label: activity_type.label(),
        includes_room_column: room.is_all(),
        room,
        teacher_name: teacher_name.to_string(),
        generated_at: format_offset(generated_at),
        max_score: MAX_TOTAL_SCORE,
        graded_count,
        pending_count,
        rows,
    })
}

fn scorecard_row(record: SubmissionRecord) -> ScorecardRow {
    let room = record.room.trim_start_matches("Room ").trim().to_string();
    let graded = record.review.filter(|review| review.is_graded());

    ScorecardRow {
        room,
        student_number: record.student_number,
        name: record.name,
        total_score: graded.as_ref().map(|review| review.total_score()),
        percentage: graded.as_ref().map(|review| review.percentage()),
        comment: graded
            .as_ref()
            .map(|review| review.comment().trim().to_string())
            .filter(|comment| !comment.is_empty()),
    }
}
