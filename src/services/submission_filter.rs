use std::fmt;

use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::models::SubmissionRecord;
use crate::db::types::{ActivityType, Grade, ReviewStatus};

const WILDCARD: &str = "All";

/// Either the wildcard `"All"` or one exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub(crate) fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }
}

impl<T> Selection<T> {
    pub(crate) fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<'de, T> Deserialize<'de> for Selection<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == WILDCARD {
            return Ok(Self::All);
        }
        let value = T::deserialize(IntoDeserializer::<D::Error>::into_deserializer(
            trimmed.to_string(),
        ))?;
        Ok(Self::Only(value))
    }
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::All => serializer.serialize_str(WILDCARD),
            Self::Only(value) => value.serialize(serializer),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(WILDCARD),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// Dashboard list filter. Every field defaults to "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ListCriteria {
    pub(crate) text: String,
    pub(crate) grade: Selection<Grade>,
    pub(crate) room: Selection<String>,
    pub(crate) activity_type: Selection<ActivityType>,
    pub(crate) status: Selection<ReviewStatus>,
}

impl ListCriteria {
    fn matches(&self, record: &SubmissionRecord, needle: &str) -> bool {
        let text_hit = needle.is_empty()
            || record.name.to_lowercase().contains(needle)
            || record.student_number.contains(needle);

        text_hit
            && self.grade.admits(&record.grade)
            && self.room.admits(&record.room)
            && self.activity_type.admits(&record.activity_type)
            && self.status.admits(&derived_status(record))
    }
}

fn derived_status(record: &SubmissionRecord) -> ReviewStatus {
    if record.is_graded() {
        ReviewStatus::Graded
    } else {
        ReviewStatus::Pending
    }
}

/// Records matching every criterion, in input order.
pub(crate) fn filter_list(all: &[SubmissionRecord], criteria: &ListCriteria) -> Vec<SubmissionRecord> {
    let needle = criteria.text.to_lowercase();
    all.iter().filter(|record| criteria.matches(record, &needle)).cloned().collect()
}

/// Records of one grade and activity (optionally one room), ordered by room
/// then by numeric student number.
pub(crate) fn build_summary(
    all: &[SubmissionRecord],
    grade: Grade,
    activity_type: ActivityType,
    room: &Selection<String>,
) -> Vec<SubmissionRecord> {
    let mut rows: Vec<SubmissionRecord> = all
        .iter()
        .filter(|record| {
            record.grade == grade && record.activity_type == activity_type && room.admits(&record.room)
        })
        .cloned()
        .collect();

    rows.sort_by(|left, right| {
        left.room
            .cmp(&right.room)
            .then_with(|| roll_number(&left.student_number).cmp(&roll_number(&right.student_number)))
    });
    rows
}

/// Leading-integer parse of a student number; anything unparseable is 0.
pub(crate) fn roll_number(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for ch in digits.chars() {
        let Some(digit) = ch.to_digit(10) else { break };
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }

    if negative {
        -value
    } else {
        value
    }
}
