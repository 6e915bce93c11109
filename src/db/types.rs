use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "gradelevel", rename_all = "lowercase")]
pub(crate) enum Grade {
    #[serde(rename = "Prathom 5")]
    Prathom5,
    #[serde(rename = "Prathom 6")]
    Prathom6,
}

impl Grade {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Prathom5 => "Prathom 5",
            Self::Prathom6 => "Prathom 6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "activitytype", rename_all = "snake_case")]
pub(crate) enum ActivityType {
    #[serde(rename = "Sports Day")]
    SportsDay,
    #[serde(rename = "Children Day")]
    ChildrenDay,
}

impl ActivityType {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::SportsDay => "Sports Day",
            Self::ChildrenDay => "Children Day",
        }
    }

    /// What the student was asked to film, used when prompting the scorer.
    pub(crate) fn task_description(self) -> &'static str {
        match self {
            Self::SportsDay => "sports-day style physical movement and team sports skills",
            Self::ChildrenDay => "a creative Children's Day activity",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "reviewstatus", rename_all = "lowercase")]
pub(crate) enum ReviewStatus {
    #[default]
    Pending,
    Graded,
}
