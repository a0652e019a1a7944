//! Competition model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Competition database model
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Competition {
    pub id: i32,
    pub name: String,
    pub start_inscriptions: DateTime<Utc>,
    pub end_inscriptions: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Ranking stops updating from this instant on
    pub stop_ranking: DateTime<Utc>,
    /// Submissions after this instant are marked as late
    pub block_submissions: DateTime<Utc>,
    pub submission_penalty_minutes: i32,
    pub status: CompetitionStatus,
}

impl Competition {
    /// Penalty added for every rejected attempt
    pub fn submission_penalty(&self) -> Duration {
        Duration::minutes(self.submission_penalty_minutes as i64)
    }

    /// Check `start_inscriptions < end_inscriptions <= start_time < end_time`
    pub fn has_valid_timeline(&self) -> bool {
        self.start_inscriptions < self.end_inscriptions
            && self.end_inscriptions <= self.start_time
            && self.start_time < self.end_time
    }

    pub fn is_ranking_frozen(&self, now: DateTime<Utc>) -> bool {
        now >= self.stop_ranking
    }

    pub fn blocks_submissions(&self, now: DateTime<Utc>) -> bool {
        now >= self.block_submissions
    }

    /// Check if the run window contains `now`
    pub fn is_running_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }
}

/// Competition lifecycle status.
///
/// Stored as SMALLINT; the discriminants give the forward order, so
/// comparing two statuses tells which one is further along.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    Pending = 0,
    OpenInscriptions = 1,
    ClosedInscriptions = 2,
    Ongoing = 3,
    Finished = 4,
}

impl CompetitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OpenInscriptions => "open_inscriptions",
            Self::ClosedInscriptions => "closed_inscriptions",
            Self::Ongoing => "ongoing",
            Self::Finished => "finished",
        }
    }

    /// Finished is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
