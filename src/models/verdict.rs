//! Verdict types and the result message pushed to subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Competition, QueuedSubmission};

/// Final verdict for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Passed all checks
    Accepted,
    /// Output does not match expected
    WrongAnswer,
    /// Exceeded time limit
    TimeLimitExceeded,
    /// Exceeded memory limit
    MemoryLimitExceeded,
    /// Program crashed or non-zero exit
    RuntimeError,
    /// Source did not compile
    CompilationError,
    /// Output differs only in whitespace
    PresentationError,
}

impl Verdict {
    /// Get short code for verdict
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "AC",
            Verdict::WrongAnswer => "WA",
            Verdict::TimeLimitExceeded => "TLE",
            Verdict::MemoryLimitExceeded => "MLE",
            Verdict::RuntimeError => "RE",
            Verdict::CompilationError => "CE",
            Verdict::PresentationError => "PE",
        }
    }

    /// Compilation errors do not count as a penalized attempt
    pub fn is_penalized(&self) -> bool {
        !matches!(self, Verdict::Accepted | Verdict::CompilationError)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// What the grading service returns for one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingOutcome {
    pub verdict: Verdict,
    #[serde(default)]
    pub time_ms: Option<u64>,
    #[serde(default)]
    pub memory_kb: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Message delivered to the admins, the reviewers and the submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub submission_id: Uuid,
    pub group_id: i32,
    pub exercise_id: i32,
    pub competition_id: i32,
    pub outcome: GradingOutcome,
    pub penalty_minutes: i64,
    pub ranking_frozen: bool,
    pub graded_at: DateTime<Utc>,
}

impl SubmissionResult {
    pub fn new(
        item: &QueuedSubmission,
        competition: &Competition,
        outcome: GradingOutcome,
        graded_at: DateTime<Utc>,
    ) -> Self {
        let penalty_minutes = if outcome.verdict.is_penalized() {
            competition.submission_penalty().num_minutes()
        } else {
            0
        };

        Self {
            submission_id: item.id,
            group_id: item.group_id,
            exercise_id: item.exercise_id,
            competition_id: competition.id,
            outcome,
            penalty_minutes,
            ranking_frozen: competition.is_ranking_frozen(graded_at),
            graded_at,
        }
    }
}
