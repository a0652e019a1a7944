//! Queued submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A submission waiting to be graded.
///
/// The row in `queued_submissions` only exists between acceptance and the
/// moment a worker claims the item.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct QueuedSubmission {
    pub id: Uuid,
    pub group_id: i32,
    pub exercise_id: i32,
    pub language: String,
    #[serde(skip_serializing)]
    pub source_code: String,
    /// Realtime connection the result is sent back to
    pub connection_id: String,
    pub created_at: DateTime<Utc>,
}

impl QueuedSubmission {
    /// Build a new submission with a fresh id
    pub fn new(
        group_id: i32,
        exercise_id: i32,
        language: impl Into<String>,
        source_code: impl Into<String>,
        connection_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            exercise_id,
            language: language.into(),
            source_code: source_code.into(),
            connection_id: connection_id.into(),
            created_at: Utc::now(),
        }
    }
}
