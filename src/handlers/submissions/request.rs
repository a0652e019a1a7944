//! Submission request DTOs

use serde::Deserialize;

use crate::models::QueuedSubmission;

/// Create submission request
#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub group_id: i32,
    pub exercise_id: i32,
    pub language: String,
    pub source_code: String,
    /// Realtime connection the verdict is pushed back to
    pub connection_id: String,
}

impl From<CreateSubmissionRequest> for QueuedSubmission {
    fn from(req: CreateSubmissionRequest) -> Self {
        QueuedSubmission::new(
            req.group_id,
            req.exercise_id,
            req.language,
            req.source_code,
            req.connection_id,
        )
    }
}
