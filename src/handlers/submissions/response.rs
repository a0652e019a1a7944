//! Submission response DTOs

use serde::Serialize;
use uuid::Uuid;

/// Accepted submission
#[derive(Debug, Serialize)]
pub struct CreateSubmissionResponse {
    pub id: Uuid,
    pub message: String,
}
