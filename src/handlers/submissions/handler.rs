//! Submission handler implementations

use axum::{extract::State, http::StatusCode, Json};

use crate::{error::AppResult, models::QueuedSubmission, state::AppState};

use super::{request::CreateSubmissionRequest, response::CreateSubmissionResponse};

/// Persist a submission and queue it for grading
pub async fn create_submission(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<(StatusCode, Json<CreateSubmissionResponse>)> {
    let item = QueuedSubmission::from(payload);
    let id = item.id;
    state.queue().enqueue(item).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateSubmissionResponse {
            id,
            message: "Submission received and queued for grading".to_string(),
        }),
    ))
}
