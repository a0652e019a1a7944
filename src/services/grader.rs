//! Judge client
//!
//! The judge itself runs elsewhere; workers only need `grade`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::JudgeConfig,
    error::{AppError, AppResult},
    models::{Competition, GradingOutcome, QueuedSubmission},
    utils::time::now_utc,
};

/// Evaluate one submission in the context of a competition
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(
        &self,
        competition: &Competition,
        item: &QueuedSubmission,
    ) -> AppResult<GradingOutcome>;
}

/// Body of `POST {judge}/grade`
#[derive(Debug, Serialize)]
struct GradeRequest<'a> {
    submission_id: Uuid,
    competition_id: i32,
    group_id: i32,
    exercise_id: i32,
    language: &'a str,
    source_code: &'a str,
    submitted_at: DateTime<Utc>,
    /// Submission arrived after the blocking instant
    late: bool,
}

/// Grader backed by the judge's HTTP API
pub struct HttpGrader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGrader {
    pub fn new(config: &JudgeConfig) -> AppResult<Self> {
        Self::with_timeout(&config.url, config.timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("judge client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/grade", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Grader for HttpGrader {
    async fn grade(
        &self,
        competition: &Competition,
        item: &QueuedSubmission,
    ) -> AppResult<GradingOutcome> {
        let body = GradeRequest {
            submission_id: item.id,
            competition_id: competition.id,
            group_id: item.group_id,
            exercise_id: item.exercise_id,
            language: &item.language,
            source_code: &item.source_code,
            submitted_at: item.created_at,
            late: competition.blocks_submissions(now_utc()),
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::GradingUnavailable(format!(
                "judge answered {}: {}",
                status, detail
            )));
        }

        Ok(response.json::<GradingOutcome>().await?)
    }
}
