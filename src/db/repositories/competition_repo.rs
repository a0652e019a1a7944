//! Competition repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{Competition, CompetitionStatus},
    services::store::CompetitionStore,
};

const COMPETITION_COLUMNS: &str = r#"
    id, name, start_inscriptions, end_inscriptions, start_time, end_time,
    stop_ranking, block_submissions, submission_penalty_minutes, status
"#;

/// Repository for competition database operations
#[derive(Clone)]
pub struct CompetitionRepository {
    pool: PgPool,
}

impl CompetitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Move a competition forward to `target`.
    ///
    /// The `status < $2` guard makes the update a no-op for competitions
    /// already at or past the target, so repeated calls are harmless and
    /// the stored status never regresses.
    async fn advance(&self, id: i32, target: CompetitionStatus) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE competitions
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status < $2
            "#,
        )
        .bind(id)
        .bind(target)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(competition_id = id, %target, "Transition already applied");
        }

        Ok(())
    }
}

#[async_trait]
impl CompetitionStore for CompetitionRepository {
    async fn list_open(&self) -> AppResult<Vec<Competition>> {
        let competitions = sqlx::query_as::<_, Competition>(&format!(
            "SELECT {COMPETITION_COLUMNS} FROM competitions WHERE status <> $1 ORDER BY start_time"
        ))
        .bind(CompetitionStatus::Finished)
        .fetch_all(&self.pool)
        .await?;

        Ok(competitions)
    }

    async fn find_current(&self, now: DateTime<Utc>) -> AppResult<Option<Competition>> {
        let competition = sqlx::query_as::<_, Competition>(&format!(
            r#"
            SELECT {COMPETITION_COLUMNS} FROM competitions
            WHERE status <> $1 AND start_time <= $2 AND end_time > $2
            ORDER BY start_time DESC
            LIMIT 1
            "#
        ))
        .bind(CompetitionStatus::Finished)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(competition)
    }

    async fn open_inscriptions(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::OpenInscriptions)
            .await
    }

    async fn close_inscriptions(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::ClosedInscriptions)
            .await
    }

    async fn start(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::Ongoing).await
    }

    async fn end(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::Finished).await
    }
}
