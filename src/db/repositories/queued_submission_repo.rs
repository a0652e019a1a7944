//! Queued submission repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::AppResult, models::QueuedSubmission, services::store::SubmissionStore};

/// Repository for the `queued_submissions` table
#[derive(Clone)]
pub struct QueuedSubmissionRepository {
    pool: PgPool,
}

impl QueuedSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for QueuedSubmissionRepository {
    async fn save(&self, item: &QueuedSubmission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO queued_submissions (
                id, group_id, exercise_id, language, source_code, connection_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(item.group_id)
        .bind(item.exercise_id)
        .bind(&item.language)
        .bind(&item.source_code)
        .bind(&item.connection_id)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(r#"DELETE FROM queued_submissions WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_pending(&self) -> AppResult<Vec<QueuedSubmission>> {
        let items = sqlx::query_as::<_, QueuedSubmission>(
            r#"
            SELECT id, group_id, exercise_id, language, source_code, connection_id, created_at
            FROM queued_submissions
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
