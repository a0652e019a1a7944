//! Persistence contracts consumed by the scheduler and the queue

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Competition, QueuedSubmission},
};

/// Read and advance competition records.
///
/// Every transition must be idempotent: calling it on a competition that
/// already reached (or passed) the target status is a no-op.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompetitionStore: Send + Sync {
    /// All competitions whose status is not `Finished`
    async fn list_open(&self) -> AppResult<Vec<Competition>>;

    /// The competition whose run window contains `now`, if any
    async fn find_current(&self, now: DateTime<Utc>) -> AppResult<Option<Competition>>;

    async fn open_inscriptions(&self, competition: &Competition) -> AppResult<()>;

    async fn close_inscriptions(&self, competition: &Competition) -> AppResult<()>;

    async fn start(&self, competition: &Competition) -> AppResult<()>;

    async fn end(&self, competition: &Competition) -> AppResult<()>;
}

/// Durable copy of submissions that were accepted but not yet claimed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn save(&self, item: &QueuedSubmission) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Every persisted item, oldest first
    async fn list_pending(&self) -> AppResult<Vec<QueuedSubmission>>;
}
