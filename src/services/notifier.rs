//! Result fan-out to the realtime hub

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::{
    constants::groups,
    error::AppResult,
    models::SubmissionResult,
};

/// Deliver a result to a broadcast group or to a single connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_to_group(&self, group: &str, message: &SubmissionResult) -> AppResult<()>;

    async fn send_to_connection(
        &self,
        connection_id: &str,
        message: &SubmissionResult,
    ) -> AppResult<()>;
}

/// Push `result` to the admins, the reviewers and the submitter.
///
/// Each audience is attempted even if an earlier one failed; returns how
/// many deliveries succeeded.
pub async fn broadcast_result(
    sink: &dyn NotificationSink,
    connection_id: &str,
    result: &SubmissionResult,
) -> usize {
    let mut delivered = 0;

    for group in [groups::ADMINS, groups::REVIEWERS] {
        match sink.send_to_group(group, result).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::error!(
                submission_id = %result.submission_id,
                group,
                "Failed to notify group: {}",
                e
            ),
        }
    }

    match sink.send_to_connection(connection_id, result).await {
        Ok(()) => delivered += 1,
        Err(e) => tracing::warn!(
            submission_id = %result.submission_id,
            connection_id,
            "Failed to notify submitter: {}",
            e
        ),
    }

    delivered
}

/// Publishes JSON results on Redis channels relayed by the realtime hub:
/// `{prefix}:group:{name}` and `{prefix}:connection:{id}`.
#[derive(Clone)]
pub struct RedisNotifier {
    redis: ConnectionManager,
    prefix: String,
}

impl RedisNotifier {
    pub fn new(redis: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn group_channel(&self, group: &str) -> String {
        format!("{}:group:{}", self.prefix, group)
    }

    fn connection_channel(&self, connection_id: &str) -> String {
        format!("{}:connection:{}", self.prefix, connection_id)
    }

    async fn publish(&self, channel: String, message: &SubmissionResult) -> AppResult<()> {
        let payload = serde_json::to_string(message)?;
        let mut conn = self.redis.clone();
        let receivers: i64 = conn.publish(&channel, payload).await?;

        tracing::debug!(channel, receivers, "Published submission result");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for RedisNotifier {
    async fn send_to_group(&self, group: &str, message: &SubmissionResult) -> AppResult<()> {
        self.publish(self.group_channel(group), message).await
    }

    async fn send_to_connection(
        &self,
        connection_id: &str,
        message: &SubmissionResult,
    ) -> AppResult<()> {
        self.publish(self.connection_channel(connection_id), message)
            .await
    }
}
