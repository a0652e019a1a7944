//! Submission worker pool
//!
//! A fixed number of workers drain the dispatch channel. Each one resolves
//! the running competition, calls the judge, and fans the result out to the
//! admins, the reviewers and the submitting connection. Workers share
//! nothing but the queue and the competition cache.

use std::sync::Arc;

use prometheus::IntGauge;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    metrics::{self, ACTIVE_GRADINGS, SUBMISSIONS_FAILED},
    models::{QueuedSubmission, SubmissionResult},
    services::{
        competition_cache::CompetitionCache,
        grader::Grader,
        notifier::{broadcast_result, NotificationSink},
        submission_queue::SubmissionQueue,
    },
    utils::time::now_utc,
};

/// Everything a worker needs, cloned into each worker task
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<SubmissionQueue>,
    pub competitions: Arc<CompetitionCache>,
    pub grader: Arc<dyn Grader>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Pool whose size is fixed when it is built
pub struct WorkerPool {
    context: WorkerContext,
    size: usize,
}

impl WorkerPool {
    /// Size the pool as `max(min_size, backlog)` from the queue as it is now.
    /// Later growth of the queue does not add workers.
    pub fn new(context: WorkerContext, min_size: usize) -> Self {
        let backlog = context.queue.size();
        let size = min_size.max(backlog).max(1);

        tracing::info!(size, min_size, backlog, "Sized submission worker pool");
        Self { context, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Start every worker; each stops when `cancel` fires
    pub fn spawn(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        (0..self.size)
            .map(|worker| {
                let context = self.context.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { run_worker(worker, context, cancel).await })
            })
            .collect()
    }
}

async fn run_worker(worker: usize, context: WorkerContext, cancel: CancellationToken) {
    tracing::debug!(worker, "Submission worker started");

    loop {
        let item = match context.queue.dequeue(&cancel).await {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(AppError::QueueClosed) => {
                tracing::info!(worker, "Dispatch channel closed");
                break;
            }
            Err(e) => {
                tracing::error!(worker, "Failed to dequeue submission: {}", e);
                continue;
            }
        };

        let submission_id = item.id;
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::warn!(worker, %submission_id, "Grading interrupted by shutdown");
                break;
            }
            outcome = process_submission(&context, &item) => {
                match outcome {
                    Ok(result) => tracing::info!(
                        worker,
                        %submission_id,
                        verdict = %result.outcome.verdict,
                        "Submission graded"
                    ),
                    Err(AppError::NoActiveCompetition) => {
                        SUBMISSIONS_FAILED.inc();
                        tracing::warn!(worker, %submission_id, "No running competition, submission dropped");
                    }
                    Err(e) if e.is_unavailable() => {
                        SUBMISSIONS_FAILED.inc();
                        tracing::error!(worker, %submission_id, code = e.error_code(), "Collaborator unavailable: {}", e);
                    }
                    Err(e) => {
                        SUBMISSIONS_FAILED.inc();
                        tracing::error!(worker, %submission_id, "Failed to grade submission: {}", e);
                    }
                }
            }
        }
    }

    tracing::debug!(worker, "Submission worker stopped");
}

/// Grade one claimed item and notify its audiences.
///
/// Any error means nothing was broadcast for the item.
pub async fn process_submission(
    context: &WorkerContext,
    item: &QueuedSubmission,
) -> AppResult<SubmissionResult> {
    let competition = context
        .competitions
        .resolve(now_utc())
        .await?
        .ok_or(AppError::NoActiveCompetition)?;

    let outcome = {
        let _in_flight = InFlight::enter(&ACTIVE_GRADINGS);
        context.grader.grade(&competition, item).await?
    };
    metrics::record_verdict(outcome.verdict.code());

    let result = SubmissionResult::new(item, &competition, outcome, now_utc());
    broadcast_result(context.notifier.as_ref(), &item.connection_id, &result).await;

    Ok(result)
}

/// Keeps the in-flight gauge right even when a grading future is dropped
struct InFlight<'a> {
    gauge: &'a IntGauge,
}

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a IntGauge) -> Self {
        gauge.inc();
        InFlight { gauge }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
