//! Startup ordering and shutdown for the background tasks
//!
//! The scheduler seeds the activity flag and the queue replays persisted
//! rows before any worker starts or any new submission is accepted. After
//! that the workers and the scheduler loop run side by side until
//! [`Supervisor::shutdown`]. The supervisor owns its cancellation token, so
//! the background tasks outlive a shutdown signal until the caller has
//! stopped accepting work.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    config::SchedulerConfig,
    error::AppResult,
    services::{
        ActivityFlag, CompetitionCache, CompetitionStore, Grader, LifecycleScheduler,
        NotificationSink, SubmissionQueue, SubmissionStore, WorkerContext, WorkerPool,
    },
};

/// External systems the background tasks talk to
#[derive(Clone)]
pub struct Collaborators {
    pub competitions: Arc<dyn CompetitionStore>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub grader: Arc<dyn Grader>,
    pub notifier: Arc<dyn NotificationSink>,
}

pub struct Supervisor {
    queue: Arc<SubmissionQueue>,
    activity: ActivityFlag,
    pool_size: usize,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Seed, replay, then spawn the worker pool and the scheduler loop.
    ///
    /// A failed replay aborts startup: accepting work on top of an
    /// unreadable backlog would reorder it. Tasks run until
    /// [`Supervisor::shutdown`].
    pub async fn start(
        collaborators: Collaborators,
        scheduler_config: &SchedulerConfig,
        min_workers: usize,
    ) -> AppResult<Self> {
        let cancel = CancellationToken::new();
        let activity = ActivityFlag::new();

        let scheduler = LifecycleScheduler::new(
            collaborators.competitions.clone(),
            activity.clone(),
            scheduler_config,
        );
        scheduler.seed().await;

        let queue = Arc::new(SubmissionQueue::new(collaborators.submissions));
        queue.replay().await?;

        let context = WorkerContext {
            queue: queue.clone(),
            competitions: Arc::new(CompetitionCache::new(collaborators.competitions)),
            grader: collaborators.grader,
            notifier: collaborators.notifier,
        };

        let pool = WorkerPool::new(context, min_workers);
        let mut handles = pool.spawn(&cancel);

        let scheduler_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_seeded(scheduler_cancel).await
        }));

        tracing::info!(
            workers = pool.size(),
            backlog = queue.size(),
            "Background tasks started"
        );

        Ok(Self {
            queue,
            activity,
            pool_size: pool.size(),
            cancel,
            handles,
        })
    }

    pub fn queue(&self) -> Arc<SubmissionQueue> {
        self.queue.clone()
    }

    pub fn activity(&self) -> ActivityFlag {
        self.activity.clone()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Stop every task and close the queue.
    ///
    /// An in-flight grading is abandoned; its row was already claimed, so
    /// it is not replayed.
    pub async fn shutdown(self) {
        self.cancel.cancel();

        for joined in join_all(self.handles).await {
            if let Err(e) = joined {
                tracing::error!("Background task ended abnormally: {}", e);
            }
        }

        self.queue.close().await;
        tracing::info!(
            unclaimed = self.queue.size(),
            "Background tasks stopped"
        );
    }
}
