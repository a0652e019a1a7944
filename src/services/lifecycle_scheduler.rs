//! Competition lifecycle scheduler
//!
//! A single cooperative loop that advances every open competition through
//! Pending → OpenInscriptions → ClosedInscriptions → Ongoing → Finished
//! by comparing its timeline with the wall clock. The loop polls quickly
//! while anything is open and slowly otherwise.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::{
    config::SchedulerConfig,
    error::AppResult,
    metrics,
    models::{Competition, CompetitionStatus},
    services::{activity::ActivityFlag, store::CompetitionStore},
    utils::time::{format_duration, now_utc, remaining},
};

/// A single status change the scheduler can request from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    OpenInscriptions,
    CloseInscriptions,
    Start,
    End,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenInscriptions => "open_inscriptions",
            Self::CloseInscriptions => "close_inscriptions",
            Self::Start => "start",
            Self::End => "end",
        }
    }

    /// Status the competition holds once the transition is applied
    pub fn target(&self) -> CompetitionStatus {
        match self {
            Self::OpenInscriptions => CompetitionStatus::OpenInscriptions,
            Self::CloseInscriptions => CompetitionStatus::ClosedInscriptions,
            Self::Start => CompetitionStatus::Ongoing,
            Self::End => CompetitionStatus::Finished,
        }
    }
}

/// Decide which transition, if any, `competition` is due for at `now`.
///
/// Rules are evaluated in order and the first match wins. Reaching the end
/// time finishes a competition from any state, including Pending.
pub fn next_transition(competition: &Competition, now: DateTime<Utc>) -> Option<Transition> {
    use CompetitionStatus::*;

    if competition.status.is_terminal() {
        return None;
    }

    if now >= competition.end_time {
        return Some(Transition::End);
    }

    match competition.status {
        Pending
            if competition.start_inscriptions < now && now < competition.end_inscriptions =>
        {
            Some(Transition::OpenInscriptions)
        }
        OpenInscriptions if now > competition.end_inscriptions => {
            Some(Transition::CloseInscriptions)
        }
        ClosedInscriptions if now > competition.start_time => Some(Transition::Start),
        Ongoing if now > competition.end_time => Some(Transition::End),
        _ => None,
    }
}

/// Outcome of one scheduler pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub scanned: usize,
    pub transitioned: usize,
    pub failed: usize,
}

/// Background loop that drives competition status from the clock
pub struct LifecycleScheduler {
    store: Arc<dyn CompetitionStore>,
    activity: ActivityFlag,
    operational_interval: Duration,
    idle_interval: Duration,
    recovery_interval: Duration,
}

impl LifecycleScheduler {
    pub fn new(
        store: Arc<dyn CompetitionStore>,
        activity: ActivityFlag,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            store,
            activity,
            operational_interval: config.operational_interval(),
            idle_interval: config.idle_interval(),
            recovery_interval: config.recovery_interval(),
        }
    }

    /// Eager fetch so the first pacing decision is correct
    pub async fn seed(&self) {
        match self.store.list_open().await {
            Ok(open) => {
                tracing::info!(open = open.len(), "Seeded competition activity");
                self.activity.set(!open.is_empty());
            }
            Err(e) => {
                tracing::warn!("Initial competition fetch failed: {}", e);
                self.activity.set(false);
            }
        }
    }

    /// Seed, then run until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        self.seed().await;
        self.run_seeded(cancel).await;
    }

    /// Cycle loop for a scheduler whose activity flag is already seeded
    pub async fn run_seeded(&self, cancel: CancellationToken) {
        tracing::info!(
            operational_secs = self.operational_interval.as_secs(),
            idle_secs = self.idle_interval.as_secs(),
            recovery_secs = self.recovery_interval.as_secs(),
            "Lifecycle scheduler started"
        );

        while !cancel.is_cancelled() {
            let pause = match self.process_cycle(now_utc()).await {
                Ok(report) => {
                    tracing::debug!(
                        scanned = report.scanned,
                        transitioned = report.transitioned,
                        failed = report.failed,
                        "Scheduler cycle complete"
                    );
                    self.poll_interval()
                }
                Err(e) => {
                    tracing::error!("Scheduler cycle failed: {}", e);
                    metrics::SCHEDULER_CYCLE_FAILURES.inc();
                    self.recovery_interval
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("Lifecycle scheduler stopped");
    }

    /// Sleep length chosen from the last observed activity
    pub fn poll_interval(&self) -> Duration {
        if self.activity.is_active() {
            self.operational_interval
        } else {
            self.idle_interval
        }
    }

    /// Evaluate every open competition against the same `now`.
    ///
    /// Only the fetch can fail the cycle; a failed transition is logged and
    /// the rest of the batch is still processed.
    pub async fn process_cycle(&self, now: DateTime<Utc>) -> AppResult<CycleReport> {
        let open = self.store.list_open().await?;
        self.activity.set(!open.is_empty());

        let mut report = CycleReport {
            scanned: open.len(),
            ..Default::default()
        };

        for competition in &open {
            if !competition.has_valid_timeline() {
                tracing::warn!(
                    competition_id = competition.id,
                    "Competition timeline is out of order"
                );
            }

            let Some(transition) = next_transition(competition, now) else {
                continue;
            };

            match self.apply(competition, transition).await {
                Ok(()) => {
                    tracing::info!(
                        competition_id = competition.id,
                        from = %competition.status,
                        to = %transition.target(),
                        ends_in = %format_duration(remaining(competition.end_time, now)),
                        "Competition advanced"
                    );
                    metrics::record_transition(transition.as_str());
                    report.transitioned += 1;
                }
                Err(e) => {
                    tracing::error!(
                        competition_id = competition.id,
                        transition = transition.as_str(),
                        "Failed to apply transition: {}",
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn apply(&self, competition: &Competition, transition: Transition) -> AppResult<()> {
        match transition {
            Transition::OpenInscriptions => self.store.open_inscriptions(competition).await,
            Transition::CloseInscriptions => self.store.close_inscriptions(competition).await,
            Transition::Start => self.store.start(competition).await,
            Transition::End => self.store.end(competition).await,
        }
    }
}
