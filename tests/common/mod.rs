//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use contest_scheduler::{
    error::{AppError, AppResult},
    models::{
        Competition, CompetitionStatus, GradingOutcome, QueuedSubmission, SubmissionResult,
        Verdict,
    },
    services::{CompetitionStore, Grader, NotificationSink, SubmissionStore},
    Collaborators,
};

/// Competition timeline anchored at `t`: inscriptions `[t, t+10)`, run
/// `[t+20, t+100)`, all in seconds.
pub fn competition_at(id: i32, t: DateTime<Utc>) -> Competition {
    Competition {
        id,
        name: format!("Round {}", id),
        start_inscriptions: t,
        end_inscriptions: t + Duration::seconds(10),
        start_time: t + Duration::seconds(20),
        end_time: t + Duration::seconds(100),
        stop_ranking: t + Duration::seconds(80),
        block_submissions: t + Duration::seconds(95),
        submission_penalty_minutes: 20,
        status: CompetitionStatus::Pending,
    }
}

#[derive(Default)]
pub struct MemoryCompetitions {
    rows: Mutex<Vec<Competition>>,
    pub lookups: AtomicUsize,
    /// Number of upcoming `list_open` calls that fail
    failing_fetches: AtomicUsize,
}

impl MemoryCompetitions {
    pub fn with(rows: Vec<Competition>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Make the next `count` fetches fail as if the database were down
    pub fn fail_next_fetches(self, count: usize) -> Self {
        self.failing_fetches.store(count, Ordering::SeqCst);
        self
    }

    pub fn status_of(&self, id: i32) -> Option<CompetitionStatus> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.status)
    }

    fn advance(&self, id: i32, target: CompetitionStatus) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|c| c.id == id && c.status < target) {
            row.status = target;
        }
        Ok(())
    }
}

#[async_trait]
impl CompetitionStore for MemoryCompetitions {
    async fn list_open(&self) -> AppResult<Vec<Competition>> {
        let failing = self
            .failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Database("connection refused".into()));
        }

        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn find_current(&self, now: DateTime<Utc>) -> AppResult<Option<Competition>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.status.is_terminal() && c.is_running_at(now))
            .max_by_key(|c| c.start_time)
            .cloned())
    }

    async fn open_inscriptions(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::OpenInscriptions)
    }

    async fn close_inscriptions(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::ClosedInscriptions)
    }

    async fn start(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::Ongoing)
    }

    async fn end(&self, competition: &Competition) -> AppResult<()> {
        self.advance(competition.id, CompetitionStatus::Finished)
    }
}

/// Submission store that keeps rows in insertion order
#[derive(Default)]
pub struct MemorySubmissions {
    rows: Mutex<Vec<QueuedSubmission>>,
}

impl MemorySubmissions {
    pub fn with(rows: Vec<QueuedSubmission>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.rows.lock().unwrap().iter().map(|r| r.id).collect()
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissions {
    async fn save(&self, item: &QueuedSubmission) -> AppResult<()> {
        self.rows.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn list_pending(&self) -> AppResult<Vec<QueuedSubmission>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// Grader that accepts everything and remembers what it saw
#[derive(Default)]
pub struct RecordingGrader {
    pub graded: Mutex<Vec<(i32, Uuid)>>,
    pub fail: bool,
}

#[async_trait]
impl Grader for RecordingGrader {
    async fn grade(
        &self,
        competition: &Competition,
        item: &QueuedSubmission,
    ) -> AppResult<GradingOutcome> {
        if self.fail {
            return Err(AppError::GradingUnavailable("judge offline".into()));
        }
        self.graded.lock().unwrap().push((competition.id, item.id));
        Ok(GradingOutcome {
            verdict: Verdict::Accepted,
            time_ms: Some(12),
            memory_kb: Some(1024),
            message: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Group(String),
    Connection(String),
}

/// Notification sink that records every delivery
#[derive(Default)]
pub struct RecordingSink {
    pub deliveries: Mutex<Vec<(Audience, Uuid)>>,
}

impl RecordingSink {
    pub fn for_submission(&self, id: Uuid) -> Vec<Audience> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sid)| *sid == id)
            .map(|(audience, _)| audience.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_to_group(&self, group: &str, message: &SubmissionResult) -> AppResult<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push((Audience::Group(group.to_string()), message.submission_id));
        Ok(())
    }

    async fn send_to_connection(
        &self,
        connection_id: &str,
        message: &SubmissionResult,
    ) -> AppResult<()> {
        self.deliveries.lock().unwrap().push((
            Audience::Connection(connection_id.to_string()),
            message.submission_id,
        ));
        Ok(())
    }
}

pub struct Fakes {
    pub competitions: Arc<MemoryCompetitions>,
    pub submissions: Arc<MemorySubmissions>,
    pub grader: Arc<RecordingGrader>,
    pub sink: Arc<RecordingSink>,
}

impl Fakes {
    pub fn new(competitions: MemoryCompetitions, submissions: MemorySubmissions) -> Self {
        Self {
            competitions: Arc::new(competitions),
            submissions: Arc::new(submissions),
            grader: Arc::new(RecordingGrader::default()),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            competitions: self.competitions.clone(),
            submissions: self.submissions.clone(),
            grader: self.grader.clone(),
            notifier: self.sink.clone(),
        }
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}
