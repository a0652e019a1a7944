//! End-to-end flow: lifecycle transitions, intake, grading and fan-out

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use common::{competition_at, eventually, Audience, Fakes, MemoryCompetitions, MemorySubmissions};
use contest_scheduler::{
    config::SchedulerConfig,
    handlers,
    models::{CompetitionStatus, QueuedSubmission},
    services::{
        ActivityFlag, CompetitionCache, LifecycleScheduler, SubmissionQueue, WorkerContext,
        WorkerPool,
    },
    state::AppState,
    Supervisor,
};

fn expected_audiences(connection: &str) -> Vec<Audience> {
    vec![
        Audience::Group("admins".to_string()),
        Audience::Group("reviewers".to_string()),
        Audience::Connection(connection.to_string()),
    ]
}

#[tokio::test]
async fn test_competition_lifecycle_and_grading() {
    // The wall clock sits 25s into the timeline so the run window is open
    // when the worker resolves the competition.
    let t = Utc::now() - Duration::seconds(25);
    let fakes = Fakes::new(
        MemoryCompetitions::with(vec![competition_at(1, t)]),
        MemorySubmissions::default(),
    );

    let activity = ActivityFlag::new();
    let scheduler = LifecycleScheduler::new(
        fakes.competitions.clone(),
        activity.clone(),
        &SchedulerConfig::default(),
    );

    scheduler.process_cycle(t + Duration::seconds(1)).await.unwrap();
    assert_eq!(
        fakes.competitions.status_of(1),
        Some(CompetitionStatus::OpenInscriptions)
    );
    assert!(activity.is_active());

    scheduler.process_cycle(t + Duration::seconds(11)).await.unwrap();
    assert_eq!(
        fakes.competitions.status_of(1),
        Some(CompetitionStatus::ClosedInscriptions)
    );

    scheduler.process_cycle(t + Duration::seconds(21)).await.unwrap();
    assert_eq!(
        fakes.competitions.status_of(1),
        Some(CompetitionStatus::Ongoing)
    );

    let queue = Arc::new(SubmissionQueue::new(fakes.submissions.clone()));
    let context = WorkerContext {
        queue: queue.clone(),
        competitions: Arc::new(CompetitionCache::new(fakes.competitions.clone())),
        grader: fakes.grader.clone(),
        notifier: fakes.sink.clone(),
    };
    let cancel = CancellationToken::new();
    let handles = WorkerPool::new(context, 2).spawn(&cancel);

    let item = QueuedSubmission::new(7, 3, "rust", "fn main() {}", "conn-7");
    let id = item.id;
    queue.enqueue(item).await.unwrap();

    let sink = fakes.sink.clone();
    assert!(eventually(|| sink.for_submission(id).len() == 3).await);
    assert_eq!(fakes.sink.for_submission(id), expected_audiences("conn-7"));
    assert_eq!(*fakes.grader.graded.lock().unwrap(), vec![(1, id)]);
    assert!(fakes.submissions.ids().is_empty());

    let report = scheduler.process_cycle(t + Duration::seconds(101)).await.unwrap();
    assert_eq!(report.transitioned, 1);
    assert_eq!(
        fakes.competitions.status_of(1),
        Some(CompetitionStatus::Finished)
    );

    let report = scheduler.process_cycle(t + Duration::seconds(102)).await.unwrap();
    assert_eq!(report.scanned, 0);
    assert!(!activity.is_active());

    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }

    // Still exactly one delivery per audience
    assert_eq!(fakes.sink.for_submission(id).len(), 3);
}

#[tokio::test]
async fn test_restart_replays_unclaimed_submissions() {
    let t = Utc::now() - Duration::seconds(25);
    let mut running = competition_at(4, t);
    running.status = CompetitionStatus::Ongoing;

    let left_behind: Vec<QueuedSubmission> = (0..3)
        .map(|n| QueuedSubmission::new(n, 1, "c", "int main(){}", format!("conn-{}", n)))
        .collect();
    let ids: Vec<_> = left_behind.iter().map(|item| item.id).collect();

    let fakes = Fakes::new(
        MemoryCompetitions::with(vec![running]),
        MemorySubmissions::with(left_behind),
    );

    let supervisor = Supervisor::start(
        fakes.collaborators(),
        &SchedulerConfig::default(),
        1,
    )
    .await
    .unwrap();

    assert_eq!(supervisor.pool_size(), 3);
    assert!(supervisor.activity().is_active());

    let sink = fakes.sink.clone();
    let all_delivered = eventually(|| ids.iter().all(|id| sink.for_submission(*id).len() == 3));
    assert!(all_delivered.await);

    for (n, id) in ids.iter().enumerate() {
        assert_eq!(
            fakes.sink.for_submission(*id),
            expected_audiences(&format!("conn-{}", n))
        );
    }
    assert_eq!(fakes.grader.graded.lock().unwrap().len(), 3);
    assert!(fakes.submissions.ids().is_empty());

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_submission_without_running_competition_is_dropped() {
    // Scheduled far in the future: open for the scheduler, not running
    let t = Utc::now() + Duration::hours(1);
    let fakes = Fakes::new(
        MemoryCompetitions::with(vec![competition_at(9, t)]),
        MemorySubmissions::default(),
    );

    let supervisor = Supervisor::start(
        fakes.collaborators(),
        &SchedulerConfig::default(),
        1,
    )
    .await
    .unwrap();

    let item = QueuedSubmission::new(2, 5, "python", "print(42)", "conn-2");
    supervisor.queue().enqueue(item).await.unwrap();

    let submissions = fakes.submissions.clone();
    assert!(eventually(|| submissions.ids().is_empty()).await);
    assert!(eventually(|| supervisor.queue().size() == 0).await);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(fakes.grader.graded.lock().unwrap().is_empty());
    assert!(fakes.sink.deliveries.lock().unwrap().is_empty());

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_http_intake_reaches_the_submitter() {
    let t = Utc::now() - Duration::seconds(25);
    let mut running = competition_at(2, t);
    running.status = CompetitionStatus::Ongoing;

    let fakes = Fakes::new(
        MemoryCompetitions::with(vec![running]),
        MemorySubmissions::default(),
    );

    let supervisor = Supervisor::start(
        fakes.collaborators(),
        &SchedulerConfig::default(),
        2,
    )
    .await
    .unwrap();

    let app = axum::Router::new()
        .nest("/api/v1", handlers::routes())
        .with_state(AppState::new(supervisor.queue(), supervisor.activity()));

    let body = serde_json::json!({
        "group_id": 11,
        "exercise_id": 3,
        "language": "go",
        "source_code": "package main\nfunc main() {}",
        "connection_id": "conn-11"
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/submissions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let sink = fakes.sink.clone();
    let delivered = eventually(|| {
        sink.deliveries
            .lock()
            .unwrap()
            .iter()
            .any(|(audience, _)| *audience == Audience::Connection("conn-11".to_string()))
    });
    assert!(delivered.await);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_replayed_submission_graded_when_seed_fetch_fails() {
    let t = Utc::now() - Duration::seconds(25);
    let mut running = competition_at(6, t);
    running.status = CompetitionStatus::Ongoing;

    let left_behind = QueuedSubmission::new(8, 2, "rust", "fn main() {}", "conn-8");
    let id = left_behind.id;

    let fakes = Fakes::new(
        MemoryCompetitions::with(vec![running]).fail_next_fetches(1),
        MemorySubmissions::with(vec![left_behind]),
    );

    let supervisor = Supervisor::start(
        fakes.collaborators(),
        &SchedulerConfig::default(),
        1,
    )
    .await
    .unwrap();

    // The failed seed left the activity flag down while the backlog was
    // replayed; the worker must still find the running competition.
    let sink = fakes.sink.clone();
    assert!(eventually(|| sink.for_submission(id).len() == 3).await);
    assert_eq!(*fakes.grader.graded.lock().unwrap(), vec![(6, id)]);
    assert!(fakes.submissions.ids().is_empty());

    supervisor.shutdown().await;
}
