//! Business logic services

pub mod activity;
pub mod competition_cache;
pub mod grader;
pub mod lifecycle_scheduler;
pub mod notifier;
pub mod store;
pub mod submission_queue;
pub mod worker_pool;

pub use activity::ActivityFlag;
pub use competition_cache::CompetitionCache;
pub use grader::{Grader, HttpGrader};
pub use lifecycle_scheduler::{next_transition, CycleReport, LifecycleScheduler, Transition};
pub use notifier::{broadcast_result, NotificationSink, RedisNotifier};
pub use store::{CompetitionStore, SubmissionStore};
pub use submission_queue::SubmissionQueue;
pub use worker_pool::{process_submission, WorkerContext, WorkerPool};
