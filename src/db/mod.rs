//! Postgres-backed competition and submission stores
//!
//! Schema lives in `migrations/` and is applied on startup.

pub mod connection;
pub mod repositories;

pub use connection::{connect, run_migrations};
pub use repositories::{CompetitionRepository, QueuedSubmissionRepository};
