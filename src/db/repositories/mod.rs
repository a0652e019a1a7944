//! Database repositories
//!
//! Repositories handle all direct database interactions and implement the
//! store contracts from `services::store`.

pub mod competition_repo;
pub mod queued_submission_repo;

pub use competition_repo::CompetitionRepository;
pub use queued_submission_repo::QueuedSubmissionRepository;
