//! Contest Scheduler - competition lifecycle and submission grading
//!
//! This library drives a live programming-contest platform's background
//! work: it advances competitions through their lifecycle by the wall
//! clock, and it accepts submissions into a durable queue that a pool of
//! workers drains, grades and broadcasts.
//!
//! # Architecture
//!
//! - **Handlers**: HTTP submission intake (thin layer)
//! - **Services**: Scheduler, queue, worker pool and their collaborators
//! - **Repositories**: Database access
//! - **Models**: Domain models
//! - **Supervisor**: Startup ordering and shutdown

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod supervisor;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
pub use supervisor::{Collaborators, Supervisor};
