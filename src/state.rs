//! Application state management
//!
//! Shared state handed to the intake handlers through Axum's State
//! extractor. Handlers only ever enqueue; grading happens in the pool.

use std::sync::Arc;

use crate::services::{ActivityFlag, SubmissionQueue};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    queue: Arc<SubmissionQueue>,
    activity: ActivityFlag,
}

impl AppState {
    pub fn new(queue: Arc<SubmissionQueue>, activity: ActivityFlag) -> Self {
        Self {
            inner: Arc::new(AppStateInner { queue, activity }),
        }
    }

    /// Queue new submissions are handed to
    pub fn queue(&self) -> &SubmissionQueue {
        &self.inner.queue
    }

    /// Whether the scheduler last saw an open competition
    pub fn is_active(&self) -> bool {
        self.inner.activity.is_active()
    }
}
