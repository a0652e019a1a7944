//! Shared "has active competitions" signal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Written by the lifecycle scheduler after every fetch, read by the
/// scheduler's own pacing and by the worker pool's competition lookup.
#[derive(Debug, Clone, Default)]
pub struct ActivityFlag {
    inner: Arc<AtomicBool>,
}

impl ActivityFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, active: bool) {
        self.inner.store(active, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = ActivityFlag::new();
        let reader = flag.clone();
        assert!(!reader.is_active());

        flag.set(true);
        assert!(reader.is_active());

        flag.set(false);
        assert!(!reader.is_active());
    }
}
