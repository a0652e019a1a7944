//! Read-through cache of the currently running competition

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::{
    error::AppResult,
    models::Competition,
    services::store::CompetitionStore,
};

/// Shared by all workers. An entry stays valid until the competition's own
/// end time; a miss is filled by one store lookup while racing workers wait
/// for it and then read the fresh entry. Every miss reaches the store, so
/// a running competition is found even before the scheduler's first
/// successful cycle.
pub struct CompetitionCache {
    store: Arc<dyn CompetitionStore>,
    current: RwLock<Option<Competition>>,
    refill: Mutex<()>,
}

impl CompetitionCache {
    pub fn new(store: Arc<dyn CompetitionStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
            refill: Mutex::new(()),
        }
    }

    /// The competition running at `now`, if any
    pub async fn resolve(&self, now: DateTime<Utc>) -> AppResult<Option<Competition>> {
        if let Some(hit) = self.cached(now).await {
            return Ok(Some(hit));
        }

        let _guard = self.refill.lock().await;

        // Another worker may have filled the entry while we waited
        if let Some(hit) = self.cached(now).await {
            return Ok(Some(hit));
        }

        let fresh = self.store.find_current(now).await?;
        match &fresh {
            Some(competition) => {
                tracing::debug!(
                    competition_id = competition.id,
                    expires_at = %competition.end_time,
                    "Cached current competition"
                );
            }
            None => tracing::debug!("No competition running"),
        }

        *self.current.write().await = fresh.clone();
        Ok(fresh)
    }

    async fn cached(&self, now: DateTime<Utc>) -> Option<Competition> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|competition| now < competition.end_time)
            .cloned()
    }
}
