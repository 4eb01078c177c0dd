//! EntityCache - Per unit-of-work table snapshot with a TTL.
//!
//! Every load and every invalidation bumps a version token, so callers can
//! tell whether two snapshots came from the same load.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;

struct Snapshot<T> {
    rows: Arc<Vec<T>>,
    loaded_at: Instant,
}

struct CacheState<T> {
    snapshot: Option<Snapshot<T>>,
    version: u64,
}

/// Cached copy of one table.
pub struct EntityCache<T> {
    ttl: Duration,
    state: RwLock<CacheState<T>>,
}

impl<T> EntityCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState {
                snapshot: None,
                version: 0,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current version token.
    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }

    /// The cached rows, if a load happened within the TTL.
    pub async fn peek(&self) -> Option<Arc<Vec<T>>> {
        let state = self.state.read().await;
        state
            .snapshot
            .as_ref()
            .filter(|s| s.loaded_at.elapsed() < self.ttl)
            .map(|s| Arc::clone(&s.rows))
    }

    /// Returns the cached rows, calling `load` when the cache is empty or
    /// expired. Concurrent callers share one load.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<Vec<T>>, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, DomainError>>,
    {
        if let Some(rows) = self.peek().await {
            return Ok(rows);
        }

        let mut state = self.state.write().await;
        if let Some(snapshot) = &state.snapshot {
            if snapshot.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&snapshot.rows));
            }
        }

        let rows = Arc::new(load().await?);
        state.snapshot = Some(Snapshot {
            rows: Arc::clone(&rows),
            loaded_at: Instant::now(),
        });
        state.version += 1;
        Ok(rows)
    }

    /// Drops the cached rows.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if state.snapshot.take().is_some() {
            state.version += 1;
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.peek().await.is_some()
    }
}
