//! SlotLedger - Shared, authoritative index of booked slots.
//!
//! One ledger is shared by every unit of work in the process. Holding the
//! ledger lock serialises registration writes: the conflict check, the store
//! write and the index update happen under a single guard, so two concurrent
//! creates can never both see a free slot.
//!
//! The index is built from the store on first use. Rows written to the store
//! without going through the engine are not visible until [`SlotLedger::resync`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::domain::foundation::DomainError;
use crate::domain::registration::{Registration, SlotIndex};
use crate::ports::EntityStore;

#[derive(Clone, Default)]
pub struct SlotLedger {
    index: Arc<Mutex<SlotIndex>>,
    built: Arc<AtomicBool>,
}

impl SlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the ledger, building the index from `store` if needed.
    ///
    /// # Errors
    ///
    /// - Any store error raised while building the index
    pub async fn lock(
        &self,
        store: &dyn EntityStore<Registration>,
    ) -> Result<MutexGuard<'_, SlotIndex>, DomainError> {
        let mut index = self.index.lock().await;
        if !self.built.load(Ordering::Acquire) {
            let registrations = store.find_all().await?;
            *index = SlotIndex::rebuild(registrations.iter());
            self.built.store(true, Ordering::Release);
            debug!(bookings = index.len(), "Built slot ledger");
        }
        Ok(index)
    }

    /// Rebuilds the index from the store. Returns the number of active
    /// bookings.
    pub async fn resync(&self, store: &dyn EntityStore<Registration>) -> Result<usize, DomainError> {
        let mut index = self.index.lock().await;
        let registrations = store.find_all().await?;
        *index = SlotIndex::rebuild(registrations.iter());
        self.built.store(true, Ordering::Release);
        info!(bookings = index.len(), "Resynced slot ledger");
        Ok(index.len())
    }

    /// Marks the index stale; the next `lock` rebuilds it.
    pub async fn invalidate(&self) {
        let mut index = self.index.lock().await;
        index.clear();
        self.built.store(false, Ordering::Release);
    }

    pub fn is_built(&self) -> bool {
        self.built.load(Ordering::Acquire)
    }
}
