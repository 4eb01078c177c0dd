//! RegistrationRepository - Registration persistence with conflict checks.
//!
//! `create` is the only way a registration enters the store. It validates,
//! derives the identity, and checks the candidate against the shared
//! [`SlotLedger`] while holding the ledger lock across the store write.
//! Rows are addressed by [`RegistrationKey`], so one id can recur once per term.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::cache::EntityCache;
use super::slot_ledger::SlotLedger;
use crate::domain::foundation::{
    ClassId, DomainError, EntityKind, InstructorId, StudentId, Timestamp, UserId,
};
use crate::domain::registration::{
    CancellationMode, Conflict, ConflictReport, NewRegistration, Partition, Registration,
    RegistrationError, RegistrationKey, RegistrationRequest, RegistrationStatus,
};
use crate::ports::EntityStore;

/// Per-status registration counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub cancelled: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn tally<'a>(registrations: impl IntoIterator<Item = &'a Registration>) -> Self {
        let mut counts = Self::default();
        for registration in registrations {
            match registration.status() {
                RegistrationStatus::Pending => counts.pending += 1,
                RegistrationStatus::Approved => counts.approved += 1,
                RegistrationStatus::Cancelled => counts.cancelled += 1,
                RegistrationStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }

    pub fn active(&self) -> usize {
        self.pending + self.approved
    }
}

pub struct RegistrationRepository {
    store: Arc<dyn EntityStore<Registration>>,
    cache: EntityCache<Registration>,
    ledger: SlotLedger,
}

impl RegistrationRepository {
    pub fn new(
        store: Arc<dyn EntityStore<Registration>>,
        ledger: SlotLedger,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache: EntityCache::new(cache_ttl),
            ledger,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates a raw request and creates the registration.
    ///
    /// # Errors
    ///
    /// - `Validation` before anything is read or written
    /// - Everything [`create`](Self::create) returns
    pub async fn create_from_request(
        &self,
        request: &RegistrationRequest,
        status: RegistrationStatus,
        registered_by: UserId,
        registered_at: Timestamp,
    ) -> Result<Registration, RegistrationError> {
        let new = NewRegistration::from_request(request)?;
        self.create(new, status, registered_by, registered_at).await
    }

    /// Persists a new registration.
    ///
    /// A cancelled or completed row with the same key is replaced, so a
    /// student can re-book a slot they previously gave up within a term.
    /// Rows from other terms are never touched.
    ///
    /// # Errors
    ///
    /// - `Validation` if identity fields are missing
    /// - `Conflict` listing every collision with an active booking
    /// - `Storage` if the store rejects the write
    pub async fn create(
        &self,
        new: NewRegistration,
        status: RegistrationStatus,
        registered_by: UserId,
        registered_at: Timestamp,
    ) -> Result<Registration, RegistrationError> {
        let registration = Registration::create(new, status, registered_by, registered_at)?;

        let mut index = self.ledger.lock(self.store.as_ref()).await?;
        let report = index.find_conflicts(&registration);
        if report.has_conflicts() {
            return Err(RegistrationError::Conflict {
                conflicts: report.into_conflicts(),
            });
        }

        match self.store.find_by_id(&registration.key()).await? {
            Some(existing) if existing.is_active() => {
                // Active row the ledger has not seen; written around the engine.
                index.insert(&existing);
                let report = index.find_conflicts(&registration);
                let conflicts = if report.has_conflicts() {
                    report.into_conflicts()
                } else {
                    vec![Conflict::duplicate(&existing)]
                };
                return Err(RegistrationError::Conflict { conflicts });
            }
            Some(_) => self.store.update(&registration).await?,
            None => self.store.insert(&registration).await?,
        }

        index.insert(&registration);
        drop(index);
        self.cache.invalidate().await;

        info!(
            registration_id = %registration.id(),
            student_id = %registration.student_id(),
            partition = %registration.partition(),
            "Registration created"
        );
        Ok(registration)
    }

    /// Moves a registration along its lifecycle.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the registration doesn't exist
    /// - `InvalidTransition` if the move is not allowed
    pub async fn update_status(
        &self,
        key: &RegistrationKey,
        target: RegistrationStatus,
    ) -> Result<Registration, RegistrationError> {
        let mut index = self.ledger.lock(self.store.as_ref()).await?;
        let mut registration = self.load(key).await?;
        let previous = registration.update_status(target)?;

        self.store.update(&registration).await?;
        index.insert(&registration);
        drop(index);
        self.cache.invalidate().await;

        debug!(registration = %key, from = %previous, to = %target, "Registration status changed");
        Ok(registration)
    }

    /// Cancels a registration, keeping the row (`Soft`) or removing it
    /// (`Hard`). Returns the registration as it was after cancellation.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the registration doesn't exist
    /// - `InvalidTransition` if it is already cancelled or completed
    pub async fn cancel(
        &self,
        key: &RegistrationKey,
        reason: &str,
        at: Timestamp,
        mode: CancellationMode,
    ) -> Result<Registration, RegistrationError> {
        let mut index = self.ledger.lock(self.store.as_ref()).await?;
        let mut registration = self.load(key).await?;
        registration.cancel(reason, at)?;

        match mode {
            CancellationMode::Soft => self.store.update(&registration).await?,
            CancellationMode::Hard => {
                self.store.delete(key).await?;
            }
        }
        index.remove(key);
        drop(index);
        self.cache.invalidate().await;

        info!(registration = %key, mode = ?mode, "Registration cancelled");
        Ok(registration)
    }

    /// Removes a registration row outright. Returns whether a row existed.
    pub async fn delete(&self, key: &RegistrationKey) -> Result<bool, RegistrationError> {
        let mut index = self.ledger.lock(self.store.as_ref()).await?;
        let removed = self.store.delete(key).await?;
        index.remove(key);
        drop(index);
        self.cache.invalidate().await;
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Checks a candidate against the ledger without writing anything.
    pub async fn check_conflicts(
        &self,
        candidate: &Registration,
    ) -> Result<ConflictReport, RegistrationError> {
        let index = self.ledger.lock(self.store.as_ref()).await?;
        Ok(index.find_conflicts(candidate))
    }

    pub async fn find_all(&self) -> Result<Arc<Vec<Registration>>, DomainError> {
        self.cache.get_or_load(|| self.store.find_all()).await
    }

    pub async fn find_by_id(&self, key: &RegistrationKey) -> Result<Option<Registration>, DomainError> {
        if let Some(rows) = self.cache.peek().await {
            return Ok(rows.iter().find(|r| r.key() == *key).cloned());
        }
        self.store.find_by_id(key).await
    }

    /// # Errors
    ///
    /// - `NotFound` if the registration doesn't exist in that term
    pub async fn get(&self, key: &RegistrationKey) -> Result<Registration, RegistrationError> {
        self.find_by_id(key)
            .await?
            .ok_or_else(|| RegistrationError::not_found(EntityKind::Registration, key))
    }

    pub async fn find_by_student(&self, student_id: &StudentId) -> Result<Vec<Registration>, DomainError> {
        self.find_where(|r| r.student_id() == student_id).await
    }

    pub async fn find_by_instructor(
        &self,
        instructor_id: &InstructorId,
    ) -> Result<Vec<Registration>, DomainError> {
        self.find_where(|r| r.instructor_id() == Some(instructor_id)).await
    }

    pub async fn find_by_class(&self, class_id: &ClassId) -> Result<Vec<Registration>, DomainError> {
        self.find_where(|r| r.class_id() == Some(class_id)).await
    }

    pub async fn find_by_partition(&self, partition: &Partition) -> Result<Vec<Registration>, DomainError> {
        self.find_where(|r| r.partition() == *partition).await
    }

    /// Active registrations of one term.
    pub async fn find_active_in_partition(
        &self,
        partition: &Partition,
    ) -> Result<Vec<Registration>, DomainError> {
        self.find_where(|r| r.is_active() && r.partition() == *partition)
            .await
    }

    /// Active seats taken in a class for one term.
    pub async fn class_enrollment(
        &self,
        class_id: &ClassId,
        partition: &Partition,
    ) -> Result<usize, DomainError> {
        Ok(self
            .find_where(|r| {
                r.is_active() && r.partition() == *partition && r.class_id() == Some(class_id)
            })
            .await?
            .len())
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, DomainError> {
        Ok(StatusCounts::tally(self.find_all().await?.iter()))
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.store.count().await
    }

    pub async fn clear_cache(&self) {
        self.cache.invalidate().await;
    }

    pub async fn refresh(&self) -> Result<Arc<Vec<Registration>>, DomainError> {
        self.cache.invalidate().await;
        self.find_all().await
    }

    /// Rebuilds the shared ledger from the store.
    pub async fn resync_ledger(&self) -> Result<usize, DomainError> {
        self.ledger.resync(self.store.as_ref()).await
    }

    async fn find_where<P>(&self, predicate: P) -> Result<Vec<Registration>, DomainError>
    where
        P: Fn(&Registration) -> bool,
    {
        Ok(self
            .find_all()
            .await?
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    /// Reads straight from the store; writes must never act on a stale copy.
    async fn load(&self, key: &RegistrationKey) -> Result<Registration, RegistrationError> {
        self.store
            .find_by_id(key)
            .await?
            .ok_or_else(|| RegistrationError::not_found(EntityKind::Registration, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryStore;
    use crate::domain::foundation::{ErrorCode, RegistrationId};
    use crate::domain::registration::conflict::test_support::{fall_2024, private, private_in, slot};
    use crate::domain::registration::{ConflictKind, SchoolYear, Trimester, Weekday};

    fn admin() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    fn request(student: &str, instructor: &str, day: &str, start: &str, length: u32) -> RegistrationRequest {
        RegistrationRequest {
            student_id: Some(student.into()),
            registration_type: Some("private".into()),
            instructor_id: Some(instructor.into()),
            instrument: Some("Piano".into()),
            day: Some(day.into()),
            start_time: Some(start.into()),
            length: Some(length),
            transportation_type: Some("pickup".into()),
            school_year: Some("2024-2025".into()),
            trimester: Some("Fall".into()),
            ..Default::default()
        }
    }

    fn repository(store: &InMemoryStore<Registration>) -> RegistrationRepository {
        RegistrationRepository::new(Arc::new(store.clone()), SlotLedger::new(), Duration::from_secs(60))
    }

    async fn create(repo: &RegistrationRepository, req: RegistrationRequest) -> Result<Registration, RegistrationError> {
        repo.create_from_request(&req, RegistrationStatus::Approved, admin(), Timestamp::now())
            .await
    }

    #[tokio::test]
    async fn create_assigns_derived_id_and_audit_stamps() {
        let store = InMemoryStore::new();
        let repo = repository(&store);

        let registration = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();

        assert_eq!(registration.id().as_str(), "S1_I1_Monday_14:00");
        assert_eq!(registration.registered_by(), &admin());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn overlapping_instructor_booking_is_rejected() {
        let store = InMemoryStore::new();
        let repo = repository(&store);
        create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();

        let err = create(&repo, request("S2", "I1", "Monday", "14:15", 30)).await.unwrap_err();

        match err {
            RegistrationError::Conflict { conflicts } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].kind, ConflictKind::Instructor);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn back_to_back_bookings_are_allowed() {
        let repo = repository(&InMemoryStore::new());
        create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();
        assert!(create(&repo, request("S1", "I1", "Monday", "14:30", 30)).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_request_touches_nothing() {
        let store = InMemoryStore::new();
        store.fail_with(Some("store must not be called")).await;
        let repo = repository(&store);

        let err = create(&repo, request("S1", "I1", "Monday", "14:00", 20)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn same_slot_twice_is_a_duplicate() {
        let repo = repository(&InMemoryStore::new());
        create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();

        let err = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateRegistration);
    }

    #[tokio::test]
    async fn cancelled_slot_can_be_booked_again() {
        let store = InMemoryStore::new();
        let repo = repository(&store);
        let first = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();
        repo.cancel(&first.key(), "moving away", Timestamp::now(), CancellationMode::Soft)
            .await
            .unwrap();

        let again = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();
        assert!(again.is_active());
        assert_eq!(store.len().await, 1);
    }

    fn in_term(mut req: RegistrationRequest, trimester: &str) -> RegistrationRequest {
        req.trimester = Some(trimester.into());
        req
    }

    #[tokio::test]
    async fn same_student_keeps_the_slot_into_the_next_term() {
        let store = InMemoryStore::new();
        let repo = repository(&store);

        let fall = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();
        let winter = create(&repo, in_term(request("S1", "I1", "Monday", "14:00", 30), "Winter"))
            .await
            .unwrap();

        assert_eq!(fall.id(), winter.id());
        assert_ne!(fall.key(), winter.key());
        assert_eq!(store.len().await, 2);
        assert!(repo.find_by_id(&fall.key()).await.unwrap().is_some());
        assert!(repo.find_by_id(&winter.key()).await.unwrap().is_some());

        // Still a duplicate within the term
        let err = create(&repo, in_term(request("S1", "I1", "Monday", "14:00", 30), "Winter"))
            .await
            .unwrap_err();
        match err {
            RegistrationError::Conflict { conflicts } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].kind, ConflictKind::Duplicate);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rebooking_next_term_leaves_cancelled_history_alone() {
        let store = InMemoryStore::new();
        let repo = repository(&store);
        let fall = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();
        repo.cancel(&fall.key(), "winter schedule", Timestamp::now(), CancellationMode::Soft)
            .await
            .unwrap();

        let winter = create(&repo, in_term(request("S1", "I1", "Monday", "14:00", 30), "Winter"))
            .await
            .unwrap();
        repo.update_status(&winter.key(), RegistrationStatus::Completed)
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        let fall_row = store.find_by_id(&fall.key()).await.unwrap().unwrap();
        assert_eq!(fall_row.status(), RegistrationStatus::Cancelled);
        assert_eq!(fall_row.cancellation_reason(), Some("winter schedule"));
        let winter_row = store.find_by_id(&winter.key()).await.unwrap().unwrap();
        assert_eq!(winter_row.status(), RegistrationStatus::Completed);
        assert!(winter_row.cancellation_reason().is_none());
    }

    #[tokio::test]
    async fn rows_written_around_the_engine_still_block_duplicates() {
        let store = InMemoryStore::new();
        let repo = repository(&store);
        repo.check_conflicts(&private("S9", "I9", slot(Weekday::Friday, "09:00", 15), None))
            .await
            .unwrap();

        store
            .insert(&private("S1", "I1", slot(Weekday::Monday, "14:00", 30), None))
            .await
            .unwrap();

        let err = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateRegistration);
    }

    #[tokio::test]
    async fn soft_cancel_keeps_row_and_frees_slot() {
        let store = InMemoryStore::new();
        let repo = repository(&store);
        let first = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();

        let cancelled = repo
            .cancel(&first.key(), "schedule change", Timestamp::now(), CancellationMode::Soft)
            .await
            .unwrap();

        assert_eq!(cancelled.status(), RegistrationStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason(), Some("schedule change"));
        assert_eq!(store.len().await, 1);
        assert!(create(&repo, request("S2", "I1", "Monday", "14:00", 30)).await.is_ok());
    }

    #[tokio::test]
    async fn hard_cancel_removes_row() {
        let store = InMemoryStore::new();
        let repo = repository(&store);
        let first = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();

        repo.cancel(&first.key(), "duplicate entry", Timestamp::now(), CancellationMode::Hard)
            .await
            .unwrap();

        assert_eq!(store.len().await, 0);
        assert!(repo.find_by_id(&first.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelling_twice_is_an_invalid_transition() {
        let repo = repository(&InMemoryStore::new());
        let first = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();
        repo.cancel(&first.key(), "once", Timestamp::now(), CancellationMode::Soft).await.unwrap();

        let err = repo
            .cancel(&first.key(), "twice", Timestamp::now(), CancellationMode::Soft)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn completing_a_registration_frees_the_slot() {
        let repo = repository(&InMemoryStore::new());
        let first = create(&repo, request("S1", "I1", "Monday", "14:00", 30)).await.unwrap();

        let completed = repo.update_status(&first.key(), RegistrationStatus::Completed).await.unwrap();
        assert_eq!(completed.status(), RegistrationStatus::Completed);
        assert!(create(&repo, request("S2", "I1", "Monday", "14:00", 30)).await.is_ok());

        let err = repo
            .update_status(&first.key(), RegistrationStatus::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn missing_registration_is_not_found() {
        let repo = repository(&InMemoryStore::new());
        let err = repo
            .update_status(
                &RegistrationKey::new(fall_2024(), RegistrationId::new("nope").unwrap()),
                RegistrationStatus::Approved,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RegistrationNotFound);
    }

    #[tokio::test]
    async fn queries_filter_by_reference_and_partition() {
        let spring = Partition::new(SchoolYear::starting(2024), Trimester::Spring);
        let store = InMemoryStore::with_entities([
            private("S1", "I1", slot(Weekday::Monday, "14:00", 30), None),
            private("S1", "I2", slot(Weekday::Tuesday, "14:00", 30), None),
            private_in("S2", "I1", slot(Weekday::Monday, "14:00", 30), None, spring),
        ]);
        let repo = repository(&store);

        assert_eq!(repo.find_by_student(&StudentId::new("S1").unwrap()).await.unwrap().len(), 2);
        assert_eq!(repo.find_by_instructor(&InstructorId::new("I1").unwrap()).await.unwrap().len(), 2);
        assert_eq!(repo.find_by_partition(&spring).await.unwrap().len(), 1);
        assert_eq!(repo.find_active_in_partition(&fall_2024()).await.unwrap().len(), 2);
        assert_eq!(repo.status_counts().await.unwrap().approved, 3);
    }

    #[tokio::test]
    async fn concurrent_creates_for_one_slot_admit_exactly_one() {
        let store = InMemoryStore::new();
        let repo = Arc::new(repository(&store));

        let attempts = (0..8).map(|n| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                create(&repo, request(&format!("S{n}"), "I1", "Wednesday", "16:00", 45)).await
            })
        });
        let results = futures::future::join_all(attempts).await;

        let created = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }
}
