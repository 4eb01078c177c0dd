//! UnitOfWork - Request-scoped access to every repository.
//!
//! Repositories are created on first access and memoized for the lifetime
//! of the unit; each owns its own cache. Once [`UnitOfWork::dispose`] has
//! run, every accessor fails with `UnitOfWorkDisposed`.
//!
//! Caches are invalidated only by the registration repository's own writes
//! or explicitly through [`clear_all_caches`](UnitOfWork::clear_all_caches)
//! and [`refresh_all`](UnitOfWork::refresh_all). Conflict checks never rely
//! on these caches; they go through the shared [`SlotLedger`].

use futures::future::join_all;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::registration_repository::{RegistrationRepository, StatusCounts};
use super::repository::EntityRepository;
use super::slot_ledger::SlotLedger;
use crate::domain::foundation::{
    DomainError, EntityKind, ErrorCode, StoredEntity, StudentId, Timestamp,
};
use crate::domain::people::{Admin, Instructor, LessonClass, Parent, Room, Student};
use crate::domain::registration::Weekday;
use crate::ports::{EntityStore, EntityStores};

/// A user matched by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum UserMatch {
    Admin(Admin),
    Instructor(Instructor),
}

/// A student with their resolved parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyInfo {
    pub student: Student,
    pub parents: Vec<Parent>,
}

impl FamilyInfo {
    /// Email addresses of the student and every parent, deduplicated.
    pub fn email_recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = Vec::new();
        let candidates = self
            .student
            .email
            .iter()
            .chain(self.parents.iter().filter_map(|p| p.email.as_ref()));
        for email in candidates {
            let email = email.trim();
            if !email.is_empty() && !recipients.iter().any(|r| r.eq_ignore_ascii_case(email)) {
                recipients.push(email.to_string());
            }
        }
        recipients
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub total: usize,
    pub active: usize,
}

/// Summary counts across every table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    pub counts: BTreeMap<EntityKind, EntityCounts>,
    pub registrations_by_status: StatusCounts,
    pub generated_at: Timestamp,
}

/// Outcome of probing one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryHealth {
    pub kind: EntityKind,
    pub healthy: bool,
    pub rows: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub repositories: Vec<RepositoryHealth>,
    pub checked_at: Timestamp,
}

pub struct UnitOfWork {
    stores: EntityStores,
    ledger: SlotLedger,
    cache_ttl: Duration,
    disposed: AtomicBool,
    students: OnceCell<Arc<EntityRepository<Student>>>,
    parents: OnceCell<Arc<EntityRepository<Parent>>>,
    instructors: OnceCell<Arc<EntityRepository<Instructor>>>,
    admins: OnceCell<Arc<EntityRepository<Admin>>>,
    classes: OnceCell<Arc<EntityRepository<LessonClass>>>,
    rooms: OnceCell<Arc<EntityRepository<Room>>>,
    registrations: OnceCell<Arc<RegistrationRepository>>,
}

impl UnitOfWork {
    pub fn new(stores: EntityStores, ledger: SlotLedger, cache_ttl: Duration) -> Self {
        Self {
            stores,
            ledger,
            cache_ttl,
            disposed: AtomicBool::new(false),
            students: OnceCell::new(),
            parents: OnceCell::new(),
            instructors: OnceCell::new(),
            admins: OnceCell::new(),
            classes: OnceCell::new(),
            rooms: OnceCell::new(),
            registrations: OnceCell::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Repository access
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(DomainError::new(
                ErrorCode::UnitOfWorkDisposed,
                "Unit of work has been disposed",
            ));
        }
        Ok(())
    }

    fn repository<T: StoredEntity>(
        &self,
        cell: &OnceCell<Arc<EntityRepository<T>>>,
        store: &Arc<dyn EntityStore<T>>,
    ) -> Result<Arc<EntityRepository<T>>, DomainError> {
        self.ensure_open()?;
        Ok(Arc::clone(cell.get_or_init(|| {
            debug!(table = T::KIND.table_name(), "Creating repository");
            Arc::new(EntityRepository::new(Arc::clone(store), self.cache_ttl))
        })))
    }

    pub fn students(&self) -> Result<Arc<EntityRepository<Student>>, DomainError> {
        self.repository(&self.students, &self.stores.students)
    }

    pub fn parents(&self) -> Result<Arc<EntityRepository<Parent>>, DomainError> {
        self.repository(&self.parents, &self.stores.parents)
    }

    pub fn instructors(&self) -> Result<Arc<EntityRepository<Instructor>>, DomainError> {
        self.repository(&self.instructors, &self.stores.instructors)
    }

    pub fn admins(&self) -> Result<Arc<EntityRepository<Admin>>, DomainError> {
        self.repository(&self.admins, &self.stores.admins)
    }

    pub fn classes(&self) -> Result<Arc<EntityRepository<LessonClass>>, DomainError> {
        self.repository(&self.classes, &self.stores.classes)
    }

    pub fn rooms(&self) -> Result<Arc<EntityRepository<Room>>, DomainError> {
        self.repository(&self.rooms, &self.stores.rooms)
    }

    pub fn registrations(&self) -> Result<Arc<RegistrationRepository>, DomainError> {
        self.ensure_open()?;
        Ok(Arc::clone(self.registrations.get_or_init(|| {
            debug!(table = "registrations", "Creating repository");
            Arc::new(RegistrationRepository::new(
                Arc::clone(&self.stores.registrations),
                self.ledger.clone(),
                self.cache_ttl,
            ))
        })))
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Drops every cache and closes the unit.
    pub async fn dispose(&self) {
        self.clear_all_caches().await;
        self.disposed.store(true, Ordering::Release);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cross-entity queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Looks an email up among admins and instructors at the same time.
    /// An admin match wins over an instructor match.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserMatch>, DomainError> {
        let admins = self.admins()?;
        let instructors = self.instructors()?;
        let (admin, instructor) =
            tokio::try_join!(admins.find_by_email(email), instructors.find_by_email(email))?;

        Ok(admin
            .map(UserMatch::Admin)
            .or_else(|| instructor.map(UserMatch::Instructor)))
    }

    /// Loads a student and resolves their parents concurrently. Parent
    /// references that point nowhere are left out.
    ///
    /// # Errors
    ///
    /// - `StudentNotFound` if the student doesn't exist
    pub async fn get_family_info(&self, student_id: &StudentId) -> Result<FamilyInfo, DomainError> {
        let student = self.students()?.get(student_id).await?;
        let parents_repo = self.parents()?;

        let lookups = student.parent_ids();
        let resolved = join_all(lookups.iter().map(|id| parents_repo.find_by_id(id))).await;

        let mut parents = Vec::with_capacity(lookups.len());
        for (id, result) in lookups.iter().zip(resolved) {
            match result? {
                Some(parent) => parents.push(parent),
                None => debug!(student_id = %student_id, parent_id = %id, "Parent reference is dangling"),
            }
        }
        Ok(FamilyInfo { student, parents })
    }

    /// Active instructors who cover the student's grade, optionally
    /// filtered by instrument and weekday.
    ///
    /// # Errors
    ///
    /// - `StudentNotFound` if the student doesn't exist
    /// - `ValidationFailed` if the student's grade is not recorded
    pub async fn find_available_instructors(
        &self,
        student_id: &StudentId,
        instrument: Option<&str>,
        day: Option<Weekday>,
    ) -> Result<Vec<Instructor>, DomainError> {
        let student = self.students()?.get(student_id).await?;
        let grade = student.grade.ok_or_else(|| {
            DomainError::validation("grade", format!("Student {} has no grade on file", student_id))
        })?;
        self.instructors()?.find_available(grade, instrument, day).await
    }

    /// Counts every table concurrently.
    pub async fn get_dashboard_data(&self) -> Result<DashboardData, DomainError> {
        let students = self.students()?;
        let parents = self.parents()?;
        let instructors = self.instructors()?;
        let admins = self.admins()?;
        let classes = self.classes()?;
        let rooms = self.rooms()?;
        let registrations = self.registrations()?;

        let (students, parents, instructors, admins, classes, rooms, registrations) = tokio::try_join!(
            students.find_all(),
            parents.find_all(),
            instructors.find_all(),
            admins.find_all(),
            classes.find_all(),
            rooms.find_all(),
            registrations.find_all(),
        )?;

        let mut counts = BTreeMap::new();
        counts.insert(EntityKind::Student, tally(&students));
        counts.insert(EntityKind::Parent, tally(&parents));
        counts.insert(EntityKind::Instructor, tally(&instructors));
        counts.insert(EntityKind::Admin, tally(&admins));
        counts.insert(EntityKind::Class, tally(&classes));
        counts.insert(EntityKind::Room, tally(&rooms));
        counts.insert(EntityKind::Registration, tally(&registrations));

        Ok(DashboardData {
            counts,
            registrations_by_status: StatusCounts::tally(registrations.iter()),
            generated_at: Timestamp::now(),
        })
    }

    /// Probes every repository; one failing probe does not stop the others.
    pub async fn get_health_status(&self) -> Result<HealthStatus, DomainError> {
        let students = self.students()?;
        let parents = self.parents()?;
        let instructors = self.instructors()?;
        let admins = self.admins()?;
        let classes = self.classes()?;
        let rooms = self.rooms()?;
        let registrations = self.registrations()?;

        let (s, p, i, a, c, r, g) = tokio::join!(
            students.count(),
            parents.count(),
            instructors.count(),
            admins.count(),
            classes.count(),
            rooms.count(),
            registrations.count(),
        );

        let repositories: Vec<RepositoryHealth> = [
            (EntityKind::Student, s),
            (EntityKind::Parent, p),
            (EntityKind::Instructor, i),
            (EntityKind::Admin, a),
            (EntityKind::Class, c),
            (EntityKind::Room, r),
            (EntityKind::Registration, g),
        ]
        .into_iter()
        .map(|(kind, result)| match result {
            Ok(rows) => RepositoryHealth {
                kind,
                healthy: true,
                rows: Some(rows),
                error: None,
            },
            Err(err) => {
                warn!(table = kind.table_name(), error = %err, "Health probe failed");
                RepositoryHealth {
                    kind,
                    healthy: false,
                    rows: None,
                    error: Some(err.to_string()),
                }
            }
        })
        .collect();

        Ok(HealthStatus {
            healthy: repositories.iter().all(|r| r.healthy),
            repositories,
            checked_at: Timestamp::now(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invalidation
    // ─────────────────────────────────────────────────────────────────────────

    /// Drops the cache of every repository created so far.
    pub async fn clear_all_caches(&self) {
        if let Some(repo) = self.students.get() {
            repo.clear_cache().await;
        }
        if let Some(repo) = self.parents.get() {
            repo.clear_cache().await;
        }
        if let Some(repo) = self.instructors.get() {
            repo.clear_cache().await;
        }
        if let Some(repo) = self.admins.get() {
            repo.clear_cache().await;
        }
        if let Some(repo) = self.classes.get() {
            repo.clear_cache().await;
        }
        if let Some(repo) = self.rooms.get() {
            repo.clear_cache().await;
        }
        if let Some(repo) = self.registrations.get() {
            repo.clear_cache().await;
        }
    }

    /// Reloads every table and rebuilds the slot ledger.
    pub async fn refresh_all(&self) -> Result<(), DomainError> {
        let students = self.students()?;
        let parents = self.parents()?;
        let instructors = self.instructors()?;
        let admins = self.admins()?;
        let classes = self.classes()?;
        let rooms = self.rooms()?;
        let registrations = self.registrations()?;

        tokio::try_join!(
            students.refresh(),
            parents.refresh(),
            instructors.refresh(),
            admins.refresh(),
            classes.refresh(),
            rooms.refresh(),
            registrations.refresh(),
        )?;
        registrations.resync_ledger().await?;
        debug!("Refreshed all repositories");
        Ok(())
    }
}

fn tally<T: StoredEntity>(rows: &[T]) -> EntityCounts {
    EntityCounts {
        total: rows.len(),
        active: rows.iter().filter(|e| e.is_active()).count(),
    }
}
