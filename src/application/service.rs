//! RegistrationService - Entry point for the registration engine.
//!
//! Every call opens a fresh [`UnitOfWork`] over the shared stores and slot
//! ledger, runs one handler, and disposes the unit. Repository caches
//! therefore never outlive a request, while the ledger keeps serialising
//! writes across all of them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::handlers::{
    CancelRegistrationCommand, CancelRegistrationHandler, CancelRegistrationResult,
    GetRegistrationDetailsHandler, GetRegistrationDetailsQuery, GetStudentRegistrationsHandler,
    GetStudentRegistrationsQuery, ProcessRegistrationCommand, ProcessRegistrationHandler,
    ProcessRegistrationResult, RegistrationDetails, StudentRegistrations,
};
use super::slot_ledger::SlotLedger;
use super::unit_of_work::{DashboardData, HealthStatus, UnitOfWork, UserMatch};
use crate::domain::foundation::{CommandMetadata, DomainError, StudentId};
use crate::domain::people::Instructor;
use crate::domain::registration::{
    CancellationMode, CancellationPolicy, EligibilityPolicy, Registration, RegistrationError,
    RegistrationKey, RegistrationRequest, RegistrationStatus, Weekday,
};
use crate::ports::{Clock, EntityStores, SideChannel};

/// Business settings applied by every handler the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSettings {
    pub eligibility: EligibilityPolicy,
    pub cancellation: CancellationPolicy,
    pub cancellation_mode: CancellationMode,
    pub auto_approve: bool,
    pub cache_ttl: Duration,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            eligibility: EligibilityPolicy::default(),
            cancellation: CancellationPolicy::default(),
            cancellation_mode: CancellationMode::default(),
            auto_approve: true,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Clone)]
pub struct RegistrationService {
    stores: EntityStores,
    ledger: SlotLedger,
    side_channel: Arc<dyn SideChannel>,
    clock: Arc<dyn Clock>,
    settings: RegistrationSettings,
}

impl RegistrationService {
    pub fn new(
        stores: EntityStores,
        side_channel: Arc<dyn SideChannel>,
        clock: Arc<dyn Clock>,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            stores,
            ledger: SlotLedger::new(),
            side_channel,
            clock,
            settings,
        }
    }

    /// Shares an existing ledger, e.g. with another service over the same stores.
    pub fn with_ledger(mut self, ledger: SlotLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &SlotLedger {
        &self.ledger
    }

    fn unit_of_work(&self) -> Arc<UnitOfWork> {
        Arc::new(UnitOfWork::new(
            self.stores.clone(),
            self.ledger.clone(),
            self.settings.cache_ttl,
        ))
    }

    async fn run<T, F, Fut>(&self, work: F) -> T
    where
        F: FnOnce(Arc<UnitOfWork>) -> Fut,
        Fut: Future<Output = T>,
    {
        let uow = self.unit_of_work();
        let result = work(Arc::clone(&uow)).await;
        uow.dispose().await;
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn process_registration(
        &self,
        request: RegistrationRequest,
        metadata: CommandMetadata,
    ) -> Result<ProcessRegistrationResult, RegistrationError> {
        self.run(|uow| async move {
            ProcessRegistrationHandler::new(uow, self.side_channel.clone(), self.clock.clone())
                .with_eligibility(self.settings.eligibility)
                .with_auto_approve(self.settings.auto_approve)
                .handle(ProcessRegistrationCommand { request }, metadata)
                .await
        })
        .await
    }

    pub async fn cancel_registration(
        &self,
        registration: RegistrationKey,
        reason: impl Into<String>,
        manager_approved: bool,
        metadata: CommandMetadata,
    ) -> Result<CancelRegistrationResult, RegistrationError> {
        let cmd = CancelRegistrationCommand {
            registration,
            reason: reason.into(),
            manager_approved,
        };
        self.run(|uow| async move {
            CancelRegistrationHandler::new(uow, self.side_channel.clone(), self.clock.clone())
                .with_policy(self.settings.cancellation)
                .with_mode(self.settings.cancellation_mode)
                .handle(cmd, metadata)
                .await
        })
        .await
    }

    /// Moves a registration along its lifecycle, e.g. approving a pending one.
    pub async fn update_registration_status(
        &self,
        registration: &RegistrationKey,
        status: RegistrationStatus,
    ) -> Result<Registration, RegistrationError> {
        self.run(|uow| async move {
            uow.registrations()?
                .update_status(registration, status)
                .await
        })
        .await
    }

    /// Rebuilds the slot ledger from the registrations table.
    pub async fn resync_ledger(&self) -> Result<usize, DomainError> {
        self.ledger.resync(self.stores.registrations.as_ref()).await
    }

    /// Waits for queued notifications and audit events.
    pub async fn flush(&self) {
        self.side_channel.flush().await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn get_registration_details(
        &self,
        registration: RegistrationKey,
    ) -> Result<RegistrationDetails, RegistrationError> {
        self.run(|uow| async move {
            GetRegistrationDetailsHandler::new(uow, self.clock.clone())
                .handle(GetRegistrationDetailsQuery { registration })
                .await
        })
        .await
    }

    pub async fn get_student_registrations(
        &self,
        query: GetStudentRegistrationsQuery,
    ) -> Result<StudentRegistrations, RegistrationError> {
        self.run(|uow| async move {
            GetStudentRegistrationsHandler::new(uow, self.clock.clone())
                .handle(query)
                .await
        })
        .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserMatch>, DomainError> {
        self.run(|uow| async move { uow.find_user_by_email(email).await })
            .await
    }

    pub async fn find_available_instructors(
        &self,
        student_id: &StudentId,
        instrument: Option<&str>,
        day: Option<Weekday>,
    ) -> Result<Vec<Instructor>, DomainError> {
        self.run(|uow| async move {
            uow.find_available_instructors(student_id, instrument, day)
                .await
        })
        .await
    }

    pub async fn dashboard(&self) -> Result<DashboardData, DomainError> {
        self.run(|uow| async move { uow.get_dashboard_data().await })
            .await
    }

    pub async fn health(&self) -> Result<HealthStatus, DomainError> {
        self.run(|uow| async move { uow.get_health_status().await })
            .await
    }
}
