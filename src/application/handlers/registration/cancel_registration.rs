//! CancelRegistrationHandler - Command handler for cancelling registrations.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::audit_envelope;
use crate::application::notifications;
use crate::application::UnitOfWork;
use crate::domain::foundation::{CommandMetadata, EventId, RegistrationId, StudentId, Timestamp};
use crate::domain::registration::{
    CancellationDecision, CancellationMode, CancellationPolicy, Registration,
    RegistrationCancelled, RegistrationError, RegistrationKey,
};
use crate::ports::{Clock, SideChannel, SideEffect};

/// Command to cancel a registration.
#[derive(Debug, Clone)]
pub struct CancelRegistrationCommand {
    pub registration: RegistrationKey,
    pub reason: String,
    /// Set when a manager has signed off on a cancellation inside the
    /// no-cancel window.
    pub manager_approved: bool,
}

/// What happened to a cancelled registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationInfo {
    pub registration_id: RegistrationId,
    pub student_id: StudentId,
    pub reason: String,
    pub refund_eligible: bool,
    pub cancellation_fee_cents: u32,
    pub cancelled_at: Timestamp,
    /// True when the row was removed rather than marked cancelled.
    pub hard_deleted: bool,
    pub next_lesson_at: Option<NaiveDateTime>,
    pub registration: Registration,
}

/// Outcome of a cancellation request.
///
/// `PendingApproval` is not an error: nothing was changed and the request
/// is waiting on a manager.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancelRegistrationResult {
    Cancelled(CancellationInfo),
    #[serde(rename_all = "camelCase")]
    PendingApproval {
        registration_id: RegistrationId,
        reason: String,
        next_lesson_at: NaiveDateTime,
    },
}

impl CancelRegistrationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CancelRegistrationResult::Cancelled(_))
    }

    pub fn approval_required(&self) -> bool {
        matches!(self, CancelRegistrationResult::PendingApproval { .. })
    }
}

/// Handler for cancelling registrations.
pub struct CancelRegistrationHandler {
    uow: Arc<UnitOfWork>,
    side_channel: Arc<dyn SideChannel>,
    clock: Arc<dyn Clock>,
    policy: CancellationPolicy,
    mode: CancellationMode,
}

impl CancelRegistrationHandler {
    pub fn new(
        uow: Arc<UnitOfWork>,
        side_channel: Arc<dyn SideChannel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            uow,
            side_channel,
            clock,
            policy: CancellationPolicy::default(),
            mode: CancellationMode::default(),
        }
    }

    pub fn with_policy(mut self, policy: CancellationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: CancellationMode) -> Self {
        self.mode = mode;
        self
    }

    pub async fn handle(
        &self,
        cmd: CancelRegistrationCommand,
        metadata: CommandMetadata,
    ) -> Result<CancelRegistrationResult, RegistrationError> {
        let registrations = self.uow.registrations()?;

        // 1. Load
        let registration = registrations.get(&cmd.registration).await?;

        // 2. Policy
        let decision = self
            .policy
            .evaluate(&registration, self.clock.now(), cmd.manager_approved);
        let (refund_eligible, fee_cents, next_lesson_at) = match decision {
            CancellationDecision::Blocked { reason } => {
                return Err(RegistrationError::CannotCancel { reason });
            }
            CancellationDecision::RequiresApproval {
                reason,
                next_lesson_at,
            } => {
                info!(
                    registration = %cmd.registration,
                    next_lesson_at = %next_lesson_at,
                    "Cancellation awaiting manager approval"
                );
                return Ok(CancelRegistrationResult::PendingApproval {
                    registration_id: cmd.registration.id,
                    reason,
                    next_lesson_at,
                });
            }
            CancellationDecision::Allowed {
                refund_eligible,
                fee_cents,
                next_lesson_at,
            } => (refund_eligible, fee_cents, next_lesson_at),
        };

        // 3. Cancel
        let cancelled_at = self.clock.timestamp();
        let cancelled = registrations
            .cancel(&cmd.registration, &cmd.reason, cancelled_at, self.mode)
            .await?;
        let hard_deleted = self.mode == CancellationMode::Hard;

        // 4. Audit
        let event = RegistrationCancelled {
            event_id: EventId::new(),
            registration_id: cancelled.id().clone(),
            student_id: cancelled.student_id().clone(),
            reason: cmd.reason.clone(),
            refund_eligible,
            fee_cents,
            hard_delete: hard_deleted,
            cancelled_by: metadata.user_id.clone(),
            cancelled_at,
        };
        self.side_channel
            .submit(SideEffect::Audit(audit_envelope(&event, &metadata)));

        // 5. Notify
        self.notify(&cancelled, &cmd.reason, refund_eligible, fee_cents)
            .await;

        Ok(CancelRegistrationResult::Cancelled(CancellationInfo {
            registration_id: cmd.registration.id,
            student_id: cancelled.student_id().clone(),
            reason: cmd.reason,
            refund_eligible,
            cancellation_fee_cents: fee_cents,
            cancelled_at,
            hard_deleted,
            next_lesson_at,
            registration: cancelled,
        }))
    }

    /// Sends cancellation notices to the family and the instructor. Lookup
    /// failures are logged and skipped.
    async fn notify(
        &self,
        registration: &Registration,
        reason: &str,
        refund_eligible: bool,
        fee_cents: u32,
    ) {
        let instructor_lookup = async {
            match (self.uow.instructors(), registration.instructor_id()) {
                (Ok(repo), Some(id)) => repo.find_by_id(id).await,
                (Err(err), Some(_)) => Err(err),
                (_, None) => Ok(None),
            }
        };
        let (family, instructor) = tokio::join!(
            self.uow.get_family_info(registration.student_id()),
            instructor_lookup
        );

        let family = match family {
            Ok(family) => family,
            Err(err) => {
                warn!(
                    registration_id = %registration.id(),
                    error = %err,
                    "Student lookup failed, skipping cancellation notices"
                );
                return;
            }
        };

        let mut recipients = family.email_recipients();
        match instructor {
            Ok(Some(instructor)) => recipients.extend(instructor.email),
            Ok(None) => {}
            Err(err) => warn!(
                registration_id = %registration.id(),
                error = %err,
                "Instructor lookup failed, not notifying instructor"
            ),
        }

        for to in recipients {
            self.side_channel.submit(SideEffect::Notify(
                notifications::cancellation_notice(
                    &to,
                    &family.student,
                    registration,
                    reason,
                    refund_eligible,
                    fee_cents,
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{slot, test_metadata, Fixture};
    use super::*;
    use crate::domain::foundation::EntityKind;
    use crate::domain::registration::conflict::test_support::{fall_2024, private, private_in};
    use crate::domain::registration::{Partition, RegistrationStatus, Trimester, Weekday};
    use crate::ports::EntityStore;

    fn handler(fixture: &Fixture) -> CancelRegistrationHandler {
        CancelRegistrationHandler::new(
            fixture.unit_of_work(),
            fixture.side_channel.clone(),
            fixture.clock.clone(),
        )
    }

    /// Stores an approved Fall lesson for S1 with I1 and returns its key.
    async fn booked(fixture: &Fixture, day: Weekday, start: &str) -> RegistrationKey {
        let registration = private("S1", "I1", slot(day, start, 30), None);
        fixture.registrations.insert(&registration).await.unwrap();
        registration.key()
    }

    fn command(key: &RegistrationKey, manager_approved: bool) -> CancelRegistrationCommand {
        CancelRegistrationCommand {
            registration: key.clone(),
            reason: "Family is moving".into(),
            manager_approved,
        }
    }

    fn expect_cancelled(result: CancelRegistrationResult) -> CancellationInfo {
        match result {
            CancelRegistrationResult::Cancelled(info) => info,
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Approval Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn inside_no_cancel_window_waits_for_approval_without_changes() {
        let fixture = Fixture::new();
        // Clock is Monday 09:00; the lesson starts at 14:00 the same day
        let id = booked(&fixture, Weekday::Monday, "14:00").await;
        let handler = handler(&fixture);

        let result = handler.handle(command(&id, false), test_metadata()).await.unwrap();

        assert!(!result.is_success());
        assert!(result.approval_required());
        let stored = fixture.registrations.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), RegistrationStatus::Approved);
        assert!(stored.cancelled_at().is_none());
        assert!(fixture.side_channel.is_empty());
        assert!(!fixture
            .store_calls()
            .iter()
            .any(|c| c.ends_with(".update") || c.ends_with(".delete")));
    }

    #[tokio::test]
    async fn pending_approval_serializes_with_status_tag() {
        let fixture = Fixture::new();
        let id = booked(&fixture, Weekday::Monday, "14:00").await;

        let result = handler(&fixture)
            .handle(command(&id, false), test_metadata())
            .await
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "pending_approval");
        assert_eq!(json["registrationId"], "S1_I1_Monday_14:00");
    }

    #[tokio::test]
    async fn manager_approval_allows_late_cancellation_with_fee() {
        let fixture = Fixture::new();
        let id = booked(&fixture, Weekday::Monday, "14:00").await;

        let info = expect_cancelled(
            handler(&fixture)
                .handle(command(&id, true), test_metadata())
                .await
                .unwrap(),
        );

        assert!(!info.refund_eligible);
        assert_eq!(info.cancellation_fee_cents, 2500);
        assert_eq!(info.registration.status(), RegistrationStatus::Cancelled);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn cancelling_within_refund_window_charges_fee() {
        let fixture = Fixture::new();
        // Wednesday 14:00 is 53 hours away
        let id = booked(&fixture, Weekday::Wednesday, "14:00").await;

        let info = expect_cancelled(
            handler(&fixture)
                .handle(command(&id, false), test_metadata())
                .await
                .unwrap(),
        );

        assert!(!info.refund_eligible);
        assert_eq!(info.cancellation_fee_cents, 2500);
        assert_eq!(
            info.next_lesson_at.unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2024-10-09 14:00"
        );
    }

    #[tokio::test]
    async fn cancelling_far_ahead_is_refunded() {
        let fixture = Fixture::new();
        // Thursday 14:00 is 77 hours away
        let id = booked(&fixture, Weekday::Thursday, "14:00").await;

        let info = expect_cancelled(
            handler(&fixture)
                .handle(command(&id, false), test_metadata())
                .await
                .unwrap(),
        );

        assert!(info.refund_eligible);
        assert_eq!(info.cancellation_fee_cents, 0);
    }

    #[tokio::test]
    async fn soft_cancel_keeps_the_row() {
        let fixture = Fixture::new();
        let id = booked(&fixture, Weekday::Wednesday, "14:00").await;

        let info = expect_cancelled(
            handler(&fixture)
                .handle(command(&id, false), test_metadata())
                .await
                .unwrap(),
        );

        assert!(!info.hard_deleted);
        let stored = fixture.registrations.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), RegistrationStatus::Cancelled);
        assert_eq!(stored.cancellation_reason(), Some("Family is moving"));
    }

    #[tokio::test]
    async fn hard_cancel_removes_the_row() {
        let fixture = Fixture::new();
        let id = booked(&fixture, Weekday::Wednesday, "14:00").await;

        let info = expect_cancelled(
            handler(&fixture)
                .with_mode(CancellationMode::Hard)
                .handle(command(&id, false), test_metadata())
                .await
                .unwrap(),
        );

        assert!(info.hard_deleted);
        assert!(fixture.registrations.find_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn audits_cancellation_with_command_context() {
        let fixture = Fixture::new();
        let id = booked(&fixture, Weekday::Wednesday, "14:00").await;

        handler(&fixture)
            .handle(command(&id, false), test_metadata())
            .await
            .unwrap();

        let audits = fixture.side_channel.audits();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].event_type, "registration.cancelled.v1");
        assert_eq!(audits[0].metadata.correlation_id.as_deref(), Some("test-correlation"));
        let event: RegistrationCancelled = audits[0].payload_as().unwrap();
        assert_eq!(event.fee_cents, 2500);
        assert_eq!(event.cancelled_by.as_str(), "admin-1");
        assert!(!event.hard_delete);
    }

    #[tokio::test]
    async fn notifies_family_and_instructor() {
        let fixture = Fixture::new();
        let id = booked(&fixture, Weekday::Wednesday, "14:00").await;

        handler(&fixture)
            .handle(command(&id, false), test_metadata())
            .await
            .unwrap();

        let emails = fixture.side_channel.emails();
        let mut recipients: Vec<&str> = emails.iter().map(|e| e.to.as_str()).collect();
        recipients.sort();
        assert_eq!(
            recipients,
            vec!["ada@example.com", "clara@example.com", "grace@example.com"]
        );
        assert!(emails[0].html.contains("$25.00"));
    }

    #[tokio::test]
    async fn missing_student_skips_notices_but_still_cancels() {
        let fixture = Fixture::new();
        let registration = private("S9", "I1", slot(Weekday::Wednesday, "14:00", 30), None);
        fixture.registrations.insert(&registration).await.unwrap();

        let result = handler(&fixture)
            .handle(command(&registration.key(), false), test_metadata())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(fixture.side_channel.emails().is_empty());
        assert_eq!(fixture.side_channel.audits().len(), 1);
    }

    #[tokio::test]
    async fn cancelling_one_term_leaves_the_next_term_booked() {
        let fixture = Fixture::new();
        let fall = booked(&fixture, Weekday::Wednesday, "14:00").await;
        let winter = private_in(
            "S1",
            "I1",
            slot(Weekday::Wednesday, "14:00", 30),
            None,
            Partition::new(fall_2024().school_year, Trimester::Winter),
        );
        fixture.registrations.insert(&winter).await.unwrap();

        handler(&fixture)
            .handle(command(&fall, false), test_metadata())
            .await
            .unwrap();

        let fall_row = fixture.registrations.find_by_id(&fall).await.unwrap().unwrap();
        assert_eq!(fall_row.status(), RegistrationStatus::Cancelled);
        let winter_row = fixture
            .registrations
            .find_by_id(&winter.key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(winter_row.status(), RegistrationStatus::Approved);
        assert!(winter_row.cancelled_at().is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn fails_when_registration_not_found() {
        let fixture = Fixture::new();
        let id = RegistrationKey::new(
            fall_2024(),
            RegistrationId::new("S1_I1_Monday_14:00").unwrap(),
        );

        let result = handler(&fixture).handle(command(&id, false), test_metadata()).await;

        assert!(matches!(
            result,
            Err(RegistrationError::NotFound { entity: EntityKind::Registration, .. })
        ));
        assert!(fixture.side_channel.is_empty());
    }

    #[tokio::test]
    async fn fails_when_already_cancelled() {
        let fixture = Fixture::new();
        let id = booked(&fixture, Weekday::Wednesday, "14:00").await;
        let handler = handler(&fixture);
        handler.handle(command(&id, false), test_metadata()).await.unwrap();

        let result = handler.handle(command(&id, false), test_metadata()).await;

        assert!(matches!(result, Err(RegistrationError::CannotCancel { .. })));
    }
}
