//! Registration domain events.
//!
//! Events handed to the audit side channel:
//! - `RegistrationCreated` - A registration was persisted
//! - `RegistrationCancelled` - A registration was cancelled or deleted
//! - `RegistrationFailed` - A registration attempt was rejected after validation

use serde::{Deserialize, Serialize};

use super::aggregate::Registration;
use super::status::RegistrationStatus;
use super::values::{Partition, RegistrationType};
use crate::domain::foundation::{domain_event, EventId, RegistrationId, StudentId, Timestamp, UserId};

// ════════════════════════════════════════════════════════════════════════════
// RegistrationCreated
// ════════════════════════════════════════════════════════════════════════════

/// Published when a new registration is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCreated {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub student_id: StudentId,
    pub registration_type: RegistrationType,
    pub partition: Partition,
    pub status: RegistrationStatus,
    pub registered_by: UserId,
    pub created_at: Timestamp,
}

impl RegistrationCreated {
    pub fn from_registration(registration: &Registration) -> Self {
        Self {
            event_id: EventId::new(),
            registration_id: registration.id().clone(),
            student_id: registration.student_id().clone(),
            registration_type: registration.registration_type(),
            partition: registration.partition(),
            status: registration.status(),
            registered_by: registration.registered_by().clone(),
            created_at: *registration.registered_at(),
        }
    }
}

domain_event!(
    RegistrationCreated,
    event_type = "registration.created.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = created_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// RegistrationCancelled
// ════════════════════════════════════════════════════════════════════════════

/// Published when a registration is cancelled.
///
/// `hard_delete` records whether the row was removed or only marked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCancelled {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub student_id: StudentId,
    pub reason: String,
    pub refund_eligible: bool,
    pub fee_cents: u32,
    pub hard_delete: bool,
    pub cancelled_by: UserId,
    pub cancelled_at: Timestamp,
}

domain_event!(
    RegistrationCancelled,
    event_type = "registration.cancelled.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = cancelled_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// RegistrationFailed
// ════════════════════════════════════════════════════════════════════════════

/// Published when an attempt passes validation but is rejected later.
///
/// `subject` is the student id from the request, since no registration
/// exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationFailed {
    pub event_id: EventId,
    pub subject: String,
    pub error_code: String,
    pub messages: Vec<String>,
    pub attempted_by: UserId,
    pub failed_at: Timestamp,
}

domain_event!(
    RegistrationFailed,
    event_type = "registration.failed.v1",
    aggregate_id = subject,
    aggregate_type = "Registration",
    occurred_at = failed_at,
    event_id = event_id
);
