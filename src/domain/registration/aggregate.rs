//! Registration aggregate.
//!
//! A registration books a student into a recurring weekly slot, either a
//! private lesson with an instructor or a seat in a group class.
//!
//! # Invariants
//!
//! - `id` is a pure function of the identity fields (see [`derive_registration_id`])
//! - PRIVATE registrations always carry instructor, instrument, slot, transportation
//! - GROUP registrations always carry a class
//! - `registered_by` / `registered_at` are set once at creation and never change
//!
//! [`derive_registration_id`]: super::derive_registration_id

use serde::{Deserialize, Serialize};

use super::conflict::derive_registration_id;
use super::errors::RegistrationError;
use super::key::RegistrationKey;
use super::request::{present, RegistrationRequest};
use super::status::RegistrationStatus;
use super::validation::validate;
use super::values::{
    LessonLength, Partition, RegistrationType, SchoolYear, Slot, SlotTime, TransportationType,
    Trimester, Weekday,
};
use crate::domain::foundation::{
    ClassId, EntityKind, InstructorId, RegistrationId, RoomId, StateMachine, StorageRow,
    StoredEntity, StudentId, Timestamp, UserId, ValidationError,
};
use crate::domain::people::LessonClass;

/// A validated, typed registration proposal that has not been assigned an
/// identity or audit stamps yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub student_id: StudentId,
    pub registration_type: RegistrationType,
    pub class_id: Option<ClassId>,
    pub instructor_id: Option<InstructorId>,
    pub slot: Option<Slot>,
    pub room_id: Option<RoomId>,
    pub instrument: Option<String>,
    pub transportation_type: Option<TransportationType>,
    pub notes: Option<String>,
    pub partition: Partition,
}

impl NewRegistration {
    /// Validates and parses an API payload.
    ///
    /// # Errors
    ///
    /// - `Validation` carrying every problem found in the payload
    pub fn from_request(request: &RegistrationRequest) -> Result<Self, RegistrationError> {
        let report = validate(request);
        if !report.is_valid() {
            return Err(RegistrationError::validation(report.into_errors()));
        }
        Self::parse_validated(request).map_err(|e| RegistrationError::validation(vec![e.to_string()]))
    }

    fn parse_validated(request: &RegistrationRequest) -> Result<Self, ValidationError> {
        let registration_type: RegistrationType = required(&request.registration_type, "registrationType")?.parse()?;
        let partition = Partition::new(
            SchoolYear::parse(required(&request.school_year, "schoolYear")?)?,
            required(&request.trimester, "trimester")?.parse::<Trimester>()?,
        );

        let slot = match registration_type {
            RegistrationType::Private => {
                let day: Weekday = required(&request.day, "day")?.parse()?;
                let start = SlotTime::parse(required(&request.start_time, "startTime")?)?;
                let length = LessonLength::try_from(
                    request.length.ok_or_else(|| ValidationError::empty_field("length"))?,
                )?;
                Some(Slot::new(day, start, length))
            }
            // Group slots come from the class.
            RegistrationType::Group => None,
        };

        let transportation_type = match present(&request.transportation_type) {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };

        Ok(Self {
            student_id: StudentId::new(required(&request.student_id, "studentId")?)?,
            registration_type,
            class_id: present(&request.class_id).map(ClassId::new).transpose()?,
            instructor_id: present(&request.instructor_id).map(InstructorId::new).transpose()?,
            slot,
            room_id: present(&request.room_id).map(RoomId::new).transpose()?,
            instrument: present(&request.instrument).map(str::to_string),
            transportation_type,
            notes: present(&request.notes).map(str::to_string),
            partition,
        })
    }

    /// Copies the class's instructor, slot, and room onto a group proposal.
    ///
    /// Seats meet in their class's room, which is what lets classmates skip
    /// the room check against each other. A requested room may only repeat it.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` on `roomId` if the request names a different room
    pub fn inherit_class(&mut self, class: &LessonClass) -> Result<(), ValidationError> {
        if let Some(requested) = &self.room_id {
            if class.room_id.as_ref() != Some(requested) {
                return Err(ValidationError::invalid_format(
                    "roomId",
                    format!("class {} does not meet in room {}", class.id, requested),
                ));
            }
        }
        self.instructor_id = Some(class.instructor_id.clone());
        self.slot = class.slot;
        self.room_id = class.room_id.clone();
        if self.instrument.is_none() {
            self.instrument = class.instrument.clone();
        }
        Ok(())
    }

    /// Derives the deterministic identity of this proposal.
    pub fn derive_id(&self) -> Result<RegistrationId, ValidationError> {
        derive_registration_id(
            self.registration_type,
            &self.student_id,
            self.class_id.as_ref(),
            self.instructor_id.as_ref(),
            self.slot.as_ref(),
        )
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ValidationError> {
    present(value).ok_or_else(|| ValidationError::empty_field(field))
}

/// Registration aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    id: RegistrationId,
    student_id: StudentId,
    registration_type: RegistrationType,
    class_id: Option<ClassId>,
    instructor_id: Option<InstructorId>,
    slot: Option<Slot>,
    room_id: Option<RoomId>,
    instrument: Option<String>,
    transportation_type: Option<TransportationType>,
    notes: Option<String>,
    partition: Partition,
    status: RegistrationStatus,
    registered_by: UserId,
    registered_at: Timestamp,
    cancelled_at: Option<Timestamp>,
    cancellation_reason: Option<String>,
}

impl Registration {
    /// Creates a registration from a proposal, deriving its id and stamping
    /// the audit fields.
    ///
    /// # Errors
    ///
    /// - `Validation` if the identity fields required for the id are missing
    pub fn create(
        new: NewRegistration,
        status: RegistrationStatus,
        registered_by: UserId,
        registered_at: Timestamp,
    ) -> Result<Self, RegistrationError> {
        let id = new
            .derive_id()
            .map_err(|e| RegistrationError::validation(vec![e.to_string()]))?;

        Ok(Self {
            id,
            student_id: new.student_id,
            registration_type: new.registration_type,
            class_id: new.class_id,
            instructor_id: new.instructor_id,
            slot: new.slot,
            room_id: new.room_id,
            instrument: new.instrument,
            transportation_type: new.transportation_type,
            notes: new.notes,
            partition: new.partition,
            status,
            registered_by,
            registered_at,
            cancelled_at: None,
            cancellation_reason: None,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &RegistrationId {
        &self.id
    }

    /// The id qualified by partition; unique across the whole store.
    pub fn key(&self) -> RegistrationKey {
        RegistrationKey::new(self.partition, self.id.clone())
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn registration_type(&self) -> RegistrationType {
        self.registration_type
    }

    pub fn class_id(&self) -> Option<&ClassId> {
        self.class_id.as_ref()
    }

    pub fn instructor_id(&self) -> Option<&InstructorId> {
        self.instructor_id.as_ref()
    }

    pub fn slot(&self) -> Option<&Slot> {
        self.slot.as_ref()
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn transportation_type(&self) -> Option<TransportationType> {
        self.transportation_type
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    /// Derived from status: pending and approved registrations hold their slot.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn registered_by(&self) -> &UserId {
        &self.registered_by
    }

    pub fn registered_at(&self) -> &Timestamp {
        &self.registered_at
    }

    pub fn cancelled_at(&self) -> Option<&Timestamp> {
        self.cancelled_at.as_ref()
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Re-derives the id from the current identity fields.
    pub fn derived_id(&self) -> Result<RegistrationId, ValidationError> {
        derive_registration_id(
            self.registration_type,
            &self.student_id,
            self.class_id.as_ref(),
            self.instructor_id.as_ref(),
            self.slot.as_ref(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Moves the registration to a new status, returning the previous one.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the lifecycle does not allow the move
    pub fn update_status(
        &mut self,
        target: RegistrationStatus,
    ) -> Result<RegistrationStatus, RegistrationError> {
        let next = self
            .status
            .transition_to(target)
            .map_err(|_| RegistrationError::InvalidTransition {
                from: self.status,
                to: target,
            })?;
        Ok(std::mem::replace(&mut self.status, next))
    }

    /// Soft-cancels the registration, recording why and when.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        at: Timestamp,
    ) -> Result<(), RegistrationError> {
        self.update_status(RegistrationStatus::Cancelled)?;
        self.cancelled_at = Some(at);
        self.cancellation_reason = Some(reason.into());
        Ok(())
    }
}

impl StoredEntity for Registration {
    type Key = RegistrationKey;
    const KIND: EntityKind = EntityKind::Registration;

    fn key(&self) -> RegistrationKey {
        Registration::key(self)
    }

    fn row_key(row: &StorageRow) -> Result<String, ValidationError> {
        Ok(RegistrationKey::from_row(row)?.to_string())
    }

    fn is_active(&self) -> bool {
        self.status.is_active()
    }

    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError> {
        let day: Option<Weekday> = row.parse_opt("day")?;
        let start: Option<SlotTime> = row.parse_opt("startTime")?;
        let length: Option<LessonLength> = row.parse_opt("length")?;
        let slot = match (day, start, length) {
            (Some(day), Some(start), Some(length)) => Some(Slot::new(day, start, length)),
            _ => None,
        };

        let registered_at = match row.optional("registeredAt") {
            Some(raw) => Timestamp::parse_rfc3339(raw).ok_or_else(|| {
                ValidationError::invalid_format("registeredAt", "expected RFC 3339 timestamp")
            })?,
            None => return Err(ValidationError::empty_field("registeredAt")),
        };
        let cancelled_at = row.optional("cancelledAt").and_then(Timestamp::parse_rfc3339);

        Ok(Self {
            id: RegistrationId::new(row.required("id")?)?,
            student_id: StudentId::new(row.required("studentId")?)?,
            registration_type: row.parse("registrationType")?,
            class_id: row.parse_opt("classId")?,
            instructor_id: row.parse_opt("instructorId")?,
            slot,
            room_id: row.parse_opt("roomId")?,
            instrument: row.optional("instrument").map(str::to_string),
            transportation_type: row.parse_opt("transportationType")?,
            notes: row.optional("notes").map(str::to_string),
            partition: Partition::new(row.parse("schoolYear")?, row.parse("trimester")?),
            status: row.parse_opt("status")?.unwrap_or(RegistrationStatus::Approved),
            registered_by: UserId::new(row.optional("registeredBy").unwrap_or("system"))?,
            registered_at,
            cancelled_at,
            cancellation_reason: row.optional("cancellationReason").map(str::to_string),
        })
    }

    fn to_storage_row(&self) -> StorageRow {
        let mut row = StorageRow::new()
            .with("id", self.id.as_str())
            .with("studentId", self.student_id.as_str())
            .with("registrationType", self.registration_type.as_str())
            .with("schoolYear", self.partition.school_year.to_string())
            .with("trimester", self.partition.trimester.as_str())
            .with("status", self.status.as_str())
            .with("registeredBy", self.registered_by.as_str())
            .with("registeredAt", self.registered_at.to_rfc3339());
        row.set_opt("classId", self.class_id.as_ref().map(|c| c.to_string()));
        row.set_opt("instructorId", self.instructor_id.as_ref().map(|i| i.to_string()));
        row.set_opt("roomId", self.room_id.as_ref().map(|r| r.to_string()));
        row.set_opt("instrument", self.instrument.clone());
        row.set_opt("transportationType", self.transportation_type.map(|t| t.as_str()));
        row.set_opt("notes", self.notes.clone());
        row.set_opt("cancelledAt", self.cancelled_at.map(|t| t.to_rfc3339()));
        row.set_opt("cancellationReason", self.cancellation_reason.clone());
        if let Some(slot) = &self.slot {
            row.set("day", slot.day.as_str());
            row.set("startTime", slot.start_time.to_string());
            row.set("length", slot.length.to_string());
        }
        row
    }
}
