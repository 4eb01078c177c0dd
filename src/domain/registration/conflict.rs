//! Identity derivation and scheduling conflict detection.
//!
//! Two registrations conflict when they share a partition, the existing one
//! is still active, their slots overlap, and they compete for the same
//! instructor, room, or student. Identical ids are reported as a duplicate
//! and nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::aggregate::Registration;
use super::values::{RegistrationType, Slot};
use crate::domain::foundation::{ClassId, InstructorId, RegistrationId, StudentId, ValidationError};

/// Derives the deterministic id of a registration.
///
/// - GROUP: `{studentId}_{classId}`
/// - PRIVATE: `{studentId}_{instructorId}_{Day}_{HH:MM}`
///
/// # Errors
///
/// - `EmptyField` if a component of the id is missing
pub fn derive_registration_id(
    registration_type: RegistrationType,
    student_id: &StudentId,
    class_id: Option<&ClassId>,
    instructor_id: Option<&InstructorId>,
    slot: Option<&Slot>,
) -> Result<RegistrationId, ValidationError> {
    let raw = match registration_type {
        RegistrationType::Group => {
            let class_id = class_id.ok_or_else(|| ValidationError::empty_field("classId"))?;
            format!("{}_{}", student_id, class_id)
        }
        RegistrationType::Private => {
            let instructor_id =
                instructor_id.ok_or_else(|| ValidationError::empty_field("instructorId"))?;
            let slot = slot.ok_or_else(|| ValidationError::empty_field("startTime"))?;
            format!("{}_{}_{}_{}", student_id, instructor_id, slot.day, slot.start_time)
        }
    };
    RegistrationId::new(raw)
}

/// What a conflict collides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Duplicate,
    Instructor,
    Room,
    Student,
}

impl ConflictKind {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ConflictKind::Duplicate)
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictKind::Duplicate => "duplicate",
            ConflictKind::Instructor => "instructor",
            ConflictKind::Room => "room",
            ConflictKind::Student => "student",
        };
        write!(f, "{}", s)
    }
}

/// A single collision between a candidate and an existing registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub kind: ConflictKind,
    pub existing_id: RegistrationId,
    pub message: String,
}

impl Conflict {
    /// The candidate is already booked as `existing`.
    pub fn duplicate(existing: &Registration) -> Self {
        Self {
            kind: ConflictKind::Duplicate,
            existing_id: existing.id().clone(),
            message: format!("Duplicate registration: {} already exists", existing.id()),
        }
    }
}

/// Every conflict found for a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn new(conflicts: Vec<Conflict>) -> Self {
        Self { conflicts }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn into_conflicts(self) -> Vec<Conflict> {
        self.conflicts
    }

    pub fn messages(&self) -> Vec<&str> {
        self.conflicts.iter().map(|c| c.message.as_str()).collect()
    }
}

/// Conflicts between a candidate and one existing registration.
pub fn conflicts_between(candidate: &Registration, existing: &Registration) -> Vec<Conflict> {
    if !existing.is_active() || existing.partition() != candidate.partition() {
        return Vec::new();
    }

    if existing.id() == candidate.id() {
        return vec![Conflict::duplicate(existing)];
    }

    let (Some(slot), Some(other)) = (candidate.slot(), existing.slot()) else {
        return Vec::new();
    };
    if !slot.overlaps(other) {
        return Vec::new();
    }

    // Seats in the same class share the class's instructor and room.
    let same_class = candidate.registration_type() == RegistrationType::Group
        && existing.registration_type() == RegistrationType::Group
        && candidate.class_id().is_some()
        && candidate.class_id() == existing.class_id();

    let mut conflicts = Vec::new();

    if !same_class {
        if let (Some(a), Some(b)) = (candidate.instructor_id(), existing.instructor_id()) {
            if a == b {
                conflicts.push(Conflict {
                    kind: ConflictKind::Instructor,
                    existing_id: existing.id().clone(),
                    message: format!(
                        "Instructor double-booked: {} already teaches {} ({})",
                        a,
                        existing.id(),
                        other
                    ),
                });
            }
        }
        if let (Some(a), Some(b)) = (candidate.room_id(), existing.room_id()) {
            if a == b {
                conflicts.push(Conflict {
                    kind: ConflictKind::Room,
                    existing_id: existing.id().clone(),
                    message: format!(
                        "Room double-booked: {} is taken by {} ({})",
                        a,
                        existing.id(),
                        other
                    ),
                });
            }
        }
    }

    if candidate.student_id() == existing.student_id() {
        conflicts.push(Conflict {
            kind: ConflictKind::Student,
            existing_id: existing.id().clone(),
            message: format!(
                "Student double-booked: {} is already in {} ({})",
                candidate.student_id(),
                existing.id(),
                other
            ),
        });
    }

    conflicts
}

/// Linear scan of every existing registration.
pub fn check_conflicts<'a>(
    candidate: &Registration,
    existing: impl IntoIterator<Item = &'a Registration>,
) -> ConflictReport {
    ConflictReport::new(
        existing
            .into_iter()
            .flat_map(|other| conflicts_between(candidate, other))
            .collect(),
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::foundation::{StoredEntity, Timestamp};
    use crate::domain::registration::{
        LessonLength, Partition, SchoolYear, SlotTime, Trimester, Weekday,
    };
    use proptest::prelude::*;

    fn kinds(conflicts: &[Conflict]) -> Vec<ConflictKind> {
        let mut kinds: Vec<_> = conflicts.iter().map(|c| c.kind).collect();
        kinds.sort();
        kinds
    }

    #[test]
    fn overlapping_instructor_is_a_conflict() {
        let existing = private("S2", "I1", slot(Weekday::Monday, "14:00", 30), None);
        let candidate = private("S1", "I1", slot(Weekday::Monday, "14:15", 30), None);

        let report = check_conflicts(&candidate, [&existing]);
        assert!(report.has_conflicts());
        assert_eq!(kinds(report.conflicts()), vec![ConflictKind::Instructor]);
        assert!(report.conflicts()[0].message.starts_with("Instructor double-booked:"));
        assert_eq!(report.conflicts()[0].existing_id, *existing.id());
    }

    #[test]
    fn touching_slots_do_not_conflict() {
        let existing = private("S2", "I1", slot(Weekday::Monday, "14:00", 30), Some("R1"));
        let candidate = private("S1", "I1", slot(Weekday::Monday, "14:30", 30), Some("R1"));
        assert!(!check_conflicts(&candidate, [&existing]).has_conflicts());
    }

    #[test]
    fn reports_every_collision_with_one_registration() {
        let existing = private("S1", "I1", slot(Weekday::Tuesday, "10:00", 60), Some("R1"));
        let candidate = private("S1", "I1", slot(Weekday::Tuesday, "10:30", 30), Some("R1"));

        let report = check_conflicts(&candidate, [&existing]);
        assert_eq!(
            kinds(report.conflicts()),
            vec![ConflictKind::Instructor, ConflictKind::Room, ConflictKind::Student]
        );
    }

    #[test]
    fn room_only_counts_when_both_sides_have_one() {
        let existing = private("S2", "I2", slot(Weekday::Monday, "14:00", 30), None);
        let candidate = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), Some("R1"));
        assert!(!check_conflicts(&candidate, [&existing]).has_conflicts());

        let existing = private("S2", "I2", slot(Weekday::Monday, "14:00", 30), Some("R1"));
        let report = check_conflicts(&candidate, [&existing]);
        assert_eq!(kinds(report.conflicts()), vec![ConflictKind::Room]);
        assert!(report.messages()[0].starts_with("Room double-booked:"));
    }

    #[test]
    fn duplicate_id_is_reported_alone() {
        let existing = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), Some("R1"));
        let candidate = private("S1", "I1", slot(Weekday::Monday, "14:00", 45), Some("R1"));

        let report = check_conflicts(&candidate, [&existing]);
        assert_eq!(kinds(report.conflicts()), vec![ConflictKind::Duplicate]);
        assert!(report.conflicts()[0].kind.is_duplicate());
    }

    #[test]
    fn other_partitions_and_inactive_registrations_are_ignored() {
        let winter = Partition::new(SchoolYear::starting(2024), Trimester::Winter);
        let other_term = private_in("S2", "I1", slot(Weekday::Monday, "14:00", 30), None, winter);
        let mut cancelled = private("S3", "I1", slot(Weekday::Monday, "14:00", 30), None);
        cancelled.cancel("withdrew", Timestamp::now()).unwrap();

        let candidate = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), None);
        assert!(!check_conflicts(&candidate, [&other_term, &cancelled]).has_conflicts());
    }

    #[test]
    fn classmates_do_not_conflict_on_shared_instructor_or_room() {
        let class_slot = slot(Weekday::Thursday, "15:00", 45);
        let existing = group("S2", "C1", "I1", class_slot, Some("R1"));
        let candidate = group("S1", "C1", "I1", class_slot, Some("R1"));
        assert!(!check_conflicts(&candidate, [&existing]).has_conflicts());

        let other_class = group("S3", "C2", "I1", class_slot, Some("R1"));
        let report = check_conflicts(&candidate, [&other_class]);
        assert_eq!(kinds(report.conflicts()), vec![ConflictKind::Instructor, ConflictKind::Room]);
    }

    #[test]
    fn student_cannot_be_in_two_places() {
        let lesson = private("S1", "I1", slot(Weekday::Thursday, "15:15", 30), None);
        let class = group("S1", "C1", "I2", slot(Weekday::Thursday, "15:00", 45), None);
        let report = check_conflicts(&class, [&lesson]);
        assert_eq!(kinds(report.conflicts()), vec![ConflictKind::Student]);
        assert!(report.messages()[0].starts_with("Student double-booked:"));
    }

    #[test]
    fn slotless_registrations_never_overlap() {
        let class = group("S1", "C1", "I1", slot(Weekday::Thursday, "15:00", 45), None);
        let mut row = class.to_storage_row();
        row.set("day", "");
        row.set("startTime", "");
        row.set("length", "");
        let slotless = Registration::from_storage_row(&row).unwrap();
        assert!(slotless.slot().is_none());

        let lesson = private("S1", "I1", slot(Weekday::Thursday, "15:00", 30), None);
        assert!(!check_conflicts(&slotless, [&lesson]).has_conflicts());
    }

    #[test]
    fn derives_canonical_ids() {
        let lesson = private("S1", "I1", slot(Weekday::Wednesday, "9:05", 15), None);
        assert_eq!(lesson.id().as_str(), "S1_I1_Wednesday_09:05");
        let class = group("S1", "C9", "I1", slot(Weekday::Wednesday, "9:05", 15), None);
        assert_eq!(class.id().as_str(), "S1_C9");
    }

    fn weekday() -> impl Strategy<Value = Weekday> {
        prop::sample::select(Weekday::ALL.to_vec())
    }

    fn arb_private() -> impl Strategy<Value = Registration> {
        (
            0..3u8,
            0..3u8,
            weekday(),
            8..18u16,
            prop::sample::select(vec![0u16, 15, 30, 45]),
            0..4usize,
            prop::option::of(0..2u8),
        )
            .prop_map(|(s, i, day, hour, minute, len, room)| {
                let lengths = [15, 30, 45, 60];
                let slot = Slot::new(
                    day,
                    SlotTime::new(hour, minute).unwrap(),
                    LessonLength::try_from(lengths[len]).unwrap(),
                );
                let room = room.map(|r| format!("R{}", r));
                private(&format!("S{}", s), &format!("I{}", i), slot, room.as_deref())
            })
    }

    proptest! {
        #[test]
        fn non_duplicate_conflicts_are_symmetric(a in arb_private(), b in arb_private()) {
            prop_assume!(a.id() != b.id());
            prop_assert_eq!(kinds(&conflicts_between(&a, &b)), kinds(&conflicts_between(&b, &a)));
        }

        #[test]
        fn conflicts_imply_overlap(a in arb_private(), b in arb_private()) {
            let found = conflicts_between(&a, &b);
            if found.iter().any(|c| !c.kind.is_duplicate()) {
                prop_assert!(a.slot().unwrap().overlaps(b.slot().unwrap()));
            }
        }
    }
}
