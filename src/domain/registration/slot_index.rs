//! In-memory index of active bookings for sub-linear conflict checks.
//!
//! Bookings are keyed by [`RegistrationKey`] and bucketed into lanes keyed
//! by partition, resource and day. Each lane is ordered by start minute, so
//! a query only walks the starts that could reach into the candidate's
//! interval.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::aggregate::Registration;
use super::conflict::{conflicts_between, ConflictReport};
use super::key::RegistrationKey;
use super::values::{LessonLength, Partition, Weekday};
use crate::domain::foundation::{InstructorId, RoomId, StudentId};

/// Longest lesson offered; bounds how far back a lane scan must look.
const MAX_LESSON_MINUTES: u16 = LessonLength::Sixty.minutes();

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Resource {
    Instructor(InstructorId),
    Room(RoomId),
    Student(StudentId),
}

type LaneKey = (Partition, Resource, Weekday);
type Lane = BTreeMap<u16, Vec<RegistrationKey>>;

/// Index of active registrations.
#[derive(Debug, Clone, Default)]
pub struct SlotIndex {
    entries: HashMap<RegistrationKey, Registration>,
    lanes: HashMap<LaneKey, Lane>,
}

impl SlotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a full listing; inactive registrations are skipped.
    pub fn rebuild<'a>(registrations: impl IntoIterator<Item = &'a Registration>) -> Self {
        let mut index = Self::new();
        for registration in registrations {
            index.insert(registration);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &RegistrationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &RegistrationKey) -> Option<&Registration> {
        self.entries.get(key)
    }

    /// Active registrations in a partition, in no particular order.
    pub fn active_in(&self, partition: Partition) -> impl Iterator<Item = &Registration> {
        self.entries
            .values()
            .filter(move |r| r.partition() == partition)
    }

    /// Adds or replaces a registration. Inactive registrations are removed
    /// rather than indexed.
    pub fn insert(&mut self, registration: &Registration) {
        let key = registration.key();
        self.remove(&key);
        if !registration.is_active() {
            return;
        }

        if let Some(slot) = registration.slot() {
            for resource in resources_of(registration) {
                self.lanes
                    .entry((registration.partition(), resource, slot.day))
                    .or_default()
                    .entry(slot.start_minutes())
                    .or_default()
                    .push(key.clone());
            }
        }
        self.entries.insert(key, registration.clone());
    }

    /// Drops a registration from the index.
    pub fn remove(&mut self, key: &RegistrationKey) -> Option<Registration> {
        let removed = self.entries.remove(key)?;
        if let Some(slot) = removed.slot() {
            for resource in resources_of(&removed) {
                let lane_key = (removed.partition(), resource, slot.day);
                let Some(lane) = self.lanes.get_mut(&lane_key) else {
                    continue;
                };
                if let Some(keys) = lane.get_mut(&slot.start_minutes()) {
                    keys.retain(|existing| existing != key);
                    if keys.is_empty() {
                        lane.remove(&slot.start_minutes());
                    }
                }
                if lane.is_empty() {
                    self.lanes.remove(&lane_key);
                }
            }
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lanes.clear();
    }

    /// Every conflict between the candidate and the indexed registrations.
    ///
    /// Produces the same conflicts as a linear scan over the same
    /// registrations, possibly in a different order.
    pub fn find_conflicts(&self, candidate: &Registration) -> ConflictReport {
        let mut touched: BTreeSet<&RegistrationKey> = BTreeSet::new();

        if let Some((key, _)) = self.entries.get_key_value(&candidate.key()) {
            touched.insert(key);
        }

        if let Some(slot) = candidate.slot() {
            let start = slot.start_minutes();
            let end = slot.end_minutes();
            for resource in resources_of(candidate) {
                let Some(lane) = self.lanes.get(&(candidate.partition(), resource, slot.day)) else {
                    continue;
                };
                for (&other_start, keys) in lane.range(..end).rev() {
                    if other_start + MAX_LESSON_MINUTES <= start {
                        break;
                    }
                    touched.extend(keys.iter());
                }
            }
        }

        ConflictReport::new(
            touched
                .into_iter()
                .filter_map(|key| self.entries.get(key))
                .flat_map(|existing| conflicts_between(candidate, existing))
                .collect(),
        )
    }
}

fn resources_of(registration: &Registration) -> Vec<Resource> {
    let mut resources = vec![Resource::Student(registration.student_id().clone())];
    if let Some(instructor) = registration.instructor_id() {
        resources.push(Resource::Instructor(instructor.clone()));
    }
    if let Some(room) = registration.room_id() {
        resources.push(Resource::Room(room.clone()));
    }
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::registration::conflict::test_support::*;
    use crate::domain::registration::conflict::{check_conflicts, Conflict, ConflictKind};
    use crate::domain::registration::{Slot, SlotTime, Trimester};
    use proptest::prelude::*;

    fn sorted(conflicts: &[Conflict]) -> Vec<(String, ConflictKind)> {
        let mut out: Vec<_> = conflicts
            .iter()
            .map(|c| (c.existing_id.to_string(), c.kind))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn finds_overlap_in_instructor_lane() {
        let existing = private("S2", "I1", slot(Weekday::Monday, "13:30", 60), None);
        let index = SlotIndex::rebuild([&existing]);

        let candidate = private("S1", "I1", slot(Weekday::Monday, "14:15", 15), None);
        let report = index.find_conflicts(&candidate);
        assert_eq!(report.conflicts().len(), 1);
        assert_eq!(report.conflicts()[0].kind, ConflictKind::Instructor);
    }

    #[test]
    fn remove_frees_the_slot() {
        let existing = private("S2", "I1", slot(Weekday::Monday, "14:00", 30), Some("R1"));
        let mut index = SlotIndex::rebuild([&existing]);
        let candidate = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), Some("R1"));
        assert!(index.find_conflicts(&candidate).has_conflicts());

        assert!(index.remove(&existing.key()).is_some());
        assert!(index.is_empty());
        assert!(!index.find_conflicts(&candidate).has_conflicts());
        assert!(index.lanes.is_empty());
    }

    #[test]
    fn inactive_registrations_are_not_indexed() {
        let mut existing = private("S2", "I1", slot(Weekday::Monday, "14:00", 30), None);
        let mut index = SlotIndex::rebuild([&existing]);
        assert_eq!(index.len(), 1);

        existing.cancel("withdrew", Timestamp::now()).unwrap();
        index.insert(&existing);
        assert!(index.is_empty());
    }

    #[test]
    fn duplicate_detected_without_slot_overlap_scan() {
        let existing = private("S1", "I1", slot(Weekday::Friday, "08:00", 15), None);
        let index = SlotIndex::rebuild([&existing]);
        let report = index.find_conflicts(&existing);
        assert_eq!(
            sorted(report.conflicts()),
            vec![(existing.id().to_string(), ConflictKind::Duplicate)]
        );
    }

    #[test]
    fn partitions_are_separate_lanes() {
        let existing = private("S2", "I1", slot(Weekday::Monday, "14:00", 30), None);
        let index = SlotIndex::rebuild([&existing]);
        let spring = Partition::new(fall_2024().school_year, Trimester::Spring);
        let candidate = private_in("S1", "I1", slot(Weekday::Monday, "14:00", 30), None, spring);
        assert!(!index.find_conflicts(&candidate).has_conflicts());
        assert_eq!(index.active_in(fall_2024()).count(), 1);
        assert_eq!(index.active_in(spring).count(), 0);
    }

    #[test]
    fn same_id_in_another_term_is_a_separate_entry() {
        let fall = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), None);
        let winter_partition = Partition::new(fall_2024().school_year, Trimester::Winter);
        let winter = private_in("S1", "I1", slot(Weekday::Monday, "14:00", 30), None, winter_partition);
        assert_eq!(fall.id(), winter.id());

        let mut index = SlotIndex::rebuild([&fall]);
        assert!(!index.find_conflicts(&winter).has_conflicts());

        index.insert(&winter);
        assert_eq!(index.len(), 2);
        assert!(index.contains(&fall.key()));
        assert!(index.contains(&winter.key()));

        index.remove(&fall.key());
        assert_eq!(index.get(&winter.key()).map(|r| r.partition()), Some(winter_partition));
        assert_eq!(
            sorted(index.find_conflicts(&winter).conflicts()),
            vec![(winter.id().to_string(), ConflictKind::Duplicate)]
        );
    }

    fn arb_registration() -> impl Strategy<Value = Registration> {
        (
            0..4u8,
            0..3u8,
            prop::sample::select(vec![Weekday::Monday, Weekday::Tuesday]),
            (14..17u16, prop::sample::select(vec![0u16, 15, 30, 45])),
            prop::sample::select(LessonLength::ALLOWED_MINUTES.to_vec()),
            prop::option::of(0..2u8),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(s, i, day, (hour, minute), length, room, is_group, cancelled)| {
                let slot = Slot::new(
                    day,
                    SlotTime::new(hour, minute).unwrap(),
                    LessonLength::try_from(length).unwrap(),
                );
                let room = room.map(|r| format!("R{}", r));
                let student = format!("S{}", s);
                let instructor = format!("I{}", i);
                let mut registration = if is_group {
                    group(&student, &format!("C{}", i), &instructor, slot, room.as_deref())
                } else {
                    private(&student, &instructor, slot, room.as_deref())
                };
                if cancelled {
                    registration.cancel("test", Timestamp::now()).unwrap();
                }
                registration
            })
    }

    proptest! {
        #[test]
        fn index_matches_linear_scan(
            existing in prop::collection::vec(arb_registration(), 0..24),
            candidate in arb_registration(),
        ) {
            // Keys are unique in storage; keep the last write for each key.
            let mut by_key: HashMap<RegistrationKey, Registration> = HashMap::new();
            for registration in existing {
                by_key.insert(registration.key(), registration);
            }
            let stored: Vec<&Registration> = by_key.values().collect();

            let index = SlotIndex::rebuild(stored.iter().copied());
            let linear = check_conflicts(&candidate, stored.iter().copied());
            let indexed = index.find_conflicts(&candidate);

            prop_assert_eq!(sorted(indexed.conflicts()), sorted(linear.conflicts()));
        }
    }
}
