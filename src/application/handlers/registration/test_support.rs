//! Shared fixtures for the registration handler tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::storage::InMemoryStore;
use crate::adapters::FixedClock;
use crate::application::{SlotLedger, UnitOfWork};
use crate::domain::foundation::{
    AdminId, ClassId, CommandMetadata, DomainError, EventEnvelope, InstructorId, ParentId,
    RoomId, StoredEntity, StudentId, UserId,
};
use crate::domain::people::{Admin, Grade, Instructor, LessonClass, Parent, Room, Student};
use crate::domain::registration::{
    LessonLength, Registration, RegistrationRequest, Slot, SlotTime, Weekday,
};
use crate::ports::{EmailMessage, EntityStore, EntityStores, SideChannel, SideEffect};

// ════════════════════════════════════════════════════════════════════════════
// Mock Implementations
// ════════════════════════════════════════════════════════════════════════════

/// Store wrapper that records every call as `"<table>.<operation>"`.
pub struct RecordingStore<T> {
    inner: InMemoryStore<T>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl<T: StoredEntity> RecordingStore<T> {
    pub fn new(inner: InMemoryStore<T>, calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self { inner, calls }
    }

    fn record(&self, operation: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}.{}", T::KIND.table_name(), operation));
    }
}

#[async_trait]
impl<T: StoredEntity> EntityStore<T> for RecordingStore<T> {
    async fn find_all(&self) -> Result<Vec<T>, DomainError> {
        self.record("find_all");
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: &T::Key) -> Result<Option<T>, DomainError> {
        self.record("find_by_id");
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, entity: &T) -> Result<(), DomainError> {
        self.record("insert");
        self.inner.insert(entity).await
    }

    async fn update(&self, entity: &T) -> Result<(), DomainError> {
        self.record("update");
        self.inner.update(entity).await
    }

    async fn delete(&self, id: &T::Key) -> Result<bool, DomainError> {
        self.record("delete");
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.record("count");
        self.inner.count().await
    }
}

/// Side channel that keeps everything submitted to it.
#[derive(Default)]
pub struct RecordingSideChannel {
    effects: Mutex<Vec<SideEffect>>,
}

impl RecordingSideChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emails(&self) -> Vec<EmailMessage> {
        self.effects
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SideEffect::Notify(message) => Some(message.clone()),
                SideEffect::Audit(_) => None,
            })
            .collect()
    }

    pub fn audits(&self) -> Vec<EventEnvelope> {
        self.effects
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SideEffect::Audit(envelope) => Some(envelope.clone()),
                SideEffect::Notify(_) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl SideChannel for RecordingSideChannel {
    fn submit(&self, effect: SideEffect) {
        self.effects.lock().unwrap().push(effect);
    }

    async fn flush(&self) {}
}

// ════════════════════════════════════════════════════════════════════════════
// Fixture
// ════════════════════════════════════════════════════════════════════════════

/// Seeded tables, a recording side channel, and a clock pinned to
/// Monday 2024-10-07 09:00.
///
/// - `S1` Ada Lovelace, grade 4, parent `P1`
/// - `S2` Alan Turing, grade 5, parent `P1`
/// - `I1` Clara Schumann, piano and violin, $60/hour, has email
/// - `I2` Fanny Mendelssohn, piano, no email
/// - `C1` Junior Strings, taught by `I2`, Tuesday 16:00 for 60 minutes in `R1`,
///   grades 3-6, two seats
pub struct Fixture {
    pub students: InMemoryStore<Student>,
    pub parents: InMemoryStore<Parent>,
    pub instructors: InMemoryStore<Instructor>,
    pub admins: InMemoryStore<Admin>,
    pub classes: InMemoryStore<LessonClass>,
    pub rooms: InMemoryStore<Room>,
    pub registrations: InMemoryStore<Registration>,
    pub side_channel: Arc<RecordingSideChannel>,
    pub clock: Arc<FixedClock>,
    pub ledger: SlotLedger,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut grace = Parent::new(ParentId::new("P1").unwrap(), "Grace", "Hopper");
        grace.email = Some("grace@example.com".into());

        let mut ada = Student::new(StudentId::new("S1").unwrap(), "Ada", "Lovelace");
        ada.grade = Some(Grade::new(4).unwrap());
        ada.birth_date = NaiveDate::from_ymd_opt(2015, 3, 1);
        ada.email = Some("ada@example.com".into());
        ada.parent1_id = Some(ParentId::new("P1").unwrap());

        let mut alan = Student::new(StudentId::new("S2").unwrap(), "Alan", "Turing");
        alan.grade = Some(Grade::new(5).unwrap());
        alan.parent1_id = Some(ParentId::new("P1").unwrap());

        let mut clara = Instructor::new(InstructorId::new("I1").unwrap(), "Clara", "Schumann");
        clara.email = Some("clara@example.com".into());
        clara.instruments = vec!["Piano".into(), "Violin".into()];
        clara.hourly_rate_cents = Some(6000);

        let mut fanny = Instructor::new(InstructorId::new("I2").unwrap(), "Fanny", "Mendelssohn");
        fanny.instruments = vec!["Piano".into(), "Violin".into()];

        let mut strings = LessonClass::new(
            ClassId::new("C1").unwrap(),
            "Junior Strings",
            InstructorId::new("I2").unwrap(),
            2,
        );
        strings.instrument = Some("Violin".into());
        strings.slot = Some(slot(Weekday::Tuesday, "16:00", 60));
        strings.room_id = Some(RoomId::new("R1").unwrap());
        strings.min_grade = Grade::new(3).unwrap();
        strings.max_grade = Grade::new(6).unwrap();
        strings.price_per_lesson_cents = Some(1500);

        Self {
            students: InMemoryStore::with_entities([ada, alan]),
            parents: InMemoryStore::with_entities([grace]),
            instructors: InMemoryStore::with_entities([clara, fanny]),
            admins: InMemoryStore::with_entities([Admin::new(
                AdminId::new("A1").unwrap(),
                "office@example.com",
            )]),
            classes: InMemoryStore::with_entities([strings]),
            rooms: InMemoryStore::with_entities([Room::new(RoomId::new("R1").unwrap(), "Studio A")]),
            registrations: InMemoryStore::new(),
            side_channel: Arc::new(RecordingSideChannel::new()),
            clock: Arc::new(FixedClock::at(monday_morning())),
            ledger: SlotLedger::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recording wrappers over the fixture's tables.
    pub fn stores(&self) -> EntityStores {
        EntityStores {
            students: Arc::new(RecordingStore::new(self.students.clone(), self.calls.clone())),
            parents: Arc::new(RecordingStore::new(self.parents.clone(), self.calls.clone())),
            instructors: Arc::new(RecordingStore::new(self.instructors.clone(), self.calls.clone())),
            admins: Arc::new(RecordingStore::new(self.admins.clone(), self.calls.clone())),
            classes: Arc::new(RecordingStore::new(self.classes.clone(), self.calls.clone())),
            rooms: Arc::new(RecordingStore::new(self.rooms.clone(), self.calls.clone())),
            registrations: Arc::new(RecordingStore::new(
                self.registrations.clone(),
                self.calls.clone(),
            )),
        }
    }

    pub fn unit_of_work(&self) -> Arc<UnitOfWork> {
        Arc::new(UnitOfWork::new(
            self.stores(),
            self.ledger.clone(),
            Duration::from_secs(60),
        ))
    }

    pub fn store_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Test Helpers
// ════════════════════════════════════════════════════════════════════════════

pub fn monday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, 7)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub fn slot(day: Weekday, start: &str, minutes: u32) -> Slot {
    Slot::new(
        day,
        SlotTime::parse(start).unwrap(),
        LessonLength::try_from(minutes).unwrap(),
    )
}

pub fn test_metadata() -> CommandMetadata {
    CommandMetadata::new(UserId::new("admin-1").unwrap()).with_correlation_id("test-correlation")
}

pub fn private_request(
    student: &str,
    instructor: &str,
    day: &str,
    start: &str,
    length: u32,
) -> RegistrationRequest {
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

pub fn group_request(student: &str, class: &str) -> RegistrationRequest {
    RegistrationRequest {
        student_id: Some(student.into()),
        registration_type: Some("group".into()),
        class_id: Some(class.into()),
        school_year: Some("2024-2025".into()),
        trimester: Some("Fall".into()),
        ..Default::default()
    }
}
