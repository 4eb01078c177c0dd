//! Roster-based group class.

use serde::{Deserialize, Serialize};

use super::Grade;
use crate::domain::foundation::{
    ClassId, EntityKind, InstructorId, RoomId, StorageRow, StoredEntity, ValidationError,
};
use crate::domain::registration::{LessonLength, Slot, SlotTime, Weekday};

/// A group class taught by one instructor in a recurring weekly slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonClass {
    pub id: ClassId,
    pub title: String,
    pub instructor_id: InstructorId,
    pub instrument: Option<String>,
    pub slot: Option<Slot>,
    pub room_id: Option<RoomId>,
    pub min_grade: Grade,
    pub max_grade: Grade,
    pub capacity: u32,
    pub price_per_lesson_cents: Option<u32>,
    pub is_active: bool,
}

impl LessonClass {
    pub fn new(id: ClassId, title: impl Into<String>, instructor_id: InstructorId, capacity: u32) -> Self {
        Self {
            id,
            title: title.into(),
            instructor_id,
            instrument: None,
            slot: None,
            room_id: None,
            min_grade: Grade::KINDERGARTEN,
            max_grade: Grade::MAX,
            capacity,
            price_per_lesson_cents: None,
            is_active: true,
        }
    }

    pub fn admits_grade(&self, grade: Grade) -> bool {
        self.min_grade <= grade && grade <= self.max_grade
    }
}

impl StoredEntity for LessonClass {
    type Key = ClassId;
    const KIND: EntityKind = EntityKind::Class;

    fn key(&self) -> ClassId {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError> {
        let day: Option<Weekday> = row.parse_opt("day")?;
        let start: Option<SlotTime> = row.parse_opt("startTime")?;
        let length: Option<LessonLength> = row.parse_opt("length")?;
        let slot = match (day, start, length) {
            (Some(day), Some(start), Some(length)) => Some(Slot::new(day, start, length)),
            (None, None, None) => None,
            _ => {
                return Err(ValidationError::invalid_format(
                    "day",
                    "class slot needs day, startTime and length together",
                ))
            }
        };

        Ok(Self {
            id: ClassId::new(row.required("id")?)?,
            title: row.optional("title").unwrap_or_default().to_string(),
            instructor_id: InstructorId::new(row.required("instructorId")?)?,
            instrument: row.optional("instrument").map(str::to_string),
            slot,
            room_id: row.parse_opt("roomId")?,
            min_grade: row.parse_opt("minGrade")?.unwrap_or(Grade::KINDERGARTEN),
            max_grade: row.parse_opt("maxGrade")?.unwrap_or(Grade::MAX),
            capacity: row.parse_opt("capacity")?.unwrap_or(0),
            price_per_lesson_cents: row.parse_opt("pricePerLessonCents")?,
            is_active: row.flag("isActive", true)?,
        })
    }

    fn to_storage_row(&self) -> StorageRow {
        let mut row = StorageRow::new()
            .with("id", self.id.as_str())
            .with("title", &self.title)
            .with("instructorId", self.instructor_id.as_str())
            .with("minGrade", self.min_grade.to_string())
            .with("maxGrade", self.max_grade.to_string())
            .with("capacity", self.capacity.to_string())
            .with("isActive", self.is_active.to_string());
        row.set_opt("instrument", self.instrument.clone());
        row.set_opt("roomId", self.room_id.as_ref().map(|r| r.to_string()));
        row.set_opt("pricePerLessonCents", self.price_per_lesson_cents.map(|p| p.to_string()));
        if let Some(slot) = &self.slot {
            row.set("day", slot.day.as_str());
            row.set("startTime", slot.start_time.to_string());
            row.set("length", slot.length.to_string());
        }
        row
    }
}
