//! Derived schedule and cost views of a registration.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::aggregate::Registration;
use super::cancellation::next_occurrence;
use super::values::{RegistrationType, Slot, SlotTime, Weekday};
use crate::domain::people::{Instructor, LessonClass};

/// When a registration meets, in display-ready form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSchedule {
    pub day: Weekday,
    pub start_time: SlotTime,
    pub end_time: String,
    pub length_minutes: u16,
    pub display: String,
    pub next_lesson_at: NaiveDateTime,
}

impl LessonSchedule {
    pub fn for_slot(slot: &Slot, now: NaiveDateTime) -> Self {
        Self {
            day: slot.day,
            start_time: slot.start_time,
            end_time: slot.end_time_label(),
            length_minutes: slot.length.minutes(),
            display: slot.to_string(),
            next_lesson_at: next_occurrence(slot, now),
        }
    }

    pub fn for_registration(registration: &Registration, now: NaiveDateTime) -> Option<Self> {
        registration.slot().map(|slot| Self::for_slot(slot, now))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    HourlyRate,
    ClassPrice,
}

/// Per-lesson price carried for display; billing lives elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCost {
    pub per_lesson_cents: u32,
    pub basis: CostBasis,
}

impl LessonCost {
    /// Hourly rate prorated to the lesson length, rounded to the nearest cent.
    pub fn from_hourly_rate(hourly_rate_cents: u32, minutes: u16) -> Self {
        let cents = (hourly_rate_cents as u64 * minutes as u64 + 30) / 60;
        Self {
            per_lesson_cents: cents as u32,
            basis: CostBasis::HourlyRate,
        }
    }

    /// Cost of a registration, when the instructor or class carries a price.
    pub fn derive(
        registration: &Registration,
        instructor: Option<&Instructor>,
        class: Option<&LessonClass>,
    ) -> Option<Self> {
        match registration.registration_type() {
            RegistrationType::Private => {
                let rate = instructor?.hourly_rate_cents?;
                let slot = registration.slot()?;
                Some(Self::from_hourly_rate(rate, slot.length.minutes()))
            }
            RegistrationType::Group => class?.price_per_lesson_cents.map(|price| Self {
                per_lesson_cents: price,
                basis: CostBasis::ClassPrice,
            }),
        }
    }
}
