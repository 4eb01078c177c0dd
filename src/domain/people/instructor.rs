//! Instructor entity.

use serde::{Deserialize, Serialize};

use super::Grade;
use crate::domain::foundation::{
    EntityKind, InstructorId, StorageRow, StoredEntity, ValidationError,
};
use crate::domain::registration::Weekday;

/// An instructor who teaches private lessons and group classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: InstructorId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub instruments: Vec<String>,
    pub min_grade: Grade,
    pub max_grade: Grade,
    pub available_days: Vec<Weekday>,
    pub hourly_rate_cents: Option<u32>,
    pub is_active: bool,
}

impl Instructor {
    /// Creates an active instructor who teaches every grade on every day.
    pub fn new(id: InstructorId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            instruments: Vec::new(),
            min_grade: Grade::KINDERGARTEN,
            max_grade: Grade::MAX,
            available_days: Weekday::ALL.to_vec(),
            hourly_rate_cents: None,
            is_active: true,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Case-insensitive instrument match.
    pub fn teaches(&self, instrument: &str) -> bool {
        let wanted = instrument.trim();
        self.instruments.iter().any(|i| i.eq_ignore_ascii_case(wanted))
    }

    pub fn covers_grade(&self, grade: Grade) -> bool {
        self.min_grade <= grade && grade <= self.max_grade
    }

    pub fn available_on(&self, day: Weekday) -> bool {
        self.available_days.contains(&day)
    }
}

impl StoredEntity for Instructor {
    type Key = InstructorId;
    const KIND: EntityKind = EntityKind::Instructor;

    fn key(&self) -> InstructorId {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError> {
        let available_days = match row.optional("availableDays") {
            None => Weekday::ALL.to_vec(),
            Some(_) => row
                .list("availableDays")
                .iter()
                .map(|d| d.parse::<Weekday>())
                .collect::<Result<Vec<_>, _>>()?,
        };
        let min_grade = row.parse_opt("minGrade")?.unwrap_or(Grade::KINDERGARTEN);
        let max_grade = row.parse_opt("maxGrade")?.unwrap_or(Grade::MAX);
        if min_grade > max_grade {
            return Err(ValidationError::invalid_format(
                "minGrade",
                "minimum grade exceeds maximum grade",
            ));
        }

        Ok(Self {
            id: InstructorId::new(row.required("id")?)?,
            first_name: row.optional("firstName").unwrap_or_default().to_string(),
            last_name: row.optional("lastName").unwrap_or_default().to_string(),
            email: row.optional("email").map(str::to_string),
            instruments: row.list("instruments"),
            min_grade,
            max_grade,
            available_days,
            hourly_rate_cents: row.parse_opt("hourlyRateCents")?,
            is_active: row.flag("isActive", true)?,
        })
    }

    fn to_storage_row(&self) -> StorageRow {
        let days: Vec<&str> = self.available_days.iter().map(|d| d.as_str()).collect();
        let mut row = StorageRow::new()
            .with("id", self.id.as_str())
            .with("firstName", &self.first_name)
            .with("lastName", &self.last_name)
            .with("instruments", self.instruments.join(","))
            .with("minGrade", self.min_grade.to_string())
            .with("maxGrade", self.max_grade.to_string())
            .with("availableDays", days.join(","))
            .with("isActive", self.is_active.to_string());
        row.set_opt("email", self.email.clone());
        row.set_opt("hourlyRateCents", self.hourly_rate_cents.map(|c| c.to_string()));
        row
    }
}
