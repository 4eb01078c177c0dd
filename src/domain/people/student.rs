//! Student entity and grade level.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    EntityKind, ParentId, StorageRow, StoredEntity, StudentId, ValidationError,
};

/// School grade level, kindergarten (0) through twelfth grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(u8);

impl Grade {
    pub const KINDERGARTEN: Grade = Grade(0);
    pub const MAX: Grade = Grade(12);

    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if level > Self::MAX.0 {
            return Err(ValidationError::out_of_range("grade", 0, 12, level as i32));
        }
        Ok(Self(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "K")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Grade {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("k") || trimmed.eq_ignore_ascii_case("kindergarten") {
            return Ok(Grade::KINDERGARTEN);
        }
        let level: u8 = trimmed
            .parse()
            .map_err(|_| ValidationError::invalid_format("grade", format!("'{}' is not a grade", s)))?;
        Grade::new(level)
    }
}

/// An enrolled student. Read-only to the registration engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub grade: Option<Grade>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub parent1_id: Option<ParentId>,
    pub parent2_id: Option<ParentId>,
    pub is_active: bool,
}

impl Student {
    pub fn new(id: StudentId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            grade: None,
            birth_date: None,
            email: None,
            parent1_id: None,
            parent2_id: None,
            is_active: true,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Parent references in priority order.
    pub fn parent_ids(&self) -> Vec<ParentId> {
        self.parent1_id
            .iter()
            .chain(self.parent2_id.iter())
            .cloned()
            .collect()
    }

    /// Age in whole years on the given date, if a birth date is recorded.
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let mut age = date.year() - birth.year();
        if (date.month(), date.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

impl StoredEntity for Student {
    type Key = StudentId;
    const KIND: EntityKind = EntityKind::Student;

    fn key(&self) -> StudentId {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError> {
        Ok(Self {
            id: StudentId::new(row.required("id")?)?,
            first_name: row.optional("firstName").unwrap_or_default().to_string(),
            last_name: row.optional("lastName").unwrap_or_default().to_string(),
            grade: row.parse_opt("grade")?,
            birth_date: row.parse_opt("birthDate")?,
            email: row.optional("email").map(str::to_string),
            parent1_id: row.parse_opt("parent1Id")?,
            parent2_id: row.parse_opt("parent2Id")?,
            is_active: row.flag("isActive", true)?,
        })
    }

    fn to_storage_row(&self) -> StorageRow {
        let mut row = StorageRow::new()
            .with("id", self.id.as_str())
            .with("firstName", &self.first_name)
            .with("lastName", &self.last_name)
            .with("isActive", self.is_active.to_string());
        row.set_opt("grade", self.grade.map(|g| g.to_string()));
        row.set_opt("birthDate", self.birth_date.map(|d| d.to_string()));
        row.set_opt("email", self.email.clone());
        row.set_opt("parent1Id", self.parent1_id.as_ref().map(|p| p.to_string()));
        row.set_opt("parent2Id", self.parent2_id.as_ref().map(|p| p.to_string()));
        row
    }
}
