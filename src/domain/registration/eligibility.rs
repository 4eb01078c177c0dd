//! Student enrollment eligibility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::RegistrationError;
use crate::domain::foundation::{ParentId, StudentId};
use crate::domain::people::{Grade, Parent, Student};

/// Enrollment facts gathered while checking eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentInfo {
    pub student_id: StudentId,
    pub student_name: String,
    pub grade: Option<Grade>,
    pub age: Option<u32>,
    pub reachable_parents: Vec<ParentId>,
}

/// Age bounds and contact rules a student must satisfy to enroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub min_age: u32,
    pub max_age: u32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            min_age: 4,
            max_age: 19,
        }
    }
}

impl EligibilityPolicy {
    pub fn new(min_age: u32, max_age: u32) -> Self {
        Self { min_age, max_age }
    }

    /// Checks a student against every eligibility rule.
    ///
    /// `parents` are the resolved parent records; unresolved references are
    /// simply absent.
    ///
    /// # Errors
    ///
    /// - `Ineligible` listing every rule the student fails
    pub fn check(
        &self,
        student: &Student,
        parents: &[Parent],
        today: NaiveDate,
    ) -> Result<EnrollmentInfo, RegistrationError> {
        let mut reasons = Vec::new();

        if !student.is_active {
            reasons.push(format!("Student {} is not active", student.id));
        }

        let age = student.age_on(today);
        if let Some(age) = age {
            if age < self.min_age || age > self.max_age {
                reasons.push(format!(
                    "Student age {} is outside the allowed range {}-{}",
                    age, self.min_age, self.max_age
                ));
            }
        }

        if student.grade.is_none() {
            reasons.push("Student grade is not recorded".to_string());
        }

        let reachable_parents: Vec<ParentId> = parents
            .iter()
            .filter(|p| p.has_contact())
            .map(|p| p.id.clone())
            .collect();
        if reachable_parents.is_empty() {
            reasons.push(
                "At least one parent must have an email or phone number on file".to_string(),
            );
        }

        if !reasons.is_empty() {
            return Err(RegistrationError::Ineligible { reasons });
        }

        Ok(EnrollmentInfo {
            student_id: student.id.clone(),
            student_name: student.full_name(),
            grade: student.grade,
            age,
            reachable_parents,
        })
    }
}
