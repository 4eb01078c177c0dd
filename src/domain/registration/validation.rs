//! Field- and rule-level validation of a proposed registration.
//!
//! Validation is a pure function of the request: it never touches storage
//! and never stops at the first problem, so a caller can fix every issue
//! in one round trip.

use serde::{Deserialize, Serialize};

use super::request::{present, RegistrationRequest};
use super::values::{
    LessonLength, RegistrationType, SchoolYear, SlotTime, TransportationType, Trimester, Weekday,
};
use crate::domain::foundation::ValidationError;

/// Outcome of validating a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validates a registration request, accumulating every failure.
///
/// Checks run in a fixed order: identity fields, type-specific required
/// fields, school year, trimester, start time (private only), length.
pub fn validate(request: &RegistrationRequest) -> ValidationReport {
    let mut report = ValidationReport::default();

    if present(&request.student_id).is_none() {
        report.push("Student ID is required");
    }

    let registration_type = match present(&request.registration_type) {
        None => {
            report.push("Registration type is required");
            None
        }
        Some(raw) => match raw.parse::<RegistrationType>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                report.push("Registration type must be GROUP or PRIVATE");
                None
            }
        },
    };

    match registration_type {
        Some(RegistrationType::Group) => {
            if present(&request.class_id).is_none() {
                report.push("Class ID is required for group registrations");
            }
        }
        Some(RegistrationType::Private) => check_private_fields(request, &mut report),
        None => {}
    }

    match present(&request.school_year) {
        None => report.push("School year is required"),
        Some(raw) => {
            if let Err(err) = SchoolYear::parse(raw) {
                report.push(school_year_message(&err));
            }
        }
    }

    match present(&request.trimester) {
        None => report.push("Trimester is required"),
        Some(raw) => {
            if raw.parse::<Trimester>().is_err() {
                report.push("Trimester must be one of Fall, Winter, Spring");
            }
        }
    }

    if registration_type == Some(RegistrationType::Private) {
        if let Some(raw) = present(&request.start_time) {
            if SlotTime::parse(raw).is_err() {
                report.push("Start time must be in 24-hour HH:MM format (00:00-23:59)");
            }
        }
    }

    if let Some(minutes) = request.length {
        if LessonLength::try_from(minutes).is_err() {
            report.push("Length must be one of 15, 30, 45, or 60 minutes");
        }
    }

    report
}

fn check_private_fields(request: &RegistrationRequest, report: &mut ValidationReport) {
    if present(&request.instructor_id).is_none() {
        report.push("Instructor ID is required for private registrations");
    }
    if present(&request.instrument).is_none() {
        report.push("Instrument is required for private registrations");
    }
    match present(&request.day) {
        None => report.push("Day is required for private registrations"),
        Some(raw) => {
            if raw.parse::<Weekday>().is_err() {
                report.push("Day must be a weekday name (Monday-Friday)");
            }
        }
    }
    if present(&request.start_time).is_none() {
        report.push("Start time is required for private registrations");
    }
    if request.length.is_none() {
        report.push("Length is required for private registrations");
    }
    match present(&request.transportation_type) {
        None => report.push("Transportation type is required for private registrations"),
        Some(raw) => {
            if raw.parse::<TransportationType>().is_err() {
                report.push("Transportation type must be pickup, late-bus, or walk");
            }
        }
    }
}

fn school_year_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::InvalidFormat { reason, .. } if reason.contains("follow") => {
            "School year must span consecutive years (e.g. 2024-2025)"
        }
        _ => "School year must be in YYYY-YYYY format",
    }
}
