//! Program-specific checks that depend on the resolved instructor or class.

use super::aggregate::NewRegistration;
use super::errors::RegistrationError;
use super::values::RegistrationType;
use crate::domain::people::{Instructor, LessonClass, Student};

/// Everything the program rules look at, resolved ahead of time.
#[derive(Debug, Clone, Copy)]
pub struct ProgramContext<'a> {
    pub student: &'a Student,
    pub instructor: Option<&'a Instructor>,
    pub class: Option<&'a LessonClass>,
    /// Active registrations already holding a seat in the class this partition.
    pub class_enrollment: usize,
}

/// Checks the proposal against instructor and class constraints.
///
/// # Errors
///
/// - `Validation` listing every violated rule
pub fn check_program_rules(
    new: &NewRegistration,
    ctx: ProgramContext<'_>,
) -> Result<(), RegistrationError> {
    let violations = match new.registration_type {
        RegistrationType::Private => private_violations(new, &ctx),
        RegistrationType::Group => group_violations(&ctx),
    };
    if violations.is_empty() {
        Ok(())
    } else {
        Err(RegistrationError::validation(violations))
    }
}

fn private_violations(new: &NewRegistration, ctx: &ProgramContext<'_>) -> Vec<String> {
    let Some(instructor) = ctx.instructor else {
        return vec!["Private lessons need an instructor".to_string()];
    };
    let name = instructor.full_name();
    let mut violations = Vec::new();

    if !instructor.is_active {
        violations.push(format!("Instructor {} is not active", name));
    }
    if let Some(instrument) = new.instrument.as_deref() {
        if !instructor.teaches(instrument) {
            violations.push(format!("Instructor {} does not teach {}", name, instrument));
        }
    }
    if let Some(grade) = ctx.student.grade {
        if !instructor.covers_grade(grade) {
            violations.push(format!(
                "Instructor {} teaches grades {}-{}, not grade {}",
                name, instructor.min_grade, instructor.max_grade, grade
            ));
        }
    }
    if let Some(slot) = &new.slot {
        if !instructor.available_on(slot.day) {
            violations.push(format!("Instructor {} is not available on {}", name, slot.day));
        }
    }
    violations
}

fn group_violations(ctx: &ProgramContext<'_>) -> Vec<String> {
    let Some(class) = ctx.class else {
        return vec!["Group lessons need a class".to_string()];
    };
    let mut violations = Vec::new();

    if !class.is_active {
        violations.push(format!("Class {} is not active", class.title));
    }
    if class.slot.is_none() {
        violations.push(format!("Class {} has no scheduled time", class.title));
    }
    if ctx.class_enrollment >= class.capacity as usize {
        violations.push(format!(
            "Class {} is full ({}/{})",
            class.title, ctx.class_enrollment, class.capacity
        ));
    }
    if let Some(grade) = ctx.student.grade {
        if !class.admits_grade(grade) {
            violations.push(format!(
                "Class {} is for grades {}-{}, not grade {}",
                class.title, class.min_grade, class.max_grade, grade
            ));
        }
    }
    violations
}
