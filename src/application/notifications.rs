//! Notification templates for registration workflows.
//!
//! Each function renders one email. Delivery is the side channel's job.

use crate::domain::people::{Instructor, LessonClass, Student};
use crate::domain::registration::{LessonSchedule, Registration, RegistrationType};
use crate::ports::EmailMessage;

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn lesson_label(registration: &Registration, class: Option<&LessonClass>) -> String {
    match (registration.registration_type(), class) {
        (RegistrationType::Group, Some(class)) => format!("{} (group class)", class.title),
        (RegistrationType::Group, None) => "group class".to_string(),
        (RegistrationType::Private, _) => match registration.instrument() {
            Some(instrument) => format!("private {} lesson", instrument),
            None => "private lesson".to_string(),
        },
    }
}

fn schedule_line(schedule: Option<&LessonSchedule>) -> String {
    match schedule {
        Some(s) => format!(
            "<p>Lessons meet every {}. The first lesson is on {}.</p>",
            escape(&s.display),
            s.next_lesson_at.format("%A, %B %-d at %H:%M")
        ),
        None => "<p>Lesson times will be confirmed by the office.</p>".to_string(),
    }
}

/// Confirmation sent to a student's family.
pub fn registration_confirmation(
    to: &str,
    student: &Student,
    registration: &Registration,
    class: Option<&LessonClass>,
    schedule: Option<&LessonSchedule>,
) -> EmailMessage {
    let lesson = lesson_label(registration, class);
    let html = format!(
        "<p>Hello,</p>\
         <p>{student} is registered for {lesson} for {partition}.</p>\
         {schedule}\
         <p>Registration reference: {id}</p>",
        student = escape(&student.full_name()),
        lesson = escape(&lesson),
        partition = registration.partition(),
        schedule = schedule_line(schedule),
        id = escape(registration.id().as_str()),
    );
    EmailMessage::new(
        to,
        format!("Registration confirmed: {}", student.full_name()),
        html,
    )
}

/// Notice to the instructor that a student joined their schedule.
pub fn instructor_assignment(
    to: &str,
    instructor: &Instructor,
    student: &Student,
    registration: &Registration,
    class: Option<&LessonClass>,
    schedule: Option<&LessonSchedule>,
) -> EmailMessage {
    let html = format!(
        "<p>Hi {instructor},</p>\
         <p>{student} has been added to your {lesson} for {partition}.</p>\
         {schedule}",
        instructor = escape(&instructor.first_name),
        student = escape(&student.full_name()),
        lesson = escape(&lesson_label(registration, class)),
        partition = registration.partition(),
        schedule = schedule_line(schedule),
    );
    EmailMessage::new(to, format!("New student: {}", student.full_name()), html)
}

/// Cancellation notice, sent to the family and the instructor alike.
pub fn cancellation_notice(
    to: &str,
    student: &Student,
    registration: &Registration,
    reason: &str,
    refund_eligible: bool,
    fee_cents: u32,
) -> EmailMessage {
    let terms = if refund_eligible {
        "No cancellation fee applies.".to_string()
    } else {
        format!("A cancellation fee of ${}.{:02} applies.", fee_cents / 100, fee_cents % 100)
    };
    let html = format!(
        "<p>The registration of {student} ({id}) for {partition} has been cancelled.</p>\
         <p>Reason: {reason}</p>\
         <p>{terms}</p>",
        student = escape(&student.full_name()),
        id = escape(registration.id().as_str()),
        partition = registration.partition(),
        reason = escape(reason),
        terms = terms,
    );
    EmailMessage::new(
        to,
        format!("Registration cancelled: {}", student.full_name()),
        html,
    )
}
