//! GetStudentRegistrationsHandler - Query handler for a student's schedule.

use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;

use super::get_registration_details::{enrich, RegistrationDetails};
use crate::application::UnitOfWork;
use crate::domain::foundation::StudentId;
use crate::domain::people::Student;
use crate::domain::registration::{Partition, Registration, RegistrationError};
use crate::ports::Clock;

/// Query for every registration held by a student.
#[derive(Debug, Clone)]
pub struct GetStudentRegistrationsQuery {
    pub student_id: StudentId,
    /// Restrict to one term. All terms when `None`.
    pub partition: Option<Partition>,
    /// Include cancelled and completed registrations.
    pub include_inactive: bool,
}

impl GetStudentRegistrationsQuery {
    /// Active registrations across all terms.
    pub fn active(student_id: StudentId) -> Self {
        Self {
            student_id,
            partition: None,
            include_inactive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistrations {
    pub student: Student,
    pub registrations: Vec<RegistrationDetails>,
}

/// Handler for student registration queries.
///
/// Results are ordered by term, then weekday and start time.
pub struct GetStudentRegistrationsHandler {
    uow: Arc<UnitOfWork>,
    clock: Arc<dyn Clock>,
}

impl GetStudentRegistrationsHandler {
    pub fn new(uow: Arc<UnitOfWork>, clock: Arc<dyn Clock>) -> Self {
        Self { uow, clock }
    }

    pub async fn handle(
        &self,
        query: GetStudentRegistrationsQuery,
    ) -> Result<StudentRegistrations, RegistrationError> {
        let student = self.uow.students()?.get(&query.student_id).await?;

        let mut registrations: Vec<_> = self
            .uow
            .registrations()?
            .find_by_student(&query.student_id)
            .await?
            .into_iter()
            .filter(|r| query.include_inactive || r.is_active())
            .filter(|r| query.partition.map_or(true, |p| r.partition() == p))
            .collect();
        registrations.sort_by(|a, b| {
            let key = |r: &Registration| {
                (r.partition(), r.slot().map(|s| (s.day, s.start_time)))
            };
            key(a).cmp(&key(b)).then_with(|| a.id().cmp(b.id()))
        });

        let registrations = try_join_all(
            registrations
                .into_iter()
                .map(|r| enrich(&self.uow, r, self.clock.as_ref())),
        )
        .await?;

        Ok(StudentRegistrations {
            student,
            registrations,
        })
    }
}
