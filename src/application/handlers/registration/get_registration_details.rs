//! GetRegistrationDetailsHandler - Query handler for one enriched registration.

use serde::Serialize;
use std::sync::Arc;

use crate::application::UnitOfWork;
use crate::domain::foundation::DomainError;
use crate::domain::people::{Instructor, LessonClass, Room, Student};
use crate::domain::registration::{
    LessonCost, LessonSchedule, Registration, RegistrationError, RegistrationKey,
};
use crate::ports::Clock;

/// Query for a single registration in one term.
#[derive(Debug, Clone)]
pub struct GetRegistrationDetailsQuery {
    pub registration: RegistrationKey,
}

/// A registration with its related entities and derived views.
///
/// Related entities that no longer exist are `None`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetails {
    pub registration: Registration,
    pub student: Option<Student>,
    pub instructor: Option<Instructor>,
    pub class: Option<LessonClass>,
    pub room: Option<Room>,
    pub schedule: Option<LessonSchedule>,
    pub cost: Option<LessonCost>,
}

/// Resolves the entities a registration points at, concurrently.
pub(super) async fn enrich(
    uow: &UnitOfWork,
    registration: Registration,
    clock: &dyn Clock,
) -> Result<RegistrationDetails, DomainError> {
    let students = uow.students()?;
    let instructors = uow.instructors()?;
    let classes = uow.classes()?;
    let rooms = uow.rooms()?;

    let (student, instructor, class, room) = tokio::try_join!(
        students.find_by_id(registration.student_id()),
        async {
            match registration.instructor_id() {
                Some(id) => instructors.find_by_id(id).await,
                None => Ok(None),
            }
        },
        async {
            match registration.class_id() {
                Some(id) => classes.find_by_id(id).await,
                None => Ok(None),
            }
        },
        async {
            match registration.room_id() {
                Some(id) => rooms.find_by_id(id).await,
                None => Ok(None),
            }
        }
    )?;

    let schedule = LessonSchedule::for_registration(&registration, clock.now());
    let cost = LessonCost::derive(&registration, instructor.as_ref(), class.as_ref());

    Ok(RegistrationDetails {
        registration,
        student,
        instructor,
        class,
        room,
        schedule,
        cost,
    })
}

/// Handler for registration detail queries.
pub struct GetRegistrationDetailsHandler {
    uow: Arc<UnitOfWork>,
    clock: Arc<dyn Clock>,
}

impl GetRegistrationDetailsHandler {
    pub fn new(uow: Arc<UnitOfWork>, clock: Arc<dyn Clock>) -> Self {
        Self { uow, clock }
    }

    pub async fn handle(
        &self,
        query: GetRegistrationDetailsQuery,
    ) -> Result<RegistrationDetails, RegistrationError> {
        let registration = self
            .uow
            .registrations()?
            .get(&query.registration)
            .await?;
        Ok(enrich(&self.uow, registration, self.clock.as_ref()).await?)
    }
}
