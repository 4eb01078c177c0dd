//! ProcessRegistrationHandler - Command handler for registering a student.
//!
//! The workflow runs in a fixed order and fails fast at each stage:
//! validate, resolve entities, check eligibility, apply program rules,
//! check conflicts, persist. Audit and notification happen after the
//! registration is committed and never affect the outcome.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::audit_envelope;
use crate::application::notifications;
use crate::application::{FamilyInfo, UnitOfWork};
use crate::domain::foundation::{CommandMetadata, EventId};
use crate::domain::people::{Instructor, LessonClass};
use crate::domain::registration::{
    check_program_rules, EligibilityPolicy, EnrollmentInfo, LessonCost, LessonSchedule,
    NewRegistration, ProgramContext, Registration, RegistrationCreated, RegistrationError,
    RegistrationFailed, RegistrationRequest, RegistrationStatus, RegistrationType,
};
use crate::ports::{Clock, SideChannel, SideEffect};

/// Command to register a student for a lesson.
#[derive(Debug, Clone)]
pub struct ProcessRegistrationCommand {
    pub request: RegistrationRequest,
}

/// Result of a successful registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRegistrationResult {
    pub registration: Registration,
    pub enrollment_info: EnrollmentInfo,
    pub lesson_schedule: Option<LessonSchedule>,
    pub lesson_cost: Option<LessonCost>,
}

/// Handler for processing registration requests.
pub struct ProcessRegistrationHandler {
    uow: Arc<UnitOfWork>,
    side_channel: Arc<dyn SideChannel>,
    clock: Arc<dyn Clock>,
    eligibility: EligibilityPolicy,
    auto_approve: bool,
}

impl ProcessRegistrationHandler {
    pub fn new(
        uow: Arc<UnitOfWork>,
        side_channel: Arc<dyn SideChannel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            uow,
            side_channel,
            clock,
            eligibility: EligibilityPolicy::default(),
            auto_approve: true,
        }
    }

    pub fn with_eligibility(mut self, eligibility: EligibilityPolicy) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// New registrations start `Pending` instead of `Approved` when disabled.
    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub async fn handle(
        &self,
        cmd: ProcessRegistrationCommand,
        metadata: CommandMetadata,
    ) -> Result<ProcessRegistrationResult, RegistrationError> {
        // 1. Validate; nothing else happens for an invalid payload
        let new = NewRegistration::from_request(&cmd.request)?;
        let subject = new.student_id.to_string();

        match self.register(new, &metadata).await {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(
                    student_id = %subject,
                    code = %err.code(),
                    error = %err,
                    "Registration rejected"
                );
                let event = RegistrationFailed {
                    event_id: EventId::new(),
                    subject,
                    error_code: err.code().to_string(),
                    messages: err.messages(),
                    attempted_by: metadata.user_id.clone(),
                    failed_at: self.clock.timestamp(),
                };
                self.side_channel
                    .submit(SideEffect::Audit(audit_envelope(&event, &metadata)));
                Err(err)
            }
        }
    }

    async fn register(
        &self,
        mut new: NewRegistration,
        metadata: &CommandMetadata,
    ) -> Result<ProcessRegistrationResult, RegistrationError> {
        let instructors = self.uow.instructors()?;
        let classes = self.uow.classes()?;
        let registrations = self.uow.registrations()?;
        let is_group = new.registration_type == RegistrationType::Group;

        // 2. Resolve student, instructor, and class concurrently
        let (family, instructor, class) = {
            let instructor_lookup = async {
                match (&new.instructor_id, is_group) {
                    (Some(id), false) => instructors.get(id).await.map(Some),
                    _ => Ok(None),
                }
            };
            let class_lookup = async {
                match (&new.class_id, is_group) {
                    (Some(id), true) => classes.get(id).await.map(Some),
                    _ => Ok(None),
                }
            };
            tokio::try_join!(
                self.uow.get_family_info(&new.student_id),
                instructor_lookup,
                class_lookup
            )?
        };

        // Group lessons take instructor, slot, and room from the class
        let instructor = match &class {
            Some(class) => {
                new.inherit_class(class)
                    .map_err(|e| RegistrationError::validation(vec![e.to_string()]))?;
                Some(instructors.get(&class.instructor_id).await?)
            }
            None => instructor,
        };

        // 3. Eligibility
        let enrollment_info = self.eligibility.check(
            &family.student,
            &family.parents,
            self.clock.now().date(),
        )?;

        // 4. Program rules
        let class_enrollment = match &class {
            Some(class) => registrations.class_enrollment(&class.id, &new.partition).await?,
            None => 0,
        };
        check_program_rules(
            &new,
            ProgramContext {
                student: &family.student,
                instructor: instructor.as_ref(),
                class: class.as_ref(),
                class_enrollment,
            },
        )?;

        // 5. Conflicts; `create` repeats the check under the ledger lock
        let status = if self.auto_approve {
            RegistrationStatus::Approved
        } else {
            RegistrationStatus::Pending
        };
        let registered_at = self.clock.timestamp();
        let candidate =
            Registration::create(new.clone(), status, metadata.user_id.clone(), registered_at)?;
        let report = registrations.check_conflicts(&candidate).await?;
        if report.has_conflicts() {
            return Err(RegistrationError::Conflict {
                conflicts: report.into_conflicts(),
            });
        }

        // 6. Persist
        let registration = registrations
            .create(new, status, metadata.user_id.clone(), registered_at)
            .await?;

        // 7. Audit
        let event = RegistrationCreated::from_registration(&registration);
        self.side_channel
            .submit(SideEffect::Audit(audit_envelope(&event, metadata)));

        // 8. Notify
        let lesson_schedule = LessonSchedule::for_registration(&registration, self.clock.now());
        self.notify(
            &registration,
            &family,
            instructor.as_ref(),
            class.as_ref(),
            lesson_schedule.as_ref(),
        );

        info!(
            registration_id = %registration.id(),
            status = %registration.status(),
            correlation_id = %metadata.correlation_id(),
            "Registration processed"
        );

        Ok(ProcessRegistrationResult {
            lesson_cost: LessonCost::derive(&registration, instructor.as_ref(), class.as_ref()),
            registration,
            enrollment_info,
            lesson_schedule,
        })
    }

    fn notify(
        &self,
        registration: &Registration,
        family: &FamilyInfo,
        instructor: Option<&Instructor>,
        class: Option<&LessonClass>,
        schedule: Option<&LessonSchedule>,
    ) {
        for to in family.email_recipients() {
            self.side_channel.submit(SideEffect::Notify(
                notifications::registration_confirmation(
                    &to,
                    &family.student,
                    registration,
                    class,
                    schedule,
                ),
            ));
        }

        if let Some((instructor, to)) =
            instructor.and_then(|i| i.email.as_deref().map(|email| (i, email)))
        {
            self.side_channel.submit(SideEffect::Notify(
                notifications::instructor_assignment(
                    to,
                    instructor,
                    &family.student,
                    registration,
                    class,
                    schedule,
                ),
            ));
        }
    }
}
