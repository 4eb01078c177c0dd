//! Scheduling configuration

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::registration::{
    CancellationMode, CancellationPolicy, EligibilityPolicy, MAX_LEAD_TIME_HOURS,
};

/// Registration and cancellation rules
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// Cancelling closer than this to the next lesson needs manager approval
    #[serde(default = "default_no_cancel_window_hours")]
    pub no_cancel_window_hours: u32,

    /// Cancelling at least this far ahead is refunded; must stay under one week
    #[serde(default = "default_refund_window_hours")]
    pub refund_window_hours: u32,

    /// Fee charged when a cancellation is not refunded
    #[serde(default = "default_late_cancellation_fee_cents")]
    pub late_cancellation_fee_cents: u32,

    /// Whether cancelled rows are kept (`soft`) or removed (`hard`)
    #[serde(default)]
    pub cancellation_mode: CancellationMode,

    /// New registrations start approved rather than pending
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,

    #[serde(default = "default_min_student_age")]
    pub min_student_age: u32,

    #[serde(default = "default_max_student_age")]
    pub max_student_age: u32,
}

impl SchedulingConfig {
    pub fn cancellation_policy(&self) -> CancellationPolicy {
        CancellationPolicy {
            no_cancel_window: Duration::hours(i64::from(self.no_cancel_window_hours)),
            refund_window: Duration::hours(i64::from(self.refund_window_hours)),
            late_fee_cents: self.late_cancellation_fee_cents,
        }
    }

    pub fn eligibility_policy(&self) -> EligibilityPolicy {
        EligibilityPolicy::new(self.min_student_age, self.max_student_age)
    }

    /// Validate scheduling configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.refund_window_hours < self.no_cancel_window_hours {
            return Err(ValidationError::InvalidCancellationWindows);
        }
        if self.refund_window_hours >= MAX_LEAD_TIME_HOURS {
            return Err(ValidationError::UnreachableRefundWindow(self.refund_window_hours));
        }
        if self.min_student_age > self.max_student_age {
            return Err(ValidationError::InvalidAgeRange);
        }
        Ok(())
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            no_cancel_window_hours: default_no_cancel_window_hours(),
            refund_window_hours: default_refund_window_hours(),
            late_cancellation_fee_cents: default_late_cancellation_fee_cents(),
            cancellation_mode: CancellationMode::default(),
            auto_approve: default_auto_approve(),
            min_student_age: default_min_student_age(),
            max_student_age: default_max_student_age(),
        }
    }
}

fn default_no_cancel_window_hours() -> u32 {
    24
}

fn default_refund_window_hours() -> u32 {
    72
}

fn default_late_cancellation_fee_cents() -> u32 {
    2500
}

fn default_auto_approve() -> bool {
    true
}

fn default_min_student_age() -> u32 {
    4
}

fn default_max_student_age() -> u32 {
    19
}
