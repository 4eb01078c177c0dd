//! Cancellation policy.
//!
//! Cancelling close to the next lesson needs a manager's sign-off; the
//! policy reports that as a decision rather than an error so callers can
//! route it to approval without mutating anything.

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::aggregate::Registration;
use super::values::Slot;

/// Outcome of evaluating a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum CancellationDecision {
    Allowed {
        refund_eligible: bool,
        fee_cents: u32,
        next_lesson_at: Option<NaiveDateTime>,
    },
    RequiresApproval {
        reason: String,
        next_lesson_at: NaiveDateTime,
    },
    Blocked {
        reason: String,
    },
}

/// How an allowed cancellation is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancellationMode {
    /// Keep the row and mark it cancelled.
    #[default]
    Soft,
    /// Remove the row.
    Hard,
}

/// Lessons repeat weekly, so the next one is always less than this far away.
pub const MAX_LEAD_TIME_HOURS: u32 = 7 * 24;

/// Time windows and fee applied when a registration is cancelled.
///
/// Both windows are measured against the next weekly occurrence, so a
/// window of [`MAX_LEAD_TIME_HOURS`] or more can never be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    pub no_cancel_window: Duration,
    pub refund_window: Duration,
    pub late_fee_cents: u32,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            no_cancel_window: Duration::hours(24),
            refund_window: Duration::hours(72),
            late_fee_cents: 2500,
        }
    }
}

impl CancellationPolicy {
    /// Decides whether `registration` may be cancelled at `now`
    /// (school-local time).
    pub fn evaluate(
        &self,
        registration: &Registration,
        now: NaiveDateTime,
        manager_approved: bool,
    ) -> CancellationDecision {
        if !registration.is_active() {
            return CancellationDecision::Blocked {
                reason: format!(
                    "Registration {} is already {}",
                    registration.id(),
                    registration.status()
                ),
            };
        }

        let Some(slot) = registration.slot() else {
            return CancellationDecision::Allowed {
                refund_eligible: true,
                fee_cents: 0,
                next_lesson_at: None,
            };
        };

        let next = next_occurrence(slot, now);
        let lead = next - now;

        if lead < self.no_cancel_window && !manager_approved {
            return CancellationDecision::RequiresApproval {
                reason: format!(
                    "Next lesson starts {} (within {} hours); manager approval is required",
                    next.format("%A %Y-%m-%d %H:%M"),
                    self.no_cancel_window.num_hours()
                ),
                next_lesson_at: next,
            };
        }

        let refund_eligible = lead >= self.refund_window;
        CancellationDecision::Allowed {
            refund_eligible,
            fee_cents: if refund_eligible { 0 } else { self.late_fee_cents },
            next_lesson_at: Some(next),
        }
    }
}

/// Start of the next lesson in `slot` at or after `now`.
pub fn next_occurrence(slot: &Slot, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    let target = slot.day.to_chrono().num_days_from_monday() as i64;
    let current = today.weekday().num_days_from_monday() as i64;
    let days_ahead = (target - current).rem_euclid(7);

    let candidate = (today + Duration::days(days_ahead)).and_time(slot.start_time.to_naive_time());
    if candidate < now {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::registration::conflict::test_support::{private, slot};
    use crate::domain::registration::Weekday;
    use chrono::NaiveDate;

    // 2024-10-07 is a Monday.
    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn next_occurrence_rolls_forward() {
        let monday_two = slot(Weekday::Monday, "14:00", 30);
        assert_eq!(next_occurrence(&monday_two, at(7, 9, 0)), at(7, 14, 0));
        assert_eq!(next_occurrence(&monday_two, at(7, 14, 0)), at(7, 14, 0));
        assert_eq!(next_occurrence(&monday_two, at(7, 14, 1)), at(14, 14, 0));
        assert_eq!(next_occurrence(&monday_two, at(9, 8, 0)), at(14, 14, 0));

        let friday = slot(Weekday::Friday, "15:00", 45);
        assert_eq!(next_occurrence(&friday, at(7, 9, 0)), at(11, 15, 0));
    }

    #[test]
    fn inside_window_requires_approval() {
        let registration = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), None);
        let decision = CancellationPolicy::default().evaluate(&registration, at(7, 9, 0), false);
        assert!(matches!(
            decision,
            CancellationDecision::RequiresApproval { next_lesson_at, .. } if next_lesson_at == at(7, 14, 0)
        ));
    }

    #[test]
    fn manager_approval_overrides_window_with_fee() {
        let registration = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), None);
        let decision = CancellationPolicy::default().evaluate(&registration, at(7, 9, 0), true);
        assert_eq!(
            decision,
            CancellationDecision::Allowed {
                refund_eligible: false,
                fee_cents: 2500,
                next_lesson_at: Some(at(7, 14, 0)),
            }
        );
    }

    #[test]
    fn refund_depends_on_lead_time() {
        let registration = private("S1", "I1", slot(Weekday::Friday, "14:00", 30), None);
        let policy = CancellationPolicy::default();

        // Monday 09:00 to Friday 14:00 is 101 hours.
        let early = policy.evaluate(&registration, at(7, 9, 0), false);
        assert!(matches!(early, CancellationDecision::Allowed { refund_eligible: true, fee_cents: 0, .. }));

        // Wednesday 09:00 to Friday 14:00 is 53 hours.
        let late = policy.evaluate(&registration, at(9, 9, 0), false);
        assert!(matches!(late, CancellationDecision::Allowed { refund_eligible: false, fee_cents: 2500, .. }));
    }

    #[test]
    fn default_policy_refunds_part_of_every_week() {
        let registration = private("S1", "I1", slot(Weekday::Monday, "14:00", 30), None);
        let policy = CancellationPolicy::default();

        let refundable_hours = (0..i64::from(MAX_LEAD_TIME_HOURS))
            .map(|h| at(7, 14, 30) + Duration::hours(h))
            .filter(|now| {
                matches!(
                    policy.evaluate(&registration, *now, true),
                    CancellationDecision::Allowed { refund_eligible: true, .. }
                )
            })
            .count();

        // From 14:30 the next lesson is 167.5h away and counts down hourly.
        assert_eq!(refundable_hours, 96);
    }

    #[test]
    fn inactive_registration_is_blocked() {
        let mut registration = private("S1", "I1", slot(Weekday::Friday, "14:00", 30), None);
        registration.cancel("moved", Timestamp::now()).unwrap();
        let decision = CancellationPolicy::default().evaluate(&registration, at(7, 9, 0), true);
        assert!(matches!(decision, CancellationDecision::Blocked { reason } if reason.contains("cancelled")));
    }
}
