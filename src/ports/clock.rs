//! Clock port.

use chrono::NaiveDateTime;

use crate::domain::foundation::Timestamp;

/// Source of the current time.
///
/// `now` is school-local wall-clock time, which is what lesson slots are
/// expressed in. `timestamp` is the instant used for audit stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn timestamp(&self) -> Timestamp;
}
