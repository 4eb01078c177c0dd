//! Clock adapters.
//!
//! `SystemClock` reads the host clock; `FixedClock` pins time for tests and
//! replays.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use std::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Host clock. Lesson times are school-local, so `now` uses the local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock frozen at a given instant, treating local time as UTC.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<NaiveDateTime>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now: RwLock::new(now) }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    fn read(&self) -> NaiveDateTime {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.read()
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::from_datetime(Utc.from_utc_datetime(&self.read()))
    }
}
