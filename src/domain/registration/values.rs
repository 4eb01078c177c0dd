//! Value objects describing when and where a lesson takes place.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

static SLOT_TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("static slot time pattern"));

static SCHOOL_YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{4})$").expect("static school year pattern"));

// ─────────────────────────────────────────────────────────────────────────────
// Weekday
// ─────────────────────────────────────────────────────────────────────────────

/// A teaching day. Lessons only run Monday through Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }

    /// Converts to chrono's weekday for calendar arithmetic.
    pub fn to_chrono(&self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str().to_ascii_lowercase() == lowered)
            .ok_or_else(|| {
                ValidationError::invalid_format("day", format!("'{}' is not a weekday name", s))
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SlotTime
// ─────────────────────────────────────────────────────────────────────────────

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock start time with minute precision, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(u16);

impl SlotTime {
    /// Creates a time from hour and minute, validating 24-hour ranges.
    pub fn new(hour: u16, minute: u16) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::out_of_range("startTime hour", 0, 23, hour as i32));
        }
        if minute > 59 {
            return Err(ValidationError::out_of_range(
                "startTime minute",
                0,
                59,
                minute as i32,
            ));
        }
        Ok(Self(hour * 60 + minute))
    }

    /// Parses a 24-hour `HH:MM` string.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let caps = SLOT_TIME_PATTERN.captures(value.trim()).ok_or_else(|| {
            ValidationError::invalid_format("startTime", "expected 24-hour HH:MM")
        })?;
        let hour: u16 = caps[1]
            .parse()
            .map_err(|_| ValidationError::invalid_format("startTime", "hour is not a number"))?;
        let minute: u16 = caps[2]
            .parse()
            .map_err(|_| ValidationError::invalid_format("startTime", "minute is not a number"))?;
        Self::new(hour, minute)
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }

    pub fn to_naive_time(&self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(self.hour() as u32, self.minute() as u32, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for SlotTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SlotTime> for String {
    fn from(time: SlotTime) -> Self {
        time.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LessonLength
// ─────────────────────────────────────────────────────────────────────────────

/// Lesson duration. Only quarter-hour lengths up to one hour are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LessonLength {
    Fifteen,
    Thirty,
    FortyFive,
    Sixty,
}

impl LessonLength {
    pub const ALLOWED_MINUTES: [u32; 4] = [15, 30, 45, 60];

    pub const fn minutes(&self) -> u16 {
        match self {
            LessonLength::Fifteen => 15,
            LessonLength::Thirty => 30,
            LessonLength::FortyFive => 45,
            LessonLength::Sixty => 60,
        }
    }
}

impl TryFrom<u32> for LessonLength {
    type Error = ValidationError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            15 => Ok(LessonLength::Fifteen),
            30 => Ok(LessonLength::Thirty),
            45 => Ok(LessonLength::FortyFive),
            60 => Ok(LessonLength::Sixty),
            other => Err(ValidationError::invalid_format(
                "length",
                format!("{} is not one of 15, 30, 45, 60", other),
            )),
        }
    }
}

impl From<LessonLength> for u32 {
    fn from(length: LessonLength) -> Self {
        length.minutes() as u32
    }
}

impl FromStr for LessonLength {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes: u32 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid_format("length", "not a whole number"))?;
        LessonLength::try_from(minutes)
    }
}

impl fmt::Display for LessonLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.minutes())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Slot
// ─────────────────────────────────────────────────────────────────────────────

/// The `(day, startTime, length)` triple a registration occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub day: Weekday,
    pub start_time: SlotTime,
    pub length: LessonLength,
}

impl Slot {
    pub fn new(day: Weekday, start_time: SlotTime, length: LessonLength) -> Self {
        Self {
            day,
            start_time,
            length,
        }
    }

    /// Start of the half-open interval, in minutes since midnight.
    pub fn start_minutes(&self) -> u16 {
        self.start_time.minutes_since_midnight()
    }

    /// End of the half-open interval, in minutes since midnight.
    pub fn end_minutes(&self) -> u16 {
        self.start_minutes() + self.length.minutes()
    }

    /// Two slots overlap when they share a day and their half-open
    /// intervals intersect. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.day == other.day
            && self.start_minutes() < other.end_minutes()
            && other.start_minutes() < self.end_minutes()
    }

    /// End time formatted as `HH:MM` on a 24-hour clock. A lesson that
    /// runs past midnight shows the next day's wall-clock time.
    pub fn end_time_label(&self) -> String {
        let end = self.end_minutes() % MINUTES_PER_DAY;
        format!("{:02}:{:02}", end / 60, end % 60)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.start_time, self.end_time_label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RegistrationType
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a registration books a private lesson or a seat in a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationType {
    Group,
    Private,
}

impl RegistrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationType::Group => "GROUP",
            RegistrationType::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for RegistrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegistrationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GROUP" => Ok(RegistrationType::Group),
            "PRIVATE" => Ok(RegistrationType::Private),
            _ => Err(ValidationError::invalid_format(
                "registrationType",
                format!("'{}' is not GROUP or PRIVATE", s),
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trimester / SchoolYear / Partition
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Trimester {
    Fall,
    Winter,
    Spring,
}

impl Trimester {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trimester::Fall => "Fall",
            Trimester::Winter => "Winter",
            Trimester::Spring => "Spring",
        }
    }

    /// Trimester whose teaching weeks contain the given month.
    pub fn for_month(month: u32) -> Self {
        match month {
            9..=12 => Trimester::Fall,
            1..=3 => Trimester::Winter,
            _ => Trimester::Spring,
        }
    }
}

impl fmt::Display for Trimester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Trimester {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fall" => Ok(Trimester::Fall),
            "winter" => Ok(Trimester::Winter),
            "spring" => Ok(Trimester::Spring),
            _ => Err(ValidationError::invalid_format(
                "trimester",
                format!("'{}' is not Fall, Winter, or Spring", s),
            )),
        }
    }
}

/// A school year written `YYYY-YYYY`, where the second year follows the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchoolYear {
    start_year: u16,
}

impl SchoolYear {
    pub fn starting(start_year: u16) -> Self {
        Self { start_year }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let caps = SCHOOL_YEAR_PATTERN
            .captures(value.trim())
            .ok_or_else(|| ValidationError::invalid_format("schoolYear", "expected YYYY-YYYY"))?;
        let first: u16 = caps[1]
            .parse()
            .map_err(|_| ValidationError::invalid_format("schoolYear", "invalid first year"))?;
        let second: u16 = caps[2]
            .parse()
            .map_err(|_| ValidationError::invalid_format("schoolYear", "invalid second year"))?;
        if second != first + 1 {
            return Err(ValidationError::invalid_format(
                "schoolYear",
                "second year must follow the first",
            ));
        }
        Ok(Self { start_year: first })
    }

    /// School year in session on the given date. Years start in September.
    pub fn containing(date: NaiveDate) -> Self {
        let year = date.year() as u16;
        if date.month() >= 9 {
            Self::starting(year)
        } else {
            Self::starting(year - 1)
        }
    }

    pub fn start_year(&self) -> u16 {
        self.start_year
    }

    pub fn end_year(&self) -> u16 {
        self.start_year + 1
    }
}

impl fmt::Display for SchoolYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year())
    }
}

impl FromStr for SchoolYear {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchoolYear {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchoolYear> for String {
    fn from(year: SchoolYear) -> Self {
        year.to_string()
    }
}

/// The `(schoolYear, trimester)` pair. Registrations in different
/// partitions never conflict with one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub school_year: SchoolYear,
    pub trimester: Trimester,
}

impl Partition {
    pub fn new(school_year: SchoolYear, trimester: Trimester) -> Self {
        Self {
            school_year,
            trimester,
        }
    }

    /// Partition in session on a date; callers choose when to use this.
    pub fn current_for(date: NaiveDate) -> Self {
        Self::new(SchoolYear::containing(date), Trimester::for_month(date.month()))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.trimester, self.school_year)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TransportationType
// ─────────────────────────────────────────────────────────────────────────────

/// How a private-lesson student gets home afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportationType {
    Pickup,
    LateBus,
    Walk,
}

impl TransportationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportationType::Pickup => "pickup",
            TransportationType::LateBus => "late-bus",
            TransportationType::Walk => "walk",
        }
    }
}

impl fmt::Display for TransportationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransportationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "pickup" | "parentpickup" => Ok(TransportationType::Pickup),
            "latebus" | "bus" => Ok(TransportationType::LateBus),
            "walk" | "walker" => Ok(TransportationType::Walk),
            _ => Err(ValidationError::invalid_format(
                "transportationType",
                format!("'{}' is not pickup, late-bus, or walk", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(day: Weekday, start: &str, minutes: u32) -> Slot {
        Slot::new(
            day,
            SlotTime::parse(start).unwrap(),
            LessonLength::try_from(minutes).unwrap(),
        )
    }

    #[test]
    fn slot_time_parses_and_normalizes() {
        assert_eq!(SlotTime::parse("14:05").unwrap().minutes_since_midnight(), 845);
        assert_eq!(SlotTime::parse("9:00").unwrap().to_string(), "09:00");
        assert_eq!(SlotTime::parse("00:00").unwrap().minutes_since_midnight(), 0);
        assert_eq!(SlotTime::parse("23:59").unwrap().to_string(), "23:59");
    }

    #[test]
    fn slot_time_rejects_out_of_range_and_garbage() {
        assert!(SlotTime::parse("24:00").is_err());
        assert!(SlotTime::parse("12:60").is_err());
        assert!(SlotTime::parse("2pm").is_err());
        assert!(SlotTime::parse("12:5").is_err());
    }

    #[test]
    fn lesson_length_accepts_only_quarter_hours() {
        for minutes in LessonLength::ALLOWED_MINUTES {
            assert_eq!(LessonLength::try_from(minutes).unwrap().minutes() as u32, minutes);
        }
        assert!(LessonLength::try_from(20).is_err());
        assert!(LessonLength::try_from(90).is_err());
        assert!("abc".parse::<LessonLength>().is_err());
    }

    #[test]
    fn overlapping_slots_are_detected() {
        let a = slot(Weekday::Monday, "14:00", 30);
        let b = slot(Weekday::Monday, "14:15", 30);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_slots_do_not_overlap() {
        let a = slot(Weekday::Monday, "14:00", 30);
        let b = slot(Weekday::Monday, "14:30", 30);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn identical_slots_overlap_and_other_days_do_not() {
        let a = slot(Weekday::Tuesday, "10:00", 45);
        assert!(a.overlaps(&a));
        assert!(!a.overlaps(&slot(Weekday::Wednesday, "10:00", 45)));
    }

    #[test]
    fn slot_display_shows_interval() {
        assert_eq!(slot(Weekday::Friday, "15:45", 30).to_string(), "Friday 15:45-16:15");
    }

    #[test]
    fn late_slot_end_wraps_past_midnight() {
        let late = slot(Weekday::Friday, "23:30", 60);
        assert_eq!(late.end_time_label(), "00:30");
        assert_eq!(late.to_string(), "Friday 23:30-00:30");
        assert_eq!(slot(Weekday::Friday, "23:15", 45).end_time_label(), "00:00");
        assert_eq!(slot(Weekday::Friday, "23:00", 45).end_time_label(), "23:45");
    }

    #[test]
    fn school_year_requires_consecutive_years() {
        assert_eq!(SchoolYear::parse("2024-2025").unwrap().start_year(), 2024);
        assert!(SchoolYear::parse("2024-2023").is_err());
        assert!(SchoolYear::parse("2024-2026").is_err());
        assert!(SchoolYear::parse("2024").is_err());
        assert!(SchoolYear::parse("24-25").is_err());
    }

    #[test]
    fn current_partition_follows_calendar() {
        let october = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let february = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let may = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();

        assert_eq!(
            Partition::current_for(october),
            Partition::new(SchoolYear::starting(2024), Trimester::Fall)
        );
        assert_eq!(
            Partition::current_for(february),
            Partition::new(SchoolYear::starting(2024), Trimester::Winter)
        );
        assert_eq!(
            Partition::current_for(may),
            Partition::new(SchoolYear::starting(2024), Trimester::Spring)
        );
    }

    #[test]
    fn weekday_and_enums_parse_case_insensitively() {
        assert_eq!("monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert!("Saturday".parse::<Weekday>().is_err());
        assert_eq!("private".parse::<RegistrationType>().unwrap(), RegistrationType::Private);
        assert_eq!("WINTER".parse::<Trimester>().unwrap(), Trimester::Winter);
        assert!("Summer".parse::<Trimester>().is_err());
        assert_eq!("Late Bus".parse::<TransportationType>().unwrap(), TransportationType::LateBus);
        assert!("teleport".parse::<TransportationType>().is_err());
    }

    #[test]
    fn values_serialize_in_wire_format() {
        let s = slot(Weekday::Monday, "09:30", 45);
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["day"], "Monday");
        assert_eq!(json["startTime"], "09:30");
        assert_eq!(json["length"], 45);
        assert_eq!(serde_json::to_value(SchoolYear::starting(2024)).unwrap(), "2024-2025");
        assert_eq!(serde_json::to_value(RegistrationType::Group).unwrap(), "GROUP");
    }
}
