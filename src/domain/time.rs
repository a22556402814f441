use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of one booking slot in seconds (half an hour).
pub const SLOT_SECONDS: u32 = 1800;

const DAY_SECONDS: u32 = 24 * 3600;

/// A wall-clock time within one day.
///
/// Stored as seconds since midnight for comparison and index arithmetic;
/// formatted as "HH:MM" everywhere it crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    seconds: u32,
}

impl TimeOfDay {
    /// Build from seconds since midnight. "24:00" is a valid day end.
    pub fn from_seconds(seconds: u32) -> Option<Self> {
        (seconds <= DAY_SECONDS).then_some(Self { seconds })
    }

    /// Parse an "HH:MM" string.
    pub fn parse(value: &str) -> Option<Self> {
        let (hours, minutes) = value.split_once(':')?;
        let hours: u32 = hours.parse().ok()?;
        let minutes: u32 = minutes.parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        Self::from_seconds(hours * 3600 + minutes * 60)
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// The wire representation, e.g. "09:30".
    pub fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.seconds / 3600, self.seconds % 3600 / 60)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hhmm())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hhmm())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {value}")))
    }
}

/// One half-hour interval of the day schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
}

/// The clock the grid is built against: current moment plus the grace
/// offset applied to deadline checks.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    pub now: NaiveDateTime,
    pub grace: Duration,
}

impl Clock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            grace: Duration::zero(),
        }
    }

    /// Whether a slot ending at `end` on `date` lies behind `now + grace`.
    pub fn deadline_passed(&self, date: NaiveDate, end: TimeOfDay) -> bool {
        let end_at = date.and_time(NaiveTime::MIN) + Duration::seconds(i64::from(end.seconds()));
        end_at < self.now + self.grace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_hhmm() {
        let time = TimeOfDay::parse("09:30").unwrap();
        assert_eq!(time.seconds(), 9 * 3600 + 30 * 60);
        assert_eq!(time.hhmm(), "09:30");
        assert_eq!(TimeOfDay::parse("24:00").unwrap().seconds(), 24 * 3600);
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(TimeOfDay::parse("9").is_none());
        assert!(TimeOfDay::parse("12:60").is_none());
        assert!(TimeOfDay::parse("25:00").is_none());
        assert!(TimeOfDay::parse("ab:cd").is_none());
    }

    #[test]
    fn orders_by_seconds() {
        let early = TimeOfDay::parse("08:00").unwrap();
        let late = TimeOfDay::parse("08:30").unwrap();
        assert!(early < late);
    }

    #[test]
    fn serde_round_trip_uses_strings() {
        let slot: TimeSlot = serde_json::from_str(r#"{"time_from":"10:00","time_to":"10:30"}"#).unwrap();
        assert_eq!(slot.time_from.hhmm(), "10:00");
        assert_eq!(
            serde_json::to_string(&slot.time_to).unwrap(),
            "\"10:30\""
        );
    }

    #[test]
    fn deadline_accounts_for_grace() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 15).unwrap();
        let now = date.and_hms_opt(10, 0, 0).unwrap();
        let end = TimeOfDay::parse("10:15").unwrap();

        let clock = Clock::new(now);
        assert!(!clock.deadline_passed(date, end));

        let clock = Clock {
            now,
            grace: Duration::minutes(30),
        };
        assert!(clock.deadline_passed(date, end));
    }
}
