//! rrule-describe: short, cron-adjacent sentences for recurrence rules.
//!
//! Takes an RFC 5545 `RRULE` value plus a start and optional end, and renders
//! it as a handful of sentences a scheduler or a human can read at a glance.
//! Rules whose occurrences drift between periods are expanded up to a
//! reschedule date, which is returned so the caller knows when to describe
//! again.
//!
//! # Examples
//!
//! ```
//! use rrule_describe::{describe_with, DefaultEngine, DescribeConfig, FixedClock};
//! use jiff::civil::datetime;
//!
//! let start = datetime(2021, 1, 4, 9, 0, 0, 0);
//! let config = DescribeConfig::new("FREQ=WEEKLY;BYDAY=MO,WE,FR", start);
//! let description = describe_with(&config, &DefaultEngine, &FixedClock(start)).unwrap();
//! assert_eq!(description.sentences, vec!["every mon,wed,fri 09:00"]);
//! ```

pub mod ast;
pub mod clock;
pub mod cron;
pub mod describe;
pub mod display;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Frequency, MonthName, RecurrenceRule, TimeOfDay, Weekday, WeekdaySpec};
pub use clock::{Clock, FixedClock, SystemClock};
pub use describe::{
    describe, describe_with, effective_window, reschedule_window, DayPattern, DescribeConfig,
    Description, Mode, RescheduleOffset, Window,
};
pub use display::ordinalize;
pub use engine::{DefaultEngine, RuleEngine};
pub use error::RuleError;

use jiff::civil::DateTime;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// --- RecurrenceRule convenience methods ---

impl RecurrenceRule {
    /// Parse an RRULE value, with or without the `RRULE:` prefix.
    pub fn parse(input: &str) -> Result<Self, RuleError> {
        parser::parse(input)
    }

    /// Occurrences anchored at `dtstart` within `[from, to]`, expanded by
    /// [`DefaultEngine`].
    pub fn occurrences_between(
        &self,
        dtstart: DateTime,
        from: DateTime,
        to: DateTime,
    ) -> Result<Vec<DateTime>, RuleError> {
        DefaultEngine.occurrences_between(self, dtstart, from, to)
    }

    /// Render the stable form of this rule as a 5-field cron expression.
    pub fn to_cron(&self, time: TimeOfDay) -> Result<String, RuleError> {
        cron::rule_to_cron(self, time)
    }
}

impl FromStr for RecurrenceRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl Serialize for RecurrenceRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;

        map.serialize_entry("frequency", &self.frequency)?;
        map.serialize_entry("interval", &self.interval)?;
        if !self.by_weekday.is_empty() {
            let days: Vec<serde_json::Value> = self
                .by_weekday
                .iter()
                .map(|w| match w.nth {
                    Some(n) => serde_json::json!({ "nth": n, "day": w.weekday }),
                    None => serde_json::json!(w.weekday),
                })
                .collect();
            map.serialize_entry("byDay", &days)?;
        }
        if !self.by_month_day.is_empty() {
            map.serialize_entry("byMonthDay", &self.by_month_day)?;
        }
        if !self.by_month.is_empty() {
            map.serialize_entry("byMonth", &self.by_month)?;
        }
        if !self.by_set_pos.is_empty() {
            map.serialize_entry("bySetPos", &self.by_set_pos)?;
        }
        if let Some(until) = &self.until {
            map.serialize_entry("until", until)?;
        }
        map.serialize_entry("rrule", &self.to_string())?;

        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for RecurrenceRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Deserialize from the RRULE string
        let s = String::deserialize(deserializer)?;
        RecurrenceRule::parse(&s).map_err(serde::de::Error::custom)
    }
}
