//! The recurrence engine seam.
//!
//! The describe core never evaluates rules itself. It parses and expands them
//! through [`RuleEngine`], so another evaluator can stand in for the default
//! one (or a canned list of dates can, in tests).

use chrono::{Datelike, NaiveDate, Timelike};
use jiff::civil::DateTime;
use rrule::{RRule, Tz, Unvalidated};

use crate::ast::RecurrenceRule;
use crate::error::RuleError;

pub trait RuleEngine {
    /// Parse an RRULE value.
    fn parse(&self, rule: &str) -> Result<RecurrenceRule, RuleError>;

    /// Occurrences of `rule` anchored at `dtstart`, restricted to
    /// `[start, end]` (both inclusive), in non-decreasing order.
    fn occurrences_between(
        &self,
        rule: &RecurrenceRule,
        dtstart: DateTime,
        start: DateTime,
        end: DateTime,
    ) -> Result<Vec<DateTime>, RuleError>;
}

/// Parses with the crate's own parser and expands with the `rrule` crate.
///
/// All datetimes are civil UTC; they cross into `chrono` only here.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEngine;

impl RuleEngine for DefaultEngine {
    fn parse(&self, rule: &str) -> Result<RecurrenceRule, RuleError> {
        crate::parser::parse(rule)
    }

    fn occurrences_between(
        &self,
        rule: &RecurrenceRule,
        dtstart: DateTime,
        start: DateTime,
        end: DateTime,
    ) -> Result<Vec<DateTime>, RuleError> {
        if !rule.frequency.is_supported() {
            return Err(RuleError::eval(format!(
                "cannot expand {} rules",
                rule.frequency
            )));
        }
        if start > end {
            return Ok(Vec::new());
        }
        // rrule refuses an UNTIL before DTSTART; such a rule simply never fires.
        if rule.until.is_some_and(|until| until < dtstart) {
            return Ok(Vec::new());
        }

        let text = rule.to_string();
        let parsed = text
            .parse::<RRule<Unvalidated>>()
            .map_err(|e| RuleError::eval(format!("rrule [{text}]: {e}")))?;
        let set = parsed
            .build(to_rrule(dtstart)?)
            .map_err(|e| RuleError::eval(format!("rrule [{text}]: {e}")))?;

        // Pad the bounds by a second and trim exactly below, whichever way
        // rrule treats its own bounds.
        let padded_start = start.checked_sub(jiff::Span::new().seconds(1)).unwrap_or(start);
        let padded_end = end.checked_add(jiff::Span::new().seconds(1)).unwrap_or(end);
        let result = set
            .after(to_rrule(padded_start)?)
            .before(to_rrule(padded_end)?)
            .all(u16::MAX);
        if result.limited {
            tracing::warn!(rule = %text, count = result.dates.len(), "occurrence expansion hit its limit");
        }

        let mut out = Vec::with_capacity(result.dates.len());
        for date in &result.dates {
            let dt = from_rrule(date)?;
            if dt >= start && dt <= end {
                out.push(dt);
            }
        }
        tracing::trace!(rule = %text, count = out.len(), "expanded occurrences");
        Ok(out)
    }
}

impl<E: RuleEngine + ?Sized> RuleEngine for &E {
    fn parse(&self, rule: &str) -> Result<RecurrenceRule, RuleError> {
        (**self).parse(rule)
    }

    fn occurrences_between(
        &self,
        rule: &RecurrenceRule,
        dtstart: DateTime,
        start: DateTime,
        end: DateTime,
    ) -> Result<Vec<DateTime>, RuleError> {
        (**self).occurrences_between(rule, dtstart, start, end)
    }
}

/// Civil UTC datetime to rrule's `chrono` form. Sub-second precision is dropped.
fn to_rrule(dt: DateTime) -> Result<chrono::DateTime<Tz>, RuleError> {
    NaiveDate::from_ymd_opt(
        i32::from(dt.year()),
        u32::from(dt.month().unsigned_abs()),
        u32::from(dt.day().unsigned_abs()),
    )
    .and_then(|d| {
        d.and_hms_opt(
            u32::from(dt.hour().unsigned_abs()),
            u32::from(dt.minute().unsigned_abs()),
            u32::from(dt.second().unsigned_abs()),
        )
    })
    .map(|naive| naive.and_utc().with_timezone(&Tz::UTC))
    .ok_or_else(|| RuleError::eval(format!("datetime {dt} out of range")))
}

fn from_rrule(dt: &chrono::DateTime<Tz>) -> Result<DateTime, RuleError> {
    let naive = dt.naive_utc();
    let out_of_range = || RuleError::eval(format!("occurrence {naive} out of range"));
    let year = i16::try_from(naive.year()).map_err(|_| out_of_range())?;
    DateTime::new(
        year,
        naive.month() as i8,
        naive.day() as i8,
        naive.hour() as i8,
        naive.minute() as i8,
        naive.second() as i8,
        0,
    )
    .map_err(|_| out_of_range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::{date, datetime, Date};

    fn dates(rule: &str, dtstart: DateTime, from: DateTime, to: DateTime) -> Vec<Date> {
        let r = DefaultEngine.parse(rule).unwrap();
        DefaultEngine
            .occurrences_between(&r, dtstart, from, to)
            .unwrap()
            .into_iter()
            .map(|dt| dt.date())
            .collect()
    }

    #[test]
    fn test_weekly_days() {
        let start = datetime(2021, 1, 4, 9, 0, 0, 0);
        let got = dates(
            "FREQ=WEEKLY;BYDAY=MO,WE,FR",
            start,
            start,
            datetime(2021, 1, 10, 0, 0, 0, 0),
        );
        assert_eq!(got, vec![date(2021, 1, 4), date(2021, 1, 6), date(2021, 1, 8)]);
    }

    #[test]
    fn test_monthly_every_third_month() {
        let start = datetime(2021, 1, 4, 23, 59, 0, 0);
        let r = DefaultEngine.parse("FREQ=MONTHLY;INTERVAL=3;BYMONTHDAY=25").unwrap();
        let got = DefaultEngine
            .occurrences_between(&r, start, start, datetime(2021, 12, 31, 23, 59, 59, 0))
            .unwrap();
        assert_eq!(
            got,
            vec![
                datetime(2021, 1, 25, 23, 59, 0, 0),
                datetime(2021, 4, 25, 23, 59, 0, 0),
                datetime(2021, 7, 25, 23, 59, 0, 0),
                datetime(2021, 10, 25, 23, 59, 0, 0),
            ]
        );
    }

    #[test]
    fn test_last_weekday_of_month() {
        let start = datetime(2021, 1, 4, 17, 0, 0, 0);
        let got = dates(
            "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
            start,
            start,
            datetime(2021, 4, 30, 17, 0, 0, 0),
        );
        assert_eq!(
            got,
            vec![
                date(2021, 1, 29),
                date(2021, 2, 26),
                date(2021, 3, 31),
                date(2021, 4, 30),
            ]
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let start = datetime(2021, 1, 1, 9, 0, 0, 0);
        let got = dates(
            "FREQ=DAILY",
            start,
            datetime(2021, 1, 2, 9, 0, 0, 0),
            datetime(2021, 1, 4, 9, 0, 0, 0),
        );
        assert_eq!(got, vec![date(2021, 1, 2), date(2021, 1, 3), date(2021, 1, 4)]);
    }

    #[test]
    fn test_nothing_before_dtstart() {
        let start = datetime(2021, 1, 26, 9, 0, 0, 0);
        let got = dates(
            "FREQ=MONTHLY;BYMONTHDAY=25",
            start,
            datetime(2021, 1, 1, 0, 0, 0, 0),
            datetime(2021, 3, 1, 0, 0, 0, 0),
        );
        assert_eq!(got, vec![date(2021, 2, 25)]);
    }

    #[test]
    fn test_until_limits_results() {
        let start = datetime(2021, 1, 1, 9, 0, 0, 0);
        let got = dates(
            "FREQ=DAILY;UNTIL=20210103T090000Z",
            start,
            start,
            datetime(2021, 12, 31, 0, 0, 0, 0),
        );
        assert_eq!(got, vec![date(2021, 1, 1), date(2021, 1, 2), date(2021, 1, 3)]);
    }

    #[test]
    fn test_until_before_dtstart_never_fires() {
        let start = datetime(2021, 6, 1, 9, 0, 0, 0);
        let got = dates(
            "FREQ=DAILY;UNTIL=20210101T000000Z",
            start,
            start,
            datetime(2021, 12, 31, 0, 0, 0, 0),
        );
        assert!(got.is_empty());
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let start = datetime(2021, 1, 1, 9, 0, 0, 0);
        let got = dates(
            "FREQ=DAILY",
            start,
            datetime(2021, 2, 1, 0, 0, 0, 0),
            datetime(2021, 1, 1, 0, 0, 0, 0),
        );
        assert!(got.is_empty());
    }

    #[test]
    fn test_sub_daily_rejected() {
        let start = datetime(2021, 1, 1, 9, 0, 0, 0);
        let r = DefaultEngine.parse("FREQ=HOURLY").unwrap();
        assert!(matches!(
            DefaultEngine.occurrences_between(&r, start, start, start),
            Err(RuleError::Eval { .. })
        ));
    }

    #[test]
    fn test_boundary_conversion_keeps_seconds() {
        let dt = datetime(2099, 12, 31, 23, 59, 59, 0);
        assert_eq!(from_rrule(&to_rrule(dt).unwrap()).unwrap(), dt);
    }
}
