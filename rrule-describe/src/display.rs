use std::fmt;

use crate::ast::*;

/// Canonical RRULE rendering. Parts are written in a fixed order and
/// `INTERVAL=1` is omitted, so equal rules render identically.
impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency)?;

        if let Some(until) = &self.until {
            write!(
                f,
                ";UNTIL={:04}{:02}{:02}T{:02}{:02}{:02}Z",
                until.year(),
                until.month(),
                until.day(),
                until.hour(),
                until.minute(),
                until.second()
            )?;
        }

        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }

        if !self.by_weekday.is_empty() {
            write!(f, ";BYDAY=")?;
            write_list(f, &self.by_weekday, |f, w| write!(f, "{w}"))?;
        }

        if !self.by_month_day.is_empty() {
            write!(f, ";BYMONTHDAY=")?;
            write_list(f, &self.by_month_day, |f, d| write!(f, "{d}"))?;
        }

        if !self.by_month.is_empty() {
            write!(f, ";BYMONTH=")?;
            write_list(f, &self.by_month, |f, m| write!(f, "{}", m.number()))?;
        }

        if !self.by_set_pos.is_empty() {
            write!(f, ";BYSETPOS=")?;
            write_list(f, &self.by_set_pos, |f, p| write!(f, "{p}"))?;
        }

        Ok(())
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFC 5545 form: `MO`, `-1FR`.
impl fmt::Display for WeekdaySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.nth {
            write!(f, "{n}")?;
        }
        f.write_str(self.weekday.code())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut write_item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write_item(f, item)?;
    }
    Ok(())
}

/// Render an integer as an English ordinal, keeping its sign:
/// `1` → `1st`, `12` → `12th`, `-1` → `-1st`, `0` → `0th`.
pub fn ordinalize(n: i64) -> String {
    format!("{n}{}", ordinal_suffix(n.unsigned_abs()))
}

fn ordinal_suffix(n: u64) -> &'static str {
    match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

/// Sentence form of a `BYDAY` entry: `mon`, or `-1st fri` when positioned.
pub fn weekday_phrase(spec: &WeekdaySpec) -> String {
    match spec.nth {
        Some(n) => format!("{} {}", ordinalize(i64::from(n)), spec.weekday.short()),
        None => spec.weekday.short().to_string(),
    }
}
