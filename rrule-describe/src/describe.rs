//! Turn a recurrence rule into short sentences.
//!
//! Two paths, chosen once per call:
//!
//! - **pattern**: `INTERVAL=1` and no `BYSETPOS=-1`. The BYxxx parts describe a
//!   stable pattern and are rendered directly (`every mon,wed,fri 09:00`).
//! - **enumerate**: anything else. The concrete occurrences drift between
//!   periods, so they are expanded up to the next reschedule date, grouped by
//!   month, and months sharing a day list are merged
//!   (`25 of Jan,Apr,Jul,Oct 23:59`).

use indexmap::IndexMap;
use jiff::civil::{DateTime, Time};
use jiff::Span;

use crate::ast::*;
use crate::clock::{Clock, SystemClock};
use crate::display::{ordinalize, weekday_phrase};
use crate::engine::{DefaultEngine, RuleEngine};
use crate::error::RuleError;

/// How far past the effective start occurrences are expanded before the
/// description has to be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RescheduleOffset {
    pub years: u16,
    pub months: u16,
    pub days: u16,
}

impl Default for RescheduleOffset {
    fn default() -> Self {
        Self {
            years: 1,
            months: 0,
            days: 0,
        }
    }
}

/// Everything one describe call needs. All datetimes are UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescribeConfig {
    /// RRULE value, e.g. `FREQ=MONTHLY;INTERVAL=3;BYMONTHDAY=25`.
    pub rule: String,
    /// DTSTART of the rule. Its time of day is the time of every occurrence.
    pub start: DateTime,
    /// Nominal end; `None` is open ended.
    #[cfg_attr(feature = "serde", serde(default))]
    pub end: Option<DateTime>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reschedule: RescheduleOffset,
}

impl DescribeConfig {
    pub fn new(rule: impl Into<String>, start: DateTime) -> Self {
        Self {
            rule: rule.into(),
            start,
            end: None,
            reschedule: RescheduleOffset::default(),
        }
    }

    pub fn with_end(mut self, end: DateTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_reschedule(mut self, offset: RescheduleOffset) -> Self {
        self.reschedule = offset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    Pattern,
    Enumerate,
}

/// The bounds occurrences are expanded within on the enumerate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Window {
    pub start: DateTime,
    pub end: DateTime,
    /// Set when the nominal end was cut back to the reschedule date.
    pub reschedule_at: Option<DateTime>,
}

/// Months whose occurrences fall on exactly the same days.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DayPattern {
    pub days: Vec<i8>,
    pub months: Vec<MonthName>,
}

impl DayPattern {
    /// Comma-joined day list, the key months are merged on.
    pub fn signature(&self) -> String {
        join(self.days.iter().map(|d| d.to_string()))
    }
}

/// Result of describing a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Description {
    pub mode: Mode,
    pub sentences: Vec<String>,
    pub start_time: TimeOfDay,
    pub reschedule_at: Option<DateTime>,
    pub rule: RecurrenceRule,
    /// Merged month patterns; empty on the pattern path.
    pub patterns: Vec<DayPattern>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub window: Option<Window>,
}

impl Description {
    /// Render as 5-field cron lines.
    pub fn to_cron(&self) -> Result<Vec<String>, RuleError> {
        match self.mode {
            Mode::Pattern => Ok(vec![crate::cron::rule_to_cron(
                &self.rule,
                self.start_time,
            )?]),
            Mode::Enumerate => Ok(crate::cron::patterns_to_cron(
                &self.patterns,
                self.start_time,
            )),
        }
    }
}

/// Describe with the built-in engine and the system clock.
pub fn describe(config: &DescribeConfig) -> Result<Description, RuleError> {
    describe_with(config, &DefaultEngine, &SystemClock)
}

/// Describe with an explicit engine and clock.
pub fn describe_with<E, C>(
    config: &DescribeConfig,
    engine: &E,
    clock: &C,
) -> Result<Description, RuleError>
where
    E: RuleEngine + ?Sized,
    C: Clock + ?Sized,
{
    let rule = engine.parse(&config.rule)?;
    if !rule.frequency.is_supported() {
        return Err(RuleError::unsupported_frequency(
            rule.frequency,
            config.rule.trim(),
        ));
    }
    let start_time = TimeOfDay::of(&config.start);
    let mode = if rule.needs_enumeration() {
        Mode::Enumerate
    } else {
        Mode::Pattern
    };
    tracing::debug!(rule = %rule, ?mode, "describing rule");

    match mode {
        Mode::Pattern => {
            let sentence = render_rule(&rule, start_time)?;
            Ok(Description {
                mode,
                sentences: vec![sentence],
                start_time,
                reschedule_at: None,
                rule,
                patterns: Vec::new(),
                window: None,
            })
        }
        Mode::Enumerate => {
            let window = effective_window(config, clock.now())?;
            let occurrences =
                engine.occurrences_between(&rule, config.start, window.start, window.end)?;
            tracing::debug!(
                count = occurrences.len(),
                start = %window.start,
                end = %window.end,
                "enumerated occurrences"
            );

            let patterns = merge_patterns(&group_by_month(&occurrences));
            let sentences = patterns
                .iter()
                .map(|p| render_pattern(p, start_time))
                .collect();
            Ok(Description {
                mode,
                sentences,
                start_time,
                reschedule_at: window.reschedule_at,
                rule,
                patterns,
                window: Some(window),
            })
        }
    }
}

/// One second before the first day of the month that `offset` lands in,
/// counted from `start`.
pub fn reschedule_window(start: DateTime, offset: RescheduleOffset) -> Result<DateTime, RuleError> {
    let span = Span::new()
        .try_years(offset.years)
        .and_then(|s| s.try_months(offset.months))
        .and_then(|s| s.try_days(offset.days))
        .map_err(|e| RuleError::config(format!("invalid reschedule offset: {e}")))?;
    let shifted = start
        .date()
        .checked_add(span)
        .map_err(|e| RuleError::config(format!("reschedule date out of range: {e}")))?;
    shifted
        .first_of_month()
        .to_datetime(Time::midnight())
        .checked_sub(Span::new().seconds(1))
        .map_err(|e| RuleError::config(format!("reschedule date out of range: {e}")))
}

/// Bounds for enumeration: the start moves up to `now` when it already lies
/// in the past, and the end is cut back to the reschedule date.
pub fn effective_window(config: &DescribeConfig, now: DateTime) -> Result<Window, RuleError> {
    let start = if config.start < now {
        tracing::debug!(start = %config.start, %now, "start is in the past, using now");
        now
    } else {
        config.start
    };

    let reschedule = reschedule_window(start, config.reschedule)?;
    let window = match config.end {
        Some(end) if end <= reschedule => Window {
            start,
            end,
            reschedule_at: None,
        },
        _ => {
            tracing::info!(reschedule_at = %reschedule, "end bound clamped to reschedule date");
            Window {
                start,
                end: reschedule,
                reschedule_at: Some(reschedule),
            }
        }
    };
    Ok(window)
}

/// Days of month per month name, months in first-seen order.
pub fn group_by_month(occurrences: &[DateTime]) -> IndexMap<MonthName, Vec<i8>> {
    let mut months: IndexMap<MonthName, Vec<i8>> = IndexMap::new();
    for dt in occurrences {
        months
            .entry(MonthName::of(dt.date()))
            .or_default()
            .push(dt.day());
    }
    months
}

/// Merge months with identical day lists, keeping first-seen order of both
/// patterns and months.
pub fn merge_patterns(months: &IndexMap<MonthName, Vec<i8>>) -> Vec<DayPattern> {
    let mut patterns: IndexMap<String, DayPattern> = IndexMap::new();
    for (month, days) in months {
        let key = join(days.iter().map(|d| d.to_string()));
        patterns
            .entry(key)
            .or_insert_with(|| DayPattern {
                days: days.clone(),
                months: Vec::new(),
            })
            .months
            .push(*month);
    }
    patterns.into_values().collect()
}

/// `<days> of <months> <HH:MM>`
pub fn render_pattern(pattern: &DayPattern, time: TimeOfDay) -> String {
    format!(
        "{} of {} {time}",
        pattern.signature(),
        join(pattern.months.iter().map(|m| m.as_str().to_string()))
    )
}

/// Render a stable rule directly from its BYxxx parts. Parts the rule leaves
/// out are left out of the sentence too.
pub fn render_rule(rule: &RecurrenceRule, time: TimeOfDay) -> Result<String, RuleError> {
    match rule.frequency {
        Frequency::Daily => Ok(format!("every day {time}")),
        Frequency::Weekly => {
            let days = join(rule.by_weekday.iter().map(weekday_phrase));
            Ok(format!("every {days} {time}"))
        }
        Frequency::Monthly | Frequency::Yearly => {
            let mut out = String::new();

            let month_days: Vec<String> =
                rule.by_month_day.iter().map(|d| d.to_string()).collect();
            push_clause(&mut out, &month_days);

            let positions: Vec<String> = rule
                .by_set_pos
                .iter()
                .map(|p| ordinalize(i64::from(*p)))
                .collect();
            push_clause(&mut out, &positions);

            let weekdays: Vec<String> = rule.by_weekday.iter().map(weekday_phrase).collect();
            push_clause(&mut out, &weekdays);

            out.push_str("of ");
            if rule.frequency == Frequency::Yearly && !rule.by_month.is_empty() {
                out.push_str(&join(rule.by_month.iter().map(|m| m.as_str().to_string())));
            } else {
                out.push_str("month");
            }
            out.push(' ');
            out.push_str(&time.to_string());
            Ok(out)
        }
        other => Err(RuleError::unsupported_frequency(other, rule.to_string())),
    }
}

/// Comma-joined values plus a trailing space; nothing at all when empty.
fn push_clause(out: &mut String, values: &[String]) {
    if !values.is_empty() {
        out.push_str(&values.join(","));
        out.push(' ');
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(",")
}
