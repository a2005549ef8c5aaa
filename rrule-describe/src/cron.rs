use crate::ast::*;
use crate::describe::DayPattern;
use crate::error::RuleError;

/// Convert a stable rule to a 5-field cron expression (minute hour dom month dow).
pub fn rule_to_cron(rule: &RecurrenceRule, time: TimeOfDay) -> Result<String, RuleError> {
    if rule.interval > 1 {
        return Err(RuleError::cron(
            "not expressible as cron (intervals greater than 1 not supported)",
        ));
    }
    if rule.until.is_some() {
        return Err(RuleError::cron(
            "not expressible as cron (UNTIL not supported)",
        ));
    }
    if !rule.by_set_pos.is_empty() {
        return Err(RuleError::cron(
            "not expressible as cron (BYSETPOS not supported)",
        ));
    }
    if rule.by_weekday.iter().any(|w| w.nth.is_some()) {
        return Err(RuleError::cron(
            "not expressible as cron (nth weekday of month not supported)",
        ));
    }
    if rule.by_month_day.iter().any(|d| *d < 0) {
        return Err(RuleError::cron(
            "not expressible as cron (days counted from month end not supported)",
        ));
    }

    match rule.frequency {
        Frequency::Daily => {
            if !rule.by_month_day.is_empty() || !rule.by_month.is_empty() {
                return Err(RuleError::cron(
                    "not expressible as cron (filtered daily rules not supported)",
                ));
            }
            let dow = weekday_field(&rule.by_weekday);
            Ok(format!("{} {} * * {}", time.minute, time.hour, dow))
        }

        Frequency::Weekly => {
            if rule.by_weekday.is_empty() {
                return Err(RuleError::cron(
                    "not expressible as cron (weekday taken from the start date)",
                ));
            }
            if !rule.by_month_day.is_empty() || !rule.by_month.is_empty() {
                return Err(RuleError::cron(
                    "not expressible as cron (filtered weekly rules not supported)",
                ));
            }
            let dow = weekday_field(&rule.by_weekday);
            Ok(format!("{} {} * * {}", time.minute, time.hour, dow))
        }

        Frequency::Monthly => {
            if !rule.by_month.is_empty() {
                return Err(RuleError::cron(
                    "not expressible as cron (BYMONTH on monthly rules not supported)",
                ));
            }
            match (rule.by_month_day.is_empty(), rule.by_weekday.is_empty()) {
                (false, true) => Ok(format!(
                    "{} {} {} * *",
                    time.minute,
                    time.hour,
                    join_numbers(&rule.by_month_day)
                )),
                (true, false) => Ok(format!(
                    "{} {} * * {}",
                    time.minute,
                    time.hour,
                    weekday_field(&rule.by_weekday)
                )),
                // cron ORs dom and dow, RRULE intersects them
                (false, false) => Err(RuleError::cron(
                    "not expressible as cron (BYMONTHDAY combined with BYDAY not supported)",
                )),
                (true, true) => Err(RuleError::cron(
                    "not expressible as cron (day taken from the start date)",
                )),
            }
        }

        Frequency::Yearly => {
            if rule.by_month.is_empty() || rule.by_month_day.is_empty() {
                return Err(RuleError::cron(
                    "not expressible as cron (yearly rules need BYMONTH and BYMONTHDAY)",
                ));
            }
            if !rule.by_weekday.is_empty() {
                return Err(RuleError::cron(
                    "not expressible as cron (BYDAY on yearly rules not supported)",
                ));
            }
            Ok(format!(
                "{} {} {} {} *",
                time.minute,
                time.hour,
                join_numbers(&rule.by_month_day),
                month_field(&rule.by_month)
            ))
        }

        other => Err(RuleError::cron(format!(
            "not expressible as cron ({other} rules not supported)"
        ))),
    }
}

/// One cron line per merged month pattern.
pub fn patterns_to_cron(patterns: &[DayPattern], time: TimeOfDay) -> Vec<String> {
    patterns
        .iter()
        .map(|p| {
            format!(
                "{} {} {} {} *",
                time.minute,
                time.hour,
                join_numbers(&p.days),
                month_field(&p.months)
            )
        })
        .collect()
}

fn weekday_field(days: &[WeekdaySpec]) -> String {
    if days.is_empty() {
        return "*".to_string();
    }
    let mut nums: Vec<u8> = days.iter().map(|d| cron_dow_number(d.weekday)).collect();
    nums.sort_unstable();
    nums.dedup();
    join_numbers(&nums)
}

fn month_field(months: &[MonthName]) -> String {
    let nums: Vec<u8> = months.iter().map(|m| m.number()).collect();
    join_numbers(&nums)
}

fn join_numbers<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Cron uses 0=Sunday, 1=Monday, ..., 6=Saturday.
fn cron_dow_number(day: Weekday) -> u8 {
    match day {
        Weekday::Sunday => 0,
        Weekday::Monday => 1,
        Weekday::Tuesday => 2,
        Weekday::Wednesday => 3,
        Weekday::Thursday => 4,
        Weekday::Friday => 5,
        Weekday::Saturday => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const NINE: TimeOfDay = TimeOfDay { hour: 9, minute: 30 };

    fn cron(rule: &str) -> Result<String, RuleError> {
        rule_to_cron(&parse(rule).unwrap(), NINE)
    }

    #[test]
    fn test_daily() {
        assert_eq!(cron("FREQ=DAILY").unwrap(), "30 9 * * *");
        assert_eq!(cron("FREQ=DAILY;BYDAY=SA,SU").unwrap(), "30 9 * * 0,6");
    }

    #[test]
    fn test_weekly_sorted_dow() {
        assert_eq!(
            cron("FREQ=WEEKLY;BYDAY=FR,MO,WE").unwrap(),
            "30 9 * * 1,3,5"
        );
    }

    #[test]
    fn test_monthly() {
        assert_eq!(
            cron("FREQ=MONTHLY;BYMONTHDAY=1,15").unwrap(),
            "30 9 1,15 * *"
        );
        assert_eq!(cron("FREQ=MONTHLY;BYDAY=TU").unwrap(), "30 9 * * 2");
    }

    #[test]
    fn test_yearly() {
        assert_eq!(
            cron("FREQ=YEARLY;BYMONTH=12;BYMONTHDAY=25").unwrap(),
            "30 9 25 12 *"
        );
    }

    #[test]
    fn test_not_expressible() {
        for rule in [
            "FREQ=MONTHLY;BYDAY=MO,TU;BYSETPOS=1",
            "FREQ=MONTHLY;BYDAY=-1FR",
            "FREQ=MONTHLY;BYMONTHDAY=-1",
            "FREQ=MONTHLY;BYMONTHDAY=13;BYDAY=FR",
            "FREQ=MONTHLY",
            "FREQ=WEEKLY",
            "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO",
            "FREQ=DAILY;UNTIL=20300101",
            "FREQ=YEARLY;BYMONTHDAY=1",
            "FREQ=HOURLY",
        ] {
            let err = cron(rule).unwrap_err();
            assert!(
                err.to_string().starts_with("not expressible as cron"),
                "{rule}: {err}"
            );
        }
    }

    #[test]
    fn test_patterns() {
        let patterns = vec![
            DayPattern {
                days: vec![25],
                months: vec![MonthName::January, MonthName::April],
            },
            DayPattern {
                days: vec![1, 2],
                months: vec![MonthName::May],
            },
        ];
        assert_eq!(
            patterns_to_cron(&patterns, NINE),
            vec!["30 9 25 1,4 *", "30 9 1,2 5 *"]
        );
    }
}
