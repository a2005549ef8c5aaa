//! Basic walkthrough: parse a rule, describe it, render cron lines.

use jiff::civil::datetime;
use rrule_describe::{describe_with, DefaultEngine, DescribeConfig, FixedClock, RecurrenceRule};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse and re-display a rule
    let rule: RecurrenceRule = "rrule:freq=monthly;interval=3;bymonthday=25".parse()?;
    println!("Parsed: {rule}");

    // A stable rule renders straight from its parts
    let start = datetime(2021, 1, 4, 9, 0, 0, 0);
    let clock = FixedClock(start);
    let weekly = DescribeConfig::new("FREQ=WEEKLY;BYDAY=MO,WE,FR", start);
    let description = describe_with(&weekly, &DefaultEngine, &clock)?;
    println!("\n{}:", weekly.rule);
    for sentence in &description.sentences {
        println!("  {sentence}");
    }

    // A drifting rule is expanded and merged by month
    let quarterly = DescribeConfig::new(rule.to_string(), start.with().hour(23).minute(59).build()?)
        .with_end(datetime(2023, 5, 30, 23, 59, 0, 0));
    let description = describe_with(&quarterly, &DefaultEngine, &clock)?;
    println!("\n{}:", quarterly.rule);
    for sentence in &description.sentences {
        println!("  {sentence}");
    }
    if let Some(at) = description.reschedule_at {
        println!("  (describe again after {at})");
    }

    // Cron lines for schedulers
    for line in description.to_cron()? {
        println!("  cron: {line}");
    }

    Ok(())
}
