use clap::Parser;
use jiff::civil::DateTime;
use rrule_describe::{
    describe_with, effective_window, Clock, DefaultEngine, DescribeConfig, RecurrenceRule,
    RuleError, SystemClock,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rrule-describe",
    about = "Describe recurrence rules as short, cron-adjacent sentences",
    version
)]
struct Cli {
    /// RRULE value (e.g., "FREQ=WEEKLY;BYDAY=MO,WE,FR")
    rule: Option<String>,

    /// Rule start, UTC (e.g., 2021-01-04T09:00). Defaults to now.
    #[arg(long)]
    start: Option<String>,

    /// Rule end, UTC. Open ended when omitted.
    #[arg(long)]
    end: Option<String>,

    /// Years between descriptions
    #[arg(long)]
    reschedule_years: Option<u16>,

    /// Months between descriptions
    #[arg(long)]
    reschedule_months: Option<u16>,

    /// Days between descriptions
    #[arg(long)]
    reschedule_days: Option<u16>,

    /// Read the rule, bounds and offset from a JSON file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print cron lines instead of sentences
    #[arg(long)]
    cron: bool,

    /// Validate the rule without describing it
    #[arg(long)]
    check: bool,

    /// Print the occurrences inside the effective window
    #[arg(long)]
    occurrences: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.rule.is_none() && cli.config.is_none() {
        eprintln!("error: no rule provided");
        process::exit(2);
    }

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => fail(&e),
    };

    if cli.check {
        match check(&config.rule) {
            Ok(()) => {
                println!("\u{2713} valid");
                process::exit(0);
            }
            Err(e) => fail(&e),
        }
    }

    if cli.occurrences {
        let results = match occurrences(&config) {
            Ok(r) => r,
            Err(e) => fail(&e),
        };
        if results.is_empty() {
            eprintln!("no occurrences in window");
            process::exit(0);
        }
        if cli.json {
            let iso_strings: Vec<String> = results.iter().map(|dt| dt.to_string()).collect();
            print_json(&iso_strings);
        } else {
            for dt in &results {
                println!("{dt}");
            }
        }
        process::exit(0);
    }

    let description = match describe_with(&config, &DefaultEngine, &SystemClock) {
        Ok(d) => d,
        Err(e) => fail(&e),
    };

    if cli.cron {
        match description.to_cron() {
            Ok(lines) => {
                if cli.json {
                    print_json(&lines);
                } else {
                    for line in &lines {
                        println!("{line}");
                    }
                }
                process::exit(0);
            }
            Err(e) => fail(&e),
        }
    }

    if cli.json {
        print_json(&description);
        process::exit(0);
    }

    if let Some(at) = description.reschedule_at {
        println!("reschedule: {at}");
    }
    if description.sentences.is_empty() {
        eprintln!("no occurrences in window");
    }
    for sentence in &description.sentences {
        println!("{sentence}");
    }
}

/// `RUST_LOG` wins; otherwise `-v` picks the level, default warn.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn build_config(cli: &Cli) -> Result<DescribeConfig, RuleError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DescribeConfig::new(String::new(), SystemClock.now()),
    };

    if let Some(rule) = &cli.rule {
        config.rule = rule.clone();
    }
    if let Some(start) = &cli.start {
        config.start = parse_datetime("--start", start)?;
    }
    if let Some(end) = &cli.end {
        config.end = Some(parse_datetime("--end", end)?);
    }
    if let Some(years) = cli.reschedule_years {
        config.reschedule.years = years;
    }
    if let Some(months) = cli.reschedule_months {
        config.reschedule.months = months;
    }
    if let Some(days) = cli.reschedule_days {
        config.reschedule.days = days;
    }

    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn load_config(path: &Path) -> Result<DescribeConfig, RuleError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RuleError::config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| RuleError::config(format!("invalid config {}: {e}", path.display())))
}

fn parse_datetime(flag: &str, s: &str) -> Result<DateTime, RuleError> {
    s.parse::<DateTime>()
        .map_err(|e| RuleError::config(format!("invalid {flag} datetime: {e}")))
}

fn check(rule: &str) -> Result<(), RuleError> {
    let parsed = RecurrenceRule::parse(rule)?;
    if !parsed.frequency.is_supported() {
        return Err(RuleError::unsupported_frequency(parsed.frequency, rule.trim()));
    }
    Ok(())
}

fn occurrences(config: &DescribeConfig) -> Result<Vec<DateTime>, RuleError> {
    check(&config.rule)?;
    let rule = RecurrenceRule::parse(&config.rule)?;
    let window = effective_window(config, SystemClock.now())?;
    rule.occurrences_between(config.start, window.start, window.end)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: failed to serialize: {e}");
            process::exit(1);
        }
    }
}

fn fail(e: &RuleError) -> ! {
    eprintln!("{}", e.display_rich());
    process::exit(1);
}
