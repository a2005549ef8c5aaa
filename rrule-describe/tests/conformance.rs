//! Fixture-driven runner over tests/fixtures/describe.json.
//!
//! Every case runs against a fixed clock so that clamping to "now" is
//! reproducible. Failures are collected and reported together.

use jiff::civil::DateTime;
use rrule_describe::{
    describe_with, ordinalize, DefaultEngine, DescribeConfig, FixedClock, Mode, RescheduleOffset,
    RuleError,
};
use serde_json::Value;

static FIXTURES: &str = include_str!("fixtures/describe.json");

fn fixtures() -> Value {
    serde_json::from_str(FIXTURES).expect("fixtures/describe.json is invalid JSON")
}

fn parse_datetime(s: &str) -> DateTime {
    s.parse::<DateTime>()
        .unwrap_or_else(|e| panic!("bad datetime '{s}': {e}"))
}

fn clock_for(root: &Value, case: &Value) -> FixedClock {
    let now = case["now"]
        .as_str()
        .or_else(|| root["now"].as_str())
        .expect("top-level 'now' missing");
    FixedClock(parse_datetime(now))
}

fn tests_array(section: &Value) -> &[Value] {
    section["tests"]
        .as_array()
        .expect("section missing 'tests' array")
        .as_slice()
}

fn test_name(case: &Value, section: &str, index: usize) -> String {
    match case["name"].as_str() {
        Some(n) => format!("{section}.{n}"),
        None => format!("{section}[{index}]"),
    }
}

fn config_for(case: &Value) -> DescribeConfig {
    let rule = case["rule"].as_str().expect("case missing 'rule'");
    let start = parse_datetime(case["start"].as_str().unwrap_or("2021-01-01T00:00:00"));
    let mut config = DescribeConfig::new(rule, start);
    if let Some(end) = case["end"].as_str() {
        config = config.with_end(parse_datetime(end));
    }
    if !case["reschedule"].is_null() {
        let offset: RescheduleOffset = serde_json::from_value(case["reschedule"].clone())
            .expect("bad 'reschedule' object");
        config = config.with_reschedule(offset);
    }
    config
}

fn error_kind(err: &RuleError) -> &'static str {
    match err {
        RuleError::Lex { .. } => "lex",
        RuleError::Parse { .. } => "parse",
        RuleError::UnsupportedFrequency { .. } => "unsupported_frequency",
        RuleError::Eval { .. } => "eval",
        RuleError::Config { .. } => "config",
        RuleError::Cron { .. } => "cron",
        _ => "other",
    }
}

// ---------------------------------------------------------------------------
// FailCollector: run all cases, report all failures at the end
// ---------------------------------------------------------------------------

struct FailCollector {
    failures: Vec<String>,
    pass: usize,
}

impl FailCollector {
    fn new() -> Self {
        Self {
            failures: Vec::new(),
            pass: 0,
        }
    }

    fn fail(&mut self, name: &str, msg: String) {
        self.failures.push(format!("  FAIL {name}: {msg}"));
    }

    fn pass(&mut self) {
        self.pass += 1;
    }

    fn finish(self, label: &str) {
        if self.failures.is_empty() {
            eprintln!("{label}: {}/{} passed", self.pass, self.pass);
        } else {
            let total = self.pass + self.failures.len();
            let msg = format!(
                "{label}: {}/{total} passed, {} failed:\n{}",
                self.pass,
                self.failures.len(),
                self.failures.join("\n")
            );
            panic!("{msg}");
        }
    }
}

// ===========================================================================
// Describe
// ===========================================================================

#[test]
fn conformance_describe() {
    let root = fixtures();
    let mut fc = FailCollector::new();

    for (i, case) in tests_array(&root["describe"]).iter().enumerate() {
        let name = test_name(case, "describe", i);
        let config = config_for(case);
        let clock = clock_for(&root, case);

        let d = match describe_with(&config, &DefaultEngine, &clock) {
            Ok(d) => d,
            Err(e) => {
                fc.fail(&name, format!("describe error: {e}"));
                continue;
            }
        };

        let want_mode = match case["mode"].as_str() {
            Some("pattern") => Mode::Pattern,
            Some("enumerate") => Mode::Enumerate,
            other => panic!("{name}: bad mode {other:?}"),
        };
        if d.mode != want_mode {
            fc.fail(&name, format!("mode: got {:?}, want {want_mode:?}", d.mode));
            continue;
        }

        let want_sentences: Vec<&str> = case["sentences"]
            .as_array()
            .expect("case missing 'sentences'")
            .iter()
            .map(|v| v.as_str().unwrap_or_default())
            .collect();
        if d.sentences != want_sentences {
            fc.fail(
                &name,
                format!("sentences: got {:?}, want {want_sentences:?}", d.sentences),
            );
            continue;
        }

        let want_reschedule = case["reschedule_at"].as_str().map(parse_datetime);
        if d.reschedule_at != want_reschedule {
            fc.fail(
                &name,
                format!(
                    "reschedule_at: got {:?}, want {want_reschedule:?}",
                    d.reschedule_at
                ),
            );
            continue;
        }

        fc.pass();
    }

    fc.finish("describe");
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn conformance_errors() {
    let root = fixtures();
    let mut fc = FailCollector::new();

    for (i, case) in tests_array(&root["errors"]).iter().enumerate() {
        let name = test_name(case, "errors", i);
        let config = config_for(case);
        let clock = clock_for(&root, case);

        match describe_with(&config, &DefaultEngine, &clock) {
            Ok(d) => fc.fail(&name, format!("expected error, got {:?}", d.sentences)),
            Err(e) => {
                let want_kind = case["kind"].as_str().expect("case missing 'kind'");
                if error_kind(&e) != want_kind {
                    fc.fail(&name, format!("kind: got {}, want {want_kind}", error_kind(&e)));
                } else if let Some(msg) = case["message"].as_str() {
                    if e.to_string() != msg {
                        fc.fail(&name, format!("message: got {e:?}, want {msg:?}"));
                    } else {
                        fc.pass();
                    }
                } else {
                    fc.pass();
                }
            }
        }
    }

    fc.finish("errors");
}

// ===========================================================================
// Ordinals
// ===========================================================================

#[test]
fn conformance_ordinalize() {
    let root = fixtures();
    let mut fc = FailCollector::new();

    for (i, case) in tests_array(&root["ordinalize"]).iter().enumerate() {
        let n = case["n"].as_i64().expect("case missing 'n'");
        let want = case["expected"].as_str().expect("case missing 'expected'");
        let got = ordinalize(n);
        if got == want {
            fc.pass();
        } else {
            fc.fail(&format!("ordinalize[{i}]"), format!("got {got:?}, want {want:?}"));
        }
    }

    fc.finish("ordinalize");
}

// ===========================================================================
// Cron
// ===========================================================================

#[test]
fn conformance_cron() {
    let root = fixtures();
    let mut fc = FailCollector::new();

    for (i, case) in tests_array(&root["cron"]).iter().enumerate() {
        let name = test_name(case, "cron", i);
        let config = config_for(case);
        let clock = clock_for(&root, case);
        let d = describe_with(&config, &DefaultEngine, &clock)
            .unwrap_or_else(|e| panic!("{name}: describe error: {e}"));

        match (d.to_cron(), case["cron"].as_array()) {
            (Ok(got), Some(want)) => {
                let want: Vec<&str> = want.iter().map(|v| v.as_str().unwrap_or_default()).collect();
                if got == want {
                    fc.pass();
                } else {
                    fc.fail(&name, format!("got {got:?}, want {want:?}"));
                }
            }
            (Err(RuleError::Cron { .. }), None) => fc.pass(),
            (Ok(got), None) => fc.fail(&name, format!("expected cron error, got {got:?}")),
            (Err(e), _) => fc.fail(&name, format!("unexpected error: {e}")),
        }
    }

    fc.finish("cron");
}
