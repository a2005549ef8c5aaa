#![no_main]
use libfuzzer_sys::fuzz_target;
use rrule_describe::RecurrenceRule;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse should never panic, only return Ok or Err
        if let Ok(rule) = RecurrenceRule::parse(s) {
            let displayed = rule.to_string();
            let reparsed = RecurrenceRule::parse(&displayed)
                .expect("display output must be parseable");
            assert_eq!(rule, reparsed, "roundtrip changed the rule");
        }
    }
});
