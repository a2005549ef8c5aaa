#![no_main]
use jiff::civil::datetime;
use libfuzzer_sys::fuzz_target;
use rrule_describe::{describe_with, DefaultEngine, DescribeConfig, FixedClock};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let start = datetime(2024, 2, 29, 12, 0, 0, 0);
        let config = DescribeConfig::new(s, start);
        let _ = describe_with(&config, &DefaultEngine, &FixedClock(start));
    }
});
