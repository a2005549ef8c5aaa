use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jiff::civil::{datetime, DateTime};
use rrule_describe::{describe_with, DefaultEngine, DescribeConfig, FixedClock, RecurrenceRule};

fn fixed_start() -> DateTime {
    datetime(2026, 2, 6, 12, 0, 0, 0)
}

// ---------------------------------------------------------------------------
// Parse benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("simple", |b| {
        b.iter(|| RecurrenceRule::parse(black_box("FREQ=DAILY")).unwrap());
    });

    group.bench_function("complex", |b| {
        b.iter(|| {
            RecurrenceRule::parse(black_box(
                "RRULE:FREQ=MONTHLY;INTERVAL=2;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=1,-1;UNTIL=20301231T000000Z",
            ))
            .unwrap()
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Eval benchmarks
// ---------------------------------------------------------------------------

fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");
    let start = fixed_start();
    let end = datetime(2027, 2, 6, 12, 0, 0, 0);

    let daily = RecurrenceRule::parse("FREQ=DAILY;INTERVAL=2").unwrap();
    group.bench_function("daily_year", |b| {
        b.iter(|| daily.occurrences_between(start, black_box(start), end).unwrap());
    });

    let last_weekday = RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1").unwrap();
    group.bench_function("last_weekday_year", |b| {
        b.iter(|| {
            last_weekday
                .occurrences_between(start, black_box(start), end)
                .unwrap()
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Describe benchmarks
// ---------------------------------------------------------------------------

fn bench_describe(c: &mut Criterion) {
    let mut group = c.benchmark_group("describe");
    let clock = FixedClock(fixed_start());

    let pattern = DescribeConfig::new("FREQ=WEEKLY;BYDAY=MO,WE,FR", fixed_start());
    group.bench_function("pattern", |b| {
        b.iter(|| describe_with(black_box(&pattern), &DefaultEngine, &clock).unwrap());
    });

    let enumerate = DescribeConfig::new("FREQ=WEEKLY;INTERVAL=2;BYDAY=SA,SU", fixed_start());
    group.bench_function("enumerate", |b| {
        b.iter(|| describe_with(black_box(&enumerate), &DefaultEngine, &clock).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_expand, bench_describe);
criterion_main!(benches);
