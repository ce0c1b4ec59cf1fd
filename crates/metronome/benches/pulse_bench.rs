//! Pulse generation benchmarks
//!
//! Benchmarks for beat generation across interval, schedule, and period
//! cadences, plus the calendar arithmetic backing period pulses. Async
//! benches run on a paused runtime so timer waits advance virtual time
//! instead of sleeping.
//!
//! Run with: `cargo bench --bench pulse_bench -p metronome`

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use metronome::testing::VirtualClock;
use metronome::{
    interval_pulse_with, period_pulse_with, schedule_pulse_with, Beat, CalendarPeriod, Clock,
    Pulse, Schedule,
};

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("failed to build tokio runtime for pulse benchmarks")
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
}

/// Drains `pulse` to exhaustion and returns its final beat.
async fn drain<C: Clock>(mut pulse: Pulse<C>) -> Option<Beat> {
    let mut last = None;
    while let Some(beat) = pulse.next_beat().await {
        last = Some(beat);
    }
    last
}

// ============================================================================
// Interval Pulse Benchmarks
// ============================================================================

fn bench_interval_pulse(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_pulse");
    let rt = paused_runtime();

    for beats in [100u32, 1000] {
        group.throughput(Throughput::Elements(u64::from(beats)));
        group.bench_with_input(BenchmarkId::new("one_second", beats), &beats, |b, &beats| {
            b.to_async(&rt).iter(|| async move {
                let clock = VirtualClock::start_at(epoch());
                let pulse =
                    interval_pulse_with(clock, Duration::from_secs(1)).take(beats).unwrap();
                black_box(drain(pulse).await);
            });
        });
    }

    group.finish();
}

// ============================================================================
// Schedule Pulse Benchmarks
// ============================================================================

fn bench_schedule_pulse(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_pulse");
    let rt = paused_runtime();

    // One simulated day of a minutely schedule: a field match plus one timer
    // round-trip per beat.
    group.throughput(Throughput::Elements(1440));
    group.bench_function("minutely_for_a_day", |b| {
        b.to_async(&rt).iter(|| async move {
            let clock = VirtualClock::start_at(epoch());
            let pulse = schedule_pulse_with(clock, Schedule::new().at_second(0))
                .unwrap()
                .take(1440)
                .unwrap();
            black_box(drain(pulse).await);
        });
    });

    group.finish();
}

// ============================================================================
// Period Pulse Benchmarks
// ============================================================================

fn bench_period_pulse(c: &mut Criterion) {
    let mut group = c.benchmark_group("period_pulse");
    let rt = paused_runtime();

    // Thirty simulated days at one day per beat; cost is dominated by the
    // one-minute re-checks inside each day-long wait.
    group.throughput(Throughput::Elements(30));
    group.bench_function("daily_for_a_month", |b| {
        b.to_async(&rt).iter(|| async move {
            let clock = VirtualClock::start_at(epoch());
            let pulse = period_pulse_with(clock, CalendarPeriod::days(1), chrono_tz::UTC)
                .take(30)
                .unwrap();
            black_box(drain(pulse).await);
        });
    });

    group.finish();
}

// ============================================================================
// Period Arithmetic Benchmarks
// ============================================================================

fn bench_period_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("period_arithmetic");
    let start = Utc.with_ymd_and_hms(2024, 1, 31, 17, 0, 0).single().unwrap();

    group.throughput(Throughput::Elements(1));
    group.bench_function("one_month_wall_clock", |b| {
        let period = CalendarPeriod::months(1);
        b.iter(|| {
            let next = black_box(period).add_to(black_box(start), New_York);
            black_box(next);
        });
    });

    group.bench_function("one_day_wall_clock", |b| {
        let period = CalendarPeriod::days(1);
        b.iter(|| {
            let next = black_box(period).add_to(black_box(start), New_York);
            black_box(next);
        });
    });

    // Pure time-unit periods skip the wall-clock round-trip entirely.
    group.bench_function("two_hours_fixed", |b| {
        let period = CalendarPeriod::hours(2);
        b.iter(|| {
            let next = black_box(period).add_to(black_box(start), New_York);
            black_box(next);
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(pulses, bench_interval_pulse, bench_schedule_pulse, bench_period_pulse,);

criterion_group!(arithmetic, bench_period_arithmetic,);

criterion_main!(pulses, arithmetic);
