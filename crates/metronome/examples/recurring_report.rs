//! Example: Running a recurring job on a pulse
//!
//! This example builds an interval pulse, bounds it with `take`, and runs
//! an action on every beat under the default cancelling-sequential mode.
//! It then assembles a calendar schedule of the kind used for daily jobs.
//!
//! Run with: `cargo run --example recurring_report -p metronome`
//!
//! Set `RUST_LOG=metronome=debug` to see the emitted beat and delay logs.

use std::time::Duration;

use chrono_tz::America::New_York;
use metronome::{interval_pulse, PulseResult, RecurringJobMode, Schedule};

#[tokio::main]
async fn main() -> PulseResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Recurring report example");
    println!("========================\n");

    // Example 1: a bounded interval pulse on the system clock.
    println!("Running three reports, one per second:");

    let pulse = interval_pulse(Duration::from_secs(1)).take(3)?;
    pulse
        .beat_with(RecurringJobMode::CancellingSequential, |beat| async move {
            println!(
                "  report at {} (drift {} ms)",
                beat.occurred.format("%H:%M:%S%.3f"),
                beat.drift().num_milliseconds()
            );
        })
        .await;

    // Example 2: a daily digest at 06:30 New York time. Awaiting this
    // pulse would suspend until the next matching wall-clock instant, so
    // the schedule is only assembled and inspected here.
    let digest = Schedule::new()
        .in_timezone(New_York)
        .at_hour(6)
        .at_minute(30)
        .at_second(0);

    println!("\nDaily digest schedule:");
    println!("  timezone: {}", digest.timezone());
    println!("  hour:     {:?}", digest.hour());
    println!("  minute:   {:?}", digest.minute());

    // Uncomment to wait for the next 06:30 in New York:
    // metronome::schedule_pulse(digest)?
    //     .take(1)?
    //     .beat(|beat| async move {
    //         println!("digest fired at {}", beat.occurred);
    //     })
    //     .await;

    println!("\nDone.");
    Ok(())
}
