//! Desktop simulation of the reference display.
//!
//! Renders messages on the mock HAL with simulated hall sensors and prints
//! what each render did.
//!
//! ```bash
//! cargo run --bin simulate -- "HELLO WORLD"
//! cargo run --bin simulate -- --delay 1500 --realtime "HI" "BYE"
//! cargo run --bin simulate -- --advance forward "FWD"
//! ```
//!
//! By default time is simulated and a render finishes instantly. With
//! `--realtime` the loop runs on the wall clock, as it would on hardware.

use std::env;

use anyhow::{anyhow, bail, Context};
use embedded_hal::delay::DelayNs;
use split_flap::alphabet::STEPS_PER_REVOLUTION;
use split_flap::hal::{HostTimer, MockClock, MockOutputPin, PinLog, SimulatedHall};
use split_flap::traits::Clock;
use split_flap::{DisplayConfig, RenderReport, SplitFlapDisplay, StepDirection};

struct Options {
    messages: Vec<String>,
    min_step_delay_us: Option<u32>,
    advance: Option<StepDirection>,
    realtime: bool,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut options = Options {
        messages: Vec::new(),
        min_step_delay_us: None,
        advance: None,
        realtime: false,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--realtime" => options.realtime = true,
            "--delay" => {
                let value = args.next().context("--delay needs a value in microseconds")?;
                let us = value
                    .parse()
                    .with_context(|| format!("invalid --delay '{}'", value))?;
                options.min_step_delay_us = Some(us);
            }
            "--advance" => {
                let value = args.next().context("--advance needs forward or reverse")?;
                let direction = StepDirection::from_text(&value)
                    .with_context(|| format!("invalid --advance '{}'", value))?;
                options.advance = Some(direction);
            }
            "-h" | "--help" => {
                println!("usage: simulate [--delay US] [--advance DIR] [--realtime] [MESSAGE]...");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            _ => options.messages.push(arg),
        }
    }
    if options.messages.is_empty() {
        options.messages.push("HELLO".into());
    }
    Ok(options)
}

/// Scatters the reels so every unit starts at a different angle.
fn start_angle(unit: usize) -> u32 {
    (unit as u32 * 1237 + 311) % STEPS_PER_REVOLUTION
}

fn print_report(message: &str, report: &RenderReport, elapsed_us: u64) {
    println!(
        "[RENDER] '{}': {:?} in {:.3} s, {} iterations, {} steps",
        message,
        report.outcome,
        elapsed_us as f64 / 1e6,
        report.iterations,
        report.total_steps()
    );
    for (unit, steps) in report.steps.iter().enumerate() {
        let homed = if report.homed[unit] { " (homed)" } else { "" };
        println!("         unit {:>2}: {:>5} steps{}", unit, steps, homed);
    }
    if let Some(spread) = report.finish_spread_us() {
        println!("         finish spread: {} us", spread);
    }
}

fn run<T: Clock + DelayNs>(config: &DisplayConfig, messages: &[String], timer: T) -> anyhow::Result<()> {
    let log = PinLog::new();
    let halls = (0..config.units.len()).map(|unit| SimulatedHall::new(start_angle(unit)));
    let mut display = SplitFlapDisplay::from_config(
        config,
        MockOutputPin::new("data", &log),
        MockOutputPin::new("clock", &log),
        MockOutputPin::new("latch", &log),
        halls,
        timer,
    )
    .map_err(|e| anyhow!("display init failed: {}", e))?;
    println!(
        "[OK] Simulated display with {} units, advancing {}",
        display.len(),
        config.advance.as_str()
    );

    for message in messages {
        log.clear();
        let started = display.timer().now_us();
        let report = display
            .display(message, config.min_step_delay_us)
            .map_err(|e| anyhow!("render failed: {}", e))?;
        print_report(message, &report, display.timer().now_us() - started);
        println!("         bus writes: {} events", log.events().len());
    }

    let state = display.state();
    println!(
        "[OK] settled: {}, homed: {}",
        state.is_settled(),
        state.all_homed()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let options = parse_args()?;

    let mut config = DisplayConfig::default();
    if let Some(us) = options.min_step_delay_us {
        config = config.with_min_step_delay_us(us);
    }
    if let Some(direction) = options.advance {
        config = config.with_advance(direction);
    }
    config.validate()?;

    for (index, unit) in config.units.iter().enumerate() {
        println!(
            "[CAL] unit {:>2}: '{}' {:+4} -> {:>4}",
            index,
            unit.macro_calibration,
            unit.micro_calibration,
            unit.calibration()
        );
    }

    if options.realtime {
        run(&config, &options.messages, HostTimer::new())
    } else {
        run(&config, &options.messages, MockClock::new())
    }
}
