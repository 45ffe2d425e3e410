//! ESP32-S3 split-flap display firmware.
//!
//! This is the main entry point for the physical display. It:
//! - Builds the shift register bus and one hall sensor input per unit
//! - Homes every reel by rendering a boot message
//! - Reads lines from the serial console and renders each one
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/xtensa-esp32s3-espidf/release/esp32_main
//! ```

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use esp_idf_hal::gpio::{
    AnyIOPin, AnyOutputPin, IOPin as _, Input, Output, OutputPin as _, PinDriver, Pull,
};
use esp_idf_hal::peripherals::Peripherals;
use split_flap::hal::esp32::{pins, Esp32Timer};
use split_flap::traits::Clock;
use split_flap::{DisplayConfig, SplitFlapDisplay};

/// Shown at power-up; rendering it also homes every unit.
const BOOT_MESSAGE: &str = "HELLO";

/// Console poll interval while no input is pending.
const IDLE_POLL_MS: u64 = 50;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type HallPin = PinDriver<'static, AnyIOPin, Input>;

/// Pull-ups need an IO-capable pin driver, so hall pins are downgraded to `AnyIOPin`.
fn hall_input(pin: AnyIOPin) -> anyhow::Result<HallPin> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Up)?;
    Ok(driver)
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    println!();
    println!("================================");
    println!("  split-flap display");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = DisplayConfig::default();
    config.validate()?;
    let bus = config.bus.pins();
    if bus != [pins::DATA, pins::CLOCK, pins::LATCH] {
        return Err(anyhow!("bus pins {:?} do not match the board wiring", bus));
    }
    let halls: Vec<i32> = config.units.iter().map(|u| u.hall_pin).collect();
    if halls != pins::HALL {
        return Err(anyhow!("hall pins {:?} do not match the board wiring", halls));
    }
    for (index, unit) in config.units.iter().enumerate() {
        println!(
            "[CAL] unit {:>2}: '{}' {:+4} -> {:>4}",
            index,
            unit.macro_calibration,
            unit.micro_calibration,
            unit.calibration()
        );
    }

    let peripherals = Peripherals::take()?;
    let p = peripherals.pins;

    // =========================================================================
    // Shift Register Bus (GPIO2/3/4)
    // =========================================================================
    let data: OutPin = PinDriver::output(p.gpio2.downgrade_output())?;
    let clock: OutPin = PinDriver::output(p.gpio3.downgrade_output())?;
    let latch: OutPin = PinDriver::output(p.gpio4.downgrade_output())?;
    println!("[OK] Shift register bus initialized (GPIO2/3/4)");

    // =========================================================================
    // Hall Sensors, in unit order
    // =========================================================================
    let hall_pins = [
        hall_input(p.gpio12.downgrade())?,
        hall_input(p.gpio11.downgrade())?,
        hall_input(p.gpio10.downgrade())?,
        hall_input(p.gpio9.downgrade())?,
        hall_input(p.gpio8.downgrade())?,
        hall_input(p.gpio14.downgrade())?,
        hall_input(p.gpio15.downgrade())?,
        hall_input(p.gpio16.downgrade())?,
        hall_input(p.gpio17.downgrade())?,
        hall_input(p.gpio18.downgrade())?,
    ];
    println!("[OK] Hall sensors initialized ({} units)", hall_pins.len());

    let mut display =
        SplitFlapDisplay::from_config(&config, data, clock, latch, hall_pins, Esp32Timer::new())
            .map_err(|e| anyhow!("display init failed: {:?}", e))?;
    println!("[OK] Display ready");

    // =========================================================================
    // Homing
    // =========================================================================
    let report = display
        .display(BOOT_MESSAGE, config.min_step_delay_us)
        .map_err(|e| anyhow!("boot render failed: {:?}", e))?;
    println!(
        "[RENDER] '{}' in {} steps, homed {}/{}",
        BOOT_MESSAGE,
        report.total_steps(),
        report.homed.iter().filter(|&&h| h).count(),
        display.len()
    );

    // =========================================================================
    // Main Loop
    // =========================================================================
    println!();
    println!("Type a message and press enter.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                thread::sleep(Duration::from_millis(IDLE_POLL_MS));
                continue;
            }
            Ok(_) => {}
        }

        let message = line.trim_end_matches(['\r', '\n']);
        let started = display.timer().now_us();
        match display.display(message, config.min_step_delay_us) {
            Ok(report) => println!(
                "[RENDER] '{}' in {} ms, {} steps, {} iterations",
                message,
                (display.timer().now_us() - started) / 1000,
                report.total_steps(),
                report.iterations
            ),
            Err(e) => println!("[ERR] render failed: {:?}", e),
        }
    }
}
