//! # split-flap
//!
//! Firmware core for a split-flap display: a row of mechanical reels, each
//! turned by its own stepper motor and homed by its own hall sensor, all
//! driven through one chain of shift registers.
//!
//! ## Features
//!
//! - **Hardware abstraction**: generic over `embedded-hal` 1.0 pins and delays
//! - **Homing**: every reel finds its absolute position from a sensor edge
//!   while the message is being rendered
//! - **Synchronized arrival**: slower units pace themselves so every reel
//!   lands on its symbol at the same moment
//! - **Calibration**: per-unit offsets read off the reel once at assembly
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Clock, bit sink and direction abstractions
//! - `alphabet` / `calibration` - symbol table and step arithmetic
//! - `shift_register` / `stepper` / `hall` - the three pieces of hardware
//! - `flap_unit` - one reel with its own pacing
//! - `display` - the controller that schedules every unit
//! - `hal` - concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use split_flap::hal::{MockClock, MockOutputPin, PinLog, SimulatedHall};
//! use split_flap::{DisplayConfig, SplitFlapDisplay};
//!
//! let config = DisplayConfig::uniform(3);
//! let log = PinLog::new();
//! let mut display = SplitFlapDisplay::from_config(
//!     &config,
//!     MockOutputPin::new("data", &log),
//!     MockOutputPin::new("clock", &log),
//!     MockOutputPin::new("latch", &log),
//!     [SimulatedHall::new(0), SimulatedHall::new(1000), SimulatedHall::new(3000)],
//!     MockClock::new(),
//! )
//! .unwrap();
//!
//! let report = display.display("YES", config.min_step_delay_us).unwrap();
//! assert!(report.is_complete());
//! assert!(display.state().is_settled());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Maximum number of flap units on one bus.
pub const MAX_UNITS: usize = 32;

/// Maximum number of shift register outputs, four per unit.
pub const MAX_BITS: usize = 4 * MAX_UNITS;

/// The reel's symbol set and step geometry.
pub mod alphabet;
/// Calibration and target position arithmetic.
pub mod calibration;
/// Deployment configuration shared by desktop and ESP32.
pub mod config;
/// The display controller and its scheduling loop.
pub mod display;
/// Error types.
pub mod error;
/// One reel with stepper, sensor and pacing.
pub mod flap_unit;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Hall sensor edge detection.
pub mod hall;
/// Serial-in, parallel-out output bus.
pub mod shift_register;
/// Half-step stepper sequencing.
pub mod stepper;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use config::{BusConfig, DisplayConfig, UnitConfig};
pub use display::{DisplayState, RenderOutcome, RenderReport, SplitFlapDisplay};
pub use error::{ConfigError, Error};
pub use flap_unit::{FlapUnit, UnitState};
pub use hall::{HallSensor, HallSignal};
pub use shift_register::{BitHandle, ShiftRegister};
pub use stepper::Stepper;
pub use traits::{BitSink, Clock, StepDirection};
