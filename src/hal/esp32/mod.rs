//! ESP32 hardware abstraction layer for the split-flap display.
//!
//! GPIO goes straight through `esp_idf_hal::gpio::PinDriver`, which already
//! implements the `embedded-hal` pin traits; this module only adds the
//! timer and the board's pin map.
//!
//! # Hardware Configuration
//!
//! - **Bus**: daisy-chained 74HC595 shift registers, four outputs per motor
//! - **Motors**: 28BYJ-48 unipolar steppers through ULN2003 drivers
//! - **Sensors**: one hall-effect switch per reel, active low at the magnet
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod clock;

pub use clock::Esp32Timer;

/// Pin assignments for the reference build.
///
/// These mirror [`DisplayConfig::default`](crate::DisplayConfig::default);
/// the binary checks the two agree at startup.
pub mod pins {
    // =========================================================================
    // Shift Register Bus (74HC595)
    // =========================================================================

    /// Serial data (DS)
    pub const DATA: i32 = 2;

    /// Shift clock (SH_CP)
    pub const CLOCK: i32 = 3;

    /// Storage latch (ST_CP)
    pub const LATCH: i32 = 4;

    // =========================================================================
    // Hall Sensors
    // =========================================================================

    /// Hall sensor per unit, leftmost unit first
    pub const HALL: [i32; 10] = [12, 11, 10, 9, 8, 14, 15, 16, 17, 18];
}
