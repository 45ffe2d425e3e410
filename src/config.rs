//! Deployment configuration for a split-flap display.
//!
//! Everything that differs between builds of the same hardware lives here:
//! GPIO numbers for the shift register bus, one hall sensor GPIO per unit,
//! and each unit's factory calibration reading. Uses `heapless::Vec` so the
//! same type works on `no_std` targets.
//!
//! # Example
//!
//! ```rust
//! use split_flap::config::{BusConfig, DisplayConfig, UnitConfig};
//!
//! // The 10-unit reference build
//! let config = DisplayConfig::default();
//! assert_eq!(config.units.len(), 10);
//! assert!(config.validate().is_ok());
//!
//! // Or build one up
//! let config = DisplayConfig::empty()
//!     .with_bus(BusConfig::new(5, 6, 7))
//!     .with_unit(UnitConfig::new(8, 'K', 86))
//!     .with_unit(UnitConfig::new(9, ' ', 60))
//!     .with_min_step_delay_us(1500);
//! assert_eq!(config.units[0].calibration(), 3134);
//! ```

use heapless::Vec;

use crate::alphabet::{is_displayable, ALPHABET, FLAP_COUNT, STEPS_PER_FLAP};
use crate::calibration::compute_calibration;
use crate::error::ConfigError;
use crate::traits::StepDirection;
use crate::MAX_UNITS;

/// Default minimum delay between two steps of one motor, in microseconds.
pub const DEFAULT_MIN_STEP_DELAY_US: u32 = 1200;

// ============================================================================
// Reference deployment
// ============================================================================

const REFERENCE_HALL_PINS: [i32; 10] = [12, 11, 10, 9, 8, 14, 15, 16, 17, 18];
const REFERENCE_MACRO_CALIBRATIONS: [char; 10] = [' ', 'V', 'K', 'U', 'Q', 'G', '$', 'R', 'R', '9'];
const REFERENCE_MICRO_CALIBRATIONS: [i32; 10] = [60, 40, 86, 40, 55, 248, 0, 50, 50, 25];

// ============================================================================
// Main Config
// ============================================================================

/// Complete display configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    /// Shift register bus pins
    pub bus: BusConfig,
    /// Flap units, in message order
    pub units: Vec<UnitConfig, MAX_UNITS>,
    /// Minimum delay between steps of one motor (microseconds)
    pub min_step_delay_us: u32,
    /// Phase table direction that advances the reels
    pub advance: StepDirection,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let mut config = Self::empty();
        for ((&hall_pin, &symbol), &micro) in REFERENCE_HALL_PINS
            .iter()
            .zip(REFERENCE_MACRO_CALIBRATIONS.iter())
            .zip(REFERENCE_MICRO_CALIBRATIONS.iter())
        {
            let _ = config.push_unit(UnitConfig::new(hall_pin, symbol, micro));
        }
        config
    }
}

impl DisplayConfig {
    /// Configuration with the default bus and no units.
    pub fn empty() -> Self {
        Self {
            bus: BusConfig::default(),
            units: Vec::new(),
            min_step_delay_us: DEFAULT_MIN_STEP_DELAY_US,
            advance: StepDirection::default(),
        }
    }

    /// `count` identical units whose flap 0 sits exactly on the home edge.
    ///
    /// Hall sensors are numbered upward from GPIO 5. Handy for bench rigs
    /// and simulation. `count` is capped at [`MAX_UNITS`].
    pub fn uniform(count: usize) -> Self {
        let mut config = Self::empty();
        let last = ALPHABET[FLAP_COUNT - 1];
        let centering = -((STEPS_PER_FLAP / 2) as i32);
        for index in 0..count.min(MAX_UNITS) {
            let _ = config.push_unit(UnitConfig::new(5 + index as i32, last, centering));
        }
        config
    }

    /// Set the bus pins
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Append a unit. Units beyond [`MAX_UNITS`] are dropped; use
    /// [`push_unit`](Self::push_unit) to detect that.
    pub fn with_unit(mut self, unit: UnitConfig) -> Self {
        let _ = self.push_unit(unit);
        self
    }

    /// Set the minimum step delay
    pub fn with_min_step_delay_us(mut self, us: u32) -> Self {
        self.min_step_delay_us = us;
        self
    }

    /// Set the phase table direction that advances the reels
    pub fn with_advance(mut self, advance: StepDirection) -> Self {
        self.advance = advance;
        self
    }

    /// Append a unit.
    pub fn push_unit(&mut self, unit: UnitConfig) -> Result<(), ConfigError> {
        self.units.push(unit).map_err(|_| ConfigError::TooManyUnits {
            requested: MAX_UNITS + 1,
            max: MAX_UNITS,
        })
    }

    /// Number of shift register outputs the units need.
    pub fn bus_length(&self) -> usize {
        self.units.len() * crate::shift_register::PHASES_PER_MOTOR
    }

    /// Checks the configuration for problems the hardware cannot detect.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoUnits`] if no units are configured
    /// - [`ConfigError::ZeroStepDelay`] if the step delay is zero
    /// - [`ConfigError::UnknownCalibrationSymbol`] if a macro calibration
    ///   symbol is not printed on the reel
    /// - [`ConfigError::DuplicatePin`] if a GPIO is used twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::NoUnits);
        }
        if self.min_step_delay_us == 0 {
            return Err(ConfigError::ZeroStepDelay);
        }
        for (unit, config) in self.units.iter().enumerate() {
            if !is_displayable(config.macro_calibration) {
                return Err(ConfigError::UnknownCalibrationSymbol {
                    unit,
                    symbol: config.macro_calibration,
                });
            }
        }

        let mut pins: Vec<i32, { MAX_UNITS + 3 }> = Vec::new();
        let all = self.bus.pins().into_iter().chain(self.units.iter().map(|u| u.hall_pin));
        for pin in all {
            if pins.contains(&pin) {
                return Err(ConfigError::DuplicatePin { pin });
            }
            let _ = pins.push(pin);
        }
        Ok(())
    }
}

// ============================================================================
// Bus Config
// ============================================================================

/// Shift register bus GPIOs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Serial data (DS)
    pub data_pin: i32,
    /// Shift clock (SH_CP)
    pub clock_pin: i32,
    /// Storage latch (ST_CP)
    pub latch_pin: i32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new(2, 3, 4)
    }
}

impl BusConfig {
    /// Create a bus config
    pub const fn new(data_pin: i32, clock_pin: i32, latch_pin: i32) -> Self {
        Self {
            data_pin,
            clock_pin,
            latch_pin,
        }
    }

    /// Data, clock and latch, in that order
    pub const fn pins(&self) -> [i32; 3] {
        [self.data_pin, self.clock_pin, self.latch_pin]
    }
}

// ============================================================================
// Unit Config
// ============================================================================

/// One flap unit's wiring and factory calibration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitConfig {
    /// Hall sensor GPIO
    pub hall_pin: i32,
    /// Symbol closest to home, read off the reel at calibration time
    pub macro_calibration: char,
    /// Fine correction in micro-steps
    pub micro_calibration: i32,
}

impl UnitConfig {
    /// Create a unit config
    pub const fn new(hall_pin: i32, macro_calibration: char, micro_calibration: i32) -> Self {
        Self {
            hall_pin,
            macro_calibration,
            micro_calibration,
        }
    }

    /// Step offset of flap 0 from the home edge.
    pub fn calibration(&self) -> u32 {
        compute_calibration(self.macro_calibration, self.micro_calibration)
    }
}
