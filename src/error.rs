//! Error types.
//!
//! Scheduling math is total; the only runtime failures come from the pins
//! themselves. [`Error`] is generic over the pin error type so it carries
//! whatever the HAL reports (`PinFault` for the mocks, `GpioError` on
//! ESP-IDF). Construction-time problems are reported as [`ConfigError`].

use core::fmt;

/// Error returned by bus, sensor and display operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// A digital pin read or write failed.
    Pin(E),
    /// The display configuration was rejected.
    Config(ConfigError),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Pin(e) => write!(f, "pin error: {:?}", e),
            Error::Config(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

/// Reasons a [`DisplayConfig`](crate::DisplayConfig) can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No flap units were configured.
    NoUnits,
    /// More units than the bus buffer can address.
    TooManyUnits {
        /// Units requested.
        requested: usize,
        /// Maximum supported.
        max: usize,
    },
    /// The minimum step delay must be non-zero.
    ZeroStepDelay,
    /// A macro calibration symbol is not printed on the reel.
    UnknownCalibrationSymbol {
        /// Unit index.
        unit: usize,
        /// The offending symbol.
        symbol: char,
    },
    /// The same GPIO is assigned twice.
    DuplicatePin {
        /// GPIO number.
        pin: i32,
    },
    /// The number of hall sensor pins supplied does not match the units.
    HallPinCount {
        /// Configured units.
        expected: usize,
        /// Pins supplied.
        actual: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoUnits => write!(f, "no flap units configured"),
            ConfigError::TooManyUnits { requested, max } => {
                write!(f, "{} units requested, at most {} supported", requested, max)
            }
            ConfigError::ZeroStepDelay => write!(f, "minimum step delay must be non-zero"),
            ConfigError::UnknownCalibrationSymbol { unit, symbol } => {
                write!(f, "unit {}: calibration symbol {:?} is not on the reel", unit, symbol)
            }
            ConfigError::DuplicatePin { pin } => write!(f, "GPIO {} assigned more than once", pin),
            ConfigError::HallPinCount { expected, actual } => {
                write!(f, "expected {} hall sensor pins, got {}", expected, actual)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[test]
    fn config_error_converts() {
        let err: Error<Infallible> = ConfigError::NoUnits.into();
        assert_eq!(err, Error::Config(ConfigError::NoUnits));
    }

    #[test]
    fn display_messages() {
        let err: Error<u8> = Error::Pin(3);
        assert_eq!(format!("{}", err), "pin error: 3");

        let err: Error<u8> = ConfigError::DuplicatePin { pin: 4 }.into();
        assert_eq!(
            format!("{}", err),
            "invalid configuration: GPIO 4 assigned more than once"
        );

        let err = ConfigError::UnknownCalibrationSymbol { unit: 2, symbol: '~' };
        assert_eq!(
            format!("{}", err),
            "unit 2: calibration symbol '~' is not on the reel"
        );
    }
}
