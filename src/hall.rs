//! Hall-effect home sensor with edge detection.
//!
//! Each reel carries a magnet that passes its hall sensor once per
//! revolution. The unit only cares about transitions, so [`HallSensor`]
//! remembers the previous level and classifies every new sample.

use embedded_hal::digital::InputPin;

/// Result of comparing a sensor sample to the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HallSignal {
    /// Level unchanged.
    Flat,
    /// Low to high.
    Rising,
    /// High to low. This edge defines the home position.
    Falling,
}

/// Edge detector over one digital input.
///
/// The initial level is whatever the pin reads at construction.
///
/// # Example
///
/// ```rust
/// use split_flap::hal::MockInputPin;
/// use split_flap::{HallSensor, HallSignal};
///
/// let pin = MockInputPin::new(false);
/// let level = pin.clone();
/// let mut sensor = HallSensor::new(pin).unwrap();
///
/// assert_eq!(sensor.read_next().unwrap(), HallSignal::Flat);
/// level.set_level(true);
/// assert_eq!(sensor.read_next().unwrap(), HallSignal::Rising);
/// level.set_level(false);
/// assert_eq!(sensor.read_next().unwrap(), HallSignal::Falling);
/// ```
#[derive(Debug)]
pub struct HallSensor<P> {
    pin: P,
    previous: bool,
}

impl<P: InputPin> HallSensor<P> {
    /// Samples the pin once to seed the previous level.
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        let previous = pin.is_high()?;
        Ok(Self { pin, previous })
    }

    /// Samples the pin and reports the transition since the last sample.
    pub fn read_next(&mut self) -> Result<HallSignal, P::Error> {
        let next = self.pin.is_high()?;
        if next == self.previous {
            return Ok(HallSignal::Flat);
        }
        self.previous = next;
        Ok(if next {
            HallSignal::Rising
        } else {
            HallSignal::Falling
        })
    }

    /// Level seen by the most recent sample.
    #[inline]
    pub fn last_level(&self) -> bool {
        self.previous
    }
}
