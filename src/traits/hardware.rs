//! Hardware abstraction traits for the flap bus, steppers, and timing.
//!
//! Digital pins and delays come from `embedded-hal` 1.0
//! ([`OutputPin`], [`InputPin`], [`DelayNs`]). This module adds the pieces
//! `embedded-hal` does not cover:
//!
//! | Trait / type | Purpose |
//! |-------|---------|
//! | [`Clock`] | Monotonic microsecond time source |
//! | [`BitSink`] | Addressable output bit buffer (the shift register) |
//! | [`StepDirection`] | Traversal order of the stepper phase table |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use split_flap::traits::Clock;
//! use split_flap::hal::MockClock;
//! use embedded_hal::delay::DelayNs;
//!
//! let mut clock = MockClock::new();
//! clock.delay_us(1200);
//! assert_eq!(clock.now_us(), 1200);
//! ```
//!
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

/// Order in which a stepper walks its phase table.
///
/// Which one moves the reel "forward" depends on how the coils are wired to
/// the driver. On the reference hardware the reels advance with
/// [`Reverse`](Self::Reverse), which is the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepDirection {
    /// Walk the phase table upward (row 0, 1, 2, ...).
    Forward,
    /// Walk the phase table downward (row 7, 6, 5, ...).
    #[default]
    Reverse,
}

impl StepDirection {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use split_flap::StepDirection;
    ///
    /// assert_eq!(StepDirection::Forward.as_str(), "forward");
    /// assert_eq!(StepDirection::Reverse.as_str(), "reverse");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepDirection::Forward => "forward",
            StepDirection::Reverse => "reverse",
        }
    }

    /// Parse direction from text input.
    ///
    /// Accepts `"forward"`/`"fwd"` and `"reverse"`/`"rev"`, trimmed and
    /// case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use split_flap::StepDirection;
    ///
    /// assert_eq!(StepDirection::from_text(" FWD "), Some(StepDirection::Forward));
    /// assert_eq!(StepDirection::from_text("rev"), Some(StepDirection::Reverse));
    /// assert_eq!(StepDirection::from_text("up"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("forward") || s.eq_ignore_ascii_case("fwd") {
            Some(StepDirection::Forward)
        } else if s.eq_ignore_ascii_case("reverse") || s.eq_ignore_ascii_case("rev") {
            Some(StepDirection::Reverse)
        } else {
            None
        }
    }
}

/// Time source with microsecond resolution.
///
/// Step pacing is computed against absolute timestamps from this clock, so
/// it must be monotonic. On desktop this wraps `std::time::Instant`; on
/// embedded targets, a free-running hardware timer.
pub trait Clock {
    /// Returns microseconds since an arbitrary epoch.
    fn now_us(&self) -> u64;
}

/// A buffer of individually addressable output bits.
///
/// Writes only touch the buffer. Implementations decide when the buffered
/// state reaches hardware (for the shift register, on the next flush).
pub trait BitSink {
    /// Number of addressable bits.
    fn len(&self) -> usize;

    /// Stores `value` at `index`. Out-of-range indices are ignored.
    fn set_bit(&mut self, index: usize, value: bool);

    /// Returns the buffered value at `index`, if in range.
    fn bit(&self, index: usize) -> Option<bool>;

    /// Returns `true` if the sink has no bits.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears every bit.
    fn clear_all(&mut self) {
        for index in 0..self.len() {
            self.set_bit(index, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_direction_default_matches_reference_wiring() {
        assert_eq!(StepDirection::default(), StepDirection::Reverse);
    }

    #[test]
    fn step_direction_from_text() {
        assert_eq!(StepDirection::from_text("forward"), Some(StepDirection::Forward));
        assert_eq!(StepDirection::from_text("Reverse"), Some(StepDirection::Reverse));
        assert_eq!(StepDirection::from_text("\tREV\n"), Some(StepDirection::Reverse));
        assert_eq!(StepDirection::from_text(""), None);
        assert_eq!(StepDirection::from_text("backwards"), None);
    }

    struct ArraySink {
        bits: [bool; 6],
    }

    impl BitSink for ArraySink {
        fn len(&self) -> usize {
            self.bits.len()
        }

        fn set_bit(&mut self, index: usize, value: bool) {
            if let Some(bit) = self.bits.get_mut(index) {
                *bit = value;
            }
        }

        fn bit(&self, index: usize) -> Option<bool> {
            self.bits.get(index).copied()
        }
    }

    #[test]
    fn bit_sink_clear_all_default_impl() {
        let mut sink = ArraySink { bits: [true; 6] };
        assert!(!sink.is_empty());
        sink.clear_all();
        assert_eq!(sink.bits, [false; 6]);
    }

    #[test]
    fn bit_sink_ignores_out_of_range() {
        let mut sink = ArraySink { bits: [false; 6] };
        sink.set_bit(6, true);
        assert_eq!(sink.bit(6), None);
        assert_eq!(sink.bits, [false; 6]);
    }
}
