//! Bit-banged serial-in/parallel-out shift register chain.
//!
//! All motor phase lines sit behind one chain of 74HC595-style registers on
//! three GPIOs (data, clock, latch). [`ShiftRegister`] keeps the desired
//! output state in a buffer; nothing reaches the pins until
//! [`flush`](ShiftRegister::flush), which shifts out the whole buffer and
//! latches it in one go, so outputs never show a half-written state.
//!
//! [`BitHandle`] names one buffer position. Steppers hold handles and write
//! through any [`BitSink`] they are handed, so no long-lived reference into
//! the bus is kept.
//!
//! # Example
//!
//! ```rust
//! use split_flap::hal::{MockOutputPin, PinLog};
//! use split_flap::traits::BitSink;
//! use split_flap::ShiftRegister;
//!
//! let log = PinLog::new();
//! let mut register = ShiftRegister::new(
//!     MockOutputPin::new("data", &log),
//!     MockOutputPin::new("clock", &log),
//!     MockOutputPin::new("latch", &log),
//!     8,
//! )
//! .unwrap();
//!
//! let handle = register.handle(3).unwrap();
//! handle.set(&mut register, true);
//! assert_eq!(register.bit(3), Some(true));
//!
//! register.flush().unwrap();
//! assert_eq!(log.latched(), vec![false, false, false, false, true, false, false, false]);
//! ```

use embedded_hal::digital::{OutputPin, PinState};
use heapless::Vec;

use crate::error::{ConfigError, Error};
use crate::traits::BitSink;
use crate::MAX_BITS;

/// Number of register outputs driving one stepper.
pub const PHASES_PER_MOTOR: usize = 4;

/// Buffered driver for a SIPO shift register chain.
///
/// # Type Parameters
///
/// - `D`: data (serial input) pin
/// - `C`: shift clock pin
/// - `L`: storage latch pin
///
/// All three share one error type.
///
/// Dropping the register clears every output and flushes once more, so the
/// motors are de-energized when the bus goes away.
pub struct ShiftRegister<D, C, L>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
    data: D,
    clock: C,
    latch: L,
    bits: Vec<bool, MAX_BITS>,
}

impl<D, C, L> ShiftRegister<D, C, L>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
    /// Creates a register with `length` outputs, all low, and flushes that
    /// state to the pins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooManyUnits`] if `length` exceeds
    /// [`MAX_BITS`], or a pin error from the initial flush.
    pub fn new(data: D, clock: C, latch: L, length: usize) -> Result<Self, Error<D::Error>> {
        let mut bits = Vec::new();
        if bits.resize(length, false).is_err() {
            return Err(ConfigError::TooManyUnits {
                requested: length.div_ceil(PHASES_PER_MOTOR),
                max: MAX_BITS / PHASES_PER_MOTOR,
            }
            .into());
        }

        let mut register = Self {
            data,
            clock,
            latch,
            bits,
        };
        register.flush()?;
        Ok(register)
    }

    /// Returns a handle for output `index`, or `None` if out of range.
    pub fn handle(&self, index: usize) -> Option<BitHandle> {
        (index < self.bits.len()).then_some(BitHandle::new(index))
    }

    /// Returns the four phase handles for motor `motor`.
    ///
    /// Motor `n` owns outputs `4n..4n + 4`.
    pub fn motor_handles(&self, motor: usize) -> Option<[BitHandle; PHASES_PER_MOTOR]> {
        let base = motor.checked_mul(PHASES_PER_MOTOR)?;
        if base + PHASES_PER_MOTOR > self.bits.len() {
            return None;
        }
        Some(core::array::from_fn(|phase| BitHandle::new(base + phase)))
    }

    /// Buffered output state, first output first.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Shifts the whole buffer out and latches it.
    ///
    /// The last buffered bit is shifted first, so after the latch it sits at
    /// the far end of the chain and the first bit lands on the first output.
    pub fn flush(&mut self) -> Result<(), Error<D::Error>> {
        self.latch.set_low().map_err(Error::Pin)?;
        for &bit in self.bits.iter().rev() {
            self.data.set_state(PinState::from(bit)).map_err(Error::Pin)?;
            self.clock.set_high().map_err(Error::Pin)?;
            self.clock.set_low().map_err(Error::Pin)?;
        }
        self.latch.set_high().map_err(Error::Pin)
    }

    /// Clears the buffer and flushes.
    pub fn clear(&mut self) -> Result<(), Error<D::Error>> {
        self.clear_all();
        self.flush()
    }
}

impl<D, C, L> BitSink for ShiftRegister<D, C, L>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
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

impl<D, C, L> Drop for ShiftRegister<D, C, L>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
    fn drop(&mut self) {
        // Nothing to report to from here; the outputs are best effort.
        let _ = self.clear();
    }
}

/// A position in a [`BitSink`].
///
/// Handles are plain indices: copying one does not alias the buffer, and a
/// write borrows the sink only for the duration of the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitHandle {
    index: usize,
}

impl BitHandle {
    /// Creates a handle for bit `index`.
    pub const fn new(index: usize) -> Self {
        Self { index }
    }

    /// The bit position this handle addresses.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Writes `value` to this handle's bit in `sink`.
    #[inline]
    pub fn set<S: BitSink + ?Sized>(&self, sink: &mut S, value: bool) {
        sink.set_bit(self.index, value);
    }

    /// Reads this handle's bit from `sink`.
    #[inline]
    pub fn get<S: BitSink + ?Sized>(&self, sink: &S) -> Option<bool> {
        sink.bit(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockOutputPin, PinEvent, PinLog};

    fn register(log: &PinLog, length: usize) -> ShiftRegister<MockOutputPin, MockOutputPin, MockOutputPin> {
        ShiftRegister::new(
            MockOutputPin::new("data", log),
            MockOutputPin::new("clock", log),
            MockOutputPin::new("latch", log),
            length,
        )
        .unwrap()
    }

    #[test]
    fn new_flushes_all_low() {
        let log = PinLog::new();
        let reg = register(&log, 8);
        assert_eq!(reg.bits(), &[false; 8]);
        assert_eq!(log.latch_count(), 1);
        assert_eq!(log.latched(), vec![false; 8]);
    }

    #[test]
    fn rejects_oversized_buffer() {
        let log = PinLog::new();
        let result = ShiftRegister::new(
            MockOutputPin::new("data", &log),
            MockOutputPin::new("clock", &log),
            MockOutputPin::new("latch", &log),
            MAX_BITS + 1,
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::TooManyUnits { .. }))
        ));
    }

    #[test]
    fn set_bit_is_buffered_until_flush() {
        let log = PinLog::new();
        let mut reg = register(&log, 4);
        log.clear();

        reg.set_bit(2, true);
        assert!(log.events().is_empty());

        reg.flush().unwrap();
        assert_eq!(log.latched(), vec![false, false, true, false]);
    }

    #[test]
    fn flush_shifts_last_bit_first() {
        let log = PinLog::new();
        let mut reg = register(&log, 3);
        reg.set_bit(0, true);
        log.clear();
        reg.flush().unwrap();

        let events = log.events();
        assert_eq!(events.first(), Some(&PinEvent::new("latch", false)));
        assert_eq!(events.last(), Some(&PinEvent::new("latch", true)));

        // data, clock high, clock low per bit; last buffered bit goes out first
        let body = &events[1..events.len() - 1];
        assert_eq!(body.len(), 9);
        assert_eq!(body[0], PinEvent::new("data", false));
        assert_eq!(body[1], PinEvent::new("clock", true));
        assert_eq!(body[2], PinEvent::new("clock", false));
        assert_eq!(body[6], PinEvent::new("data", true));
    }

    #[test]
    fn buffer_persists_across_flushes() {
        let log = PinLog::new();
        let mut reg = register(&log, 4);
        reg.set_bit(1, true);
        reg.flush().unwrap();
        reg.set_bit(3, true);
        reg.flush().unwrap();
        assert_eq!(log.latched(), vec![false, true, false, true]);
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let log = PinLog::new();
        let mut reg = register(&log, 4);
        reg.set_bit(4, true);
        assert_eq!(reg.bits(), &[false; 4]);
        assert!(reg.handle(4).is_none());
    }

    #[test]
    fn motor_handles_are_disjoint() {
        let log = PinLog::new();
        let reg = register(&log, 8);
        let first = reg.motor_handles(0).unwrap();
        let second = reg.motor_handles(1).unwrap();
        assert_eq!(first.map(|h| h.index()), [0, 1, 2, 3]);
        assert_eq!(second.map(|h| h.index()), [4, 5, 6, 7]);
        assert!(reg.motor_handles(2).is_none());
    }

    #[test]
    fn handle_writes_through_sink() {
        let log = PinLog::new();
        let mut reg = register(&log, 4);
        let handle = BitHandle::new(1);
        handle.set(&mut reg, true);
        assert_eq!(handle.get(&reg), Some(true));
        handle.set(&mut reg, false);
        assert_eq!(handle.get(&reg), Some(false));
    }

    #[test]
    fn drop_clears_outputs() {
        let log = PinLog::new();
        {
            let mut reg = register(&log, 4);
            reg.set_bit(0, true);
            reg.set_bit(2, true);
            reg.flush().unwrap();
            assert_eq!(log.latched(), vec![true, false, true, false]);
        }
        assert_eq!(log.latched(), vec![false; 4]);
    }
}
