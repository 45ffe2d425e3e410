//! Four-phase unipolar stepper driven through shift register outputs.
//!
//! The coils are energized with the eight-row half-step sequence in
//! [`HALF_STEP_SEQUENCE`]. Neighbouring rows differ in exactly one coil, which
//! keeps the rotor torque smooth.

use crate::shift_register::{BitHandle, PHASES_PER_MOTOR};
use crate::traits::{BitSink, StepDirection};

/// Half-step coil pattern, one row per phase.
pub const HALF_STEP_SEQUENCE: [[bool; PHASES_PER_MOTOR]; 8] = [
    [true, false, false, false],
    [true, true, false, false],
    [false, true, false, false],
    [false, true, true, false],
    [false, false, true, false],
    [false, false, true, true],
    [false, false, false, true],
    [true, false, false, true],
];

/// One stepper motor wired to four shift register outputs.
///
/// The stepper does not own the outputs. Each call is handed the
/// [`BitSink`] to write into; the new coil state reaches the motor on the
/// sink's next flush.
///
/// # Example
///
/// ```rust
/// use split_flap::shift_register::BitHandle;
/// use split_flap::stepper::Stepper;
/// use split_flap::traits::{BitSink, StepDirection};
/// # struct Bits([bool; 4]);
/// # impl BitSink for Bits {
/// #     fn len(&self) -> usize { 4 }
/// #     fn set_bit(&mut self, i: usize, v: bool) { self.0[i] = v; }
/// #     fn bit(&self, i: usize) -> Option<bool> { self.0.get(i).copied() }
/// # }
///
/// let mut bits = Bits([false; 4]);
/// let mut stepper = Stepper::new(core::array::from_fn(BitHandle::new));
///
/// stepper.step(&mut bits, StepDirection::Forward);
/// assert_eq!(bits.0, [true, false, false, false]);
/// assert_eq!(stepper.phase(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Stepper {
    coils: [BitHandle; PHASES_PER_MOTOR],
    phase: usize,
}

impl Stepper {
    /// Creates a stepper at phase 0. Coils are not written until the first
    /// [`step`](Self::step) or [`disable`](Self::disable).
    pub fn new(coils: [BitHandle; PHASES_PER_MOTOR]) -> Self {
        Self { coils, phase: 0 }
    }

    /// Current row of the phase table, in `0..8`.
    #[inline]
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Writes the current phase row, then moves one row in `direction`.
    pub fn step<S: BitSink + ?Sized>(&mut self, sink: &mut S, direction: StepDirection) {
        let row = HALF_STEP_SEQUENCE[self.phase];
        for (coil, &energized) in self.coils.iter().zip(row.iter()) {
            coil.set(sink, energized);
        }
        let len = HALF_STEP_SEQUENCE.len();
        self.phase = match direction {
            StepDirection::Forward => (self.phase + 1) % len,
            StepDirection::Reverse => (self.phase + len - 1) % len,
        };
    }

    /// De-energizes all four coils. The phase index is kept, so the next
    /// step resumes the sequence where it left off.
    pub fn disable<S: BitSink + ?Sized>(&mut self, sink: &mut S) {
        for coil in &self.coils {
            coil.set(sink, false);
        }
    }
}
