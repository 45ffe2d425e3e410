//! One reel: stepper, home sensor, calibration, and position tracking.
//!
//! A unit starts unhomed. Its step counter is meaningless until the hall
//! sensor reports a falling edge, after which the position is tracked modulo
//! one revolution and never distrusted again.
//!
//! # Pacing
//!
//! The display never plans velocities centrally. Instead every unit answers
//! two questions:
//!
//! - [`fastest_guaranteed_end_time`](FlapUnit::fastest_guaranteed_end_time):
//!   the latest moment it could need to finish if stepped at full speed from
//!   now on. The display takes the maximum over all units as the shared
//!   deadline.
//! - [`next_step_time`](FlapUnit::next_step_time): when to take the next step
//!   so the remaining steps are spread evenly up to that shared deadline.
//!
//! The unit with the most work therefore runs at full speed and everyone else
//! slows down to land at the same moment.

use embedded_hal::digital::InputPin;

use crate::alphabet::{flap_index, STEPS_PER_REVOLUTION};
use crate::calibration::target_position;
use crate::hall::{HallSensor, HallSignal};
use crate::stepper::Stepper;
use crate::traits::{BitSink, StepDirection};

/// A single split-flap reel.
///
/// # Type Parameter
///
/// - `P`: the hall sensor input pin
#[derive(Debug)]
pub struct FlapUnit<P> {
    stepper: Stepper,
    sensor: HallSensor<P>,
    calibration: u32,
    advance: StepDirection,
    position: u32,
    homed: bool,
    target: u32,
    last_step_us: u64,
}

impl<P: InputPin> FlapUnit<P> {
    /// Creates an unhomed unit.
    ///
    /// `calibration` is the step offset of flap 0 from the home edge (see
    /// [`compute_calibration`](crate::calibration::compute_calibration)).
    /// `start_us` anchors the timing math until the first step.
    pub fn new(stepper: Stepper, sensor: HallSensor<P>, calibration: u32, start_us: u64) -> Self {
        Self {
            stepper,
            sensor,
            calibration: calibration % STEPS_PER_REVOLUTION,
            advance: StepDirection::default(),
            position: 0,
            homed: false,
            target: 0,
            last_step_us: start_us,
        }
    }

    /// Sets the phase table direction that moves this reel forward.
    pub fn with_advance(mut self, advance: StepDirection) -> Self {
        self.advance = advance;
        self
    }

    /// Aims the unit at `symbol`. Unknown symbols aim at the blank flap.
    pub fn set_target(&mut self, symbol: char) {
        self.set_target_index(flap_index(symbol));
    }

    /// Aims the unit at flap `index`.
    pub fn set_target_index(&mut self, index: usize) {
        self.target = target_position(index, self.calibration);
    }

    /// Upper bound on the steps still needed to reach the target.
    ///
    /// Homed units return the forward distance around the reel, always below
    /// one revolution. Unhomed units add a full revolution, since the home
    /// edge may be anywhere ahead.
    pub fn maximum_remaining_steps(&self) -> u32 {
        if self.homed {
            self.forward_distance()
        } else {
            (STEPS_PER_REVOLUTION + self.target).saturating_sub(self.position)
        }
    }

    /// Time at which the unit would finish if stepped every
    /// `min_step_delay_us` from its last step on.
    pub fn fastest_guaranteed_end_time(&self, min_step_delay_us: u64) -> u64 {
        self.last_step_us + u64::from(self.maximum_remaining_steps()) * min_step_delay_us
    }

    /// When this unit should take its next step, or `None` if it is done.
    ///
    /// Homed units spread their remaining steps evenly between the last step
    /// and `end_us`. Unhomed units step at full speed.
    pub fn next_step_time(&self, end_us: u64, min_step_delay_us: u64) -> Option<u64> {
        if !self.homed {
            return Some(self.last_step_us + min_step_delay_us);
        }
        let distance = self.forward_distance();
        if distance == 0 {
            return None;
        }
        let delay = end_us.saturating_sub(self.last_step_us) / u64::from(distance);
        Some(self.last_step_us + delay)
    }

    /// Advances the reel one micro-step at `now_us`.
    ///
    /// The coil pattern is written into `sink`; it takes effect on the next
    /// flush. A falling edge on the hall sensor homes the unit at position 0.
    pub fn step<S: BitSink + ?Sized>(
        &mut self,
        now_us: u64,
        sink: &mut S,
    ) -> Result<HallSignal, P::Error> {
        self.position = if self.homed {
            (self.position + 1) % STEPS_PER_REVOLUTION
        } else {
            self.position.saturating_add(1)
        };
        self.stepper.step(sink, self.advance);
        self.last_step_us = now_us;

        let signal = self.sensor.read_next()?;
        if signal == HallSignal::Falling {
            self.position = 0;
            self.homed = true;
        }
        Ok(signal)
    }

    /// De-energizes the motor. Position, target and homing are kept.
    pub fn disable<S: BitSink + ?Sized>(&mut self, sink: &mut S) {
        self.stepper.disable(sink);
    }

    /// Returns `true` once homed and sitting on the target.
    pub fn is_settled(&self) -> bool {
        self.homed && self.position == self.target
    }

    /// Current step position. Only meaningful once homed.
    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Target step position.
    #[inline]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Whether a home edge has been seen.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Row of the half-step table the motor will energize next.
    #[inline]
    pub fn phase(&self) -> usize {
        self.stepper.phase()
    }

    /// Step offset of flap 0.
    #[inline]
    pub fn calibration(&self) -> u32 {
        self.calibration
    }

    /// Timestamp of the last step (or the start time if never stepped).
    #[inline]
    pub fn last_step_us(&self) -> u64 {
        self.last_step_us
    }

    /// Phase table direction that advances the reel.
    #[inline]
    pub fn advance(&self) -> StepDirection {
        self.advance
    }

    /// Snapshot for UI and diagnostics.
    pub fn state(&self) -> UnitState {
        UnitState {
            position: self.position,
            target: self.target,
            homed: self.homed,
            calibration: self.calibration,
            last_step_us: self.last_step_us,
        }
    }

    fn forward_distance(&self) -> u32 {
        (STEPS_PER_REVOLUTION + self.target - self.position) % STEPS_PER_REVOLUTION
    }
}

/// Snapshot of a [`FlapUnit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitState {
    /// Step position.
    pub position: u32,
    /// Target step position.
    pub target: u32,
    /// Whether the unit has been homed.
    pub homed: bool,
    /// Step offset of flap 0.
    pub calibration: u32,
    /// Timestamp of the last step.
    pub last_step_us: u64,
}

impl UnitState {
    /// Returns `true` once homed and sitting on the target.
    pub fn is_settled(&self) -> bool {
        self.homed && self.position == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::STEPS_PER_FLAP;
    use crate::hal::{MockInputPin, SimulatedHall};
    use crate::shift_register::BitHandle;

    struct Bits {
        bits: [bool; 4],
    }

    impl BitSink for Bits {
        fn len(&self) -> usize {
            4
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

    fn stepper() -> Stepper {
        Stepper::new(core::array::from_fn(BitHandle::new))
    }

    fn unit_with_pin(pin: MockInputPin, calibration: u32) -> FlapUnit<MockInputPin> {
        FlapUnit::new(stepper(), HallSensor::new(pin).unwrap(), calibration, 0)
    }

    /// Steps a simulated reel until its home edge is seen.
    fn homed_unit(calibration: u32) -> FlapUnit<SimulatedHall> {
        let hall = SimulatedHall::new(100);
        let mut unit = FlapUnit::new(stepper(), HallSensor::new(hall).unwrap(), calibration, 0);
        let mut bits = Bits { bits: [false; 4] };
        let mut now = 0;
        while !unit.is_homed() {
            now += 1000;
            unit.step(now, &mut bits).unwrap();
        }
        unit
    }

    #[test]
    fn set_target_applies_calibration() {
        let mut unit = unit_with_pin(MockInputPin::new(false), 13);
        unit.set_target('A');
        assert_eq!(unit.target(), STEPS_PER_FLAP + 13);

        unit.set_target('h');
        assert_eq!(unit.target(), 8 * STEPS_PER_FLAP + 13);

        unit.set_target('~');
        assert_eq!(unit.target(), 13);
    }

    #[test]
    fn set_target_wraps_around_revolution() {
        let mut unit = unit_with_pin(MockInputPin::new(false), 4000);
        unit.set_target('9');
        assert_eq!(unit.target(), (44 * STEPS_PER_FLAP + 4000) % STEPS_PER_REVOLUTION);
        assert!(unit.target() < STEPS_PER_REVOLUTION);
    }

    #[test]
    fn unhomed_remaining_adds_a_revolution() {
        let mut unit = unit_with_pin(MockInputPin::new(false), 0);
        unit.set_target('A');
        assert!(!unit.is_homed());
        assert_eq!(
            unit.maximum_remaining_steps(),
            STEPS_PER_REVOLUTION + STEPS_PER_FLAP
        );

        let mut bits = Bits { bits: [false; 4] };
        for t in 1..=10 {
            unit.step(t * 1000, &mut bits).unwrap();
        }
        assert_eq!(unit.position(), 10);
        assert_eq!(
            unit.maximum_remaining_steps(),
            STEPS_PER_REVOLUTION + STEPS_PER_FLAP - 10
        );
    }

    #[test]
    fn homed_remaining_is_forward_ring_distance() {
        let mut unit = homed_unit(0);
        assert_eq!(unit.position(), 0);

        unit.target = STEPS_PER_REVOLUTION - 1;
        assert_eq!(unit.maximum_remaining_steps(), 4095);

        unit.position = 100;
        unit.target = 50;
        assert_eq!(unit.maximum_remaining_steps(), STEPS_PER_REVOLUTION - 50);

        unit.target = 100;
        assert_eq!(unit.maximum_remaining_steps(), 0);
    }

    #[test]
    fn homed_remaining_stays_below_one_revolution() {
        let mut unit = homed_unit(0);
        for position in (0..STEPS_PER_REVOLUTION).step_by(97) {
            for target in (0..STEPS_PER_REVOLUTION).step_by(89) {
                unit.position = position;
                unit.target = target;
                assert!(unit.maximum_remaining_steps() < STEPS_PER_REVOLUTION);
            }
        }
    }

    #[test]
    fn fastest_end_time_from_last_step() {
        let mut unit = homed_unit(0);
        let last = unit.last_step_us();
        unit.target = 10;
        assert_eq!(unit.fastest_guaranteed_end_time(1000), last + 10_000);
    }

    #[test]
    fn unhomed_next_step_is_full_speed() {
        let unit = unit_with_pin(MockInputPin::new(false), 0);
        assert_eq!(unit.next_step_time(1_000_000, 1200), Some(1200));
    }

    #[test]
    fn homed_at_target_never_steps() {
        let mut unit = homed_unit(0);
        unit.target = unit.position();
        assert!(unit.is_settled());
        assert_eq!(unit.next_step_time(u64::MAX, 1000), None);
    }

    #[test]
    fn homed_steps_are_spread_to_deadline() {
        let mut unit = homed_unit(0);
        let last = unit.last_step_us();
        unit.target = 10;
        assert_eq!(unit.next_step_time(last + 50_000, 1000), Some(last + 5_000));
        // Its own deadline means full speed.
        let end = unit.fastest_guaranteed_end_time(1000);
        assert_eq!(unit.next_step_time(end, 1000), Some(last + 1000));
    }

    #[test]
    fn falling_edge_homes_at_zero() {
        let pin = MockInputPin::new(true);
        let level = pin.clone();
        let mut unit = unit_with_pin(pin, 0);
        let mut bits = Bits { bits: [false; 4] };

        unit.step(10, &mut bits).unwrap();
        unit.step(20, &mut bits).unwrap();
        assert_eq!(unit.position(), 2);
        assert!(!unit.is_homed());

        level.set_level(false);
        assert_eq!(unit.step(30, &mut bits).unwrap(), HallSignal::Falling);
        assert!(unit.is_homed());
        assert_eq!(unit.position(), 0);
        assert_eq!(unit.last_step_us(), 30);
    }

    #[test]
    fn rising_edge_does_not_home() {
        let pin = MockInputPin::new(false);
        let level = pin.clone();
        let mut unit = unit_with_pin(pin, 0);
        let mut bits = Bits { bits: [false; 4] };

        level.set_level(true);
        assert_eq!(unit.step(10, &mut bits).unwrap(), HallSignal::Rising);
        assert!(!unit.is_homed());
    }

    #[test]
    fn homing_is_permanent() {
        let mut unit = homed_unit(0);
        let mut bits = Bits { bits: [false; 4] };
        for t in 0..(2 * STEPS_PER_REVOLUTION as u64) {
            unit.step(1_000_000 + t, &mut bits).unwrap();
            assert!(unit.is_homed());
            assert!(unit.position() < STEPS_PER_REVOLUTION);
        }
    }

    #[test]
    fn step_uses_configured_direction() {
        let mut bits = Bits { bits: [false; 4] };
        let mut unit = unit_with_pin(MockInputPin::new(false), 0);
        unit.step(1, &mut bits).unwrap();
        assert_eq!(unit.stepper.phase(), 7);

        let mut unit = unit_with_pin(MockInputPin::new(false), 0).with_advance(StepDirection::Forward);
        unit.step(1, &mut bits).unwrap();
        assert_eq!(unit.stepper.phase(), 1);
    }

    #[test]
    fn disable_keeps_tracking_state() {
        let mut unit = homed_unit(0);
        unit.set_target('C');
        let before = unit.state();
        let mut bits = Bits { bits: [true; 4] };
        unit.disable(&mut bits);
        assert_eq!(bits.bits, [false; 4]);
        assert_eq!(unit.state(), before);
    }
}
