//! The display controller that renders messages across all units.
//!
//! This module provides [`SplitFlapDisplay`], which owns the shift register
//! bus, every [`FlapUnit`], and the timer, and runs the synchronized
//! scheduling loop.
//!
//! # Scheduling
//!
//! Each iteration of [`display`](SplitFlapDisplay::display):
//!
//! 1. takes the shared deadline as the maximum
//!    [`fastest_guaranteed_end_time`](FlapUnit::fastest_guaranteed_end_time)
//!    over all units,
//! 2. asks every unit for its [`next_step_time`](FlapUnit::next_step_time)
//!    against that deadline and picks the earliest, collecting ties,
//! 3. waits until that time,
//! 4. steps every tied unit with the same timestamp,
//! 5. flushes the bus once.
//!
//! The loop ends when no unit wants another step. The deadline is recomputed
//! every iteration, so it tightens as unhomed units find home and homed
//! units close in on their targets.
//!
//! # Example
//!
//! ```rust
//! use split_flap::hal::{MockClock, MockOutputPin, PinLog, SimulatedHall};
//! use split_flap::{DisplayConfig, SplitFlapDisplay};
//!
//! let config = DisplayConfig::default();
//! let log = PinLog::new();
//! let halls = (0..config.units.len()).map(|i| SimulatedHall::new(i as u32 * 400));
//!
//! let mut display = SplitFlapDisplay::from_config(
//!     &config,
//!     MockOutputPin::new("data", &log),
//!     MockOutputPin::new("clock", &log),
//!     MockOutputPin::new("latch", &log),
//!     halls,
//!     MockClock::new(),
//! )
//! .unwrap();
//!
//! let report = display.display("HELLO", 1000).unwrap();
//! assert!(report.is_complete());
//! assert!(display.state().is_settled());
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::alphabet::BLANK;
use crate::config::DisplayConfig;
use crate::error::{ConfigError, Error};
use crate::flap_unit::{FlapUnit, UnitState};
use crate::hall::{HallSensor, HallSignal};
use crate::shift_register::ShiftRegister;
use crate::stepper::Stepper;
use crate::traits::Clock;
use crate::MAX_UNITS;

/// The whole display: bus, units, and timer.
///
/// # Type Parameters
///
/// - `D`, `C`, `L`: shift register data, clock and latch pins
/// - `H`: hall sensor input pins (one per unit)
/// - `T`: timer providing both [`Clock`] and [`DelayNs`]
///
/// # Thread Safety
///
/// The controller is single-threaded by construction: `display` blocks
/// until the render finishes and is the only code that touches the bus.
/// If other threads need to request messages, hand them over through a
/// channel and call `display` from the one thread that owns this value.
pub struct SplitFlapDisplay<D, C, L, H, T>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
    register: ShiftRegister<D, C, L>,
    units: Vec<FlapUnit<H>, MAX_UNITS>,
    timer: T,
}

impl<D, C, L, H, T> SplitFlapDisplay<D, C, L, H, T>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
    H: InputPin<Error = D::Error>,
    T: Clock + DelayNs,
{
    /// Assembles a display from parts built by the caller.
    ///
    /// Every unit's coils are cleared and flushed once.
    pub fn new(
        register: ShiftRegister<D, C, L>,
        units: Vec<FlapUnit<H>, MAX_UNITS>,
        timer: T,
    ) -> Result<Self, Error<D::Error>> {
        if units.is_empty() {
            return Err(ConfigError::NoUnits.into());
        }
        let mut display = Self {
            register,
            units,
            timer,
        };
        display.release()?;
        Ok(display)
    }

    /// Builds the bus, steppers, sensors and calibrations from `config`.
    ///
    /// `hall_pins` must yield exactly one pin per configured unit, in unit
    /// order. Unit `n` drives shift register outputs `4n..4n + 4`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid or the pin
    /// count does not match, or a pin error while sampling the sensors.
    pub fn from_config(
        config: &DisplayConfig,
        data: D,
        clock: C,
        latch: L,
        hall_pins: impl IntoIterator<Item = H>,
        timer: T,
    ) -> Result<Self, Error<D::Error>> {
        config.validate()?;
        let expected = config.units.len();

        let register = ShiftRegister::new(data, clock, latch, config.bus_length())?;
        let start_us = timer.now_us();

        let mut units = Vec::new();
        let mut actual = 0;
        for (index, pin) in hall_pins.into_iter().enumerate() {
            actual += 1;
            let (Some(unit_config), Some(coils)) =
                (config.units.get(index), register.motor_handles(index))
            else {
                continue;
            };
            let sensor = HallSensor::new(pin).map_err(Error::Pin)?;
            let unit = FlapUnit::new(
                Stepper::new(coils),
                sensor,
                unit_config.calibration(),
                start_us,
            )
            .with_advance(config.advance);
            // Capacity matches config.units, which validate() bounded.
            let _ = units.push(unit);
        }
        if actual != expected {
            return Err(ConfigError::HallPinCount { expected, actual }.into());
        }

        Self::new(register, units, timer)
    }

    /// Renders `message`, blocking until every unit has arrived.
    ///
    /// Character `i` goes to unit `i`. Short messages are padded with blanks,
    /// extra characters are ignored, and characters not on the reel show as
    /// blank. Every motor is de-energized afterwards.
    ///
    /// A unit whose sensor never fires stays unhomed and keeps stepping, so
    /// this only returns once every sensor has been seen. Use
    /// [`display_until`](Self::display_until) to bound a render.
    pub fn display(
        &mut self,
        message: &str,
        min_step_delay_us: u32,
    ) -> Result<RenderReport, Error<D::Error>> {
        self.display_until(message, min_step_delay_us, || false)
    }

    /// Like [`display`](Self::display), but calls `interrupt` before every
    /// scheduling iteration and stops early when it returns `true`.
    ///
    /// An interrupted render still de-energizes every motor. Units keep
    /// whatever position they reached, and the next render continues from
    /// there.
    pub fn display_until<F>(
        &mut self,
        message: &str,
        min_step_delay_us: u32,
        interrupt: F,
    ) -> Result<RenderReport, Error<D::Error>>
    where
        F: FnMut() -> bool,
    {
        self.set_message(message);

        let mut report = RenderReport::new(self.units.len());
        let rendered = self.run(u64::from(min_step_delay_us), interrupt, &mut report);
        let released = self.release();
        rendered?;
        released?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "render {} after {} iterations, {} steps",
            report.outcome,
            report.iterations,
            report.total_steps()
        );
        Ok(report)
    }

    /// Aims every unit at its character of `message`.
    pub fn set_message(&mut self, message: &str) {
        let mut chars = message.chars();
        for unit in self.units.iter_mut() {
            unit.set_target(chars.next().unwrap_or(BLANK));
        }
    }

    /// De-energizes every motor and flushes the bus.
    pub fn release(&mut self) -> Result<(), Error<D::Error>> {
        for unit in self.units.iter_mut() {
            unit.disable(&mut self.register);
        }
        self.register.flush()
    }

    /// Number of flap units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always `false`; a display has at least one unit.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Read access to the units.
    pub fn units(&self) -> &[FlapUnit<H>] {
        &self.units
    }

    /// Read access to the bus.
    pub fn register(&self) -> &ShiftRegister<D, C, L> {
        &self.register
    }

    /// Read access to the timer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Snapshot of every unit.
    pub fn state(&self) -> DisplayState {
        DisplayState {
            units: self.units.iter().map(FlapUnit::state).collect(),
        }
    }

    fn run<F>(
        &mut self,
        min_step_delay_us: u64,
        mut interrupt: F,
        report: &mut RenderReport,
    ) -> Result<(), Error<D::Error>>
    where
        F: FnMut() -> bool,
    {
        let mut tied: Vec<usize, MAX_UNITS> = Vec::new();
        loop {
            if interrupt() {
                report.outcome = RenderOutcome::Interrupted;
                return Ok(());
            }

            let end_us = self
                .units
                .iter()
                .map(|unit| unit.fastest_guaranteed_end_time(min_step_delay_us))
                .max()
                .unwrap_or(0);

            let Some(due_us) = self.collect_due(end_us, min_step_delay_us, &mut tied) else {
                return Ok(());
            };
            let now_us = self.wait_until(due_us);

            for &index in tied.iter() {
                let unit = &mut self.units[index];
                let signal = unit.step(now_us, &mut self.register).map_err(Error::Pin)?;
                if signal == HallSignal::Falling {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("unit {} homed at {}us", index, now_us);
                    report.homed[index] = true;
                }
                report.record_step(index, now_us);
            }
            self.register.flush()?;
            report.iterations += 1;
        }
    }

    /// Fills `tied` with the units due earliest and returns that time.
    fn collect_due(
        &self,
        end_us: u64,
        min_step_delay_us: u64,
        tied: &mut Vec<usize, MAX_UNITS>,
    ) -> Option<u64> {
        tied.clear();
        let mut earliest: Option<u64> = None;
        for (index, unit) in self.units.iter().enumerate() {
            let Some(time) = unit.next_step_time(end_us, min_step_delay_us) else {
                continue;
            };
            match earliest {
                Some(best) if time > best => {}
                Some(best) if time == best => {
                    let _ = tied.push(index);
                }
                _ => {
                    tied.clear();
                    let _ = tied.push(index);
                    earliest = Some(time);
                }
            }
        }
        earliest
    }

    /// Sleeps until `due_us` and returns the timestamp to step with.
    ///
    /// Returns `due_us` itself when we got there in time, so tied units share
    /// one exact timestamp. A late schedule returns the actual time.
    fn wait_until(&mut self, due_us: u64) -> u64 {
        let mut now_us = self.timer.now_us();
        if now_us >= due_us {
            return now_us;
        }
        while now_us < due_us {
            let remaining = (due_us - now_us).min(u64::from(u32::MAX));
            self.timer.delay_us(remaining as u32);
            now_us = self.timer.now_us();
        }
        due_us
    }
}

/// How a render ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderOutcome {
    /// Every unit is homed and on its target.
    Complete,
    /// The interrupt callback stopped the render.
    Interrupted,
}

/// What a render did.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderReport {
    /// How the render ended.
    pub outcome: RenderOutcome,
    /// Scheduling iterations, equal to the number of bus flushes made
    /// while stepping.
    pub iterations: u32,
    /// Steps taken by each unit.
    pub steps: Vec<u32, MAX_UNITS>,
    /// Timestamp of each unit's last step in this render, `None` if idle.
    pub last_step_us: Vec<Option<u64>, MAX_UNITS>,
    /// Units that saw their home edge during this render.
    pub homed: Vec<bool, MAX_UNITS>,
}

impl RenderReport {
    fn new(units: usize) -> Self {
        let mut report = Self {
            outcome: RenderOutcome::Complete,
            iterations: 0,
            steps: Vec::new(),
            last_step_us: Vec::new(),
            homed: Vec::new(),
        };
        let units = units.min(MAX_UNITS);
        let _ = report.steps.resize(units, 0);
        let _ = report.last_step_us.resize(units, None);
        let _ = report.homed.resize(units, false);
        report
    }

    fn record_step(&mut self, index: usize, now_us: u64) {
        if let Some(count) = self.steps.get_mut(index) {
            *count += 1;
        }
        if let Some(last) = self.last_step_us.get_mut(index) {
            *last = Some(now_us);
        }
    }

    /// Returns `true` if the render ran to completion.
    pub fn is_complete(&self) -> bool {
        self.outcome == RenderOutcome::Complete
    }

    /// Steps taken across all units.
    pub fn total_steps(&self) -> u64 {
        self.steps.iter().map(|&s| u64::from(s)).sum()
    }

    /// Number of units that stepped at least once.
    pub fn moved_units(&self) -> usize {
        self.steps.iter().filter(|&&s| s > 0).count()
    }

    /// Spread between the earliest and latest final step among the units
    /// that moved, or `None` if nothing moved.
    pub fn finish_spread_us(&self) -> Option<u64> {
        let mut finishes = self.last_step_us.iter().flatten();
        let first = *finishes.next()?;
        let (min, max) = finishes.fold((first, first), |(min, max), &t| (min.min(t), max.max(t)));
        Some(max - min)
    }
}

/// Snapshot of the whole display.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayState {
    /// Per-unit state, in unit order.
    pub units: Vec<UnitState, MAX_UNITS>,
}

impl DisplayState {
    /// Returns `true` if every unit is homed and on target.
    pub fn is_settled(&self) -> bool {
        self.units.iter().all(UnitState::is_settled)
    }

    /// Returns `true` if every unit is homed.
    pub fn all_homed(&self) -> bool {
        self.units.iter().all(|unit| unit.homed)
    }
}
