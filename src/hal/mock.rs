//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the GPIO and timing traits the
//! display is generic over, enabling development and testing on desktop
//! without a shift register or motors attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockOutputPin`] | [`OutputPin`] | Records every level change into a shared [`PinLog`] |
//! | [`MockInputPin`] | [`InputPin`] | Level set by the test through a shared handle |
//! | [`SimulatedHall`] | [`InputPin`] | Hall sensor on a reel that turns one step per read |
//! | [`MockClock`] | [`Clock`] + [`DelayNs`] | Time that only moves when someone delays |
//!
//! Pins report [`PinFault`] as their error. They never fail unless built
//! with [`MockOutputPin::failing_at`] or [`SimulatedHall::with_fault_at`].
//!
//! # Example
//!
//! ```rust
//! use split_flap::hal::{MockClock, MockOutputPin, PinLog, SimulatedHall};
//! use split_flap::{DisplayConfig, SplitFlapDisplay};
//!
//! let log = PinLog::new();
//! let config = DisplayConfig::uniform(2);
//! let mut display = SplitFlapDisplay::from_config(
//!     &config,
//!     MockOutputPin::new("data", &log),
//!     MockOutputPin::new("clock", &log),
//!     MockOutputPin::new("latch", &log),
//!     [SimulatedHall::new(0), SimulatedHall::new(2048)],
//!     MockClock::new(),
//! )
//! .unwrap();
//!
//! display.display("OK", 1200).unwrap();
//!
//! // Motors are released once the message is up
//! assert_eq!(log.latched(), [false; 8]);
//! ```
//!
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs
//! [`Clock`]: crate::traits::Clock

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::alphabet::STEPS_PER_REVOLUTION;
use crate::traits::Clock;

/// Error reported by a mock pin that was told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ============================================================================
// Output Pins
// ============================================================================

/// One recorded level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinEvent {
    /// Name given to the pin at construction.
    pub pin: &'static str,
    /// Level written.
    pub high: bool,
}

impl PinEvent {
    /// Creates an event.
    pub const fn new(pin: &'static str, high: bool) -> Self {
        Self { pin, high }
    }
}

/// Shared, ordered record of writes to a group of [`MockOutputPin`]s.
///
/// Clones share the same record, so a test keeps one handle while the pins
/// move into the code under test.
///
/// The decoding helpers assume the pins are named `"data"`, `"clock"` and
/// `"latch"`.
#[derive(Clone, Debug, Default)]
pub struct PinLog {
    events: Rc<RefCell<Vec<PinEvent>>>,
}

impl PinLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Copy of every event, oldest first.
    pub fn events(&self) -> Vec<PinEvent> {
        self.events.borrow().clone()
    }

    /// Number of times the latch pin was driven high.
    pub fn latch_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.pin == "latch" && e.high)
            .count()
    }

    /// Register outputs presented by the most recent latch, output 0 first.
    ///
    /// Replays the log through a model of a serial-in, parallel-out chain:
    /// each rising clock edge samples the data level, and a rising latch
    /// edge presents everything shifted since the latch last went low. The
    /// first bit shifted ends up on the highest output.
    pub fn latched(&self) -> Vec<bool> {
        let mut data = false;
        let mut clock = false;
        let mut latch = false;
        let mut shifted = Vec::new();
        let mut frame = Vec::new();

        for event in self.events.borrow().iter() {
            match event.pin {
                "data" => data = event.high,
                "clock" => {
                    if event.high && !clock {
                        shifted.push(data);
                    }
                    clock = event.high;
                }
                "latch" => {
                    if event.high && !latch {
                        frame = core::mem::take(&mut shifted);
                    } else if !event.high {
                        shifted.clear();
                    }
                    latch = event.high;
                }
                _ => {}
            }
        }
        frame.reverse();
        frame
    }

    fn record(&self, pin: &'static str, high: bool) {
        self.events.borrow_mut().push(PinEvent::new(pin, high));
    }
}

/// Output pin that writes every level change into a [`PinLog`].
///
/// # Example
///
/// ```rust
/// use embedded_hal::digital::OutputPin;
/// use split_flap::hal::{MockOutputPin, PinEvent, PinLog};
///
/// let log = PinLog::new();
/// let mut pin = MockOutputPin::new("latch", &log);
/// pin.set_high().unwrap();
/// pin.set_low().unwrap();
///
/// assert_eq!(
///     log.events(),
///     [PinEvent::new("latch", true), PinEvent::new("latch", false)]
/// );
/// assert!(!pin.is_set_high());
/// ```
#[derive(Debug)]
pub struct MockOutputPin {
    name: &'static str,
    level: bool,
    log: PinLog,
    writes: usize,
    fault_at: Option<usize>,
}

impl MockOutputPin {
    /// Creates a low pin recording into `log` under `name`.
    pub fn new(name: &'static str, log: &PinLog) -> Self {
        Self {
            name,
            level: false,
            log: log.clone(),
            writes: 0,
            fault_at: None,
        }
    }

    /// Like [`new`](Self::new), but write number `write` (counting from 0)
    /// fails with [`PinFault`]. The failed write changes nothing and is not
    /// logged; every other write succeeds.
    pub fn failing_at(name: &'static str, log: &PinLog, write: usize) -> Self {
        Self {
            fault_at: Some(write),
            ..Self::new(name, log)
        }
    }

    /// Last level written.
    pub fn is_set_high(&self) -> bool {
        self.level
    }

    /// Writes attempted so far, failed ones included.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn write(&mut self, high: bool) -> Result<(), PinFault> {
        let attempt = self.writes;
        self.writes += 1;
        if self.fault_at == Some(attempt) {
            return Err(PinFault);
        }
        self.level = high;
        self.log.record(self.name, high);
        Ok(())
    }
}

impl ErrorType for MockOutputPin {
    type Error = PinFault;
}

impl OutputPin for MockOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ============================================================================
// Input Pins
// ============================================================================

/// Input pin whose level is set from the test.
///
/// Clones share one level.
#[derive(Clone, Debug, Default)]
pub struct MockInputPin {
    level: Rc<Cell<bool>>,
}

impl MockInputPin {
    /// Creates a pin reading `high`.
    pub fn new(high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(high)),
        }
    }

    /// Sets the level every clone reads from now on.
    pub fn set_level(&self, high: bool) {
        self.level.set(high);
    }
}

impl ErrorType for MockInputPin {
    type Error = PinFault;
}

impl InputPin for MockInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}

/// Default arc over which [`SimulatedHall`] reads high, in steps.
pub const DEFAULT_MAGNET_WIDTH: u32 = 200;

/// Hall sensor on a simulated reel.
///
/// Every read is assumed to follow one step, so read `n` sees the reel at
/// angle `(start + n) % 4096`, the read made at construction being read 0.
/// The sensor is high while the angle lies in the last `width` steps of the
/// revolution and drops to low at angle 0, giving the falling home edge
/// exactly where the reel's position 0 is.
///
/// # Example
///
/// ```rust
/// use embedded_hal::digital::InputPin;
/// use split_flap::hal::SimulatedHall;
///
/// let mut hall = SimulatedHall::new(4094).with_width(10);
/// assert!(hall.is_high().unwrap()); // 4094
/// assert!(hall.is_high().unwrap()); // 4095
/// assert!(hall.is_low().unwrap()); // 0
/// assert_eq!(hall.reads(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct SimulatedHall {
    start: u32,
    width: u32,
    reads: u64,
    stuck: Option<bool>,
    fault_at: Option<u64>,
}

impl SimulatedHall {
    /// A reel whose first read sees `start_angle`.
    pub fn new(start_angle: u32) -> Self {
        Self {
            start: start_angle % STEPS_PER_REVOLUTION,
            width: DEFAULT_MAGNET_WIDTH,
            reads: 0,
            stuck: None,
            fault_at: None,
        }
    }

    /// A broken sensor that always reads `level`.
    pub fn stuck(level: bool) -> Self {
        Self {
            stuck: Some(level),
            ..Self::new(0)
        }
    }

    /// Sets the magnet arc. A width of zero never triggers.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width.min(STEPS_PER_REVOLUTION - 1);
        self
    }

    /// Makes read number `read` fail with [`PinFault`]. The failed read
    /// still counts, so the reel keeps turning underneath it.
    pub fn with_fault_at(mut self, read: u64) -> Self {
        self.fault_at = Some(read);
        self
    }

    /// Reads taken so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Angle the next read will see.
    pub fn angle(&self) -> u32 {
        let turned = (self.reads % u64::from(STEPS_PER_REVOLUTION)) as u32;
        (self.start + turned) % STEPS_PER_REVOLUTION
    }

    fn sample(&mut self) -> Result<bool, PinFault> {
        let angle = self.angle();
        let read = self.reads;
        self.reads += 1;
        if self.fault_at == Some(read) {
            return Err(PinFault);
        }
        Ok(match self.stuck {
            Some(level) => level,
            None => self.width > 0 && angle >= STEPS_PER_REVOLUTION - self.width,
        })
    }
}

impl ErrorType for SimulatedHall {
    type Error = PinFault;
}

impl InputPin for SimulatedHall {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.sample()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.sample().map(|high| !high)
    }
}

// ============================================================================
// Timing
// ============================================================================

/// Mock timer for testing.
///
/// Time stands still until a delay is requested, at which point it jumps
/// forward by exactly the requested amount. Renders on a `MockClock` are
/// therefore instant and fully deterministic.
///
/// # Example
///
/// ```rust
/// use embedded_hal::delay::DelayNs;
/// use split_flap::hal::MockClock;
/// use split_flap::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_us(), 0);
///
/// clock.set(1000);
/// clock.delay_us(250);
/// assert_eq!(clock.now_us(), 1250);
///
/// clock.advance(500);
/// assert_eq!(clock.now_us(), 1750);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ns: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0.
    pub fn new() -> Self {
        Self { current_ns: 0 }
    }

    /// Sets the current time in microseconds.
    pub fn set(&mut self, us: u64) {
        self.current_ns = us * 1000;
    }

    /// Advances the clock by the given number of microseconds.
    pub fn advance(&mut self, us: u64) {
        self.current_ns += us * 1000;
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.current_ns / 1000
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.current_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.current_ns += u64::from(us) * 1000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.current_ns += u64::from(ms) * 1_000_000;
    }
}
