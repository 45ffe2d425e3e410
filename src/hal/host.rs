//! Desktop timer backed by `std::time::Instant`.

use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::traits::Clock;

/// Sleeps shorter than this are spun instead of handed to the OS scheduler.
const SPIN_THRESHOLD: Duration = Duration::from_micros(2000);

/// Real-time timer for running the display loop on a desktop.
///
/// Time is measured from construction. Delays sleep for the bulk of the
/// wait and spin for the last couple of milliseconds, since a plain
/// `thread::sleep` routinely overshoots by more than a step period.
///
/// # Example
///
/// ```rust
/// use embedded_hal::delay::DelayNs;
/// use split_flap::hal::HostTimer;
/// use split_flap::traits::Clock;
///
/// let mut timer = HostTimer::new();
/// timer.delay_us(500);
/// assert!(timer.now_us() >= 500);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HostTimer {
    start_time: Instant,
}

impl HostTimer {
    /// Creates a timer reading 0 now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

impl Default for HostTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostTimer {
    #[inline]
    fn now_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }
}

impl DelayNs for HostTimer {
    fn delay_ns(&mut self, ns: u32) {
        let deadline = Instant::now() + Duration::from_nanos(u64::from(ns));
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;
            if remaining > SPIN_THRESHOLD {
                thread::sleep(remaining - SPIN_THRESHOLD);
            } else {
                core::hint::spin_loop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_monotonic() {
        let timer = HostTimer::new();
        let a = timer.now_us();
        let b = timer.now_us();
        assert!(b >= a);
    }

    #[test]
    fn delay_waits_at_least_requested() {
        let mut timer = HostTimer::new();
        let before = timer.now_us();
        timer.delay_us(3_000);
        assert!(timer.now_us() - before >= 3_000);
    }
}
