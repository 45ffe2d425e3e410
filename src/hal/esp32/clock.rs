//! ESP32 timer implementation using the ESP-IDF high-resolution timer.

use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::{Ets, FreeRtos};

use crate::traits::Clock;

/// Waits at least this long are partly handed to FreeRTOS.
const YIELD_THRESHOLD_US: u32 = 10_000;

/// ESP32 timer using the hardware timer.
///
/// Provides microsecond timestamps from `esp_timer_get_time()`. Short delays
/// busy-wait in ROM (`ets_delay_us`) for step-accurate timing; long ones
/// yield whole milliseconds to the scheduler first so the idle task can feed
/// the watchdog.
///
/// # Example
///
/// ```ignore
/// use embedded_hal::delay::DelayNs;
/// use split_flap::hal::esp32::Esp32Timer;
/// use split_flap::traits::Clock;
///
/// let mut timer = Esp32Timer::new();
/// let start = timer.now_us();
/// timer.delay_us(1200);
/// assert!(timer.now_us() - start >= 1200);
/// ```
pub struct Esp32Timer;

impl Esp32Timer {
    /// Creates a new ESP32 timer instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Esp32Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Timer {
    #[inline]
    fn now_us(&self) -> u64 {
        // Safe: this is a simple read of the hardware timer, no side effects
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        micros.max(0) as u64
    }
}

impl DelayNs for Esp32Timer {
    fn delay_ns(&mut self, ns: u32) {
        Ets::delay_us(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        if us >= YIELD_THRESHOLD_US {
            FreeRtos::delay_ms(us / 1000);
            Ets::delay_us(us % 1000);
        } else {
            Ets::delay_us(us);
        }
    }
}
