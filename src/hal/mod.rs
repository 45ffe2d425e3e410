//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete pins and timers for the traits in
//! [`crate::traits`] and `embedded-hal`.
//!
//! # Available Implementations
//!
//! - `mock`: Test doubles for desktop development (always available)
//! - `host`: Wall-clock timer for desktop simulation (requires `std`)
//! - `esp32`: ESP-IDF timer and pin map (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "std")]
mod host;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "std")]
pub use host::HostTimer;

#[cfg(feature = "esp32")]
pub use esp32::*;
