//! Trait definitions for hardware abstraction.
//!
//! The flap scheduler is written against these traits plus the
//! `embedded-hal` 1.0 digital and delay traits, so it runs unchanged on the
//! ESP32 and against the desktop mocks.
//!
//! # Hardware Abstraction
//!
//! - [`Clock`]: Monotonic microsecond time source
//! - [`BitSink`]: Buffered output bits addressed by [`BitHandle`]
//! - [`StepDirection`]: Phase table traversal order
//!
//! [`BitHandle`]: crate::BitHandle

pub mod hardware;

pub use hardware::*;
