//! Conversion of factory calibration readings into step offsets.
//!
//! Each unit is measured once: the symbol that sits closest to the home
//! position (the "macro" reading) and a fine correction in micro-steps (the
//! "micro" reading). [`compute_calibration`] turns the pair into the step
//! offset of flap 0 relative to the hall sensor's home edge.

use crate::alphabet::{flap_index, FLAP_COUNT, STEPS_PER_FLAP, STEPS_PER_REVOLUTION};

/// Computes a unit's calibration offset in `[0, STEPS_PER_REVOLUTION)`.
///
/// Half a flap is added so that home sits in the middle of a card rather than
/// on its leading edge. Negative corrections wrap around the reel.
///
/// # Examples
///
/// ```
/// use split_flap::calibration::compute_calibration;
///
/// assert_eq!(compute_calibration(' ', 60), 13);
/// assert_eq!(compute_calibration('9', -100), 4041);
/// ```
pub fn compute_calibration(macro_symbol: char, micro_correction: i32) -> u32 {
    let flaps_before_home = (FLAP_COUNT - flap_index(macro_symbol) - 1) as i64;
    let total = flaps_before_home * i64::from(STEPS_PER_FLAP)
        + i64::from(micro_correction)
        + i64::from(STEPS_PER_FLAP / 2);
    total.rem_euclid(i64::from(STEPS_PER_REVOLUTION)) as u32
}

/// Step position of flap `index` on a reel with the given calibration.
pub fn target_position(index: usize, calibration: u32) -> u32 {
    let step = index as u64 * u64::from(STEPS_PER_FLAP) + u64::from(calibration);
    (step % u64::from(STEPS_PER_REVOLUTION)) as u32
}
