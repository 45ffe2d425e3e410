//! Flap alphabet and reel geometry.
//!
//! Every reel carries the same [`FLAP_COUNT`] printed cards in the order of
//! [`ALPHABET`]. Index 0 is the blank card, which is also what any character
//! outside the alphabet renders as.
//!
//! # Example
//!
//! ```rust
//! use split_flap::alphabet::{flap_index, symbol_at};
//!
//! assert_eq!(flap_index('A'), 1);
//! assert_eq!(flap_index('a'), 1);
//! assert_eq!(flap_index('~'), 0); // not printed on the reel
//! assert_eq!(symbol_at(44), Some('9'));
//! ```

/// Symbols printed on a reel, in reel order.
pub const ALPHABET: [char; FLAP_COUNT] = [
    ' ', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q',
    'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '$', '&', '#', ':', '.', '-', '?', '!', '0',
    '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Number of flaps on one reel.
pub const FLAP_COUNT: usize = 45;

/// Micro-steps for one full revolution of the reel (28BYJ-48 in half-step mode).
pub const STEPS_PER_REVOLUTION: u32 = 4096;

/// Micro-steps covered by one flap. The leftover `4096 - 45 * 91` steps are
/// absorbed by the last flap.
pub const STEPS_PER_FLAP: u32 = STEPS_PER_REVOLUTION / FLAP_COUNT as u32;

/// The blank symbol shown for padding and unknown characters.
pub const BLANK: char = ALPHABET[0];

/// Returns the reel index of `c`, case-insensitively.
///
/// Characters that are not printed on the reel map to the blank flap (0).
pub fn flap_index(c: char) -> usize {
    lookup(c).unwrap_or(0)
}

/// Returns the reel index of `c` if it is printed on the reel.
pub fn lookup(c: char) -> Option<usize> {
    let upper = c.to_ascii_uppercase();
    ALPHABET.iter().position(|&symbol| symbol == upper)
}

/// Returns `true` if `c` (in either case) is printed on the reel.
pub fn is_displayable(c: char) -> bool {
    lookup(c).is_some()
}

/// Returns the symbol printed on flap `index`.
pub fn symbol_at(index: usize) -> Option<char> {
    ALPHABET.get(index).copied()
}
