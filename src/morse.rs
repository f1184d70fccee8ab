//! Morse code tables and CW transmission weight scoring.
//!
//! The weight of a string approximates how long it takes to send in CW,
//! measured in dot units:
//! - dot = 1, dash = 3
//! - 1 unit of space between the elements of a symbol
//! - 3 units of space after every symbol, including the last one
//!
//! Lower weight means a call sign that is quicker to send.

use std::collections::HashMap;
use std::sync::LazyLock;

use thiserror::Error;

/// Units of space between elements inside one symbol.
const ELEMENT_GAP: u32 = 1;

/// Units of space sent after each symbol.
pub const SYMBOL_GAP: u32 = 3;

/// Symbol to dot/dash code.
static CODE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('0', "-----"),
    (',', "--..--"),
    ('.', ".-.-.-"),
    ('?', "..--.."),
    ('/', "-..-."),
    ('-', "-....-"),
    ('(', "-.--."),
    (')', "-.--.-"),
];

/// Per-symbol weights, derived once from [`CODE_TABLE`].
static WEIGHT_TABLE: LazyLock<HashMap<char, u32>> = LazyLock::new(|| {
    CODE_TABLE
        .iter()
        .map(|&(symbol, code)| (symbol, code_weight(code)))
        .collect()
});

/// A character with no Morse code in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No Morse code for symbol {0:?}")]
pub struct LookupError(pub char);

/// Iterate over every `(symbol, code)` pair in the table.
pub fn symbols() -> impl Iterator<Item = (char, &'static str)> {
    CODE_TABLE.iter().copied()
}

/// Look up the dot/dash code for a symbol.
///
/// Only uppercase letters are defined.
pub fn code(symbol: char) -> Result<&'static str, LookupError> {
    CODE_TABLE
        .iter()
        .find(|(c, _)| *c == symbol)
        .map(|(_, code)| *code)
        .ok_or(LookupError(symbol))
}

/// Weight of a raw dot/dash code string.
///
/// Any character other than `-` counts as a dot.
pub fn code_weight(code: &str) -> u32 {
    let units: u32 = code
        .chars()
        .map(|unit| {
            let length = if unit == '-' { 3 } else { 1 };
            length + ELEMENT_GAP
        })
        .sum();
    // No gap after the final element
    units.saturating_sub(ELEMENT_GAP)
}

/// Weight of a single symbol.
pub fn symbol_weight(symbol: char) -> Result<u32, LookupError> {
    WEIGHT_TABLE
        .get(&symbol)
        .copied()
        .ok_or(LookupError(symbol))
}

/// Total CW weight of a string.
///
/// Every symbol contributes its own weight plus [`SYMBOL_GAP`], so the
/// result includes a trailing gap after the last symbol.
///
/// # Example
///
/// ```
/// use callsign_availability::morse::weight;
///
/// assert_eq!(weight("SOS").unwrap(), 30);
/// assert!(weight("sos").is_err());
/// ```
pub fn weight(s: &str) -> Result<u32, LookupError> {
    s.chars().try_fold(0, |total, symbol| {
        Ok(total + symbol_weight(symbol)? + SYMBOL_GAP)
    })
}
