//! Length unit conversion
//!
//! All stored lengths are normalized to centimeters (the canonical
//! unit) before any layout computation. Conversions never fail: a
//! non-finite value converts to 0.0, which callers treat as
//! "absent/invalid" in context.

use crate::constants::{CM_PER_INCH, MM_PER_CM};

/// A unit of length accepted for user input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    Mm,
    #[default]
    Cm,
    In,
}

/// Convert a value in the given unit to centimeters.
///
/// Non-finite input yields 0.0.
pub fn to_cm(value: f32, unit: Unit) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    match unit {
        Unit::In => value * CM_PER_INCH,
        Unit::Mm => value / MM_PER_CM,
        Unit::Cm => value,
    }
}

/// Convert a value in centimeters back to the given unit.
///
/// Non-finite input yields 0.0.
pub fn from_cm(value: f32, unit: Unit) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    match unit {
        Unit::In => value / CM_PER_INCH,
        Unit::Mm => value * MM_PER_CM,
        Unit::Cm => value,
    }
}

/// Parse free-text numeric input and convert it to centimeters.
///
/// Unparsable text yields 0.0, mirroring the "absent" convention.
pub fn parse_length(text: &str, unit: Unit) -> f32 {
    match text.trim().parse::<f32>() {
        Ok(v) => to_cm(v, unit),
        Err(_) => 0.0,
    }
}
