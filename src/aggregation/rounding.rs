//! Two-decimal fixed-point text.

use serde::{Serialize, Serializer};
use std::fmt;

/// A number rounded to exactly two decimals, kept as its canonical text.
///
/// The text is the output: it is written verbatim and never re-formatted,
/// so `15.00` stays `15.00`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fixed2(String);

impl Fixed2 {
    /// Round `value` half-up (ties away from zero) on its exact binary value.
    ///
    /// Non-finite inputs render as `NaN`, `Infinity` or `-Infinity`.
    pub fn round(value: f64) -> Self {
        if value.is_nan() {
            return Self("NaN".to_string());
        }
        if value.is_infinite() {
            let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
            return Self(text.to_string());
        }
        if is_exact_tie(value) {
            let hundredths = value * 100.0;
            let rounded = hundredths.trunc() + hundredths.signum();
            return Self(format!("{:.2}", rounded / 100.0));
        }
        // `{:.2}` rounds the exact value correctly; only exact ties differ.
        Self(format!("{:.2}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the rounded text.
    pub fn value(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }
}

/// True when `value * 100` lies exactly halfway between two integers.
///
/// That only happens for odd multiples of 1/8, where `value * 100` is exact.
fn is_exact_tie(value: f64) -> bool {
    let eighths = value * 8.0;
    eighths.fract() == 0.0 && eighths.abs() < 2f64.powi(50) && eighths % 2.0 != 0.0
}

impl fmt::Display for Fixed2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fixed2 {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Fixed2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
