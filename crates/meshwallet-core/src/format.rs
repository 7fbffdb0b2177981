//! Base-unit integer to human display string.
//!
//! Display precision truncates like the amount codec does. With trailing
//! zeros trimmed a whole number keeps one fractional digit (`"1.0"`), so a
//! zero balance reads `"0.0"`.

use meshwallet_error::Result;
use serde::{Deserialize, Serialize};

use crate::amount::BaseUnits;

/// Display options for [`format_balance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Maximum fractional digits shown; `None` shows all `decimals` digits
    pub precision: Option<u32>,
    /// Strip trailing zeros from the fractional part
    pub trim_trailing_zeros: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            precision: None,
            trim_trailing_zeros: true,
        }
    }
}

impl FormatOptions {
    /// Limits the fractional digits shown
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Enables or disables trailing-zero trimming
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim_trailing_zeros = trim;
        self
    }
}

/// Formats a base-unit integer string for display.
///
/// ```
/// use meshwallet_core::{format_balance, FormatOptions};
///
/// let opts = FormatOptions::default().with_precision(4);
/// assert_eq!(format_balance("1234567890000000000", 18, opts).unwrap(), "1.2345");
/// ```
pub fn format_balance(base_units: &str, decimals: u32, options: FormatOptions) -> Result<String> {
    let value: BaseUnits = base_units.parse()?;
    Ok(format_units(&value, decimals, options))
}

/// Infallible form of [`format_balance`] for already-parsed values.
pub fn format_units(value: &BaseUnits, decimals: u32, options: FormatOptions) -> String {
    let decimals = decimals as usize;
    let mut digits = value.to_string();
    if digits.len() <= decimals {
        let pad = decimals + 1 - digits.len();
        digits.insert_str(0, &"0".repeat(pad));
    }
    let (integer, fraction) = digits.split_at(digits.len() - decimals);

    let shown = match options.precision {
        Some(p) => &fraction[..fraction.len().min(p as usize)],
        None => fraction,
    };

    let mut fraction = shown.to_string();
    if options.trim_trailing_zeros {
        let kept = fraction.trim_end_matches('0').len();
        fraction.truncate(kept);
        if fraction.is_empty() && decimals > 0 && options.precision != Some(0) {
            fraction.push('0');
        }
    }

    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    }
}

/// Precision window for [`format_fee`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePrecision {
    /// First (highest) precision tried
    pub ceiling: u32,
    /// Last precision tried; its output is used when every step shows zero
    pub floor: u32,
}

impl Default for FeePrecision {
    fn default() -> Self {
        Self {
            ceiling: 12,
            floor: 2,
        }
    }
}

/// Formats a fee so that tiny nonzero fees do not collapse to `"0.00"`.
///
/// Walks precision from `ceiling` down to `floor` and returns the first
/// display that is not numerically zero. A fee too small to show even at the
/// ceiling falls back to the floor's zero display instead of failing.
pub fn format_fee(fee: &BaseUnits, decimals: u32, precision: FeePrecision) -> String {
    let floor = precision.floor.min(precision.ceiling);
    for p in (floor..=precision.ceiling).rev() {
        let display = format_units(fee, decimals, FormatOptions::default().with_precision(p));
        if !is_zero_display(&display) {
            return display;
        }
    }
    format_units(
        fee,
        decimals,
        FormatOptions::default().with_precision(floor).with_trim(false),
    )
}

fn is_zero_display(display: &str) -> bool {
    display.bytes().all(|b| b == b'0' || b == b'.')
}
