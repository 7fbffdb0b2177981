//! Decimal string to base-unit conversion.
//!
//! Excess fractional digits are truncated, never rounded: `"1.129"` with two
//! decimals becomes `112`. Both chain families share one code path, so for the
//! same input and decimals the EVM and Substrate results are byte-identical.

use meshwallet_error::{Result, WalletError};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::network::ChainFamily;

/// Decimals used when the caller does not name any.
pub const DEFAULT_DECIMALS: u32 = 18;

/// A non-negative amount in the smallest unit of a currency (wei, planck).
///
/// Backed by an arbitrary-precision integer so token supplies and
/// high-decimal tokens never overflow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BaseUnits(BigUint);

impl BaseUnits {
    /// Zero base units
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Borrows the underlying big integer
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Converts to `u128`, failing if the value does not fit
    pub fn to_u128(&self) -> Result<u128> {
        self.0
            .to_u128()
            .ok_or_else(|| WalletError::InvalidAmount(format!("{} does not fit in 128 bits", self.0)))
    }

    /// Big-endian bytes without leading zeros (empty for zero)
    pub fn to_bytes_be(&self) -> Vec<u8> {
        if self.is_zero() {
            return Vec::new();
        }
        self.0.to_bytes_be()
    }

    /// Builds a value from big-endian bytes
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    /// `self - rhs`, clamped at zero
    pub fn saturating_sub(&self, rhs: &Self) -> Self {
        if rhs.0 >= self.0 {
            Self::zero()
        } else {
            Self(&self.0 - &rhs.0)
        }
    }

    /// `self + rhs`
    pub fn add(&self, rhs: &Self) -> Self {
        Self(&self.0 + &rhs.0)
    }

    /// `self * rhs`
    pub fn mul(&self, rhs: &Self) -> Self {
        Self(&self.0 * &rhs.0)
    }
}

impl From<u128> for BaseUnits {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u64> for BaseUnits {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for BaseUnits {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl FromStr for BaseUnits {
    type Err = WalletError;

    /// Parses a plain base-10 integer string; no sign, no fraction.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalletError::InvalidAmount(format!(
                "'{s}' is not a base-unit integer"
            )));
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| WalletError::InvalidAmount(format!("'{s}' is not a base-unit integer")))
    }
}

impl fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BaseUnits {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for BaseUnits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Converts a human decimal amount into a base-unit integer string.
///
/// `amount` is `None` when the caller supplied null/undefined, which fails
/// with [`WalletError::InvalidAmount`]. `family` does not change the result.
///
/// ```
/// use meshwallet_core::{parse_amount, ChainFamily};
///
/// assert_eq!(parse_amount(Some("0.1"), ChainFamily::Evm, 18).unwrap(), "100000000000000000");
/// assert_eq!(parse_amount(Some("1.123456789"), ChainFamily::Substrate, 6).unwrap(), "1123456");
/// ```
pub fn parse_amount(amount: Option<&str>, family: ChainFamily, decimals: u32) -> Result<String> {
    let value = parse_base_units(amount, decimals)?;
    tracing::trace!(%family, decimals, base_units = %value, "parsed amount");
    Ok(value.to_string())
}

/// Same as [`parse_amount`] but returns the integer itself.
pub fn parse_base_units(amount: Option<&str>, decimals: u32) -> Result<BaseUnits> {
    let raw = amount.ok_or_else(|| WalletError::InvalidAmount("amount is required".into()))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WalletError::InvalidAmount("amount is empty".into()));
    }

    let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if integer.is_empty() && fraction.is_empty() {
        return Err(WalletError::InvalidAmount(format!("'{raw}' has no digits")));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || !all_digits(fraction) {
        return Err(WalletError::InvalidAmount(format!("'{raw}' is not a decimal number")));
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(integer.len() + decimals);
    digits.push_str(if integer.is_empty() { "0" } else { integer });
    if fraction.len() > decimals {
        tracing::debug!(
            dropped = fraction.len() - decimals,
            "truncating fractional digits beyond currency precision"
        );
        digits.push_str(&fraction[..decimals]);
    } else {
        digits.push_str(fraction);
        digits.extend(std::iter::repeat('0').take(decimals - fraction.len()));
    }

    digits.parse()
}

/// JSON entry point: strings are parsed as-is, integers are coerced to
/// strings, `null` is rejected. Floats in exponent form are rejected rather
/// than silently losing precision.
pub fn parse_amount_value(
    value: &serde_json::Value,
    family: ChainFamily,
    decimals: u32,
) -> Result<String> {
    use serde_json::Value;

    let text = match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            let s = n.to_string();
            if s.contains(['e', 'E']) {
                return Err(WalletError::InvalidAmount(format!(
                    "{s} is not representable as a decimal string"
                )));
            }
            Some(s)
        }
        other => {
            return Err(WalletError::InvalidAmount(format!(
                "expected a decimal string or number, got {other}"
            )))
        }
    };
    parse_amount(text.as_deref(), family, decimals)
}
