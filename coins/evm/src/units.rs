use alloy::primitives::U256;
use meshwallet_core::BaseUnits;
use meshwallet_error::{Result, WalletError};

/// Widens a `U256` into the arbitrary-precision base-unit type
pub fn from_u256(value: U256) -> BaseUnits {
    BaseUnits::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Narrows a base-unit amount into a `U256`, failing past 2^256 - 1
pub fn to_u256(value: &BaseUnits) -> Result<U256> {
    U256::try_from_be_slice(&value.to_bytes_be())
        .ok_or_else(|| WalletError::InvalidAmount(format!("{value} exceeds 256 bits")))
}

/// Parses a wei integer string from a request field
pub fn parse_wei(field: &str, value: &str) -> Result<u128> {
    let units: BaseUnits = value
        .parse()
        .map_err(|_| WalletError::InvalidArgument(format!("{field} must be a wei integer, got '{value}'")))?;
    units.to_u128()
}
