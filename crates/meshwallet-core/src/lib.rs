//! # meshwallet Core
//!
//! Chain-agnostic building blocks shared by both provider families:
//!
//! - [`NetworkRegistry`] - static table of [`NetworkConfig`] descriptors
//! - [`parse_amount`] - decimal string to base-unit integer, truncating
//! - [`format_balance`] - base-unit integer to display string
//! - [`format_fee`] - adaptive-precision fee display
//!
//! Amounts never pass through binary floating point. Base-unit values are
//! carried as decimal strings at API boundaries and as [`BaseUnits`]
//! (arbitrary precision) internally.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod format;
pub mod network;
pub mod registry;

pub use amount::{parse_amount, parse_amount_value, parse_base_units, BaseUnits, DEFAULT_DECIMALS};
pub use format::{format_balance, format_fee, format_units, FeePrecision, FormatOptions};
pub use network::{
    ChainFamily, ChainId, ChainVariant, NativeCurrency, NetworkConfig, RuntimeProfile,
    SubstrateParams, TokenConfig, NATIVE_TOKEN_ADDRESS,
};
pub use registry::NetworkRegistry;

// Re-export zeroize for key material held by the providers
pub use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};
