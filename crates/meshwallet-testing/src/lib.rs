//! # meshwallet Testing Infrastructure
//!
//! Shared fixtures for the meshwallet crates:
//! - Edge case mnemonics and addresses
//! - Decimal amount strategies for property tests
//! - Known derivation vectors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meshwallet_testing::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_parse_is_exact((amount, decimals) in decimal_with_scale()) {
//!         // ...
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proptest::prelude::*;

// ============================================================================
// Edge Case Mnemonics
// ============================================================================

/// Edge case mnemonic phrases for testing
pub struct EdgeCaseMnemonics;

impl EdgeCaseMnemonics {
    /// Standard 12-word test mnemonic (all "abandon" except last)
    pub const STANDARD_12: &'static str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    /// Standard 24-word test mnemonic
    pub const STANDARD_24: &'static str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    /// Well-known Substrate development phrase
    pub const SUBSTRATE_DEV: &'static str =
        "bottom drive obey lake curtain smoke basket hold race lonely fit walk";

    /// Extra whitespace (normalized by the parser)
    pub const EXTRA_WHITESPACE: &'static str =
        "  abandon   abandon  abandon abandon abandon abandon abandon abandon abandon abandon abandon   about  ";

    /// Returns all valid mnemonics
    pub fn valid() -> Vec<&'static str> {
        vec![Self::STANDARD_12, Self::STANDARD_24, Self::SUBSTRATE_DEV]
    }

    /// Returns invalid/malformed mnemonics for error handling tests
    pub fn invalid() -> Vec<&'static str> {
        vec![
            "",                        // Empty
            "abandon",                 // Single word
            "abandon abandon abandon", // Too few words
            "invalid words here",      // Invalid words
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon", // 13 words
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon wrong", // Bad checksum
        ]
    }
}

// ============================================================================
// Known Derivation Vectors
// ============================================================================

/// Addresses derived from the fixture mnemonics by independent tooling
pub struct KnownVectors;

impl KnownVectors {
    /// m/44'/60'/0'/0/0 of [`EdgeCaseMnemonics::STANDARD_12`]
    pub const STANDARD_12_ETH: &'static str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

    /// sr25519 root public key of [`EdgeCaseMnemonics::SUBSTRATE_DEV`]
    pub const SUBSTRATE_DEV_PUBLIC: &'static str =
        "46ebddef8cd9bb167dc30878d7113b7e168e6f0646beffd77d69d39bad76b47a";

    /// Generic (prefix 42) SS58 address of [`Self::SUBSTRATE_DEV_PUBLIC`]
    pub const SUBSTRATE_DEV_SS58_42: &'static str =
        "5DfhGyQdFobKM8NsWvEeAKk5EQQgYe9AydgJ7rMB6E1EqRzV";

    /// Decoded [`Self::SUBSTRATE_DEV_PUBLIC`]
    pub fn substrate_dev_public() -> [u8; 32] {
        let mut out = [0u8; 32];
        if let Ok(bytes) = hex::decode(Self::SUBSTRATE_DEV_PUBLIC) {
            out.copy_from_slice(&bytes);
        }
        out
    }
}

// ============================================================================
// Edge Case Addresses
// ============================================================================

/// Edge case addresses for testing
pub struct EdgeCaseAddresses;

impl EdgeCaseAddresses {
    /// Valid Ethereum address
    pub const ETH_VALID: &'static str = "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9";

    /// Ethereum zero address
    pub const ETH_ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    /// Invalid Ethereum addresses
    pub fn invalid_ethereum() -> Vec<&'static str> {
        vec![
            "",
            "0x",
            "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG", // Invalid hex
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5",     // Too short
        ]
    }

    /// Invalid SS58 strings
    pub fn invalid_ss58() -> Vec<&'static str> {
        vec![
            "",
            "not_an_address",
            "5DfhGyQdFobKM8NsWvEeAKk5EQQgYe9AydgJ7rMB6E1EqRzW", // Bad checksum
            "5DfhGyQdFobKM8NsWvEeAKk5EQ",                       // Truncated
            "0OIl",                                              // Not base58
        ]
    }
}

// ============================================================================
// Edge Case Amounts
// ============================================================================

/// Edge case amounts for testing overflow and precision
pub struct EdgeCaseAmounts;

impl EdgeCaseAmounts {
    /// 2^128 as a decimal string, the first value past `u128`
    pub const PAST_U128: &'static str = "340282366920938463463374607431768211456";

    /// One million ETH in wei
    pub const ETH_LARGE: u128 = 1_000_000_000_000_000_000_000_000;

    /// Malformed decimal strings
    pub fn malformed() -> Vec<&'static str> {
        vec!["", " ", ".", "..", "1.2.3", "-1", "+1", "1e18", "0x1f", "1,000", "NaN", "½"]
    }

    /// Decimal strings that are well-formed but unusual
    pub fn unusual_valid() -> Vec<&'static str> {
        vec!["0", "0.0", ".5", "5.", "000001.100000", " 1.5 ", Self::PAST_U128]
    }
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// Currency decimals seen in practice (0 through 24)
pub fn decimals() -> impl Strategy<Value = u32> {
    0u32..=24
}

/// Plain base-10 integer strings without leading zeros
pub fn integer_digits() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("0".to_string()),
        "[1-9][0-9]{0,40}",
    ]
}

/// Decimal strings with an arbitrary fractional part
pub fn decimal_string() -> impl Strategy<Value = String> {
    (integer_digits(), "[0-9]{0,30}").prop_map(|(int, frac)| {
        if frac.is_empty() {
            int
        } else {
            format!("{int}.{frac}")
        }
    })
}

/// A decimal string whose fractional part fits the paired decimals exactly
pub fn decimal_with_scale() -> impl Strategy<Value = (String, u32)> {
    decimals().prop_flat_map(|d| {
        let frac = prop::collection::vec(0u8..10, 0..=d as usize)
            .prop_map(|ds| ds.into_iter().map(|x| char::from(b'0' + x)).collect::<String>());
        (integer_digits(), frac, Just(d)).prop_map(|(int, frac, d)| {
            if frac.is_empty() {
                (int, d)
            } else {
                (format!("{int}.{frac}"), d)
            }
        })
    })
}

/// Base-unit integer strings, including values past `u128`
pub fn base_unit_string() -> impl Strategy<Value = String> {
    integer_digits()
}

// ============================================================================
// Tests
// ============================================================================
