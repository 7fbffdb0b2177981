//! Storage keys and decoders for the account balance entries.
//!
//! The pallet/item prefixes are `twox_128(pallet) ++ twox_128(item)`,
//! precomputed since they never change across runtimes.

use meshwallet_core::BaseUnits;
use meshwallet_error::Result;

use crate::scale::{blake2_128_concat, Decoder};

/// `twox_128("System") ++ twox_128("Account")`
const SYSTEM_ACCOUNT_PREFIX: [u8; 32] = [
    0x26, 0xaa, 0x39, 0x4e, 0xea, 0x56, 0x30, 0xe0, 0x7c, 0x48, 0xae, 0x0c, 0x95, 0x58, 0xce, 0xf7,
    0xb9, 0x9d, 0x88, 0x0e, 0xc6, 0x81, 0x79, 0x9c, 0x0c, 0xf3, 0x0e, 0x88, 0x86, 0x37, 0x1d, 0xa9,
];

/// `twox_128("Assets") ++ twox_128("Account")`
const ASSETS_ACCOUNT_PREFIX: [u8; 32] = [
    0x68, 0x2a, 0x59, 0xd5, 0x1a, 0xb9, 0xe4, 0x8a, 0x8c, 0x8c, 0xc4, 0x18, 0xff, 0x97, 0x08, 0xd2,
    0xb9, 0x9d, 0x88, 0x0e, 0xc6, 0x81, 0x79, 0x9c, 0x0c, 0xf3, 0x0e, 0x88, 0x86, 0x37, 0x1d, 0xa9,
];

/// `System.Account(account_id)`
pub fn system_account_key(account: &[u8; 32]) -> String {
    let mut key = SYSTEM_ACCOUNT_PREFIX.to_vec();
    key.extend(blake2_128_concat(account));
    format!("0x{}", hex::encode(key))
}

/// `Assets.Account(asset_id, account_id)`
pub fn asset_account_key(asset_id: u32, account: &[u8; 32]) -> String {
    let mut key = ASSETS_ACCOUNT_PREFIX.to_vec();
    key.extend(blake2_128_concat(&asset_id.to_le_bytes()));
    key.extend(blake2_128_concat(account));
    format!("0x{}", hex::encode(key))
}

/// Balance fields of `frame_system::AccountInfo<_, AccountData<u128>>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountInfo {
    /// Transactions sent so far
    pub nonce: u32,
    /// Free balance, including any frozen part
    pub free: u128,
    /// Reserved balance
    pub reserved: u128,
    /// Part of `free` that may not be transferred
    pub frozen: u128,
}

impl AccountInfo {
    /// Decodes the storage value; `None` (no entry) is an empty account
    pub fn decode(raw: Option<&[u8]>) -> Result<Self> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let mut input = Decoder::new(raw);
        let nonce = input.u32()?;
        let _consumers = input.u32()?;
        let _providers = input.u32()?;
        let _sufficients = input.u32()?;
        let free = input.u128()?;
        let reserved = input.u128()?;
        let frozen = input.u128()?;
        // trailing `flags` is not needed
        Ok(Self {
            nonce,
            free,
            reserved,
            frozen,
        })
    }

    /// Everything the account owns
    pub fn total(&self) -> BaseUnits {
        BaseUnits::from(self.free).add(&BaseUnits::from(self.reserved))
    }

    /// Reserved funds plus the frozen part of the free balance
    pub fn locked(&self) -> BaseUnits {
        BaseUnits::from(self.reserved).add(&BaseUnits::from(self.frozen))
    }
}

/// Balance of an `Assets.Account` entry; a missing entry holds nothing
pub fn decode_asset_balance(raw: Option<&[u8]>) -> Result<u128> {
    match raw {
        Some(raw) => Decoder::new(raw).u128(),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_account(free: u128, reserved: u128, frozen: u128) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&7u32.to_le_bytes());
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&1u32.to_le_bytes());
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&free.to_le_bytes());
        raw.extend_from_slice(&reserved.to_le_bytes());
        raw.extend_from_slice(&frozen.to_le_bytes());
        raw.extend_from_slice(&(1u128 << 127).to_le_bytes());
        raw
    }

    #[test]
    fn test_system_account_key_layout() {
        let key = system_account_key(&[0u8; 32]);
        assert!(key.starts_with(
            "0x26aa394eea5630e07c48ae0c9558cef7b99d880ec681799c0cf30e8886371da9"
        ));
        // prefix 32 + blake2_128 16 + account 32
        assert_eq!(key.len(), 2 + 2 * 80);
        assert!(key.ends_with(&"00".repeat(32)));
    }

    #[test]
    fn test_asset_account_key_layout() {
        let key = asset_account_key(1984, &[1u8; 32]);
        assert!(key.starts_with("0x682a59d51ab9e48a8c8cc418ff9708d2"));
        // prefix 32 + (16 + 4) + (16 + 32)
        assert_eq!(key.len(), 2 + 2 * 100);
        assert!(key.contains(&hex::encode(1984u32.to_le_bytes())));
        assert_ne!(key, asset_account_key(1337, &[1u8; 32]));
    }

    #[test]
    fn test_account_info_decode() {
        let raw = encoded_account(1_000, 200, 50);
        let info = AccountInfo::decode(Some(&raw)).unwrap();
        assert_eq!(info.nonce, 7);
        assert_eq!(info.free, 1_000);
        assert_eq!(info.total().to_string(), "1200");
        assert_eq!(info.locked().to_string(), "250");
    }

    #[test]
    fn test_missing_account_is_empty() {
        let info = AccountInfo::decode(None).unwrap();
        assert_eq!(info, AccountInfo::default());
        assert!(info.total().is_zero());
    }

    #[test]
    fn test_truncated_account_fails() {
        let raw = encoded_account(1, 2, 3);
        assert!(AccountInfo::decode(Some(&raw[..40])).is_err());
    }

    #[test]
    fn test_asset_balance_decode() {
        let mut raw = 5_000_000u128.to_le_bytes().to_vec();
        raw.push(0); // status
        raw.push(0); // reason
        assert_eq!(decode_asset_balance(Some(&raw)).unwrap(), 5_000_000);
        assert_eq!(decode_asset_balance(None).unwrap(), 0);
    }
}
