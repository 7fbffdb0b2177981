//! SS58 address encoding.
//!
//! `base58(prefix ++ public_key ++ checksum)`, where the checksum is the
//! first two bytes of `blake2b_512("SS58PRE" ++ prefix ++ public_key)`.
//! Formats below 64 use a one-byte prefix, formats up to 16383 use two.

use blake2::digest::consts::U64;
use blake2::{Blake2b, Digest};
use meshwallet_error::{Result, WalletError};

const SS58_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

/// Highest encodable address format
pub const MAX_FORMAT: u16 = 16_383;

fn ss58_checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Blake2b::<U64>::new();
    hasher.update(SS58_PREFIX);
    hasher.update(data);
    let hash = hasher.finalize();
    [hash[0], hash[1]]
}

fn prefix_bytes(format: u16) -> Vec<u8> {
    if format < 64 {
        vec![format as u8]
    } else {
        vec![
            ((format & 0b0000_0000_1111_1100) >> 2) as u8 | 0b0100_0000,
            (format >> 8) as u8 | ((format & 0b0000_0000_0000_0011) << 6) as u8,
        ]
    }
}

/// Encodes a 32-byte public key under an address format
pub fn encode(format: u16, public_key: &[u8; 32]) -> Result<String> {
    if format > MAX_FORMAT {
        return Err(WalletError::InvalidArgument(format!(
            "SS58 format {format} exceeds {MAX_FORMAT}"
        )));
    }
    let mut data = prefix_bytes(format);
    data.extend_from_slice(public_key);
    let checksum = ss58_checksum(&data);
    data.extend_from_slice(&checksum);
    Ok(bs58::encode(data).into_string())
}

/// Decodes an address into its format and public key
pub fn decode(address: &str) -> Result<(u16, [u8; 32])> {
    let invalid = |reason: &str| WalletError::invalid_address(address, reason);

    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| invalid(&format!("invalid base58: {e}")))?;

    let (format, prefix_len) = match decoded.first() {
        Some(&first) if first < 64 => (u16::from(first), 1),
        Some(&first) if first < 128 => {
            let second = *decoded.get(1).ok_or_else(|| invalid("truncated prefix"))?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (u16::from(lower) | (u16::from(upper) << 8), 2)
        }
        Some(_) => return Err(invalid("reserved prefix byte")),
        None => return Err(invalid("empty address")),
    };

    if decoded.len() != prefix_len + 32 + CHECKSUM_LEN {
        return Err(invalid("invalid address length"));
    }
    let body_end = prefix_len + 32;
    let checksum = ss58_checksum(&decoded[..body_end]);
    if checksum[..] != decoded[body_end..] {
        return Err(invalid("invalid checksum"));
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&decoded[prefix_len..body_end]);
    Ok((format, public_key))
}

/// Returns true if `address` is valid SS58, optionally under one format
pub fn is_valid_address(address: &str, format: Option<u16>) -> bool {
    match decode(address) {
        Ok((decoded, _)) => format.map_or(true, |f| f == decoded),
        Err(_) => false,
    }
}
