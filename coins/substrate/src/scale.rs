//! The subset of SCALE encoding and storage hashing the wallet needs.

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Digest};
use meshwallet_error::{Result, WalletError};

/// Appends the SCALE compact encoding of `value`
pub fn encode_compact(value: u128, out: &mut Vec<u8>) {
    match value {
        0..=0x3f => out.push((value as u8) << 2),
        0x40..=0x3fff => out.extend_from_slice(&(((value as u16) << 2) | 0b01).to_le_bytes()),
        0x4000..=0x3fff_ffff => {
            out.extend_from_slice(&(((value as u32) << 2) | 0b10).to_le_bytes())
        }
        _ => {
            let bytes = value.to_le_bytes();
            let len = 16 - bytes.iter().rev().take_while(|b| **b == 0).count();
            let len = len.max(4);
            out.push((((len - 4) as u8) << 2) | 0b11);
            out.extend_from_slice(&bytes[..len]);
        }
    }
}

/// Compact encoding as a fresh vector
pub fn compact(value: u128) -> Vec<u8> {
    let mut out = Vec::with_capacity(17);
    encode_compact(value, &mut out);
    out
}

/// Appends a length-prefixed byte vector (`Vec<u8>`)
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    encode_compact(bytes.len() as u128, out);
    out.extend_from_slice(bytes);
}

/// Cursor over SCALE-encoded bytes
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Starts decoding at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consumes `n` bytes
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(WalletError::Encoding(format!(
                "unexpected end of SCALE input: need {n} bytes, have {}",
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// `u8`
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Little-endian `u32`
    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Little-endian `u64`
    pub fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    /// Little-endian `u128`
    pub fn u128(&mut self) -> Result<u128> {
        Ok(u128::from_le_bytes(self.array()?))
    }

    /// Compact integer of up to 128 bits
    pub fn compact(&mut self) -> Result<u128> {
        let first = self.u8()?;
        match first & 0b11 {
            0b00 => Ok(u128::from(first >> 2)),
            0b01 => {
                let second = self.u8()?;
                Ok(u128::from(u16::from_le_bytes([first, second]) >> 2))
            }
            0b10 => {
                let rest = self.take(3)?;
                Ok(u128::from(
                    u32::from_le_bytes([first, rest[0], rest[1], rest[2]]) >> 2,
                ))
            }
            _ => {
                let len = usize::from(first >> 2) + 4;
                if len > 16 {
                    return Err(WalletError::Encoding(format!(
                        "compact integer of {len} bytes exceeds 128 bits"
                    )));
                }
                let mut bytes = [0u8; 16];
                bytes[..len].copy_from_slice(self.take(len)?);
                Ok(u128::from_le_bytes(bytes))
            }
        }
    }
}

/// 256-bit BLAKE2b
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    Blake2b::<U32>::digest(data).into()
}

/// 128-bit BLAKE2b
pub fn blake2_128(data: &[u8]) -> [u8; 16] {
    Blake2b::<U16>::digest(data).into()
}

/// `blake2_128(data) ++ data`, the transparent storage map hasher
pub fn blake2_128_concat(data: &[u8]) -> Vec<u8> {
    let mut out = blake2_128(data).to_vec();
    out.extend_from_slice(data);
    out
}
