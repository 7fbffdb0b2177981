//! Signed extrinsic construction (format version 4).
//!
//! ```text
//! compact(len) ++ 0x84 ++ MultiAddress::Id(signer) ++ MultiSignature::Sr25519(sig)
//!              ++ extra ++ call
//! ```
//!
//! Transactions are immortal, so the mortality checkpoint is the genesis
//! hash. The metadata hash check is always sent in disabled mode.

use meshwallet_core::RuntimeProfile;
use meshwallet_error::{Result, WalletError};
use serde::Deserialize;

use crate::keys::SubstrateKeys;
use crate::scale::{blake2_256, encode_compact};

const SIGNED_V4: u8 = 0b1000_0100;
const MULTI_ADDRESS_ID: u8 = 0x00;
const MULTI_SIGNATURE_SR25519: u8 = 0x01;
const IMMORTAL_ERA: u8 = 0x00;
const METADATA_HASH_DISABLED: u8 = 0x00;
const NONE: u8 = 0x00;

/// Payloads longer than this are hashed before signing
const MAX_UNHASHED_PAYLOAD: usize = 256;

/// The part of `state_getRuntimeVersion` that goes into signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVersion {
    /// Runtime spec version
    pub spec_version: u32,
    /// Transaction format version
    pub transaction_version: u32,
}

/// Everything besides the call that a signature commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningParams {
    /// Account nonce
    pub nonce: u64,
    /// Tip in base units
    pub tip: u128,
    /// Runtime version at signing time
    pub runtime: RuntimeVersion,
    /// Genesis block hash
    pub genesis_hash: [u8; 32],
    /// Runtime family, selects the signed extensions
    pub profile: RuntimeProfile,
}

impl SigningParams {
    /// Signed extension values carried in the extrinsic
    fn extra(&self) -> Vec<u8> {
        let mut out = vec![IMMORTAL_ERA];
        encode_compact(u128::from(self.nonce), &mut out);
        encode_compact(self.tip, &mut out);
        if self.profile == RuntimeProfile::PolkadotAssetHub {
            // fee paid in the native asset
            out.push(NONE);
        }
        out.push(METADATA_HASH_DISABLED);
        out
    }

    /// Implicit values only the signature covers
    fn additional(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 4 + 32 + 32 + 1);
        out.extend_from_slice(&self.runtime.spec_version.to_le_bytes());
        out.extend_from_slice(&self.runtime.transaction_version.to_le_bytes());
        out.extend_from_slice(&self.genesis_hash);
        out.extend_from_slice(&self.genesis_hash);
        out.push(NONE);
        out
    }

    /// Bytes handed to the signer
    pub fn signing_payload(&self, call: &[u8]) -> Vec<u8> {
        let mut payload = call.to_vec();
        payload.extend(self.extra());
        payload.extend(self.additional());
        if payload.len() > MAX_UNHASHED_PAYLOAD {
            blake2_256(&payload).to_vec()
        } else {
            payload
        }
    }

    /// Assembles a signed extrinsic from its parts
    pub fn encode_signed(&self, call: &[u8], signer: &[u8; 32], signature: &[u8; 64]) -> Vec<u8> {
        let mut body = vec![SIGNED_V4, MULTI_ADDRESS_ID];
        body.extend_from_slice(signer);
        body.push(MULTI_SIGNATURE_SR25519);
        body.extend_from_slice(signature);
        body.extend(self.extra());
        body.extend_from_slice(call);

        let mut out = Vec::with_capacity(body.len() + 5);
        encode_compact(body.len() as u128, &mut out);
        out.extend(body);
        out
    }

    /// Signs `call` and returns the encoded extrinsic
    pub fn sign(&self, call: &[u8], keys: &SubstrateKeys) -> Vec<u8> {
        let signature = keys.sign(&self.signing_payload(call));
        self.encode_signed(call, &keys.public(), &signature)
    }

    /// Extrinsic of the right length with a placeholder signature, for
    /// fee queries that must not require signing
    pub fn fake_signed(&self, call: &[u8], signer: &[u8; 32]) -> Vec<u8> {
        self.encode_signed(call, signer, &[0u8; 64])
    }
}

/// 0x-prefixed blake2-256 hash of an encoded extrinsic
pub fn extrinsic_hash(extrinsic: &[u8]) -> String {
    format!("0x{}", hex::encode(blake2_256(extrinsic)))
}

/// Parses a 0x-prefixed 32-byte block hash
pub fn parse_hash(hash: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hash.strip_prefix("0x").unwrap_or(hash))?;
    bytes
        .try_into()
        .map_err(|_| WalletError::Encoding(format!("{hash} is not a 32-byte hash")))
}
