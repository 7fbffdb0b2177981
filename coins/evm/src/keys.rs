//! BIP-44 key derivation and message signing for EVM accounts.

use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use meshwallet_core::Zeroizing;
use meshwallet_error::{Result, WalletError};

/// Ethereum BIP-44 derivation path prefix; the account index is appended
pub const ETH_DERIVATION_PREFIX: &str = "m/44'/60'/0'/0";

/// secp256k1 key pair of one EVM account.
///
/// Derivation does not depend on the network, so one mnemonic yields the
/// same address on every EVM chain.
#[derive(Clone)]
pub struct EvmKeys {
    signer: PrivateKeySigner,
}

impl EvmKeys {
    /// Derives the first account (`m/44'/60'/0'/0/0`)
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        Self::from_mnemonic_with_index(phrase, 0)
    }

    /// Derives the account at `m/44'/60'/0'/0/{index}`
    pub fn from_mnemonic_with_index(phrase: &str, index: u32) -> Result<Self> {
        let mnemonic =
            Mnemonic::parse(phrase).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));

        let path = DerivationPath::from_str(&format!("{ETH_DERIVATION_PREFIX}/{index}"))
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let child = XPrv::derive_from_path(&seed[..], &path)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let key_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(child.private_key().to_bytes().into());

        let signer = PrivateKeySigner::from_slice(&key_bytes[..])
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        Ok(Self { signer })
    }

    /// Imports a raw 0x-prefixed or bare hex private key
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let key = private_key.strip_prefix("0x").unwrap_or(private_key);
        let bytes = Zeroizing::new(hex::decode(key)?);
        let signer = PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        Ok(Self { signer })
    }

    /// Account address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-55 checksummed address string
    pub fn address_string(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    /// Signer for the wallet filler of the RPC provider
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// SEC1 compressed public key, 0x-prefixed hex
    pub fn public_key_hex(&self) -> String {
        let public = self.signer.credential().verifying_key().to_encoded_point(true);
        format!("0x{}", hex::encode(public.as_bytes()))
    }

    /// Raw private key, 0x-prefixed hex
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.signer.to_bytes())))
    }

    /// EIP-191 personal-sign; returns the 65-byte signature as 0x hex
    pub async fn sign_message(&self, message: &[u8]) -> Result<String> {
        let signature = self
            .signer
            .sign_message(message)
            .await
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

impl std::fmt::Debug for EvmKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmKeys")
            .field("address", &self.address_string())
            .finish()
    }
}

/// Checks an EIP-191 signature against an address
pub fn verify_message(message: &[u8], signature_hex: &str, address: &str) -> Result<bool> {
    let expected = parse_address(address)?;
    let raw = hex::decode(signature_hex.strip_prefix("0x").unwrap_or(signature_hex))?;
    let signature =
        Signature::from_raw(&raw).map_err(|e| WalletError::Encoding(format!("signature: {e}")))?;
    let recovered = signature
        .recover_address_from_msg(message)
        .map_err(|e| WalletError::Signing(e.to_string()))?;
    Ok(recovered == expected)
}

/// Parses a 0x-prefixed 20-byte hex address
pub fn parse_address(address: &str) -> Result<Address> {
    if !address.starts_with("0x") {
        return Err(WalletError::invalid_address(address, "missing 0x prefix"));
    }
    Address::from_str(address).map_err(|e| WalletError::invalid_address(address, e.to_string()))
}

/// Returns true for a well-formed 0x-prefixed 20-byte hex address
pub fn is_valid_address(address: &str) -> bool {
    parse_address(address).is_ok()
}
