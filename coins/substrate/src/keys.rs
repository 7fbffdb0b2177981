//! sr25519 keys derived from a BIP-39 mnemonic.
//!
//! Seed derivation follows substrate-bip39: PBKDF2-HMAC-SHA512 over the
//! mnemonic *entropy* (not the phrase) with the salt `"mnemonic" ++
//! password`, 2048 rounds. The first 32 bytes become the schnorrkel mini
//! secret key, expanded in Ed25519 mode. This matches the root account
//! produced by polkadot.js and subkey for the same phrase.

use bip39::Mnemonic;
use hmac::Hmac;
use meshwallet_core::Zeroizing;
use meshwallet_error::{Result, WalletError};
use schnorrkel::{signing_context, ExpansionMode, Keypair, MiniSecretKey, PublicKey, Signature};
use sha2::Sha512;

use crate::ss58;

/// Signing context shared by every Substrate runtime
pub const SIGNING_CONTEXT: &[u8] = b"substrate";

const SEED_ROUNDS: u32 = 2048;

/// sr25519 key pair of one Substrate account.
///
/// The key is network-independent; the address is not, since it is the
/// SS58 encoding of the public key under the network's format.
pub struct SubstrateKeys {
    mini_secret: Zeroizing<[u8; 32]>,
    keypair: Keypair,
}

impl SubstrateKeys {
    /// Derives the root key of a mnemonic with an empty password
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        Self::from_mnemonic_with_password(phrase, "")
    }

    /// Derives the root key of a mnemonic with a password
    pub fn from_mnemonic_with_password(phrase: &str, password: &str) -> Result<Self> {
        let mnemonic =
            Mnemonic::parse(phrase).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        let entropy = Zeroizing::new(mnemonic.to_entropy());

        let salt = Zeroizing::new(format!("mnemonic{password}"));
        let mut seed = Zeroizing::new([0u8; 64]);
        pbkdf2::pbkdf2::<Hmac<Sha512>>(&entropy, salt.as_bytes(), SEED_ROUNDS, &mut seed[..])
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;

        let mut mini_secret = Zeroizing::new([0u8; 32]);
        mini_secret.copy_from_slice(&seed[..32]);
        Self::from_mini_secret(mini_secret)
    }

    /// Imports a 32-byte mini secret key as 0x-prefixed or bare hex
    pub fn from_seed_hex(seed: &str) -> Result<Self> {
        let bytes = Zeroizing::new(hex::decode(seed.strip_prefix("0x").unwrap_or(seed))?);
        if bytes.len() != 32 {
            return Err(WalletError::KeyDerivation(format!(
                "sr25519 seed must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut mini_secret = Zeroizing::new([0u8; 32]);
        mini_secret.copy_from_slice(&bytes);
        Self::from_mini_secret(mini_secret)
    }

    fn from_mini_secret(mini_secret: Zeroizing<[u8; 32]>) -> Result<Self> {
        let keypair = MiniSecretKey::from_bytes(&mini_secret[..])
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?
            .expand_to_keypair(ExpansionMode::Ed25519);
        Ok(Self {
            mini_secret,
            keypair,
        })
    }

    /// Raw 32-byte public key (the account id)
    pub fn public(&self) -> [u8; 32] {
        self.keypair.public.to_bytes()
    }

    /// 0x-prefixed public key
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public()))
    }

    /// 0x-prefixed mini secret key, the form subkey calls the secret seed
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(&self.mini_secret[..])))
    }

    /// SS58 address under a network's address format
    pub fn address(&self, ss58_format: u16) -> Result<String> {
        ss58::encode(ss58_format, &self.public())
    }

    /// Signs raw bytes in the `substrate` signing context.
    ///
    /// The message is signed as given; it is not wrapped in
    /// `<Bytes>..</Bytes>` the way browser extensions do.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let context = signing_context(SIGNING_CONTEXT);
        self.keypair.sign(context.bytes(message)).to_bytes()
    }
}

/// Checks an sr25519 signature made by [`SubstrateKeys::sign`]
pub fn verify(message: &[u8], signature: &[u8], public: &[u8; 32]) -> bool {
    let (Ok(public), Ok(signature)) = (
        PublicKey::from_bytes(public),
        Signature::from_bytes(signature),
    ) else {
        return false;
    };
    public
        .verify(signing_context(SIGNING_CONTEXT).bytes(message), &signature)
        .is_ok()
}

impl std::fmt::Debug for SubstrateKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstrateKeys")
            .field("public", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshwallet_testing::{EdgeCaseMnemonics, KnownVectors};

    #[test]
    fn test_dev_phrase_root_key() {
        let keys = SubstrateKeys::from_mnemonic(EdgeCaseMnemonics::SUBSTRATE_DEV).unwrap();
        assert_eq!(keys.public(), KnownVectors::substrate_dev_public());
        assert_eq!(keys.address(42).unwrap(), KnownVectors::SUBSTRATE_DEV_SS58_42);
    }

    #[test]
    fn test_password_changes_key() {
        let plain = SubstrateKeys::from_mnemonic(EdgeCaseMnemonics::SUBSTRATE_DEV).unwrap();
        let salted =
            SubstrateKeys::from_mnemonic_with_password(EdgeCaseMnemonics::SUBSTRATE_DEV, "pw")
                .unwrap();
        assert_ne!(plain.public(), salted.public());
    }

    #[test]
    fn test_seed_export_reimports() {
        let keys = SubstrateKeys::from_mnemonic(EdgeCaseMnemonics::STANDARD_12).unwrap();
        let seed = keys.private_key_hex();
        assert_eq!(seed.len(), 66);
        let again = SubstrateKeys::from_seed_hex(&seed).unwrap();
        assert_eq!(again.public(), keys.public());
        assert!(SubstrateKeys::from_seed_hex("0x1234").is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = SubstrateKeys::from_mnemonic(EdgeCaseMnemonics::STANDARD_12).unwrap();
        let signature = keys.sign(b"hello");
        assert!(verify(b"hello", &signature, &keys.public()));
        assert!(!verify(b"goodbye", &signature, &keys.public()));
        assert!(!verify(b"hello", &signature[..63], &keys.public()));
    }

    #[test]
    fn test_invalid_mnemonics_rejected() {
        for phrase in EdgeCaseMnemonics::invalid() {
            assert!(matches!(
                SubstrateKeys::from_mnemonic(phrase),
                Err(WalletError::InvalidMnemonic(_))
            ));
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let keys = SubstrateKeys::from_mnemonic(EdgeCaseMnemonics::STANDARD_12).unwrap();
        let debug = format!("{keys:?}");
        assert!(!debug.contains(&keys.private_key_hex()[2..]));
    }
}
