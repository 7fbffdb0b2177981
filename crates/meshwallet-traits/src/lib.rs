//! # meshwallet Traits
//!
//! The capability interface shared by both provider families, plus the
//! request and response types that cross it.
//!
//! ## Core Trait
//!
//! - [`WalletProvider`] - connect, address, balances, tokens, fees, sending
//!
//! ## Example
//!
//! ```ignore
//! use meshwallet_traits::prelude::*;
//!
//! async fn show_balance<P: WalletProvider>(provider: &P) -> Result<String> {
//!     provider.get_balance().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use meshwallet_core::{
    format_fee, format_units, BaseUnits, ChainFamily, FeePrecision, FormatOptions, NetworkConfig,
    TokenConfig, Zeroizing,
};
use meshwallet_error::{Result, WalletError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a transaction hash/ID
///
/// `0x`-prefixed hex on both families; on Substrate it is the blake2-256
/// hash of the encoded extrinsic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    /// Creates a new TxHash from a string
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Transaction Requests
// ============================================================================

/// Substrate request: a call module, a function name and its arguments.
///
/// `params[0]` names the function; the remaining entries are its arguments
/// in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolkadotTransactionRequest {
    /// Call module (pallet) name, e.g. `"balances"`
    pub method: String,
    /// Function name followed by call arguments
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl PolkadotTransactionRequest {
    /// Creates a request for `module.function(args..)`
    pub fn new(module: &str, function: &str, args: Vec<serde_json::Value>) -> Self {
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(serde_json::Value::String(function.to_string()));
        params.extend(args);
        Self {
            method: module.to_string(),
            params,
        }
    }
}

/// EVM request. `value` is a human decimal amount of the native currency;
/// the fee fields are base-unit (wei) integer strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvmTransactionRequest {
    /// Recipient address
    pub to: String,
    /// Amount of native currency, e.g. `"0.1"`
    pub value: String,
    /// 0x-prefixed calldata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Gas limit; estimated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Legacy gas price in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    /// EIP-1559 max fee per gas in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    /// EIP-1559 priority fee per gas in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    /// Nonce override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
}

impl EvmTransactionRequest {
    /// Plain value transfer
    pub fn transfer(to: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}

/// A transaction shaped for exactly one chain family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionRequest {
    /// Substrate extrinsic request
    Polkadot(PolkadotTransactionRequest),
    /// EVM transaction request
    Evm(EvmTransactionRequest),
}

impl TransactionRequest {
    /// Chain family the request is shaped for
    pub fn family(&self) -> ChainFamily {
        match self {
            TransactionRequest::Polkadot(_) => ChainFamily::Substrate,
            TransactionRequest::Evm(_) => ChainFamily::Evm,
        }
    }

    /// Borrows the EVM shape or fails with `UnsupportedTransactionVariant`
    pub fn as_evm(&self) -> Result<&EvmTransactionRequest> {
        match self {
            TransactionRequest::Evm(req) => Ok(req),
            other => Err(mismatch(ChainFamily::Evm, other.family())),
        }
    }

    /// Borrows the Substrate shape or fails with `UnsupportedTransactionVariant`
    pub fn as_polkadot(&self) -> Result<&PolkadotTransactionRequest> {
        match self {
            TransactionRequest::Polkadot(req) => Ok(req),
            other => Err(mismatch(ChainFamily::Substrate, other.family())),
        }
    }
}

fn mismatch(expected: ChainFamily, got: ChainFamily) -> WalletError {
    WalletError::UnsupportedTransactionVariant {
        expected: expected.to_string(),
        got: got.to_string(),
    }
}

impl From<PolkadotTransactionRequest> for TransactionRequest {
    fn from(req: PolkadotTransactionRequest) -> Self {
        TransactionRequest::Polkadot(req)
    }
}

impl From<EvmTransactionRequest> for TransactionRequest {
    fn from(req: EvmTransactionRequest) -> Self {
        TransactionRequest::Evm(req)
    }
}

// ============================================================================
// Balances and Fees
// ============================================================================

/// A configured token with its live balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Static token descriptor
    #[serde(flatten)]
    pub token: TokenConfig,
    /// Balance in base units
    pub balance: String,
    /// Display string
    pub formatted: String,
}

impl TokenInfo {
    /// Builds an entry from a live base-unit balance
    pub fn new(token: TokenConfig, balance: &BaseUnits) -> Self {
        let formatted = format_units(balance, u32::from(token.decimals), FormatOptions::default());
        Self {
            token,
            balance: balance.to_string(),
            formatted,
        }
    }

    /// Entry for a token whose contract could not be read
    pub fn degraded(token: TokenConfig) -> Self {
        Self::new(token, &BaseUnits::zero())
    }
}

/// Token entry as carried in [`WalletState`]
pub type TokenBalance = TokenInfo;

/// Native currency balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBalance {
    /// Ticker
    pub symbol: String,
    /// Balance in base units
    pub balance: String,
    /// Display string
    pub formatted: String,
}

impl NativeBalance {
    /// Builds the native entry for a network
    pub fn new(network: &NetworkConfig, balance: &BaseUnits) -> Self {
        Self {
            symbol: network.native_currency.symbol.clone(),
            balance: balance.to_string(),
            formatted: format_units(balance, network.decimals(), FormatOptions::default()),
        }
    }
}

/// Display strings of a [`DetailedBalance`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedFormatted {
    /// Formatted total
    pub total: String,
    /// Formatted locked
    pub locked: String,
    /// Formatted transferable
    pub transferable: String,
}

/// Substrate account balance split into spendable and locked parts.
///
/// `transferable == max(0, total - locked)` always holds; a locked amount
/// above the total clamps transferable to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedBalance {
    /// Total balance in base units
    pub total: String,
    /// Locked or reserved balance in base units
    pub locked: String,
    /// Spendable balance in base units
    pub transferable: String,
    /// Display strings
    pub formatted: DetailedFormatted,
}

impl DetailedBalance {
    /// Derives `transferable` from `total` and `locked` and formats all three
    pub fn from_parts(total: &BaseUnits, locked: &BaseUnits, decimals: u32) -> Self {
        let transferable = total.saturating_sub(locked);
        let fmt = |v: &BaseUnits| format_units(v, decimals, FormatOptions::default());
        Self {
            total: total.to_string(),
            locked: locked.to_string(),
            transferable: transferable.to_string(),
            formatted: DetailedFormatted {
                total: fmt(total),
                locked: fmt(locked),
                transferable: fmt(&transferable),
            },
        }
    }
}

/// Native, token and (Substrate) detailed balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    /// Native currency
    pub native: NativeBalance,
    /// Native entry followed by every configured token
    pub tokens: Vec<TokenBalance>,
    /// Substrate only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed: Option<DetailedBalance>,
}

/// Aggregated view of the connected account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    /// Account address on the active network
    pub address: String,
    /// All balances
    pub balances: Balances,
    /// Active network
    pub network: NetworkConfig,
}

/// Estimated fee of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Fee in base units
    pub fee: String,
    /// Adaptive-precision display string
    pub formatted: String,
    /// Native currency ticker
    pub currency: String,
}

impl FeeEstimate {
    /// Formats a raw fee with the adaptive precision search
    pub fn new(fee: &BaseUnits, network: &NetworkConfig, precision: FeePrecision) -> Self {
        Self {
            fee: fee.to_string(),
            formatted: format_fee(fee, network.decimals(), precision),
            currency: network.native_currency.symbol.clone(),
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Capability interface implemented by every chain-family provider.
///
/// A provider is bound to one network. It holds no key material or
/// connection until [`connect`](WalletProvider::connect) and drops both on
/// [`disconnect`](WalletProvider::disconnect). Every operation other than
/// `connect` fails with [`WalletError::NotConnected`] before that.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Derives keys and opens the chain connection. Idempotent.
    async fn connect(&mut self) -> Result<()>;

    /// Drops keys and the connection. A no-op when not connected.
    async fn disconnect(&mut self) -> Result<()>;

    /// Returns true between `connect` and `disconnect`
    fn is_connected(&self) -> bool;

    /// Chain family served by this provider
    fn family(&self) -> ChainFamily;

    /// Network this provider is bound to
    fn network(&self) -> &NetworkConfig;

    /// Account address, formatted for the network
    fn get_address(&self) -> Result<String>;

    /// Signs an arbitrary message, returning a 0x-prefixed hex signature
    async fn sign_message(&self, message: &[u8]) -> Result<String>;

    /// Native balance in base units
    async fn get_balance(&self) -> Result<String>;

    /// Token balance in base units; the zero address means the native token
    async fn get_token_balance(&self, token_address: &str) -> Result<String>;

    /// Native entry first, then every configured token.
    ///
    /// A token whose contract cannot be read degrades to a zero balance
    /// instead of failing the whole listing.
    async fn list_tokens(&self) -> Result<Vec<TokenInfo>>;

    /// Signs and submits a transaction
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash>;

    /// Estimates the fee of a transaction without submitting it
    async fn estimate_fee(&self, request: &TransactionRequest) -> Result<FeeEstimate>;

    /// Exports the public key as 0x-prefixed hex (safe to share)
    fn export_public_key(&self) -> Result<String>;

    /// Exports the private key as 0x-prefixed hex.
    ///
    /// DANGER: only call this on an explicit user request. The returned
    /// string is zeroized on drop.
    fn export_private_key(&self) -> Result<Zeroizing<String>>;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Balances, DetailedBalance, EvmTransactionRequest, FeeEstimate, NativeBalance,
        PolkadotTransactionRequest, TokenBalance, TokenInfo, TransactionRequest, TxHash,
        WalletProvider, WalletState,
    };
    pub use meshwallet_error::{Result, WalletError};
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshwallet_core::NetworkRegistry;
    use serde_json::json;

    // ============================================================================
    // Request Tests
    // ============================================================================

    #[test]
    fn test_request_shapes_from_json() {
        let sub: TransactionRequest = serde_json::from_value(json!({
            "method": "balances",
            "params": ["transfer", "5Grw...", "1.5"]
        }))
        .unwrap();
        assert_eq!(sub.family(), ChainFamily::Substrate);

        let evm: TransactionRequest = serde_json::from_value(json!({
            "to": "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",
            "value": "0.1",
            "gasLimit": 21000
        }))
        .unwrap();
        assert_eq!(evm.family(), ChainFamily::Evm);
        assert_eq!(evm.as_evm().unwrap().gas_limit, Some(21000));
    }

    #[test]
    fn test_variant_mismatch() {
        let req = TransactionRequest::from(EvmTransactionRequest::transfer("0x00", "1"));
        let err = req.as_polkadot().unwrap_err();
        assert_eq!(
            err,
            WalletError::UnsupportedTransactionVariant {
                expected: "substrate".into(),
                got: "evm".into(),
            }
        );
    }

    #[test]
    fn test_polkadot_request_builder() {
        let req = PolkadotTransactionRequest::new("system", "remark", vec![json!("0x01")]);
        assert_eq!(req.params[0], json!("remark"));
        assert_eq!(req.params.len(), 2);
    }

    // ============================================================================
    // Balance Tests
    // ============================================================================

    #[test]
    fn test_detailed_balance_clamps() {
        let total = BaseUnits::from(100u64);
        let locked = BaseUnits::from(150u64);
        let detailed = DetailedBalance::from_parts(&total, &locked, 2);
        assert_eq!(detailed.transferable, "0");
        assert_eq!(detailed.formatted.transferable, "0.0");
        assert_eq!(detailed.formatted.locked, "1.5");
    }

    #[test]
    fn test_detailed_balance_subtracts() {
        let detailed =
            DetailedBalance::from_parts(&BaseUnits::from(1000u64), &BaseUnits::from(250u64), 3);
        assert_eq!(detailed.transferable, "750");
        assert_eq!(detailed.formatted.total, "1.0");
        assert_eq!(detailed.formatted.transferable, "0.75");
    }

    #[test]
    fn test_degraded_token() {
        let info = TokenInfo::degraded(TokenConfig::new("0xdead", "Ghost", "GST", 18));
        assert_eq!(info.balance, "0");
        assert_eq!(info.formatted, "0.0");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["symbol"], "GST");
        assert_eq!(json["balance"], "0");
    }

    #[test]
    fn test_fee_estimate_uses_native_symbol() {
        let registry = NetworkRegistry::builtin();
        let westend = registry.lookup("westend").unwrap();
        let fee = FeeEstimate::new(&BaseUnits::from(15_600_000u64), westend, FeePrecision::default());
        assert_eq!(fee.currency, "WND");
        assert_eq!(fee.fee, "15600000");
        assert_eq!(fee.formatted, "0.0000156");
    }
}
