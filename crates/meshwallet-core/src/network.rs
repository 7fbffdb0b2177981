//! Network descriptors.
//!
//! A [`NetworkConfig`] is immutable once registered. The `variant` tag tells
//! the facade which provider family to instantiate without inspecting types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address that stands for the network's native currency in token queries.
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// The two structurally different transaction models served by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// Extrinsic-based Substrate chains
    Substrate,
    /// Account-based EVM chains
    Evm,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFamily::Substrate => write!(f, "substrate"),
            ChainFamily::Evm => write!(f, "evm"),
        }
    }
}

/// Registry key for a network: an EVM chain id or a Substrate network name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainId {
    /// Numeric chain id (EVM)
    Numeric(u64),
    /// Named network (Substrate), stored lowercase
    Named(String),
}

impl ChainId {
    /// Normalized lookup key
    pub fn key(&self) -> String {
        match self {
            ChainId::Numeric(id) => id.to_string(),
            ChainId::Named(name) => name.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Numeric(id) => write!(f, "{id}"),
            ChainId::Named(name) => write!(f, "{name}"),
        }
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId::Numeric(id)
    }
}

impl From<&str> for ChainId {
    /// Numeric strings become [`ChainId::Numeric`]
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<u64>() {
            Ok(id) => ChainId::Numeric(id),
            Err(_) => ChainId::Named(s.to_lowercase()),
        }
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        ChainId::from(s.as_str())
    }
}

impl From<&ChainId> for ChainId {
    fn from(id: &ChainId) -> Self {
        id.clone()
    }
}

/// Native currency of a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Currency name (e.g. "Polkadot")
    pub name: String,
    /// Ticker (e.g. "DOT")
    pub symbol: String,
    /// Decimal places of the base unit
    pub decimals: u8,
}

impl NativeCurrency {
    /// Creates a native currency descriptor
    pub fn new(name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// Static token descriptor sourced from the network table.
///
/// On EVM networks `address` is the ERC-20 contract; on Substrate networks
/// it is the decimal asset id of the assets pallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    /// Contract address or asset id
    pub address: String,
    /// Token name
    pub name: String,
    /// Ticker
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    /// Logo URL
    #[serde(default, rename = "logoURI", skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl TokenConfig {
    /// Creates a token descriptor without a logo
    pub fn new(address: &str, name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            address: address.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            logo_uri: None,
        }
    }
}

/// Runtime family of a Substrate network; selects pallet indices and
/// signed extensions in the call registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeProfile {
    /// Polkadot relay chain
    Polkadot,
    /// Kusama relay chain
    Kusama,
    /// Westend testnet relay chain
    Westend,
    /// Polkadot Asset Hub system parachain
    PolkadotAssetHub,
}

/// Substrate-only network parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstrateParams {
    /// SS58 address format prefix
    pub ss58_format: u16,
    /// 0x-prefixed genesis block hash
    pub genesis_hash: String,
    /// Runtime family for call dispatch
    pub runtime: RuntimeProfile,
    /// The distinguished network whose transfer action is special-cased
    #[serde(default)]
    pub primary: bool,
}

/// Chain-family discriminant carried by every network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum ChainVariant {
    /// Substrate network
    Substrate(SubstrateParams),
    /// EVM network
    Evm,
}

/// Immutable descriptor of one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Display name
    pub name: String,
    /// Registry key
    pub chain_id: ChainId,
    /// RPC endpoint: `http(s)://` for EVM, `ws(s)://` for Substrate
    pub rpc_url: String,
    /// Block explorer
    pub explorer_url: String,
    /// Native currency
    pub native_currency: NativeCurrency,
    /// Configured tokens
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Chain family and its parameters
    #[serde(flatten)]
    pub variant: ChainVariant,
}

impl NetworkConfig {
    /// Chain family of this network
    pub fn family(&self) -> ChainFamily {
        match self.variant {
            ChainVariant::Substrate(_) => ChainFamily::Substrate,
            ChainVariant::Evm => ChainFamily::Evm,
        }
    }

    /// Substrate parameters, if this is a Substrate network
    pub fn substrate(&self) -> Option<&SubstrateParams> {
        match &self.variant {
            ChainVariant::Substrate(params) => Some(params),
            ChainVariant::Evm => None,
        }
    }

    /// Numeric EVM chain id, if any
    pub fn evm_chain_id(&self) -> Option<u64> {
        match (&self.variant, &self.chain_id) {
            (ChainVariant::Evm, ChainId::Numeric(id)) => Some(*id),
            _ => None,
        }
    }

    /// Decimals of the native currency
    pub fn decimals(&self) -> u32 {
        u32::from(self.native_currency.decimals)
    }

    /// Returns true if `name_or_id` names this network
    pub fn matches(&self, id: &ChainId) -> bool {
        let key = id.key();
        self.chain_id.key() == key || self.name.to_lowercase() == key
    }
}
