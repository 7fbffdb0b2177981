//! Static network table with combined Substrate/EVM lookup.

use meshwallet_error::{Result, WalletError};
use url::Url;

use crate::network::{
    ChainFamily, ChainId, ChainVariant, NativeCurrency, NetworkConfig, RuntimeProfile,
    SubstrateParams, TokenConfig,
};

/// Polkadot relay chain genesis hash
pub const POLKADOT_GENESIS: &str =
    "0x91b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3";
/// Kusama relay chain genesis hash
pub const KUSAMA_GENESIS: &str =
    "0xb0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe";
/// Westend testnet genesis hash
pub const WESTEND_GENESIS: &str =
    "0xe143f23803ac50e8f6f8e62695d1ce9e4e1d68aa36c1cd2cfd15340213f3423e";
/// Polkadot Asset Hub genesis hash
pub const POLKADOT_ASSET_HUB_GENESIS: &str =
    "0x68d56f15f85d3136970ec16946040bc1752654e906147f7e43e9d539d7c3de2f";

/// Lookup table of every network the core can connect to.
///
/// Entries are looked up by chain id or by name; a later registration with
/// the same key replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: Vec<NetworkConfig>,
}

impl NetworkRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            networks: Vec::new(),
        }
    }

    /// Creates the registry with the builtin network table
    pub fn builtin() -> Self {
        Self {
            networks: vec![
                polkadot(),
                kusama(),
                westend(),
                polkadot_asset_hub(),
                ethereum(),
                sepolia(),
                polygon(),
                base(),
                arbitrum(),
            ],
        }
    }

    /// Adds or replaces a network after validating its RPC URL
    pub fn register(&mut self, network: NetworkConfig) -> Result<()> {
        validate_rpc_url(&network)?;
        let key = network.chain_id.clone();
        match self.networks.iter_mut().find(|n| n.chain_id.key() == key.key()) {
            Some(existing) => *existing = network,
            None => self.networks.push(network),
        }
        tracing::debug!(chain = %key, "registered network");
        Ok(())
    }

    /// Points an existing network at a different RPC endpoint
    pub fn set_rpc_url(&mut self, id: impl Into<ChainId>, rpc_url: &str) -> Result<()> {
        let id = id.into();
        let network = self
            .networks
            .iter_mut()
            .find(|n| n.matches(&id))
            .ok_or_else(|| WalletError::NetworkNotFound(id.to_string()))?;
        let mut updated = network.clone();
        updated.rpc_url = rpc_url.to_string();
        validate_rpc_url(&updated)?;
        *network = updated;
        Ok(())
    }

    /// Resolves a network by chain id or name
    pub fn lookup(&self, id: impl Into<ChainId>) -> Result<&NetworkConfig> {
        let id = id.into();
        self.networks
            .iter()
            .find(|n| n.matches(&id))
            .ok_or_else(|| WalletError::NetworkNotFound(id.to_string()))
    }

    /// All registered networks
    pub fn networks(&self) -> &[NetworkConfig] {
        &self.networks
    }

    /// Registered networks of one family
    pub fn by_family(&self, family: ChainFamily) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.iter().filter(move |n| n.family() == family)
    }
}

fn validate_rpc_url(network: &NetworkConfig) -> Result<()> {
    let url = Url::parse(&network.rpc_url).map_err(|e| {
        WalletError::Config(format!("invalid RPC URL for {}: {e}", network.name))
    })?;
    let allowed: &[&str] = match network.family() {
        ChainFamily::Evm => &["http", "https"],
        ChainFamily::Substrate => &["ws", "wss"],
    };
    if !allowed.contains(&url.scheme()) {
        return Err(WalletError::Config(format!(
            "{} RPC URL for {} must use one of {:?}",
            network.family(),
            network.name,
            allowed
        )));
    }
    Ok(())
}

fn substrate(
    name: &str,
    key: &str,
    rpc_url: &str,
    explorer_url: &str,
    currency: NativeCurrency,
    params: SubstrateParams,
) -> NetworkConfig {
    NetworkConfig {
        name: name.to_string(),
        chain_id: ChainId::Named(key.to_string()),
        rpc_url: rpc_url.to_string(),
        explorer_url: explorer_url.to_string(),
        native_currency: currency,
        tokens: Vec::new(),
        variant: ChainVariant::Substrate(params),
    }
}

fn evm(
    name: &str,
    chain_id: u64,
    rpc_url: &str,
    explorer_url: &str,
    currency: NativeCurrency,
    tokens: Vec<TokenConfig>,
) -> NetworkConfig {
    NetworkConfig {
        name: name.to_string(),
        chain_id: ChainId::Numeric(chain_id),
        rpc_url: rpc_url.to_string(),
        explorer_url: explorer_url.to_string(),
        native_currency: currency,
        tokens,
        variant: ChainVariant::Evm,
    }
}

/// Polkadot relay chain, the primary network
pub fn polkadot() -> NetworkConfig {
    substrate(
        "Polkadot",
        "polkadot",
        "wss://rpc.polkadot.io",
        "https://polkadot.subscan.io",
        NativeCurrency::new("Polkadot", "DOT", 10),
        SubstrateParams {
            ss58_format: 0,
            genesis_hash: POLKADOT_GENESIS.to_string(),
            runtime: RuntimeProfile::Polkadot,
            primary: true,
        },
    )
}

/// Kusama relay chain
pub fn kusama() -> NetworkConfig {
    substrate(
        "Kusama",
        "kusama",
        "wss://kusama-rpc.polkadot.io",
        "https://kusama.subscan.io",
        NativeCurrency::new("Kusama", "KSM", 12),
        SubstrateParams {
            ss58_format: 2,
            genesis_hash: KUSAMA_GENESIS.to_string(),
            runtime: RuntimeProfile::Kusama,
            primary: false,
        },
    )
}

/// Westend testnet
pub fn westend() -> NetworkConfig {
    substrate(
        "Westend",
        "westend",
        "wss://westend-rpc.polkadot.io",
        "https://westend.subscan.io",
        NativeCurrency::new("Westend", "WND", 12),
        SubstrateParams {
            ss58_format: 42,
            genesis_hash: WESTEND_GENESIS.to_string(),
            runtime: RuntimeProfile::Westend,
            primary: false,
        },
    )
}

/// Polkadot Asset Hub, with assets-pallet stablecoins
pub fn polkadot_asset_hub() -> NetworkConfig {
    let mut network = substrate(
        "Polkadot Asset Hub",
        "polkadot-asset-hub",
        "wss://polkadot-asset-hub-rpc.polkadot.io",
        "https://assethub-polkadot.subscan.io",
        NativeCurrency::new("Polkadot", "DOT", 10),
        SubstrateParams {
            ss58_format: 0,
            genesis_hash: POLKADOT_ASSET_HUB_GENESIS.to_string(),
            runtime: RuntimeProfile::PolkadotAssetHub,
            primary: false,
        },
    );
    network.tokens = vec![
        TokenConfig::new("1984", "Tether USD", "USDT", 6),
        TokenConfig::new("1337", "USD Coin", "USDC", 6),
    ];
    network
}

/// Ethereum mainnet
pub fn ethereum() -> NetworkConfig {
    evm(
        "Ethereum",
        1,
        "https://eth.llamarpc.com",
        "https://etherscan.io",
        NativeCurrency::new("Ether", "ETH", 18),
        vec![
            TokenConfig::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USD Coin", "USDC", 6),
            TokenConfig::new("0xdAC17F958D2ee523a2206206994597C13D831ec7", "Tether USD", "USDT", 6),
            TokenConfig::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "Wrapped Ether", "WETH", 18),
        ],
    )
}

/// Sepolia testnet
pub fn sepolia() -> NetworkConfig {
    evm(
        "Sepolia",
        11_155_111,
        "https://rpc.sepolia.org",
        "https://sepolia.etherscan.io",
        NativeCurrency::new("Sepolia Ether", "ETH", 18),
        Vec::new(),
    )
}

/// Polygon PoS mainnet
pub fn polygon() -> NetworkConfig {
    evm(
        "Polygon",
        137,
        "https://polygon-rpc.com",
        "https://polygonscan.com",
        NativeCurrency::new("POL", "POL", 18),
        vec![
            TokenConfig::new("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359", "USD Coin", "USDC", 6),
            TokenConfig::new("0xc2132D05D31c914a87C6611C10748AEb04B58e8F", "Tether USD", "USDT", 6),
        ],
    )
}

/// Base L2 mainnet
pub fn base() -> NetworkConfig {
    evm(
        "Base",
        8453,
        "https://mainnet.base.org",
        "https://basescan.org",
        NativeCurrency::new("Ether", "ETH", 18),
        vec![
            TokenConfig::new("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", "USD Coin", "USDC", 6),
            TokenConfig::new("0x4200000000000000000000000000000000000006", "Wrapped Ether", "WETH", 18),
        ],
    )
}

/// Arbitrum One
pub fn arbitrum() -> NetworkConfig {
    evm(
        "Arbitrum One",
        42161,
        "https://arb1.arbitrum.io/rpc",
        "https://arbiscan.io",
        NativeCurrency::new("Ether", "ETH", 18),
        vec![TokenConfig::new(
            "0xaf88d065e77c8cC2239327C5EDb3A432268e5831",
            "USD Coin",
            "USDC",
            6,
        )],
    )
}
