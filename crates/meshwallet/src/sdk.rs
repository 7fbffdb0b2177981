//! The session facade.

use std::sync::Arc;

use meshwallet_core::{
    BaseUnits, ChainFamily, ChainId, FeePrecision, NetworkConfig, NetworkRegistry, Zeroizing,
};
use meshwallet_error::{Result, WalletError};
use meshwallet_traits::{
    Balances, DetailedBalance, FeeEstimate, NativeBalance, TokenInfo, TransactionRequest, TxHash,
    WalletProvider, WalletState,
};

#[cfg(feature = "evm")]
use meshwallet_evm::{EvmConnector, EvmWalletProvider, HttpConnector};
#[cfg(feature = "substrate")]
use meshwallet_substrate::{SubstrateConnector, SubstrateWalletProvider, WsConnector};

use crate::config::SdkConfig;

#[cfg(not(any(feature = "evm", feature = "substrate")))]
compile_error!("enable at least one of the `evm` or `substrate` features");

/// The provider of the connected network
#[derive(Debug)]
pub enum ActiveProvider {
    /// EVM network
    #[cfg(feature = "evm")]
    Evm(EvmWalletProvider),
    /// Substrate network
    #[cfg(feature = "substrate")]
    Substrate(SubstrateWalletProvider),
}

impl ActiveProvider {
    /// The provider behind the capability trait
    pub fn as_provider(&self) -> &dyn WalletProvider {
        match self {
            #[cfg(feature = "evm")]
            Self::Evm(p) => p,
            #[cfg(feature = "substrate")]
            Self::Substrate(p) => p,
        }
    }

    fn as_provider_mut(&mut self) -> &mut dyn WalletProvider {
        match self {
            #[cfg(feature = "evm")]
            Self::Evm(p) => p,
            #[cfg(feature = "substrate")]
            Self::Substrate(p) => p,
        }
    }
}

/// One wallet session: a mnemonic, a network table and at most one
/// connected network.
///
/// ```text
/// Disconnected --connect(id)--> Connected(provider) --disconnect--> Disconnected
/// ```
///
/// Every operation except [`connect`](WalletSdk::connect) fails with
/// [`WalletError::NotConnected`] while disconnected. Switching networks
/// always disconnects the current provider and builds a fresh one.
pub struct WalletSdk {
    registry: NetworkRegistry,
    mnemonic: Zeroizing<String>,
    fee_precision: FeePrecision,
    #[cfg(feature = "evm")]
    evm_connector: Arc<dyn EvmConnector>,
    #[cfg(feature = "substrate")]
    substrate_connector: Arc<dyn SubstrateConnector>,
    active: Option<ActiveProvider>,
}

impl WalletSdk {
    /// Session over the builtin networks with the default transports
    pub fn new(mnemonic: &str) -> Self {
        Self::builder(mnemonic).build_with_registry(NetworkRegistry::builtin())
    }

    /// Starts a [`WalletSdkBuilder`]
    pub fn builder(mnemonic: &str) -> WalletSdkBuilder {
        WalletSdkBuilder::new(mnemonic)
    }

    /// Network table of this session
    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Returns true while a provider is connected
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Network of the connected provider
    pub fn active_network(&self) -> Option<&NetworkConfig> {
        self.active.as_ref().map(|a| a.as_provider().network())
    }

    /// The connected provider
    pub fn active_provider(&self) -> Option<&ActiveProvider> {
        self.active.as_ref()
    }

    fn provider(&self) -> Result<&dyn WalletProvider> {
        self.active
            .as_ref()
            .map(ActiveProvider::as_provider)
            .ok_or(WalletError::NotConnected)
    }

    fn instantiate(&self, network: NetworkConfig) -> Result<ActiveProvider> {
        match network.family() {
            #[cfg(feature = "evm")]
            ChainFamily::Evm => Ok(ActiveProvider::Evm(
                EvmWalletProvider::with_connector(
                    network,
                    &self.mnemonic,
                    Arc::clone(&self.evm_connector),
                )?
                .with_fee_precision(self.fee_precision),
            )),
            #[cfg(feature = "substrate")]
            ChainFamily::Substrate => Ok(ActiveProvider::Substrate(
                SubstrateWalletProvider::with_connector(
                    network,
                    &self.mnemonic,
                    Arc::clone(&self.substrate_connector),
                )?
                .with_fee_precision(self.fee_precision),
            )),
            #[allow(unreachable_patterns)]
            family => Err(WalletError::NotSupported(format!(
                "{family} networks are not enabled in this build"
            ))),
        }
    }

    /// Resolves a network and connects a fresh provider for it.
    ///
    /// A session that is already connected is disconnected first. If the
    /// new connection fails the session stays disconnected.
    pub async fn connect(&mut self, chain_id: impl Into<ChainId>) -> Result<()> {
        let chain_id = chain_id.into();
        let network = self.registry.lookup(&chain_id)?.clone();
        self.disconnect().await?;

        let mut provider = self.instantiate(network)?;
        provider.as_provider_mut().connect().await?;
        tracing::info!(chain = %chain_id, family = %provider.as_provider().family(), "session connected");
        self.active = Some(provider);
        Ok(())
    }

    /// Drops the connected provider. A no-op when disconnected.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut provider) = self.active.take() {
            provider.as_provider_mut().disconnect().await?;
        }
        Ok(())
    }

    /// `disconnect()` followed by `connect(chain_id)`
    pub async fn switch_network(&mut self, chain_id: impl Into<ChainId>) -> Result<()> {
        let chain_id = chain_id.into();
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }
        // resolve first so an unknown id leaves the current session intact
        self.registry.lookup(&chain_id)?;
        self.disconnect().await?;
        self.connect(chain_id).await
    }

    /// Address on the connected network
    pub fn get_address(&self) -> Result<String> {
        self.provider()?.get_address()
    }

    /// Native balance in base units
    pub async fn get_balance(&self) -> Result<String> {
        self.provider()?.get_balance().await
    }

    /// Token balance in base units
    pub async fn get_token_balance(&self, token_address: &str) -> Result<String> {
        self.provider()?.get_token_balance(token_address).await
    }

    /// Native entry followed by every configured token
    pub async fn list_tokens(&self) -> Result<Vec<TokenInfo>> {
        self.provider()?.list_tokens().await
    }

    /// Substrate balance breakdown; `NotSupported` on EVM networks
    pub async fn get_detailed_balance(&self) -> Result<DetailedBalance> {
        match self.active.as_ref().ok_or(WalletError::NotConnected)? {
            #[cfg(feature = "substrate")]
            ActiveProvider::Substrate(p) => p.get_detailed_balance().await,
            #[allow(unreachable_patterns)]
            other => Err(WalletError::NotSupported(format!(
                "detailed balances are not available on {}",
                other.as_provider().network().name
            ))),
        }
    }

    /// Address, native balance, tokens and (Substrate) detailed balance
    pub async fn get_wallet_state(&self) -> Result<WalletState> {
        let provider = self.provider()?;
        let network = provider.network().clone();
        let address = provider.get_address()?;
        let balance: BaseUnits = provider.get_balance().await?.parse()?;
        let tokens = provider.list_tokens().await?;
        let detailed = match network.family() {
            ChainFamily::Substrate => Some(self.get_detailed_balance().await?),
            ChainFamily::Evm => None,
        };
        Ok(WalletState {
            address,
            balances: Balances {
                native: NativeBalance::new(&network, &balance),
                tokens,
                detailed,
            },
            network,
        })
    }

    /// Fee of a request on the connected network
    pub async fn estimate_fee(&self, request: &TransactionRequest) -> Result<FeeEstimate> {
        self.provider()?.estimate_fee(request).await
    }

    /// Signs and submits a request.
    ///
    /// On Substrate networks this resolves only once the extrinsic is
    /// finalized.
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash> {
        self.provider()?.send_transaction(request).await
    }

    /// Signs an arbitrary message
    pub async fn sign_message(&self, message: &[u8]) -> Result<String> {
        self.provider()?.sign_message(message).await
    }

    /// Public key of the connected account
    pub fn export_public_key(&self) -> Result<String> {
        self.provider()?.export_public_key()
    }

    /// Private key of the connected account.
    ///
    /// DANGER: only for an explicit user request.
    pub fn export_private_key(&self) -> Result<Zeroizing<String>> {
        self.provider()?.export_private_key()
    }
}

impl std::fmt::Debug for WalletSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSdk")
            .field("networks", &self.registry.networks().len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Builder for [`WalletSdk`]
pub struct WalletSdkBuilder {
    mnemonic: Zeroizing<String>,
    config: SdkConfig,
    #[cfg(feature = "evm")]
    evm_connector: Arc<dyn EvmConnector>,
    #[cfg(feature = "substrate")]
    substrate_connector: Arc<dyn SubstrateConnector>,
}

impl WalletSdkBuilder {
    fn new(mnemonic: &str) -> Self {
        Self {
            mnemonic: Zeroizing::new(mnemonic.to_string()),
            config: SdkConfig::default(),
            #[cfg(feature = "evm")]
            evm_connector: Arc::new(HttpConnector),
            #[cfg(feature = "substrate")]
            substrate_connector: Arc::new(WsConnector),
        }
    }

    /// Uses a loaded configuration
    pub fn config(mut self, config: SdkConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the fee display precision window
    pub fn fee_precision(mut self, precision: FeePrecision) -> Self {
        self.config.fee_precision = precision;
        self
    }

    /// Replaces the EVM transport
    #[cfg(feature = "evm")]
    pub fn evm_connector(mut self, connector: Arc<dyn EvmConnector>) -> Self {
        self.evm_connector = connector;
        self
    }

    /// Replaces the Substrate transport
    #[cfg(feature = "substrate")]
    pub fn substrate_connector(mut self, connector: Arc<dyn SubstrateConnector>) -> Self {
        self.substrate_connector = connector;
        self
    }

    /// Builds the registry from the configuration and creates the session
    pub fn build(self) -> Result<WalletSdk> {
        let registry = self.config.build_registry()?;
        Ok(self.build_with_registry(registry))
    }

    /// Creates the session over an explicit registry, ignoring the
    /// configured networks and overrides
    pub fn build_with_registry(self, registry: NetworkRegistry) -> WalletSdk {
        WalletSdk {
            registry,
            mnemonic: self.mnemonic,
            fee_precision: self.config.fee_precision,
            #[cfg(feature = "evm")]
            evm_connector: self.evm_connector,
            #[cfg(feature = "substrate")]
            substrate_connector: self.substrate_connector,
            active: None,
        }
    }
}
