//! JSON-RPC access to an EVM node.
//!
//! [`EvmClient`] is the narrow set of calls the provider needs. The default
//! implementation, [`AlloyClient`], wraps an alloy HTTP provider with the
//! account's signer installed as the wallet filler.

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use meshwallet_core::NetworkConfig;
use meshwallet_error::{Result, RpcContext, WalletError};

/// RPC surface used by the EVM provider.
#[async_trait]
pub trait EvmClient: Send + Sync {
    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64>;

    /// `eth_getBalance` at the latest block
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// `eth_getCode` at the latest block
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    /// `eth_call`
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;

    /// `eth_estimateGas`
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64>;

    /// `eth_gasPrice`
    async fn gas_price(&self) -> Result<u128>;

    /// Fills, signs and broadcasts; returns once the node accepts the transaction
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256>;
}

/// Opens an [`EvmClient`] for a network and signer.
#[async_trait]
pub trait EvmConnector: Send + Sync {
    /// Connects to `network.rpc_url`
    async fn connect(
        &self,
        network: &NetworkConfig,
        signer: &PrivateKeySigner,
    ) -> Result<Arc<dyn EvmClient>>;
}

/// Default connector: alloy over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

#[async_trait]
impl EvmConnector for HttpConnector {
    async fn connect(
        &self,
        network: &NetworkConfig,
        signer: &PrivateKeySigner,
    ) -> Result<Arc<dyn EvmClient>> {
        let client = AlloyClient::new(&network.rpc_url, signer.clone())?;
        Ok(Arc::new(client))
    }
}

/// An [`EvmClient`] backed by an alloy provider.
#[derive(Clone)]
pub struct AlloyClient {
    provider: DynProvider,
}

impl AlloyClient {
    /// Builds a provider for `rpc_url` that signs with `signer`
    pub fn new(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|e| WalletError::Config(format!("Invalid URL {rpc_url}: {e}")))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        Ok(Self { provider })
    }
}

#[async_trait]
impl EvmClient for AlloyClient {
    async fn chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.rpc_context("eth_chainId")
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        tracing::debug!(%address, "eth_getBalance");
        self.provider
            .get_balance(address)
            .await
            .rpc_context("eth_getBalance")
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.provider
            .get_code_at(address)
            .await
            .rpc_context("eth_getCode")
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        self.provider.call(tx).await.rpc_context("eth_call")
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(tx)
            .await
            .rpc_context("eth_estimateGas")
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider.get_gas_price().await.rpc_context("eth_gasPrice")
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .rpc_context("eth_sendRawTransaction")?;
        Ok(*pending.tx_hash())
    }
}
