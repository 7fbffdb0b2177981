//! [`WalletProvider`] for EVM networks.

use std::sync::Arc;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use meshwallet_core::{
    parse_base_units, BaseUnits, ChainFamily, FeePrecision, NetworkConfig, TokenConfig,
    Zeroizing, NATIVE_TOKEN_ADDRESS,
};
use meshwallet_error::{Result, WalletError};
use meshwallet_traits::{
    EvmTransactionRequest, FeeEstimate, TokenInfo, TransactionRequest as WalletRequest, TxHash,
    WalletProvider,
};

use crate::client::{EvmClient, EvmConnector, HttpConnector};
use crate::erc20;
use crate::keys::{parse_address, EvmKeys};
use crate::units::{from_u256, parse_wei, to_u256};

struct Session {
    keys: EvmKeys,
    client: Arc<dyn EvmClient>,
}

/// EVM provider bound to one network.
///
/// `send_transaction` resolves once the node accepts the signed
/// transaction; it does not wait for inclusion.
pub struct EvmWalletProvider {
    network: NetworkConfig,
    mnemonic: Zeroizing<String>,
    connector: Arc<dyn EvmConnector>,
    fee_precision: FeePrecision,
    session: Option<Session>,
}

impl EvmWalletProvider {
    /// Creates a disconnected provider using the default HTTP connector
    pub fn new(network: NetworkConfig, mnemonic: &str) -> Result<Self> {
        Self::with_connector(network, mnemonic, Arc::new(HttpConnector))
    }

    /// Creates a disconnected provider with a custom connector
    pub fn with_connector(
        network: NetworkConfig,
        mnemonic: &str,
        connector: Arc<dyn EvmConnector>,
    ) -> Result<Self> {
        if network.family() != ChainFamily::Evm {
            return Err(WalletError::Config(format!(
                "{} is not an EVM network",
                network.name
            )));
        }
        Ok(Self {
            network,
            mnemonic: Zeroizing::new(mnemonic.to_string()),
            connector,
            fee_precision: FeePrecision::default(),
            session: None,
        })
    }

    /// Overrides the fee display precision window
    pub fn with_fee_precision(mut self, precision: FeePrecision) -> Self {
        self.fee_precision = precision;
        self
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(WalletError::NotConnected)
    }

    /// Builds an ERC-20 `transfer` request for a human decimal amount
    pub fn token_transfer_request(
        &self,
        token: &TokenConfig,
        to: &str,
        amount: &str,
    ) -> Result<EvmTransactionRequest> {
        let recipient = parse_address(to)?;
        let units = parse_base_units(Some(amount), u32::from(token.decimals))?;
        let data = erc20::transfer_calldata(recipient, to_u256(&units)?);
        Ok(EvmTransactionRequest {
            to: token.address.clone(),
            value: "0".into(),
            data: Some(format!("0x{}", hex::encode(&data))),
            ..Default::default()
        })
    }

    fn build_tx(&self, from: Address, req: &EvmTransactionRequest) -> Result<TransactionRequest> {
        let to = parse_address(&req.to)?;
        let value = parse_base_units(Some(&req.value), self.network.decimals())?;

        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(to_u256(&value)?);
        if let Some(chain_id) = self.network.evm_chain_id() {
            tx = tx.with_chain_id(chain_id);
        }
        if let Some(data) = &req.data {
            let raw = hex::decode(data.strip_prefix("0x").unwrap_or(data))?;
            tx = tx.with_input(Bytes::from(raw));
        }
        if let Some(gas) = req.gas_limit {
            tx = tx.with_gas_limit(gas);
        }
        if let Some(price) = &req.gas_price {
            tx = tx.with_gas_price(parse_wei("gasPrice", price)?);
        }
        if let Some(max_fee) = &req.max_fee_per_gas {
            tx = tx.with_max_fee_per_gas(parse_wei("maxFeePerGas", max_fee)?);
        }
        if let Some(tip) = &req.max_priority_fee_per_gas {
            tx = tx.with_max_priority_fee_per_gas(parse_wei("maxPriorityFeePerGas", tip)?);
        }
        if let Some(nonce) = req.nonce {
            tx = tx.with_nonce(nonce);
        }
        Ok(tx)
    }

    async fn token_balance(&self, session: &Session, token: Address) -> Result<(U256, u8)> {
        let client = session.client.as_ref();
        let metadata = erc20::probe(client, token).await?;
        let balance = erc20::balance_of(client, token, session.keys.address()).await?;
        Ok((balance, metadata.decimals))
    }
}

#[async_trait]
impl WalletProvider for EvmWalletProvider {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let keys = EvmKeys::from_mnemonic(&self.mnemonic)?;
        let client = self.connector.connect(&self.network, keys.signer()).await?;

        if let Some(expected) = self.network.evm_chain_id() {
            let actual = client.chain_id().await?;
            if actual != expected {
                return Err(WalletError::Config(format!(
                    "{} RPC reports chain id {actual}, expected {expected}",
                    self.network.name
                )));
            }
        }

        tracing::info!(
            network = %self.network.name,
            address = %keys.address_string(),
            "connected EVM provider"
        );
        self.session = Some(Session { keys, client });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.session.take().is_some() {
            tracing::info!(network = %self.network.name, "disconnected EVM provider");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn get_address(&self) -> Result<String> {
        Ok(self.session()?.keys.address_string())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String> {
        self.session()?.keys.sign_message(message).await
    }

    async fn get_balance(&self) -> Result<String> {
        let session = self.session()?;
        let balance = session.client.get_balance(session.keys.address()).await?;
        Ok(balance.to_string())
    }

    async fn get_token_balance(&self, token_address: &str) -> Result<String> {
        if token_address.eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS) {
            return self.get_balance().await;
        }
        let session = self.session()?;
        let token = parse_address(token_address)?;
        let (balance, _) = self.token_balance(session, token).await?;
        Ok(balance.to_string())
    }

    async fn list_tokens(&self) -> Result<Vec<TokenInfo>> {
        let session = self.session()?;
        let native_balance = session.client.get_balance(session.keys.address()).await?;

        let currency = &self.network.native_currency;
        let native = TokenConfig::new(
            NATIVE_TOKEN_ADDRESS,
            &currency.name,
            &currency.symbol,
            currency.decimals,
        );
        let mut tokens = vec![TokenInfo::new(native, &from_u256(native_balance))];

        for config in &self.network.tokens {
            let entry = match parse_address(&config.address) {
                Ok(token) => match self.token_balance(session, token).await {
                    Ok((balance, decimals)) => {
                        let mut config = config.clone();
                        if config.decimals != decimals {
                            tracing::debug!(
                                token = %config.symbol,
                                configured = config.decimals,
                                onchain = decimals,
                                "using on-chain token decimals"
                            );
                            config.decimals = decimals;
                        }
                        TokenInfo::new(config, &from_u256(balance))
                    }
                    // one unreadable token never hides the others
                    Err(e) => {
                        tracing::warn!(token = %config.symbol, error = %e, "token degraded to zero");
                        TokenInfo::degraded(config.clone())
                    }
                },
                Err(e) => {
                    tracing::warn!(token = %config.symbol, error = %e, "token degraded to zero");
                    TokenInfo::degraded(config.clone())
                }
            };
            tokens.push(entry);
        }
        Ok(tokens)
    }

    async fn send_transaction(&self, request: &WalletRequest) -> Result<TxHash> {
        let req = request.as_evm()?;
        let session = self.session()?;
        let tx = self.build_tx(session.keys.address(), req)?;

        let hash = session.client.send_transaction(tx).await?;
        let hash = TxHash::new(format!("0x{}", hex::encode(hash)));
        tracing::info!(network = %self.network.name, tx_hash = %hash, "transaction submitted");
        Ok(hash)
    }

    async fn estimate_fee(&self, request: &WalletRequest) -> Result<FeeEstimate> {
        let req = request.as_evm()?;
        let session = self.session()?;
        let tx = self.build_tx(session.keys.address(), req)?;

        let gas_limit = match req.gas_limit {
            Some(gas) => gas,
            None => session.client.estimate_gas(tx).await?,
        };
        let gas_price = match (&req.max_fee_per_gas, &req.gas_price) {
            (Some(max_fee), _) => parse_wei("maxFeePerGas", max_fee)?,
            (None, Some(price)) => parse_wei("gasPrice", price)?,
            (None, None) => session.client.gas_price().await?,
        };

        let fee = BaseUnits::from(gas_limit).mul(&BaseUnits::from(gas_price));
        tracing::debug!(gas_limit, gas_price, fee = %fee, "estimated EVM fee");
        Ok(FeeEstimate::new(&fee, &self.network, self.fee_precision))
    }

    fn export_public_key(&self) -> Result<String> {
        Ok(self.session()?.keys.public_key_hex())
    }

    fn export_private_key(&self) -> Result<Zeroizing<String>> {
        let session = self.session()?;
        tracing::warn!(network = %self.network.name, "private key exported on request");
        Ok(session.keys.private_key_hex())
    }
}

impl std::fmt::Debug for EvmWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWalletProvider")
            .field("network", &self.network.name)
            .field("connected", &self.is_connected())
            .finish()
    }
}
