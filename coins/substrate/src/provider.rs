//! [`WalletProvider`] for Substrate networks.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use meshwallet_core::{
    BaseUnits, ChainFamily, FeePrecision, NetworkConfig, RuntimeProfile, SubstrateParams,
    TokenConfig, Zeroizing, NATIVE_TOKEN_ADDRESS,
};
use meshwallet_error::{Result, WalletError};
use meshwallet_traits::{
    DetailedBalance, FeeEstimate, PolkadotTransactionRequest, TokenInfo, TransactionRequest,
    TxHash, WalletProvider,
};

use crate::calls::{build_call, EncodedCall};
use crate::extrinsic::{extrinsic_hash, parse_hash, SigningParams};
use crate::keys::SubstrateKeys;
use crate::rpc::{ExtrinsicStatus, PaymentInfo, SubstrateClient, SubstrateConnector, QUERY_INFO};
use crate::storage::{asset_account_key, decode_asset_balance, system_account_key, AccountInfo};
use crate::ws::WsConnector;

struct Session {
    keys: SubstrateKeys,
    address: String,
    genesis_hash: [u8; 32],
    client: Arc<dyn SubstrateClient>,
}

/// Substrate provider bound to one network.
///
/// `send_transaction` does not return when the node accepts the
/// extrinsic, nor when a block includes it. It waits until the including
/// block is **finalized**, which typically takes several block times and
/// can take much longer when finality stalls. There is no built-in
/// timeout; callers that need one race the future themselves.
pub struct SubstrateWalletProvider {
    network: NetworkConfig,
    params: SubstrateParams,
    mnemonic: Zeroizing<String>,
    connector: Arc<dyn SubstrateConnector>,
    fee_precision: FeePrecision,
    session: Option<Session>,
}

impl SubstrateWalletProvider {
    /// Creates a disconnected provider using the WebSocket connector
    pub fn new(network: NetworkConfig, mnemonic: &str) -> Result<Self> {
        Self::with_connector(network, mnemonic, Arc::new(WsConnector))
    }

    /// Creates a disconnected provider with a custom connector
    pub fn with_connector(
        network: NetworkConfig,
        mnemonic: &str,
        connector: Arc<dyn SubstrateConnector>,
    ) -> Result<Self> {
        let params = network
            .substrate()
            .cloned()
            .ok_or_else(|| WalletError::Config(format!("{} is not a Substrate network", network.name)))?;
        Ok(Self {
            network,
            params,
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

    async fn account_info(&self, session: &Session) -> Result<AccountInfo> {
        let key = system_account_key(&session.keys.public());
        let raw = session.client.storage(&key).await?;
        AccountInfo::decode(raw.as_deref())
    }

    /// Total, locked and transferable native balance.
    ///
    /// `total = free + reserved`, `locked = reserved + frozen`, and
    /// `transferable = max(0, total - locked)`.
    pub async fn get_detailed_balance(&self) -> Result<DetailedBalance> {
        let session = self.session()?;
        let info = self.account_info(session).await?;
        Ok(DetailedBalance::from_parts(
            &info.total(),
            &info.locked(),
            self.network.decimals(),
        ))
    }

    /// Balance of an assets-pallet token, by decimal asset id.
    ///
    /// An unparseable id, a runtime without the assets pallet or an
    /// undecodable entry fails with `ContractProbeFailed`.
    async fn asset_balance(&self, session: &Session, asset: &str) -> Result<u128> {
        let probe_failed = |reason: String| WalletError::ContractProbeFailed {
            address: asset.to_string(),
            reason,
        };
        if self.params.runtime != RuntimeProfile::PolkadotAssetHub {
            return Err(probe_failed(format!("{} has no assets pallet", self.network.name)));
        }
        let asset_id: u32 = asset
            .trim()
            .parse()
            .map_err(|_| probe_failed("asset id must be a u32".into()))?;

        let key = asset_account_key(asset_id, &session.keys.public());
        let raw = session.client.storage(&key).await?;
        decode_asset_balance(raw.as_deref()).map_err(|e| probe_failed(e.to_string()))
    }

    async fn signing_params(&self, session: &Session) -> Result<SigningParams> {
        let nonce = session.client.account_next_index(&session.address).await?;
        let runtime = session.client.runtime_version().await?;
        Ok(SigningParams {
            nonce,
            tip: 0,
            runtime,
            genesis_hash: session.genesis_hash,
            profile: self.params.runtime,
        })
    }

    fn encode_call(&self, request: &PolkadotTransactionRequest) -> Result<EncodedCall> {
        build_call(&self.params, self.network.decimals(), request)
    }
}

#[async_trait]
impl WalletProvider for SubstrateWalletProvider {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let keys = SubstrateKeys::from_mnemonic(&self.mnemonic)?;
        let address = keys.address(self.params.ss58_format)?;
        let expected = parse_hash(&self.params.genesis_hash)?;

        let client = self.connector.connect(&self.network).await?;
        let actual = parse_hash(&client.genesis_hash().await?)?;
        if actual != expected {
            return Err(WalletError::Config(format!(
                "{} RPC reports genesis 0x{}, expected {}",
                self.network.name,
                hex::encode(actual),
                self.params.genesis_hash
            )));
        }

        tracing::info!(network = %self.network.name, %address, "connected Substrate provider");
        self.session = Some(Session {
            keys,
            address,
            genesis_hash: expected,
            client,
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.session.take().is_some() {
            tracing::info!(network = %self.network.name, "disconnected Substrate provider");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn family(&self) -> ChainFamily {
        ChainFamily::Substrate
    }

    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn get_address(&self) -> Result<String> {
        Ok(self.session()?.address.clone())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String> {
        let signature = self.session()?.keys.sign(message);
        Ok(format!("0x{}", hex::encode(signature)))
    }

    /// Free balance, which includes any frozen part
    async fn get_balance(&self) -> Result<String> {
        let session = self.session()?;
        Ok(self.account_info(session).await?.free.to_string())
    }

    async fn get_token_balance(&self, token_address: &str) -> Result<String> {
        if token_address.eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS) {
            return self.get_balance().await;
        }
        let session = self.session()?;
        Ok(self.asset_balance(session, token_address).await?.to_string())
    }

    async fn list_tokens(&self) -> Result<Vec<TokenInfo>> {
        let session = self.session()?;
        let info = self.account_info(session).await?;

        let currency = &self.network.native_currency;
        let native = TokenConfig::new(
            NATIVE_TOKEN_ADDRESS,
            &currency.name,
            &currency.symbol,
            currency.decimals,
        );
        let mut tokens = vec![TokenInfo::new(native, &BaseUnits::from(info.free))];

        for config in &self.network.tokens {
            let entry = match self.asset_balance(session, &config.address).await {
                Ok(balance) => TokenInfo::new(config.clone(), &BaseUnits::from(balance)),
                Err(e) => {
                    tracing::warn!(token = %config.symbol, error = %e, "token degraded to zero");
                    TokenInfo::degraded(config.clone())
                }
            };
            tokens.push(entry);
        }
        Ok(tokens)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash> {
        let req = request.as_polkadot()?;
        let session = self.session()?;
        let call = self.encode_call(req)?;
        let signing = self.signing_params(session).await?;

        let extrinsic = signing.sign(&call.bytes, &session.keys);
        let hash = extrinsic_hash(&extrinsic);
        tracing::info!(
            network = %self.network.name,
            call = %format!("{}.{}", call.module, call.function),
            nonce = signing.nonce,
            tx_hash = %hash,
            "submitting extrinsic"
        );

        let mut updates = session.client.submit_and_watch(&extrinsic).await?;
        while let Some(update) = updates.next().await {
            match update? {
                ExtrinsicStatus::Finalized(block) => {
                    tracing::info!(tx_hash = %hash, %block, "extrinsic finalized");
                    return Ok(TxHash::new(hash));
                }
                ExtrinsicStatus::InBlock(block) => {
                    tracing::debug!(tx_hash = %hash, %block, "extrinsic in block, awaiting finality");
                }
                ExtrinsicStatus::Retracted(block) => {
                    tracing::warn!(tx_hash = %hash, %block, "including block retracted");
                }
                status if status.is_terminal() => {
                    return Err(WalletError::ExtrinsicFailed(format!("{hash}: {status:?}")));
                }
                status => tracing::debug!(tx_hash = %hash, ?status, "extrinsic status"),
            }
        }
        Err(WalletError::ExtrinsicFailed(format!(
            "{hash}: status stream ended before finalization"
        )))
    }

    async fn estimate_fee(&self, request: &TransactionRequest) -> Result<FeeEstimate> {
        let req = request.as_polkadot()?;
        let session = self.session()?;
        let call = self.encode_call(req)?;
        let signing = self.signing_params(session).await?;

        let extrinsic = signing.fake_signed(&call.bytes, &session.keys.public());
        let raw = session
            .client
            .state_call(QUERY_INFO, &PaymentInfo::request(&extrinsic))
            .await?;
        let info = PaymentInfo::decode(&raw)?;
        tracing::debug!(
            partial_fee = info.partial_fee,
            ref_time = info.ref_time,
            "estimated Substrate fee"
        );
        Ok(FeeEstimate::new(
            &BaseUnits::from(info.partial_fee),
            &self.network,
            self.fee_precision,
        ))
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

impl std::fmt::Debug for SubstrateWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstrateWalletProvider")
            .field("network", &self.network.name)
            .field("connected", &self.is_connected())
            .finish()
    }
}
