//! EVM provider tests against an in-memory chain
//!
//! Tests cover:
//! - Connection lifecycle and NotConnected guards
//! - Token listing with an undeployed token contract
//! - Fee estimation and request shape checks
//! - Transaction building

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest as RpcTransaction;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use meshwallet_core::{NetworkConfig, NetworkRegistry, TokenConfig, NATIVE_TOKEN_ADDRESS};
use meshwallet_error::{Result, WalletError};
use meshwallet_evm::erc20::IERC20;
use meshwallet_evm::prelude::*;
use meshwallet_testing::{EdgeCaseMnemonics, KnownVectors};

const GOOD_TOKEN: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
const GHOST_TOKEN: &str = "0x00000000000000000000000000000000DeaDBeef";
/// Deployed, answers metadata calls, reverts on `balanceOf`
const HALF_TOKEN: &str = "0x000000000000000000000000000000000000a1f0";

// ============================================================================
// Fake Chain
// ============================================================================

#[derive(Default)]
struct FakeChain {
    chain_id: u64,
    native: U256,
    code: HashMap<Address, Bytes>,
    token_balances: HashMap<Address, U256>,
    gas_estimate: u64,
    gas_price: u128,
    sent: Mutex<Vec<RpcTransaction>>,
}

impl FakeChain {
    fn new(chain_id: u64) -> Self {
        let good: Address = GOOD_TOKEN.parse().unwrap();
        let mut code = HashMap::new();
        code.insert(good, Bytes::from_static(&[0x60, 0x80]));
        code.insert(HALF_TOKEN.parse().unwrap(), Bytes::from_static(&[0x60, 0x80]));
        let mut token_balances = HashMap::new();
        token_balances.insert(good, U256::from(2_500_000u64));
        Self {
            chain_id,
            native: U256::from(1_500_000_000_000_000_000u128),
            code,
            token_balances,
            gas_estimate: 21_000,
            gas_price: 20_000_000_000,
            ..Default::default()
        }
    }
}

#[async_trait]
impl EvmClient for FakeChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn get_balance(&self, _address: Address) -> Result<U256> {
        Ok(self.native)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn call(&self, tx: RpcTransaction) -> Result<Bytes> {
        let to = tx.to.and_then(|kind| kind.to().copied()).unwrap_or_default();
        if !self.code.contains_key(&to) {
            return Ok(Bytes::new());
        }
        let input = tx.input.input().cloned().unwrap_or_default();
        let encoded = match input.get(..4) {
            Some(s) if s == IERC20::symbolCall::SELECTOR => "USDC".to_string().abi_encode(),
            Some(s) if s == IERC20::decimalsCall::SELECTOR => U256::from(6u8).abi_encode(),
            Some(s) if s == IERC20::balanceOfCall::SELECTOR && self.token_balances.contains_key(&to) => {
                self.token_balances[&to].abi_encode()
            }
            _ => {
                return Err(WalletError::Rpc {
                    context: "eth_call".into(),
                    message: "execution reverted".into(),
                })
            }
        };
        Ok(Bytes::from(encoded))
    }

    async fn estimate_gas(&self, _tx: RpcTransaction) -> Result<u64> {
        Ok(self.gas_estimate)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.gas_price)
    }

    async fn send_transaction(&self, tx: RpcTransaction) -> Result<B256> {
        self.sent.lock().unwrap().push(tx);
        Ok(B256::repeat_byte(0xab))
    }
}

struct FakeConnector {
    chain: Arc<FakeChain>,
}

#[async_trait]
impl EvmConnector for FakeConnector {
    async fn connect(
        &self,
        _network: &NetworkConfig,
        _signer: &PrivateKeySigner,
    ) -> Result<Arc<dyn EvmClient>> {
        Ok(self.chain.clone())
    }
}

fn network_with_tokens(chain_id: u64) -> NetworkConfig {
    let mut network = NetworkRegistry::builtin().lookup(chain_id).unwrap().clone();
    network.tokens = vec![
        TokenConfig::new(GOOD_TOKEN, "USD Coin", "USDC", 6),
        TokenConfig::new(GHOST_TOKEN, "Ghost", "GHST", 18),
    ];
    network
}

async fn connected(chain_id: u64) -> (EvmWalletProvider, Arc<FakeChain>) {
    connected_to(network_with_tokens(chain_id)).await
}

async fn connected_to(network: NetworkConfig) -> (EvmWalletProvider, Arc<FakeChain>) {
    let chain_id = network.evm_chain_id().unwrap();
    let chain = Arc::new(FakeChain::new(chain_id));
    let connector = Arc::new(FakeConnector { chain: chain.clone() });
    let mut provider = EvmWalletProvider::with_connector(
        network,
        EdgeCaseMnemonics::STANDARD_12,
        connector,
    )
    .unwrap();
    provider.connect().await.unwrap();
    (provider, chain)
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_not_connected_guards() {
        let chain = Arc::new(FakeChain::new(1));
        let provider = EvmWalletProvider::with_connector(
            network_with_tokens(1),
            EdgeCaseMnemonics::STANDARD_12,
            Arc::new(FakeConnector { chain }),
        )
        .unwrap();

        assert_eq!(provider.get_address(), Err(WalletError::NotConnected));
        assert_eq!(provider.sign_message(b"hi").await, Err(WalletError::NotConnected));
        assert_eq!(provider.get_balance().await, Err(WalletError::NotConnected));
        assert_eq!(provider.list_tokens().await, Err(WalletError::NotConnected));
        assert!(provider.export_private_key().is_err());
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_and_disconnect_clears() {
        let (mut provider, _) = connected(1).await;
        provider.connect().await.unwrap();
        assert!(provider.is_connected());
        assert_eq!(provider.get_address().unwrap(), KnownVectors::STANDARD_12_ETH);

        provider.disconnect().await.unwrap();
        assert!(!provider.is_connected());
        assert_eq!(provider.get_address(), Err(WalletError::NotConnected));
        // Second disconnect is a no-op
        provider.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_same_address_on_every_evm_network() {
        let (mainnet, _) = connected(1).await;
        let (polygon, _) = connected(137).await;
        let (base, _) = connected(8453).await;
        assert_eq!(mainnet.get_address().unwrap(), polygon.get_address().unwrap());
        assert_eq!(mainnet.get_address().unwrap(), base.get_address().unwrap());
    }

    #[tokio::test]
    async fn test_chain_id_mismatch_rejected() {
        let chain = Arc::new(FakeChain::new(5));
        let mut provider = EvmWalletProvider::with_connector(
            network_with_tokens(1),
            EdgeCaseMnemonics::STANDARD_12,
            Arc::new(FakeConnector { chain }),
        )
        .unwrap();
        assert!(matches!(provider.connect().await, Err(WalletError::Config(_))));
        assert!(!provider.is_connected());
    }

    #[test]
    fn test_substrate_network_rejected() {
        let westend = NetworkRegistry::builtin().lookup("westend").unwrap().clone();
        assert!(EvmWalletProvider::new(westend, EdgeCaseMnemonics::STANDARD_12).is_err());
    }
}

// ============================================================================
// Balances and Tokens
// ============================================================================

mod token_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_tokens_degrades_missing_contract() {
        let (provider, _) = connected(1).await;
        let tokens = provider.list_tokens().await.unwrap();
        assert_eq!(tokens.len(), 3);

        assert_eq!(tokens[0].token.address, NATIVE_TOKEN_ADDRESS);
        assert_eq!(tokens[0].token.symbol, "ETH");
        assert_eq!(tokens[0].balance, "1500000000000000000");
        assert_eq!(tokens[0].formatted, "1.5");

        assert_eq!(tokens[1].token.symbol, "USDC");
        assert_eq!(tokens[1].balance, "2500000");
        assert_eq!(tokens[1].formatted, "2.5");

        assert_eq!(tokens[2].token.symbol, "GHST");
        assert_eq!(tokens[2].token.address, GHOST_TOKEN);
        assert_eq!(tokens[2].balance, "0");
        assert_eq!(tokens[2].formatted, "0.0");
    }

    #[tokio::test]
    async fn test_list_tokens_degrades_reverting_balance_of() {
        let mut network = network_with_tokens(1);
        network.tokens.insert(0, TokenConfig::new(HALF_TOKEN, "Half", "HALF", 6));
        let (provider, _) = connected_to(network).await;

        let tokens = provider.list_tokens().await.unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].formatted, "1.5");

        assert_eq!(tokens[1].token.symbol, "HALF");
        assert_eq!(tokens[1].balance, "0");
        assert_eq!(tokens[1].formatted, "0.0");

        // later entries are still read
        assert_eq!(tokens[2].balance, "2500000");
        assert_eq!(tokens[3].balance, "0");

        // a direct query still reports the failure
        assert!(provider.get_token_balance(HALF_TOKEN).await.is_err());
    }

    #[tokio::test]
    async fn test_token_balance_native_alias() {
        let (provider, _) = connected(1).await;
        assert_eq!(
            provider.get_token_balance(NATIVE_TOKEN_ADDRESS).await.unwrap(),
            provider.get_balance().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_token_balance_propagates_probe_failure() {
        let (provider, _) = connected(1).await;
        assert!(matches!(
            provider.get_token_balance(GHOST_TOKEN).await,
            Err(WalletError::ContractProbeFailed { .. })
        ));
        assert_eq!(provider.get_token_balance(GOOD_TOKEN).await.unwrap(), "2500000");
    }
}

// ============================================================================
// Fees and Sending
// ============================================================================

mod transaction_tests {
    use super::*;

    #[tokio::test]
    async fn test_estimate_fee_uses_estimate_and_gas_price() {
        let (provider, _) = connected(1).await;
        let req = TransactionRequest::from(EvmTransactionRequest::transfer(
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",
            "0.1",
        ));
        let fee = provider.estimate_fee(&req).await.unwrap();
        assert_eq!(fee.fee, "420000000000000");
        assert_eq!(fee.formatted, "0.00042");
        assert_eq!(fee.currency, "ETH");
    }

    #[tokio::test]
    async fn test_estimate_fee_honours_request_overrides() {
        let (provider, _) = connected(1).await;
        let req = EvmTransactionRequest {
            gas_limit: Some(50_000),
            max_fee_per_gas: Some("1000000000".into()),
            ..EvmTransactionRequest::transfer("0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9", "0")
        };
        let fee = provider.estimate_fee(&req.into()).await.unwrap();
        assert_eq!(fee.fee, "50000000000000");
    }

    #[tokio::test]
    async fn test_rejects_substrate_request() {
        let (provider, chain) = connected(1).await;
        let req = TransactionRequest::from(PolkadotTransactionRequest::new(
            "balances",
            "transfer",
            vec![],
        ));
        assert!(matches!(
            provider.send_transaction(&req).await,
            Err(WalletError::UnsupportedTransactionVariant { .. })
        ));
        assert!(matches!(
            provider.estimate_fee(&req).await,
            Err(WalletError::UnsupportedTransactionVariant { .. })
        ));
        assert!(chain.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_builds_value_in_wei() {
        let (provider, chain) = connected(1).await;
        let req = TransactionRequest::from(EvmTransactionRequest::transfer(
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",
            "0.1",
        ));
        let hash = provider.send_transaction(&req).await.unwrap();
        assert_eq!(hash.as_str(), format!("0x{}", "ab".repeat(32)));

        let sent = chain.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value, Some(U256::from(100_000_000_000_000_000u128)));
        assert_eq!(sent[0].chain_id, Some(1));
    }

    #[tokio::test]
    async fn test_send_rejects_bad_amount_and_address() {
        let (provider, chain) = connected(1).await;
        let bad_amount = EvmTransactionRequest::transfer(
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",
            "1e18",
        );
        assert!(matches!(
            provider.send_transaction(&bad_amount.into()).await,
            Err(WalletError::InvalidAmount(_))
        ));
        let bad_address = EvmTransactionRequest::transfer("0x1234", "1");
        assert!(matches!(
            provider.send_transaction(&bad_address.into()).await,
            Err(WalletError::InvalidAddress { .. })
        ));
        assert!(chain.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_token_transfer_request() {
        let (provider, _) = connected(1).await;
        let usdc = TokenConfig::new(GOOD_TOKEN, "USD Coin", "USDC", 6);
        let req = provider
            .token_transfer_request(&usdc, "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9", "12.5")
            .unwrap();
        assert_eq!(req.to, GOOD_TOKEN);
        assert_eq!(req.value, "0");
        let data = req.data.unwrap();
        assert!(data.starts_with("0xa9059cbb"));
        assert!(data.ends_with(&format!("{:064x}", 12_500_000u64)));
    }

    #[tokio::test]
    async fn test_signature_verifies() {
        let (provider, _) = connected(1).await;
        let signature = provider.sign_message(b"login").await.unwrap();
        let address = provider.get_address().unwrap();
        assert!(meshwallet_evm::verify_message(b"login", &signature, &address).unwrap());
    }
}
