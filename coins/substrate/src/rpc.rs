//! The node RPC surface the provider depends on.
//!
//! [`SubstrateClient`] is the seam between the provider and the transport;
//! [`WsClient`](crate::ws::WsClient) is the production implementation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use meshwallet_core::NetworkConfig;
use meshwallet_error::{Result, WalletError};
use serde_json::Value;

use crate::extrinsic::RuntimeVersion;
use crate::scale::Decoder;

/// Runtime API used for fee estimation
pub const QUERY_INFO: &str = "TransactionPaymentApi_query_info";

/// Status updates of a watched extrinsic
pub type StatusStream = BoxStream<'static, Result<ExtrinsicStatus>>;

/// Lifecycle of a submitted extrinsic as reported by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtrinsicStatus {
    /// Waiting on an earlier nonce
    Future,
    /// In the ready queue
    Ready,
    /// Gossiped to the listed peers
    Broadcast(Vec<String>),
    /// Included in a block that is not yet final
    InBlock(String),
    /// The including block left the best chain
    Retracted(String),
    /// Finality stalled for too long after inclusion
    FinalityTimeout(String),
    /// Included in a finalized block
    Finalized(String),
    /// Replaced by another extrinsic with the same nonce
    Usurped(String),
    /// Dropped from the pool
    Dropped,
    /// Rejected as invalid
    Invalid,
}

impl ExtrinsicStatus {
    /// Parses an `author_extrinsicUpdate` notification result
    pub fn from_json(value: &Value) -> Result<Self> {
        let hash = |v: &Value| v.as_str().map(str::to_string);
        let status = match value {
            Value::String(s) => match s.as_str() {
                "future" => Some(Self::Future),
                "ready" => Some(Self::Ready),
                "dropped" => Some(Self::Dropped),
                "invalid" => Some(Self::Invalid),
                _ => None,
            },
            Value::Object(map) if map.len() == 1 => {
                map.iter().next().and_then(|(key, inner)| match key.as_str() {
                    "broadcast" => inner.as_array().map(|peers| {
                        Self::Broadcast(peers.iter().filter_map(hash).collect())
                    }),
                    "inBlock" => hash(inner).map(Self::InBlock),
                    "retracted" => hash(inner).map(Self::Retracted),
                    "finalityTimeout" => hash(inner).map(Self::FinalityTimeout),
                    "finalized" => hash(inner).map(Self::Finalized),
                    "usurped" => hash(inner).map(Self::Usurped),
                    _ => None,
                })
            }
            _ => None,
        };
        status.ok_or_else(|| WalletError::Encoding(format!("unknown extrinsic status {value}")))
    }

    /// True once no further updates will follow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::FinalityTimeout(_)
                | Self::Finalized(_)
                | Self::Usurped(_)
                | Self::Dropped
                | Self::Invalid
        )
    }
}

/// Connected node
#[async_trait]
pub trait SubstrateClient: Send + Sync {
    /// `chain_getBlockHash(0)`
    async fn genesis_hash(&self) -> Result<String>;

    /// `state_getRuntimeVersion`
    async fn runtime_version(&self) -> Result<RuntimeVersion>;

    /// `system_accountNextIndex`, counting pool transactions
    async fn account_next_index(&self, address: &str) -> Result<u64>;

    /// `state_getStorage`; `None` when the key has no value
    async fn storage(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// `state_call` of a runtime API
    async fn state_call(&self, method: &str, data: &[u8]) -> Result<Vec<u8>>;

    /// `author_submitAndWatchExtrinsic`
    async fn submit_and_watch(&self, extrinsic: &[u8]) -> Result<StatusStream>;
}

/// Opens a [`SubstrateClient`] for a network
#[async_trait]
pub trait SubstrateConnector: Send + Sync {
    /// Connects to the network's RPC endpoint
    async fn connect(&self, network: &NetworkConfig) -> Result<Arc<dyn SubstrateClient>>;
}

/// Decoded `RuntimeDispatchInfo`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentInfo {
    /// Computation weight
    pub ref_time: u64,
    /// Proof size weight
    pub proof_size: u64,
    /// Dispatch class index
    pub class: u8,
    /// Fee excluding tip
    pub partial_fee: u128,
}

impl PaymentInfo {
    /// `state_call` input for [`QUERY_INFO`]: the extrinsic and its length
    pub fn request(extrinsic: &[u8]) -> Vec<u8> {
        let mut data = extrinsic.to_vec();
        data.extend_from_slice(&(extrinsic.len() as u32).to_le_bytes());
        data
    }

    /// Decodes the runtime API response
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let mut input = Decoder::new(raw);
        let ref_time = compact_u64(&mut input)?;
        let proof_size = compact_u64(&mut input)?;
        let class = input.u8()?;
        let partial_fee = input.u128()?;
        Ok(Self {
            ref_time,
            proof_size,
            class,
            partial_fee,
        })
    }
}

fn compact_u64(input: &mut Decoder<'_>) -> Result<u64> {
    let value = input.compact()?;
    u64::try_from(value).map_err(|_| WalletError::Encoding(format!("weight {value} exceeds u64")))
}
