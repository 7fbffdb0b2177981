//! # meshwallet Substrate Provider
//!
//! [`SubstrateWalletProvider`] implements
//! [`WalletProvider`](meshwallet_traits::WalletProvider) for Polkadot,
//! Kusama, Westend and Polkadot Asset Hub.
//!
//! - sr25519 keys from the mnemonic (substrate-bip39 seed)
//! - SS58 addresses; the same key has a different address per network
//! - a closed registry of buildable calls instead of dynamic metadata
//! - WebSocket JSON-RPC, with submissions watched until finalization
//!
//! ```no_run
//! use meshwallet_core::NetworkRegistry;
//! use meshwallet_substrate::prelude::*;
//!
//! # async fn run() -> meshwallet_error::Result<()> {
//! let registry = NetworkRegistry::builtin();
//! let network = registry.lookup("westend")?.clone();
//! let mut provider = SubstrateWalletProvider::new(
//!     network,
//!     "bottom drive obey lake curtain smoke basket hold race lonely fit walk",
//! )?;
//! provider.connect().await?;
//! let detailed = provider.get_detailed_balance().await?;
//! println!("{} transferable", detailed.formatted.transferable);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod calls;
pub mod extrinsic;
pub mod keys;
pub mod provider;
pub mod rpc;
pub mod scale;
pub mod ss58;
pub mod storage;
pub mod ws;

pub use calls::{build_call, ArgKind, EncodedCall};
pub use extrinsic::{RuntimeVersion, SigningParams};
pub use keys::{verify, SubstrateKeys};
pub use provider::SubstrateWalletProvider;
pub use rpc::{ExtrinsicStatus, PaymentInfo, StatusStream, SubstrateClient, SubstrateConnector};
pub use ss58::is_valid_address;
pub use ws::{WsClient, WsConnector};

/// Glob import of the common Substrate types
pub mod prelude {
    pub use crate::{
        ExtrinsicStatus, SubstrateClient, SubstrateConnector, SubstrateKeys,
        SubstrateWalletProvider, WsConnector,
    };
    pub use meshwallet_traits::prelude::*;
}
