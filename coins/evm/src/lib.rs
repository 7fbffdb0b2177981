//! # meshwallet EVM Provider
//!
//! [`EvmWalletProvider`] implements [`WalletProvider`](meshwallet_traits::WalletProvider)
//! for Ethereum and EVM-compatible networks using the
//! [alloy](https://github.com/alloy-rs/alloy) framework.
//!
//! Keys are derived from the mnemonic at `m/44'/60'/0'/0/0`, so one mnemonic
//! has the same address on every EVM network.
//!
//! ```no_run
//! use meshwallet_core::NetworkRegistry;
//! use meshwallet_evm::prelude::*;
//!
//! # async fn run() -> meshwallet_error::Result<()> {
//! let registry = NetworkRegistry::builtin();
//! let network = registry.lookup(1u64)?.clone();
//! let mut provider = EvmWalletProvider::new(
//!     network,
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
//! )?;
//! provider.connect().await?;
//! for token in provider.list_tokens().await? {
//!     println!("{} {}", token.formatted, token.token.symbol);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod erc20;
pub mod keys;
pub mod provider;
mod units;

pub use client::{AlloyClient, EvmClient, EvmConnector, HttpConnector};
pub use erc20::TokenMetadata;
pub use keys::{is_valid_address, verify_message, EvmKeys, ETH_DERIVATION_PREFIX};
pub use provider::EvmWalletProvider;
pub use units::{from_u256, to_u256};

/// Glob import of the common EVM types
pub mod prelude {
    pub use crate::{EvmClient, EvmConnector, EvmKeys, EvmWalletProvider, HttpConnector};
    pub use alloy::primitives::{Address, B256, U256};
    pub use meshwallet_traits::prelude::*;
}
