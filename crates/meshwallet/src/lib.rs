//! # meshwallet - Multi-Chain Wallet Core
//!
//! One mnemonic, one session, Substrate and EVM networks behind the same
//! [`WalletProvider`](meshwallet_traits::WalletProvider) capability trait.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `evm` | Ethereum and EVM-compatible networks (default) |
//! | `substrate` | Polkadot, Kusama, Westend, Asset Hub (default) |
//!
//! ## Example
//!
//! ```no_run
//! use meshwallet::prelude::*;
//!
//! # async fn run() -> meshwallet::Result<()> {
//! let mut sdk = WalletSdk::builder(
//!     "bottom drive obey lake curtain smoke basket hold race lonely fit walk",
//! )
//! .config(SdkConfig::from_env())
//! .build()?;
//!
//! sdk.connect("westend").await?;
//! let state = sdk.get_wallet_state().await?;
//! println!("{} holds {} WND", state.address, state.balances.native.formatted);
//!
//! sdk.switch_network(1u64).await?;
//! println!("same mnemonic on Ethereum: {}", sdk.get_address()?);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod sdk;

pub use config::{SdkConfig, RPC_ENV_PREFIX};
pub use sdk::{ActiveProvider, WalletSdk, WalletSdkBuilder};

pub use meshwallet_core as core;
pub use meshwallet_error::{ErrorCode, Result, WalletError};
pub use meshwallet_traits as traits;

/// EVM provider family
#[cfg(feature = "evm")]
#[cfg_attr(docsrs, doc(cfg(feature = "evm")))]
pub mod evm {
    pub use meshwallet_evm::*;
}

/// Substrate provider family
#[cfg(feature = "substrate")]
#[cfg_attr(docsrs, doc(cfg(feature = "substrate")))]
pub mod substrate {
    pub use meshwallet_substrate::*;
}

/// Prelude module for convenient imports
///
/// ```ignore
/// use meshwallet::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{SdkConfig, WalletSdk};
    pub use meshwallet_core::{
        format_balance, format_fee, parse_amount, ChainFamily, ChainId, FeePrecision,
        FormatOptions, NetworkConfig, NetworkRegistry, Zeroizing,
    };
    pub use meshwallet_traits::prelude::*;
}

/// Returns the meshwallet version
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Provider families compiled into this build
pub fn enabled_families() -> Vec<meshwallet_core::ChainFamily> {
    #[allow(unused_mut)]
    let mut families = Vec::new();

    #[cfg(feature = "substrate")]
    families.push(meshwallet_core::ChainFamily::Substrate);

    #[cfg(feature = "evm")]
    families.push(meshwallet_core::ChainFamily::Evm);

    families
}
