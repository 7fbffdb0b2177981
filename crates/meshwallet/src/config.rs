//! SDK configuration
//!
//! Loaded from a JSON file, then overridden by `MESHWALLET_RPC_<KEY>`
//! environment variables (a `.env` file is honoured).
//!
//! ```json
//! {
//!   "rpcOverrides": { "1": "https://eth.example.org", "westend": "ws://127.0.0.1:9944" },
//!   "extraNetworks": [],
//!   "feePrecision": { "ceiling": 12, "floor": 2 }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use meshwallet_core::{FeePrecision, NetworkConfig, NetworkRegistry};
use meshwallet_error::{Result, WalletError};
use serde::{Deserialize, Serialize};

/// Prefix of the RPC override variables, e.g. `MESHWALLET_RPC_1`
pub const RPC_ENV_PREFIX: &str = "MESHWALLET_RPC_";

/// Settings applied on top of the builtin network table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SdkConfig {
    /// Chain key (id or name) to RPC URL
    pub rpc_overrides: BTreeMap<String, String>,
    /// Networks added to (or replacing) builtin entries
    pub extra_networks: Vec<NetworkConfig>,
    /// Fee display precision window
    pub fee_precision: FeePrecision,
}

impl SdkConfig {
    /// Parses a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WalletError::Config(format!("invalid SDK config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Defaults plus overrides from the process environment and `.env`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `MESHWALLET_RPC_<KEY>` variables from the process
    /// environment, loading `.env` first if present
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        self.apply_env(std::env::vars());
        self
    }

    /// Applies RPC overrides from `(name, value)` pairs.
    ///
    /// `MESHWALLET_RPC_POLKADOT_ASSET_HUB` maps to the key
    /// `polkadot-asset-hub`; variables without the prefix are ignored.
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(suffix) = name.strip_prefix(RPC_ENV_PREFIX) else {
                continue;
            };
            if suffix.is_empty() || value.trim().is_empty() {
                continue;
            }
            let key = suffix.to_lowercase().replace('_', "-");
            tracing::debug!(chain = %key, "RPC override from environment");
            self.rpc_overrides.insert(key, value.trim().to_string());
        }
    }

    fn validate(&self) -> Result<()> {
        let FeePrecision { ceiling, floor } = self.fee_precision;
        if floor > ceiling {
            return Err(WalletError::Config(format!(
                "fee precision floor {floor} is above ceiling {ceiling}"
            )));
        }
        Ok(())
    }

    /// Builtin table plus extra networks, with RPC overrides applied
    pub fn build_registry(&self) -> Result<NetworkRegistry> {
        self.validate()?;
        let mut registry = NetworkRegistry::builtin();
        for network in &self.extra_networks {
            registry.register(network.clone())?;
        }
        for (key, url) in &self.rpc_overrides {
            registry.set_rpc_url(key.as_str(), url)?;
        }
        Ok(registry)
    }
}
