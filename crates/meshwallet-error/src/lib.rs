//! # meshwallet Error
//!
//! Unified error types for the meshwallet core. Every crate in the workspace
//! returns [`WalletError`] so a host application handles one taxonomy no
//! matter which chain family produced the failure.
//!
//! ## Propagation
//!
//! Failures of the requested operation are surfaced unchanged. The only
//! variant that is recovered locally is [`WalletError::ContractProbeFailed`],
//! which degrades a single token entry inside a token listing.
//!
//! ## Example
//!
//! ```
//! use meshwallet_error::{WalletError, Result};
//!
//! fn require_connected(connected: bool) -> Result<()> {
//!     if !connected {
//!         return Err(WalletError::NotConnected);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// The main error type for meshwallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    // ============ Session Errors ============
    /// An operation needing a live provider was called before `connect()`
    #[error("Wallet provider is not connected")]
    NotConnected,

    /// No network is registered under the requested key
    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    // ============ Amount Errors ============
    /// Missing or malformed decimal amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // ============ Transaction Errors ============
    /// Request shaped for the other chain family
    #[error("Unsupported transaction variant: expected {expected} request, got {got}")]
    UnsupportedTransactionVariant {
        /// Chain family the provider serves
        expected: String,
        /// Chain family the request was shaped for
        got: String,
    },

    /// Substrate call module is not in the call registry
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// Substrate call function is not in the call registry for its module
    #[error("Method not found: {module}.{method}")]
    MethodNotFound {
        /// Module that was resolved
        module: String,
        /// Function that could not be resolved
        method: String,
    },

    /// Extrinsic reached a terminal state other than finalized
    #[error("Extrinsic failed: {0}")]
    ExtrinsicFailed(String),

    /// Signing failed
    #[error("Failed to sign: {0}")]
    Signing(String),

    // ============ Contract Errors ============
    /// Token contract is absent or does not answer the ERC-20 read interface
    #[error("Contract probe failed for {address}: {reason}")]
    ContractProbeFailed {
        /// Token contract address
        address: String,
        /// What the probe observed
        reason: String,
    },

    // ============ Key Errors ============
    /// Mnemonic phrase could not be parsed
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Key derivation failed
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    // ============ Input Errors ============
    /// Address could not be parsed for the active chain family
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The invalid address
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A call argument could not be converted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Encoding or decoding of chain data failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    // ============ Network Errors ============
    /// RPC or transport failure, passed through with the failing call named
    #[error("RPC request failed: {context} - {message}")]
    Rpc {
        /// RPC method or operation that failed
        context: String,
        /// Underlying error message
        message: String,
    },

    // ============ Configuration ============
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation is not available on this chain family
    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Convenient Result type using WalletError
pub type Result<T> = std::result::Result<T, WalletError>;

/// Extension trait naming the RPC call a transport error came from.
pub trait RpcContext<T> {
    /// Wraps an error as [`WalletError::Rpc`] under the given context
    fn rpc_context(self, ctx: impl Into<String>) -> Result<T>;

    /// Lazy variant of [`RpcContext::rpc_context`]
    fn with_rpc_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::fmt::Display> RpcContext<T> for std::result::Result<T, E> {
    fn rpc_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| WalletError::Rpc {
            context: ctx.into(),
            message: e.to_string(),
        })
    }

    fn with_rpc_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| WalletError::Rpc {
            context: f(),
            message: e.to_string(),
        })
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(err: hex::FromHexError) -> Self {
        WalletError::Encoding(format!("hex: {err}"))
    }
}

/// Error codes for host bindings that cannot match on the enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ErrorCode {
    /// Not connected
    NotConnected = 1001,
    /// Network not found
    NetworkNotFound = 1002,
    /// Invalid amount
    InvalidAmount = 2001,
    /// Request shape mismatched to provider
    UnsupportedTransactionVariant = 3001,
    /// Substrate module lookup failed
    ModuleNotFound = 3002,
    /// Substrate method lookup failed
    MethodNotFound = 3003,
    /// Extrinsic did not finalize
    ExtrinsicFailed = 3004,
    /// Signing error
    Signing = 3005,
    /// Contract probe failed
    ContractProbeFailed = 5001,
    /// Mnemonic or key derivation error
    KeyError = 6001,
    /// Invalid address, argument or encoding
    InvalidInput = 7001,
    /// RPC error
    Rpc = 4001,
    /// Configuration error
    Config = 8001,
    /// Not supported
    NotSupported = 9001,
}

impl WalletError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            WalletError::NotConnected => ErrorCode::NotConnected,
            WalletError::NetworkNotFound(_) => ErrorCode::NetworkNotFound,
            WalletError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            WalletError::UnsupportedTransactionVariant { .. } => {
                ErrorCode::UnsupportedTransactionVariant
            }
            WalletError::ModuleNotFound(_) => ErrorCode::ModuleNotFound,
            WalletError::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            WalletError::ExtrinsicFailed(_) => ErrorCode::ExtrinsicFailed,
            WalletError::Signing(_) => ErrorCode::Signing,
            WalletError::ContractProbeFailed { .. } => ErrorCode::ContractProbeFailed,
            WalletError::InvalidMnemonic(_) | WalletError::KeyDerivation(_) => ErrorCode::KeyError,
            WalletError::InvalidAddress { .. }
            | WalletError::InvalidArgument(_)
            | WalletError::Encoding(_) => ErrorCode::InvalidInput,
            WalletError::Rpc { .. } => ErrorCode::Rpc,
            WalletError::Config(_) => ErrorCode::Config,
            WalletError::NotSupported(_) => ErrorCode::NotSupported,
        }
    }

    /// Shorthand for an [`WalletError::InvalidAddress`]
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        WalletError::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WalletError::InvalidAddress {
            address: "0x123".to_string(),
            reason: "Too short".to_string(),
        };
        assert!(err.to_string().contains("0x123"));
        assert!(err.to_string().contains("Too short"));
    }

    #[test]
    fn test_error_code() {
        assert_eq!(WalletError::NotConnected.code(), ErrorCode::NotConnected);
        assert_eq!(
            WalletError::MethodNotFound {
                module: "balances".into(),
                method: "fly".into(),
            }
            .code(),
            ErrorCode::MethodNotFound
        );
        assert_eq!(
            WalletError::InvalidMnemonic("bad".into()).code(),
            ErrorCode::KeyError
        );
    }

    #[test]
    fn test_variant_mismatch_message() {
        let err = WalletError::UnsupportedTransactionVariant {
            expected: "evm".into(),
            got: "substrate".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected evm"));
        assert!(msg.contains("got substrate"));
    }

    #[test]
    fn test_rpc_context_keeps_message() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));

        let err = result.rpc_context("eth_getBalance").unwrap_err();
        assert_eq!(
            err,
            WalletError::Rpc {
                context: "eth_getBalance".into(),
                message: "connection refused".into(),
            }
        );
    }

    #[test]
    fn test_hex_error_conversion() {
        let err: WalletError = hex::decode("zz").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }
}
