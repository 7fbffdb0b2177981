//! ERC-20 reads guarded by a contract probe.
//!
//! A configured token address is only trusted after it has bytecode and
//! answers `symbol()` and `decimals()`.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use meshwallet_error::{Result, WalletError};

use crate::client::EvmClient;

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// What the probe learned about a token contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    /// On-chain ticker
    pub symbol: String,
    /// On-chain decimals
    pub decimals: u8,
}

async fn read<C: SolCall + Send>(client: &dyn EvmClient, token: Address, call: C) -> Result<C::Return> {
    let tx = TransactionRequest::default()
        .with_to(token)
        .with_input(Bytes::from(call.abi_encode()));
    let output = client.call(tx).await?;
    C::abi_decode_returns(&output)
        .map_err(|e| WalletError::Encoding(format!("{}: {e}", C::SIGNATURE)))
}

/// Confirms `token` has bytecode and implements the ERC-20 read interface.
///
/// Every failure, including transport errors, is reported as
/// [`WalletError::ContractProbeFailed`].
pub async fn probe(client: &dyn EvmClient, token: Address) -> Result<TokenMetadata> {
    let failed = |reason: String| WalletError::ContractProbeFailed {
        address: token.to_checksum(None),
        reason,
    };

    let code = client.get_code(token).await.map_err(|e| failed(e.to_string()))?;
    if code.is_empty() {
        return Err(failed("no bytecode at address".into()));
    }
    let symbol = read(client, token, IERC20::symbolCall {})
        .await
        .map_err(|e| failed(format!("symbol(): {e}")))?;
    let decimals = read(client, token, IERC20::decimalsCall {})
        .await
        .map_err(|e| failed(format!("decimals(): {e}")))?;

    Ok(TokenMetadata { symbol, decimals })
}

/// `balanceOf(owner)`; call [`probe`] first
pub async fn balance_of(client: &dyn EvmClient, token: Address, owner: Address) -> Result<U256> {
    read(client, token, IERC20::balanceOfCall { account: owner }).await
}

/// Calldata for `transfer(to, amount)`
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    Bytes::from(IERC20::transferCall { to, amount }.abi_encode())
}
