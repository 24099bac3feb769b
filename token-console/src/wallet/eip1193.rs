//! The EIP-1193 `request({ method, params })` boundary.
//!
//! Browser extensions, WalletConnect bridges and plain JSON-RPC endpoints
//! all reduce to this one call. The EVM adapter, the network switcher and
//! the ERC-20 binding only ever talk to an [`Eip1193Provider`].

use async_trait::async_trait;
use serde_json::Value;

use crate::normalize::ProviderError;

/// JSON-RPC and wallet method names used by the console.
pub mod methods {
    /// Prompt for account access.
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    /// Already-authorized accounts, no prompt.
    pub const ACCOUNTS: &str = "eth_accounts";
    /// Active chain id as hex.
    pub const CHAIN_ID: &str = "eth_chainId";
    /// EIP-3326 network switch.
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    /// EIP-3085 network registration.
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    /// Read-only contract call.
    pub const CALL: &str = "eth_call";
    /// Sign and broadcast a transaction.
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    /// Mined transaction receipt, `null` while pending.
    pub const TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
}

/// An EIP-1193 compatible provider.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Perform one request.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

impl std::fmt::Debug for dyn Eip1193Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Eip1193Provider")
    }
}

/// Parse an `eth_chainId` result. Accepts `0x` hex strings, decimal strings
/// and bare numbers.
#[must_use]
pub fn parse_chain_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

/// Format a chain id the way wallets expect it: `0x`-prefixed lowercase hex.
#[must_use]
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chain_id_formats() {
        assert_eq!(chain_id_hex(11_155_111), "0xaa36a7");
        assert_eq!(chain_id_hex(1), "0x1");
    }

    #[test]
    fn chain_id_parsing() {
        assert_eq!(parse_chain_id(&json!("0xaa36a7")), Some(11_155_111));
        assert_eq!(parse_chain_id(&json!("0xAA36A7")), Some(11_155_111));
        assert_eq!(parse_chain_id(&json!("56")), Some(56));
        assert_eq!(parse_chain_id(&json!(137)), Some(137));
        assert_eq!(parse_chain_id(&json!(null)), None);
        assert_eq!(parse_chain_id(&json!("0xzz")), None);
    }
}
