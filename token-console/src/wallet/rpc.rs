//! [`Eip1193Provider`] over a JSON-RPC endpoint, backed by [`alloy`].
//!
//! Stands in for an injected extension outside the browser: reads go
//! straight to the node, and `eth_sendTransaction` is signed locally when a
//! [`PrivateKeySigner`] is configured. Wallet-only methods it cannot honour
//! answer with the same error codes a real wallet would.

use alloy::network::Ethereum;
use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::eip1193::{Eip1193Provider, chain_id_hex, methods, parse_chain_id};
use crate::error::{InteractionError, InteractionErrorKind, Result};
use crate::normalize::{ErrorNormalizer, Phase, ProviderError, codes};

/// JSON-RPC "invalid params".
const INVALID_PARAMS: i64 = -32602;

/// A JSON-RPC endpoint presented as an EIP-1193 provider.
pub struct RpcProvider {
    provider: DynProvider<Ethereum>,
    chain_id: u64,
    signer: Option<Address>,
}

impl std::fmt::Debug for RpcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcProvider")
            .field("chain_id", &self.chain_id)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl RpcProvider {
    /// Connect read-only. `eth_requestAccounts` returns no accounts.
    ///
    /// # Errors
    ///
    /// Returns `WalletUnavailable` if the endpoint cannot be reached.
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| connection_failed(rpc_url, &e))?
            .erased();
        Self::build(provider, None, rpc_url).await
    }

    /// Connect with a local signer for `eth_sendTransaction`.
    ///
    /// # Errors
    ///
    /// Returns `SignerRequired` for a malformed key and `WalletUnavailable`
    /// if the endpoint cannot be reached.
    pub async fn with_private_key(rpc_url: &str, key: &str) -> Result<Self> {
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer: PrivateKeySigner = key.parse().map_err(|e| {
            InteractionError::new(
                InteractionErrorKind::SignerRequired,
                format!("invalid private key: {e}"),
            )
        })?;
        let address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(signer)
            .connect(rpc_url)
            .await
            .map_err(|e| connection_failed(rpc_url, &e))?
            .erased();
        Self::build(provider, Some(address), rpc_url).await
    }

    async fn build(
        provider: DynProvider<Ethereum>,
        signer: Option<Address>,
        rpc_url: &str,
    ) -> Result<Self> {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| connection_failed(rpc_url, &e))?;

        info!(rpc_url, chain_id, signer = ?signer, "RPC provider connected");
        Ok(Self {
            provider,
            chain_id,
            signer,
        })
    }

    /// The endpoint's chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The local signer's address, if any.
    #[must_use]
    pub const fn signer_address(&self) -> Option<Address> {
        self.signer
    }

    fn accounts(&self) -> Value {
        json!(self.signer.iter().map(|a| a.to_checksum(None)).collect::<Vec<_>>())
    }
}

fn connection_failed(rpc_url: &str, err: &TransportError) -> InteractionError {
    let raw = provider_error(err);
    let normalized = ErrorNormalizer::normalize(&raw, Phase::Connect);
    InteractionError::wallet_unavailable(format!(
        "RPC connection to '{rpc_url}' failed: {}",
        normalized.message
    ))
    .with_code(normalized.code)
}

/// Convert an alloy transport failure into the raw EIP-1193 error shape.
fn provider_error(err: &TransportError) -> ProviderError {
    match err.as_error_resp() {
        Some(payload) => ProviderError {
            code: Some(payload.code),
            message: payload.message.to_string(),
            data: payload
                .data
                .as_ref()
                .and_then(|raw| serde_json::from_str(raw.get()).ok()),
        },
        None => ProviderError::new(None, err.to_string()),
    }
}

fn first_param<T: DeserializeOwned>(method: &str, params: &Value) -> std::result::Result<T, ProviderError> {
    let first = params.get(0).cloned().unwrap_or(Value::Null);
    serde_json::from_value(first).map_err(|e| {
        ProviderError::new(Some(INVALID_PARAMS), format!("invalid {method} params: {e}"))
    })
}

#[async_trait]
impl Eip1193Provider for RpcProvider {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        debug!(method, "rpc request");
        match method {
            methods::CHAIN_ID => Ok(Value::String(chain_id_hex(self.chain_id))),
            methods::ACCOUNTS | methods::REQUEST_ACCOUNTS => Ok(self.accounts()),
            methods::SWITCH_CHAIN => {
                let requested = params
                    .get(0)
                    .and_then(|p| p.get("chainId"))
                    .and_then(parse_chain_id);
                if requested == Some(self.chain_id) {
                    Ok(Value::Null)
                } else {
                    let shown = requested.map_or_else(|| "unknown".to_string(), chain_id_hex);
                    Err(ProviderError::unrecognized_chain(&shown))
                }
            }
            methods::CALL => {
                let tx: TransactionRequest = first_param(method, &params)?;
                let output = self.provider.call(tx).await.map_err(|e| provider_error(&e))?;
                Ok(json!(output))
            }
            methods::SEND_TRANSACTION => {
                if self.signer.is_none() {
                    return Err(ProviderError::new(
                        Some(codes::UNAUTHORIZED),
                        "no signer is configured for this endpoint",
                    ));
                }
                let tx: TransactionRequest = first_param(method, &params)?;
                let pending = self
                    .provider
                    .send_transaction(tx)
                    .await
                    .map_err(|e| provider_error(&e))?;
                let hash = *pending.tx_hash();
                info!(tx = %hash, "transaction broadcast");
                Ok(json!(hash))
            }
            methods::TRANSACTION_RECEIPT => {
                let hash: B256 = first_param(method, &params)?;
                let receipt = self
                    .provider
                    .get_transaction_receipt(hash)
                    .await
                    .map_err(|e| provider_error(&e))?;
                serde_json::to_value(receipt).map_err(|e| ProviderError::new(None, e.to_string()))
            }
            other => Err(ProviderError::unsupported_method(other)),
        }
    }
}
