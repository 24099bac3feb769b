//! Translation of raw wallet and RPC failures into [`InteractionError`]s.
//!
//! Wallet extensions and nodes report failures in inconsistent shapes: an
//! EIP-1193 `{code, message, data}` object, the same object wrapped inside
//! an internal-error envelope, a revert reason string buried in `data`, or
//! just free text. [`ErrorNormalizer`] is the only code in the crate that
//! looks inside those shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::InteractionError;

/// Well-known provider error codes (EIP-1193, EIP-3085/3326, JSON-RPC).
pub mod codes {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method has not been authorized.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the requested method.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The provider is disconnected from all chains.
    pub const DISCONNECTED: i64 = 4900;
    /// The chain id passed to a switch request is not known to the wallet.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// A request of the same type is already pending in the wallet.
    pub const REQUEST_PENDING: i64 = -32002;
    /// Generic internal JSON-RPC error, frequently wrapping another error.
    pub const INTERNAL: i64 = -32603;
    /// Execution reverted (geth and most clients).
    pub const EXECUTION_REVERTED: i64 = 3;
}

/// A raw failure as reported by a wallet extension or RPC node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Numeric error code, when the provider supplied one.
    #[serde(default)]
    pub code: Option<i64>,
    /// Top-level message.
    #[serde(default)]
    pub message: String,
    /// Additional payload: nested error objects, revert data, reasons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    /// Create a provider error.
    #[must_use]
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a data payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The user declined the wallet prompt.
    #[must_use]
    pub fn user_rejected() -> Self {
        Self::new(
            Some(codes::USER_REJECTED),
            "User rejected the request.",
        )
    }

    /// The chain is not registered in the wallet.
    #[must_use]
    pub fn unrecognized_chain(chain_id: &str) -> Self {
        Self::new(
            Some(codes::UNRECOGNIZED_CHAIN),
            format!("Unrecognized chain ID \"{chain_id}\"."),
        )
    }

    /// The method is not supported by this provider.
    #[must_use]
    pub fn unsupported_method(method: &str) -> Self {
        Self::new(
            Some(codes::UNSUPPORTED_METHOD),
            format!("The provider does not support the method \"{method}\"."),
        )
    }

    /// An `eth_call` or gas estimation reverted.
    #[must_use]
    pub fn reverted(reason: &str) -> Self {
        Self::new(
            Some(codes::EXECUTION_REVERTED),
            format!("execution reverted: {reason}"),
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code: {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// The step that produced a failure; decides the narrowest kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Requesting account access.
    Connect,
    /// `wallet_switchEthereumChain`.
    SwitchNetwork,
    /// `wallet_addEthereumChain` and the single switch retry after it.
    AddNetwork,
    /// A contract read.
    Read,
    /// A transaction submission or its receipt.
    Write,
}

/// Maps raw provider failures onto the closed error taxonomy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorNormalizer;

impl ErrorNormalizer {
    /// Normalize a structured provider error.
    #[must_use]
    pub fn normalize(err: &ProviderError, phase: Phase) -> InteractionError {
        let found = Self::codes(err);
        let message = Self::innermost_message(err);
        let lowered = Self::all_text(err).to_lowercase();
        let has = |code: i64| found.contains(&code);

        let normalized = match phase {
            Phase::Read => InteractionError::read_failed(message),
            Phase::Connect => {
                if has(codes::USER_REJECTED) {
                    InteractionError::wallet_locked(format!("account access was rejected: {message}"))
                } else if has(codes::UNAUTHORIZED) || has(codes::REQUEST_PENDING) {
                    InteractionError::wallet_locked(message)
                } else if has(codes::UNSUPPORTED_METHOD) {
                    InteractionError::wallet_unavailable(message)
                } else {
                    InteractionError::unknown(message)
                }
            }
            Phase::SwitchNetwork => InteractionError::switch_rejected(message),
            Phase::AddNetwork => InteractionError::add_rejected(message),
            Phase::Write => {
                if has(codes::USER_REJECTED) || Self::mentions_rejection(&lowered) {
                    InteractionError::rejected_by_user(message)
                } else if Self::mentions_gas(&lowered) {
                    InteractionError::insufficient_gas(message)
                } else if has(codes::EXECUTION_REVERTED) || Self::mentions_revert(&lowered) {
                    InteractionError::write_reverted(message)
                } else if has(codes::UNAUTHORIZED) {
                    InteractionError::wallet_locked(message)
                } else {
                    InteractionError::unknown(message)
                }
            }
        };

        let normalized = normalized.with_code(Self::primary_code(&found));
        debug!(?phase, kind = %normalized.kind, code = ?normalized.code, "normalized provider error");
        normalized
    }

    /// Normalize a failure that only carries free text.
    #[cfg(test)]
    fn normalize_message(message: &str, phase: Phase) -> InteractionError {
        Self::normalize(&ProviderError::new(None, message), phase)
    }

    /// Whether a switch failure means "this chain is not registered".
    ///
    /// Matches code 4902 at the top level and inside the internal-error
    /// envelope some mobile wallets wrap it in.
    #[must_use]
    pub fn is_unrecognized_chain(err: &ProviderError) -> bool {
        Self::codes(err).contains(&codes::UNRECOGNIZED_CHAIN)
            || Self::all_text(err)
                .to_lowercase()
                .contains("unrecognized chain id")
    }

    /// Every code found in the error and its nested payloads, outermost first.
    fn codes(err: &ProviderError) -> Vec<i64> {
        let mut found: Vec<i64> = err.code.into_iter().collect();
        if let Some(data) = &err.data {
            Self::collect_codes(data, &mut found);
        }
        found
    }

    fn collect_codes(value: &Value, found: &mut Vec<i64>) {
        let Value::Object(map) = value else {
            return;
        };
        if let Some(code) = map.get("code").and_then(Value::as_i64) {
            found.push(code);
        }
        for key in ["originalError", "error", "data", "cause"] {
            if let Some(nested) = map.get(key) {
                Self::collect_codes(nested, found);
            }
        }
    }

    /// The most specific code: the innermost one that is not the generic
    /// internal-error wrapper.
    fn primary_code(found: &[i64]) -> Option<i64> {
        found
            .iter()
            .rev()
            .find(|&&code| code != codes::INTERNAL)
            .or_else(|| found.first())
            .copied()
    }

    /// The deepest human-readable message, falling back to the top level.
    fn innermost_message(err: &ProviderError) -> String {
        err.data
            .as_ref()
            .and_then(Self::nested_message)
            .filter(|m| !m.trim().is_empty())
            .or_else(|| (!err.message.trim().is_empty()).then(|| err.message.clone()))
            .unwrap_or_else(|| "unknown provider error".to_string())
    }

    fn nested_message(value: &Value) -> Option<String> {
        match value {
            Value::Object(map) => {
                for key in ["originalError", "error", "data", "cause"] {
                    if let Some(found) = map.get(key).and_then(Self::nested_message) {
                        return Some(found);
                    }
                }
                map.get("reason")
                    .or_else(|| map.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }
            // Hex revert data is not a message.
            Value::String(s) if !s.starts_with("0x") => Some(s.clone()),
            _ => None,
        }
    }

    fn all_text(err: &ProviderError) -> String {
        let mut text = err.message.clone();
        if let Some(data) = &err.data {
            text.push(' ');
            text.push_str(&data.to_string());
        }
        text
    }

    fn mentions_rejection(lowered: &str) -> bool {
        ["user rejected", "user denied", "action_rejected", "rejected by user", "cancelled by user"]
            .iter()
            .any(|needle| lowered.contains(needle))
    }

    fn mentions_gas(lowered: &str) -> bool {
        [
            "insufficient funds",
            "out of gas",
            "intrinsic gas too low",
            "gas required exceeds",
            "insufficient_funds",
        ]
        .iter()
        .any(|needle| lowered.contains(needle))
    }

    fn mentions_revert(lowered: &str) -> bool {
        ["execution reverted", "call_exception", "transaction failed", "revert"]
            .iter()
            .any(|needle| lowered.contains(needle))
    }
}
