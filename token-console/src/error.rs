//! Unified error type for the interaction layer.
//!
//! Every failure the console can surface is an [`InteractionError`]: a
//! closed [`InteractionErrorKind`] plus the original message. Raw provider
//! shapes are translated into this type in exactly one place, the
//! [`ErrorNormalizer`](crate::normalize::ErrorNormalizer).

use std::fmt;

use crate::amount::AmountError;

/// Result type alias for interaction-layer operations.
pub type Result<T> = std::result::Result<T, InteractionError>;

/// Categories of interaction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionErrorKind {
    /// The wallet extension required by the chain family is not present.
    WalletUnavailable,
    /// The wallet is locked or reported no authorized accounts.
    WalletLocked,
    /// The wallet is on the wrong chain, or the family cannot perform the operation.
    UnsupportedChain,
    /// The wallet refused to switch networks.
    SwitchRejected,
    /// The wallet refused to register (or then switch to) an unknown network.
    AddRejected,
    /// A write was attempted through a read-only handle.
    SignerRequired,
    /// An address could not be parsed for the selected chain family.
    InvalidAddress,
    /// An amount string could not be converted to base units.
    InvalidAmount,
    /// Local validation stopped the operation before it reached the network.
    PreflightRejected,
    /// A contract read reverted or the method is absent.
    ReadFailed,
    /// The user declined the wallet prompt.
    WriteRejectedByUser,
    /// The transaction was submitted and failed on-chain.
    WriteReverted,
    /// The account cannot pay for gas, or the gas limit was too low.
    InsufficientGas,
    /// Another state-changing operation is already in flight.
    Busy,
    /// Anything the normalizer could not classify.
    Unknown,
}

impl InteractionErrorKind {
    /// Short human-readable label for the kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WalletUnavailable => "wallet unavailable",
            Self::WalletLocked => "wallet locked",
            Self::UnsupportedChain => "unsupported chain",
            Self::SwitchRejected => "network switch rejected",
            Self::AddRejected => "network add rejected",
            Self::SignerRequired => "signer required",
            Self::InvalidAddress => "invalid address",
            Self::InvalidAmount => "invalid amount",
            Self::PreflightRejected => "rejected before submission",
            Self::ReadFailed => "read failed",
            Self::WriteRejectedByUser => "rejected in wallet",
            Self::WriteReverted => "transaction reverted",
            Self::InsufficientGas => "insufficient gas",
            Self::Busy => "operation in progress",
            Self::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for InteractionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized interaction failure.
///
/// Carries no retry state: retries are always user-initiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionError {
    /// The error kind.
    pub kind: InteractionErrorKind,
    /// The original (innermost useful) message.
    pub message: String,
    /// Provider error code, when the failure came from a wallet or RPC node.
    pub code: Option<i64>,
}

impl InteractionError {
    /// Create an error of the given kind.
    #[must_use]
    pub fn new(kind: InteractionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    /// Attach a provider error code.
    #[must_use]
    pub const fn with_code(mut self, code: Option<i64>) -> Self {
        self.code = code;
        self
    }

    /// Create a wallet unavailable error.
    #[must_use]
    pub fn wallet_unavailable(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::WalletUnavailable, message)
    }

    /// Create a wallet locked error.
    #[must_use]
    pub fn wallet_locked(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::WalletLocked, message)
    }

    /// Create an unsupported chain error.
    #[must_use]
    pub fn unsupported_chain(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::UnsupportedChain, message)
    }

    /// Create a switch rejected error.
    #[must_use]
    pub fn switch_rejected(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::SwitchRejected, message)
    }

    /// Create an add rejected error.
    #[must_use]
    pub fn add_rejected(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::AddRejected, message)
    }

    /// Create a signer required error for the named write method.
    #[must_use]
    pub fn signer_required(method: &str) -> Self {
        Self::new(
            InteractionErrorKind::SignerRequired,
            format!("{method} requires a signer-backed contract handle"),
        )
    }

    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::InvalidAddress, message)
    }

    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::InvalidAmount, message)
    }

    /// Create a preflight rejection with the given reason.
    #[must_use]
    pub fn preflight(reason: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::PreflightRejected, reason)
    }

    /// Create a read failed error.
    #[must_use]
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::ReadFailed, message)
    }

    /// Create a user rejection error.
    #[must_use]
    pub fn rejected_by_user(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::WriteRejectedByUser, message)
    }

    /// Create an on-chain revert error.
    #[must_use]
    pub fn write_reverted(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::WriteReverted, message)
    }

    /// Create an insufficient gas error.
    #[must_use]
    pub fn insufficient_gas(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::InsufficientGas, message)
    }

    /// Create a busy error.
    #[must_use]
    pub fn busy() -> Self {
        Self::new(
            InteractionErrorKind::Busy,
            "another operation is still in progress",
        )
    }

    /// Create an unknown error.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(InteractionErrorKind::Unknown, message)
    }

    /// The preflight rejection reason, if this is a preflight rejection.
    #[must_use]
    pub fn preflight_reason(&self) -> Option<&str> {
        (self.kind == InteractionErrorKind::PreflightRejected).then_some(self.message.as_str())
    }

    /// Whether the failure was decided locally, without touching the network.
    ///
    /// Lets the UI tell "we stopped you" apart from "the network or wallet
    /// stopped you".
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self.kind,
            InteractionErrorKind::PreflightRejected
                | InteractionErrorKind::InvalidAddress
                | InteractionErrorKind::InvalidAmount
                | InteractionErrorKind::SignerRequired
                | InteractionErrorKind::Busy
        )
    }
}

impl fmt::Display for InteractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(code) = self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for InteractionError {}

impl From<AmountError> for InteractionError {
    fn from(err: AmountError) -> Self {
        match err {
            // A negative amount is well-formed input that can never be sent.
            AmountError::Negative(_) => Self::preflight("amount must be greater than zero"),
            other => Self::invalid_amount(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = InteractionError::read_failed("paused() reverted");
        assert_eq!(err.to_string(), "read failed: paused() reverted");
    }

    #[test]
    fn display_includes_code() {
        let err = InteractionError::rejected_by_user("User denied").with_code(Some(4001));
        assert_eq!(err.to_string(), "rejected in wallet: User denied (code: 4001)");
    }

    #[test]
    fn preflight_reason_only_for_preflight() {
        let err = InteractionError::preflight("insufficient balance");
        assert_eq!(err.preflight_reason(), Some("insufficient balance"));
        assert!(err.is_local());

        let err = InteractionError::write_reverted("status 0");
        assert_eq!(err.preflight_reason(), None);
        assert!(!err.is_local());
    }

    #[test]
    fn negative_amount_becomes_preflight_rejection() {
        let err: InteractionError = AmountError::Negative("-5".into()).into();
        assert_eq!(err.kind, InteractionErrorKind::PreflightRejected);

        let err: InteractionError = AmountError::Malformed("1.2.3".into()).into();
        assert_eq!(err.kind, InteractionErrorKind::InvalidAmount);
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(InteractionError::busy());
        assert!(err.to_string().contains("in progress"));
    }
}
