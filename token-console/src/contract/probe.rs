//! ERC-20 detection by ordered fallback.

use alloy::primitives::U256;
use tracing::debug;

use super::TokenContract;
use crate::error::InteractionError;

/// What a successful probe learned about the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCapabilities {
    /// `name()`, or the symbol when the token has no name.
    pub name: String,
    /// `symbol()`, or the name when the token has no symbol.
    pub symbol: String,
    /// `decimals()`.
    pub decimals: u8,
    /// `totalSupply()`.
    pub total_supply: U256,
}

/// Optional extensions that answered while loading a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenExtensions {
    /// `paused()` answered.
    pub pausable: bool,
    /// `isWhitelistEnabled()` answered.
    pub whitelist: bool,
    /// `owner()` answered.
    pub ownable: bool,
}

/// Result of [`ContractCapabilityProbe::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The contract answers the mandatory ERC-20 reads.
    Token(TokenCapabilities),
    /// A mandatory read is missing.
    NotATokenContract {
        /// Which step failed and why.
        reason: String,
    },
}

impl ProbeOutcome {
    /// Convert to a result; a non-token contract surfaces as `ReadFailed`.
    ///
    /// # Errors
    ///
    /// Returns `ReadFailed` for [`ProbeOutcome::NotATokenContract`].
    pub fn into_result(self) -> crate::Result<TokenCapabilities> {
        match self {
            Self::Token(caps) => Ok(caps),
            Self::NotATokenContract { reason } => Err(InteractionError::read_failed(format!(
                "not an ERC-20 token contract: {reason}"
            ))),
        }
    }
}

/// Checks `symbol()` → `name()` → `decimals()` → `totalSupply()`.
///
/// At least one identity read must answer; decimals and total supply are
/// mandatory. The reads run in order so the first missing step is the
/// reported reason.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractCapabilityProbe;

impl ContractCapabilityProbe {
    /// Probe a bound contract.
    pub async fn probe(contract: &dyn TokenContract) -> ProbeOutcome {
        let symbol = contract.symbol().await;
        let name = contract.name().await;
        let (name, symbol) = match (name, symbol) {
            (Ok(name), Ok(symbol)) => (name, symbol),
            (Ok(name), Err(_)) => (name.clone(), name),
            (Err(_), Ok(symbol)) => (symbol.clone(), symbol),
            (Err(name_err), Err(symbol_err)) => {
                return Self::reject(format!(
                    "neither symbol() nor name() answered ({}; {})",
                    symbol_err.message, name_err.message
                ));
            }
        };

        let decimals = match contract.decimals().await {
            Ok(decimals) => decimals,
            Err(err) => return Self::reject(err.message),
        };
        let total_supply = match contract.total_supply().await {
            Ok(supply) => supply,
            Err(err) => return Self::reject(err.message),
        };

        debug!(contract = %contract.address(), %symbol, decimals, "contract recognized as ERC-20");
        ProbeOutcome::Token(TokenCapabilities {
            name,
            symbol,
            decimals,
            total_supply,
        })
    }

    fn reject(reason: String) -> ProbeOutcome {
        debug!(%reason, "contract is not an ERC-20 token");
        ProbeOutcome::NotATokenContract { reason }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InteractionErrorKind;
    use crate::testing::StubToken;

    #[tokio::test]
    async fn full_token() {
        let token = StubToken::new().with_identity("Test Token", "TT", 18);
        let caps = ContractCapabilityProbe::probe(&token).await.into_result().unwrap();
        assert_eq!(caps.symbol, "TT");
        assert_eq!(caps.name, "Test Token");
        assert_eq!(caps.decimals, 18);
    }

    #[tokio::test]
    async fn symbol_only_is_enough() {
        let token = StubToken::new().with_identity("Test Token", "TT", 6).without_name();
        let caps = ContractCapabilityProbe::probe(&token).await.into_result().unwrap();
        assert_eq!(caps.name, "TT");
    }

    #[tokio::test]
    async fn no_identity_is_not_a_token() {
        let token = StubToken::new().without_name().without_symbol();
        let outcome = ContractCapabilityProbe::probe(&token).await;
        assert!(matches!(outcome, ProbeOutcome::NotATokenContract { .. }));
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::ReadFailed);
    }

    #[tokio::test]
    async fn missing_decimals_is_not_a_token() {
        let token = StubToken::new().without_decimals();
        let outcome = ContractCapabilityProbe::probe(&token).await;
        let ProbeOutcome::NotATokenContract { reason } = outcome else {
            panic!("expected rejection");
        };
        assert!(reason.contains("decimals"));
    }
}
