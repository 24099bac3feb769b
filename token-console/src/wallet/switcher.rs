//! EVM network switching with add-then-switch fallback.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::SwitchOutcome;
use super::eip1193::{Eip1193Provider, chain_id_hex, methods, parse_chain_id};
use crate::config::{ChainDescriptor, NativeCurrency};
use crate::error::{InteractionError, Result};
use crate::normalize::{ErrorNormalizer, Phase, ProviderError};

/// EIP-3085 `wallet_addEthereumChain` parameter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParameter<'a> {
    chain_id: String,
    chain_name: &'a str,
    native_currency: NativeCurrency,
    rpc_urls: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    block_explorer_urls: Option<[&'a str; 1]>,
}

impl<'a> AddChainParameter<'a> {
    fn new(chain_id: u64, network: &'a ChainDescriptor) -> Self {
        Self {
            chain_id: chain_id_hex(chain_id),
            chain_name: &network.name,
            native_currency: network.native_currency(),
            rpc_urls: [&network.rpc_url],
            block_explorer_urls: network.explorer_url.as_deref().map(|url| [url]),
        }
    }
}

/// Brings an EVM wallet onto a configured chain.
///
/// Asks the wallet to switch; if the wallet does not know the chain, asks it
/// to register the chain and retries the switch exactly once. Nothing is
/// retried after a failure.
#[derive(Debug, Clone)]
pub struct NetworkSwitcher {
    provider: Arc<dyn Eip1193Provider>,
}

impl NetworkSwitcher {
    /// Create a switcher over a wallet provider.
    #[must_use]
    pub fn new(provider: Arc<dyn Eip1193Provider>) -> Self {
        Self { provider }
    }

    /// Ensure the wallet is on `network`'s chain.
    ///
    /// # Errors
    ///
    /// - `UnsupportedChain` if the descriptor has no chain id.
    /// - `AddRejected` if registering the chain, or the switch after it, fails.
    /// - `SwitchRejected` for any other switch failure.
    pub async fn ensure_network(&self, network: &ChainDescriptor) -> Result<SwitchOutcome> {
        let chain_id = network.chain_id.ok_or_else(|| {
            InteractionError::unsupported_chain(format!("network '{}' has no chain id", network.key))
        })?;

        if self.current_chain_id().await == Some(chain_id) {
            return Ok(SwitchOutcome::AlreadyActive);
        }

        let target = chain_id_hex(chain_id);
        match self.switch(&target).await {
            Ok(()) => {
                info!(chain_id, network = %network.key, "wallet switched network");
                Ok(SwitchOutcome::Switched)
            }
            Err(err) if ErrorNormalizer::is_unrecognized_chain(&err) => {
                info!(chain_id, network = %network.key, "chain unknown to wallet, registering");
                let param = AddChainParameter::new(chain_id, network);
                let params = json!([param]);
                self.provider
                    .request(methods::ADD_CHAIN, params)
                    .await
                    .map_err(|e| ErrorNormalizer::normalize(&e, Phase::AddNetwork))?;
                self.switch(&target)
                    .await
                    .map_err(|e| ErrorNormalizer::normalize(&e, Phase::AddNetwork))?;
                info!(chain_id, network = %network.key, "wallet added and switched network");
                Ok(SwitchOutcome::AddedAndSwitched)
            }
            Err(err) => {
                warn!(chain_id, error = %err, "network switch rejected");
                Err(ErrorNormalizer::normalize(&err, Phase::SwitchNetwork))
            }
        }
    }

    /// The wallet's current chain id. Unreadable is treated as unknown, so
    /// a switch is attempted.
    async fn current_chain_id(&self) -> Option<u64> {
        self.provider
            .request(methods::CHAIN_ID, Value::Array(Vec::new()))
            .await
            .ok()
            .as_ref()
            .and_then(parse_chain_id)
    }

    async fn switch(&self, chain_id: &str) -> std::result::Result<(), ProviderError> {
        self.provider
            .request(methods::SWITCH_CHAIN, json!([{ "chainId": chain_id }]))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ChainFamily, ChainRegistry};
    use crate::error::InteractionErrorKind;
    use crate::testing::MockWallet;

    fn sepolia() -> Arc<ChainDescriptor> {
        ChainRegistry::builtin()
            .get(ChainFamily::Evm, "sepolia")
            .unwrap()
    }

    fn count(wallet: &MockWallet, method: &str) -> usize {
        wallet.calls().iter().filter(|c| c.method == method).count()
    }

    #[tokio::test]
    async fn already_active_skips_switch() {
        let wallet = Arc::new(MockWallet::new().with_chain_id(11_155_111));
        let outcome = NetworkSwitcher::new(wallet.clone())
            .ensure_network(&sepolia())
            .await
            .unwrap();
        assert_eq!(outcome, SwitchOutcome::AlreadyActive);
        assert_eq!(count(&wallet, methods::SWITCH_CHAIN), 0);
    }

    #[tokio::test]
    async fn known_chain_switches() {
        let wallet = Arc::new(MockWallet::new().with_chain_id(1).with_known_chain(11_155_111));
        let outcome = NetworkSwitcher::new(wallet.clone())
            .ensure_network(&sepolia())
            .await
            .unwrap();
        assert_eq!(outcome, SwitchOutcome::Switched);
        assert_eq!(wallet.chain_id(), 11_155_111);
        assert_eq!(count(&wallet, methods::ADD_CHAIN), 0);
    }

    #[tokio::test]
    async fn unknown_chain_is_added_then_switched_once() {
        let wallet = Arc::new(MockWallet::new().with_chain_id(1));
        let outcome = NetworkSwitcher::new(wallet.clone())
            .ensure_network(&sepolia())
            .await
            .unwrap();
        assert_eq!(outcome, SwitchOutcome::AddedAndSwitched);
        assert_eq!(count(&wallet, methods::ADD_CHAIN), 1);
        assert_eq!(count(&wallet, methods::SWITCH_CHAIN), 2);

        let add = wallet
            .calls()
            .into_iter()
            .find(|c| c.method == methods::ADD_CHAIN)
            .unwrap();
        assert_eq!(add.params[0]["chainId"], "0xaa36a7");
        assert_eq!(add.params[0]["nativeCurrency"]["symbol"], "ETH");
        assert_eq!(
            add.params[0]["blockExplorerUrls"][0],
            "https://sepolia.etherscan.io"
        );
    }

    #[tokio::test]
    async fn add_rejection_is_not_retried() {
        let wallet = Arc::new(MockWallet::new().with_chain_id(1).reject_add());
        let err = NetworkSwitcher::new(wallet.clone())
            .ensure_network(&sepolia())
            .await
            .unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::AddRejected);
        assert_eq!(count(&wallet, methods::ADD_CHAIN), 1);
        assert_eq!(count(&wallet, methods::SWITCH_CHAIN), 1);
    }

    #[tokio::test]
    async fn switch_after_add_failure_is_add_rejected() {
        let wallet = Arc::new(
            MockWallet::new()
                .with_chain_id(1)
                .reject_switch_after_add(),
        );
        let err = NetworkSwitcher::new(wallet.clone())
            .ensure_network(&sepolia())
            .await
            .unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::AddRejected);
        assert_eq!(count(&wallet, methods::SWITCH_CHAIN), 2);
    }

    #[tokio::test]
    async fn plain_switch_rejection() {
        let wallet = Arc::new(
            MockWallet::new()
                .with_chain_id(1)
                .with_known_chain(11_155_111)
                .reject_switch(),
        );
        let err = NetworkSwitcher::new(wallet.clone())
            .ensure_network(&sepolia())
            .await
            .unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::SwitchRejected);
        assert_eq!(err.code, Some(4001));
        assert_eq!(count(&wallet, methods::ADD_CHAIN), 0);
    }
}
