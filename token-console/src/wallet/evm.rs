//! EVM adapter over an injected EIP-1193 provider.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::eip1193::{Eip1193Provider, methods, parse_chain_id};
use super::{ChainAdapter, ChainProvider, EvmSigner, NetworkSwitcher, SwitchOutcome, WalletHandle};
use crate::config::{ChainDescriptor, ChainFamily};
use crate::contract::{BindOptions, Erc20Binding, TokenContract};
use crate::error::{InteractionError, Result};
use crate::normalize::{ErrorNormalizer, Phase};

/// Adapter for Ethereum and EVM-compatible chains.
///
/// Normally wraps the injected extension (`window.ethereum`). A watch-only
/// adapter wraps a plain RPC provider plus a holder address instead; it
/// never prompts and yields no signer.
#[derive(Debug, Clone)]
pub struct EvmAdapter {
    injected: Option<Arc<dyn Eip1193Provider>>,
    watch: Option<Address>,
}

impl EvmAdapter {
    /// Adapter over the injected provider, if one was detected.
    #[must_use]
    pub fn new(injected: Option<Arc<dyn Eip1193Provider>>) -> Self {
        Self {
            injected,
            watch: None,
        }
    }

    /// Read-only adapter that observes `holder` through `provider`.
    #[must_use]
    pub fn watch_only(provider: Arc<dyn Eip1193Provider>, holder: Address) -> Self {
        Self {
            injected: Some(provider),
            watch: Some(holder),
        }
    }

    fn provider(&self) -> Result<&Arc<dyn Eip1193Provider>> {
        self.injected
            .as_ref()
            .ok_or_else(|| InteractionError::wallet_unavailable("MetaMask is required"))
    }

    async fn request_accounts(provider: &dyn Eip1193Provider) -> Result<Vec<Address>> {
        let accounts = provider
            .request(methods::REQUEST_ACCOUNTS, Value::Array(Vec::new()))
            .await
            .map_err(|e| ErrorNormalizer::normalize(&e, Phase::Connect))?;

        let list = accounts.as_array().ok_or_else(|| {
            InteractionError::unknown(format!("unexpected {} result: {accounts}", methods::REQUEST_ACCOUNTS))
        })?;
        list.iter()
            .map(|value| {
                value
                    .as_str()
                    .and_then(|s| s.parse::<Address>().ok())
                    .ok_or_else(|| InteractionError::unknown(format!("wallet returned a malformed account: {value}")))
            })
            .collect()
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    async fn ensure_network(&self, network: &ChainDescriptor) -> Result<SwitchOutcome> {
        let provider = self.provider()?;
        if self.watch.is_some() {
            // A fixed RPC endpoint cannot change chains; the caller compares ids.
            return Ok(SwitchOutcome::NotApplicable);
        }
        NetworkSwitcher::new(Arc::clone(provider))
            .ensure_network(network)
            .await
    }

    async fn connect(&self) -> Result<WalletHandle> {
        let provider = self.provider()?;

        if let Some(holder) = self.watch {
            info!(address = %holder, "EVM watch-only connection");
            return Ok(WalletHandle::new(
                holder.to_checksum(None),
                ChainProvider::Evm(Arc::clone(provider)),
                None,
            ));
        }

        let accounts = Self::request_accounts(provider.as_ref()).await?;
        let Some(&account) = accounts.first() else {
            return Err(InteractionError::wallet_locked(
                "no authorized accounts; unlock MetaMask and approve access",
            ));
        };

        info!(address = %account, accounts = accounts.len(), "EVM wallet connected");
        Ok(WalletHandle::new(
            account.to_checksum(None),
            ChainProvider::Evm(Arc::clone(provider)),
            Some(EvmSigner::new(Arc::clone(provider), account)),
        ))
    }

    async fn active_chain_id(&self, wallet: &WalletHandle) -> Result<Option<u64>> {
        let ChainProvider::Evm(provider) = wallet.provider() else {
            return Err(InteractionError::unsupported_chain(format!(
                "{} wallet handed to the EVM adapter",
                wallet.family()
            )));
        };
        let value = provider
            .request(methods::CHAIN_ID, Value::Array(Vec::new()))
            .await
            .map_err(|e| ErrorNormalizer::normalize(&e, Phase::Read))?;
        let chain_id = parse_chain_id(&value).ok_or_else(|| {
            InteractionError::read_failed(format!("unparseable chain id: {value}"))
        })?;
        debug!(chain_id, "active chain id");
        Ok(Some(chain_id))
    }

    async fn bind(
        &self,
        wallet: &WalletHandle,
        contract: &str,
        options: &BindOptions,
    ) -> Result<Arc<dyn TokenContract>> {
        let address = crate::address::parse_evm(contract)?;
        let binding = Erc20Binding::bind(Some(address), wallet.evm_capability(), options.clone())
            .ok_or_else(|| {
                InteractionError::unsupported_chain(format!(
                    "cannot bind an EVM contract to a {} wallet",
                    wallet.family()
                ))
            })?;
        debug!(contract = %address, writable = binding.can_write(), "bound ERC-20 contract");
        Ok(Arc::new(binding))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InteractionErrorKind;
    use crate::testing::MockWallet;

    #[tokio::test]
    async fn missing_extension_is_unavailable() {
        let err = EvmAdapter::new(None).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletUnavailable);
        assert_eq!(err.message, "MetaMask is required");
    }

    #[tokio::test]
    async fn zero_accounts_is_locked() {
        let wallet = Arc::new(MockWallet::new().with_accounts(Vec::new()));
        let err = EvmAdapter::new(Some(wallet)).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletLocked);
    }

    #[tokio::test]
    async fn rejected_prompt_is_locked() {
        let wallet = Arc::new(MockWallet::new().reject_accounts());
        let err = EvmAdapter::new(Some(wallet)).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletLocked);
        assert_eq!(err.code, Some(4001));
    }

    #[tokio::test]
    async fn connect_derives_signer_from_provider() {
        let wallet = Arc::new(MockWallet::new().with_chain_id(11_155_111));
        let adapter = EvmAdapter::new(Some(wallet.clone()));
        let handle = adapter.connect().await.unwrap();
        assert_eq!(handle.family(), ChainFamily::Evm);
        assert_eq!(handle.signer().unwrap().address(), wallet.account());
        assert_eq!(handle.address(), wallet.account().to_checksum(None));
        assert_eq!(
            adapter.active_chain_id(&handle).await.unwrap(),
            Some(11_155_111)
        );
    }

    #[tokio::test]
    async fn watch_only_has_no_signer() {
        let wallet = Arc::new(MockWallet::new());
        let holder = Address::repeat_byte(0x42);
        let adapter = EvmAdapter::watch_only(wallet.clone(), holder);
        let handle = adapter.connect().await.unwrap();
        assert!(!handle.can_sign());
        assert_eq!(handle.evm_address(), Some(holder));
        assert!(wallet.calls().is_empty());

        let contract = adapter
            .bind(&handle, "0x5FbDB2315678afecb367f032d93F642f64180aa3", &BindOptions::default())
            .await
            .unwrap();
        assert!(!contract.can_write());
    }

    #[tokio::test]
    async fn bind_rejects_bad_address() {
        let wallet = Arc::new(MockWallet::new());
        let adapter = EvmAdapter::new(Some(wallet));
        let handle = adapter.connect().await.unwrap();
        let err = adapter
            .bind(&handle, "0xnot-an-address", &BindOptions::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind, InteractionErrorKind::InvalidAddress);
    }
}
