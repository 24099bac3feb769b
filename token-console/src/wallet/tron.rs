//! Tron adapter over an injected TronWeb object.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{ChainAdapter, ChainProvider, SwitchOutcome, WalletHandle};
use crate::config::{ChainDescriptor, ChainFamily};
use crate::contract::{BindOptions, TokenContract};
use crate::error::{InteractionError, Result};
use crate::normalize::{ErrorNormalizer, Phase, ProviderError};

/// The injected TronLink surface (`window.tronLink` / `window.tronWeb`).
#[async_trait]
pub trait TronWallet: Send + Sync {
    /// `tron_requestAccounts`.
    async fn request_accounts(&self) -> std::result::Result<(), ProviderError>;

    /// `tronWeb.defaultAddress.base58`; `None` while the wallet is locked.
    fn default_address(&self) -> Option<String>;
}

/// Adapter for Tron.
#[derive(Clone)]
pub struct TronAdapter {
    wallet: Option<Arc<dyn TronWallet>>,
}

impl TronAdapter {
    /// Adapter over the detected TronWeb object.
    #[must_use]
    pub fn new(wallet: Option<Arc<dyn TronWallet>>) -> Self {
        Self { wallet }
    }
}

impl std::fmt::Debug for TronAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TronAdapter")
            .field("detected", &self.wallet.is_some())
            .finish()
    }
}

#[async_trait]
impl ChainAdapter for TronAdapter {
    fn family(&self) -> ChainFamily {
        ChainFamily::Tron
    }

    async fn ensure_network(&self, _network: &ChainDescriptor) -> Result<SwitchOutcome> {
        Ok(SwitchOutcome::NotApplicable)
    }

    async fn connect(&self) -> Result<WalletHandle> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| InteractionError::wallet_unavailable("TronLink is not installed"))?;

        wallet
            .request_accounts()
            .await
            .map_err(|e| ErrorNormalizer::normalize(&e, Phase::Connect))?;

        let address = wallet
            .default_address()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| InteractionError::wallet_locked("unlock your TronLink wallet"))?;
        let address = self.validate_address(&address)?;

        info!(address = %address, "Tron wallet connected");
        Ok(WalletHandle::new(
            address,
            ChainProvider::Tron(Arc::clone(wallet)),
            None,
        ))
    }

    async fn active_chain_id(&self, _wallet: &WalletHandle) -> Result<Option<u64>> {
        Ok(None)
    }

    async fn bind(
        &self,
        _wallet: &WalletHandle,
        contract: &str,
        _options: &BindOptions,
    ) -> Result<Arc<dyn TokenContract>> {
        self.validate_address(contract)?;
        Err(InteractionError::unsupported_chain(
            "TRC-20 administration is not available for Tron wallets",
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InteractionErrorKind;
    use crate::testing::MockTronWallet;

    const ADDRESS: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    #[tokio::test]
    async fn missing_tronweb_is_unavailable() {
        let err = TronAdapter::new(None).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletUnavailable);
    }

    #[tokio::test]
    async fn locked_wallet_has_no_default_address() {
        let wallet = Arc::new(MockTronWallet::locked());
        let err = TronAdapter::new(Some(wallet)).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletLocked);
        assert!(err.message.contains("unlock"));
    }

    #[tokio::test]
    async fn connect_uses_default_address() {
        let adapter = TronAdapter::new(Some(Arc::new(MockTronWallet::new(ADDRESS))));
        let handle = adapter.connect().await.unwrap();
        assert_eq!(handle.address(), ADDRESS);
        assert_eq!(handle.family(), ChainFamily::Tron);
        assert!(handle.signer().is_none());
    }

    #[tokio::test]
    async fn binding_is_unsupported() {
        let adapter = TronAdapter::new(Some(Arc::new(MockTronWallet::new(ADDRESS))));
        let handle = adapter.connect().await.unwrap();
        let err = adapter
            .bind(&handle, ADDRESS, &BindOptions::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind, InteractionErrorKind::UnsupportedChain);
    }
}
