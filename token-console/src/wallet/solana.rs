//! Solana adapter over a Phantom-compatible wallet object.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{ChainAdapter, ChainProvider, SwitchOutcome, WalletHandle};
use crate::config::{ChainDescriptor, ChainFamily};
use crate::contract::{BindOptions, TokenContract};
use crate::error::{InteractionError, Result};
use crate::normalize::{ErrorNormalizer, Phase, ProviderError};

/// The injected Solana wallet surface (`window.solana`).
///
/// Signing goes through this object directly; there is no EVM-style signer.
#[async_trait]
pub trait SolanaWallet: Send + Sync {
    /// Whether the object identifies itself as Phantom.
    fn is_phantom(&self) -> bool;

    /// Request a connection; resolves to the base58 public key.
    async fn connect(&self) -> std::result::Result<String, ProviderError>;
}

/// Adapter for Solana.
#[derive(Clone)]
pub struct SolanaAdapter {
    wallet: Option<Arc<dyn SolanaWallet>>,
}

impl SolanaAdapter {
    /// Adapter over the detected wallet object.
    #[must_use]
    pub fn new(wallet: Option<Arc<dyn SolanaWallet>>) -> Self {
        Self { wallet }
    }
}

impl std::fmt::Debug for SolanaAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaAdapter")
            .field("detected", &self.wallet.is_some())
            .finish()
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn family(&self) -> ChainFamily {
        ChainFamily::Solana
    }

    async fn ensure_network(&self, _network: &ChainDescriptor) -> Result<SwitchOutcome> {
        Ok(SwitchOutcome::NotApplicable)
    }

    async fn connect(&self) -> Result<WalletHandle> {
        let wallet = self
            .wallet
            .as_ref()
            .filter(|w| w.is_phantom())
            .ok_or_else(|| InteractionError::wallet_unavailable("Phantom wallet is not installed"))?;

        let public_key = wallet
            .connect()
            .await
            .map_err(|e| ErrorNormalizer::normalize(&e, Phase::Connect))?;
        if public_key.trim().is_empty() {
            return Err(InteractionError::wallet_locked("Phantom returned no public key"));
        }
        let address = self.validate_address(&public_key)?;

        info!(address = %address, "Solana wallet connected");
        Ok(WalletHandle::new(
            address,
            ChainProvider::Solana(Arc::clone(wallet)),
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
            "SPL token administration is not available for Solana wallets",
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InteractionErrorKind;
    use crate::testing::MockSolanaWallet;

    const KEY: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[tokio::test]
    async fn missing_phantom_is_unavailable() {
        let err = SolanaAdapter::new(None).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletUnavailable);

        let not_phantom = Arc::new(MockSolanaWallet::new(KEY).not_phantom());
        let err = SolanaAdapter::new(Some(not_phantom)).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletUnavailable);
    }

    #[tokio::test]
    async fn connect_has_no_signer() {
        let adapter = SolanaAdapter::new(Some(Arc::new(MockSolanaWallet::new(KEY))));
        let handle = adapter.connect().await.unwrap();
        assert_eq!(handle.address(), KEY);
        assert!(!handle.can_sign());
        assert!(handle.evm_capability().is_none());
        assert_eq!(adapter.active_chain_id(&handle).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejection_maps_to_locked() {
        let wallet = Arc::new(MockSolanaWallet::new(KEY).reject());
        let err = SolanaAdapter::new(Some(wallet)).connect().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletLocked);
    }

    #[tokio::test]
    async fn binding_is_unsupported() {
        let adapter = SolanaAdapter::new(Some(Arc::new(MockSolanaWallet::new(KEY))));
        let handle = adapter.connect().await.unwrap();
        let err = adapter
            .bind(&handle, KEY, &BindOptions::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind, InteractionErrorKind::UnsupportedChain);

        let err = adapter
            .bind(&handle, "not base58 0OIl", &BindOptions::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind, InteractionErrorKind::InvalidAddress);
    }
}
