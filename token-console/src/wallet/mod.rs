//! Wallet discovery, account access and per-family chain adapters.
//!
//! # Architecture
//!
//! ```text
//! WalletEnvironment (injected ethereum / phantom / tronWeb objects)
//!   → AdapterSet::from_environment() → one ChainAdapter per family
//!     → ChainAdapter::connect() → WalletHandle { address, provider, signer? }
//!       → ChainAdapter::bind() → TokenContract
//! ```
//!
//! Only the EVM family yields a signer. Solana and Tron wallets sign through
//! their own chain-specific handle ([`ChainProvider::Solana`],
//! [`ChainProvider::Tron`]); no unified signer is faked for them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::config::{ChainDescriptor, ChainFamily};
use crate::contract::{BindOptions, TokenContract};
use crate::error::{InteractionError, Result};

pub mod eip1193;
mod evm;
mod rpc;
mod solana;
mod switcher;
mod tron;

pub use eip1193::Eip1193Provider;
pub use evm::EvmAdapter;
pub use rpc::RpcProvider;
pub use solana::{SolanaAdapter, SolanaWallet};
pub use switcher::NetworkSwitcher;
pub use tron::{TronAdapter, TronWallet};

/// Chain access obtained from a wallet, one variant per family.
#[derive(Clone)]
pub enum ChainProvider {
    /// EIP-1193 provider (injected extension or JSON-RPC).
    Evm(Arc<dyn Eip1193Provider>),
    /// Phantom-compatible wallet object.
    Solana(Arc<dyn SolanaWallet>),
    /// TronLink / TronWeb object.
    Tron(Arc<dyn TronWallet>),
}

impl ChainProvider {
    /// The family this provider serves.
    #[must_use]
    pub const fn family(&self) -> ChainFamily {
        match self {
            Self::Evm(_) => ChainFamily::Evm,
            Self::Solana(_) => ChainFamily::Solana,
            Self::Tron(_) => ChainFamily::Tron,
        }
    }
}

impl fmt::Debug for ChainProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainProvider::{}", self.family())
    }
}

/// EVM signing capability: the provider plus the account it signs for.
///
/// Derived from the same provider that serves reads, as injected wallets
/// sign whatever `eth_sendTransaction` they receive for an authorized
/// account.
#[derive(Clone)]
pub struct EvmSigner {
    provider: Arc<dyn Eip1193Provider>,
    from: Address,
}

impl EvmSigner {
    /// Create a signer for `from` backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn Eip1193Provider>, from: Address) -> Self {
        Self { provider, from }
    }

    /// The signing provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }

    /// The signing account.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.from
    }
}

impl fmt::Debug for EvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmSigner")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

/// What a contract handle is built from: read-only provider or signer.
#[derive(Clone, Debug)]
pub enum Capability {
    /// Reads only.
    Provider(Arc<dyn Eip1193Provider>),
    /// Reads and writes.
    Signer(EvmSigner),
}

/// A connected wallet. Owned by the session until disconnect.
#[derive(Clone)]
pub struct WalletHandle {
    address: String,
    provider: ChainProvider,
    signer: Option<EvmSigner>,
}

impl WalletHandle {
    /// Create a handle.
    #[must_use]
    pub const fn new(address: String, provider: ChainProvider, signer: Option<EvmSigner>) -> Self {
        Self {
            address,
            provider,
            signer,
        }
    }

    /// Holder address in the chain's native notation.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Chain family.
    #[must_use]
    pub const fn family(&self) -> ChainFamily {
        self.provider.family()
    }

    /// Read-only chain access.
    #[must_use]
    pub const fn provider(&self) -> &ChainProvider {
        &self.provider
    }

    /// Signing capability, EVM only.
    #[must_use]
    pub const fn signer(&self) -> Option<&EvmSigner> {
        self.signer.as_ref()
    }

    /// Whether writes are possible through this handle.
    #[must_use]
    pub const fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    /// The holder as an EVM address, for EVM wallets.
    #[must_use]
    pub fn evm_address(&self) -> Option<Address> {
        match self.provider {
            ChainProvider::Evm(_) => self.address.parse().ok(),
            _ => None,
        }
    }

    /// The strongest EVM capability available: the signer when present,
    /// otherwise the read-only provider.
    #[must_use]
    pub fn evm_capability(&self) -> Option<Capability> {
        match (&self.signer, &self.provider) {
            (Some(signer), _) => Some(Capability::Signer(signer.clone())),
            (None, ChainProvider::Evm(provider)) => Some(Capability::Provider(Arc::clone(provider))),
            _ => None,
        }
    }
}

impl fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletHandle")
            .field("address", &self.address)
            .field("family", &self.family())
            .field("can_sign", &self.can_sign())
            .finish_non_exhaustive()
    }
}

/// Result of [`ChainAdapter::ensure_network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The wallet was already on the target chain.
    AlreadyActive,
    /// The wallet switched.
    Switched,
    /// The chain was unknown; it was registered and then switched to.
    AddedAndSwitched,
    /// The family has no wallet-controlled network switching.
    NotApplicable,
}

impl SwitchOutcome {
    /// Whether handles obtained before the call are now stale.
    #[must_use]
    pub const fn changed_network(self) -> bool {
        matches!(self, Self::Switched | Self::AddedAndSwitched)
    }
}

/// Per-family wallet integration.
///
/// The session dispatches through this trait and never branches on the
/// chain family itself.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// The family served.
    fn family(&self) -> ChainFamily;

    /// Validate and canonicalize an address for this family.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddress` when the string is malformed.
    fn validate_address(&self, input: &str) -> Result<String> {
        crate::address::validate(self.family(), input)
    }

    /// Make the wallet's active network match `network`.
    async fn ensure_network(&self, network: &ChainDescriptor) -> Result<SwitchOutcome>;

    /// Request account access. May prompt the user and is awaited to
    /// completion.
    async fn connect(&self) -> Result<WalletHandle>;

    /// The wallet's active chain id, when the family has one.
    async fn active_chain_id(&self, wallet: &WalletHandle) -> Result<Option<u64>>;

    /// Bind a token contract for this wallet.
    async fn bind(
        &self,
        wallet: &WalletHandle,
        contract: &str,
        options: &BindOptions,
    ) -> Result<Arc<dyn TokenContract>>;
}

/// Injected wallet objects detected in the host environment.
#[derive(Clone, Default)]
pub struct WalletEnvironment {
    /// `window.ethereum` or an equivalent EIP-1193 provider.
    pub ethereum: Option<Arc<dyn Eip1193Provider>>,
    /// `window.solana` (Phantom).
    pub solana: Option<Arc<dyn SolanaWallet>>,
    /// `window.tronWeb` (TronLink).
    pub tron: Option<Arc<dyn TronWallet>>,
}

/// One adapter per chain family.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<ChainFamily, Arc<dyn ChainAdapter>>,
}

impl AdapterSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapters for every family over the detected wallet objects. A
    /// family whose wallet is missing still gets an adapter; it reports
    /// `WalletUnavailable` on connect.
    #[must_use]
    pub fn from_environment(env: WalletEnvironment) -> Self {
        Self::new()
            .with(Arc::new(EvmAdapter::new(env.ethereum)))
            .with(Arc::new(SolanaAdapter::new(env.solana)))
            .with(Arc::new(TronAdapter::new(env.tron)))
    }

    /// Add or replace the adapter for its family.
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn ChainAdapter>) -> Self {
        self.adapters.insert(adapter.family(), adapter);
        self
    }

    /// The adapter for a family.
    ///
    /// # Errors
    ///
    /// Returns `WalletUnavailable` when no adapter is registered.
    pub fn get(&self, family: ChainFamily) -> Result<Arc<dyn ChainAdapter>> {
        self.adapters.get(&family).cloned().ok_or_else(|| {
            InteractionError::wallet_unavailable(format!("no wallet integration for {family}"))
        })
    }

    /// Families with a registered adapter.
    pub fn families(&self) -> impl Iterator<Item = ChainFamily> + '_ {
        self.adapters.keys().copied()
    }
}

impl fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut families: Vec<_> = self.families().collect();
        families.sort();
        f.debug_struct("AdapterSet")
            .field("families", &families)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InteractionErrorKind;
    use crate::testing::MockWallet;

    #[test]
    fn capability_prefers_signer() {
        let wallet = Arc::new(MockWallet::new());
        let from = wallet.account();
        let provider: Arc<dyn Eip1193Provider> = wallet;

        let read_only = WalletHandle::new(
            from.to_checksum(None),
            ChainProvider::Evm(Arc::clone(&provider)),
            None,
        );
        assert!(matches!(
            read_only.evm_capability(),
            Some(Capability::Provider(_))
        ));
        assert!(!read_only.can_sign());
        assert_eq!(read_only.evm_address(), Some(from));

        let signing = WalletHandle::new(
            from.to_checksum(None),
            ChainProvider::Evm(Arc::clone(&provider)),
            Some(EvmSigner::new(provider, from)),
        );
        assert!(matches!(
            signing.evm_capability(),
            Some(Capability::Signer(_))
        ));
    }

    #[test]
    fn empty_set_reports_wallet_unavailable() {
        let err = AdapterSet::new().get(ChainFamily::Solana).err().unwrap();
        assert_eq!(err.kind, InteractionErrorKind::WalletUnavailable);
    }

    #[test]
    fn environment_registers_every_family() {
        let set = AdapterSet::from_environment(WalletEnvironment::default());
        for family in ChainFamily::ALL {
            assert_eq!(set.get(family).unwrap().family(), family);
        }
    }

    #[test]
    fn outcome_staleness() {
        assert!(SwitchOutcome::AddedAndSwitched.changed_network());
        assert!(!SwitchOutcome::AlreadyActive.changed_network());
        assert!(!SwitchOutcome::NotApplicable.changed_network());
    }
}
