//! The token session: the one object a console front end talks to.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ─connect→ Connecting ─ok→ Connected ─select contract→ Bound
//!      ↑                     │                                          │
//!      └──── failure ────────┘                               load_snapshot
//!                                                                       ↓
//!                              Ready ←─ write (snapshot refreshed) ── Ready
//! ```
//!
//! Errors do not form a state of their own: a failure leaves the session
//! in the state it settled in and is kept as [`TokenSession::last_error`].
//! A network or token selection change, `disconnect`, or a detected chain
//! mismatch drops the wallet, contract and snapshot together.
//!
//! `connect`, `select_contract_address`, `load_snapshot` and writes are
//! mutually exclusive; an overlapping call fails at once with `Busy`.
//! Selection changes bump an epoch so that the result of an operation
//! started under the previous selection is discarded.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::address::parse_evm;
use crate::amount::AmountCodec;
use crate::config::{ChainDescriptor, ChainFamily, ChainRegistry, SessionConfig};
use crate::contract::{BindOptions, TokenContract, TxReceipt, WriteCall};
use crate::error::{InteractionError, Result};
use crate::preflight::PreflightValidator;
use crate::snapshot::{self, SnapshotDelta, TokenSnapshot};
use crate::wallet::{AdapterSet, ChainAdapter, WalletHandle};

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No wallet.
    Disconnected,
    /// Waiting on the wallet.
    Connecting,
    /// Wallet connected, no contract bound.
    Connected,
    /// Contract bound, token state not loaded.
    Bound,
    /// Loading token state.
    Loading,
    /// Token state loaded; writes are possible.
    Ready,
}

impl SessionState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Bound => "bound",
            Self::Loading => "loading",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a front end renders, published on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Lifecycle state.
    pub state: SessionState,
    /// Selected chain family.
    pub family: ChainFamily,
    /// Selected network key.
    pub network: Option<String>,
    /// Connected holder address.
    pub wallet_address: Option<String>,
    /// Selected contract address.
    pub contract_address: Option<String>,
    /// Loaded token state.
    pub snapshot: Option<TokenSnapshot>,
    /// Most recent failure.
    pub last_error: Option<InteractionError>,
}

#[derive(Debug, Clone)]
struct Selection {
    family: ChainFamily,
    network: Option<Arc<ChainDescriptor>>,
    contract: Option<String>,
}

struct Inner {
    state: SessionState,
    selection: Selection,
    wallet: Option<WalletHandle>,
    contract: Option<Arc<dyn TokenContract>>,
    snapshot: Option<TokenSnapshot>,
    last_error: Option<InteractionError>,
}

impl Inner {
    fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            family: self.selection.family,
            network: self.selection.network.as_ref().map(|n| n.key.clone()),
            wallet_address: self.wallet.as_ref().map(|w| w.address().to_string()),
            contract_address: self.selection.contract.clone(),
            snapshot: self.snapshot.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Drop every handle derived from the wallet.
    fn reset(&mut self) {
        self.state = SessionState::Disconnected;
        self.wallet = None;
        self.contract = None;
        self.snapshot = None;
    }
}

/// Releases the in-flight flag on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| InteractionError::busy())?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates connect → bind → load → execute → refresh for one wallet
/// and one token.
pub struct TokenSession {
    registry: ChainRegistry,
    adapters: AdapterSet,
    config: SessionConfig,
    inner: Mutex<Inner>,
    view: watch::Sender<SessionView>,
    in_flight: AtomicBool,
    epoch: AtomicU64,
}

impl fmt::Debug for TokenSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSession")
            .field("view", &*self.view.borrow())
            .field("adapters", &self.adapters)
            .finish_non_exhaustive()
    }
}

impl TokenSession {
    /// Create a disconnected session on the registry's first EVM network.
    #[must_use]
    pub fn new(registry: ChainRegistry, adapters: AdapterSet, config: SessionConfig) -> Self {
        let family = ChainFamily::Evm;
        let inner = Inner {
            state: SessionState::Disconnected,
            selection: Selection {
                family,
                network: registry.default_network(family),
                contract: None,
            },
            wallet: None,
            contract: None,
            snapshot: None,
            last_error: None,
        };
        let (view, _) = watch::channel(inner.view());
        Self {
            registry,
            adapters,
            config,
            inner: Mutex::new(inner),
            view,
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<R>(&self, f: impl FnOnce(&Inner) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate state and publish the new view.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.lock();
        let out = f(&mut inner);
        self.view.send_replace(inner.view());
        out
    }

    /// Attach `err` to the session and hand it back.
    fn record(&self, err: InteractionError) -> InteractionError {
        warn!(kind = %err.kind, error = %err.message, "session operation failed");
        self.update(|inner| inner.last_error = Some(err.clone()));
        err
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.current_epoch() != epoch
    }

    fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// The chain table this session selects from.
    #[must_use]
    pub const fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Session behaviour.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.read(|inner| inner.state)
    }

    /// Current view.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Observe every view change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    /// Loaded token state.
    #[must_use]
    pub fn snapshot(&self) -> Option<TokenSnapshot> {
        self.read(|inner| inner.snapshot.clone())
    }

    /// Most recent failure.
    #[must_use]
    pub fn last_error(&self) -> Option<InteractionError> {
        self.read(|inner| inner.last_error.clone())
    }

    /// Connected wallet.
    #[must_use]
    pub fn wallet(&self) -> Option<WalletHandle> {
        self.read(|inner| inner.wallet.clone())
    }

    /// Bound contract.
    #[must_use]
    pub fn contract(&self) -> Option<Arc<dyn TokenContract>> {
        self.read(|inner| inner.contract.clone())
    }

    /// Selected network.
    #[must_use]
    pub fn descriptor(&self) -> Option<Arc<ChainDescriptor>> {
        self.read(|inner| inner.selection.network.clone())
    }

    /// Selected chain family.
    #[must_use]
    pub fn family(&self) -> ChainFamily {
        self.read(|inner| inner.selection.family)
    }

    /// Whether a state-changing operation is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Dismiss the last error.
    pub fn clear_error(&self) {
        self.update(|inner| inner.last_error = None);
    }

    /// Select a network. A different selection disconnects and clears the
    /// selected contract.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedChain` for a network missing from the registry.
    pub fn select_network(&self, family: ChainFamily, key: &str) -> Result<()> {
        let Some(network) = self.registry.get(family, key) else {
            return Err(self.record(InteractionError::unsupported_chain(format!(
                "no {family} network named '{key}'"
            ))));
        };

        self.update(|inner| {
            let unchanged = inner.selection.family == family
                && inner.selection.network.as_ref().is_some_and(|n| n.key == network.key);
            if unchanged {
                return;
            }
            self.invalidate();
            info!(%family, network = %network.key, "network selected");
            inner.selection = Selection {
                family,
                network: Some(network),
                contract: None,
            };
            inner.reset();
            inner.last_error = None;
        });
        Ok(())
    }

    /// Select one of the network's configured tokens by symbol. A different
    /// token disconnects.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedChain` without a selected network and
    /// `InvalidAddress` when the symbol is not configured.
    pub fn select_token(&self, symbol: &str) -> Result<()> {
        let network = self
            .descriptor()
            .ok_or_else(|| self.record(InteractionError::unsupported_chain("no network selected")))?;
        let address = network.token_address(symbol).ok_or_else(|| {
            self.record(InteractionError::invalid_address(format!(
                "no {symbol} token configured on {}",
                network.name
            )))
        })?;

        self.update(|inner| {
            if inner.selection.contract.as_deref() == Some(address) {
                return;
            }
            self.invalidate();
            info!(%symbol, contract = %address, "token selected");
            inner.selection.contract = Some(address.to_string());
            inner.reset();
            inner.last_error = None;
        });
        Ok(())
    }

    fn adapter(&self) -> Result<Arc<dyn ChainAdapter>> {
        self.adapters.get(self.family())
    }

    fn bind_options(&self) -> BindOptions {
        BindOptions::from(&self.config)
    }

    fn expected_chain_id(&self) -> Option<u64> {
        self.descriptor().and_then(|n| n.chain_id)
    }

    /// Reset to `Disconnected` after the wallet left the selected chain.
    fn chain_mismatch(&self, active: u64, expected: u64) -> InteractionError {
        self.invalidate();
        let err = InteractionError::unsupported_chain(format!(
            "wallet is on chain {active}, expected {expected}"
        ));
        warn!(active, expected, "wallet chain mismatch, disconnecting");
        self.update(|inner| {
            inner.reset();
            inner.last_error = Some(err.clone());
        });
        err
    }

    /// Connect the wallet for the selected family.
    ///
    /// EVM wallets are first brought onto the selected chain. When a
    /// contract is already selected it is bound right away; a bind failure
    /// leaves the session `Connected` with the error attached.
    ///
    /// # Errors
    ///
    /// Any adapter or switch failure, `UnsupportedChain` when the wallet
    /// ends up on another chain, or `Busy`. The session is left
    /// `Disconnected` with nothing partial kept.
    pub async fn connect(&self) -> Result<()> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let epoch = self.current_epoch();
        self.update(|inner| {
            inner.reset();
            inner.state = SessionState::Connecting;
            inner.last_error = None;
        });

        let connected = self.open_wallet().await;
        if self.is_stale(epoch) {
            return Err(self.record(InteractionError::unknown(
                "selection changed while connecting; connection discarded",
            )));
        }
        let (adapter, wallet) = match connected {
            Ok(pair) => pair,
            Err(err) => {
                self.update(|inner| {
                    inner.reset();
                    inner.last_error = Some(err.clone());
                });
                return Err(err);
            }
        };

        info!(address = %wallet.address(), family = %wallet.family(), "session connected");
        let contract = self.update(|inner| {
            inner.wallet = Some(wallet.clone());
            inner.state = SessionState::Connected;
            inner.selection.contract.clone()
        });

        if let Some(contract) = contract {
            let bound = adapter.bind(&wallet, &contract, &self.bind_options()).await;
            if self.is_stale(epoch) {
                return Err(self.record(InteractionError::unknown(
                    "selection changed while binding; connection discarded",
                )));
            }
            self.apply_binding(bound);
        }
        Ok(())
    }

    async fn open_wallet(&self) -> Result<(Arc<dyn ChainAdapter>, WalletHandle)> {
        let adapter = self.adapter()?;
        let network = self
            .descriptor()
            .ok_or_else(|| InteractionError::unsupported_chain("no network selected"))?;

        let outcome = adapter.ensure_network(&network).await?;
        if outcome.changed_network() {
            info!(?outcome, network = %network.key, "wallet moved to the selected network");
        } else {
            debug!(?outcome, network = %network.key, "network ensured");
        }
        let wallet = adapter.connect().await?;

        if let (Some(active), Some(expected)) =
            (adapter.active_chain_id(&wallet).await?, network.chain_id)
            && active != expected
        {
            return Err(InteractionError::unsupported_chain(format!(
                "wallet is on chain {active}, expected {expected} ({})",
                network.name
            )));
        }
        Ok((adapter, wallet))
    }

    /// Store a bind result: `Bound` on success, `Connected` with the error
    /// otherwise.
    fn apply_binding(&self, bound: Result<Arc<dyn TokenContract>>) {
        self.update(|inner| {
            inner.snapshot = None;
            match bound {
                Ok(contract) => {
                    debug!(contract = %contract.address(), writable = contract.can_write(), "contract bound");
                    inner.contract = Some(contract);
                    inner.state = SessionState::Bound;
                }
                Err(err) => {
                    warn!(kind = %err.kind, error = %err.message, "contract bind failed");
                    inner.contract = None;
                    inner.state = SessionState::Connected;
                    inner.last_error = Some(err);
                }
            }
        });
    }

    /// Disconnect and drop every wallet-derived handle.
    pub fn disconnect(&self) {
        self.invalidate();
        self.update(|inner| {
            inner.reset();
            inner.last_error = None;
        });
        info!("session disconnected");
    }

    /// Select the contract to administer. With a wallet connected the
    /// contract is bound immediately (`Bound`); otherwise the address is
    /// kept for the next connect.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for a malformed address, `Busy`, or the bind
    /// failure (the session then stays `Connected`).
    pub async fn select_contract_address(&self, address: &str) -> Result<()> {
        let adapter = self.adapter().map_err(|e| self.record(e))?;
        let address = adapter
            .validate_address(address)
            .map_err(|e| self.record(e))?;

        let _guard = InFlight::acquire(&self.in_flight)?;
        let epoch = self.current_epoch();
        let wallet = self.update(|inner| {
            inner.selection.contract = Some(address.clone());
            inner.wallet.clone()
        });
        let Some(wallet) = wallet else {
            debug!(contract = %address, "contract selected before connect");
            return Ok(());
        };

        let bound = adapter.bind(&wallet, &address, &self.bind_options()).await;
        if self.is_stale(epoch) {
            return Err(self.record(InteractionError::unknown(
                "selection changed while binding; binding discarded",
            )));
        }
        let failure = bound.as_ref().err().cloned();
        self.apply_binding(bound);
        failure.map_or(Ok(()), Err)
    }

    /// Load the bound token's state.
    ///
    /// # Errors
    ///
    /// `WalletUnavailable` or `InvalidAddress` when nothing is bound,
    /// `ReadFailed` from the load (the session returns to `Bound`), or
    /// `Busy`.
    pub async fn load_snapshot(&self) -> Result<TokenSnapshot> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let (contract, holder) = self.bound_contract().map_err(|e| self.record(e))?;
        let epoch = self.current_epoch();
        self.update(|inner| inner.state = SessionState::Loading);

        let loaded = snapshot::load(contract.as_ref(), holder).await;
        if self.is_stale(epoch) {
            return Err(self.record(InteractionError::unknown(
                "selection changed while loading; snapshot discarded",
            )));
        }
        self.update(|inner| match &loaded {
            Ok(snapshot) => {
                inner.snapshot = Some(snapshot.clone());
                inner.state = SessionState::Ready;
                inner.last_error = None;
            }
            Err(err) => {
                inner.snapshot = None;
                inner.state = SessionState::Bound;
                inner.last_error = Some(err.clone());
            }
        });
        loaded
    }

    /// The bound contract and the holder it reports for.
    fn bound_contract(&self) -> Result<(Arc<dyn TokenContract>, Address)> {
        self.read(|inner| {
            let wallet = inner
                .wallet
                .as_ref()
                .ok_or_else(|| InteractionError::wallet_unavailable("no wallet connected"))?;
            let contract = inner
                .contract
                .clone()
                .ok_or_else(|| InteractionError::invalid_address("no contract address selected"))?;
            let holder = wallet
                .evm_address()
                .or_else(|| contract.signer_address())
                .ok_or_else(|| {
                    InteractionError::unsupported_chain(format!(
                        "token state is not available for {} wallets",
                        wallet.family()
                    ))
                })?;
            Ok((contract, holder))
        })
    }

    /// Build a write from human input using the loaded token's decimals.
    fn prepare(&self, build: impl FnOnce(AmountCodec) -> Result<WriteCall>) -> Result<WriteCall> {
        let codec = self
            .read(|inner| inner.snapshot.as_ref().map(TokenSnapshot::codec))
            .ok_or_else(|| {
                InteractionError::read_failed("token state not loaded; load the snapshot first")
            })
            .map_err(|e| self.record(e))?;
        build(codec).map_err(|e| self.record(e))
    }

    /// Execute a write.
    ///
    /// Order: signer check (before any network call), chain check (a
    /// mismatch disconnects), preflight
    /// against freshly read state, submission, optimistic snapshot update,
    /// then a full reload unless `refresh_after_write` is off.
    ///
    /// # Errors
    ///
    /// `Busy`, `UnsupportedChain`, `SignerRequired`, `PreflightRejected`,
    /// or any submission failure. Failures other than a chain mismatch
    /// leave the session `Ready` with the error attached.
    pub async fn execute(&self, call: WriteCall) -> Result<TxReceipt> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let epoch = self.current_epoch();
        let (contract, holder) = self.bound_contract().map_err(|e| self.record(e))?;
        if self.snapshot().is_none() {
            return Err(self.record(InteractionError::read_failed(
                "token state not loaded; load the snapshot first",
            )));
        }

        let Some(caller) = contract.signer_address().filter(|_| contract.can_write()) else {
            return Err(self.record(InteractionError::signer_required(call.name())));
        };

        self.check_chain().await?;

        PreflightValidator::new(contract.as_ref(), caller)
            .check(&call)
            .await
            .map_err(|e| self.record(e))?;

        let receipt = contract.submit(&call).await.map_err(|e| self.record(e))?;
        if self.is_stale(epoch) {
            debug!(tx = %receipt.hash, "selection changed during write; result not applied");
            return Ok(receipt);
        }

        let deltas = SnapshotDelta::for_write(&call, holder);
        self.update(|inner| {
            if let Some(snapshot) = inner.snapshot.as_mut() {
                snapshot.apply(&deltas);
            }
            inner.last_error = None;
        });

        if self.config.refresh_after_write {
            match snapshot::load(contract.as_ref(), holder).await {
                Ok(fresh) if !self.is_stale(epoch) => {
                    self.update(|inner| inner.snapshot = Some(fresh));
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err.message, "refresh after write failed; keeping optimistic snapshot");
                }
            }
        }
        Ok(receipt)
    }

    /// Compare the wallet's chain with the selected network; a mismatch
    /// disconnects.
    async fn check_chain(&self) -> Result<()> {
        let (Some(wallet), Some(expected)) = (self.wallet(), self.expected_chain_id()) else {
            return Ok(());
        };
        let adapter = self.adapter().map_err(|e| self.record(e))?;
        match adapter.active_chain_id(&wallet).await {
            Ok(Some(active)) if active != expected => Err(self.chain_mismatch(active, expected)),
            Ok(_) => Ok(()),
            Err(err) => Err(self.record(err)),
        }
    }

    /// Forward the wallet's chain-changed event. Returns whether the session
    /// was disconnected.
    pub fn notify_chain_changed(&self, chain_id: u64) -> bool {
        let connected = self.read(|inner| inner.wallet.is_some());
        match self.expected_chain_id() {
            Some(expected) if connected && chain_id != expected => {
                self.chain_mismatch(chain_id, expected);
                true
            }
            _ => false,
        }
    }

    /// `transfer(to, amount)`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`]; also `InvalidAddress` and `InvalidAmount`.
    pub async fn transfer(&self, to: &str, amount: &str) -> Result<TxReceipt> {
        let call = self.prepare(|codec| {
            Ok(WriteCall::Transfer {
                to: parse_evm(to)?,
                amount: codec.parse(amount)?,
            })
        })?;
        self.execute(call).await
    }

    /// `approve(spender, amount)`.
    ///
    /// # Errors
    ///
    /// See [`Self::transfer`].
    pub async fn approve(&self, spender: &str, amount: &str) -> Result<TxReceipt> {
        let call = self.prepare(|codec| {
            Ok(WriteCall::Approve {
                spender: parse_evm(spender)?,
                amount: codec.parse(amount)?,
            })
        })?;
        self.execute(call).await
    }

    /// `transferFrom(from, to, amount)`.
    ///
    /// # Errors
    ///
    /// See [`Self::transfer`].
    pub async fn transfer_from(&self, from: &str, to: &str, amount: &str) -> Result<TxReceipt> {
        let call = self.prepare(|codec| {
            Ok(WriteCall::TransferFrom {
                from: parse_evm(from)?,
                to: parse_evm(to)?,
                amount: codec.parse(amount)?,
            })
        })?;
        self.execute(call).await
    }

    /// `mint(to, amount)`.
    ///
    /// # Errors
    ///
    /// See [`Self::transfer`].
    pub async fn mint(&self, to: &str, amount: &str) -> Result<TxReceipt> {
        let call = self.prepare(|codec| {
            Ok(WriteCall::Mint {
                to: parse_evm(to)?,
                amount: codec.parse(amount)?,
            })
        })?;
        self.execute(call).await
    }

    /// `burn(amount)`.
    ///
    /// # Errors
    ///
    /// See [`Self::transfer`].
    pub async fn burn(&self, amount: &str) -> Result<TxReceipt> {
        let call = self.prepare(|codec| {
            Ok(WriteCall::Burn {
                amount: codec.parse(amount)?,
            })
        })?;
        self.execute(call).await
    }

    async fn account_write(
        &self,
        account: &str,
        call: impl FnOnce(Address) -> WriteCall,
    ) -> Result<TxReceipt> {
        let call = self.prepare(|_| Ok(call(parse_evm(account)?)))?;
        self.execute(call).await
    }

    /// `addBlackList(account)`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`]; also `InvalidAddress`.
    pub async fn add_black_list(&self, account: &str) -> Result<TxReceipt> {
        self.account_write(account, |account| WriteCall::AddBlackList { account })
            .await
    }

    /// `removeBlackList(account)`.
    ///
    /// # Errors
    ///
    /// See [`Self::add_black_list`].
    pub async fn remove_black_list(&self, account: &str) -> Result<TxReceipt> {
        self.account_write(account, |account| WriteCall::RemoveBlackList { account })
            .await
    }

    /// `addWhiteList(account)`.
    ///
    /// # Errors
    ///
    /// See [`Self::add_black_list`].
    pub async fn add_white_list(&self, account: &str) -> Result<TxReceipt> {
        self.account_write(account, |account| WriteCall::AddWhiteList { account })
            .await
    }

    /// `removeWhiteList(account)`.
    ///
    /// # Errors
    ///
    /// See [`Self::add_black_list`].
    pub async fn remove_white_list(&self, account: &str) -> Result<TxReceipt> {
        self.account_write(account, |account| WriteCall::RemoveWhiteList { account })
            .await
    }

    /// `transferOwnership(newOwner)`.
    ///
    /// # Errors
    ///
    /// See [`Self::add_black_list`].
    pub async fn transfer_ownership(&self, new_owner: &str) -> Result<TxReceipt> {
        self.account_write(new_owner, |new_owner| WriteCall::TransferOwnership { new_owner })
            .await
    }

    /// `enableWhiteList()`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn enable_white_list(&self) -> Result<TxReceipt> {
        self.execute(WriteCall::EnableWhiteList).await
    }

    /// `disableWhiteList()`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn disable_white_list(&self) -> Result<TxReceipt> {
        self.execute(WriteCall::DisableWhiteList).await
    }

    /// `pause()`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn pause(&self) -> Result<TxReceipt> {
        self.execute(WriteCall::Pause).await
    }

    /// `unpause()`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn unpause(&self) -> Result<TxReceipt> {
        self.execute(WriteCall::Unpause).await
    }

    /// Pause or unpause, whichever flips the cached flag.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn toggle_pause(&self) -> Result<TxReceipt> {
        let call = if self.cached_flag(|s| s.paused)? {
            WriteCall::Unpause
        } else {
            WriteCall::Pause
        };
        self.execute(call).await
    }

    /// Enable or disable the whitelist, whichever flips the cached flag.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn toggle_whitelist(&self) -> Result<TxReceipt> {
        let enabled = self.cached_flag(|s| s.whitelist_enabled)?;
        let call = if enabled {
            WriteCall::DisableWhiteList
        } else {
            WriteCall::EnableWhiteList
        };
        self.execute(call).await
    }

    fn cached_flag(&self, flag: impl FnOnce(&TokenSnapshot) -> bool) -> Result<bool> {
        self.read(|inner| inner.snapshot.as_ref().map(flag))
            .ok_or_else(|| {
                self.record(InteractionError::read_failed(
                    "token state not loaded; load the snapshot first",
                ))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InteractionErrorKind;
    use crate::testing::{MockWallet, StubAdapter, StubToken};

    fn session(token: StubToken) -> (TokenSession, Arc<MockWallet>, Arc<StubToken>) {
        let wallet = Arc::new(MockWallet::new());
        let token = Arc::new(token.with_signer(wallet.account()));
        let adapters = AdapterSet::new().with(Arc::new(StubAdapter::new(wallet.clone(), token.clone())));
        let session = TokenSession::new(ChainRegistry::builtin(), adapters, SessionConfig::default());
        (session, wallet, token)
    }

    #[tokio::test]
    async fn starts_disconnected_on_first_evm_network() {
        let (session, _, _) = session(StubToken::new());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.view().network.as_deref(), Some("sepolia"));
    }

    #[tokio::test]
    async fn connect_without_contract_is_connected() {
        let (session, wallet, _) = session(StubToken::new());
        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(
            session.view().wallet_address,
            Some(wallet.account().to_checksum(None))
        );
    }

    #[tokio::test]
    async fn connect_binds_selected_token() {
        let (session, _, _) = session(StubToken::new());
        session.select_token("TestToken").unwrap();
        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Bound);
        session.load_snapshot().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn operations_before_load_are_rejected() {
        let (session, _, token) = session(StubToken::new());
        let err = session.pause().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WalletUnavailable);

        session.connect().await.unwrap();
        let err = session.load_snapshot().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::InvalidAddress);
        assert!(token.writes().is_empty());
    }

    #[tokio::test]
    async fn unknown_network_is_rejected() {
        let (session, _, _) = session(StubToken::new());
        let err = session.select_network(ChainFamily::Evm, "mainnet").unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::UnsupportedChain);
    }

    #[tokio::test]
    async fn view_is_published() {
        let (session, _, _) = session(StubToken::new());
        let mut rx = session.subscribe();
        session.connect().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, SessionState::Connected);
    }

    #[test]
    fn in_flight_guard_releases() {
        let flag = AtomicBool::new(false);
        {
            let _guard = InFlight::acquire(&flag).unwrap();
            let err = InFlight::acquire(&flag).err().unwrap();
            assert_eq!(err.kind, InteractionErrorKind::Busy);
        }
        assert!(InFlight::acquire(&flag).is_ok());
    }
}
