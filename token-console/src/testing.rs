//! In-memory wallets and contracts for tests.
//!
//! [`MockWallet`] speaks just enough EIP-1193 to drive the EVM adapter,
//! switcher and binding. [`StubToken`] is a [`TokenContract`] whose state
//! lives in memory and whose writes are recorded, so tests can assert that
//! a rejected write never reached the contract. [`StubAdapter`] binds a
//! session to a `StubToken` over a `MockWallet`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::{Address, B256, Bytes, U256, address};
use alloy::sol_types::SolValue;
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::config::{ChainDescriptor, ChainFamily};
use crate::contract::{BindOptions, TokenContract, TxReceipt, WriteCall};
use crate::error::{InteractionError, Result};
use crate::normalize::ProviderError;
use crate::wallet::eip1193::{chain_id_hex, methods, parse_chain_id};
use crate::wallet::{
    ChainAdapter, Eip1193Provider, EvmAdapter, SolanaWallet, SwitchOutcome, TronWallet,
    WalletHandle,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A request received by a [`MockWallet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// JSON-RPC method.
    pub method: String,
    /// Parameters as sent.
    pub params: Value,
}

#[derive(Debug, Default)]
struct WalletState {
    chain_id: u64,
    known_chains: HashSet<u64>,
    added: bool,
    sent: u8,
    polls_left: usize,
    calls: Vec<RecordedCall>,
}

/// Scripted EIP-1193 wallet.
///
/// Defaults: one authorized account, on Sepolia, every `eth_call` answers
/// `0x` unless a result was registered, receipts are mined at block 1.
#[derive(Debug)]
pub struct MockWallet {
    account: Address,
    accounts: Vec<Address>,
    call_results: HashMap<[u8; 4], Bytes>,
    pending_polls: usize,
    reverting: bool,
    reject_accounts: bool,
    reject_switch: bool,
    reject_switch_after_add: bool,
    reject_add: bool,
    reject_sends: bool,
    state: Mutex<WalletState>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    /// Account authorized by default.
    pub const ACCOUNT: Address = address!("0x1000000000000000000000000000000000000001");

    /// A wallet on Sepolia with [`Self::ACCOUNT`] authorized.
    #[must_use]
    pub fn new() -> Self {
        let chain_id = 11_155_111;
        Self {
            account: Self::ACCOUNT,
            accounts: vec![Self::ACCOUNT],
            call_results: HashMap::new(),
            pending_polls: 0,
            reverting: false,
            reject_accounts: false,
            reject_switch: false,
            reject_switch_after_add: false,
            reject_add: false,
            reject_sends: false,
            state: Mutex::new(WalletState {
                chain_id,
                known_chains: HashSet::from([chain_id]),
                ..WalletState::default()
            }),
        }
    }

    /// Start on `chain_id`, the only chain the wallet knows.
    #[must_use]
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.chain_id = chain_id;
        state.known_chains = HashSet::from([chain_id]);
        self
    }

    /// Let the wallet switch to `chain_id` without registering it first.
    #[must_use]
    pub fn with_known_chain(mut self, chain_id: u64) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .known_chains
            .insert(chain_id);
        self
    }

    /// Authorized accounts; the first becomes [`Self::account`].
    #[must_use]
    pub fn with_accounts(mut self, accounts: Vec<Address>) -> Self {
        if let Some(first) = accounts.first() {
            self.account = *first;
        }
        self.accounts = accounts;
        self
    }

    /// Answer `eth_call`s for `selector` with `value`, ABI-encoded.
    #[must_use]
    pub fn with_call_result(mut self, selector: [u8; 4], value: impl SolValue) -> Self {
        self.call_results
            .insert(selector, Bytes::from(value.abi_encode()));
        self
    }

    /// Return a null receipt this many times after each send.
    #[must_use]
    pub const fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Mine every transaction with status 0.
    #[must_use]
    pub const fn with_reverting_receipts(mut self) -> Self {
        self.reverting = true;
        self
    }

    /// Decline `eth_requestAccounts` with 4001.
    #[must_use]
    pub const fn reject_accounts(mut self) -> Self {
        self.reject_accounts = true;
        self
    }

    /// Decline every switch with 4001.
    #[must_use]
    pub const fn reject_switch(mut self) -> Self {
        self.reject_switch = true;
        self
    }

    /// Accept a chain registration but decline the switch that follows it.
    #[must_use]
    pub const fn reject_switch_after_add(mut self) -> Self {
        self.reject_switch_after_add = true;
        self
    }

    /// Decline chain registration with 4001.
    #[must_use]
    pub const fn reject_add(mut self) -> Self {
        self.reject_add = true;
        self
    }

    /// Decline every `eth_sendTransaction` with 4001.
    #[must_use]
    pub const fn reject_sends(mut self) -> Self {
        self.reject_sends = true;
        self
    }

    /// The signing account.
    #[must_use]
    pub const fn account(&self) -> Address {
        self.account
    }

    /// The active chain.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        lock(&self.state).chain_id
    }

    /// Move the wallet to another chain, as the user would from the
    /// extension.
    pub fn set_chain_id(&self, chain_id: u64) {
        let mut state = lock(&self.state);
        state.chain_id = chain_id;
        state.known_chains.insert(chain_id);
    }

    /// Every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state).calls.clone()
    }

    fn switch(&self, params: &Value) -> std::result::Result<Value, ProviderError> {
        let target = params[0]
            .get("chainId")
            .and_then(parse_chain_id)
            .ok_or_else(|| ProviderError::new(Some(-32602), "invalid chainId"))?;
        let mut state = lock(&self.state);
        if self.reject_switch || (state.added && self.reject_switch_after_add) {
            return Err(ProviderError::user_rejected());
        }
        if !state.known_chains.contains(&target) {
            return Err(ProviderError::unrecognized_chain(&chain_id_hex(target)));
        }
        state.chain_id = target;
        Ok(Value::Null)
    }

    fn add(&self, params: &Value) -> std::result::Result<Value, ProviderError> {
        if self.reject_add {
            return Err(ProviderError::user_rejected());
        }
        let target = params[0]
            .get("chainId")
            .and_then(parse_chain_id)
            .ok_or_else(|| ProviderError::new(Some(-32602), "invalid chainId"))?;
        let mut state = lock(&self.state);
        state.known_chains.insert(target);
        state.added = true;
        Ok(Value::Null)
    }

    fn call(&self, params: &Value) -> std::result::Result<Value, ProviderError> {
        let data: Bytes = serde_json::from_value(params[0]["data"].clone())
            .map_err(|e| ProviderError::new(Some(-32602), e.to_string()))?;
        let result = data
            .get(..4)
            .and_then(|selector| <[u8; 4]>::try_from(selector).ok())
            .and_then(|selector| self.call_results.get(&selector))
            .cloned()
            .unwrap_or_default();
        Ok(json!(result))
    }

    fn send(&self) -> std::result::Result<Value, ProviderError> {
        if self.reject_sends {
            return Err(ProviderError::user_rejected());
        }
        let mut state = lock(&self.state);
        state.sent = state.sent.wrapping_add(1);
        state.polls_left = self.pending_polls;
        Ok(json!(B256::with_last_byte(state.sent)))
    }

    fn receipt(&self, params: &Value) -> Value {
        let mut state = lock(&self.state);
        if state.polls_left > 0 {
            state.polls_left -= 1;
            return Value::Null;
        }
        json!({
            "transactionHash": params[0],
            "status": if self.reverting { "0x0" } else { "0x1" },
            "blockNumber": "0x1",
        })
    }
}

#[async_trait]
impl Eip1193Provider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        lock(&self.state).calls.push(RecordedCall {
            method: method.to_string(),
            params: params.clone(),
        });

        match method {
            methods::REQUEST_ACCOUNTS if self.reject_accounts => Err(ProviderError::user_rejected()),
            methods::REQUEST_ACCOUNTS | methods::ACCOUNTS => Ok(json!(self.accounts)),
            methods::CHAIN_ID => Ok(json!(chain_id_hex(self.chain_id()))),
            methods::SWITCH_CHAIN => self.switch(&params),
            methods::ADD_CHAIN => self.add(&params),
            methods::CALL => self.call(&params),
            methods::SEND_TRANSACTION => self.send(),
            methods::TRANSACTION_RECEIPT => Ok(self.receipt(&params)),
            other => Err(ProviderError::unsupported_method(other)),
        }
    }
}

/// Scripted Phantom wallet.
#[derive(Debug, Clone)]
pub struct MockSolanaWallet {
    public_key: String,
    phantom: bool,
    reject: bool,
}

impl MockSolanaWallet {
    /// A Phantom wallet that connects as `public_key`.
    #[must_use]
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            phantom: true,
            reject: false,
        }
    }

    /// Some other injected Solana object.
    #[must_use]
    pub const fn not_phantom(mut self) -> Self {
        self.phantom = false;
        self
    }

    /// Decline the connection prompt.
    #[must_use]
    pub const fn reject(mut self) -> Self {
        self.reject = true;
        self
    }
}

#[async_trait]
impl SolanaWallet for MockSolanaWallet {
    fn is_phantom(&self) -> bool {
        self.phantom
    }

    async fn connect(&self) -> std::result::Result<String, ProviderError> {
        if self.reject {
            return Err(ProviderError::user_rejected());
        }
        Ok(self.public_key.clone())
    }
}

/// Scripted TronLink.
#[derive(Debug, Clone)]
pub struct MockTronWallet {
    address: Option<String>,
}

impl MockTronWallet {
    /// An unlocked TronLink whose default address is `address`.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }

    /// A locked TronLink.
    #[must_use]
    pub const fn locked() -> Self {
        Self { address: None }
    }
}

#[async_trait]
impl TronWallet for MockTronWallet {
    async fn request_accounts(&self) -> std::result::Result<(), ProviderError> {
        Ok(())
    }

    fn default_address(&self) -> Option<String> {
        self.address.clone()
    }
}

#[derive(Debug)]
struct TokenState {
    name: Option<String>,
    symbol: Option<String>,
    decimals: Option<u8>,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    paused: Option<bool>,
    blacklist: Option<HashSet<Address>>,
    whitelist: Option<HashSet<Address>>,
    whitelist_enabled: Option<bool>,
    owner: Option<Address>,
    failing_balance: bool,
    writes: Vec<WriteCall>,
}

/// In-memory admin token that records every submitted write.
///
/// Reads of a method marked absent fail with `ReadFailed`, as a real
/// binding does when the contract lacks the method.
#[derive(Debug)]
pub struct StubToken {
    address: Address,
    signer: Option<Address>,
    reject_writes: bool,
    write_gate: Option<Arc<Notify>>,
    read_gate: Option<Arc<Notify>>,
    state: Mutex<TokenState>,
}

impl Default for StubToken {
    fn default() -> Self {
        Self::new()
    }
}

impl StubToken {
    /// Address the stub answers as.
    pub const ADDRESS: Address = address!("0x17712ad044d30aff9754c5e98454c3eb1de01b39");
    /// Owner unless configured otherwise.
    pub const DEFAULT_OWNER: Address = address!("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

    /// "Stub Token" (STUB), 18 decimals, every extension present, read-only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            address: Self::ADDRESS,
            signer: None,
            reject_writes: false,
            write_gate: None,
            read_gate: None,
            state: Mutex::new(TokenState {
                name: Some("Stub Token".to_string()),
                symbol: Some("STUB".to_string()),
                decimals: Some(18),
                total_supply: U256::from(1_000_000u64) * U256::from(10u64).pow(U256::from(18u64)),
                balances: HashMap::new(),
                allowances: HashMap::new(),
                paused: Some(false),
                blacklist: Some(HashSet::new()),
                whitelist: Some(HashSet::new()),
                whitelist_enabled: Some(false),
                owner: Some(Self::DEFAULT_OWNER),
                failing_balance: false,
                writes: Vec::new(),
            }),
        }
    }

    fn configure(mut self, f: impl FnOnce(&mut TokenState)) -> Self {
        f(self.state.get_mut().unwrap_or_else(PoisonError::into_inner));
        self
    }

    /// Make the handle write-capable for `signer`.
    #[must_use]
    pub const fn with_signer(mut self, signer: Address) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Decline every write as the wallet user would.
    #[must_use]
    pub const fn reject_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    /// Hold each write until `gate` is notified.
    #[must_use]
    pub fn with_write_gate(mut self, gate: Arc<Notify>) -> Self {
        self.write_gate = Some(gate);
        self
    }

    /// Hold each `balanceOf` read until `gate` is notified.
    #[must_use]
    pub fn with_read_gate(mut self, gate: Arc<Notify>) -> Self {
        self.read_gate = Some(gate);
        self
    }

    /// Identity reads.
    #[must_use]
    pub fn with_identity(self, name: &str, symbol: &str, decimals: u8) -> Self {
        self.configure(|s| {
            s.name = Some(name.to_string());
            s.symbol = Some(symbol.to_string());
            s.decimals = Some(decimals);
        })
    }

    /// `totalSupply()`.
    #[must_use]
    pub fn with_total_supply(self, supply: U256) -> Self {
        self.configure(|s| s.total_supply = supply)
    }

    /// `balanceOf(holder)`.
    #[must_use]
    pub fn with_balance(self, holder: Address, balance: U256) -> Self {
        self.configure(|s| {
            s.balances.insert(holder, balance);
        })
    }

    /// `allowance(owner, spender)`.
    #[must_use]
    pub fn with_allowance(self, owner: Address, spender: Address, amount: U256) -> Self {
        self.configure(|s| {
            s.allowances.insert((owner, spender), amount);
        })
    }

    /// `paused()`.
    #[must_use]
    pub fn with_paused(self, paused: bool) -> Self {
        self.configure(|s| s.paused = Some(paused))
    }

    /// `isWhitelistEnabled()`.
    #[must_use]
    pub fn with_whitelist_enabled(self, enabled: bool) -> Self {
        self.configure(|s| {
            s.whitelist_enabled = Some(enabled);
            s.whitelist.get_or_insert_with(HashSet::new);
        })
    }

    /// Put `account` on the blacklist.
    #[must_use]
    pub fn with_blacklisted(self, account: Address) -> Self {
        self.configure(|s| {
            s.blacklist.get_or_insert_with(HashSet::new).insert(account);
        })
    }

    /// Put `account` on the whitelist.
    #[must_use]
    pub fn with_whitelisted(self, account: Address) -> Self {
        self.configure(|s| {
            s.whitelist.get_or_insert_with(HashSet::new).insert(account);
        })
    }

    /// `owner()`.
    #[must_use]
    pub fn with_owner(self, owner: Address) -> Self {
        self.configure(|s| s.owner = Some(owner))
    }

    /// No `name()`.
    #[must_use]
    pub fn without_name(self) -> Self {
        self.configure(|s| s.name = None)
    }

    /// No `symbol()`.
    #[must_use]
    pub fn without_symbol(self) -> Self {
        self.configure(|s| s.symbol = None)
    }

    /// No `decimals()`.
    #[must_use]
    pub fn without_decimals(self) -> Self {
        self.configure(|s| s.decimals = None)
    }

    /// No `paused()`.
    #[must_use]
    pub fn without_paused(self) -> Self {
        self.configure(|s| s.paused = None)
    }

    /// No `isBlackListed()`.
    #[must_use]
    pub fn without_blacklist(self) -> Self {
        self.configure(|s| s.blacklist = None)
    }

    /// No `isWhiteListed()` or `isWhitelistEnabled()`.
    #[must_use]
    pub fn without_whitelist(self) -> Self {
        self.configure(|s| {
            s.whitelist = None;
            s.whitelist_enabled = None;
        })
    }

    /// No `owner()`.
    #[must_use]
    pub fn without_owner(self) -> Self {
        self.configure(|s| s.owner = None)
    }

    /// `balanceOf()` reverts.
    #[must_use]
    pub fn failing_balance(self) -> Self {
        self.configure(|s| s.failing_balance = true)
    }

    /// Overwrite a balance, as another transaction on chain would.
    pub fn set_balance(&self, holder: Address, balance: U256) {
        lock(&self.state).balances.insert(holder, balance);
    }

    /// Overwrite the owner, as another transaction on chain would.
    pub fn set_owner(&self, owner: Address) {
        lock(&self.state).owner = Some(owner);
    }

    /// Every write that reached the contract.
    #[must_use]
    pub fn writes(&self) -> Vec<WriteCall> {
        lock(&self.state).writes.clone()
    }

    fn absent(method: &str) -> InteractionError {
        InteractionError::read_failed(format!("{method}: no return data (method absent)"))
    }

    fn apply(state: &mut TokenState, caller: Address, call: &WriteCall) {
        let balance = |state: &mut TokenState, account: Address| -> U256 {
            state.balances.get(&account).copied().unwrap_or_default()
        };
        match *call {
            WriteCall::Transfer { to, amount } => {
                let from = balance(state, caller).saturating_sub(amount);
                state.balances.insert(caller, from);
                let to_balance = balance(state, to).saturating_add(amount);
                state.balances.insert(to, to_balance);
            }
            WriteCall::TransferFrom { from, to, amount } => {
                let source = balance(state, from).saturating_sub(amount);
                state.balances.insert(from, source);
                let dest = balance(state, to).saturating_add(amount);
                state.balances.insert(to, dest);
                let allowance = state.allowances.entry((from, caller)).or_default();
                *allowance = allowance.saturating_sub(amount);
            }
            WriteCall::Approve { spender, amount } => {
                state.allowances.insert((caller, spender), amount);
            }
            WriteCall::Mint { to, amount } => {
                let to_balance = balance(state, to).saturating_add(amount);
                state.balances.insert(to, to_balance);
                state.total_supply = state.total_supply.saturating_add(amount);
            }
            WriteCall::Burn { amount } => {
                let remaining = balance(state, caller).saturating_sub(amount);
                state.balances.insert(caller, remaining);
                state.total_supply = state.total_supply.saturating_sub(amount);
            }
            WriteCall::AddBlackList { account } => {
                state.blacklist.get_or_insert_with(HashSet::new).insert(account);
            }
            WriteCall::RemoveBlackList { account } => {
                if let Some(list) = state.blacklist.as_mut() {
                    list.remove(&account);
                }
            }
            WriteCall::AddWhiteList { account } => {
                state.whitelist.get_or_insert_with(HashSet::new).insert(account);
            }
            WriteCall::RemoveWhiteList { account } => {
                if let Some(list) = state.whitelist.as_mut() {
                    list.remove(&account);
                }
            }
            WriteCall::EnableWhiteList => state.whitelist_enabled = Some(true),
            WriteCall::DisableWhiteList => state.whitelist_enabled = Some(false),
            WriteCall::Pause => state.paused = Some(true),
            WriteCall::Unpause => state.paused = Some(false),
            WriteCall::TransferOwnership { new_owner } => state.owner = Some(new_owner),
        }
    }
}

#[async_trait]
impl TokenContract for StubToken {
    fn address(&self) -> Address {
        self.address
    }

    fn can_write(&self) -> bool {
        self.signer.is_some()
    }

    fn signer_address(&self) -> Option<Address> {
        self.signer
    }

    async fn name(&self) -> Result<String> {
        lock(&self.state).name.clone().ok_or_else(|| Self::absent("name()"))
    }

    async fn symbol(&self) -> Result<String> {
        lock(&self.state).symbol.clone().ok_or_else(|| Self::absent("symbol()"))
    }

    async fn decimals(&self) -> Result<u8> {
        lock(&self.state).decimals.ok_or_else(|| Self::absent("decimals()"))
    }

    async fn total_supply(&self) -> Result<U256> {
        Ok(lock(&self.state).total_supply)
    }

    async fn balance_of(&self, holder: Address) -> Result<U256> {
        if let Some(gate) = &self.read_gate {
            gate.notified().await;
        }
        let state = lock(&self.state);
        if state.failing_balance {
            return Err(InteractionError::read_failed("balanceOf(address): execution reverted"));
        }
        Ok(state.balances.get(&holder).copied().unwrap_or_default())
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        Ok(lock(&self.state)
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn paused(&self) -> Result<bool> {
        lock(&self.state).paused.ok_or_else(|| Self::absent("paused()"))
    }

    async fn is_black_listed(&self, account: Address) -> Result<bool> {
        lock(&self.state)
            .blacklist
            .as_ref()
            .map(|list| list.contains(&account))
            .ok_or_else(|| Self::absent("isBlackListed(address)"))
    }

    async fn is_white_listed(&self, account: Address) -> Result<bool> {
        lock(&self.state)
            .whitelist
            .as_ref()
            .map(|list| list.contains(&account))
            .ok_or_else(|| Self::absent("isWhiteListed(address)"))
    }

    async fn is_whitelist_enabled(&self) -> Result<bool> {
        lock(&self.state)
            .whitelist_enabled
            .ok_or_else(|| Self::absent("isWhitelistEnabled()"))
    }

    async fn owner(&self) -> Result<Address> {
        lock(&self.state).owner.ok_or_else(|| Self::absent("owner()"))
    }

    async fn submit(&self, call: &WriteCall) -> Result<TxReceipt> {
        let Some(caller) = self.signer else {
            return Err(InteractionError::signer_required(call.name()));
        };
        let block = {
            let mut state = lock(&self.state);
            state.writes.push(call.clone());
            state.writes.len()
        };
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
        if self.reject_writes {
            return Err(InteractionError::rejected_by_user("User rejected the request."));
        }

        Self::apply(&mut lock(&self.state), caller, call);
        let block = u8::try_from(block).unwrap_or(u8::MAX);
        Ok(TxReceipt {
            hash: B256::with_last_byte(block),
            block_number: Some(u64::from(block)),
            success: true,
        })
    }
}

/// EVM adapter over a [`MockWallet`] that binds every contract address to
/// one shared [`StubToken`].
#[derive(Debug, Clone)]
pub struct StubAdapter {
    wallet: EvmAdapter,
    token: Arc<StubToken>,
}

impl StubAdapter {
    /// Adapter connecting through `wallet` and binding to `token`.
    #[must_use]
    pub fn new(wallet: Arc<MockWallet>, token: Arc<StubToken>) -> Self {
        Self {
            wallet: EvmAdapter::new(Some(wallet)),
            token,
        }
    }
}

#[async_trait]
impl ChainAdapter for StubAdapter {
    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    async fn ensure_network(&self, network: &ChainDescriptor) -> Result<SwitchOutcome> {
        self.wallet.ensure_network(network).await
    }

    async fn connect(&self) -> Result<WalletHandle> {
        self.wallet.connect().await
    }

    async fn active_chain_id(&self, wallet: &WalletHandle) -> Result<Option<u64>> {
        self.wallet.active_chain_id(wallet).await
    }

    async fn bind(
        &self,
        _wallet: &WalletHandle,
        contract: &str,
        _options: &BindOptions,
    ) -> Result<Arc<dyn TokenContract>> {
        self.validate_address(contract)?;
        Ok(self.token.clone())
    }
}
