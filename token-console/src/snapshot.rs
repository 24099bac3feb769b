//! Cached token state and optimistic deltas.

use alloy::primitives::{Address, U256};
use futures::join;
use tracing::debug;

use crate::amount::AmountCodec;
use crate::contract::{ContractCapabilityProbe, TokenContract, TokenExtensions, WriteCall};
use crate::error::{InteractionError, Result};

/// Point-in-time view of a token as seen by one holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSnapshot {
    /// Account the balance and owner flag refer to.
    pub holder: Address,
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Decimal count, fixed before any amount is formatted.
    pub decimals: u8,
    /// Total supply in base units.
    pub total_supply: U256,
    /// Holder balance in base units.
    pub balance: U256,
    /// `paused()`, false when the token is not pausable.
    pub paused: bool,
    /// `isWhitelistEnabled()`, false when the token has no whitelist.
    pub whitelist_enabled: bool,
    /// Holder is the current `owner()`. Only gates UI controls.
    pub is_owner: bool,
    /// Optional extensions that answered.
    pub extensions: TokenExtensions,
    /// Local deltas were applied and no full reload has happened since.
    pub reconcile_pending: bool,
}

impl TokenSnapshot {
    /// Codec for this token's amounts.
    #[must_use]
    pub fn codec(&self) -> AmountCodec {
        // decimals were range-checked on load
        AmountCodec::new(self.decimals).unwrap_or_default()
    }

    /// Total supply as a human decimal string.
    #[must_use]
    pub fn total_supply_display(&self) -> String {
        self.codec().format(self.total_supply)
    }

    /// Holder balance as a human decimal string.
    #[must_use]
    pub fn balance_display(&self) -> String {
        self.codec().format(self.balance)
    }

    /// Whether owner-only controls should be offered.
    #[must_use]
    pub const fn can_administer(&self) -> bool {
        self.is_owner
    }

    /// Whether the burn control should be offered. Follows ownership like
    /// the other admin controls; submission itself is not owner-gated.
    #[must_use]
    pub const fn can_burn(&self) -> bool {
        self.is_owner
    }

    /// Apply optimistic deltas and mark the snapshot for reconciliation.
    pub fn apply(&mut self, deltas: &[SnapshotDelta]) {
        for delta in deltas {
            match *delta {
                SnapshotDelta::Debit(amount) => self.balance = self.balance.saturating_sub(amount),
                SnapshotDelta::Credit(amount) => self.balance = self.balance.saturating_add(amount),
                SnapshotDelta::SupplyIncrease(amount) => {
                    self.total_supply = self.total_supply.saturating_add(amount);
                }
                SnapshotDelta::SupplyDecrease(amount) => {
                    self.total_supply = self.total_supply.saturating_sub(amount);
                }
                SnapshotDelta::Paused(paused) => self.paused = paused,
                SnapshotDelta::WhitelistEnabled(enabled) => self.whitelist_enabled = enabled,
                SnapshotDelta::OwnershipReleased => self.is_owner = false,
            }
        }
        if !deltas.is_empty() {
            self.reconcile_pending = true;
        }
    }
}

/// A locally inferable effect of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotDelta {
    /// Holder balance decreased.
    Debit(U256),
    /// Holder balance increased.
    Credit(U256),
    /// Total supply increased.
    SupplyIncrease(U256),
    /// Total supply decreased.
    SupplyDecrease(U256),
    /// Pause flag set.
    Paused(bool),
    /// Whitelist flag set.
    WhitelistEnabled(bool),
    /// The holder handed ownership to someone else.
    OwnershipReleased,
}

impl SnapshotDelta {
    /// Deltas implied by `call` having succeeded for `caller`.
    #[must_use]
    pub fn for_write(call: &WriteCall, caller: Address) -> Vec<Self> {
        match *call {
            WriteCall::Transfer { to, amount } if to != caller => vec![Self::Debit(amount)],
            WriteCall::TransferFrom { from, to, amount } if from != to => {
                if from == caller {
                    vec![Self::Debit(amount)]
                } else if to == caller {
                    vec![Self::Credit(amount)]
                } else {
                    Vec::new()
                }
            }
            WriteCall::Mint { to, amount } => {
                let mut deltas = vec![Self::SupplyIncrease(amount)];
                if to == caller {
                    deltas.push(Self::Credit(amount));
                }
                deltas
            }
            WriteCall::Burn { amount } => vec![Self::Debit(amount), Self::SupplyDecrease(amount)],
            WriteCall::Pause => vec![Self::Paused(true)],
            WriteCall::Unpause => vec![Self::Paused(false)],
            WriteCall::EnableWhiteList => vec![Self::WhitelistEnabled(true)],
            WriteCall::DisableWhiteList => vec![Self::WhitelistEnabled(false)],
            WriteCall::TransferOwnership { new_owner } if new_owner != caller => {
                vec![Self::OwnershipReleased]
            }
            _ => Vec::new(),
        }
    }
}

/// An optional read: a failure means "extension absent".
fn optional<T: Default>(method: &str, result: Result<T>) -> (T, bool) {
    match result {
        Ok(value) => (value, true),
        Err(err) => {
            debug!(method, error = %err.message, "optional read absent, using default");
            (T::default(), false)
        }
    }
}

/// Load a full snapshot for `holder`.
///
/// Identity, decimals and supply come from the capability probe and are
/// mandatory; the balance is mandatory; pause, whitelist and ownership are
/// optional and default to `false`. The non-identity reads run
/// concurrently.
///
/// # Errors
///
/// Returns `ReadFailed` if the contract is not a token or a mandatory read
/// fails.
pub async fn load(contract: &dyn TokenContract, holder: Address) -> Result<TokenSnapshot> {
    let caps = ContractCapabilityProbe::probe(contract).await.into_result()?;
    if AmountCodec::new(caps.decimals).is_err() {
        return Err(InteractionError::read_failed(format!(
            "decimals() returned {}, which cannot be represented",
            caps.decimals
        )));
    }

    let (balance, paused, whitelist, owner) = join!(
        contract.balance_of(holder),
        contract.paused(),
        contract.is_whitelist_enabled(),
        contract.owner(),
    );
    let balance = balance?;
    let (paused, pausable) = optional("paused()", paused);
    let (whitelist_enabled, whitelist) = optional("isWhitelistEnabled()", whitelist);
    let (owner, ownable) = optional("owner()", owner.map(Some));

    let snapshot = TokenSnapshot {
        holder,
        name: caps.name,
        symbol: caps.symbol,
        decimals: caps.decimals,
        total_supply: caps.total_supply,
        balance,
        paused,
        whitelist_enabled,
        is_owner: owner == Some(holder),
        extensions: TokenExtensions {
            pausable,
            whitelist,
            ownable,
        },
        reconcile_pending: false,
    };
    debug!(
        contract = %contract.address(),
        symbol = %snapshot.symbol,
        balance = %snapshot.balance,
        paused = snapshot.paused,
        is_owner = snapshot.is_owner,
        "snapshot loaded",
    );
    Ok(snapshot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::amount::parse_units;
    use crate::error::InteractionErrorKind;
    use crate::testing::StubToken;

    const HOLDER: Address = address!("0x1000000000000000000000000000000000000001");
    const OTHER: Address = address!("0x2000000000000000000000000000000000000002");

    fn tokens(n: &str) -> U256 {
        parse_units(n, 18).unwrap()
    }

    #[tokio::test]
    async fn missing_paused_defaults_to_false() {
        let token = StubToken::new()
            .with_balance(HOLDER, tokens("100"))
            .without_paused();
        let snapshot = load(&token, HOLDER).await.unwrap();
        assert!(!snapshot.paused);
        assert!(!snapshot.extensions.pausable);
        assert_eq!(snapshot.balance_display(), "100");
    }

    #[tokio::test]
    async fn owner_flag_and_extensions() {
        let token = StubToken::new()
            .with_owner(HOLDER)
            .with_paused(true)
            .with_whitelist_enabled(true);
        let snapshot = load(&token, HOLDER).await.unwrap();
        assert!(snapshot.is_owner);
        assert!(snapshot.can_administer());
        assert!(snapshot.can_burn());
        assert!(snapshot.paused);
        assert!(snapshot.whitelist_enabled);
        assert!(snapshot.extensions.ownable && snapshot.extensions.whitelist);

        let snapshot = load(&token, OTHER).await.unwrap();
        assert!(!snapshot.is_owner);
    }

    #[tokio::test]
    async fn missing_owner_is_not_owner() {
        let token = StubToken::new().without_owner();
        let snapshot = load(&token, HOLDER).await.unwrap();
        assert!(!snapshot.is_owner);
        assert!(!snapshot.extensions.ownable);
    }

    #[tokio::test]
    async fn failed_balance_is_read_failed() {
        let token = StubToken::new().failing_balance();
        let err = load(&token, HOLDER).await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::ReadFailed);
    }

    #[tokio::test]
    async fn decimals_fix_formatting() {
        let token = StubToken::new()
            .with_identity("USD Coin", "USDC", 6)
            .with_total_supply(U256::from(1_234_500_000u64));
        let snapshot = load(&token, HOLDER).await.unwrap();
        assert_eq!(snapshot.total_supply_display(), "1234.5");
    }

    #[test]
    fn transfer_deltas() {
        let amount = tokens("10");
        assert_eq!(
            SnapshotDelta::for_write(&WriteCall::Transfer { to: OTHER, amount }, HOLDER),
            vec![SnapshotDelta::Debit(amount)]
        );
        assert!(SnapshotDelta::for_write(&WriteCall::Transfer { to: HOLDER, amount }, HOLDER).is_empty());
    }

    #[test]
    fn mint_and_burn_deltas() {
        let amount = tokens("5");
        let mint_self = SnapshotDelta::for_write(&WriteCall::Mint { to: HOLDER, amount }, HOLDER);
        assert_eq!(
            mint_self,
            vec![SnapshotDelta::SupplyIncrease(amount), SnapshotDelta::Credit(amount)]
        );
        let burn = SnapshotDelta::for_write(&WriteCall::Burn { amount }, HOLDER);
        assert_eq!(
            burn,
            vec![SnapshotDelta::Debit(amount), SnapshotDelta::SupplyDecrease(amount)]
        );
    }

    #[test]
    fn apply_marks_reconcile_pending() {
        let mut snapshot = TokenSnapshot {
            holder: HOLDER,
            name: "T".into(),
            symbol: "T".into(),
            decimals: 18,
            total_supply: tokens("1000"),
            balance: tokens("100"),
            paused: false,
            whitelist_enabled: false,
            is_owner: true,
            extensions: TokenExtensions::default(),
            reconcile_pending: false,
        };
        snapshot.apply(&[]);
        assert!(!snapshot.reconcile_pending);

        snapshot.apply(&[
            SnapshotDelta::Debit(tokens("10")),
            SnapshotDelta::Paused(true),
            SnapshotDelta::OwnershipReleased,
        ]);
        assert_eq!(snapshot.balance_display(), "90");
        assert!(snapshot.paused);
        assert!(!snapshot.is_owner);
        assert!(snapshot.reconcile_pending);

        // never below zero
        snapshot.apply(&[SnapshotDelta::Debit(tokens("1000"))]);
        assert_eq!(snapshot.balance, U256::ZERO);
    }
}
