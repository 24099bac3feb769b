//! Local validation of writes against freshly read on-chain state.
//!
//! A write that would certainly revert is stopped here with
//! `PreflightRejected(reason)` and never reaches the wallet. Mandatory reads
//! (balance, allowance, owner) must succeed; optional ones (pause,
//! blacklist, whitelist) are inconclusive when they fail, and the check
//! proceeds.

use alloy::primitives::{Address, U256};
use futures::join;
use tracing::{debug, warn};

use crate::contract::{TokenContract, WriteCall};
use crate::error::{InteractionError, Result};

/// Rejection reasons.
pub mod reasons {
    /// Zero or negative amount.
    pub const NON_POSITIVE_AMOUNT: &str = "amount must be greater than zero";
    /// Balance below the amount.
    pub const INSUFFICIENT_BALANCE: &str = "insufficient balance";
    /// Allowance below the amount.
    pub const INSUFFICIENT_ALLOWANCE: &str = "insufficient allowance";
    /// Token is paused.
    pub const PAUSED: &str = "token transfers are paused";
    /// Caller is blacklisted.
    pub const BLACKLISTED: &str = "caller is blacklisted";
    /// Whitelist on and caller absent from it.
    pub const NOT_WHITELISTED: &str = "whitelist is enabled and caller is not whitelisted";
    /// Caller is not `owner()`.
    pub const NOT_OWNER: &str = "caller is not the contract owner";
    /// `owner()` could not be read.
    pub const OWNER_UNVERIFIED: &str = "unable to verify contract ownership";
    /// Recipient is the zero address.
    pub const ZERO_DESTINATION: &str = "destination is the zero address";
    /// Spender is the zero address.
    pub const ZERO_SPENDER: &str = "spender is the zero address";
    /// New owner is the zero address.
    pub const ZERO_OWNER: &str = "new owner is the zero address";
}

/// Validates writes for one caller against one contract.
#[derive(Clone, Copy)]
pub struct PreflightValidator<'a> {
    contract: &'a dyn TokenContract,
    caller: Address,
}

impl<'a> PreflightValidator<'a> {
    /// Create a validator.
    #[must_use]
    pub const fn new(contract: &'a dyn TokenContract, caller: Address) -> Self {
        Self { contract, caller }
    }

    /// Check `call`. `Ok(())` means the write may be submitted.
    ///
    /// # Errors
    ///
    /// `PreflightRejected` with a reason from [`reasons`], or `ReadFailed`
    /// if a mandatory read fails.
    pub async fn check(&self, call: &WriteCall) -> Result<()> {
        let mut verdict = match *call {
            WriteCall::Transfer { to, amount } => {
                non_zero(to, reasons::ZERO_DESTINATION)?;
                positive(amount)?;
                self.check_transfer(amount).await
            }
            WriteCall::TransferFrom { from, to, amount } => {
                non_zero(to, reasons::ZERO_DESTINATION)?;
                positive(amount)?;
                self.check_transfer_from(from, amount).await
            }
            WriteCall::Approve { spender, .. } => non_zero(spender, reasons::ZERO_SPENDER),
            WriteCall::Burn { amount } => {
                positive(amount)?;
                let balance = self.contract.balance_of(self.caller).await?;
                at_least(balance, amount, reasons::INSUFFICIENT_BALANCE)
            }
            WriteCall::Mint { to, amount } => {
                non_zero(to, reasons::ZERO_DESTINATION)?;
                positive(amount)
            }
            WriteCall::TransferOwnership { new_owner } => non_zero(new_owner, reasons::ZERO_OWNER),
            WriteCall::AddBlackList { .. }
            | WriteCall::RemoveBlackList { .. }
            | WriteCall::AddWhiteList { .. }
            | WriteCall::RemoveWhiteList { .. }
            | WriteCall::EnableWhiteList
            | WriteCall::DisableWhiteList
            | WriteCall::Pause
            | WriteCall::Unpause => Ok(()),
        };
        if verdict.is_ok() && call.requires_owner() {
            verdict = self.check_owner().await;
        }

        match &verdict {
            Ok(()) => debug!(method = call.name(), caller = %self.caller, "preflight passed"),
            Err(err) => debug!(method = call.name(), caller = %self.caller, reason = %err.message, "preflight rejected"),
        }
        verdict
    }

    async fn check_transfer(&self, amount: U256) -> Result<()> {
        let contract = self.contract;
        let caller = self.caller;
        let (balance, paused, blacklisted, whitelist_enabled, whitelisted) = join!(
            contract.balance_of(caller),
            contract.paused(),
            contract.is_black_listed(caller),
            contract.is_whitelist_enabled(),
            contract.is_white_listed(caller),
        );

        at_least(balance?, amount, reasons::INSUFFICIENT_BALANCE)?;
        if inconclusive("paused()", paused) == Some(true) {
            return Err(InteractionError::preflight(reasons::PAUSED));
        }
        if inconclusive("isBlackListed()", blacklisted) == Some(true) {
            return Err(InteractionError::preflight(reasons::BLACKLISTED));
        }
        if inconclusive("isWhitelistEnabled()", whitelist_enabled) == Some(true)
            && inconclusive("isWhiteListed()", whitelisted) == Some(false)
        {
            return Err(InteractionError::preflight(reasons::NOT_WHITELISTED));
        }
        Ok(())
    }

    async fn check_transfer_from(&self, from: Address, amount: U256) -> Result<()> {
        let contract = self.contract;
        let (balance, allowance, paused) = join!(
            contract.balance_of(from),
            contract.allowance(from, self.caller),
            contract.paused(),
        );

        at_least(balance?, amount, reasons::INSUFFICIENT_BALANCE)?;
        at_least(allowance?, amount, reasons::INSUFFICIENT_ALLOWANCE)?;
        if inconclusive("paused()", paused) == Some(true) {
            return Err(InteractionError::preflight(reasons::PAUSED));
        }
        Ok(())
    }

    /// Authorization is never inferred: an unreadable owner rejects.
    async fn check_owner(&self) -> Result<()> {
        match self.contract.owner().await {
            Ok(owner) if owner == self.caller => Ok(()),
            Ok(owner) => {
                debug!(%owner, caller = %self.caller, "caller is not the owner");
                Err(InteractionError::preflight(reasons::NOT_OWNER))
            }
            Err(err) => {
                warn!(error = %err.message, "owner() unreadable during preflight");
                Err(InteractionError::preflight(reasons::OWNER_UNVERIFIED))
            }
        }
    }
}

impl std::fmt::Debug for PreflightValidator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreflightValidator")
            .field("contract", &self.contract.address())
            .field("caller", &self.caller)
            .finish()
    }
}

fn positive(amount: U256) -> Result<()> {
    if amount.is_zero() {
        return Err(InteractionError::preflight(reasons::NON_POSITIVE_AMOUNT));
    }
    Ok(())
}

fn non_zero(address: Address, reason: &str) -> Result<()> {
    if address.is_zero() {
        return Err(InteractionError::preflight(reason));
    }
    Ok(())
}

fn at_least(available: U256, amount: U256, reason: &str) -> Result<()> {
    if available < amount {
        return Err(InteractionError::preflight(reason));
    }
    Ok(())
}

/// An optional check's read; `None` when it failed.
fn inconclusive<T>(method: &str, result: Result<T>) -> Option<T> {
    result
        .inspect_err(|err| warn!(method, error = %err.message, "optional preflight check inconclusive, proceeding"))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::amount::parse_units;
    use crate::error::InteractionErrorKind;
    use crate::testing::StubToken;

    const CALLER: Address = address!("0x1000000000000000000000000000000000000001");
    const OTHER: Address = address!("0x2000000000000000000000000000000000000002");

    fn tokens(n: &str) -> U256 {
        parse_units(n, 18).unwrap()
    }

    async fn reason(token: &StubToken, call: WriteCall) -> String {
        let err = PreflightValidator::new(token, CALLER)
            .check(&call)
            .await
            .unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::PreflightRejected);
        err.message
    }

    fn transfer(amount: &str) -> WriteCall {
        WriteCall::Transfer {
            to: OTHER,
            amount: tokens(amount),
        }
    }

    #[tokio::test]
    async fn transfer_passes_with_funds() {
        let token = StubToken::new().with_balance(CALLER, tokens("100"));
        PreflightValidator::new(&token, CALLER)
            .check(&transfer("100"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn transfer_rejections() {
        let token = StubToken::new().with_balance(CALLER, tokens("100"));
        assert_eq!(reason(&token, transfer("150")).await, reasons::INSUFFICIENT_BALANCE);
        assert_eq!(reason(&token, transfer("0")).await, reasons::NON_POSITIVE_AMOUNT);
        assert_eq!(
            reason(&token, WriteCall::Transfer { to: Address::ZERO, amount: tokens("1") }).await,
            reasons::ZERO_DESTINATION
        );

        let paused = StubToken::new().with_balance(CALLER, tokens("100")).with_paused(true);
        assert_eq!(reason(&paused, transfer("1")).await, reasons::PAUSED);

        let blacklisted = StubToken::new()
            .with_balance(CALLER, tokens("100"))
            .with_blacklisted(CALLER);
        assert_eq!(reason(&blacklisted, transfer("1")).await, reasons::BLACKLISTED);

        let whitelist = StubToken::new()
            .with_balance(CALLER, tokens("100"))
            .with_whitelist_enabled(true);
        assert_eq!(reason(&whitelist, transfer("1")).await, reasons::NOT_WHITELISTED);
    }

    #[tokio::test]
    async fn whitelisted_caller_passes() {
        let token = StubToken::new()
            .with_balance(CALLER, tokens("100"))
            .with_whitelist_enabled(true)
            .with_whitelisted(CALLER);
        assert!(PreflightValidator::new(&token, CALLER).check(&transfer("1")).await.is_ok());
    }

    #[tokio::test]
    async fn absent_optional_methods_proceed() {
        let token = StubToken::new()
            .with_balance(CALLER, tokens("100"))
            .without_paused()
            .without_blacklist()
            .without_whitelist();
        assert!(PreflightValidator::new(&token, CALLER).check(&transfer("1")).await.is_ok());
    }

    #[tokio::test]
    async fn mint_rechecks_owner() {
        let token = StubToken::new().with_owner(OTHER);
        let mint = WriteCall::Mint { to: CALLER, amount: tokens("1") };
        assert_eq!(reason(&token, mint.clone()).await, reasons::NOT_OWNER);

        let token = StubToken::new().with_owner(CALLER);
        assert!(PreflightValidator::new(&token, CALLER).check(&mint).await.is_ok());
    }

    #[tokio::test]
    async fn unreadable_owner_rejects() {
        let token = StubToken::new().without_owner();
        assert_eq!(reason(&token, WriteCall::Pause).await, reasons::OWNER_UNVERIFIED);
    }

    #[tokio::test]
    async fn burn_is_not_owner_gated() {
        let token = StubToken::new()
            .with_owner(OTHER)
            .with_balance(CALLER, tokens("10"));
        let burn = WriteCall::Burn { amount: tokens("4") };
        assert!(PreflightValidator::new(&token, CALLER).check(&burn).await.is_ok());

        let too_much = WriteCall::Burn { amount: tokens("11") };
        assert_eq!(reason(&token, too_much).await, reasons::INSUFFICIENT_BALANCE);
    }

    #[tokio::test]
    async fn transfer_from_needs_allowance() {
        let token = StubToken::new()
            .with_balance(OTHER, tokens("50"))
            .with_allowance(OTHER, CALLER, tokens("5"));
        let call = |amount| WriteCall::TransferFrom {
            from: OTHER,
            to: CALLER,
            amount: tokens(amount),
        };
        assert!(PreflightValidator::new(&token, CALLER).check(&call("5")).await.is_ok());
        assert_eq!(reason(&token, call("6")).await, reasons::INSUFFICIENT_ALLOWANCE);
        assert_eq!(reason(&token, call("60")).await, reasons::INSUFFICIENT_BALANCE);
    }

    #[tokio::test]
    async fn approve_only_checks_spender() {
        let token = StubToken::new();
        let revoke = WriteCall::Approve { spender: OTHER, amount: U256::ZERO };
        assert!(PreflightValidator::new(&token, CALLER).check(&revoke).await.is_ok());
        assert_eq!(
            reason(&token, WriteCall::Approve { spender: Address::ZERO, amount: U256::from(1) }).await,
            reasons::ZERO_SPENDER
        );
    }

    #[tokio::test]
    async fn ownership_transfer_rejects_zero() {
        let token = StubToken::new().with_owner(CALLER);
        assert_eq!(
            reason(&token, WriteCall::TransferOwnership { new_owner: Address::ZERO }).await,
            reasons::ZERO_OWNER
        );
    }

    #[tokio::test]
    async fn failed_balance_read_is_read_failed() {
        let token = StubToken::new().failing_balance();
        let err = PreflightValidator::new(&token, CALLER)
            .check(&transfer("1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::ReadFailed);
    }

    #[tokio::test]
    async fn owner_check_follows_requires_owner() {
        let token = StubToken::new()
            .with_owner(OTHER)
            .with_balance(CALLER, tokens("10"))
            .with_balance(OTHER, tokens("10"))
            .with_allowance(OTHER, CALLER, tokens("10"));
        let one = tokens("1");
        let calls = [
            WriteCall::Transfer { to: OTHER, amount: one },
            WriteCall::Approve { spender: OTHER, amount: one },
            WriteCall::TransferFrom { from: OTHER, to: CALLER, amount: one },
            WriteCall::Burn { amount: one },
            WriteCall::Mint { to: OTHER, amount: one },
            WriteCall::AddBlackList { account: OTHER },
            WriteCall::RemoveWhiteList { account: OTHER },
            WriteCall::EnableWhiteList,
            WriteCall::Unpause,
            WriteCall::TransferOwnership { new_owner: OTHER },
        ];

        for call in calls {
            let verdict = PreflightValidator::new(&token, CALLER).check(&call).await;
            if call.requires_owner() {
                assert_eq!(verdict.unwrap_err().message, reasons::NOT_OWNER, "{}", call.name());
            } else {
                assert!(verdict.is_ok(), "{} should not need the owner", call.name());
            }
        }
    }
}
