//! Token contract bindings.
//!
//! A [`TokenContract`] is the typed read/write surface of one deployed
//! token, bound to either a read-only provider or a signer. Handles are
//! rebuilt whenever the wallet or the contract address changes; they are
//! never mutated in place.

use std::fmt;
use std::time::Duration;

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::error::Result;

mod erc20;
mod probe;

pub use erc20::{Erc20Binding, abi};
pub use probe::{ContractCapabilityProbe, ProbeOutcome, TokenCapabilities, TokenExtensions};

/// Outcome of a mined write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub hash: B256,
    /// Block the transaction was mined in.
    pub block_number: Option<u64>,
    /// Whether execution succeeded (status 1).
    pub success: bool,
}

/// Settings applied to every write issued through a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    /// Gas limit attached to writes; `None` leaves estimation to the wallet.
    pub gas_limit: Option<u64>,
    /// Delay between receipt polls.
    pub receipt_poll_interval: Duration,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            gas_limit: Some(200_000),
            receipt_poll_interval: Duration::from_millis(1500),
        }
    }
}

impl From<&crate::config::SessionConfig> for BindOptions {
    fn from(config: &crate::config::SessionConfig) -> Self {
        Self {
            gas_limit: config.gas_limit,
            receipt_poll_interval: config.receipt_poll_interval(),
        }
    }
}

/// A state-changing token call with its decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    /// `transfer(to, amount)`.
    Transfer {
        /// Recipient.
        to: Address,
        /// Base units.
        amount: U256,
    },
    /// `approve(spender, amount)`.
    Approve {
        /// Spender.
        spender: Address,
        /// Base units.
        amount: U256,
    },
    /// `transferFrom(from, to, amount)`.
    TransferFrom {
        /// Source account.
        from: Address,
        /// Recipient.
        to: Address,
        /// Base units.
        amount: U256,
    },
    /// `mint(to, amount)`.
    Mint {
        /// Recipient.
        to: Address,
        /// Base units.
        amount: U256,
    },
    /// `burn(amount)` from the caller's balance.
    Burn {
        /// Base units.
        amount: U256,
    },
    /// `addBlackList(account)`.
    AddBlackList {
        /// Target account.
        account: Address,
    },
    /// `removeBlackList(account)`.
    RemoveBlackList {
        /// Target account.
        account: Address,
    },
    /// `addWhiteList(account)`.
    AddWhiteList {
        /// Target account.
        account: Address,
    },
    /// `removeWhiteList(account)`.
    RemoveWhiteList {
        /// Target account.
        account: Address,
    },
    /// `enableWhiteList()`.
    EnableWhiteList,
    /// `disableWhiteList()`.
    DisableWhiteList,
    /// `pause()`.
    Pause,
    /// `unpause()`.
    Unpause,
    /// `transferOwnership(newOwner)`.
    TransferOwnership {
        /// Incoming owner.
        new_owner: Address,
    },
}

impl WriteCall {
    /// Solidity method name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::TransferFrom { .. } => "transferFrom",
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
            Self::AddBlackList { .. } => "addBlackList",
            Self::RemoveBlackList { .. } => "removeBlackList",
            Self::AddWhiteList { .. } => "addWhiteList",
            Self::RemoveWhiteList { .. } => "removeWhiteList",
            Self::EnableWhiteList => "enableWhiteList",
            Self::DisableWhiteList => "disableWhiteList",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::TransferOwnership { .. } => "transferOwnership",
        }
    }

    /// Whether only the contract owner may issue this call.
    #[must_use]
    pub const fn requires_owner(&self) -> bool {
        !matches!(
            self,
            Self::Transfer { .. } | Self::Approve { .. } | Self::TransferFrom { .. } | Self::Burn { .. }
        )
    }

    /// ABI-encoded calldata.
    #[must_use]
    pub fn calldata(&self) -> Bytes {
        let encoded = match *self {
            Self::Transfer { to, amount } => abi::transferCall { to, amount }.abi_encode(),
            Self::Approve { spender, amount } => abi::approveCall { spender, amount }.abi_encode(),
            Self::TransferFrom { from, to, amount } => {
                abi::transferFromCall { from, to, amount }.abi_encode()
            }
            Self::Mint { to, amount } => abi::mintCall { to, amount }.abi_encode(),
            Self::Burn { amount } => abi::burnCall { amount }.abi_encode(),
            Self::AddBlackList { account } => abi::addBlackListCall { account }.abi_encode(),
            Self::RemoveBlackList { account } => abi::removeBlackListCall { account }.abi_encode(),
            Self::AddWhiteList { account } => abi::addWhiteListCall { account }.abi_encode(),
            Self::RemoveWhiteList { account } => abi::removeWhiteListCall { account }.abi_encode(),
            Self::EnableWhiteList => abi::enableWhiteListCall {}.abi_encode(),
            Self::DisableWhiteList => abi::disableWhiteListCall {}.abi_encode(),
            Self::Pause => abi::pauseCall {}.abi_encode(),
            Self::Unpause => abi::unpauseCall {}.abi_encode(),
            Self::TransferOwnership { new_owner } => {
                abi::transferOwnershipCall { newOwner: new_owner }.abi_encode()
            }
        };
        Bytes::from(encoded)
    }
}

impl fmt::Display for WriteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed surface of an admin-enabled ERC-20 token.
///
/// Reads fail with `ReadFailed` when the call reverts or the method does
/// not exist. The pause, blacklist, whitelist and ownership reads are
/// optional extensions; callers decide the default to substitute.
///
/// Every write requires a signer-backed handle and fails with
/// `SignerRequired` before any network call otherwise.
#[async_trait]
pub trait TokenContract: Send + Sync {
    /// Contract address.
    fn address(&self) -> Address;

    /// Whether the handle was built from a signer.
    fn can_write(&self) -> bool;

    /// The signer's account, for write-capable handles.
    fn signer_address(&self) -> Option<Address>;

    /// `name()`.
    async fn name(&self) -> Result<String>;
    /// `symbol()`.
    async fn symbol(&self) -> Result<String>;
    /// `decimals()`.
    async fn decimals(&self) -> Result<u8>;
    /// `totalSupply()`.
    async fn total_supply(&self) -> Result<U256>;
    /// `balanceOf(holder)`.
    async fn balance_of(&self, holder: Address) -> Result<U256>;
    /// `allowance(owner, spender)`.
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;
    /// `paused()`.
    async fn paused(&self) -> Result<bool>;
    /// `isBlackListed(account)`.
    async fn is_black_listed(&self, account: Address) -> Result<bool>;
    /// `isWhiteListed(account)`.
    async fn is_white_listed(&self, account: Address) -> Result<bool>;
    /// `isWhitelistEnabled()`.
    async fn is_whitelist_enabled(&self) -> Result<bool>;
    /// `owner()`.
    async fn owner(&self) -> Result<Address>;

    /// Submit a write and wait for it to be mined.
    async fn submit(&self, call: &WriteCall) -> Result<TxReceipt>;

    /// `transfer(to, amount)`.
    async fn transfer(&self, to: Address, amount: U256) -> Result<TxReceipt> {
        self.submit(&WriteCall::Transfer { to, amount }).await
    }

    /// `approve(spender, amount)`.
    async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt> {
        self.submit(&WriteCall::Approve { spender, amount }).await
    }

    /// `transferFrom(from, to, amount)`.
    async fn transfer_from(&self, from: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        self.submit(&WriteCall::TransferFrom { from, to, amount })
            .await
    }

    /// `mint(to, amount)`.
    async fn mint(&self, to: Address, amount: U256) -> Result<TxReceipt> {
        self.submit(&WriteCall::Mint { to, amount }).await
    }

    /// `burn(amount)`.
    async fn burn(&self, amount: U256) -> Result<TxReceipt> {
        self.submit(&WriteCall::Burn { amount }).await
    }

    /// `addBlackList(account)`.
    async fn add_black_list(&self, account: Address) -> Result<TxReceipt> {
        self.submit(&WriteCall::AddBlackList { account }).await
    }

    /// `removeBlackList(account)`.
    async fn remove_black_list(&self, account: Address) -> Result<TxReceipt> {
        self.submit(&WriteCall::RemoveBlackList { account }).await
    }

    /// `addWhiteList(account)`.
    async fn add_white_list(&self, account: Address) -> Result<TxReceipt> {
        self.submit(&WriteCall::AddWhiteList { account }).await
    }

    /// `removeWhiteList(account)`.
    async fn remove_white_list(&self, account: Address) -> Result<TxReceipt> {
        self.submit(&WriteCall::RemoveWhiteList { account }).await
    }

    /// `enableWhiteList()`.
    async fn enable_white_list(&self) -> Result<TxReceipt> {
        self.submit(&WriteCall::EnableWhiteList).await
    }

    /// `disableWhiteList()`.
    async fn disable_white_list(&self) -> Result<TxReceipt> {
        self.submit(&WriteCall::DisableWhiteList).await
    }

    /// `pause()`.
    async fn pause(&self) -> Result<TxReceipt> {
        self.submit(&WriteCall::Pause).await
    }

    /// `unpause()`.
    async fn unpause(&self) -> Result<TxReceipt> {
        self.submit(&WriteCall::Unpause).await
    }

    /// `transferOwnership(newOwner)`.
    async fn transfer_ownership(&self, new_owner: Address) -> Result<TxReceipt> {
        self.submit(&WriteCall::TransferOwnership { new_owner })
            .await
    }
}

impl fmt::Debug for dyn TokenContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenContract")
            .field("address", &self.address())
            .field("can_write", &self.can_write())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn owner_gating() {
        let to = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        assert!(!WriteCall::Transfer { to, amount: U256::from(1) }.requires_owner());
        assert!(!WriteCall::Burn { amount: U256::from(1) }.requires_owner());
        assert!(WriteCall::Mint { to, amount: U256::from(1) }.requires_owner());
        assert!(WriteCall::Pause.requires_owner());
        assert!(WriteCall::TransferOwnership { new_owner: to }.requires_owner());
    }

    #[test]
    fn calldata_uses_standard_selectors() {
        let to = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let data = WriteCall::Transfer { to, amount: U256::from(10) }.calldata();
        // transfer(address,uint256)
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32 * 2);

        // pause()
        assert_eq!(&WriteCall::Pause.calldata()[..], &[0x84, 0x56, 0xcb, 0x59]);
    }

    #[test]
    fn display_is_method_name() {
        assert_eq!(WriteCall::EnableWhiteList.to_string(), "enableWhiteList");
    }
}
