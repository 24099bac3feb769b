//! ERC-20 binding over an EIP-1193 provider.
//!
//! Encodes calls with the [`abi`] fragments, dispatches them as `eth_call`
//! or `eth_sendTransaction`, and polls `eth_getTransactionReceipt` until
//! the write is mined.

use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, U64, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use futures_timer::Delay;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{BindOptions, TokenContract, TxReceipt, WriteCall};
use crate::error::{InteractionError, Result};
use crate::normalize::{ErrorNormalizer, Phase};
use crate::wallet::Capability;
use crate::wallet::Eip1193Provider;
use crate::wallet::eip1193::methods;

/// ABI of the admin-enabled token: ERC-20 core plus pause, blacklist,
/// whitelist, mint/burn and ownership extensions.
#[allow(missing_docs)]
pub mod abi {
    alloy::sol! {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function paused() external view returns (bool);
        function isBlackListed(address account) external view returns (bool);
        function isWhiteListed(address account) external view returns (bool);
        function isWhitelistEnabled() external view returns (bool);
        function owner() external view returns (address);

        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
        function burn(uint256 amount) external;
        function addBlackList(address account) external;
        function removeBlackList(address account) external;
        function addWhiteList(address account) external;
        function removeWhiteList(address account) external;
        function enableWhiteList() external;
        function disableWhiteList() external;
        function pause() external;
        function unpause() external;
        function transferOwnership(address newOwner) external;
    }
}

/// `eth_sendTransaction` parameter object.
#[derive(Debug, Serialize)]
struct TransactionParams {
    from: Address,
    to: Address,
    data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas: Option<U64>,
}

/// The receipt fields the binding needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    #[serde(default)]
    status: Option<U64>,
    #[serde(default)]
    block_number: Option<U64>,
}

/// A token contract bound to a provider or signer.
#[derive(Debug, Clone)]
pub struct Erc20Binding {
    address: Address,
    capability: Capability,
    options: BindOptions,
}

impl Erc20Binding {
    /// Bind `address` to a capability.
    ///
    /// Returns `None` when either is absent; that is not an error, there is
    /// simply nothing to bind yet.
    #[must_use]
    pub fn bind(
        address: Option<Address>,
        capability: Option<Capability>,
        options: BindOptions,
    ) -> Option<Self> {
        Some(Self {
            address: address?,
            capability: capability?,
            options,
        })
    }

    fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        match &self.capability {
            Capability::Provider(provider) => provider,
            Capability::Signer(signer) => signer.provider(),
        }
    }

    async fn read<C>(&self, call: C) -> Result<C::Return>
    where
        C: SolCall + Send,
        C::Return: Send,
    {
        let method = C::SIGNATURE;
        let params = json!([
            { "to": self.address, "data": Bytes::from(call.abi_encode()) },
            "latest"
        ]);

        let value = self
            .provider()
            .request(methods::CALL, params)
            .await
            .map_err(|e| {
                let err = ErrorNormalizer::normalize(&e, Phase::Read);
                InteractionError::read_failed(format!("{method}: {}", err.message)).with_code(err.code)
            })?;

        let raw: Bytes = serde_json::from_value(value).map_err(|e| {
            InteractionError::read_failed(format!("{method}: malformed eth_call result: {e}"))
        })?;
        if raw.is_empty() {
            return Err(InteractionError::read_failed(format!(
                "{method}: no return data (method absent)"
            )));
        }

        debug!(contract = %self.address, method, "contract read");
        C::abi_decode_returns(&raw)
            .map_err(|e| InteractionError::read_failed(format!("{method}: decode failed: {e}")))
    }

    async fn wait_for_receipt(
        &self,
        provider: &dyn Eip1193Provider,
        hash: B256,
    ) -> Result<TxReceipt> {
        loop {
            let value = provider
                .request(methods::TRANSACTION_RECEIPT, json!([hash]))
                .await
                .map_err(|e| ErrorNormalizer::normalize(&e, Phase::Write))?;

            if value.is_null() {
                Delay::new(self.options.receipt_poll_interval).await;
                continue;
            }

            let raw: RawReceipt = serde_json::from_value(value).map_err(|e| {
                InteractionError::unknown(format!("malformed receipt for {hash}: {e}"))
            })?;
            return Ok(TxReceipt {
                hash,
                block_number: raw.block_number.map(|n| n.to::<u64>()),
                // Pre-Byzantium receipts carry no status.
                success: raw.status.is_none_or(|s| !s.is_zero()),
            });
        }
    }
}

#[async_trait]
impl TokenContract for Erc20Binding {
    fn address(&self) -> Address {
        self.address
    }

    fn can_write(&self) -> bool {
        matches!(self.capability, Capability::Signer(_))
    }

    fn signer_address(&self) -> Option<Address> {
        match &self.capability {
            Capability::Signer(signer) => Some(signer.address()),
            Capability::Provider(_) => None,
        }
    }

    async fn name(&self) -> Result<String> {
        self.read(abi::nameCall {}).await
    }

    async fn symbol(&self) -> Result<String> {
        self.read(abi::symbolCall {}).await
    }

    async fn decimals(&self) -> Result<u8> {
        self.read(abi::decimalsCall {}).await
    }

    async fn total_supply(&self) -> Result<U256> {
        self.read(abi::totalSupplyCall {}).await
    }

    async fn balance_of(&self, holder: Address) -> Result<U256> {
        self.read(abi::balanceOfCall { owner: holder }).await
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.read(abi::allowanceCall { owner, spender }).await
    }

    async fn paused(&self) -> Result<bool> {
        self.read(abi::pausedCall {}).await
    }

    async fn is_black_listed(&self, account: Address) -> Result<bool> {
        self.read(abi::isBlackListedCall { account }).await
    }

    async fn is_white_listed(&self, account: Address) -> Result<bool> {
        self.read(abi::isWhiteListedCall { account }).await
    }

    async fn is_whitelist_enabled(&self) -> Result<bool> {
        self.read(abi::isWhitelistEnabledCall {}).await
    }

    async fn owner(&self) -> Result<Address> {
        self.read(abi::ownerCall {}).await
    }

    async fn submit(&self, call: &WriteCall) -> Result<TxReceipt> {
        let Capability::Signer(signer) = &self.capability else {
            return Err(InteractionError::signer_required(call.name()));
        };

        let params = TransactionParams {
            from: signer.address(),
            to: self.address,
            data: call.calldata(),
            gas: self.options.gas_limit.map(U64::from),
        };
        info!(
            method = call.name(),
            contract = %self.address,
            from = %signer.address(),
            "submitting transaction",
        );

        let value = signer
            .provider()
            .request(methods::SEND_TRANSACTION, json!([params]))
            .await
            .map_err(|e| {
                let err = ErrorNormalizer::normalize(&e, Phase::Write);
                warn!(method = call.name(), kind = %err.kind, error = %err.message, "write failed");
                err
            })?;
        let hash: B256 = serde_json::from_value(value).map_err(|e| {
            InteractionError::unknown(format!("wallet returned a malformed transaction hash: {e}"))
        })?;

        let receipt = self.wait_for_receipt(signer.provider().as_ref(), hash).await?;
        if !receipt.success {
            warn!(method = call.name(), tx = %hash, "transaction reverted");
            return Err(InteractionError::write_reverted(format!(
                "{} transaction {hash} failed on-chain",
                call.name()
            )));
        }

        info!(method = call.name(), tx = %hash, block = ?receipt.block_number, "transaction mined");
        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::error::InteractionErrorKind;
    use crate::testing::MockWallet;
    use crate::wallet::EvmSigner;

    const TOKEN: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    fn fast() -> BindOptions {
        BindOptions {
            gas_limit: Some(200_000),
            receipt_poll_interval: std::time::Duration::from_millis(1),
        }
    }

    fn read_only(wallet: &Arc<MockWallet>) -> Erc20Binding {
        let provider: Arc<dyn Eip1193Provider> = wallet.clone();
        Erc20Binding::bind(Some(TOKEN), Some(Capability::Provider(provider)), fast()).unwrap()
    }

    fn signing(wallet: &Arc<MockWallet>) -> Erc20Binding {
        let provider: Arc<dyn Eip1193Provider> = wallet.clone();
        let signer = EvmSigner::new(provider, wallet.account());
        Erc20Binding::bind(Some(TOKEN), Some(Capability::Signer(signer)), fast()).unwrap()
    }

    #[test]
    fn bind_requires_both_parts() {
        let wallet = Arc::new(MockWallet::new());
        let provider: Arc<dyn Eip1193Provider> = wallet;
        assert!(Erc20Binding::bind(None, Some(Capability::Provider(provider)), fast()).is_none());
        assert!(Erc20Binding::bind(Some(TOKEN), None, fast()).is_none());
    }

    #[tokio::test]
    async fn reads_decode_responses() {
        let wallet = Arc::new(
            MockWallet::new()
                .with_call_result(abi::symbolCall::SELECTOR, "TT".to_string())
                .with_call_result(abi::decimalsCall::SELECTOR, U256::from(6u8))
                .with_call_result(abi::pausedCall::SELECTOR, true),
        );
        let token = read_only(&wallet);
        assert_eq!(token.symbol().await.unwrap(), "TT");
        assert_eq!(token.decimals().await.unwrap(), 6);
        assert!(token.paused().await.unwrap());
        assert!(!token.can_write());
    }

    #[tokio::test]
    async fn absent_method_is_read_failed() {
        let wallet = Arc::new(MockWallet::new());
        let err = read_only(&wallet).is_whitelist_enabled().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::ReadFailed);
        assert!(err.message.starts_with("isWhitelistEnabled()"));
    }

    #[tokio::test]
    async fn write_without_signer_never_hits_network() {
        let wallet = Arc::new(MockWallet::new());
        let err = read_only(&wallet)
            .transfer(TOKEN, U256::from(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::SignerRequired);
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn write_polls_receipt() {
        let wallet = Arc::new(MockWallet::new().with_pending_polls(2));
        let receipt = signing(&wallet).pause().await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(1));

        let calls = wallet.calls();
        let send = calls
            .iter()
            .find(|c| c.method == methods::SEND_TRANSACTION)
            .unwrap();
        assert_eq!(send.params[0]["gas"], "0x30d40");
        assert_eq!(
            calls
                .iter()
                .filter(|c| c.method == methods::TRANSACTION_RECEIPT)
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn reverted_receipt_is_write_reverted() {
        let wallet = Arc::new(MockWallet::new().with_reverting_receipts());
        let err = signing(&wallet).unpause().await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WriteReverted);
    }

    #[tokio::test]
    async fn rejected_send_is_user_rejection() {
        let wallet = Arc::new(MockWallet::new().reject_sends());
        let err = signing(&wallet).burn(U256::from(5)).await.unwrap_err();
        assert_eq!(err.kind, InteractionErrorKind::WriteRejectedByUser);
    }
}
