//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use token_console::prelude::*;
//! ```

pub use crate::amount::{AmountCodec, AmountError};
pub use crate::config::{
    ChainDescriptor, ChainFamily, ChainRegistry, ConfigError, ConsoleConfig, NativeCurrency,
    SessionConfig,
};
pub use crate::contract::{
    BindOptions, ContractCapabilityProbe, Erc20Binding, ProbeOutcome, TokenCapabilities,
    TokenContract, TokenExtensions, TxReceipt, WriteCall,
};
pub use crate::error::{InteractionError, InteractionErrorKind, Result};
pub use crate::normalize::{ErrorNormalizer, Phase, ProviderError};
pub use crate::preflight::PreflightValidator;
pub use crate::session::{SessionState, SessionView, TokenSession};
pub use crate::snapshot::{SnapshotDelta, TokenSnapshot};
pub use crate::wallet::{
    AdapterSet, Capability, ChainAdapter, ChainProvider, Eip1193Provider, EvmAdapter, EvmSigner,
    NetworkSwitcher, RpcProvider, SolanaAdapter, SolanaWallet, SwitchOutcome, TronAdapter,
    TronWallet, WalletEnvironment, WalletHandle,
};
