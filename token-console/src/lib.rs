//! Token Console - wallet, network and contract interaction layer
//!
//! This crate sits between an ERC-20 administration console and the chains
//! it talks to: it connects wallets per chain family, keeps EVM wallets on
//! the configured network, binds token contracts, validates writes locally
//! before they reach the wallet, and reports every failure through one
//! closed error taxonomy.

pub mod address;
pub mod amount;
pub mod config;
pub mod contract;
pub mod error;
pub mod normalize;
pub mod prelude;
pub mod preflight;
pub mod session;
pub mod snapshot;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod wallet;

pub use error::{InteractionError, InteractionErrorKind, Result};
