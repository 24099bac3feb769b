//! Chain descriptors, the chain registry and session configuration.
//!
//! Configuration is loaded once from TOML:
//!
//! ```toml
//! [session]
//! refresh_after_write = true
//! receipt_poll_interval_ms = 1500
//!
//! [[network]]
//! family = "evm"
//! key = "sepolia"
//! name = "Sepolia Testnet"
//! rpc_url = "https://rpc.sepolia.org"
//! chain_id = 11155111
//! explorer_url = "https://sepolia.etherscan.io"
//!
//! [network.tokens]
//! TestToken = "0x17712ad044d30aff9754c5e98454c3eb1de01b39"
//! ```
//!
//! An empty `network` list falls back to [`ChainRegistry::builtin`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::address;

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// Missing required field.
    #[error("missing required config: {0}")]
    MissingField(String),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    /// Two networks of one family share a key.
    #[error("duplicate network '{key}' for family {family}")]
    DuplicateNetwork {
        /// Chain family.
        family: ChainFamily,
        /// Repeated key.
        key: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Blockchain family. Decides which adapter serves a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// Ethereum and EVM-compatible chains.
    Evm,
    /// Solana.
    Solana,
    /// Tron.
    Tron,
}

impl ChainFamily {
    /// Every supported family.
    pub const ALL: [Self; 3] = [Self::Evm, Self::Solana, Self::Tron];

    /// Lowercase identifier, as used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::Solana => "solana",
            Self::Tron => "tron",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChainFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" | "ethereum" => Ok(Self::Evm),
            "solana" => Ok(Self::Solana),
            "tron" => Ok(Self::Tron),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown chain family '{other}'"
            ))),
        }
    }
}

/// Native currency metadata sent with `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Currency name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal count.
    #[serde(default = "default_native_decimals")]
    pub decimals: u8,
}

const fn default_native_decimals() -> u8 {
    18
}

impl NativeCurrency {
    fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
        }
    }

    /// Infer the native currency from a chain id.
    #[must_use]
    pub fn for_chain_id(chain_id: u64) -> Self {
        match chain_id {
            1 | 10 | 324 | 8453 | 42_161 | 59_144 | 534_352 | 17_000 => Self::new("Ether", "ETH"),
            11_155_111 => Self::new("Sepolia Ether", "ETH"),
            56 | 97 => Self::new("BNB", "BNB"),
            137 | 80_001 | 80_002 => Self::new("POL", "POL"),
            43_114 | 43_113 => Self::new("Avalanche", "AVAX"),
            100 => Self::new("xDAI", "XDAI"),
            250 => Self::new("Fantom", "FTM"),
            _ => Self::new("Native", "ETH"),
        }
    }
}

/// One network the console can target. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainDescriptor {
    /// Chain family.
    pub family: ChainFamily,
    /// Stable key, unique per family (e.g. `sepolia`).
    pub key: String,
    /// Display name.
    pub name: String,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// EVM chain id; required for EVM, ignored elsewhere.
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Block explorer base URL.
    #[serde(default)]
    pub explorer_url: Option<String>,
    /// Override for the inferred native currency.
    #[serde(default)]
    pub native_currency: Option<NativeCurrency>,
    /// Token symbol to contract address.
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

impl ChainDescriptor {
    /// Contract address of a configured token symbol.
    #[must_use]
    pub fn token_address(&self, symbol: &str) -> Option<&str> {
        self.tokens.get(symbol).map(String::as_str)
    }

    /// Native currency, explicit or inferred from the chain id.
    #[must_use]
    pub fn native_currency(&self) -> NativeCurrency {
        self.native_currency
            .clone()
            .unwrap_or_else(|| NativeCurrency::for_chain_id(self.chain_id.unwrap_or_default()))
    }

    /// Explorer link for a transaction hash.
    #[must_use]
    pub fn explorer_tx_url(&self, hash: &str) -> Option<String> {
        self.explorer_url
            .as_deref()
            .map(|base| format!("{}/tx/{hash}", base.trim_end_matches('/')))
    }

    /// Explorer link for an account or contract.
    #[must_use]
    pub fn explorer_address_url(&self, address: &str) -> Option<String> {
        self.explorer_url
            .as_deref()
            .map(|base| format!("{}/address/{address}", base.trim_end_matches('/')))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "network key ({} network '{}')",
                self.family, self.name
            )));
        }
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "rpc_url for network '{}'",
                self.key
            )));
        }
        if self.family == ChainFamily::Evm && self.chain_id.is_none() {
            return Err(ConfigError::MissingField(format!(
                "chain_id for EVM network '{}'",
                self.key
            )));
        }
        for (symbol, addr) in &self.tokens {
            address::validate(self.family, addr).map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "token {symbol} on '{}': {}",
                    self.key, e.message
                ))
            })?;
        }
        Ok(())
    }
}

/// The immutable set of networks a session may select from.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    networks: Vec<Arc<ChainDescriptor>>,
}

impl ChainRegistry {
    /// Build a registry from descriptors, validating each.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for missing chain ids, malformed token
    /// addresses, or keys repeated within a family.
    pub fn new(networks: Vec<ChainDescriptor>) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        for network in &networks {
            network.validate()?;
            if !seen.insert((network.family, network.key.clone())) {
                return Err(ConfigError::DuplicateNetwork {
                    family: network.family,
                    key: network.key.clone(),
                });
            }
        }
        debug!(count = networks.len(), "chain registry built");
        Ok(Self {
            networks: networks.into_iter().map(Arc::new).collect(),
        })
    }

    /// The default network table.
    #[must_use]
    pub fn builtin() -> Self {
        let network = |family, key: &str, name: &str, rpc_url: &str| ChainDescriptor {
            family,
            key: key.to_string(),
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            chain_id: None,
            explorer_url: None,
            native_currency: None,
            tokens: BTreeMap::new(),
        };

        let mut sepolia = network(
            ChainFamily::Evm,
            "sepolia",
            "Sepolia Testnet",
            "https://sepolia.infura.io/v3/9aa3d95b3bc440fa88ea12eaa4456161",
        );
        sepolia.chain_id = Some(11_155_111);
        sepolia.explorer_url = Some("https://sepolia.etherscan.io".to_string());
        sepolia.tokens.insert(
            "TestToken".to_string(),
            "0x17712ad044d30aff9754c5e98454c3eb1de01b39".to_string(),
        );

        let mut solana_mainnet = network(
            ChainFamily::Solana,
            "mainnet",
            "Solana Mainnet",
            "https://api.mainnet-beta.solana.com",
        );
        solana_mainnet.explorer_url = Some("https://explorer.solana.com".to_string());
        solana_mainnet.tokens.insert(
            "USDC".to_string(),
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
        );

        let solana_devnet = network(
            ChainFamily::Solana,
            "devnet",
            "Solana Devnet",
            "https://api.devnet.solana.com",
        );

        let mut tron_mainnet = network(
            ChainFamily::Tron,
            "mainnet",
            "Tron Mainnet",
            "https://api.trongrid.io",
        );
        tron_mainnet.explorer_url = Some("https://tronscan.org".to_string());
        tron_mainnet.tokens.insert(
            "USDT".to_string(),
            "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_string(),
        );

        let tron_shasta = network(
            ChainFamily::Tron,
            "shasta",
            "Tron Shasta Testnet",
            "https://api.shasta.trongrid.io",
        );

        Self {
            networks: [sepolia, solana_mainnet, solana_devnet, tron_mainnet, tron_shasta]
                .into_iter()
                .map(Arc::new)
                .collect(),
        }
    }

    /// Look up a network by family and key.
    #[must_use]
    pub fn get(&self, family: ChainFamily, key: &str) -> Option<Arc<ChainDescriptor>> {
        self.networks
            .iter()
            .find(|n| n.family == family && n.key == key)
            .cloned()
    }

    /// Networks of one family, in configuration order.
    pub fn networks(&self, family: ChainFamily) -> impl Iterator<Item = &Arc<ChainDescriptor>> {
        self.networks.iter().filter(move |n| n.family == family)
    }

    /// The first configured network of a family.
    #[must_use]
    pub fn default_network(&self, family: ChainFamily) -> Option<Arc<ChainDescriptor>> {
        self.networks(family).next().cloned()
    }

    /// Every network.
    #[must_use]
    pub fn all(&self) -> &[Arc<ChainDescriptor>] {
        &self.networks
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Behaviour knobs for a [`TokenSession`](crate::session::TokenSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Reload the whole snapshot after every successful write.
    #[serde(default = "default_true")]
    pub refresh_after_write: bool,

    /// Delay between receipt polls.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Gas limit attached to writes; `None` lets the wallet estimate.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: Option<u64>,
}

const fn default_true() -> bool {
    true
}

const fn default_receipt_poll_interval_ms() -> u64 {
    1500
}

#[allow(clippy::unnecessary_wraps)]
const fn default_gas_limit() -> Option<u64> {
    Some(200_000)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_after_write: default_true(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            gas_limit: default_gas_limit(),
        }
    }
}

impl SessionConfig {
    /// Receipt poll interval as a [`Duration`].
    #[must_use]
    pub const fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

/// Root configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Session behaviour.
    #[serde(default)]
    pub session: SessionConfig,

    /// Network table.
    #[serde(default, rename = "network")]
    pub networks: Vec<ChainDescriptor>,
}

impl ConsoleConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TomlParse`] on syntax or schema errors.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), networks = config.networks.len(), "loaded config file");
        Ok(config)
    }

    /// Build the registry, falling back to the built-in table when no
    /// network is configured.
    ///
    /// # Errors
    ///
    /// See [`ChainRegistry::new`].
    pub fn registry(&self) -> ConfigResult<ChainRegistry> {
        if self.networks.is_empty() {
            return Ok(ChainRegistry::builtin());
        }
        ChainRegistry::new(self.networks.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [session]
        refresh_after_write = false

        [[network]]
        family = "evm"
        key = "local"
        name = "Anvil"
        rpc_url = "http://127.0.0.1:8545"
        chain_id = 31337

        [network.tokens]
        TT = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

        [[network]]
        family = "tron"
        key = "shasta"
        name = "Shasta"
        rpc_url = "https://api.shasta.trongrid.io"
    "#;

    #[test]
    fn parses_sample() {
        let config = ConsoleConfig::from_toml_str(SAMPLE).unwrap();
        assert!(!config.session.refresh_after_write);
        assert_eq!(config.session.gas_limit, Some(200_000));
        assert_eq!(config.session.receipt_poll_interval_ms, 1500);

        let registry = config.registry().unwrap();
        let local = registry.get(ChainFamily::Evm, "local").unwrap();
        assert_eq!(local.chain_id, Some(31_337));
        assert_eq!(
            local.token_address("TT"),
            Some("0x5FbDB2315678afecb367f032d93F642f64180aa3")
        );
        assert_eq!(local.native_currency().name, "Native");
        assert!(registry.get(ChainFamily::Tron, "shasta").is_some());
        assert!(registry.get(ChainFamily::Solana, "shasta").is_none());
    }

    #[test]
    fn empty_config_uses_builtin() {
        let config = ConsoleConfig::from_toml_str("").unwrap();
        assert_eq!(config.session, SessionConfig::default());
        let registry = config.registry().unwrap();
        assert_eq!(registry.networks(ChainFamily::Solana).count(), 2);
        assert_eq!(
            registry.default_network(ChainFamily::Evm).unwrap().key,
            "sepolia"
        );
    }

    #[test]
    fn builtin_table_is_valid() {
        let builtin = ChainRegistry::builtin();
        let copies = builtin.all().iter().map(|n| (**n).clone()).collect();
        assert!(ChainRegistry::new(copies).is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = ConsoleConfig::from_toml_str("[session]\nretries = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn evm_requires_chain_id() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            [[network]]
            family = "evm"
            key = "x"
            name = "X"
            rpc_url = "http://localhost:8545"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.registry(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn rejects_bad_token_address() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            [[network]]
            family = "solana"
            key = "devnet"
            name = "Devnet"
            rpc_url = "https://api.devnet.solana.com"
            tokens = { BAD = "0x1234" }
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.registry(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let sepolia = ChainRegistry::builtin()
            .get(ChainFamily::Evm, "sepolia")
            .unwrap();
        let err = ChainRegistry::new(vec![(*sepolia).clone(), (*sepolia).clone()]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateNetwork { .. }));
    }

    #[test]
    fn explorer_links() {
        let sepolia = ChainRegistry::builtin()
            .get(ChainFamily::Evm, "sepolia")
            .unwrap();
        assert_eq!(
            sepolia.explorer_tx_url("0xabc").unwrap(),
            "https://sepolia.etherscan.io/tx/0xabc"
        );
        assert_eq!(sepolia.native_currency().symbol, "ETH");
    }

    #[test]
    fn family_parsing() {
        assert_eq!("EVM".parse::<ChainFamily>().unwrap(), ChainFamily::Evm);
        assert_eq!("tron".parse::<ChainFamily>().unwrap(), ChainFamily::Tron);
        assert!("bitcoin".parse::<ChainFamily>().is_err());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let config = ConsoleConfig::load_from("/nonexistent/token-console.toml")
            .await
            .unwrap();
        assert!(config.networks.is_empty());
    }
}
