//! Token Console CLI
//!
//! Runs one console operation per invocation against a JSON-RPC endpoint,
//! either watching a holder read-only or signing with a local key.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use token_console::prelude::*;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Token Console - inspect and administer an ERC-20 token
#[derive(Parser)]
#[command(name = "token-console")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "TOKEN_CONSOLE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Which network, token and account to work with.
#[derive(Args)]
struct TargetArgs {
    /// EVM network key (defaults to the first configured EVM network)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Token symbol from the network's token table
    #[arg(short, long, global = true, conflicts_with = "contract")]
    token: Option<String>,

    /// Token contract address
    #[arg(long, global = true)]
    contract: Option<String>,

    /// Override the network's RPC endpoint
    #[arg(long, env = "TOKEN_CONSOLE_RPC_URL", global = true)]
    rpc_url: Option<String>,

    /// Hex private key used to sign writes
    #[arg(
        long,
        env = "TOKEN_CONSOLE_PRIVATE_KEY",
        global = true,
        hide_env_values = true
    )]
    private_key: Option<String>,

    /// Watch this holder read-only instead of signing
    #[arg(long, global = true, conflicts_with = "private_key")]
    holder: Option<Address>,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured networks and tokens
    Networks,
    /// Show token state for the connected account
    Inspect,
    /// Transfer tokens
    Transfer { to: String, amount: String },
    /// Approve a spender
    Approve { spender: String, amount: String },
    /// Transfer tokens out of another account using an allowance
    TransferFrom {
        from: String,
        to: String,
        amount: String,
    },
    /// Mint tokens (owner only)
    Mint { to: String, amount: String },
    /// Burn tokens from the connected account
    Burn { amount: String },
    /// Pause transfers (owner only)
    Pause,
    /// Resume transfers (owner only)
    Unpause,
    /// Manage the blacklist (owner only)
    #[command(subcommand)]
    Blacklist(ListCommands),
    /// Manage the whitelist (owner only)
    #[command(subcommand)]
    Whitelist(WhitelistCommands),
    /// Hand ownership to another account (owner only)
    TransferOwnership { new_owner: String },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Add an account
    Add { account: String },
    /// Remove an account
    Remove { account: String },
}

#[derive(Subcommand)]
enum WhitelistCommands {
    /// Add an account
    Add { account: String },
    /// Remove an account
    Remove { account: String },
    /// Enforce the whitelist
    Enable,
    /// Stop enforcing the whitelist
    Disable,
}

/// CLI failures.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Interaction(#[from] InteractionError),

    #[error("{0}")]
    Usage(String),
}

type CliResult<T> = std::result::Result<T, CliError>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "token_console={level},token_console_cli={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => ConsoleConfig::load_from(path).await?,
        None => ConsoleConfig::default(),
    };
    let registry = config.registry()?;

    if matches!(cli.command, Commands::Networks) {
        print_networks(&registry);
        return Ok(());
    }

    let session = open_session(&cli.target, registry, config.session).await?;
    let snapshot = session.load_snapshot().await?;

    match execute(&session, cli.command).await? {
        Some(receipt) => {
            print_receipt(&session, &receipt);
            if let Some(snapshot) = session.snapshot() {
                print_snapshot(&session, &snapshot);
            }
        }
        None => print_snapshot(&session, &snapshot),
    }
    Ok(())
}

/// Run a write command. Read-only commands yield `None`.
async fn execute(session: &TokenSession, command: Commands) -> CliResult<Option<TxReceipt>> {
    let receipt = match command {
        Commands::Networks | Commands::Inspect => return Ok(None),
        Commands::Transfer { to, amount } => session.transfer(&to, &amount).await?,
        Commands::Approve { spender, amount } => session.approve(&spender, &amount).await?,
        Commands::TransferFrom { from, to, amount } => {
            session.transfer_from(&from, &to, &amount).await?
        }
        Commands::Mint { to, amount } => session.mint(&to, &amount).await?,
        Commands::Burn { amount } => session.burn(&amount).await?,
        Commands::Pause => session.pause().await?,
        Commands::Unpause => session.unpause().await?,
        Commands::Blacklist(ListCommands::Add { account }) => {
            session.add_black_list(&account).await?
        }
        Commands::Blacklist(ListCommands::Remove { account }) => {
            session.remove_black_list(&account).await?
        }
        Commands::Whitelist(WhitelistCommands::Add { account }) => {
            session.add_white_list(&account).await?
        }
        Commands::Whitelist(WhitelistCommands::Remove { account }) => {
            session.remove_white_list(&account).await?
        }
        Commands::Whitelist(WhitelistCommands::Enable) => session.enable_white_list().await?,
        Commands::Whitelist(WhitelistCommands::Disable) => session.disable_white_list().await?,
        Commands::TransferOwnership { new_owner } => {
            session.transfer_ownership(&new_owner).await?
        }
    };
    Ok(Some(receipt))
}

/// Connect to the endpoint and bind the selected token.
async fn open_session(
    target: &TargetArgs,
    registry: ChainRegistry,
    config: SessionConfig,
) -> CliResult<TokenSession> {
    let network = match &target.network {
        Some(key) => registry.get(ChainFamily::Evm, key).ok_or_else(|| {
            CliError::Usage(format!("no EVM network named '{key}' is configured"))
        })?,
        None => registry
            .default_network(ChainFamily::Evm)
            .ok_or_else(|| CliError::Usage("no EVM network is configured".to_string()))?,
    };
    let rpc_url = target.rpc_url.as_deref().unwrap_or(&network.rpc_url);

    let adapter = match (&target.private_key, target.holder) {
        (Some(key), _) => {
            let provider = RpcProvider::with_private_key(rpc_url, key).await?;
            EvmAdapter::new(Some(Arc::new(provider)))
        }
        (None, Some(holder)) => {
            let provider = RpcProvider::connect(rpc_url).await?;
            EvmAdapter::watch_only(Arc::new(provider), holder)
        }
        (None, None) => {
            return Err(CliError::Usage(
                "pass --private-key to sign or --holder to watch an account".to_string(),
            ));
        }
    };

    let session = TokenSession::new(
        registry,
        AdapterSet::new().with(Arc::new(adapter)),
        config,
    );
    session.select_network(ChainFamily::Evm, &network.key)?;
    match (&target.token, &target.contract) {
        (Some(symbol), _) => session.select_token(symbol)?,
        (None, Some(contract)) => session.select_contract_address(contract).await?,
        (None, None) => {
            let (symbol, _) = network.tokens.iter().next().ok_or_else(|| {
                CliError::Usage(format!(
                    "network '{}' has no tokens configured; pass --contract",
                    network.key
                ))
            })?;
            session.select_token(symbol)?;
        }
    }

    session.connect().await?;
    if let Some(err) = session.last_error() {
        return Err(err.into());
    }
    Ok(session)
}

fn print_networks(registry: &ChainRegistry) {
    for family in ChainFamily::ALL {
        println!("{family}:");
        for network in registry.networks(family) {
            match network.chain_id {
                Some(id) => println!("  {:<10} {} (chain {id})", network.key, network.name),
                None => println!("  {:<10} {}", network.key, network.name),
            }
            for (symbol, address) in &network.tokens {
                println!("    {symbol:<10} {address}");
            }
        }
    }
}

fn print_snapshot(session: &TokenSession, snapshot: &TokenSnapshot) {
    let contract = session.view().contract_address.unwrap_or_default();
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    println!("{} ({})", snapshot.name, snapshot.symbol);
    println!("  Contract:     {contract}");
    println!("  Decimals:     {}", snapshot.decimals);
    println!(
        "  Total supply: {} {}",
        snapshot.total_supply_display(),
        snapshot.symbol
    );
    println!("  Holder:       {}", snapshot.holder.to_checksum(None));
    println!("  Balance:      {} {}", snapshot.balance_display(), snapshot.symbol);
    if snapshot.extensions.pausable {
        println!("  Paused:       {}", yes_no(snapshot.paused));
    }
    if snapshot.extensions.whitelist {
        let status = if snapshot.whitelist_enabled {
            "enabled"
        } else {
            "disabled"
        };
        println!("  Whitelist:    {status}");
    }
    if snapshot.extensions.ownable {
        println!("  Owner:        {}", yes_no(snapshot.is_owner));
    }
    if snapshot.reconcile_pending {
        println!("  (balances are local estimates until the next reload)");
    }
}

fn print_receipt(session: &TokenSession, receipt: &TxReceipt) {
    let hash = receipt.hash.to_string();
    println!("Transaction mined: {hash}");
    if let Some(block) = receipt.block_number {
        println!("  Block:    {block}");
    }
    if let Some(url) = session.descriptor().and_then(|n| n.explorer_tx_url(&hash)) {
        println!("  Explorer: {url}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "token-console",
            "--holder",
            "0x1000000000000000000000000000000000000001",
            "whitelist",
            "enable",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Whitelist(WhitelistCommands::Enable))
        ));
    }

    #[test]
    fn signer_and_holder_conflict() {
        let cli = Cli::try_parse_from([
            "token-console",
            "--private-key",
            "0x01",
            "--holder",
            "0x1000000000000000000000000000000000000001",
            "inspect",
        ]);
        assert!(cli.is_err());
    }
}
