//! account-harness - drive test accounts against the account services from a shell

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use account_test_utils::{HarnessConfig, ServiceKind, TestAccountManager};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "account-harness")]
#[command(about = "Create, seed and clean up test accounts against the account services")]
#[command(version)]
struct Cli {
    /// JSON config file; ACCOUNT_HARNESS_* variables are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Route every call through the gateway
    #[arg(long, global = true)]
    gateway: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and print its id
    Create {
        #[arg(long)]
        customer: String,
        #[arg(long, default_value_t = 0.0)]
        balance: f64,
    },
    /// Delete an account without touching its balance
    Delete { account_id: String },
    /// Withdraw any leftover balance, then delete each account
    Clear {
        #[arg(required = true)]
        account_ids: Vec<String>,
    },
    /// Push a stub mapping file to the account query mock
    PushMapping { file: PathBuf },
    /// Print the base URL each service resolves to
    Urls,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if cli.gateway {
        config = config.with_gateway_routing();
    }

    run(cli.command, config).await
}

fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            HarnessConfig::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
        }
        None => HarnessConfig::from_env().context("reading ACCOUNT_HARNESS_* environment"),
    }
}

async fn run(command: Commands, config: HarnessConfig) -> Result<()> {
    if let Commands::Urls = command {
        for kind in ServiceKind::ALL {
            println!("{kind:<16} {}", config.base_url(kind));
        }
        return Ok(());
    }

    let mut manager = TestAccountManager::new(config)?;

    match command {
        Commands::Create { customer, balance } => {
            let account_id = manager.create_account_with_balance(&customer, balance).await?;
            // the caller owns the account from here on
            manager.release_accounts();
            println!("{account_id}");
        }
        Commands::Delete { account_id } => {
            manager.delete_account(&account_id).await?;
        }
        Commands::Clear { account_ids } => {
            let count = account_ids.len();
            for account_id in account_ids {
                manager.track_account(account_id);
            }
            manager.clear_accounts().await?;
            info!("Cleared {} account(s)", count);
        }
        Commands::PushMapping { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading mapping {}", file.display()))?;
            let mapping: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("parsing mapping {}", file.display()))?;
            manager.push_mock_mapping(&mapping).await?;
        }
        Commands::Urls => {}
    }

    Ok(())
}
