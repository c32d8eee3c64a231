//! tessera: command-line wallet built on the tessera engine.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tessera_types::{ChainType, Network};
use tessera_utils::{init_logging, LogFormat};
use tessera_wallet_core::{units, EngineConfig, WalletEngine};

#[derive(Parser)]
#[command(name = "tessera", about = "Non-custodial ETH/BTC wallet")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TESSERA_CONFIG")]
    config: Option<PathBuf>,

    /// "mainnet" or "testnet".
    #[arg(long, env = "TESSERA_NETWORK")]
    network: Option<Network>,

    /// Directory holding the keystore.
    #[arg(long, env = "TESSERA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the transaction service.
    #[arg(long, env = "TESSERA_TX_SERVICE_URL")]
    tx_service_url: Option<String>,

    #[arg(long, env = "TESSERA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TESSERA_LOG_LEVEL")]
    log_level: Option<String>,

    /// "human" or "json".
    #[arg(long, env = "TESSERA_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mnemonic utilities.
    Mnemonic {
        #[command(subcommand)]
        action: MnemonicAction,
    },
    /// Manage the wallet keystore.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Unlock, sync and print balances.
    Sync {
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Current fee rates for a chain.
    Fees { chain: ChainType },
    /// Convert between display and base units.
    Convert { conversion: Conversion, value: String },
    /// Check an address for the configured network.
    Validate { chain: ChainType, address: String },
}

#[derive(Subcommand)]
enum MnemonicAction {
    Generate {
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    Check { phrase: String },
}

#[derive(Subcommand)]
enum WalletAction {
    /// Generate a mnemonic and create a keystore from it.
    Create {
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    Recover {
        #[arg(long)]
        mnemonic: String,
        #[arg(long)]
        passphrase: Option<String>,
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Reveal {
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Delete the keystore.
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum Conversion {
    EthToWei,
    WeiToEth,
    EthToGwei,
    GweiToEth,
    BtcToSat,
    SatToBtc,
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.tx_service_url {
        config.tx_service_url = url.clone();
    }
    if let Some(key) = &cli.api_key {
        config.api_key = key.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Mnemonic { action } => match action {
            MnemonicAction::Generate { words } => {
                println!("{}", WalletEngine::generate_mnemonic(words)?.as_str());
            }
            MnemonicAction::Check { phrase } => {
                let valid = WalletEngine::is_recovery_mnemonic(&phrase);
                println!("{}", if valid { "valid" } else { "invalid" });
            }
        },
        Command::Convert { conversion, value } => {
            let converted = match conversion {
                Conversion::EthToWei => units::eth_to_wei(&value)?,
                Conversion::WeiToEth => units::wei_to_eth(&value)?,
                Conversion::EthToGwei => units::eth_to_gwei(&value)?,
                Conversion::GweiToEth => units::gwei_to_eth(&value)?,
                Conversion::BtcToSat => units::btc_to_satoshi(&value)?,
                Conversion::SatToBtc => units::satoshi_to_btc(&value)?,
            };
            println!("{converted}");
        }
        Command::Validate { chain, address } => {
            let valid = match chain {
                ChainType::Ethereum => units::is_valid_eth_address(&address),
                ChainType::Bitcoin => units::is_valid_btc_address(&address, config.network),
            };
            println!("{}", if valid { "valid" } else { "invalid" });
        }
        Command::Wallet { action } => {
            if config.data_dir.is_none() {
                bail!("wallet commands need --data-dir (or data_dir in the config file)");
            }
            let engine = WalletEngine::new(config)?;
            match action {
                WalletAction::Create { password, words } => {
                    let mnemonic = WalletEngine::generate_mnemonic(words)?;
                    let snapshot = engine.create_wallet(&mnemonic, None, &password).await?;
                    println!("{}", mnemonic.as_str());
                    for account in &snapshot.accounts {
                        println!("{}\t{}", account.id, account.address);
                    }
                }
                WalletAction::Recover {
                    mnemonic,
                    passphrase,
                    password,
                } => {
                    let snapshot = engine
                        .recover_wallet(&mnemonic, passphrase.as_deref(), &password)
                        .await?;
                    for account in &snapshot.accounts {
                        println!("{}\t{}", account.id, account.address);
                    }
                }
                WalletAction::Reveal { password } => {
                    println!("{}", engine.reveal_mnemonic(&password).await?.as_str());
                }
                WalletAction::Clear => {
                    engine.clear().await?;
                    tracing::info!("keystore removed");
                }
            }
        }
        Command::Sync { password } => {
            let engine = WalletEngine::new(config)?;
            engine.unlock_wallet(&password).await?;
            let report = engine.sync().await?;
            let snapshot = engine.get_wallet();
            for account in &snapshot.accounts {
                let balance = snapshot.balance(&account.id);
                let display = match account.chain {
                    ChainType::Ethereum => units::wei_to_eth(&balance.to_string())?,
                    ChainType::Bitcoin => units::satoshi_to_btc(&balance.to_string())?,
                };
                let marker = if snapshot.is_degraded(&account.id) { " (stale)" } else { "" };
                println!("{}\t{display} {}{marker}", account.address, account.chain.currency_code());
            }
            tracing::info!(version = report.version, "sync complete");
        }
        Command::Fees { chain } => {
            let engine = WalletEngine::new(config)?;
            let rates = engine.get_fee_rates(chain).await?;
            let unit = match chain {
                ChainType::Ethereum => "wei/gas",
                ChainType::Bitcoin => "sat/vB",
            };
            println!("slow\t{} {unit}\t~{}s", rates.slow, rates.slow_time_secs);
            println!("average\t{} {unit}\t~{}s", rates.average, rates.average_time_secs);
            println!("fast\t{} {unit}\t~{}s", rates.fast, rates.fast_time_secs);
        }
    }

    Ok(())
}
