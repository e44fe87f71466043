use anyhow::{bail, Context, Result};
use attestor_chain::{MemoryChain, MemoryRegistry};
use attestor_crypto::{BlsKeypair, DevBls};
use attestor_operator::{config::OperatorConfig, ensure_registered, logging, OperatorWatcher};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "attestor-operator")]
#[command(about = "Task-signing operator for the attestation quorum", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start watching for tasks and submitting signatures
    Start,

    /// Write a default configuration file
    Init {
        /// Output directory for the configuration
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Generate a new BLS key file
    Keygen {
        /// Output file for the key
        #[arg(short, long, default_value = "./operator.blskey")]
        output: PathBuf,
    },
}

const DEFAULT_CONFIG_PATH: &str = "./attestor-operator.toml";

fn load_config(cli_path: &Option<PathBuf>) -> Result<OperatorConfig> {
    let mut config = if let Some(path) = cli_path {
        OperatorConfig::from_file(path)?
    } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
        OperatorConfig::from_file(Path::new(DEFAULT_CONFIG_PATH))?
    } else {
        OperatorConfig::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = load_config(&cli.config)?;
            config.validate().context("invalid configuration")?;
            logging::init_logging(&config.logging, cli.verbose)?;

            let scheme = Arc::new(DevBls);
            // Key material failures refuse to start the process.
            let keypair = BlsKeypair::load_from_file(scheme.as_ref(), &config.operator.key_file)?;
            info!(operator_id = %keypair.operator_id(), "BLS key loaded");

            if config.chain.backend.as_str() != "memory" {
                bail!(
                    "chain backend '{}' requires an injected ChainClient",
                    config.chain.backend
                );
            }
            // Per-process devnet collaborators; a real deployment injects
            // its chain client and registry here instead.
            let chain = Arc::new(MemoryChain::new());
            let registry = MemoryRegistry::new(vec![]);

            if config.operator.register_on_startup {
                ensure_registered(&registry, &keypair, config.stake_per_quorum()?).await?;
            }

            let watcher = OperatorWatcher::new(
                chain,
                scheme,
                keypair,
                &config.aggregator.url,
                Duration::from_secs(config.watcher.poll_interval_secs),
                Duration::from_millis(config.watcher.submission_delay_ms),
                Duration::from_millis(config.watcher.submission_jitter_ms),
            );
            let watcher_join = tokio::spawn(watcher.run());

            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            watcher_join.abort();
            Ok(())
        }

        Commands::Init { output } => {
            std::fs::create_dir_all(&output)?;
            let config = OperatorConfig::default();
            let path = output.join("attestor-operator.toml");
            config.save_to_file(&path)?;
            println!("Configuration written to {}", path.display());
            Ok(())
        }

        Commands::Keygen { output } => {
            let scheme = DevBls;
            let keypair = BlsKeypair::generate(&scheme);
            keypair.save_to_file(&output)?;
            println!("Key written to {}", output.display());
            println!("Operator id: {}", keypair.operator_id());
            Ok(())
        }
    }
}
