use anyhow::{Context, Result};
use attestor_node::{config::AggregatorConfig, logging, node::AggregatorNode};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "attestor-aggregator")]
#[command(about = "Quorum-signing attestation aggregator", long_about = None)]
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
    /// Start the aggregator
    Start {
        /// Port for the signature ingress API
        #[arg(long)]
        api_port: Option<u16>,

        /// Seconds between task publications
        #[arg(long)]
        publish_interval: Option<u64>,
    },

    /// Write a default configuration file
    Init {
        /// Output directory for the configuration
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

const DEFAULT_CONFIG_PATH: &str = "./attestor-aggregator.toml";

fn load_config(cli_path: &Option<PathBuf>) -> Result<AggregatorConfig> {
    // Priority order: CLI args > env vars > config file > defaults.
    let mut config = if let Some(path) = cli_path {
        AggregatorConfig::from_file(path)?
    } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
        AggregatorConfig::from_file(Path::new(DEFAULT_CONFIG_PATH))?
    } else {
        AggregatorConfig::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            api_port,
            publish_interval,
        } => {
            let mut config = load_config(&cli.config)?;
            if let Some(port) = api_port {
                config.api.port = port;
            }
            if let Some(secs) = publish_interval {
                config.publisher.interval_secs = secs;
            }
            // Missing or inconsistent required settings refuse to start.
            config.validate().context("invalid configuration")?;

            logging::init_logging(&config.logging, cli.verbose)?;

            let node = AggregatorNode::from_config(config)?;
            let handles = node.start();

            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            handles.abort();
            Ok(())
        }

        Commands::Init { output } => {
            std::fs::create_dir_all(&output)?;
            let config = AggregatorConfig::default();
            let path = output.join("attestor-aggregator.toml");
            config.save_to_file(&path)?;
            println!("Configuration written to {}", path.display());
            Ok(())
        }
    }
}
