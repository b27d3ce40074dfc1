//! # Block Engine CLI
//!
//! Resolve a block spec from the command line, print its narrative config
//! hash, or validate a configuration file. No provider client is wired in,
//! so `resolve` exercises the snapshot and synthetic tiers.

use anyhow::{Context, Result};
use block_engine::config::{ConfigLoader, EngineConfig};
use block_engine::logging::init_structured_logging;
use block_engine::models::{BlockSpec, DateWindow, Scope};
use block_engine::narrative::config_hash;
use block_engine::resolution::{
    BlockResolver, InMemorySnapshotStore, ResolutionContext, StaticAuthentication,
    UnavailableExecutor,
};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "block-engine")]
#[command(about = "Resolve analytics blocks and inspect engine configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (TOML); defaults to BLOCK_ENGINE_CONFIG_PATH
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a block and print the dataset as JSON
    Resolve {
        /// Block spec JSON file
        #[arg(long)]
        spec: PathBuf,

        /// Scope JSON file
        #[arg(long)]
        scope: PathBuf,

        #[arg(long, default_value = "cli-block")]
        block_id: String,

        #[arg(long, default_value = "cli-report")]
        report_id: String,

        /// Resolve as a public viewer
        #[arg(long)]
        anonymous: bool,
    },

    /// Print the narrative config hash of a block for a period
    Hash {
        /// Block spec JSON file
        #[arg(long)]
        spec: PathBuf,

        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },

    /// Load and validate the configuration, then print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_structured_logging(&config.logging);

    match cli.command {
        Commands::Resolve {
            spec,
            scope,
            block_id,
            report_id,
            anonymous,
        } => {
            let spec: BlockSpec = read_json(&spec)?;
            let scope: Scope = read_json(&scope)?;

            let resolver = BlockResolver::new(
                Arc::new(UnavailableExecutor),
                Arc::new(InMemorySnapshotStore::new()),
                &config,
            );
            let ctx = ResolutionContext::new(
                block_id,
                report_id,
                Arc::new(StaticAuthentication(!anonymous)),
            );

            let dataset = resolver
                .resolve_block(&spec, &scope, &ctx)
                .await
                .context("block resolution failed")?;
            println!("{}", serde_json::to_string_pretty(&dataset)?);
        }
        Commands::Hash { spec, start, end } => {
            let spec: BlockSpec = read_json(&spec)?;
            let period = DateWindow::parse(&start, &end)?;
            println!("{}", config_hash(&spec, &period));
        }
        Commands::CheckConfig => {
            info!("✅ Configuration valid");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(Some(path)),
        None => ConfigLoader::load(),
    };
    config.context("failed to load configuration")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
