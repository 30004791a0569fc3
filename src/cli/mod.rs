// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod ingest;
pub mod query;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crate::config::NodeConfig;
use crate::rag::RetrievalEngine;
use crate::version;

/// Knowledge Search CLI
#[derive(Parser, Debug)]
#[command(name = "knowledge-cli")]
#[command(version = version::VERSION_NUMBER)]
#[command(about = "Offline ingestion and query tools for the knowledge search node", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed and index documents from a JSON file
    Ingest(ingest::IngestArgs),

    /// Search indexed documents
    Search(query::SearchArgs),

    /// Ask a question over indexed documents
    Ask(query::AskArgs),

    /// Show document and index statistics
    Stats,

    /// List stored documents and their index slots
    Documents,

    /// Show build and feature information
    Version,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest(args) => ingest::run(args, &config_from_env()?).await,
        Commands::Search(args) => query::search(args, &config_from_env()?).await,
        Commands::Ask(args) => query::ask(args, &config_from_env()?).await,
        Commands::Stats => query::stats(&config_from_env()?).await,
        Commands::Documents => query::documents(&config_from_env()?).await,
        Commands::Version => {
            println!("{}", serde_json::to_string_pretty(&version::get_version_info())?);
            Ok(())
        }
    }
}

fn config_from_env() -> Result<NodeConfig> {
    let config = NodeConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Build the engine from configuration, loading persisted state
pub(crate) async fn load_engine(config: &NodeConfig) -> Result<RetrievalEngine> {
    RetrievalEngine::from_config(config)
        .await
        .map_err(|e| anyhow!("Failed to initialize retrieval engine: {}", e))
}
