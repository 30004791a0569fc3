// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use super::load_engine;
use crate::config::NodeConfig;
use crate::rag::IngestDocument;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON file holding an array of documents
    /// (`title`, `content`, optional `source_link`, `related_entities`, `summary`)
    #[arg(long, short)]
    pub input: PathBuf,
}

/// Read documents from `path`
pub async fn read_documents(path: &Path) -> Result<Vec<IngestDocument>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a JSON array of documents", path.display()))
}

pub async fn run(args: IngestArgs, config: &NodeConfig) -> Result<()> {
    let documents = read_documents(&args.input).await?;
    info!(
        "Read {} documents from {}",
        documents.len(),
        args.input.display()
    );

    let engine = load_engine(config).await?;
    let report = engine
        .ingest(documents)
        .await
        .map_err(|e| anyhow!("Ingestion failed: {}", e))?;
    engine
        .save()
        .await
        .map_err(|e| anyhow!("Failed to save index: {}", e))?;

    println!("✅ Ingestion complete");
    println!("   Inserted:  {}", report.inserted);
    println!("   Skipped:   {}", report.skipped);
    println!("   Vectors:   {} ({}D)", report.vector_count, report.dimension);
    println!("   Index:     {}", config.index_path.display());
    Ok(())
}
