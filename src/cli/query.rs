// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;

use super::load_engine;
use crate::config::NodeConfig;
use crate::storage::Document;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Number of results (1-20)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=20))]
    pub top_k: u16,
}

/// Arguments for the ask command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to answer
    pub question: String,

    /// Number of context documents (1-20)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..=20))]
    pub top_k: u16,
}

pub async fn search(args: SearchArgs, config: &NodeConfig) -> Result<()> {
    let engine = load_engine(config).await?;
    let results = engine
        .search(&args.query, args.top_k as usize)
        .await
        .map_err(|e| anyhow!("Search failed: {}", e))?;

    if results.is_empty() {
        println!("No results for '{}'", args.query);
        return Ok(());
    }

    println!("🔍 {} results for '{}'", results.len(), args.query);
    for (rank, result) in results.iter().enumerate() {
        println!();
        println!(
            "{}. {} (score {:.4})",
            rank + 1,
            result.title,
            result.similarity_score
        );
        if !result.source_link.is_empty() {
            println!("   {}", result.source_link);
        }
        println!("   {}", result.snippet);
    }
    Ok(())
}

pub async fn ask(args: AskArgs, config: &NodeConfig) -> Result<()> {
    let engine = load_engine(config).await?;
    let response = engine
        .ask(&args.question, args.top_k as usize)
        .await
        .map_err(|e| anyhow!("Question failed: {}", e))?;

    println!("{}", response.answer);
    if !response.supporting_documents.is_empty() {
        println!();
        println!("Sources: {}", response.supporting_documents.join(", "));
    }
    Ok(())
}

pub async fn stats(config: &NodeConfig) -> Result<()> {
    let engine = load_engine(config).await?;
    let stats = engine
        .stats()
        .await
        .map_err(|e| anyhow!("Failed to read stats: {}", e))?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// One line per document: id, title and index slot
pub fn describe_document(document: &Document) -> String {
    match document.embedding_id {
        Some(slot) => format!("{:>5}  {}  [slot {}]", document.id, document.title, slot),
        None => format!("{:>5}  {}  [not indexed]", document.id, document.title),
    }
}

pub async fn documents(config: &NodeConfig) -> Result<()> {
    let engine = load_engine(config).await?;
    let documents = engine
        .store()
        .list()
        .await
        .map_err(|e| anyhow!("Failed to list documents: {}", e))?;

    if documents.is_empty() {
        println!("No documents stored in {}", config.document_store_path.display());
        return Ok(());
    }

    println!("📚 {} documents", documents.len());
    for document in &documents {
        println!("{}", describe_document(document));
    }
    Ok(())
}
