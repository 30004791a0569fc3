// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use knowledge_search_node::{
    api::start_server, config::NodeConfig, rag::RetrievalEngine, version,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting {}...\n", version::get_version_string());
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config = NodeConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    println!("🧠 Initializing retrieval engine...");
    let engine = RetrievalEngine::from_config(&config)
        .await
        .map_err(|e| anyhow!("Failed to initialize retrieval engine: {}", e))?;

    let stats = engine.stats().await?;
    println!(
        "✅ Retrieval engine ready: {} documents, {} vectors ({}D, {} embeddings)",
        stats.document_count, stats.vector_count, stats.dimension, stats.embedding_backend
    );
    if !stats.generation_enabled {
        println!("ℹ️  Answer generation disabled, /ask returns template answers");
    }
    println!();

    start_server(Arc::new(engine), &config).await
}
