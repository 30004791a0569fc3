// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding generation
//!
//! Converts text into fixed-length vectors using one of two backends:
//!
//! - **Remote**: an OpenAI-compatible hosted API, chosen when an API key is
//!   configured
//! - **Local**: the all-MiniLM-L6-v2 ONNX model, used otherwise
//!
//! The backend is selected once at startup and never changes for the life
//! of the generator.

pub mod onnx_model;
pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::NodeConfig;

pub use onnx_model::{OnnxEmbeddingModel, LOCAL_EMBEDDING_DIMENSION, LOCAL_MODEL_NAME};
pub use remote::RemoteEmbeddingClient;

/// Errors raised while generating embeddings
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding backend initialization failed: {0}")]
    Initialization(String),

    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embedding API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Local inference failed: {0}")]
    Inference(String),

    #[error("Batch size must be greater than 0")]
    InvalidBatchSize,
}

impl EmbeddingError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Request(_) => true,
            EmbeddingError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Which kind of backend produces embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Remote,
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "remote",
            BackendKind::Local => "local",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source of embedding vectors
///
/// Implementations must return exactly one vector per input, in input
/// order, all of the same length.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed every text in one request or inference pass
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn kind(&self) -> BackendKind;

    fn model_name(&self) -> &str;

    /// Output dimension, when known without calling the backend
    fn dimension(&self) -> Option<usize>;
}

/// Embedding front end bound to a single backend
#[derive(Clone)]
pub struct EmbeddingGenerator {
    backend: Arc<dyn EmbeddingBackend>,
    batch_size: usize,
}

impl std::fmt::Debug for EmbeddingGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingGenerator")
            .field("kind", &self.backend.kind())
            .field("model", &self.backend.model_name())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl EmbeddingGenerator {
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        batch_size: usize,
    ) -> Result<Self, EmbeddingError> {
        if batch_size == 0 {
            return Err(EmbeddingError::InvalidBatchSize);
        }
        Ok(Self {
            backend,
            batch_size,
        })
    }

    /// Select a backend from configuration.
    ///
    /// Remote when an API key is present and the client can be built,
    /// otherwise the local ONNX model. Fails only if the local model
    /// cannot be loaded.
    pub async fn from_config(config: &NodeConfig) -> Result<Self, EmbeddingError> {
        match config.api_key() {
            Some(api_key) => {
                match RemoteEmbeddingClient::new(
                    &config.openai_base_url,
                    api_key,
                    &config.embedding_model,
                    Duration::from_secs(config.request_timeout_secs),
                ) {
                    Ok(client) => {
                        info!(
                            "🌐 Using remote embeddings ({}) at {}",
                            config.embedding_model,
                            client.endpoint()
                        );
                        return Self::new(Arc::new(client), config.embed_batch_size);
                    }
                    Err(e) => warn!("⚠️  Remote embedding client unavailable: {}", e),
                }
            }
            None => info!("No OpenAI API key configured, using local embedding model"),
        }

        let model = OnnxEmbeddingModel::new(
            LOCAL_MODEL_NAME,
            &config.embedding_model_path,
            &config.embedding_tokenizer_path,
        )
        .await
        .map_err(|e| EmbeddingError::Initialization(e.to_string()))?;

        Self::new(Arc::new(model), config.embed_batch_size)
    }

    /// Embed a single text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.backend.embed_many(&[text.to_string()]).await?;
        match vectors.pop() {
            Some(vector) if vectors.is_empty() => Ok(vector),
            _ => Err(EmbeddingError::MalformedResponse(
                "expected exactly one embedding".to_string(),
            )),
        }
    }

    /// Embed `texts` in chunks of at most `batch_size`, preserving order
    pub async fn embed_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if batch_size == 0 {
            return Err(EmbeddingError::InvalidBatchSize);
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size) {
            let vectors = self.backend.embed_many(chunk).await?;
            if vectors.len() != chunk.len() {
                return Err(EmbeddingError::MalformedResponse(format!(
                    "backend returned {} embeddings for {} texts",
                    vectors.len(),
                    chunk.len()
                )));
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Configured chunk size for bulk embedding
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.backend.dimension()
    }
}
