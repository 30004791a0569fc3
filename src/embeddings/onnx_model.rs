// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Local ONNX Embedding Backend
//!
//! Runs the all-MiniLM-L6-v2 sentence transformer through ONNX Runtime.
//!
//! Features:
//! - ONNX model loading from disk
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - BERT tokenization with truncation to 256 tokens
//! - Batched inference with per-batch padding
//! - Mean pooling weighted by the attention mask
//! - 384-dimensional output vectors

use super::{BackendKind, EmbeddingBackend, EmbeddingError};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// Output dimension of all-MiniLM-L6-v2
pub const LOCAL_EMBEDDING_DIMENSION: usize = 384;

/// Default local model name
pub const LOCAL_MODEL_NAME: &str = "all-MiniLM-L6-v2";

const MAX_SEQUENCE_LENGTH: usize = 256;

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// # Thread Safety
/// The session sits behind a mutex; inference calls are serialized.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Load the model and tokenizer from disk.
    ///
    /// A validation inference runs before returning; a model whose hidden
    /// size is not 384 is rejected.
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "all-MiniLM-L6-v2",
    ///     "./models/all-MiniLM-L6-v2-onnx/model.onnx",
    ///     "./models/all-MiniLM-L6-v2-onnx/tokenizer.json"
    /// ).await?;
    /// ```
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("🚀 Initializing local embedding model {}", model_name);
        let session = match build_session(model_path, true) {
            Ok(s) => {
                info!("✅ CUDA execution provider initialized");
                s
            }
            Err(e) => {
                warn!("⚠️  CUDA execution provider failed: {}", e);
                warn!("   Falling back to CPU execution provider");
                build_session(model_path, false).context(format!(
                    "Failed to load ONNX model from {}",
                    model_path.display()
                ))?
            }
        };

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: LOCAL_EMBEDDING_DIMENSION,
        };

        let probe = model.run_batch(&["validation test".to_string()])?;
        if probe.first().map(Vec::len) != Some(LOCAL_EMBEDDING_DIMENSION) {
            anyhow::bail!(
                "Model produced {:?}-dimensional output (expected {})",
                probe.first().map(Vec::len),
                LOCAL_EMBEDDING_DIMENSION
            );
        }

        info!("✅ Local embedding model loaded ({}D)", model.dimension);
        Ok(model)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Tokenize, pad to the longest sequence, run inference and mean-pool
    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings: Vec<Encoding> = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(0i64).take(padding));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
        }

        let shape = (texts.len(), max_len);
        let mask_for_pooling = Array2::from_shape_vec(shape, attention_mask.clone())
            .context("Failed to create pooling mask")?;
        let input_ids_array =
            Array2::from_shape_vec(shape, input_ids).context("Failed to create input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec(shape, attention_mask)
            .context("Failed to create attention_mask array")?;
        let token_type_ids_array = Array2::<i64>::zeros(shape);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session mutex poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids_array)?,
            "attention_mask" => Value::from_array(attention_mask_array)?,
            "token_type_ids" => Value::from_array(token_type_ids_array)?
        ])?;

        // [batch, seq_len, hidden_dim]
        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        if hidden.ndim() != 3 {
            anyhow::bail!("Unexpected output shape: {:?}", hidden.shape());
        }

        let embeddings = (0..texts.len())
            .map(|row| {
                let tokens = hidden.index_axis(Axis(0), row);
                let hidden_dim = tokens.shape()[1];
                let mut pooled = vec![0.0f32; hidden_dim];
                let mut mask_sum = 0.0f32;

                for (position, token) in tokens.axis_iter(Axis(0)).enumerate() {
                    let weight = mask_for_pooling[[row, position]] as f32;
                    mask_sum += weight;
                    for (acc, value) in pooled.iter_mut().zip(token.iter()) {
                        *acc += value * weight;
                    }
                }

                let denom = mask_sum.max(1e-9);
                pooled.iter_mut().for_each(|v| *v /= denom);
                pooled
            })
            .collect();

        debug!("Embedded batch of {} texts (seq_len {})", texts.len(), max_len);
        Ok(embeddings)
    }
}

fn build_session(model_path: &Path, cuda: bool) -> Result<Session> {
    let builder = Session::builder().context("Failed to create session builder")?;
    let builder = if cuda {
        builder
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
    } else {
        builder
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
    };

    builder
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(4)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context("Failed to commit ONNX session")
}

#[async_trait]
impl EmbeddingBackend for OnnxEmbeddingModel {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.run_batch(texts)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
