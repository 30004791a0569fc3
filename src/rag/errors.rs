// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for retrieval and question answering
//!
//! A single categorized error is surfaced from `search`, `ask` and
//! `ingest`. Answer generation failures never appear here; they are
//! recovered inside the synthesizer.

use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::storage::StoreError;
use crate::vector::IndexError;

/// Errors surfaced by the retrieval engine
#[derive(Error, Debug)]
pub enum RagError {
    /// Query or document text could not be embedded
    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Index rejected the operation or its artifacts are unusable
    #[error("Vector index error: {0}")]
    Index(#[from] IndexError),

    /// Document store failure
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RagError {
    /// Get user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            RagError::Embedding(EmbeddingError::Api { status: 429, .. }) => {
                "Embedding service is rate limiting requests, try again shortly".to_string()
            }
            RagError::Embedding(_) => "Failed to generate query embedding".to_string(),
            RagError::Index(IndexError::DimensionMismatch { expected, actual }) => format!(
                "Index holds {}D vectors but the embedding backend produces {}D",
                expected, actual
            ),
            RagError::Index(_) => "Vector index is unavailable".to_string(),
            RagError::Store(_) => "Document store is unavailable".to_string(),
            RagError::InvalidRequest(message) => message.clone(),
        }
    }

    /// Get error code for logging and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::Embedding(_) => "EMBEDDING_FAILED",
            RagError::Index(IndexError::DimensionMismatch { .. }) => "DIMENSION_MISMATCH",
            RagError::Index(IndexError::MissingMapping { .. })
            | RagError::Index(IndexError::Corrupted { .. }) => "INDEX_CORRUPTED",
            RagError::Index(_) => "INDEX_ERROR",
            RagError::Store(_) => "STORE_ERROR",
            RagError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RagError::Embedding(e) => e.is_retryable(),
            _ => false,
        }
    }
}
