// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the vector index
//!
//! Covers insertion validation, query validation and the persistence
//! failure modes (missing mapping artifact, artifacts that disagree).

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`VectorIndex`](super::VectorIndex) operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// Index was created with a zero dimension
    #[error("Index dimension must be greater than 0")]
    ZeroDimension,

    /// Vector or query length does not match the index dimension
    #[error("Dimension mismatch: index expects {expected}D vectors, got {actual}D")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `add` was called with differently sized vector and id slices
    #[error("Length mismatch: {vectors} vectors but {document_ids} document ids")]
    LengthMismatch { vectors: usize, document_ids: usize },

    /// Vector contains NaN or Infinity
    #[error("Vector at position {position} contains NaN or Infinity values")]
    NonFiniteVector { position: usize },

    /// Vector artifact exists but its mapping artifact does not
    #[error("Mapping artifact not found: {path}")]
    MissingMapping { path: PathBuf },

    /// Persisted artifacts are inconsistent with each other or with themselves
    #[error("Index artifacts are corrupted: {reason}")]
    Corrupted { reason: String },

    /// Filesystem failure while saving or loading
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupted(reason: impl Into<String>) -> Self {
        IndexError::Corrupted {
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for IndexError {
    fn from(err: bincode::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}
