// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document storage
//!
//! The retrieval engine only needs a handful of keyed operations on
//! documents; they are expressed by [`DocumentStore`]. The crate ships a
//! JSON-file backed implementation.

pub mod json_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::vector::{DocumentId, Slot};

pub use json_store::JsonDocumentStore;

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub source_link: String,
    #[serde(default)]
    pub related_entities: Vec<String>,
    /// Slot of this document's vector, set once embedded
    #[serde(default)]
    pub embedding_id: Option<Slot>,
}

/// Fields supplied when creating a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub source_link: String,
    #[serde(default)]
    pub related_entities: Vec<String>,
}

/// Errors raised by document stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document {0} not found")]
    NotFound(DocumentId),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keyed document persistence used by retrieval and ingestion
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return its new id
    async fn insert(&self, document: NewDocument) -> Result<DocumentId, StoreError>;

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Record the index slot holding this document's vector
    async fn set_embedding_id(&self, id: DocumentId, slot: Slot) -> Result<(), StoreError>;

    async fn find_by_title(&self, title: &str) -> Result<Option<Document>, StoreError>;

    /// All documents in id order
    async fn list(&self) -> Result<Vec<Document>, StoreError>;

    /// Persist pending changes, if the store has anywhere to put them
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
