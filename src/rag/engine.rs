// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval engine
//!
//! Owns the embedding generator, the shared vector index, the document
//! store and the answer synthesizer, and exposes the operations used by
//! the HTTP server and the CLI: `search`, `ask`, `stats`, `ingest` and
//! `save`.
//!
//! ## Concurrency
//!
//! The index sits behind a tokio `RwLock`. Searches hold a read guard only
//! for the index lookup; ingestion and persistence take the write guard,
//! so online ingestion never interleaves with a search.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::errors::RagError;
use super::retriever::{Retriever, SearchResult};
use super::synthesizer::AnswerSynthesizer;
use crate::config::NodeConfig;
use crate::embeddings::{EmbeddingGenerator, LOCAL_EMBEDDING_DIMENSION};
use crate::storage::{DocumentStore, JsonDocumentStore, NewDocument};
use crate::utils::take_chars;
use crate::vector::{IndexError, SharedIndex, VectorIndex};

/// Characters of content included in a document's embedding text
pub const EMBED_CONTENT_CHAR_LIMIT: usize = 1000;

/// Answer plus the titles of the documents it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub supporting_documents: Vec<String>,
    pub question: String,
}

/// Engine-wide statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub document_count: usize,
    pub vector_count: usize,
    pub dimension: usize,
    pub embedding_backend: String,
    pub embedding_model: String,
    pub generation_enabled: bool,
    /// RFC 3339 time of the last index save or load
    pub last_indexed: Option<String>,
}

/// A document submitted for ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestDocument {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source_link: String,
    #[serde(default)]
    pub related_entities: Vec<String>,
    /// Short description prepended to the embedding text
    #[serde(default)]
    pub summary: String,
}

impl IngestDocument {
    /// Text that represents this document in the index
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {}",
            self.summary,
            take_chars(&self.content, EMBED_CONTENT_CHAR_LIMIT)
        )
        .trim()
        .to_string()
    }
}

/// Outcome of an ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub inserted: usize,
    /// Documents skipped because their title already exists
    pub skipped: usize,
    pub vector_count: usize,
    pub dimension: usize,
}

/// Search, question answering and ingestion over one index
pub struct RetrievalEngine {
    embedder: Arc<EmbeddingGenerator>,
    index: SharedIndex,
    store: Arc<dyn DocumentStore>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    index_path: Option<PathBuf>,
    /// Serializes ingestion runs
    ingest_lock: Mutex<()>,
}

impl RetrievalEngine {
    pub fn new(
        embedder: Arc<EmbeddingGenerator>,
        index: VectorIndex,
        store: Arc<dyn DocumentStore>,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        let index: SharedIndex = Arc::new(RwLock::new(index));
        let retriever = Retriever::new(embedder.clone(), index.clone(), store.clone());

        Self {
            embedder,
            index,
            store,
            retriever,
            synthesizer,
            index_path: None,
            ingest_lock: Mutex::new(()),
        }
    }

    /// Persist the index to `path` on [`save`](Self::save)
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    /// Build every component from configuration and load persisted state.
    ///
    /// A missing index or document store starts empty. A present but
    /// unusable index is an error, as is a non-empty index whose dimension
    /// differs from the one the embedding backend produces.
    pub async fn from_config(config: &NodeConfig) -> Result<Self, RagError> {
        let embedder = Arc::new(EmbeddingGenerator::from_config(config).await?);
        let store = Arc::new(JsonDocumentStore::open(&config.document_store_path).await?);

        let dimension = embedder.dimension().unwrap_or(LOCAL_EMBEDDING_DIMENSION);
        let mut index = VectorIndex::create(dimension)?;
        if index.load(&config.index_path)? {
            let produced = embedder.dimension();
            if !index.is_empty() && produced.is_some_and(|d| d != index.dimension()) {
                warn!(
                    "⚠️  Loaded index is {}D but the {} backend produces {}D vectors",
                    index.dimension(),
                    embedder.kind(),
                    dimension
                );
                return Err(IndexError::DimensionMismatch {
                    expected: index.dimension(),
                    actual: dimension,
                }
                .into());
            }
        } else {
            info!("Vector index not found, run ingestion first");
        }

        let synthesizer = AnswerSynthesizer::from_config(config);

        Ok(Self::new(embedder, index, store, synthesizer).with_index_path(&config.index_path))
    }

    /// Ranked documents for `query`.
    ///
    /// A blank query is rejected with [`RagError::InvalidRequest`] instead
    /// of being embedded and searched like any other text.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, RagError> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidRequest("Query cannot be empty".to_string()));
        }
        self.retriever.search(query, top_k).await
    }

    /// Retrieve `top_k` documents and synthesize an answer from them
    pub async fn ask(&self, question: &str, top_k: usize) -> Result<AskResponse, RagError> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidRequest(
                "Question cannot be empty".to_string(),
            ));
        }

        let context = self.retriever.retrieve_context(question, top_k).await?;
        let answer = self.synthesizer.answer(question, &context).await;

        Ok(AskResponse {
            answer,
            supporting_documents: context.into_iter().map(|doc| doc.title).collect(),
            question: question.to_string(),
        })
    }

    pub async fn stats(&self) -> Result<EngineStats, RagError> {
        let document_count = self.store.count().await?;
        let index = self.index.read().await;
        let stats = index.stats();

        Ok(EngineStats {
            document_count,
            vector_count: stats.count,
            dimension: stats.dimension,
            embedding_backend: self.embedder.kind().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            generation_enabled: self.synthesizer.is_enabled(),
            last_indexed: index.saved_at().map(|at| at.to_rfc3339()),
        })
    }

    /// Embed and index new documents, skipping titles already stored.
    ///
    /// Texts are embedded and every vector is checked against the index
    /// before anything is written, so an embedding failure or an unusable
    /// vector leaves store and index untouched. Nothing is persisted;
    /// call [`save`](Self::save) afterwards.
    pub async fn ingest(&self, documents: Vec<IngestDocument>) -> Result<IngestReport, RagError> {
        let _ingesting = self.ingest_lock.lock().await;
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        let mut skipped = 0;

        for document in documents {
            let duplicate = !seen.insert(document.title.clone())
                || self.store.find_by_title(&document.title).await?.is_some();
            if duplicate {
                debug!("Skipping existing document: {}", document.title);
                skipped += 1;
            } else {
                pending.push(document);
            }
        }

        if pending.is_empty() {
            let index = self.index.read().await;
            return Ok(IngestReport {
                inserted: 0,
                skipped,
                vector_count: index.len(),
                dimension: index.dimension(),
            });
        }

        let texts: Vec<String> = pending.iter().map(IngestDocument::embedding_text).collect();
        info!("Generating embeddings for {} documents", texts.len());
        let vectors = self
            .embedder
            .embed_batch(&texts, self.embedder.batch_size())
            .await?;
        let produced = vectors.first().map(Vec::len).unwrap_or_default();

        let mut index = self.index.write().await;
        let replacement = if index.dimension() == produced {
            None
        } else if index.is_empty() {
            Some(VectorIndex::create(produced)?)
        } else {
            return Err(IndexError::DimensionMismatch {
                expected: index.dimension(),
                actual: produced,
            }
            .into());
        };

        // Every vector must fit before the first store write
        replacement.as_ref().unwrap_or(&*index).validate(&vectors)?;
        if let Some(fresh) = replacement {
            info!(
                "Re-creating empty index for {}D vectors (was {}D)",
                produced,
                index.dimension()
            );
            *index = fresh;
        }

        let mut document_ids = Vec::with_capacity(pending.len());
        for document in pending {
            let id = self
                .store
                .insert(NewDocument {
                    title: document.title,
                    content: document.content,
                    source_link: document.source_link,
                    related_entities: document.related_entities,
                })
                .await?;
            document_ids.push(id);
        }

        let slots = index.add(&vectors, &document_ids)?;
        for (id, slot) in document_ids.iter().zip(slots) {
            self.store.set_embedding_id(*id, slot).await?;
        }

        info!(
            "✅ Indexed {} documents ({} skipped, {} vectors total)",
            document_ids.len(),
            skipped,
            index.len()
        );

        Ok(IngestReport {
            inserted: document_ids.len(),
            skipped,
            vector_count: index.len(),
            dimension: index.dimension(),
        })
    }

    /// Persist the index (when a path is configured) and flush the store.
    ///
    /// Holds the ingest lock throughout, so the saved index and the flushed
    /// store describe the same set of documents.
    pub async fn save(&self) -> Result<(), RagError> {
        let _ingesting = self.ingest_lock.lock().await;
        if let Some(path) = &self.index_path {
            self.index.write().await.save(path)?;
        }
        self.store.flush().await?;
        Ok(())
    }

    /// Replace the in-memory index with the one persisted at `path`
    pub async fn load_index(&self, path: &Path) -> Result<bool, RagError> {
        let _ingesting = self.ingest_lock.lock().await;
        Ok(self.index.write().await.load(path)?)
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn embedder(&self) -> &EmbeddingGenerator {
        &self.embedder
    }

    pub fn synthesizer(&self) -> &AnswerSynthesizer {
        &self.synthesizer
    }
}
