// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval orchestration
//!
//! Embeds a query, looks up its nearest vectors and resolves them to
//! documents. Results keep the index's similarity order; ids with no
//! stored document are dropped without taking a result position.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::errors::RagError;
use crate::embeddings::EmbeddingGenerator;
use crate::storage::{Document, DocumentStore};
use crate::utils::take_chars;
use crate::vector::{DocumentId, SharedIndex};

/// Characters of content shown in a snippet
pub const SNIPPET_CHAR_LIMIT: usize = 200;

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub source_link: String,
    pub similarity_score: f32,
    pub snippet: String,
}

/// A retrieved document used as grounding for answer synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub source_link: String,
}

impl From<SearchResult> for ContextDocument {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.id,
            title: result.title,
            content: result.content,
            source_link: result.source_link,
        }
    }
}

/// First 200 characters of `content`, with `...` appended when cut
pub fn make_snippet(content: &str) -> String {
    let head = take_chars(content, SNIPPET_CHAR_LIMIT);
    if head.len() < content.len() {
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

/// Embedding + index + store pipeline for a single query
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<EmbeddingGenerator>,
    index: SharedIndex,
    store: Arc<dyn DocumentStore>,
}

impl Retriever {
    pub fn new(
        embedder: Arc<EmbeddingGenerator>,
        index: SharedIndex,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
        }
    }

    /// Up to `k` documents most similar to `query`, most similar first
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>, RagError> {
        let query_vector = self.embedder.embed(query).await?;

        let neighbours = {
            let index = self.index.read().await;
            index.search(&query_vector, k)?
        };

        let mut results = Vec::with_capacity(neighbours.len());
        for neighbour in neighbours {
            match self.store.get(neighbour.document_id).await? {
                Some(document) => results.push(to_result(document, neighbour.similarity)),
                None => debug!(
                    "Skipping slot {}: document {} not in store",
                    neighbour.slot, neighbour.document_id
                ),
            }
        }

        Ok(results)
    }

    /// Same ranking as [`search`](Self::search), shaped for answer synthesis
    pub async fn retrieve_context(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ContextDocument>, RagError> {
        Ok(self
            .search(query, k)
            .await?
            .into_iter()
            .map(ContextDocument::from)
            .collect())
    }
}

fn to_result(document: Document, similarity: f32) -> SearchResult {
    SearchResult {
        snippet: make_snippet(&document.content),
        id: document.id,
        title: document.title,
        content: document.content,
        source_link: document.source_link,
        similarity_score: similarity,
    }
}
