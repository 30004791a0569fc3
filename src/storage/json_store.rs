// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON-file document store
//!
//! Holds all documents in memory, ordered by id, and writes the whole set
//! to a single JSON file on [`flush`](DocumentStore::flush). Ids are
//! assigned sequentially starting at 1 and never reused.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Document, DocumentStore, NewDocument, StoreError};
use crate::vector::{DocumentId, Slot};

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    next_id: DocumentId,
    documents: Vec<Document>,
}

#[derive(Debug)]
struct StoreState {
    documents: BTreeMap<DocumentId, Document>,
    next_id: DocumentId,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            documents: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// In-memory document store with optional JSON persistence
#[derive(Debug)]
pub struct JsonDocumentStore {
    path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl JsonDocumentStore {
    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Open the store backed by `path`, loading it if the file exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: StoreFile = serde_json::from_slice(&bytes)?;
                let highest = file.documents.iter().map(|d| d.id).max().unwrap_or(0);
                let documents: BTreeMap<_, _> =
                    file.documents.into_iter().map(|d| (d.id, d)).collect();
                info!(
                    "📂 Loaded {} documents from {}",
                    documents.len(),
                    path.display()
                );
                StoreState {
                    documents,
                    next_id: file.next_id.max(highest + 1),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No document store at {}, starting empty", path.display());
                StoreState::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn insert(&self, document: NewDocument) -> Result<DocumentId, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        state.documents.insert(
            id,
            Document {
                id,
                title: document.title,
                content: document.content,
                source_link: document.source_link,
                related_entities: document.related_entities,
                embedding_id: None,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.state.read().await.documents.get(&id).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().await.documents.len())
    }

    async fn set_embedding_id(&self, id: DocumentId, slot: Slot) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        document.embedding_id = Some(slot);
        Ok(())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .documents
            .values()
            .find(|d| d.title == title)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.state.read().await.documents.values().cloned().collect())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = {
            let state = self.state.read().await;
            serde_json::to_vec_pretty(&StoreFile {
                next_id: state.next_id,
                documents: state.documents.values().cloned().collect(),
            })?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        debug!("💾 Saved document store to {}", path.display());
        Ok(())
    }
}
