// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Index persistence
//!
//! An index is stored as two bincode artifacts:
//!
//! - the vector artifact at the configured path, holding every normalized
//!   vector in slot order
//! - the mapping artifact next to it (see [`mapping_path_for`]), holding the
//!   slot to document id pairs and the save timestamp
//!
//! Both are written to a temporary sibling and renamed into place, vectors
//! first and mapping last, so a reader never sees a mapping newer than its
//! vectors.

use super::errors::IndexError;
use super::flat_index::VectorIndex;
use super::{DocumentId, Slot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct VectorArtifact {
    format_version: u32,
    dimension: u32,
    count: u64,
    data: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingArtifact {
    dimension: u32,
    saved_at: String,
    slot_to_document: Vec<(Slot, DocumentId)>,
}

/// Location of the mapping artifact belonging to the vector artifact at `path`.
///
/// `index.bin` maps to `index_mappings.bin`; any other file name gets
/// `_mappings.bin` appended.
pub fn mapping_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mapping_name = match file_name.strip_suffix(".bin") {
        Some(stem) => format!("{}_mappings.bin", stem),
        None => format!("{}_mappings.bin", file_name),
    };

    path.with_file_name(mapping_name)
}

impl VectorIndex {
    /// Persist both artifacts and record the save time
    pub fn save(&mut self, path: &Path) -> Result<DateTime<Utc>, IndexError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
        }

        let saved_at = Utc::now();
        let vectors = VectorArtifact {
            format_version: FORMAT_VERSION,
            dimension: self.dimension() as u32,
            count: self.len() as u64,
            data: self.raw_data().to_vec(),
        };
        let mapping = MappingArtifact {
            dimension: self.dimension() as u32,
            saved_at: saved_at.to_rfc3339(),
            slot_to_document: self.slot_mappings().collect(),
        };

        write_atomic(path, &bincode::serialize(&vectors)?)?;
        let mapping_path = mapping_path_for(path);
        write_atomic(&mapping_path, &bincode::serialize(&mapping)?)?;

        self.set_saved_at(saved_at);
        info!(
            "💾 Saved vector index ({} vectors, {}D) to {}",
            self.len(),
            self.dimension(),
            path.display()
        );
        Ok(saved_at)
    }

    /// Replace this index with the one persisted at `path`.
    ///
    /// Returns `Ok(false)` and leaves the index untouched when no vector
    /// artifact exists. On any error the index is also left untouched.
    pub fn load(&mut self, path: &Path) -> Result<bool, IndexError> {
        if !path.exists() {
            debug!("No vector artifact at {}", path.display());
            return Ok(false);
        }

        let mapping_path = mapping_path_for(path);
        if !mapping_path.exists() {
            return Err(IndexError::MissingMapping { path: mapping_path });
        }

        let vector_bytes = fs::read(path).map_err(|e| IndexError::io(path, e))?;
        let mapping_bytes = fs::read(&mapping_path).map_err(|e| IndexError::io(&mapping_path, e))?;

        let vectors: VectorArtifact = bincode::deserialize(&vector_bytes)?;
        let mapping: MappingArtifact = bincode::deserialize(&mapping_bytes)?;

        let loaded = rebuild(vectors, mapping)?;
        info!(
            "📂 Loaded vector index ({} vectors, {}D) from {}",
            loaded.len(),
            loaded.dimension(),
            path.display()
        );
        *self = loaded;
        Ok(true)
    }
}

fn rebuild(vectors: VectorArtifact, mapping: MappingArtifact) -> Result<VectorIndex, IndexError> {
    if vectors.format_version != FORMAT_VERSION {
        return Err(IndexError::corrupted(format!(
            "unsupported format version {}",
            vectors.format_version
        )));
    }
    if vectors.dimension != mapping.dimension {
        return Err(IndexError::corrupted(format!(
            "vector artifact is {}D but mapping artifact is {}D",
            vectors.dimension, mapping.dimension
        )));
    }
    if mapping.slot_to_document.len() as u64 != vectors.count {
        return Err(IndexError::corrupted(format!(
            "{} vectors but {} mapping entries",
            vectors.count,
            mapping.slot_to_document.len()
        )));
    }

    let mut entries = mapping.slot_to_document;
    entries.sort_by_key(|(slot, _)| *slot);
    for (expected, (slot, _)) in entries.iter().enumerate() {
        if *slot != expected as Slot {
            return Err(IndexError::corrupted(format!(
                "mapping slots are not contiguous: expected {}, found {}",
                expected, slot
            )));
        }
    }

    let saved_at = DateTime::parse_from_rfc3339(&mapping.saved_at)
        .map(|at| at.with_timezone(&Utc))
        .ok();
    let slot_to_document = entries.into_iter().map(|(_, doc)| doc).collect();

    VectorIndex::from_parts(
        vectors.dimension as usize,
        vectors.data,
        slot_to_document,
        saved_at,
    )
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, bytes).map_err(|e| IndexError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| IndexError::io(path, e))
}
