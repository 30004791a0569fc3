// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Exact Flat L2 Index
//!
//! Brute-force nearest neighbour search over L2-normalized vectors. Every
//! stored vector is compared against the query, so results are exact.
//!
//! ## Similarity
//!
//! Vectors are normalized before storage and queries are normalized before
//! search. Distances are squared Euclidean, so for unit vectors
//! `distance = 2 - 2·cos(θ)` and the reported similarity is `1 - distance`.
//! Identical directions score `1.0`; orthogonal ones score `-1.0`.
//!
//! ## Slots
//!
//! Each vector occupies a slot assigned in insertion order starting at the
//! current count. Slots are never reused and vectors are never updated.

use super::errors::IndexError;
use super::{DocumentId, Slot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Backend identifier reported in index statistics
pub const FLAT_L2_BACKEND: &str = "flat_l2";

/// Statistics describing an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub count: usize,
    pub dimension: usize,
    pub backend_kind: String,
}

/// One search hit
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbour {
    pub document_id: DocumentId,
    pub slot: Slot,
    /// Squared L2 distance between normalized vectors
    pub distance: f32,
    /// `1 - distance`, not clamped
    pub similarity: f32,
}

/// Exact nearest-neighbour index over normalized vectors
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    /// Slot-major vector storage, `dimension` floats per slot
    data: Vec<f32>,
    /// Position is the slot
    slot_to_document: Vec<DocumentId>,
    document_to_slot: HashMap<DocumentId, Slot>,
    saved_at: Option<DateTime<Utc>>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` components
    pub fn create(dimension: usize) -> Result<Self, IndexError> {
        if dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }

        Ok(Self {
            dimension,
            data: Vec::new(),
            slot_to_document: Vec::new(),
            document_to_slot: HashMap::new(),
            saved_at: None,
        })
    }

    /// Rebuild an index from already-normalized slot-major storage.
    ///
    /// Used by persistence; validates that storage and mapping agree.
    pub(crate) fn from_parts(
        dimension: usize,
        data: Vec<f32>,
        slot_to_document: Vec<DocumentId>,
        saved_at: Option<DateTime<Utc>>,
    ) -> Result<Self, IndexError> {
        if dimension == 0 {
            return Err(IndexError::corrupted("stored dimension is 0"));
        }
        if data.len() != slot_to_document.len() * dimension {
            return Err(IndexError::corrupted(format!(
                "{} floats cannot hold {} vectors of dimension {}",
                data.len(),
                slot_to_document.len(),
                dimension
            )));
        }

        let document_to_slot = slot_to_document
            .iter()
            .enumerate()
            .map(|(slot, doc)| (*doc, slot as Slot))
            .collect();

        Ok(Self {
            dimension,
            data,
            slot_to_document,
            document_to_slot,
            saved_at,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.slot_to_document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_to_document.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            count: self.len(),
            dimension: self.dimension,
            backend_kind: FLAT_L2_BACKEND.to_string(),
        }
    }

    /// Time of the last successful save or load
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    pub(crate) fn set_saved_at(&mut self, at: DateTime<Utc>) {
        self.saved_at = Some(at);
    }

    /// Document stored at `slot`
    pub fn document_for(&self, slot: Slot) -> Option<DocumentId> {
        self.slot_to_document.get(slot as usize).copied()
    }

    /// Most recent slot assigned to `document_id`
    pub fn slot_for(&self, document_id: DocumentId) -> Option<Slot> {
        self.document_to_slot.get(&document_id).copied()
    }

    pub(crate) fn raw_data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn slot_mappings(&self) -> impl Iterator<Item = (Slot, DocumentId)> + '_ {
        self.slot_to_document
            .iter()
            .enumerate()
            .map(|(slot, doc)| (slot as Slot, *doc))
    }

    /// Append vectors, pairing `vectors[i]` with `document_ids[i]`.
    ///
    /// The whole batch is validated before anything is stored, so a failed
    /// call leaves the index unchanged. Returns the slots assigned, in order.
    pub fn add(
        &mut self,
        vectors: &[Vec<f32>],
        document_ids: &[DocumentId],
    ) -> Result<Vec<Slot>, IndexError> {
        if vectors.len() != document_ids.len() {
            return Err(IndexError::LengthMismatch {
                vectors: vectors.len(),
                document_ids: document_ids.len(),
            });
        }

        self.validate(vectors)?;

        let first_slot = self.len() as Slot;
        self.data.reserve(vectors.len() * self.dimension);

        let mut slots = Vec::with_capacity(vectors.len());
        for (offset, (vector, document_id)) in vectors.iter().zip(document_ids).enumerate() {
            let slot = first_slot + offset as Slot;
            self.data.extend(normalize_vector(vector));
            self.slot_to_document.push(*document_id);
            self.document_to_slot.insert(*document_id, slot);
            slots.push(slot);
        }

        Ok(slots)
    }

    /// Check that every vector has this index's dimension and only finite
    /// values, without storing anything
    pub fn validate(&self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for (position, vector) in vectors.iter().enumerate() {
            self.check_vector(vector, position)?;
        }
        Ok(())
    }

    /// Return up to `k` nearest neighbours of `query`, most similar first.
    ///
    /// Equal distances are ordered by ascending slot.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbour>, IndexError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        self.check_vector(query, 0)?;

        let query = normalize_vector(query);
        let mut scored: Vec<(Slot, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(slot, stored)| (slot as Slot, squared_l2(&query, stored)))
            .collect();

        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, compare_hits);
            scored.truncate(k);
        }
        scored.sort_by(compare_hits);

        Ok(scored
            .into_iter()
            .map(|(slot, distance)| Neighbour {
                document_id: self.slot_to_document[slot as usize],
                slot,
                distance,
                similarity: 1.0 - distance,
            })
            .collect())
    }

    fn check_vector(&self, vector: &[f32], position: usize) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::NonFiniteVector { position });
        }
        Ok(())
    }
}

fn compare_hits(a: &(Slot, f32), b: &(Slot, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize_vector(vector: &[f32]) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();

    if magnitude == 0.0 {
        return vector.to_vec();
    }

    vector.iter().map(|v| v / magnitude).collect()
}
