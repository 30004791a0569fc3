// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector index
//!
//! Exact nearest-neighbour search over normalized embeddings, with a
//! two-artifact on-disk format.

pub mod errors;
pub mod flat_index;
pub mod persistence;

use std::sync::Arc;
use tokio::sync::RwLock;

pub use errors::IndexError;
pub use flat_index::{normalize_vector, IndexStats, Neighbour, VectorIndex, FLAT_L2_BACKEND};
pub use persistence::mapping_path_for;

/// Identifier of a document in the document store
pub type DocumentId = u64;

/// Position of a vector inside the index
pub type Slot = u64;

/// Index shared between concurrent readers and a single writer
pub type SharedIndex = Arc<RwLock<VectorIndex>>;
