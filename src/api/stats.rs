// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Statistics endpoint

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::rag::EngineStats;

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_documents: usize,
    pub index_size: usize,
    pub dimension: usize,
    pub embedding_backend: String,
    pub generation_enabled: bool,
    pub last_indexed: Option<String>,
}

impl From<EngineStats> for StatsResponse {
    fn from(stats: EngineStats) -> Self {
        Self {
            total_documents: stats.document_count,
            index_size: stats.vector_count,
            dimension: stats.dimension,
            embedding_backend: stats.embedding_backend,
            generation_enabled: stats.generation_enabled,
            last_indexed: stats.last_indexed,
        }
    }
}

/// GET /stats - Document and index statistics
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(state.engine.stats().await?.into()))
}
