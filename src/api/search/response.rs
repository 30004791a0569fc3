// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search API response types

use serde::{Deserialize, Serialize};

use crate::rag::SearchResult;

/// Response body for GET /search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchApiResponse {
    /// Ranked results, most similar first
    pub results: Vec<SearchResult>,

    /// The original search query
    pub query: String,

    /// Number of results returned
    pub total_results: usize,
}

impl SearchApiResponse {
    pub fn new(query: String, results: Vec<SearchResult>) -> Self {
        Self {
            total_results: results.len(),
            results,
            query,
        }
    }
}
