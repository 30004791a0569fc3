// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search API request types

use serde::{Deserialize, Serialize};

/// Longest accepted query, in characters
pub const MAX_QUERY_CHARS: usize = 500;

/// Upper bound on `top_k` for search and ask
pub const MAX_TOP_K: usize = 20;

/// Query string for GET /search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Search query string (required, max 500 chars)
    pub query: String,

    /// Number of results to return (1-20, default 5)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl SearchQuery {
    /// Validate the request
    pub fn validate(&self) -> Result<(), String> {
        validate_text("Query", &self.query)?;
        validate_top_k(self.top_k)
    }
}

pub(crate) fn validate_text(field: &str, text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    if text.chars().count() > MAX_QUERY_CHARS {
        return Err(format!(
            "{} too long (max {} characters)",
            field, MAX_QUERY_CHARS
        ));
    }
    Ok(())
}

pub(crate) fn validate_top_k(top_k: usize) -> Result<(), String> {
    if top_k < 1 {
        return Err("top_k must be at least 1".to_string());
    }
    if top_k > MAX_TOP_K {
        return Err(format!("top_k cannot exceed {}", MAX_TOP_K));
    }
    Ok(())
}
