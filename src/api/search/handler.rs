// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search API endpoint handler

use axum::extract::{Query, State};
use axum::Json;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::request::SearchQuery;
use super::response::SearchApiResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// GET /search - Semantic document search
///
/// # Query parameters
/// - `query`: Search query string (required, max 500 chars)
/// - `top_k`: Number of results (1-20, default 5)
///
/// # Errors
/// - 400 Bad Request: Invalid query or parameters
/// - 500 Internal Server Error: Embedding or storage failure
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchApiResponse>, ApiError> {
    debug!("Search request: {:?}", params.query);

    if let Err(e) = params.validate() {
        warn!("Search validation failed: {}", e);
        return Err(ApiError::InvalidRequest(e));
    }

    let start = Instant::now();
    let results = state.engine.search(&params.query, params.top_k).await?;

    info!(
        "Search served: '{}' -> {} results in {}ms",
        params.query,
        results.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(SearchApiResponse::new(params.query, results)))
}
