// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ask API endpoint handler

use axum::extract::State;
use axum::Json;
use std::time::Instant;
use tracing::{info, warn};

use super::request::AskApiRequest;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::rag::AskResponse;

/// POST /ask - Retrieve context and answer a question
///
/// Always answers when retrieval succeeds; without a configured generator
/// the answer is a template naming the retrieved documents.
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskApiRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if let Err(e) = request.validate() {
        warn!("Ask validation failed: {}", e);
        return Err(ApiError::InvalidRequest(e));
    }

    let start = Instant::now();
    let response = state.engine.ask(&request.question, request.top_k).await?;

    info!(
        "Question answered: '{}' -> {} supporting documents in {}ms",
        request.question,
        response.supporting_documents.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(response))
}
