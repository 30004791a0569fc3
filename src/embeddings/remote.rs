// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote embedding client for OpenAI-compatible `/embeddings` APIs

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{BackendKind, EmbeddingBackend, EmbeddingError};

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(serde::Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(serde::Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Stand-in sent for empty inputs, which the API rejects
const EMPTY_INPUT_PLACEHOLDER: &str = " ";

/// Dimension of well-known hosted models
pub fn known_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// Client for a hosted embedding service
pub struct RemoteEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model_name: String,
}

impl RemoteEmbeddingClient {
    /// Create a client for `{base_url}/embeddings`
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `api_key` - bearer token
    /// * `model_name` - embedding model identifier
    /// * `timeout` - per-request timeout
    pub fn new(
        base_url: &str,
        api_key: &str,
        model_name: &str,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::Initialization(
                "API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Initialization(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model_name: model_name.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingBackend for RemoteEmbeddingClient {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingsRequest {
            model: &self.model_name,
            input: texts
                .iter()
                .map(|t| {
                    if t.is_empty() {
                        EMPTY_INPUT_PLACEHOLDER
                    } else {
                        t.as_str()
                    }
                })
                .collect(),
        };

        debug!(
            "Requesting {} embeddings from {} ({})",
            texts.len(),
            self.endpoint,
            self.model_name
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let status = response.status();
        if status == 429 {
            return Err(EmbeddingError::Api {
                status: 429,
                message: "rate limited".to_string(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(format!("JSON parse error: {}", e)))?;

        if body.data.len() != texts.len() {
            return Err(EmbeddingError::MalformedResponse(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        if body.data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err(EmbeddingError::MalformedResponse(
                "response indices do not cover the request".to_string(),
            ));
        }

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        known_dimension(&self.model_name)
    }
}
