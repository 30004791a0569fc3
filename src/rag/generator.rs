// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Answer generation capability
//!
//! A generator turns a fully built prompt into answer text. The bundled
//! implementation calls an OpenAI-compatible `/chat/completions` API.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Errors raised by an [`AnswerGenerator`]
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generator initialization failed: {0}")]
    Initialization(String),

    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Generation API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Generation returned no content")]
    EmptyCompletion,
}

/// Produces answer text from a prompt
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Chat-completions client
pub struct OpenAiChatGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model_name: String,
    temperature: f32,
}

impl OpenAiChatGenerator {
    /// Create a generator for `{base_url}/chat/completions`
    pub fn new(
        base_url: &str,
        api_key: &str,
        model_name: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::Initialization(
                "API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Initialization(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        info!(
            "Answer generator configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            model_name: model_name.to_string(),
            temperature,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model_name,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Request(format!("JSON parse error: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyCompletion)?;

        debug!("Generated {} characters with {}", content.len(), self.model_name);
        Ok(content)
    }
}
