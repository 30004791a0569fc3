// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Every setting comes from an environment variable with a default. A
//! `.env` file is honoured by the binaries (loaded before `from_env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

/// Runtime configuration for the search node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Enables remote embeddings and answer generation when set
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Remote embedding model
    pub embedding_model: String,
    /// Chat model used for answer generation
    pub llm_model: String,
    pub llm_temperature: f32,
    /// Local ONNX model file
    pub embedding_model_path: PathBuf,
    /// Local tokenizer file
    pub embedding_tokenizer_path: PathBuf,
    /// Texts per backend call during bulk embedding
    pub embed_batch_size: usize,
    /// Vector artifact path; the mapping artifact sits next to it
    pub index_path: PathBuf,
    pub document_store_path: PathBuf,
    pub api_host: String,
    pub api_port: u16,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Timeout for outbound HTTP calls
    pub request_timeout_secs: u64,
}

impl NodeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            embedding_model: lookup("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            llm_model: lookup("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_temperature: parse_var(&lookup, "LLM_TEMPERATURE")
                .unwrap_or(defaults.llm_temperature),
            embedding_model_path: lookup("EMBEDDING_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.embedding_model_path),
            embedding_tokenizer_path: lookup("EMBEDDING_TOKENIZER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.embedding_tokenizer_path),
            embed_batch_size: parse_var(&lookup, "EMBED_BATCH_SIZE")
                .unwrap_or(defaults.embed_batch_size),
            index_path: lookup("INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_path),
            document_store_path: lookup("DOCUMENT_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.document_store_path),
            api_host: lookup("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_var(&lookup, "API_PORT").unwrap_or(defaults.api_port),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(defaults.cors_origins),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.embed_batch_size == 0 {
            return Err("Embedding batch size must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }
        if self.index_path.as_os_str().is_empty() {
            return Err("Index path must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm_temperature
            ));
        }
        Ok(())
    }

    /// Credential for hosted embeddings and generation, if usable
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: 0.7,
            embedding_model_path: PathBuf::from("./models/all-MiniLM-L6-v2-onnx/model.onnx"),
            embedding_tokenizer_path: PathBuf::from(
                "./models/all-MiniLM-L6-v2-onnx/tokenizer.json",
            ),
            embed_batch_size: 32,
            index_path: PathBuf::from("./data/vector_index.bin"),
            document_store_path: PathBuf::from("./data/documents.json"),
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            request_timeout_secs: 30,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}
