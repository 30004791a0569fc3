// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ask API request types

use serde::{Deserialize, Serialize};

use crate::api::search::request::{validate_text, validate_top_k};

/// Request body for POST /ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskApiRequest {
    pub question: String,

    /// Documents used as context (1-20, default 3)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

impl AskApiRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<(), String> {
        validate_text("Question", &self.question)?;
        validate_top_k(self.top_k)
    }
}
