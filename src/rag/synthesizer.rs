// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Answer synthesis
//!
//! Builds a grounded prompt from retrieved documents and asks the
//! configured generator for an answer. When no generator is configured, or
//! the generator fails, a deterministic template answer is returned
//! instead. `answer` never fails.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::generator::{AnswerGenerator, OpenAiChatGenerator};
use super::retriever::ContextDocument;
use crate::config::NodeConfig;
use crate::utils::take_chars;

/// Characters of each document's content placed in the prompt
pub const CONTEXT_CHAR_LIMIT: usize = 1000;

/// Titles listed in a template answer
pub const TEMPLATE_TITLE_LIMIT: usize = 3;

pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information to answer your question.";

const PROMPT_PREAMBLE: &str =
    "You are a helpful AI assistant. Answer the question based on the provided context documents.";

const PROMPT_INSTRUCTIONS: &str = "Provide a clear, concise answer based on the context. \
If the context doesn't contain enough information, say so.";

/// Turns retrieved documents into an answer
#[derive(Clone, Default)]
pub struct AnswerSynthesizer {
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl AnswerSynthesizer {
    pub fn new(generator: Option<Arc<dyn AnswerGenerator>>) -> Self {
        Self { generator }
    }

    /// Synthesizer that always uses the template answer
    pub fn template_only() -> Self {
        Self { generator: None }
    }

    /// Chat generator when an API key is configured, template-only otherwise
    pub fn from_config(config: &NodeConfig) -> Self {
        let Some(api_key) = config.api_key() else {
            warn!("⚠️  OpenAI API key not found, answers will use template responses");
            return Self::template_only();
        };

        match OpenAiChatGenerator::new(
            &config.openai_base_url,
            api_key,
            &config.llm_model,
            config.llm_temperature,
            Duration::from_secs(config.request_timeout_secs),
        ) {
            Ok(generator) => {
                info!("✅ Answer generation enabled ({})", generator.model_name());
                Self::new(Some(Arc::new(generator)))
            }
            Err(e) => {
                warn!("⚠️  Answer generator unavailable: {}", e);
                Self::template_only()
            }
        }
    }

    /// Whether a generator is configured
    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Answer `question` from `context`, falling back to the template answer
    pub async fn answer(&self, question: &str, context: &[ContextDocument]) -> String {
        let Some(generator) = &self.generator else {
            return template_answer(question, context);
        };

        let prompt = build_prompt(question, context);
        match generator.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Generator returned an empty answer, using template response");
                template_answer(question, context)
            }
            Err(e) => {
                warn!("Answer generation failed, using template response: {}", e);
                template_answer(question, context)
            }
        }
    }
}

/// Prompt sent to the generator: preamble, numbered documents, question
pub fn build_prompt(question: &str, context: &[ContextDocument]) -> String {
    let context_text = context
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "Document {}: {}\n{}",
                i + 1,
                doc.title,
                take_chars(&doc.content, CONTEXT_CHAR_LIMIT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}\n\n{}\n\nAnswer:",
        PROMPT_PREAMBLE, context_text, question, PROMPT_INSTRUCTIONS
    )
}

/// Deterministic answer naming up to three retrieved titles
pub fn template_answer(question: &str, context: &[ContextDocument]) -> String {
    if context.is_empty() {
        return NO_CONTEXT_ANSWER.to_string();
    }

    let titles = context
        .iter()
        .take(TEMPLATE_TITLE_LIMIT)
        .map(|doc| doc.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Based on the retrieved documents ({}), here's what I found related to your question: '{}'. \
Please review the search results for detailed information.",
        titles, question
    )
}
