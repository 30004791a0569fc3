// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) module
// Query-time retrieval, answer synthesis and document ingestion

pub mod engine;
pub mod errors;
pub mod generator;
pub mod retriever;
pub mod synthesizer;

pub use engine::{AskResponse, EngineStats, IngestDocument, IngestReport, RetrievalEngine};
pub use errors::RagError;
pub use generator::{AnswerGenerator, GenerationError, OpenAiChatGenerator};
pub use retriever::{make_snippet, ContextDocument, Retriever, SearchResult};
pub use synthesizer::{build_prompt, template_answer, AnswerSynthesizer};
