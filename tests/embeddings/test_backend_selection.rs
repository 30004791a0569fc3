// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Backend selection and batching through the generator

use knowledge_search_node::config::NodeConfig;
use knowledge_search_node::embeddings::{BackendKind, EmbeddingError, EmbeddingGenerator};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::common::{ConceptEmbedder, CONCEPT_DIMENSION};

#[tokio::test]
async fn test_api_key_selects_remote_backend() {
    let config = NodeConfig {
        openai_api_key: Some("sk-test".to_string()),
        ..NodeConfig::default()
    };

    let generator = EmbeddingGenerator::from_config(&config).await.unwrap();
    assert_eq!(generator.kind(), BackendKind::Remote);
    assert_eq!(generator.model_name(), "text-embedding-3-small");
    assert_eq!(generator.dimension(), Some(1536));
    assert_eq!(generator.batch_size(), 32);
}

#[tokio::test]
async fn test_missing_key_and_model_fails_initialization() {
    let config = NodeConfig {
        openai_api_key: None,
        embedding_model_path: PathBuf::from("/nonexistent/model.onnx"),
        embedding_tokenizer_path: PathBuf::from("/nonexistent/tokenizer.json"),
        ..NodeConfig::default()
    };

    let result = EmbeddingGenerator::from_config(&config).await;
    assert!(matches!(result, Err(EmbeddingError::Initialization(_))));
}

#[tokio::test]
async fn test_zero_batch_size_rejected_at_construction() {
    let result = EmbeddingGenerator::new(Arc::new(ConceptEmbedder::new()), 0);
    assert!(matches!(result, Err(EmbeddingError::InvalidBatchSize)));
}

#[tokio::test]
async fn test_embed_batch_count_and_order_with_varied_lengths() {
    let backend = Arc::new(ConceptEmbedder::new());
    let generator = EmbeddingGenerator::new(backend.clone(), 32).unwrap();

    let texts: Vec<String> = vec![
        "cat".to_string(),
        String::new(),
        "a very long sentence about a motor vehicle driving through the forest".to_string(),
        "oak tree".to_string(),
    ];
    let vectors = generator.embed_batch(&texts, 3).await.unwrap();

    assert_eq!(vectors.len(), texts.len());
    for (text, vector) in texts.iter().zip(&vectors) {
        assert_eq!(vector.len(), CONCEPT_DIMENSION);
        assert_eq!(vector, &ConceptEmbedder::vector_for(text));
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert_eq!(*backend.batch_sizes.lock().unwrap(), vec![3, 1]);
}
