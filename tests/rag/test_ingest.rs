// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Ingestion pipeline

use knowledge_search_node::embeddings::EmbeddingGenerator;
use knowledge_search_node::rag::{AnswerSynthesizer, RagError, RetrievalEngine};
use knowledge_search_node::storage::{DocumentStore, JsonDocumentStore};
use knowledge_search_node::vector::{IndexError, VectorIndex};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{
    cat_and_car, concept_generator, document, template_engine, FailingEmbedder, ScriptedEmbedder,
    CONCEPT_DIMENSION,
};

fn scripted_engine(
    index: VectorIndex,
    vectors: Vec<Vec<f32>>,
) -> (RetrievalEngine, Arc<JsonDocumentStore>) {
    let store = Arc::new(JsonDocumentStore::in_memory());
    let engine = RetrievalEngine::new(
        Arc::new(EmbeddingGenerator::new(Arc::new(ScriptedEmbedder { vectors }), 32).unwrap()),
        index,
        store.clone(),
        AnswerSynthesizer::template_only(),
    );
    (engine, store)
}

#[tokio::test]
async fn test_ingest_assigns_slots_and_embedding_ids() {
    let engine = template_engine();
    let report = engine.ingest(cat_and_car()).await.unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.vector_count, 2);
    assert_eq!(report.dimension, CONCEPT_DIMENSION);

    let store = engine.store();
    let index = engine.index().read().await;
    for id in [1, 2] {
        let doc = store.get(id).await.unwrap().unwrap();
        let slot = doc.embedding_id.expect("embedded");
        assert_eq!(index.document_for(slot), Some(id));
    }
}

#[tokio::test]
async fn test_duplicate_titles_skipped() {
    let engine = template_engine();
    engine.ingest(cat_and_car()).await.unwrap();

    let report = engine
        .ingest(vec![
            document("Cat", "A different cat article."),
            document("Tree", "An oak tree in the forest."),
            document("Tree", "A second tree entry in the same batch."),
        ])
        .await
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.vector_count, 3);
    assert_eq!(engine.store().count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_second_batch_slots_continue_from_count() {
    let engine = template_engine();
    engine.ingest(cat_and_car()).await.unwrap();
    engine
        .ingest(vec![document("Tree", "An oak tree.")])
        .await
        .unwrap();

    let tree = engine.store().find_by_title("Tree").await.unwrap().unwrap();
    assert_eq!(tree.embedding_id, Some(2));
}

#[tokio::test]
async fn test_empty_index_recreated_for_new_dimension() {
    let engine = RetrievalEngine::new(
        concept_generator(),
        VectorIndex::create(384).unwrap(),
        Arc::new(JsonDocumentStore::in_memory()),
        AnswerSynthesizer::template_only(),
    );

    let report = engine.ingest(cat_and_car()).await.unwrap();
    assert_eq!(report.dimension, CONCEPT_DIMENSION);
    assert_eq!(engine.index().read().await.dimension(), CONCEPT_DIMENSION);
}

#[tokio::test]
async fn test_non_empty_index_dimension_mismatch_fails() {
    let mut index = VectorIndex::create(4).unwrap();
    index.add(&[vec![1.0, 0.0, 0.0, 0.0]], &[1000]).unwrap();

    let store = Arc::new(JsonDocumentStore::in_memory());
    let engine = RetrievalEngine::new(
        concept_generator(),
        index,
        store.clone(),
        AnswerSynthesizer::template_only(),
    );

    let err = engine.ingest(cat_and_car()).await.unwrap_err();
    assert!(matches!(
        err,
        RagError::Index(IndexError::DimensionMismatch {
            expected: 4,
            actual: CONCEPT_DIMENSION
        })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(engine.index().read().await.len(), 1);
}

#[tokio::test]
async fn test_embedding_failure_leaves_store_untouched() {
    let store = Arc::new(JsonDocumentStore::in_memory());
    let engine = RetrievalEngine::new(
        Arc::new(EmbeddingGenerator::new(Arc::new(FailingEmbedder), 32).unwrap()),
        VectorIndex::create(CONCEPT_DIMENSION).unwrap(),
        store.clone(),
        AnswerSynthesizer::template_only(),
    );

    let err = engine.ingest(cat_and_car()).await.unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_ingest_only_duplicates_reports_current_state() {
    let engine = template_engine();
    engine.ingest(cat_and_car()).await.unwrap();

    let report = engine.ingest(cat_and_car()).await.unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.vector_count, 2);
}

#[tokio::test]
async fn test_save_and_reload_engine_state() {
    let dir = TempDir::new().unwrap();
    let index_path = dir.path().join("vector_index.bin");
    let store_path = dir.path().join("documents.json");

    {
        let store = Arc::new(JsonDocumentStore::open(&store_path).await.unwrap());
        let engine = RetrievalEngine::new(
            concept_generator(),
            VectorIndex::create(CONCEPT_DIMENSION).unwrap(),
            store,
            AnswerSynthesizer::template_only(),
        )
        .with_index_path(&index_path);

        engine.ingest(cat_and_car()).await.unwrap();
        engine.save().await.unwrap();
    }

    let store = Arc::new(JsonDocumentStore::open(&store_path).await.unwrap());
    let engine = RetrievalEngine::new(
        concept_generator(),
        VectorIndex::create(CONCEPT_DIMENSION).unwrap(),
        store,
        AnswerSynthesizer::template_only(),
    );
    assert!(engine.load_index(&index_path).await.unwrap());

    let results = engine.search("kitten pet", 2).await.unwrap();
    assert_eq!(results[0].title, "Cat");

    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.document_count, 2);
    assert_eq!(stats.vector_count, 2);
    assert!(stats.last_indexed.is_some());
}

#[tokio::test]
async fn test_mixed_length_vectors_leave_store_untouched() {
    let (engine, store) = scripted_engine(
        VectorIndex::create(3).unwrap(),
        vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]],
    );

    let err = engine.ingest(cat_and_car()).await.unwrap_err();
    assert!(matches!(
        err,
        RagError::Index(IndexError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
    assert!(engine.index().read().await.is_empty());
}

#[tokio::test]
async fn test_non_finite_vector_leaves_store_untouched() {
    let (engine, store) = scripted_engine(
        VectorIndex::create(3).unwrap(),
        vec![vec![1.0, 0.0, 0.0], vec![0.0, f32::NAN, 0.0]],
    );

    let err = engine.ingest(cat_and_car()).await.unwrap_err();
    assert!(matches!(
        err,
        RagError::Index(IndexError::NonFiniteVector { position: 1 })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_rejected_batch_keeps_empty_index_dimension() {
    let (engine, store) = scripted_engine(
        VectorIndex::create(384).unwrap(),
        vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]],
    );

    assert!(engine.ingest(cat_and_car()).await.is_err());
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(engine.index().read().await.dimension(), 384);
}

#[tokio::test]
async fn test_documents_retry_after_rejected_batch() {
    let store = Arc::new(JsonDocumentStore::in_memory());
    let rejected = RetrievalEngine::new(
        Arc::new(
            EmbeddingGenerator::new(
                Arc::new(ScriptedEmbedder {
                    vectors: vec![vec![1.0; CONCEPT_DIMENSION], vec![1.0]],
                }),
                32,
            )
            .unwrap(),
        ),
        VectorIndex::create(CONCEPT_DIMENSION).unwrap(),
        store.clone(),
        AnswerSynthesizer::template_only(),
    );
    assert!(rejected.ingest(cat_and_car()).await.is_err());

    let engine = RetrievalEngine::new(
        concept_generator(),
        VectorIndex::create(CONCEPT_DIMENSION).unwrap(),
        store.clone(),
        AnswerSynthesizer::template_only(),
    );
    let report = engine.ingest(cat_and_car()).await.unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(engine.search("kitten", 1).await.unwrap()[0].title, "Cat");
}

#[tokio::test]
async fn test_save_during_ingest_keeps_store_and_index_consistent() {
    let dir = TempDir::new().unwrap();
    let index_path = dir.path().join("vector_index.bin");
    let store_path = dir.path().join("documents.json");

    let engine = Arc::new(
        RetrievalEngine::new(
            concept_generator(),
            VectorIndex::create(CONCEPT_DIMENSION).unwrap(),
            Arc::new(JsonDocumentStore::open(&store_path).await.unwrap()),
            AnswerSynthesizer::template_only(),
        )
        .with_index_path(&index_path),
    );
    engine.ingest(cat_and_car()).await.unwrap();

    for round in 0..10 {
        let saver = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.save().await })
        };
        let ingester = {
            let engine = engine.clone();
            let title = format!("Tree {}", round);
            tokio::spawn(async move {
                engine
                    .ingest(vec![document(&title, "an oak tree in the forest")])
                    .await
            })
        };
        saver.await.unwrap().unwrap();
        ingester.await.unwrap().unwrap();

        let store = JsonDocumentStore::open(&store_path).await.unwrap();
        let mut index = VectorIndex::create(CONCEPT_DIMENSION).unwrap();
        assert!(index.load(&index_path).unwrap());

        let documents = store.list().await.unwrap();
        assert_eq!(documents.len(), index.len());
        for doc in documents {
            let slot = doc.embedding_id.expect("saved documents are indexed");
            assert_eq!(index.document_for(slot), Some(doc.id));
        }
    }
}
