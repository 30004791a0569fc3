// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Flat L2 index search behaviour

use knowledge_search_node::vector::{IndexError, VectorIndex};

fn basis(dimension: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimension];
    v[axis] = 1.0;
    v
}

fn sample_index() -> VectorIndex {
    let mut index = VectorIndex::create(4).unwrap();
    index
        .add(
            &[
                vec![1.0, 0.1, 0.0, 0.0],
                vec![0.0, 1.0, 0.2, 0.0],
                vec![0.3, 0.0, 0.0, 1.0],
                vec![-1.0, 0.5, 0.5, 0.0],
            ],
            &[101, 102, 103, 104],
        )
        .unwrap();
    index
}

#[test]
fn test_empty_index_returns_empty() {
    let index = VectorIndex::create(384).unwrap();
    let hits = index.search(&vec![0.5; 384], 5).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn test_empty_index_ignores_query_dimension() {
    let index = VectorIndex::create(3).unwrap();
    assert!(index.search(&[1.0], 5).unwrap().is_empty());
}

#[test]
fn test_reflexivity() {
    let index = sample_index();
    let stored = [
        (vec![1.0, 0.1, 0.0, 0.0], 101),
        (vec![0.0, 1.0, 0.2, 0.0], 102),
        (vec![0.3, 0.0, 0.0, 1.0], 103),
        (vec![-1.0, 0.5, 0.5, 0.0], 104),
    ];

    for (vector, document_id) in stored {
        let hits = index.search(&vector, 4).unwrap();
        assert_eq!(hits[0].document_id, document_id);
        assert!((hits[0].similarity - 1.0).abs() < 1e-5);
        for other in &hits[1..] {
            assert!(hits[0].similarity >= other.similarity);
        }
    }
}

#[test]
fn test_query_is_normalized() {
    let index = sample_index();
    let scaled = index.search(&[10.0, 1.0, 0.0, 0.0], 1).unwrap();
    let unit = index.search(&[1.0, 0.1, 0.0, 0.0], 1).unwrap();
    assert_eq!(scaled[0].document_id, unit[0].document_id);
    assert!((scaled[0].similarity - unit[0].similarity).abs() < 1e-5);
}

#[test]
fn test_results_sorted_by_descending_similarity() {
    let index = sample_index();
    let hits = index.search(&[0.5, 0.5, 0.1, 0.1], 4).unwrap();

    assert_eq!(hits.len(), 4);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[test]
fn test_top_k_larger_than_count() {
    let mut index = VectorIndex::create(3).unwrap();
    index
        .add(&[basis(3, 0), basis(3, 1), basis(3, 2)], &[1, 2, 3])
        .unwrap();

    let hits = index.search(&[1.0, 1.0, 1.0], 5).unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn test_k_zero_returns_empty() {
    let index = sample_index();
    assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn test_ties_broken_by_lowest_slot() {
    let mut index = VectorIndex::create(2).unwrap();
    index
        .add(
            &[vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]],
            &[40, 30, 20, 10],
        )
        .unwrap();

    let hits = index.search(&[1.0, 0.0], 3).unwrap();
    let slots: Vec<u64> = hits.iter().map(|h| h.slot).collect();
    let ids: Vec<u64> = hits.iter().map(|h| h.document_id).collect();
    assert_eq!(slots, vec![1, 2, 3]);
    assert_eq!(ids, vec![30, 20, 10]);
}

#[test]
fn test_ties_with_partial_selection() {
    let mut index = VectorIndex::create(2).unwrap();
    let vectors: Vec<Vec<f32>> = (0..10).map(|_| vec![1.0, 1.0]).collect();
    let ids: Vec<u64> = (0..10).map(|i| 1000 + i).collect();
    index.add(&vectors, &ids).unwrap();

    let hits = index.search(&[1.0, 1.0], 3).unwrap();
    let slots: Vec<u64> = hits.iter().map(|h| h.slot).collect();
    assert_eq!(slots, vec![0, 1, 2]);
}

#[test]
fn test_similarity_is_one_minus_distance() {
    let mut index = VectorIndex::create(2).unwrap();
    index.add(&[vec![1.0, 0.0], vec![-1.0, 0.0]], &[1, 2]).unwrap();

    let hits = index.search(&[1.0, 0.0], 2).unwrap();
    for hit in &hits {
        assert!((hit.similarity - (1.0 - hit.distance)).abs() < 1e-6);
    }
    // Opposite direction: distance 4, similarity -3, not clamped
    assert!((hits[1].similarity + 3.0).abs() < 1e-5);
}

#[test]
fn test_length_mismatch() {
    let mut index = VectorIndex::create(2).unwrap();
    let result = index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]], &[1]);
    assert!(matches!(
        result,
        Err(IndexError::LengthMismatch {
            vectors: 2,
            document_ids: 1
        })
    ));
    assert!(index.is_empty());
}

#[test]
fn test_dimension_mismatch_on_add() {
    let mut index = VectorIndex::create(3).unwrap();
    let result = index.add(&[vec![1.0, 0.0]], &[1]);
    assert!(matches!(
        result,
        Err(IndexError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
}

#[test]
fn test_dimension_mismatch_on_search() {
    let index = sample_index();
    assert!(matches!(
        index.search(&[1.0, 0.0], 1),
        Err(IndexError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_non_finite_query_rejected() {
    let index = sample_index();
    assert!(matches!(
        index.search(&[f32::INFINITY, 0.0, 0.0, 0.0], 1),
        Err(IndexError::NonFiniteVector { .. })
    ));
}

#[test]
fn test_appending_preserves_existing_results() {
    let mut index = VectorIndex::create(2).unwrap();
    index.add(&[vec![1.0, 0.0]], &[1]).unwrap();
    let before = index.search(&[1.0, 0.0], 1).unwrap();

    index.add(&[vec![0.0, 1.0]], &[2]).unwrap();
    let after = index.search(&[1.0, 0.0], 1).unwrap();

    assert_eq!(before[0].document_id, after[0].document_id);
    assert_eq!(before[0].slot, after[0].slot);
    assert_eq!(index.len(), 2);
}
