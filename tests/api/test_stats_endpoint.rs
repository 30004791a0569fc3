// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /stats, GET /health and GET /

use axum::http::StatusCode;

use crate::common::{call_json, cat_car_router, get, CONCEPT_DIMENSION};

#[tokio::test]
async fn test_stats_reports_counts() {
    let (status, body) = call_json(cat_car_router().await, get("/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_documents"], 2);
    assert_eq!(body["index_size"], 2);
    assert_eq!(body["dimension"], CONCEPT_DIMENSION);
    assert_eq!(body["embedding_backend"], "local");
    assert_eq!(body["generation_enabled"], false);
    assert!(body["last_indexed"].is_null());
}

#[tokio::test]
async fn test_health() {
    let (status, body) = call_json(cat_car_router().await, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["vector_count"], 2);
}

#[tokio::test]
async fn test_root_reports_version() {
    let (status, body) = call_json(cat_car_router().await, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["version"],
        knowledge_search_node::version::VERSION_NUMBER
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = call_json(cat_car_router().await, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
