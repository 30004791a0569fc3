// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Knowledge Search Node

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-semantic-search-2026-10-16";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2026-10-16";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "semantic-search",
    "flat-l2-index",
    "remote-embeddings",
    "local-onnx-embeddings",
    "grounded-answers",
    "template-answer-fallback",
    "json-document-store",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Knowledge Search Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for CLI output
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
