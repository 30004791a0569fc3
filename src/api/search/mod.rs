// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Semantic search API endpoint
//!
//! Provides the `GET /search` HTTP endpoint.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::search_handler;
pub use request::SearchQuery;
pub use response::SearchApiResponse;
