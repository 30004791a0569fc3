// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod ask;
pub mod errors;
pub mod http_server;
pub mod search;
pub mod stats;

pub use ask::{ask_handler, AskApiRequest};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_router, start_server, AppState, HealthResponse, RootResponse};
pub use search::{search_handler, SearchApiResponse, SearchQuery};
pub use stats::{stats_handler, StatsResponse};
