// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod rag;
pub mod storage;
pub mod utils;
pub mod vector;
pub mod version;
