// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Question answering API endpoint
//!
//! Provides the `POST /ask` HTTP endpoint.

pub mod handler;
pub mod request;

pub use handler::ask_handler;
pub use request::AskApiRequest;
