// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pulse notification and audit server.
//!
//! Serves the notification ledger over HTTP, accepts dispatch events from
//! resource controllers, holds the live WebSocket channel, and records every
//! API request in the audit trail.

pub mod api;
pub mod api_docs;
pub mod api_response;
pub mod audit_middleware;
pub mod auth_middleware;
pub mod error;
pub mod routes;
pub mod validation;
pub mod websocket;

pub use api::{create_app_state, create_app_state_with_transport, create_router, AppState};
pub use api_docs::ApiDoc;
pub use error::ServerError;
pub use pulse_server_config::ServerConfig;
