// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and response types for the Pulse HTTP API.

pub mod audit;
pub mod dispatch;
pub mod health;
pub mod notifications;
pub mod push;

pub use audit::{AuditEntryResponse, ListAuditEntriesParams, ListAuditEntriesResponse};
pub use dispatch::DispatchAcceptedResponse;
pub use health::{AuditHealth, HealthResponse, HealthStatus};
pub use notifications::{CountResponse, ErrorResponse};
pub use push::{SubscribeRequest, SubscribeResponse};
