// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, response::IntoResponse, Json};

use pulse_server_api::{AuditHealth, HealthResponse, HealthStatus};

use crate::api::AppState;

/// Liveness plus audit queue counters. Always `200`; a degraded audit
/// pipeline is reported in the body.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let stats = state.audit_service.stats();
	let unhealthy_sinks = state.audit_service.unhealthy_sinks().await;

	let status = if stats.dropped > 0 || !unhealthy_sinks.is_empty() {
		HealthStatus::Degraded
	} else {
		HealthStatus::Healthy
	};

	Json(HealthResponse {
		status,
		live_connections: state.registry.connection_count(),
		audit: AuditHealth {
			queued: state.audit_service.queued(),
			dropped: stats.dropped,
			publish_failures: stats.publish_failures,
			unhealthy_sinks,
		},
	})
}
