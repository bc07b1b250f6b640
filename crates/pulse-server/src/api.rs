// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::{
	http::HeaderName,
	middleware::{from_fn_with_state, map_response},
	routing::{delete, get, patch, post},
	Json, Router,
};
use sqlx::SqlitePool;
use utoipa::OpenApi;

use pulse_server_audit::{
	AuditService, AuditSink, PayloadSanitizer, SqliteAuditSink, TracingAuditSink,
};
use pulse_server_config::{AuditConfig, LiveConfig, ServerConfig};
use pulse_server_db::{
	AuditRepository, NotificationRepository, NotificationStore, PushSubscriptionRepository,
	PushSubscriptionStore,
};
use pulse_server_notify::{
	ConnectionRegistry, Dispatcher, HttpPushTransport, PushDeliveryAdapter, PushTransport,
};

use crate::{
	api_docs::ApiDoc,
	audit_middleware::{audit_layer, declare_update},
	auth_middleware::actor_layer,
	error::ServerError,
	routes, websocket,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub notifications: Arc<dyn NotificationStore>,
	pub subscriptions: Arc<dyn PushSubscriptionStore>,
	pub audit_repo: Arc<AuditRepository>,
	pub audit_service: Arc<AuditService>,
	pub sanitizer: Arc<PayloadSanitizer>,
	pub registry: Arc<ConnectionRegistry>,
	pub dispatcher: Dispatcher,
	pub actor_header: HeaderName,
	pub audit_config: AuditConfig,
	pub live_config: LiveConfig,
}

/// Creates the application state with the HTTP push transport.
///
/// Must be called from within a tokio runtime: the audit queue spawns its
/// background task here.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> Result<AppState, ServerError> {
	let transport: Arc<dyn PushTransport> = Arc::new(HttpPushTransport::new(&config.push)?);
	create_app_state_with_transport(pool, config, transport)
}

/// Creates the application state around a caller-supplied push transport.
pub fn create_app_state_with_transport(
	pool: SqlitePool,
	config: &ServerConfig,
	transport: Arc<dyn PushTransport>,
) -> Result<AppState, ServerError> {
	let notifications: Arc<dyn NotificationStore> =
		Arc::new(NotificationRepository::new(pool.clone()));
	let subscriptions: Arc<dyn PushSubscriptionStore> =
		Arc::new(PushSubscriptionRepository::new(pool.clone()));
	let audit_repo = Arc::new(AuditRepository::new(pool.clone()));

	let sinks: Vec<Arc<dyn AuditSink>> = vec![
		Arc::new(SqliteAuditSink::new(pool)),
		Arc::new(TracingAuditSink::new()),
	];
	let audit_service = Arc::new(AuditService::new(
		config.audit.queue_capacity,
		config.audit.queue_overflow_policy,
		sinks,
	));

	let sanitizer = match &config.audit.hash_key {
		Some(key) => PayloadSanitizer::new(key.as_bytes())?,
		None => {
			tracing::warn!(
				"no audit hash key configured, using a per-process random key; \
				 hashed values will not correlate across restarts"
			);
			PayloadSanitizer::random()?
		}
	};

	let registry = Arc::new(ConnectionRegistry::new());
	let push = Arc::new(PushDeliveryAdapter::new(transport, config.push.enabled));
	if !config.push.enabled {
		tracing::info!("push delivery disabled");
	}
	let dispatcher = Dispatcher::new(
		Arc::clone(&notifications),
		Arc::clone(&subscriptions),
		Arc::clone(&registry),
		push,
	);

	let actor_header = HeaderName::from_bytes(config.auth.actor_header.as_bytes()).map_err(|e| {
		ServerError::Internal(format!(
			"invalid actor header '{}': {e}",
			config.auth.actor_header
		))
	})?;

	Ok(AppState {
		notifications,
		subscriptions,
		audit_repo,
		audit_service,
		sanitizer: Arc::new(sanitizer),
		registry,
		dispatcher,
		actor_header,
		audit_config: config.audit.clone(),
		live_config: config.live.clone(),
	})
}

/// Create the router with all routes.
///
/// Everything except `/health`, `/ws` and the OpenAPI document passes through
/// actor resolution and the audit recorder.
pub fn create_router(state: AppState) -> Router {
	// PATCH has no fixed audit action
	let update_routes = Router::new()
		.route(
			"/notifications/{id}/read",
			patch(routes::notifications::mark_read),
		)
		.route(
			"/notifications/{id}/unread",
			patch(routes::notifications::mark_unread),
		)
		.route(
			"/notifications/{id}/readAll",
			patch(routes::notifications::mark_all_read),
		)
		.route_layer(map_response(declare_update));

	let audited = Router::new()
		.route(
			"/notifications/{id}",
			get(routes::notifications::list_notifications)
				.delete(routes::notifications::delete_notification),
		)
		.route(
			"/notifications/{id}/unread-count",
			get(routes::notifications::unread_count),
		)
		.route(
			"/notifications/user/{id}",
			delete(routes::notifications::delete_all_notifications),
		)
		.route("/subscribe", post(routes::push::subscribe))
		.route("/audit", get(routes::audit::list_audit_entries))
		.route("/internal/dispatch", post(routes::dispatch::dispatch_event))
		.merge(update_routes)
		.layer(from_fn_with_state(state.clone(), audit_layer))
		.layer(from_fn_with_state(state.clone(), actor_layer));

	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/ws", get(websocket::ws_upgrade_handler))
		.route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
		.merge(audited)
		.with_state(state)
}
