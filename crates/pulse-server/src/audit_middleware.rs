// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request/response audit recorder.
//!
//! Wraps the API router and writes one [`AuditEntry`] per request once the
//! handler has produced its response. Bodies are buffered only when their
//! exact length is known and within `audit.max_body_bytes`, so streaming or
//! oversized bodies pass through untouched. Payloads and snapshots are
//! sanitized before they leave this module.
//!
//! The entry is enqueued with [`AuditService::try_log`]. A failed enqueue is
//! logged at `error` with `audit_failure = "pre_response"` and does not change
//! the response.
//!
//! [`AuditService::try_log`]: pulse_server_audit::AuditService::try_log

use std::net::SocketAddr;

use axum::{
	body::{Body, Bytes, HttpBody},
	extract::{ConnectInfo, State},
	http::{header::CONTENT_TYPE, HeaderMap, Method, Request},
	middleware::Next,
	response::Response,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};

use pulse_server_audit::{AuditAction, AuditEntry};

use crate::api::AppState;
use crate::auth_middleware::ActorContext;

/// Action a route declares for methods without a fixed mapping.
///
/// Routes attach it as a response extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredAction(pub AuditAction);

/// Route layer for PATCH routes: records them as `Update`.
pub async fn declare_update(mut response: Response) -> Response {
	response
		.extensions_mut()
		.insert(DeclaredAction(AuditAction::Update));
	response
}

fn is_json(content_type: &str) -> bool {
	let essence = content_type
		.split(';')
		.next()
		.unwrap_or_default()
		.trim()
		.to_ascii_lowercase();
	essence == "application/json" || essence.ends_with("+json")
}

/// Buffer `body` for the audit record if it is small, known-length JSON.
///
/// Returns the body to forward (identical bytes when buffered, the read error
/// when buffering failed) and the captured value.
async fn capture_body(headers: &HeaderMap, body: Body, max_bytes: usize) -> (Body, Value) {
	let hint = body.size_hint();
	if hint.exact() == Some(0) {
		return (body, Value::Null);
	}

	let content_type = headers
		.get(CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.unwrap_or_default()
		.to_string();
	if !is_json(&content_type) {
		return (body, json!({"captured": false, "content_type": content_type}));
	}

	let exact = match hint.exact() {
		Some(n) if n <= max_bytes as u64 => n,
		Some(n) => return (body, json!({"captured": false, "bytes": n})),
		None => return (body, json!({"captured": false, "bytes": hint.lower()})),
	};

	match body.collect().await {
		Ok(collected) => {
			let bytes = collected.to_bytes();
			let value = serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| {
				json!({"captured": false, "content_type": content_type, "bytes": exact})
			});
			(Body::from(bytes), value)
		}
		Err(e) => {
			tracing::warn!(error = %e, "failed to read body for audit capture");
			// the reader still sees the failure
			let failed = futures::stream::once(async move { Err::<Bytes, _>(e) });
			(Body::from_stream(failed), json!({"captured": false, "bytes": exact}))
		}
	}
}

/// First `X-Forwarded-For` hop, else the socket peer when known.
fn source_address(request: &Request<Body>) -> Option<String> {
	let forwarded = request
		.headers()
		.get("x-forwarded-for")
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.split(',').next())
		.map(str::trim)
		.filter(|ip| !ip.is_empty())
		.map(str::to_string);

	forwarded.or_else(|| {
		request
			.extensions()
			.get::<ConnectInfo<SocketAddr>>()
			.map(|ConnectInfo(addr)| addr.ip().to_string())
	})
}

pub async fn audit_layer(
	State(state): State<AppState>,
	request: Request<Body>,
	next: Next,
) -> Response {
	let config = &state.audit_config;
	if !config.enabled || (!config.record_reads && request.method() == Method::GET) {
		return next.run(request).await;
	}

	let method = request.method().to_string();
	let path = request.uri().path().to_string();
	let actor = request
		.extensions()
		.get::<ActorContext>()
		.and_then(|ctx| ctx.actor.clone());
	let source = source_address(&request);

	let (parts, body) = request.into_parts();
	let (body, request_payload) = capture_body(&parts.headers, body, config.max_body_bytes).await;

	let response = next.run(Request::from_parts(parts, body)).await;

	let status = response.status().as_u16();
	let declared = response.extensions().get::<DeclaredAction>().map(|d| d.0);
	let (parts, body) = response.into_parts();
	let (body, snapshot) = capture_body(&parts.headers, body, config.max_body_bytes).await;

	let mut builder = AuditEntry::builder(method, path)
		.request_payload(state.sanitizer.sanitized(request_payload))
		.response(status, state.sanitizer.sanitized(snapshot));
	if let Some(action) = declared {
		builder = builder.declared_action(action);
	}
	if let Some(actor) = actor {
		builder = builder.actor(actor);
	}
	if let Some(source) = source {
		builder = builder.source_address(source);
	}
	let entry = builder.build();
	let entry_id = entry.id;

	if let Err(e) = state.audit_service.try_log(entry) {
		tracing::error!(
			audit_failure = "pre_response",
			audit_entry_id = %entry_id,
			error = %e,
			"failed to enqueue audit entry"
		);
	}

	Response::from_parts(parts, body)
}
