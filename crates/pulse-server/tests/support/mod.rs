// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
	body::Body,
	http::{header::CONTENT_TYPE, Method, Request, StatusCode},
	response::Response,
	Router,
};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pulse_notify_core::{PushPayload, PushSubscription};
use pulse_server::{create_app_state_with_transport, create_router, AppState, ServerConfig};
use pulse_server_audit::AuditEntry;
use pulse_server_db::AuditQuery;
use pulse_server_notify::{DeliveryError, PushTransport};

pub const ACTOR: &str = "controller";

/// Push transport that records what it was asked to send.
#[derive(Default)]
pub struct RecordingTransport {
	pub sent: Mutex<Vec<(String, PushPayload)>>,
}

#[async_trait]
impl PushTransport for RecordingTransport {
	async fn send(
		&self,
		subscription: &PushSubscription,
		payload: &PushPayload,
	) -> Result<(), DeliveryError> {
		self.sent
			.lock()
			.unwrap()
			.push((subscription.endpoint.clone(), payload.clone()));
		Ok(())
	}
}

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	pub push: Arc<RecordingTransport>,
	_temp_dir: TempDir,
}

impl TestApp {
	pub async fn new() -> Self {
		Self::with_config(test_config()).await
	}

	pub async fn with_config(config: ServerConfig) -> Self {
		let temp_dir = tempfile::tempdir().unwrap();
		let db_path = temp_dir.path().join("test_pulse.db");
		let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
		let pool = pulse_server_db::create_pool(&db_url).await.unwrap();
		pulse_server_db::run_migrations(&pool).await.unwrap();

		let push = Arc::new(RecordingTransport::default());
		let state = create_app_state_with_transport(pool, &config, push.clone()).unwrap();
		let router = create_router(state.clone());

		Self {
			router,
			state,
			push,
			_temp_dir: temp_dir,
		}
	}

	pub async fn get(&self, path: &str, actor: Option<&str>) -> Response<Body> {
		self
			.request(Method::GET, path, actor, Option::<()>::None)
			.await
	}

	pub async fn post<T: Serialize>(&self, path: &str, actor: Option<&str>, body: T) -> Response<Body> {
		self.request(Method::POST, path, actor, Some(body)).await
	}

	pub async fn patch(&self, path: &str, actor: Option<&str>) -> Response<Body> {
		self
			.request(Method::PATCH, path, actor, Option::<()>::None)
			.await
	}

	pub async fn delete(&self, path: &str, actor: Option<&str>) -> Response<Body> {
		self
			.request(Method::DELETE, path, actor, Option::<()>::None)
			.await
	}

	pub async fn post_raw(&self, path: &str, actor: Option<&str>, body: &'static str) -> Response<Body> {
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(path)
			.header(CONTENT_TYPE, "application/json");
		if let Some(actor) = actor {
			builder = builder.header("x-user-id", actor);
		}
		let request = builder.body(Body::from(body)).unwrap();
		self.router.clone().oneshot(request).await.unwrap()
	}

	async fn request<T: Serialize>(
		&self,
		method: Method,
		path: &str,
		actor: Option<&str>,
		body: Option<T>,
	) -> Response<Body> {
		let mut builder = Request::builder().method(method).uri(path);
		if let Some(actor) = actor {
			builder = builder.header("x-user-id", actor);
		}
		let request = match body {
			Some(body) => builder
				.header(CONTENT_TYPE, "application/json")
				.body(Body::from(serde_json::to_vec(&body).unwrap()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};
		self.router.clone().oneshot(request).await.unwrap()
	}

	/// Poll the ledger until `user` holds `expected` records.
	pub async fn wait_for_records(&self, user: &str, expected: usize) -> Vec<Value> {
		for _ in 0..100 {
			let response = self.get(&format!("/notifications/{user}"), Some(ACTOR)).await;
			let records = json_body(response).await;
			let records = records.as_array().cloned().unwrap_or_default();
			if records.len() >= expected {
				return records;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		panic!("timed out waiting for {expected} records for {user}");
	}

	/// Poll the audit trail until an entry for `path_prefix` is written.
	pub async fn wait_for_audit(&self, path_prefix: &str) -> Vec<AuditEntry> {
		let query = AuditQuery {
			path_prefix: Some(path_prefix.to_string()),
			..Default::default()
		};
		for _ in 0..100 {
			let (entries, _) = self.state.audit_repo.list(&query).await.unwrap();
			if !entries.is_empty() {
				return entries;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		panic!("timed out waiting for audit entry under {path_prefix}");
	}
}

pub fn test_config() -> ServerConfig {
	let mut config = ServerConfig::default();
	config.audit.hash_key = Some("test-audit-key".to_string());
	config
}

pub fn event(recipients: &[&str]) -> Value {
	serde_json::json!({
		"type": "Create Task",
		"recipients": recipients,
		"title": {"enUS": "New task", "zhHK": "新任務", "zhCN": "新任务"},
		"description": {"enUS": "t1", "zhHK": "t1", "zhCN": "t1"},
		"link": "/project/p1/task/t1",
	})
}

pub async fn json_body(response: Response<Body>) -> Value {
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	if bytes.is_empty() {
		return Value::Null;
	}
	serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
	assert_eq!(response.status(), expected, "unexpected status");
}
