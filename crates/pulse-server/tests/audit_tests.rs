// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit recorder behaviour observed through the HTTP surface.

mod support;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use pulse_server_audit::AuditAction;
use pulse_server_db::AuditQuery;

use support::{assert_status, event, json_body, test_config, TestApp, ACTOR};

#[tokio::test]
async fn test_password_fields_are_hashed() {
	let app = TestApp::new().await;

	let mut body = event(&["u1"]);
	body["password"] = json!("hunter2");
	body["credentials"] = json!({"newPassword": "hunter3", "user": "u1"});
	let response = app.post("/internal/dispatch", Some(ACTOR), body).await;
	assert_status(&response, StatusCode::ACCEPTED);

	let entries = app.wait_for_audit("/internal/dispatch").await;
	let entry = &entries[0];
	assert_eq!(entry.action, AuditAction::Create);
	assert_eq!(entry.actor_user_id.as_ref().map(|a| a.as_str()), Some(ACTOR));
	assert_eq!(entry.response_status, 202);
	assert_eq!(entry.response_snapshot, json!({"accepted_recipients": 1}));

	let password = entry.request_payload["password"].as_str().unwrap();
	assert!(password.starts_with("hmac-sha256:"));
	assert_eq!(entry.request_payload["credentials"]["user"], "u1");
	assert_eq!(entry.request_payload["type"], "Create Task");

	let serialized = serde_json::to_string(entry).unwrap();
	assert!(!serialized.contains("hunter2"));
	assert!(!serialized.contains("hunter3"));
}

#[tokio::test]
async fn test_patch_routes_are_recorded_as_update() {
	let app = TestApp::new().await;
	let response = app.patch("/notifications/u1/readAll", Some(ACTOR)).await;
	assert_status(&response, StatusCode::OK);

	let entries = app.wait_for_audit("/notifications/u1/readAll").await;
	assert_eq!(entries[0].action, AuditAction::Update);
	assert_eq!(entries[0].request_method, "PATCH");
	assert_eq!(entries[0].response_snapshot, json!({"count": 0}));
}

#[tokio::test]
async fn test_rejected_requests_are_recorded() {
	let app = TestApp::new().await;
	let response = app.delete("/notifications/user/u1", None).await;
	assert_status(&response, StatusCode::UNAUTHORIZED);

	let entries = app.wait_for_audit("/notifications/user/u1").await;
	assert_eq!(entries[0].action, AuditAction::Delete);
	assert_eq!(entries[0].response_status, 401);
	assert!(entries[0].actor_user_id.is_none());
}

#[tokio::test]
async fn test_audit_listing_filters_by_action() {
	let app = TestApp::new().await;
	let unknown = uuid::Uuid::new_v4();
	let response = app.delete(&format!("/notifications/{unknown}"), Some(ACTOR)).await;
	assert_status(&response, StatusCode::NOT_FOUND);
	app.wait_for_audit(&format!("/notifications/{unknown}")).await;

	let response = app.get("/audit?action=delete", Some(ACTOR)).await;
	assert_status(&response, StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["total"], 1);
	let entry = &body["entries"][0];
	assert_eq!(entry["action"], "delete");
	assert_eq!(entry["response_status"], 404);
	assert_eq!(entry["request_path"], format!("/notifications/{unknown}"));
	assert_eq!(entry["actor_user_id"], ACTOR);
}

#[tokio::test]
async fn test_audit_listing_rejects_bad_filters() {
	let app = TestApp::new().await;
	for query in ["action=explode", "limit=0", "limit=1001", "actor=has%20space"] {
		let response = app.get(&format!("/audit?{query}"), Some(ACTOR)).await;
		assert_status(&response, StatusCode::BAD_REQUEST);
	}
}

#[tokio::test]
async fn test_reads_skipped_when_not_recorded() {
	let mut config = test_config();
	config.audit.record_reads = false;
	let app = TestApp::with_config(config).await;

	let response = app.get("/notifications/u1", Some(ACTOR)).await;
	assert_status(&response, StatusCode::OK);
	app.delete("/notifications/user/u1", Some(ACTOR)).await;

	app.wait_for_audit("/notifications/user/u1").await;
	// sink publishes run concurrently; leave time for a stray read entry to land
	tokio::time::sleep(Duration::from_millis(100)).await;
	let (reads, total) = app
		.state
		.audit_repo
		.list(&AuditQuery {
			action: Some(AuditAction::Read),
			..Default::default()
		})
		.await
		.unwrap();
	assert!(reads.is_empty());
	assert_eq!(total, 0);
}

#[tokio::test]
async fn test_disabled_recorder_writes_nothing() {
	let mut config = test_config();
	config.audit.enabled = false;
	let app = TestApp::with_config(config).await;

	app.patch("/notifications/u1/readAll", Some(ACTOR)).await;
	tokio::time::sleep(Duration::from_millis(50)).await;

	let (entries, total) = app.state.audit_repo.list(&AuditQuery::default()).await.unwrap();
	assert!(entries.is_empty());
	assert_eq!(total, 0);
	assert_eq!(app.state.audit_service.stats().enqueued, 0);
}

#[tokio::test]
async fn test_health_reports_cleanly_after_audited_traffic() {
	let app = TestApp::new().await;
	app.patch("/notifications/u1/readAll", Some(ACTOR)).await;
	app.wait_for_audit("/notifications/u1/readAll").await;

	let health = json_body(app.get("/health", None).await).await;
	assert_eq!(health["status"], "healthy");
	assert_eq!(health["audit"]["dropped"], 0);
	assert_eq!(health["audit"]["publish_failures"], 0);
}
