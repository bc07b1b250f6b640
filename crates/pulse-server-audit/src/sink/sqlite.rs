// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::SqlitePool;

use crate::error::AuditSinkError;
use crate::event::AuditEntry;
use crate::sink::AuditSink;

/// Appends entries to the `audit_entries` table. Rows are never updated.
pub struct SqliteAuditSink {
	pool: SqlitePool,
	name: String,
}

impl SqliteAuditSink {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			name: "sqlite".to_string(),
		}
	}
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
	fn name(&self) -> &str {
		&self.name
	}

	async fn publish(&self, entry: Arc<AuditEntry>) -> Result<(), AuditSinkError> {
		let payload_json = serde_json::to_string(&entry.request_payload)
			.map_err(|e| AuditSinkError::Permanent(format!("failed to serialize payload: {e}")))?;
		let snapshot_json = serde_json::to_string(&entry.response_snapshot)
			.map_err(|e| AuditSinkError::Permanent(format!("failed to serialize snapshot: {e}")))?;

		sqlx::query(
			r#"
			INSERT INTO audit_entries (
				id, action, timestamp, actor_user_id, source_address,
				request_method, request_path, request_payload,
				response_status, response_snapshot
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(entry.id.to_string())
		.bind(entry.action.as_str())
		.bind(entry.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
		.bind(entry.actor_user_id.as_ref().map(|u| u.as_str().to_string()))
		.bind(&entry.source_address)
		.bind(&entry.request_method)
		.bind(&entry.request_path)
		.bind(&payload_json)
		.bind(i64::from(entry.response_status))
		.bind(&snapshot_json)
		.execute(&self.pool)
		.await
		.map_err(|e| {
			if is_transient_error(&e) {
				AuditSinkError::Transient(format!("database error: {e}"))
			} else {
				AuditSinkError::Permanent(format!("database error: {e}"))
			}
		})?;

		Ok(())
	}

	async fn health_check(&self) -> Result<(), AuditSinkError> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map_err(|e| AuditSinkError::Transient(format!("health check failed: {e}")))?;
		Ok(())
	}
}

fn is_transient_error(e: &sqlx::Error) -> bool {
	match e {
		sqlx::Error::Io(_) => true,
		sqlx::Error::PoolTimedOut => true,
		sqlx::Error::PoolClosed => true,
		sqlx::Error::Database(db_err) => {
			let msg = db_err.message().to_lowercase();
			msg.contains("busy") || msg.contains("locked")
		}
		_ => false,
	}
}
