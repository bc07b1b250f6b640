// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read access to the audit trail. Writes go through the audit sink and
//! entries are never updated or deleted.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use pulse_notify_core::UserId;
use pulse_server_audit::{AuditAction, AuditEntry};

use crate::error::{DbError, Result};
use crate::notification::{format_timestamp, parse_timestamp};

pub const DEFAULT_AUDIT_PAGE_SIZE: i64 = 50;
pub const MAX_AUDIT_PAGE_SIZE: i64 = 1000;

/// Filters for listing audit entries. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
	pub action: Option<AuditAction>,
	pub actor: Option<UserId>,
	pub path_prefix: Option<String>,
	pub from: Option<DateTime<Utc>>,
	pub to: Option<DateTime<Utc>>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[derive(Clone)]
pub struct AuditRepository {
	pool: SqlitePool,
}

fn escape_like(value: &str) -> String {
	let mut out = String::with_capacity(value.len() + 1);
	for c in value.chars() {
		if matches!(c, '%' | '_' | '\\') {
			out.push('\\');
		}
		out.push(c);
	}
	out.push('%');
	out
}

impl AuditRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// List entries newest first, returning the page and the total match count.
	#[instrument(skip(self))]
	pub async fn list(&self, query: &AuditQuery) -> Result<(Vec<AuditEntry>, i64)> {
		let limit = query
			.limit
			.unwrap_or(DEFAULT_AUDIT_PAGE_SIZE)
			.clamp(1, MAX_AUDIT_PAGE_SIZE);
		let offset = query.offset.unwrap_or(0).max(0);

		let mut conditions = vec!["1=1"];
		let mut binds: Vec<String> = Vec::new();
		if let Some(action) = query.action {
			conditions.push("action = ?");
			binds.push(action.as_str().to_string());
		}
		if let Some(actor) = &query.actor {
			conditions.push("actor_user_id = ?");
			binds.push(actor.as_str().to_string());
		}
		if let Some(prefix) = &query.path_prefix {
			conditions.push("request_path LIKE ? ESCAPE '\\'");
			binds.push(escape_like(prefix));
		}
		if let Some(from) = &query.from {
			conditions.push("timestamp >= ?");
			binds.push(format_timestamp(from));
		}
		if let Some(to) = &query.to {
			conditions.push("timestamp <= ?");
			binds.push(format_timestamp(to));
		}

		let where_clause = conditions.join(" AND ");

		let count_sql = format!("SELECT COUNT(*) as cnt FROM audit_entries WHERE {where_clause}");
		let mut count_query = sqlx::query(&count_sql);
		for value in &binds {
			count_query = count_query.bind(value);
		}
		let total: i64 = count_query.fetch_one(&self.pool).await?.get("cnt");

		let data_sql = format!(
			"SELECT id, action, timestamp, actor_user_id, source_address, \
			 request_method, request_path, request_payload, response_status, response_snapshot \
			 FROM audit_entries WHERE {where_clause} \
			 ORDER BY timestamp DESC, rowid DESC LIMIT ? OFFSET ?"
		);
		let mut data_query = sqlx::query_as::<_, AuditEntryRow>(&data_sql);
		for value in &binds {
			data_query = data_query.bind(value);
		}
		let rows = data_query
			.bind(limit)
			.bind(offset)
			.fetch_all(&self.pool)
			.await?;

		let entries = rows
			.into_iter()
			.map(TryInto::try_into)
			.collect::<Result<Vec<_>>>()?;
		Ok((entries, total))
	}
}

#[derive(sqlx::FromRow)]
struct AuditEntryRow {
	id: String,
	action: String,
	timestamp: String,
	actor_user_id: Option<String>,
	source_address: Option<String>,
	request_method: String,
	request_path: String,
	request_payload: String,
	response_status: i64,
	response_snapshot: String,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
	type Error = DbError;

	fn try_from(row: AuditEntryRow) -> Result<Self> {
		Ok(AuditEntry {
			id: uuid::Uuid::parse_str(&row.id)
				.map_err(|e| DbError::Internal(format!("invalid audit id: {e}")))?,
			action: row.action.parse().map_err(DbError::Internal)?,
			timestamp: parse_timestamp("timestamp", &row.timestamp)?,
			actor_user_id: row
				.actor_user_id
				.map(UserId::parse)
				.transpose()
				.map_err(|e| DbError::Internal(e.to_string()))?,
			source_address: row.source_address,
			request_method: row.request_method,
			request_path: row.request_path,
			request_payload: serde_json::from_str(&row.request_payload)?,
			response_status: u16::try_from(row.response_status)
				.map_err(|_| DbError::Internal(format!("invalid status {}", row.response_status)))?,
			response_snapshot: serde_json::from_str(&row.response_snapshot)?,
		})
	}
}
