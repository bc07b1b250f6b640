// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Query parameters for `GET /audit`. All filters are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct ListAuditEntriesParams {
	/// One of `create`, `read`, `update`, `delete`, `login`, `register`, `unknown`.
	pub action: Option<String>,
	pub actor: Option<String>,
	pub path_prefix: Option<String>,
	pub from: Option<DateTime<Utc>>,
	pub to: Option<DateTime<Utc>>,
	/// Page size, at most 1000.
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuditEntryResponse {
	pub id: Uuid,
	pub action: String,
	pub timestamp: DateTime<Utc>,
	pub actor_user_id: Option<String>,
	pub source_address: Option<String>,
	pub request_method: String,
	pub request_path: String,
	#[cfg_attr(feature = "openapi", schema(value_type = Object))]
	pub request_payload: serde_json::Value,
	pub response_status: u16,
	#[cfg_attr(feature = "openapi", schema(value_type = Object))]
	pub response_snapshot: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListAuditEntriesResponse {
	pub entries: Vec<AuditEntryResponse>,
	pub total: i64,
}
