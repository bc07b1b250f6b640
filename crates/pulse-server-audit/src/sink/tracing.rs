// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::event::AuditEntry;
use crate::sink::AuditSink;

/// Emits each entry as a structured event on the `audit` target.
pub struct TracingAuditSink {
	name: String,
}

impl TracingAuditSink {
	pub fn new() -> Self {
		Self {
			name: "tracing".to_string(),
		}
	}
}

impl Default for TracingAuditSink {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		&self.name
	}

	async fn publish(&self, entry: Arc<AuditEntry>) -> Result<(), AuditSinkError> {
		::tracing::info!(
			target: "audit",
			audit_id = %entry.id,
			action = %entry.action,
			actor = entry.actor_user_id.as_ref().map(|u| u.as_str()).unwrap_or("-"),
			source = entry.source_address.as_deref().unwrap_or("-"),
			method = %entry.request_method,
			path = %entry.request_path,
			status = entry.response_status,
			"request audited"
		);
		Ok(())
	}
}
