// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit entry types.

use chrono::{DateTime, Utc};
use pulse_notify_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of operation a request performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
	Create,
	Read,
	Update,
	Delete,
	Login,
	Register,
	Unknown,
}

impl AuditAction {
	/// Derive the action from the request method and route path.
	///
	/// Methods without a fixed mapping fall back to `declared`, then `Unknown`.
	pub fn derive(method: &str, path: &str, declared: Option<AuditAction>) -> AuditAction {
		match method.to_ascii_uppercase().as_str() {
			"GET" => AuditAction::Read,
			"POST" => {
				let last = path
					.trim_end_matches('/')
					.rsplit('/')
					.next()
					.unwrap_or_default()
					.to_ascii_lowercase();
				match last.as_str() {
					"login" | "signin" => AuditAction::Login,
					"register" | "signup" => AuditAction::Register,
					_ => AuditAction::Create,
				}
			}
			"PUT" => AuditAction::Update,
			"DELETE" => AuditAction::Delete,
			_ => declared.unwrap_or(AuditAction::Unknown),
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			AuditAction::Create => "create",
			AuditAction::Read => "read",
			AuditAction::Update => "update",
			AuditAction::Delete => "delete",
			AuditAction::Login => "login",
			AuditAction::Register => "register",
			AuditAction::Unknown => "unknown",
		}
	}
}

impl std::fmt::Display for AuditAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for AuditAction {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"create" => Ok(AuditAction::Create),
			"read" => Ok(AuditAction::Read),
			"update" => Ok(AuditAction::Update),
			"delete" => Ok(AuditAction::Delete),
			"login" => Ok(AuditAction::Login),
			"register" => Ok(AuditAction::Register),
			"unknown" => Ok(AuditAction::Unknown),
			other => Err(format!("unknown audit action: {other}")),
		}
	}
}

/// Immutable record of one request.
///
/// Payload and snapshot are stored already sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
	pub id: Uuid,
	pub action: AuditAction,
	pub timestamp: DateTime<Utc>,
	pub actor_user_id: Option<UserId>,
	pub source_address: Option<String>,
	pub request_method: String,
	pub request_path: String,
	pub request_payload: serde_json::Value,
	pub response_status: u16,
	pub response_snapshot: serde_json::Value,
}

impl AuditEntry {
	pub fn builder(method: impl Into<String>, path: impl Into<String>) -> AuditEntryBuilder {
		AuditEntryBuilder::new(method, path)
	}
}

pub struct AuditEntryBuilder {
	method: String,
	path: String,
	declared_action: Option<AuditAction>,
	actor_user_id: Option<UserId>,
	source_address: Option<String>,
	request_payload: serde_json::Value,
	response_status: u16,
	response_snapshot: serde_json::Value,
}

impl AuditEntryBuilder {
	pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			method: method.into(),
			path: path.into(),
			declared_action: None,
			actor_user_id: None,
			source_address: None,
			request_payload: serde_json::Value::Null,
			response_status: 0,
			response_snapshot: serde_json::Value::Null,
		}
	}

	/// Action declared by the route, used when the method has no fixed mapping.
	pub fn declared_action(mut self, action: AuditAction) -> Self {
		self.declared_action = Some(action);
		self
	}

	pub fn actor(mut self, user_id: UserId) -> Self {
		self.actor_user_id = Some(user_id);
		self
	}

	pub fn source_address(mut self, addr: impl Into<String>) -> Self {
		self.source_address = Some(addr.into());
		self
	}

	pub fn request_payload(mut self, payload: serde_json::Value) -> Self {
		self.request_payload = payload;
		self
	}

	pub fn response(mut self, status: u16, snapshot: serde_json::Value) -> Self {
		self.response_status = status;
		self.response_snapshot = snapshot;
		self
	}

	pub fn build(self) -> AuditEntry {
		AuditEntry {
			id: Uuid::new_v4(),
			action: AuditAction::derive(&self.method, &self.path, self.declared_action),
			timestamp: Utc::now(),
			actor_user_id: self.actor_user_id,
			source_address: self.source_address,
			request_method: self.method,
			request_path: self.path,
			request_payload: self.request_payload,
			response_status: self.response_status,
			response_snapshot: self.response_snapshot,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_fixed_method_mapping() {
		assert_eq!(AuditAction::derive("GET", "/notifications/u1", None), AuditAction::Read);
		assert_eq!(AuditAction::derive("POST", "/subscribe", None), AuditAction::Create);
		assert_eq!(AuditAction::derive("PUT", "/tasks/t1", None), AuditAction::Update);
		assert_eq!(AuditAction::derive("DELETE", "/notifications/x", None), AuditAction::Delete);
	}

	#[test]
	fn test_login_and_register_routes() {
		assert_eq!(AuditAction::derive("POST", "/auth/login", None), AuditAction::Login);
		assert_eq!(AuditAction::derive("POST", "/auth/signin/", None), AuditAction::Login);
		assert_eq!(AuditAction::derive("POST", "/auth/register", None), AuditAction::Register);
		assert_eq!(AuditAction::derive("POST", "/signup", None), AuditAction::Register);
	}

	#[test]
	fn test_fixed_mapping_ignores_declared() {
		assert_eq!(
			AuditAction::derive("GET", "/x", Some(AuditAction::Delete)),
			AuditAction::Read
		);
	}

	#[test]
	fn test_declared_fallback() {
		assert_eq!(
			AuditAction::derive("PATCH", "/notifications/x/read", Some(AuditAction::Update)),
			AuditAction::Update
		);
		assert_eq!(AuditAction::derive("PATCH", "/x", None), AuditAction::Unknown);
	}

	#[test]
	fn test_builder_derives_action() {
		let entry = AuditEntry::builder("DELETE", "/notifications/user/u1")
			.actor(UserId::parse("u1").unwrap())
			.response(200, serde_json::json!({"count": 3}))
			.build();
		assert_eq!(entry.action, AuditAction::Delete);
		assert_eq!(entry.response_status, 200);
		assert_eq!(entry.actor_user_id.as_ref().map(UserId::as_str), Some("u1"));
	}
}
