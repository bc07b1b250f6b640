// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum accepted length of a user id, in bytes.
pub const MAX_USER_ID_LEN: usize = 64;

/// Opaque user identifier issued by the external auth system.
///
/// Construction always validates, so a `UserId` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = String, example = "u1"))]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
	pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
		let value = value.into();
		if value.is_empty() {
			return Err(ValidationError::InvalidUserId {
				value,
				reason: "must not be empty",
			});
		}
		if value.len() > MAX_USER_ID_LEN {
			return Err(ValidationError::InvalidUserId {
				value,
				reason: "must be at most 64 bytes",
			});
		}
		if !value
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
		{
			return Err(ValidationError::InvalidUserId {
				value,
				reason: "may only contain ASCII letters, digits, '-', '_' and '.'",
			});
		}
		Ok(Self(value))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl TryFrom<String> for UserId {
	type Error = ValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}

impl From<UserId> for String {
	fn from(id: UserId) -> Self {
		id.0
	}
}

impl std::str::FromStr for UserId {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl std::fmt::Display for UserId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Unique identifier for a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = String, format = Uuid))]
#[serde(transparent)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	#[must_use]
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}

impl Default for NotificationId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for NotificationId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::str::FromStr for NotificationId {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s)
			.map(Self)
			.map_err(|_| ValidationError::InvalidNotificationId(s.to_string()))
	}
}
