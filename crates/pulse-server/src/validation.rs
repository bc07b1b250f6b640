// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Path parameter parsing shared by handlers.

use pulse_notify_core::{NotificationId, UserId};

/// Error type for id parsing failures.
#[derive(Debug, Clone)]
pub struct IdParseError {
	pub error: String,
	pub message: String,
}

impl IdParseError {
	fn invalid_id(message: impl Into<String>) -> Self {
		Self {
			error: "invalid_id".to_string(),
			message: message.into(),
		}
	}
}

pub fn parse_user_id(id_str: &str) -> Result<UserId, IdParseError> {
	UserId::parse(id_str).map_err(|e| IdParseError::invalid_id(e.to_string()))
}

pub fn parse_notification_id(id_str: &str) -> Result<NotificationId, IdParseError> {
	id_str
		.parse::<NotificationId>()
		.map_err(|e| IdParseError::invalid_id(e.to_string()))
}
