// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validation errors for inbound identifiers and events.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// User id was empty, too long or contained forbidden characters
	#[error("invalid user id '{value}': {reason}")]
	InvalidUserId { value: String, reason: &'static str },

	/// Notification id was not a UUID
	#[error("invalid notification id: {0}")]
	InvalidNotificationId(String),

	/// A required field was empty
	#[error("missing required field: {0}")]
	MissingField(&'static str),

	/// Deep link was not an absolute path
	#[error("invalid link '{0}': must start with '/'")]
	InvalidLink(String),
}
