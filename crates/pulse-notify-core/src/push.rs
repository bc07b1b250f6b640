// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External push delivery types.

use serde::{Deserialize, Serialize};

use crate::notification::NotificationRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PushKeys {
	pub p256dh: String,
	pub auth: String,
}

/// Opaque delivery endpoint registered by a user's browser or device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PushSubscription {
	pub endpoint: String,
	pub keys: PushKeys,
}

/// Condensed payload sent through the push service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PushPayload {
	pub title: String,
	pub body: String,
	pub link: String,
}

impl From<&NotificationRecord> for PushPayload {
	fn from(record: &NotificationRecord) -> Self {
		Self {
			title: record.title.en_us.clone(),
			body: record.description.en_us.clone(),
			link: record.link.clone(),
		}
	}
}
