// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ledger record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::{NotificationId, UserId};

/// Text carried in every supported locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LocalizedText {
	#[serde(rename = "enUS")]
	pub en_us: String,
	#[serde(rename = "zhHK")]
	pub zh_hk: String,
	#[serde(rename = "zhCN")]
	pub zh_cn: String,
}

impl LocalizedText {
	pub fn new(
		en_us: impl Into<String>,
		zh_hk: impl Into<String>,
		zh_cn: impl Into<String>,
	) -> Self {
		Self {
			en_us: en_us.into(),
			zh_hk: zh_hk.into(),
			zh_cn: zh_cn.into(),
		}
	}

	/// Same text in every locale.
	pub fn uniform(text: impl Into<String>) -> Self {
		let text = text.into();
		Self {
			en_us: text.clone(),
			zh_hk: text.clone(),
			zh_cn: text,
		}
	}
}

/// A durable notification owned by its recipient.
///
/// Content fields are fixed at creation; only `read` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
	pub id: NotificationId,
	pub recipient_user_id: UserId,
	/// Kind of business event that produced this record, e.g. `"Create Task"`.
	#[serde(rename = "type")]
	pub kind: String,
	pub title: LocalizedText,
	pub description: LocalizedText,
	pub link: String,
	pub read: bool,
	pub created_at: DateTime<Utc>,
}

/// Input for a ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
	pub recipient_user_id: UserId,
	pub kind: String,
	pub title: LocalizedText,
	pub description: LocalizedText,
	pub link: String,
}

impl NewNotification {
	pub fn validate(&self) -> Result<(), ValidationError> {
		validate_content(&self.kind, &self.title, &self.link)
	}
}

pub(crate) fn validate_content(
	kind: &str,
	title: &LocalizedText,
	link: &str,
) -> Result<(), ValidationError> {
	if kind.trim().is_empty() {
		return Err(ValidationError::MissingField("type"));
	}
	if title.en_us.trim().is_empty() {
		return Err(ValidationError::MissingField("title.enUS"));
	}
	if !link.starts_with('/') {
		return Err(ValidationError::InvalidLink(link.to_string()));
	}
	Ok(())
}
