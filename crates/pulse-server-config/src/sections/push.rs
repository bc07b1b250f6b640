// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External push service settings.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
	pub enabled: bool,
	/// Per-request timeout. `None` leaves the HTTP client default in place.
	pub request_timeout: Option<Duration>,
	/// Value of the `TTL` header: how long the push service may hold a message.
	pub ttl_secs: u64,
}

impl Default for PushConfig {
	fn default() -> Self {
		PushConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushConfigLayer {
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub ttl_secs: Option<u64>,
}

impl PushConfigLayer {
	pub fn merge(&mut self, other: PushConfigLayer) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.ttl_secs.is_some() {
			self.ttl_secs = other.ttl_secs;
		}
	}

	pub fn finalize(self) -> PushConfig {
		PushConfig {
			enabled: self.enabled.unwrap_or(true),
			request_timeout: self.request_timeout_secs.map(Duration::from_secs),
			ttl_secs: self.ttl_secs.unwrap_or(86_400),
		}
	}
}
