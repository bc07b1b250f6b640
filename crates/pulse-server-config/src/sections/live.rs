// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live channel (WebSocket) settings.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
	/// Outbound frames buffered per session before deliveries fail.
	pub queue_capacity: usize,
	/// Time a client has to send its `register` message after upgrade.
	pub registration_timeout: Duration,
	pub ping_interval: Duration,
}

impl Default for LiveConfig {
	fn default() -> Self {
		LiveConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveConfigLayer {
	#[serde(default)]
	pub queue_capacity: Option<usize>,
	#[serde(default)]
	pub registration_timeout_secs: Option<u64>,
	#[serde(default)]
	pub ping_interval_secs: Option<u64>,
}

impl LiveConfigLayer {
	pub fn merge(&mut self, other: LiveConfigLayer) {
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
		if other.registration_timeout_secs.is_some() {
			self.registration_timeout_secs = other.registration_timeout_secs;
		}
		if other.ping_interval_secs.is_some() {
			self.ping_interval_secs = other.ping_interval_secs;
		}
	}

	pub fn finalize(self) -> LiveConfig {
		LiveConfig {
			queue_capacity: self.queue_capacity.unwrap_or(64),
			registration_timeout: Duration::from_secs(self.registration_timeout_secs.unwrap_or(10)),
			ping_interval: Duration::from_secs(self.ping_interval_secs.unwrap_or(30)),
		}
	}
}
