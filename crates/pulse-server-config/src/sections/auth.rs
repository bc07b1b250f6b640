// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actor context supplied by the upstream auth layer.

use serde::Deserialize;

pub const DEFAULT_ACTOR_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Request header carrying the authenticated user id.
	pub actor_header: String,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			actor_header: DEFAULT_ACTOR_HEADER.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub actor_header: Option<String>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.actor_header.is_some() {
			self.actor_header = other.actor_header;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			actor_header: self
				.actor_header
				.map(|h| h.to_ascii_lowercase())
				.unwrap_or_else(|| DEFAULT_ACTOR_HEADER.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_name_is_lowercased() {
		let layer = AuthConfigLayer {
			actor_header: Some("X-Actor-Id".to_string()),
		};
		assert_eq!(layer.finalize().actor_header, "x-actor-id");
	}
}
