// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One-way hashing of password-like fields in captured payloads.
//!
//! Any object key whose lowercase form contains `password`, `passwd` or
//! `passphrase`, or equals `pwd`, has its value replaced with
//! `hmac-sha256:<hex>` keyed by the process audit key. The walk descends
//! through nested objects and arrays. Equal inputs hash equally under the
//! same key, so entries stay correlatable without revealing the value.

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::Value;
use sha2::Sha256;

use crate::error::AuditError;

type HmacSha256 = Hmac<Sha256>;

pub const HASH_PREFIX: &str = "hmac-sha256:";

const RANDOM_KEY_LEN: usize = 32;

pub fn is_sensitive_key(key: &str) -> bool {
	let key = key.to_ascii_lowercase();
	key == "pwd" || key.contains("password") || key.contains("passwd") || key.contains("passphrase")
}

#[derive(Clone)]
pub struct PayloadSanitizer {
	mac: HmacSha256,
}

impl std::fmt::Debug for PayloadSanitizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PayloadSanitizer").finish_non_exhaustive()
	}
}

impl PayloadSanitizer {
	pub fn new(key: &[u8]) -> Result<Self, AuditError> {
		let mac = HmacSha256::new_from_slice(key)
			.map_err(|e| AuditError::ConfigError(format!("invalid audit hash key: {e}")))?;
		Ok(Self { mac })
	}

	/// Sanitizer keyed with fresh random bytes; hashes are stable for the process lifetime only.
	pub fn random() -> Result<Self, AuditError> {
		let mut key = [0u8; RANDOM_KEY_LEN];
		rand::rngs::OsRng.fill_bytes(&mut key);
		Self::new(&key)
	}

	pub fn hash(&self, value: &str) -> String {
		let mut mac = self.mac.clone();
		mac.update(value.as_bytes());
		format!("{HASH_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
	}

	pub fn sanitize(&self, value: &mut Value) {
		match value {
			Value::Object(map) => {
				for (key, field) in map.iter_mut() {
					if is_sensitive_key(key) {
						self.replace(field);
					} else {
						self.sanitize(field);
					}
				}
			}
			Value::Array(items) => {
				for item in items {
					self.sanitize(item);
				}
			}
			_ => {}
		}
	}

	pub fn sanitized(&self, mut value: Value) -> Value {
		self.sanitize(&mut value);
		value
	}

	fn replace(&self, field: &mut Value) {
		let hashed = match &*field {
			Value::Null => return,
			Value::String(s) => self.hash(s),
			other => self.hash(&other.to_string()),
		};
		*field = Value::String(hashed);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	fn sanitizer() -> PayloadSanitizer {
		PayloadSanitizer::new(b"test-audit-key-0123456789").unwrap()
	}

	#[test]
	fn test_sensitive_key_matching() {
		assert!(is_sensitive_key("password"));
		assert!(is_sensitive_key("newPassword"));
		assert!(is_sensitive_key("PASSWD"));
		assert!(is_sensitive_key("pwd"));
		assert!(is_sensitive_key("confirm_passphrase"));
		assert!(!is_sensitive_key("username"));
		assert!(!is_sensitive_key("pwdx"));
	}

	#[test]
	fn test_top_level_password_hashed() {
		let out = sanitizer().sanitized(json!({"username": "alice", "password": "hunter2"}));
		assert_eq!(out["username"], "alice");
		let hashed = out["password"].as_str().unwrap();
		assert!(hashed.starts_with(HASH_PREFIX));
		assert_eq!(hashed.len(), HASH_PREFIX.len() + 64);
		assert!(!hashed.contains("hunter2"));
	}

	#[test]
	fn test_nested_and_array_fields() {
		let out = sanitizer().sanitized(json!({
			"user": {"credentials": {"oldPassword": "a", "newPassword": "b"}},
			"batch": [{"pwd": "c"}, {"name": "d"}]
		}));
		let text = out.to_string();
		assert!(!text.contains("\"a\""));
		assert!(!text.contains("\"b\""));
		assert!(!text.contains("\"c\""));
		assert_eq!(out["batch"][1]["name"], "d");
	}

	#[test]
	fn test_non_string_values_hashed() {
		let out = sanitizer().sanitized(json!({"password": 123456, "passwords": ["x"]}));
		assert!(out["password"].as_str().unwrap().starts_with(HASH_PREFIX));
		assert!(out["passwords"].as_str().unwrap().starts_with(HASH_PREFIX));
	}

	#[test]
	fn test_nested_non_string_and_null_fields() {
		let out = sanitizer().sanitized(json!({
			"a": {"password": 123, "pwd": {"inner": true}},
			"passphrase": null
		}));
		assert!(out["a"]["password"].as_str().unwrap().starts_with(HASH_PREFIX));
		assert!(out["a"]["pwd"].as_str().unwrap().starts_with(HASH_PREFIX));
		assert_ne!(out["a"]["password"], out["a"]["pwd"]);
		assert!(out["passphrase"].is_null());
	}

	#[test]
	fn test_hash_is_keyed() {
		let a = PayloadSanitizer::new(b"key-one-0123456789").unwrap();
		let b = PayloadSanitizer::new(b"key-two-0123456789").unwrap();
		assert_eq!(a.hash("secret"), a.hash("secret"));
		assert_ne!(a.hash("secret"), b.hash("secret"));
	}

	#[test]
	fn test_random_sanitizers_differ() {
		let a = PayloadSanitizer::random().unwrap();
		let b = PayloadSanitizer::random().unwrap();
		assert_ne!(a.hash("secret"), b.hash("secret"));
	}

	proptest! {
		#[test]
		fn plaintext_never_survives(secret in "[a-zA-Z0-9]{12,32}", depth in 0usize..4) {
			let mut value = json!({"password": secret.clone()});
			for _ in 0..depth {
				value = json!({"nested": [value]});
			}
			let out = sanitizer().sanitized(value);
			prop_assert!(!out.to_string().contains(&secret));
		}
	}
}
