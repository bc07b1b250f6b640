// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuditConfigLayer, AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LiveConfigLayer,
	LogFormat, LoggingConfigLayer, PushConfigLayer, QueueOverflowPolicy,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/pulse/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PULSE_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()?),
			auth: Some(load_auth_from_env()),
			audit: Some(load_audit_from_env()?),
			live: Some(load_live_from_env()?),
			push: Some(load_push_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("PULSE_SERVER_HOST"),
		port: env_parse("PULSE_SERVER_PORT", "u16")?,
		cors_allowed_origins: env_list("PULSE_SERVER_CORS_ALLOWED_ORIGINS"),
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("PULSE_SERVER_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("PULSE_SERVER_LOG_FORMAT") {
		Some(v) => Some(LogFormat::from_str(&v).map_err(|message| ConfigError::InvalidValue {
			key: "PULSE_SERVER_LOG_FORMAT".to_string(),
			message,
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("PULSE_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_auth_from_env() -> AuthConfigLayer {
	AuthConfigLayer {
		actor_header: env_var("PULSE_SERVER_AUTH_ACTOR_HEADER"),
	}
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	let queue_overflow_policy = match env_var("PULSE_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY") {
		Some(v) => Some(QueueOverflowPolicy::from_str(&v).map_err(|message| {
			ConfigError::InvalidValue {
				key: "PULSE_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY".to_string(),
				message,
			}
		})?),
		None => None,
	};

	Ok(AuditConfigLayer {
		enabled: env_bool("PULSE_SERVER_AUDIT_ENABLED"),
		record_reads: env_bool("PULSE_SERVER_AUDIT_RECORD_READS"),
		queue_capacity: env_parse("PULSE_SERVER_AUDIT_QUEUE_CAPACITY", "usize")?,
		queue_overflow_policy,
		max_body_bytes: env_parse("PULSE_SERVER_AUDIT_MAX_BODY_BYTES", "usize")?,
		hash_key: env_var("PULSE_SERVER_AUDIT_HASH_KEY"),
	})
}

fn load_live_from_env() -> Result<LiveConfigLayer, ConfigError> {
	Ok(LiveConfigLayer {
		queue_capacity: env_parse("PULSE_SERVER_LIVE_QUEUE_CAPACITY", "usize")?,
		registration_timeout_secs: env_parse("PULSE_SERVER_LIVE_REGISTRATION_TIMEOUT_SECS", "u64")?,
		ping_interval_secs: env_parse("PULSE_SERVER_LIVE_PING_INTERVAL_SECS", "u64")?,
	})
}

fn load_push_from_env() -> Result<PushConfigLayer, ConfigError> {
	Ok(PushConfigLayer {
		enabled: env_bool("PULSE_SERVER_PUSH_ENABLED"),
		request_timeout_secs: env_parse("PULSE_SERVER_PUSH_REQUEST_TIMEOUT_SECS", "u64")?,
		ttl_secs: env_parse("PULSE_SERVER_PUSH_TTL_SECS", "u64")?,
	})
}
