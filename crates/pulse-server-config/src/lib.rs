// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the Pulse server.
//!
//! Configuration is layered from built-in defaults, an optional TOML file and
//! `PULSE_SERVER_*` environment variables, in increasing precedence.
//!
//! ```ignore
//! use pulse_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Minimum length of a configured audit hash key.
pub const MIN_AUDIT_HASH_KEY_LEN: usize = 16;

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub auth: AuthConfig,
	pub audit: AuditConfig,
	pub live: LiveConfig,
	pub push: PushConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`PULSE_SERVER_*`)
/// 2. Config file (`/etc/pulse/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		auth: layer.auth.unwrap_or_default().finalize(),
		audit: layer.audit.unwrap_or_default().finalize(),
		live: layer.live.unwrap_or_default().finalize(),
		push: layer.push.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		audit_enabled = config.audit.enabled,
		audit_hash_key_configured = config.audit.hash_key.is_some(),
		push_enabled = config.push.enabled,
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit.queue_capacity must be greater than zero".to_string(),
		));
	}
	if config.live.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"live.queue_capacity must be greater than zero".to_string(),
		));
	}
	if config.live.ping_interval.is_zero() {
		return Err(ConfigError::Validation(
			"live.ping_interval_secs must be greater than zero".to_string(),
		));
	}
	if let Some(key) = &config.audit.hash_key {
		if key.len() < MIN_AUDIT_HASH_KEY_LEN {
			return Err(ConfigError::Validation(format!(
				"audit.hash_key must be at least {MIN_AUDIT_HASH_KEY_LEN} bytes"
			)));
		}
	}
	if config.auth.actor_header.is_empty() {
		return Err(ConfigError::Validation(
			"auth.actor_header must not be empty".to_string(),
		));
	}

	Ok(())
}
