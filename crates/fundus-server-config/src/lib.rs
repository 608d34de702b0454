// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Fundus server.
//!
//! Settings are layered from defaults, an optional TOML file and
//! `FUNDUS_SERVER_*` environment variables, later sources winning field by
//! field.
//!
//! ```ignore
//! use fundus_server_config::load_config;
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
pub use sources::{load_secret_env, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub auth: AuthConfig,
	pub identity: IdentityConfig,
	pub inference: InferenceConfig,
	pub webhook: WebhookConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`FUNDUS_SERVER_*`)
/// 2. Config file (`/etc/fundus/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let auth = layer.auth.unwrap_or_default().finalize()?;
	let identity = layer.identity.unwrap_or_default().finalize();
	let inference = layer.inference.unwrap_or_default().finalize();
	let webhook = layer.webhook.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&auth, &identity, &webhook)?;

	info!(
		host = %http.host,
		port = http.port,
		environment = %auth.environment,
		idp_configured = identity.secret_key.is_some(),
		webhook_configured = webhook.signing_secret.is_some(),
		inference_url = %inference.base_url,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		auth,
		identity,
		inference,
		webhook,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	auth: &AuthConfig,
	identity: &IdentityConfig,
	webhook: &WebhookConfig,
) -> Result<(), ConfigError> {
	if !auth.is_production() {
		return Ok(());
	}
	if identity.secret_key.is_none() {
		return Err(ConfigError::Validation(
			"FUNDUS_SERVER_ENV=production requires FUNDUS_SERVER_IDP_SECRET_KEY. \
			 In-memory identities are for development only."
				.to_string(),
		));
	}
	if webhook.signing_secret.is_none() {
		return Err(ConfigError::Validation(
			"FUNDUS_SERVER_ENV=production requires FUNDUS_SERVER_WEBHOOK_SECRET.".to_string(),
		));
	}
	Ok(())
}
