// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use fundus_common_secret::SecretString;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, HttpConfigLayer, IdentityConfigLayer, InferenceConfigLayer,
	LoggingConfigLayer, SessionAlgorithm, WebhookConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

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

/// TOML file configuration source. A missing file is an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/fundus/server.toml")
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
/// Convention: FUNDUS_SERVER_<FIELD>
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
			auth: Some(load_auth_from_env()?),
			identity: Some(load_identity_from_env()?),
			inference: Some(load_inference_from_env()?),
			webhook: Some(load_webhook_from_env()?),
			logging: Some(load_logging_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u16 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Reads a secret from `NAME`, or from the file named by `NAME_FILE`.
///
/// Setting both is an error. Trailing newlines in the file are dropped.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, ConfigError> {
	let file_var = format!("{name}_FILE");
	match (env_var(name), env_var(&file_var)) {
		(Some(_), Some(_)) => Err(ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("both {name} and {file_var} are set"),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			let content = std::fs::read_to_string(&path)
				.map_err(|source| ConfigError::FileRead { path, source })?;
			Ok(Some(SecretString::new(
				content.trim_end_matches(['\r', '\n']).to_string(),
			)))
		}
		(None, None) => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("FUNDUS_SERVER_HOST"),
		port: env_u16("FUNDUS_SERVER_PORT")?,
		base_url: env_var("FUNDUS_SERVER_BASE_URL"),
	})
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	let session_algorithm = env_var("FUNDUS_SERVER_SESSION_ALGORITHM")
		.map(|v| {
			v.parse::<SessionAlgorithm>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "FUNDUS_SERVER_SESSION_ALGORITHM".to_string(),
					message,
				})
		})
		.transpose()?;
	Ok(AuthConfigLayer {
		environment: env_var("FUNDUS_SERVER_ENV"),
		session_cookie_name: env_var("FUNDUS_SERVER_SESSION_COOKIE"),
		session_algorithm,
		session_secret: load_secret_env("FUNDUS_SERVER_SESSION_SECRET")?,
		session_public_key_pem: env_var("FUNDUS_SERVER_SESSION_PUBLIC_KEY_PEM"),
		session_issuer: env_var("FUNDUS_SERVER_SESSION_ISSUER"),
	})
}

fn load_identity_from_env() -> Result<IdentityConfigLayer, ConfigError> {
	Ok(IdentityConfigLayer {
		api_url: env_var("FUNDUS_SERVER_IDP_API_URL"),
		secret_key: load_secret_env("FUNDUS_SERVER_IDP_SECRET_KEY")?,
	})
}

fn load_inference_from_env() -> Result<InferenceConfigLayer, ConfigError> {
	Ok(InferenceConfigLayer {
		base_url: env_var("FUNDUS_SERVER_INFERENCE_URL"),
		request_timeout_secs: env_u64("FUNDUS_SERVER_INFERENCE_TIMEOUT_SECS")?,
		status_timeout_secs: env_u64("FUNDUS_SERVER_INFERENCE_STATUS_TIMEOUT_SECS")?,
	})
}

fn load_webhook_from_env() -> Result<WebhookConfigLayer, ConfigError> {
	Ok(WebhookConfigLayer {
		signing_secret: load_secret_env("FUNDUS_SERVER_WEBHOOK_SECRET")?,
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("FUNDUS_SERVER_LOG_LEVEL"),
		json: env_bool("FUNDUS_SERVER_LOG_JSON"),
	}
}
