// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session verification settings.
//!
//! Session tokens are signed by the identity provider. Deployments either
//! share an HS256 secret with it or pin its RS256 public key.

use fundus_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::layer::take;

pub const DEFAULT_SESSION_COOKIE: &str = "__session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAlgorithm {
	#[default]
	Hs256,
	Rs256,
}

impl std::str::FromStr for SessionAlgorithm {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"hs256" => Ok(SessionAlgorithm::Hs256),
			"rs256" => Ok(SessionAlgorithm::Rs256),
			other => Err(format!("unsupported session algorithm '{other}'")),
		}
	}
}

/// Key material for verifying session tokens.
#[derive(Debug, Clone)]
pub enum SessionKey {
	Hs256Secret(SecretString),
	Rs256PublicPem(String),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Deployment environment, e.g. `development` or `production`.
	pub environment: String,
	pub session_cookie_name: String,
	pub session_key: SessionKey,
	pub session_issuer: Option<String>,
}

impl AuthConfig {
	pub fn is_production(&self) -> bool {
		self.environment.eq_ignore_ascii_case("production")
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub session_cookie_name: Option<String>,
	#[serde(default)]
	pub session_algorithm: Option<SessionAlgorithm>,
	#[serde(default)]
	pub session_secret: Option<SecretString>,
	#[serde(default)]
	pub session_public_key_pem: Option<String>,
	#[serde(default)]
	pub session_issuer: Option<String>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		take(&mut self.environment, other.environment);
		take(&mut self.session_cookie_name, other.session_cookie_name);
		take(&mut self.session_algorithm, other.session_algorithm);
		take(&mut self.session_secret, other.session_secret);
		take(&mut self.session_public_key_pem, other.session_public_key_pem);
		take(&mut self.session_issuer, other.session_issuer);
	}

	pub fn finalize(self) -> Result<AuthConfig, ConfigError> {
		let session_key = match self.session_algorithm.unwrap_or_default() {
			SessionAlgorithm::Hs256 => SessionKey::Hs256Secret(
				self.session_secret
					.filter(|s| !s.is_empty())
					.ok_or_else(|| ConfigError::Missing("FUNDUS_SERVER_SESSION_SECRET".into()))?,
			),
			SessionAlgorithm::Rs256 => SessionKey::Rs256PublicPem(
				self.session_public_key_pem
					.filter(|s| !s.trim().is_empty())
					.ok_or_else(|| {
						ConfigError::Missing("FUNDUS_SERVER_SESSION_PUBLIC_KEY_PEM".into())
					})?,
			),
		};
		Ok(AuthConfig {
			environment: self.environment.unwrap_or_else(|| "development".to_string()),
			session_cookie_name: self
				.session_cookie_name
				.unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
			session_key,
			session_issuer: self.session_issuer,
		})
	}
}
