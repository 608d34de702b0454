// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider backend API settings.

use fundus_common_secret::SecretString;
use serde::Deserialize;

use crate::layer::take;

pub const DEFAULT_IDP_API_URL: &str = "https://api.clerk.com";

#[derive(Debug, Clone)]
pub struct IdentityConfig {
	pub api_url: String,
	/// Backend API key. Without it the server keeps identities in memory,
	/// which is only permitted outside production.
	pub secret_key: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfigLayer {
	#[serde(default)]
	pub api_url: Option<String>,
	#[serde(default)]
	pub secret_key: Option<SecretString>,
}

impl IdentityConfigLayer {
	pub fn merge(&mut self, other: IdentityConfigLayer) {
		take(&mut self.api_url, other.api_url);
		take(&mut self.secret_key, other.secret_key);
	}

	pub fn finalize(self) -> IdentityConfig {
		IdentityConfig {
			api_url: self
				.api_url
				.unwrap_or_else(|| DEFAULT_IDP_API_URL.to_string()),
			secret_key: self.secret_key.filter(|k| !k.is_empty()),
		}
	}
}
