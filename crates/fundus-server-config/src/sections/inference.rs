// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Disease classification service settings.

use serde::Deserialize;
use std::time::Duration;

use crate::layer::take;

#[derive(Debug, Clone)]
pub struct InferenceConfig {
	pub base_url: String,
	pub request_timeout: Duration,
	pub status_timeout: Duration,
}

impl Default for InferenceConfig {
	fn default() -> Self {
		InferenceConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InferenceConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub status_timeout_secs: Option<u64>,
}

impl InferenceConfigLayer {
	pub fn merge(&mut self, other: InferenceConfigLayer) {
		take(&mut self.base_url, other.base_url);
		take(&mut self.request_timeout_secs, other.request_timeout_secs);
		take(&mut self.status_timeout_secs, other.status_timeout_secs);
	}

	pub fn finalize(self) -> InferenceConfig {
		InferenceConfig {
			base_url: self
				.base_url
				.unwrap_or_else(|| "http://localhost:8000".to_string()),
			request_timeout: Duration::from_secs(self.request_timeout_secs.unwrap_or(30).max(1)),
			status_timeout: Duration::from_secs(self.status_timeout_secs.unwrap_or(3).max(1)),
		}
	}
}
