// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity webhook settings.

use fundus_common_secret::SecretString;
use serde::Deserialize;

use crate::layer::take;

#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
	/// `whsec_...` signing secret. Deliveries are rejected while unset.
	pub signing_secret: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfigLayer {
	#[serde(default)]
	pub signing_secret: Option<SecretString>,
}

impl WebhookConfigLayer {
	pub fn merge(&mut self, other: WebhookConfigLayer) {
		take(&mut self.signing_secret, other.signing_secret);
	}

	pub fn finalize(self) -> WebhookConfig {
		WebhookConfig {
			signing_secret: self.signing_secret.filter(|s| !s.is_empty()),
		}
	}
}
