// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HMAC-SHA256 verification for Svix-style signed webhooks.
//!
//! The identity provider signs each delivery with three headers:
//!
//! - `svix-id`: unique message id
//! - `svix-timestamp`: unix seconds at send time
//! - `svix-signature`: space separated list of `v1,<base64 signature>`
//!
//! The signature covers `"{id}.{timestamp}.{body}"`, keyed with the base64
//! decoded portion of a `whsec_` prefixed secret.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// Maximum clock skew accepted between sender and receiver, in seconds.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
	#[error("webhook secret is not valid base64")]
	InvalidSecret,

	#[error("missing header: {0}")]
	MissingHeader(&'static str),

	#[error("invalid timestamp header")]
	InvalidTimestamp,

	#[error("timestamp outside tolerance window")]
	TimestampOutOfTolerance,

	#[error("no matching signature")]
	SignatureMismatch,
}

/// Decoded signing key for one endpoint.
pub struct WebhookVerifier {
	mac: HmacSha256,
}

impl std::fmt::Debug for WebhookVerifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WebhookVerifier").finish_non_exhaustive()
	}
}

/// The three header values of one delivery.
#[derive(Debug, Clone, Copy)]
pub struct SignedHeaders<'a> {
	pub id: Option<&'a str>,
	pub timestamp: Option<&'a str>,
	pub signature: Option<&'a str>,
}

impl WebhookVerifier {
	/// Accepts `whsec_<base64>` or bare base64.
	pub fn from_secret(secret: &str) -> Result<Self, WebhookError> {
		let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
		let key = STANDARD
			.decode(encoded)
			.map_err(|_| WebhookError::InvalidSecret)?;
		if key.is_empty() {
			return Err(WebhookError::InvalidSecret);
		}
		let mac = HmacSha256::new_from_slice(&key).map_err(|_| WebhookError::InvalidSecret)?;
		Ok(Self { mac })
	}

	/// Base64 signature (no version prefix) for a message.
	pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> String {
		let mut mac = self.mac();
		mac.update(signed_prefix(id, timestamp).as_bytes());
		mac.update(body);
		STANDARD.encode(mac.finalize().into_bytes())
	}

	/// Verifies against the current wall clock.
	pub fn verify(&self, headers: SignedHeaders<'_>, body: &[u8]) -> Result<(), WebhookError> {
		self.verify_at(headers, body, chrono::Utc::now().timestamp())
	}

	pub fn verify_at(
		&self,
		headers: SignedHeaders<'_>,
		body: &[u8],
		now: i64,
	) -> Result<(), WebhookError> {
		let id = headers.id.ok_or(WebhookError::MissingHeader(HEADER_ID))?;
		let timestamp = headers
			.timestamp
			.ok_or(WebhookError::MissingHeader(HEADER_TIMESTAMP))?;
		let signatures = headers
			.signature
			.ok_or(WebhookError::MissingHeader(HEADER_SIGNATURE))?;

		let ts: i64 = timestamp
			.trim()
			.parse()
			.map_err(|_| WebhookError::InvalidTimestamp)?;
		if now.abs_diff(ts) > TIMESTAMP_TOLERANCE_SECS.unsigned_abs() {
			return Err(WebhookError::TimestampOutOfTolerance);
		}

		let prefix = signed_prefix(id, ts);
		for candidate in signatures.split_whitespace() {
			let Some((version, encoded)) = candidate.split_once(',') else {
				continue;
			};
			if version != SIGNATURE_VERSION {
				continue;
			}
			let Ok(expected) = STANDARD.decode(encoded) else {
				continue;
			};
			let mut mac = self.mac();
			mac.update(prefix.as_bytes());
			mac.update(body);
			if mac.verify_slice(&expected).is_ok() {
				return Ok(());
			}
		}
		Err(WebhookError::SignatureMismatch)
	}

	fn mac(&self) -> HmacSha256 {
		self.mac.clone()
	}
}

fn signed_prefix(id: &str, timestamp: i64) -> String {
	format!("{id}.{timestamp}.")
}
