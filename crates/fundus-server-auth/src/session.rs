// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Verification of session tokens issued by the identity provider.
//!
//! Sessions are JWTs. The provider copies the user's public metadata into a
//! `metadata` claim, which is where the role comes from:
//!
//! ```json
//! { "sub": "user_2Nq...", "exp": 1700000000, "metadata": { "role": "doctor" } }
//! ```

use crate::types::{IdentityId, Role};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
	#[error("session token is malformed")]
	Malformed,

	#[error("session token has expired")]
	Expired,

	#[error("session token signature is invalid")]
	InvalidSignature,

	#[error("session token issuer is not trusted")]
	InvalidIssuer,

	#[error("session token subject is not a valid identity id")]
	InvalidSubject,

	#[error("invalid verification key: {0}")]
	InvalidKey(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
	pub sub: String,
	pub exp: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	#[serde(default)]
	pub metadata: SessionMetadata,
}

/// Identity and role taken from a verified session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
	pub identity_id: IdentityId,
	pub role: Role,
}

pub struct SessionVerifier {
	key: DecodingKey,
	validation: Validation,
}

impl std::fmt::Debug for SessionVerifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionVerifier")
			.field("algorithms", &self.validation.algorithms)
			.field("issuer", &self.validation.iss)
			.finish_non_exhaustive()
	}
}

impl SessionVerifier {
	/// Shared-secret (HS256) verification.
	pub fn hs256(secret: &[u8], issuer: Option<&str>) -> Self {
		Self::new(DecodingKey::from_secret(secret), Algorithm::HS256, issuer)
	}

	/// Public-key (RS256) verification from a PEM encoded key.
	pub fn rs256_pem(pem: &[u8], issuer: Option<&str>) -> Result<Self, SessionError> {
		let key =
			DecodingKey::from_rsa_pem(pem).map_err(|e| SessionError::InvalidKey(e.to_string()))?;
		Ok(Self::new(key, Algorithm::RS256, issuer))
	}

	fn new(key: DecodingKey, algorithm: Algorithm, issuer: Option<&str>) -> Self {
		let mut validation = Validation::new(algorithm);
		validation.set_required_spec_claims(&["exp", "sub"]);
		validation.leeway = 30;
		if let Some(iss) = issuer {
			validation.set_issuer(&[iss]);
		}
		Self { key, validation }
	}

	/// Verifies signature, expiry and issuer, then extracts identity and role.
	pub fn verify(&self, token: &str) -> Result<VerifiedSession, SessionError> {
		let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
			match e.kind() {
				ErrorKind::ExpiredSignature => SessionError::Expired,
				ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
					SessionError::InvalidSignature
				}
				ErrorKind::InvalidIssuer => SessionError::InvalidIssuer,
				_ => SessionError::Malformed,
			}
		})?;
		let claims = data.claims;
		let identity_id =
			IdentityId::parse(claims.sub).map_err(|_| SessionError::InvalidSubject)?;
		let role = Role::from_claim(claims.metadata.role.as_deref());
		Ok(VerifiedSession { identity_id, role })
	}
}
