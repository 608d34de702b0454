// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request authentication context.
//!
//! - [`CurrentUser`]: identity and role of a verified caller
//! - [`AuthContext`]: what the route guard hands to handlers
//! - helpers for pulling the session token out of headers
//!
//! ```text
//! Request → Bearer header / session cookie → SessionVerifier → AuthContext
//!                                                  │
//!                                                  └── any failure → unauthenticated
//! ```
//!
//! Token values are never logged.

use crate::session::{SessionVerifier, VerifiedSession};
use crate::types::{IdentityId, Role};
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use tracing::instrument;

/// Cookie the identity provider's frontend SDK stores the session JWT in.
pub const SESSION_COOKIE_NAME: &str = "__session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
	pub identity_id: IdentityId,
	pub role: Role,
}

impl CurrentUser {
	pub fn new(identity_id: IdentityId, role: Role) -> Self {
		Self { identity_id, role }
	}

	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}

	/// Whether this caller may see records belonging to `owner`.
	pub fn can_access_patient(&self, owner: &IdentityId) -> bool {
		self.role.is_clinical_staff() || &self.identity_id == owner
	}
}

impl From<VerifiedSession> for CurrentUser {
	fn from(session: VerifiedSession) -> Self {
		Self::new(session.identity_id, session.role)
	}
}

/// Authentication state for one request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
	pub is_authenticated: bool,
	pub current_user: Option<CurrentUser>,
}

impl AuthContext {
	pub fn unauthenticated() -> Self {
		Self {
			is_authenticated: false,
			current_user: None,
		}
	}

	pub fn authenticated(current_user: CurrentUser) -> Self {
		Self {
			is_authenticated: true,
			current_user: Some(current_user),
		}
	}

	/// Resolves the caller from request headers. Never fails: a missing or
	/// invalid token yields an unauthenticated context.
	#[instrument(level = "debug", skip_all)]
	pub fn resolve(verifier: &SessionVerifier, headers: &HeaderMap, cookie_name: &str) -> Self {
		let Some(token) = extract_session_token(headers, cookie_name) else {
			return Self::unauthenticated();
		};
		match verifier.verify(&token) {
			Ok(session) => Self::authenticated(session.into()),
			Err(e) => {
				tracing::debug!(error = %e, "session token rejected");
				Self::unauthenticated()
			}
		}
	}

	pub fn user(&self) -> Option<&CurrentUser> {
		self.current_user.as_ref()
	}

	pub fn role(&self) -> Option<Role> {
		self.current_user.as_ref().map(|u| u.role)
	}

	pub fn require_user(&self) -> Result<&CurrentUser, AuthRequired> {
		self.current_user.as_ref().ok_or(AuthRequired)
	}
}

/// Authentication was required but the request carried none.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("authentication required")]
pub struct AuthRequired;

pub fn extract_session_cookie_with_name(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.flat_map(|v| v.split(';'))
		.find_map(|cookie| {
			let (name, value) = cookie.trim().split_once('=')?;
			(name == cookie_name && !value.is_empty()).then(|| value.to_string())
		})
}

/// `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	value
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.map(str::to_string)
}

/// Bearer header first, then the session cookie.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	extract_bearer_token(headers).or_else(|| extract_session_cookie_with_name(headers, cookie_name))
}
