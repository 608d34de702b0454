// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Route guard and auth extractors.
//!
//! [`route_guard`] runs once per request, before any handler:
//!
//! 1. Resolves the caller from the bearer header or session cookie
//! 2. Evaluates the request path against the policy table
//! 3. Redirects denied requests to `/`, otherwise stores the
//!    [`AuthContext`] as a request extension
//!
//! Handlers then use [`RequireAuth`] or [`Auth`] to read it.

use axum::{
	body::Body,
	extract::{FromRequestParts, State},
	http::{request::Parts, Request},
	middleware::Next,
	response::{IntoResponse, Redirect, Response},
};
use fundus_server_auth::{AuthContext, CurrentUser};
use tracing::instrument;

use crate::{api::AppState, error::ServerError};

const EXCLUDED_PREFIXES: &[&str] = &["/_app/", "/static/", "/assets/"];

const STATIC_EXTENSIONS: &[&str] = &[
	"html", "htm", "css", "js", "jpg", "jpeg", "webp", "png", "gif", "svg", "ttf", "woff",
	"woff2", "ico", "csv", "doc", "docx", "xls", "xlsx", "zip", "webmanifest",
];

/// Paths the guard never evaluates: framework assets and static files.
/// API paths are always evaluated.
pub fn is_excluded_path(path: &str) -> bool {
	if path == "/api" || path.starts_with("/api/") {
		return false;
	}
	if EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p)) {
		return true;
	}
	let last_segment = path.rsplit('/').next().unwrap_or_default();
	match last_segment.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() => STATIC_EXTENSIONS
			.iter()
			.any(|e| e.eq_ignore_ascii_case(ext)),
		_ => false,
	}
}

#[instrument(
	name = "route_guard",
	skip_all,
	fields(path = %request.uri().path(), identity_id = tracing::field::Empty)
)]
pub async fn route_guard(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	let path = request.uri().path().to_string();
	if is_excluded_path(&path) {
		return next.run(request).await;
	}

	let auth = AuthContext::resolve(&state.verifier, request.headers(), &state.cookie_name);
	if let Some(user) = auth.user() {
		tracing::Span::current().record("identity_id", tracing::field::display(&user.identity_id));
	}

	if !state.policy.evaluate(auth.role(), &path).is_allowed() {
		tracing::info!(
			role = ?auth.role(),
			path = %path,
			"route denied, redirecting"
		);
		return Redirect::temporary("/").into_response();
	}

	request.extensions_mut().insert(auth);
	next.run(request).await
}

/// Extractor that requires an authenticated caller (401 otherwise).
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
	S: Send + Sync,
{
	type Rejection = ServerError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<AuthContext>()
			.and_then(|ctx| ctx.current_user.clone())
			.map(RequireAuth)
			.ok_or_else(|| ServerError::Unauthorized("Authentication required".to_string()))
	}
}

/// Extractor for the full auth context; unauthenticated when absent.
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = std::convert::Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(Auth(
			parts
				.extensions
				.get::<AuthContext>()
				.cloned()
				.unwrap_or_else(AuthContext::unauthenticated),
		))
	}
}
