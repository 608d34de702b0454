// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::{
	extract::DefaultBodyLimit,
	middleware::from_fn_with_state,
	routing::{get, post},
	Router,
};
use fundus_common_webhook::WebhookVerifier;
use fundus_server_auth::{IdentityProvider, MemoryIdentityProvider, PolicyTable, SessionVerifier};
use fundus_server_config::{ServerConfig, SessionKey};
use fundus_server_idp::IdpClient;
use fundus_server_inference::{InferenceClient, InferenceClientConfig};

use crate::{
	auth_middleware::route_guard,
	db::{ScanRepository, ScanRequestRepository},
	error::ServerError,
	routes,
};

/// Uploads above this size are rejected before reaching a handler.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which identity backend the server is running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityBackend {
	Remote,
	InMemory,
}

#[derive(Clone)]
pub struct AppState {
	pub policy: Arc<PolicyTable>,
	pub verifier: Arc<SessionVerifier>,
	pub cookie_name: Arc<str>,
	pub identity: Arc<dyn IdentityProvider>,
	pub identity_backend: IdentityBackend,
	pub inference: Arc<InferenceClient>,
	pub webhook: Option<Arc<WebhookVerifier>>,
	pub scans: Arc<ScanRepository>,
	pub scan_requests: Arc<ScanRequestRepository>,
}

/// Builds state from configuration, choosing the remote identity provider
/// when an API key is configured and the in-memory one otherwise.
pub fn create_app_state(config: &ServerConfig) -> Result<AppState, ServerError> {
	let (identity, backend): (Arc<dyn IdentityProvider>, IdentityBackend) =
		match &config.identity.secret_key {
			Some(key) => {
				let client = IdpClient::new(key.clone())
					.map_err(|e| ServerError::Internal(format!("identity client: {e}")))?
					.with_base_url(config.identity.api_url.clone());
				(Arc::new(client), IdentityBackend::Remote)
			}
			None => {
				tracing::warn!("no identity provider key configured, using in-memory identities");
				(Arc::new(MemoryIdentityProvider::new()), IdentityBackend::InMemory)
			}
		};
	create_app_state_with_provider(config, identity, backend)
}

pub fn create_app_state_with_provider(
	config: &ServerConfig,
	identity: Arc<dyn IdentityProvider>,
	identity_backend: IdentityBackend,
) -> Result<AppState, ServerError> {
	let issuer = config.auth.session_issuer.as_deref();
	let verifier = match &config.auth.session_key {
		SessionKey::Hs256Secret(secret) => SessionVerifier::hs256(secret.expose().as_bytes(), issuer),
		SessionKey::Rs256PublicPem(pem) => SessionVerifier::rs256_pem(pem.as_bytes(), issuer)
			.map_err(|e| ServerError::Internal(format!("session key: {e}")))?,
	};

	let inference = InferenceClient::new(InferenceClientConfig {
		base_url: config.inference.base_url.clone(),
		request_timeout: config.inference.request_timeout,
		status_timeout: config.inference.status_timeout,
		..InferenceClientConfig::default()
	})
	.map_err(|e| ServerError::Internal(format!("inference client: {e}")))?;

	let webhook = config
		.webhook
		.signing_secret
		.as_ref()
		.map(|s| WebhookVerifier::from_secret(s.expose()))
		.transpose()
		.map_err(|e| ServerError::Internal(format!("webhook secret: {e}")))?
		.map(Arc::new);

	let policy = PolicyTable::standard();
	for rule in policy.empty_role_sets() {
		tracing::warn!(rule = %rule, "policy rule allows no roles and denies everyone");
	}

	Ok(AppState {
		policy: Arc::new(policy),
		verifier: Arc::new(verifier),
		cookie_name: Arc::from(config.auth.session_cookie_name.as_str()),
		identity,
		identity_backend,
		inference: Arc::new(inference),
		webhook,
		scans: Arc::new(ScanRepository::new()),
		scan_requests: Arc::new(ScanRequestRepository::new()),
	})
}

pub fn create_router(state: AppState) -> Router {
	let uploads = Router::new()
		.route("/api/ai/predict", post(routes::ai::predict))
		.route(
			"/api/scans",
			post(routes::scans::upload_scan).get(routes::scans::list_scans),
		)
		.layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

	Router::new()
		// Pages
		.route("/", get(routes::pages::home))
		.route("/sign-in", get(routes::pages::sign_in))
		.route("/sign-up", get(routes::pages::sign_up))
		.route("/dashboard", get(routes::pages::dashboard))
		.route("/dashboard/{role}", get(routes::pages::role_dashboard))
		.route("/admin", get(routes::pages::admin))
		.route("/management", get(routes::pages::management))
		.route("/management/users", get(routes::pages::management_users))
		.route("/scans", get(routes::pages::scans))
		.route("/scans/upload", get(routes::pages::scan_upload))
		// Health
		.route("/health", get(routes::health::health_check))
		// Roles and users
		.route("/api/users/set-role", post(routes::users::set_role))
		.route("/api/users/remove-role", post(routes::users::remove_role))
		.route("/api/user/role", get(routes::users::own_role))
		.route("/api/users/role", get(routes::users::role_by_id))
		.route("/api/admin/users", get(routes::users::list_users))
		// Inference
		.route("/api/ai/status", get(routes::ai::status))
		// Scans
		.merge(uploads)
		.route("/api/scans/{id}", get(routes::scans::get_scan))
		.route(
			"/api/scan-requests",
			post(routes::scan_requests::create_request).get(routes::scan_requests::list_own),
		)
		.route(
			"/api/scan-requests/pending",
			get(routes::scan_requests::list_pending),
		)
		.route(
			"/api/scan-requests/{id}",
			get(routes::scan_requests::get_request),
		)
		.route(
			"/api/scan-requests/{id}/assign",
			post(routes::scan_requests::assign_request),
		)
		.route(
			"/api/scan-requests/{id}/review",
			post(routes::scan_requests::review_request),
		)
		// Webhooks
		.route("/api/webhook/identity", post(routes::webhooks::identity_webhook))
		.fallback(routes::pages::not_found)
		.layer(from_fn_with_state(state.clone(), route_guard))
		.with_state(state)
}
