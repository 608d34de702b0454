// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, Json};
use fundus_server_inference::ServiceStatus;
use serde::Serialize;

use crate::api::{AppState, IdentityBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
	Healthy,
	Degraded,
}

#[derive(Debug, Serialize)]
pub struct HealthComponents {
	pub identity_provider: IdentityBackend,
	pub inference: ServiceStatus,
	pub webhook_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub timestamp: String,
	pub version: &'static str,
	pub components: HealthComponents,
}

/// GET /health
///
/// Always 200. An unreachable classification service reports `degraded`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
	let inference = state.inference.status().await;
	let status = if inference.is_online() {
		HealthStatus::Healthy
	} else {
		HealthStatus::Degraded
	};

	Json(HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		version: env!("CARGO_PKG_VERSION"),
		components: HealthComponents {
			identity_provider: state.identity_backend,
			inference,
			webhook_configured: state.webhook.is_some(),
		},
	})
}
