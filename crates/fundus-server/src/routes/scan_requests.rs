// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Patient scan requests.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use fundus_server_auth::{actions, CurrentUser};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	db::{NewScanRequest, Priority, RequestStatus, ReviewUpdate, ScanRequest, ScanRequestId},
	error::ServerError,
};

const MAX_TEXT_LEN: usize = 4000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScanRequest {
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub symptoms: Option<String>,
	#[serde(default)]
	pub medical_history: Option<String>,
	#[serde(default)]
	pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
	#[serde(default)]
	pub doctor_note: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanRequestListResponse {
	pub requests: Vec<ScanRequest>,
}

fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>, ServerError> {
	match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
		Some(v) if v.len() > MAX_TEXT_LEN => Err(ServerError::BadRequest(format!(
			"{field} must be at most {MAX_TEXT_LEN} characters"
		))),
		other => Ok(other),
	}
}

impl CreateScanRequest {
	fn validate(self) -> Result<(String, Option<String>, Option<String>, Priority), ServerError> {
		let description = optional_text("description", self.description)?
			.ok_or_else(|| ServerError::BadRequest("Description is required".to_string()))?;
		let priority = match self.priority.as_deref() {
			None | Some("") => Priority::default(),
			Some(p) => p.parse().map_err(ServerError::BadRequest)?,
		};
		Ok((
			description,
			optional_text("symptoms", self.symptoms)?,
			optional_text("medicalHistory", self.medical_history)?,
			priority,
		))
	}
}

impl ReviewRequest {
	fn validate(self) -> Result<ReviewUpdate, ServerError> {
		let status = match self.status.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(s) => Some(s.parse::<RequestStatus>().map_err(ServerError::BadRequest)?),
		};
		Ok(ReviewUpdate {
			doctor_note: optional_text("doctorNote", self.doctor_note)?,
			status,
		})
	}
}

fn can_review(state: &AppState, user: &CurrentUser) -> bool {
	state
		.policy
		.evaluate(Some(user.role), actions::SCAN_REQUESTS_REVIEW)
		.is_allowed()
}

fn parse_request_id(id: &str) -> Result<ScanRequestId, ServerError> {
	ScanRequestId::parse_str(id)
		.map_err(|_| ServerError::NotFound("Scan request not found".to_string()))
}

/// POST /api/scan-requests
///
/// The caller becomes the request's patient.
#[instrument(skip(state, user, payload), fields(identity_id = %user.identity_id))]
pub async fn create_request(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Json(payload): Json<CreateScanRequest>,
) -> Result<(StatusCode, Json<ScanRequest>), ServerError> {
	let (description, symptoms, medical_history, priority) = payload.validate()?;
	let request = state
		.scan_requests
		.create(NewScanRequest {
			patient_id: user.identity_id,
			description,
			symptoms,
			medical_history,
			priority,
		})
		.await;
	tracing::info!(request_id = %request.id, priority = ?request.priority, "scan request filed");
	Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/scan-requests
pub async fn list_own(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
) -> Json<ScanRequestListResponse> {
	Json(ScanRequestListResponse {
		requests: state.scan_requests.list_for_patient(&user.identity_id).await,
	})
}

/// GET /api/scan-requests/pending
#[instrument(skip(state, user), fields(identity_id = %user.identity_id))]
pub async fn list_pending(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
) -> Result<Json<ScanRequestListResponse>, ServerError> {
	if !can_review(&state, &user) {
		return Err(ServerError::NotAuthorized);
	}
	Ok(Json(ScanRequestListResponse {
		requests: state.scan_requests.list_pending().await,
	}))
}

/// GET /api/scan-requests/{id}
///
/// Readable by the filing patient and by reviewers. Everyone else gets 404.
#[instrument(skip(state, user), fields(identity_id = %user.identity_id))]
pub async fn get_request(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(id): Path<String>,
) -> Result<Json<ScanRequest>, ServerError> {
	let not_found = || ServerError::NotFound("Scan request not found".to_string());
	let id = parse_request_id(&id)?;
	let request = state.scan_requests.get(id).await.ok_or_else(not_found)?;

	if request.patient_id != user.identity_id && !can_review(&state, &user) {
		tracing::info!(request_id = %id, "scan request read refused");
		return Err(not_found());
	}
	Ok(Json(request))
}

/// POST /api/scan-requests/{id}/assign
#[instrument(skip(state, user), fields(identity_id = %user.identity_id))]
pub async fn assign_request(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(id): Path<String>,
) -> Result<Json<ScanRequest>, ServerError> {
	if !can_review(&state, &user) {
		tracing::warn!(role = %user.role, "scan request assignment refused");
		return Err(ServerError::NotAuthorized);
	}
	let id = parse_request_id(&id)?;
	let request = state.scan_requests.assign(id, &user.identity_id).await?;
	tracing::info!(request_id = %id, "scan request assigned");
	Ok(Json(request))
}

/// POST /api/scan-requests/{id}/review
///
/// Saves the reviewer's note and advances the status.
#[instrument(skip(state, user, payload), fields(identity_id = %user.identity_id))]
pub async fn review_request(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(id): Path<String>,
	Json(payload): Json<ReviewRequest>,
) -> Result<Json<ScanRequest>, ServerError> {
	if !can_review(&state, &user) {
		tracing::warn!(role = %user.role, "scan request review refused");
		return Err(ServerError::NotAuthorized);
	}
	let id = parse_request_id(&id)?;
	let update = payload.validate()?;
	let request = state
		.scan_requests
		.review(id, &user.identity_id, update)
		.await?;
	tracing::info!(request_id = %id, status = %request.status, "scan request reviewed");
	Ok(Json(request))
}
