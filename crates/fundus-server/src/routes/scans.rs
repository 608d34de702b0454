// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Scan upload and retrieval handlers.

use axum::{
	extract::{Multipart, Path, State},
	http::StatusCode,
	Json,
};
use bytes::Bytes;
use fundus_server_auth::{actions, CurrentUser, IdentityError, IdentityId};
use serde::Serialize;
use tracing::instrument;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	db::{NewScan, Scan, ScanId},
	error::{ServerError, INFERENCE_UNAVAILABLE},
};

/// A file pulled out of a multipart body.
#[derive(Debug)]
pub(crate) struct UploadedImage {
	pub file_name: String,
	pub content_type: String,
	pub data: Bytes,
}

/// Fields of a multipart upload that handlers care about.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
	pub file: Option<UploadedImage>,
	pub patient_id: Option<String>,
}

pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ServerError> {
	let mut form = UploadForm::default();
	while let Some(field) = multipart.next_field().await? {
		let name = field.name().unwrap_or_default().to_string();
		match name.as_str() {
			"file" => {
				let file_name = field.file_name().unwrap_or("upload").to_string();
				let content_type = field
					.content_type()
					.unwrap_or("application/octet-stream")
					.to_string();
				let data = field.bytes().await?;
				form.file = Some(UploadedImage {
					file_name,
					content_type,
					data,
				});
			}
			"patient_id" | "patientId" => {
				form.patient_id = Some(field.text().await?);
			}
			_ => {}
		}
	}
	Ok(form)
}

/// Checks that an upload is a non-empty image.
pub(crate) fn require_image(file: Option<UploadedImage>) -> Result<UploadedImage, ServerError> {
	let file = file.ok_or_else(|| ServerError::BadRequest("No file uploaded".to_string()))?;
	if file.data.is_empty() {
		return Err(ServerError::BadRequest("Uploaded file is empty".to_string()));
	}
	if !file.content_type.starts_with("image/") {
		return Err(ServerError::BadRequest(format!(
			"Unsupported file type: {}",
			file.content_type
		)));
	}
	Ok(file)
}

#[derive(Debug, Serialize)]
pub struct ScanListResponse {
	pub scans: Vec<Scan>,
}

fn can_upload(state: &AppState, user: &CurrentUser) -> bool {
	state
		.policy
		.evaluate(Some(user.role), actions::SCANS_UPLOAD)
		.is_allowed()
}

/// POST /api/scans
///
/// Stores the scan even when classification fails; the failure is recorded
/// on the scan instead of a diagnosis.
#[instrument(skip(state, user, multipart), fields(identity_id = %user.identity_id))]
pub async fn upload_scan(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	multipart: Multipart,
) -> Result<(StatusCode, Json<Scan>), ServerError> {
	if !can_upload(&state, &user) {
		tracing::warn!(role = %user.role, "scan upload refused");
		return Err(ServerError::NotAuthorized);
	}

	let form = read_upload(multipart).await?;
	let patient_id = form
		.patient_id
		.as_deref()
		.filter(|s| !s.trim().is_empty())
		.ok_or_else(|| ServerError::BadRequest("Missing required field: patient_id".to_string()))
		.and_then(|s| {
			IdentityId::parse(s.trim()).map_err(|e| ServerError::BadRequest(e.to_string()))
		})?;
	let file = require_image(form.file)?;

	match state.identity.get_identity(&patient_id).await {
		Ok(_) => {}
		Err(IdentityError::NotFound(_)) => {
			return Err(ServerError::BadRequest(format!("Unknown patient: {patient_id}")));
		}
		Err(e) => return Err(e.into()),
	}

	let size_bytes = file.data.len() as u64;
	let analysis = state
		.inference
		.predict(&file.file_name, &file.content_type, file.data)
		.await
		.map_err(|e| {
			tracing::error!(error = %e, "scan analysis failed");
			INFERENCE_UNAVAILABLE.to_string()
		});

	let scan = state
		.scans
		.create(NewScan {
			patient_id,
			uploaded_by: user.identity_id.clone(),
			file_name: file.file_name,
			content_type: file.content_type,
			size_bytes,
			analysis,
		})
		.await;

	tracing::info!(scan_id = %scan.id, patient_id = %scan.patient_id, "scan uploaded");
	Ok((StatusCode::CREATED, Json(scan)))
}

/// GET /api/scans
#[instrument(skip(state, user), fields(identity_id = %user.identity_id))]
pub async fn list_scans(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
) -> Json<ScanListResponse> {
	let scans = if state
		.policy
		.evaluate(Some(user.role), actions::SCANS_READ_ANY)
		.is_allowed()
	{
		state.scans.list_all().await
	} else {
		state.scans.list_for_patient(&user.identity_id).await
	};
	Json(ScanListResponse { scans })
}

/// GET /api/scans/{id}
///
/// Scans the caller may not read are reported as missing.
#[instrument(skip(state, user), fields(identity_id = %user.identity_id))]
pub async fn get_scan(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(id): Path<String>,
) -> Result<Json<Scan>, ServerError> {
	let not_found = || ServerError::NotFound("Scan not found".to_string());
	let id = ScanId::parse(&id).ok_or_else(not_found)?;
	let scan = state.scans.get(id).await.ok_or_else(not_found)?;

	let read_any = state
		.policy
		.evaluate(Some(user.role), actions::SCANS_READ_ANY)
		.is_allowed();
	if !read_any && scan.patient_id != user.identity_id {
		tracing::info!(scan_id = %id, "scan read refused");
		return Err(not_found());
	}
	Ok(Json(scan))
}
