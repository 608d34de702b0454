// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Classification service proxy.

use axum::{
	extract::{Multipart, State},
	Json,
};
use fundus_server_inference::{Prediction, ServiceStatus};
use tracing::instrument;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	error::ServerError,
	routes::scans::{read_upload, require_image},
};

/// POST /api/ai/predict
#[instrument(skip(state, user, multipart), fields(identity_id = %user.identity_id))]
pub async fn predict(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	multipart: Multipart,
) -> Result<Json<Prediction>, ServerError> {
	let file = require_image(read_upload(multipart).await?.file)?;
	let prediction = state
		.inference
		.predict(&file.file_name, &file.content_type, file.data)
		.await?;
	Ok(Json(prediction))
}

/// GET /api/ai/status
pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
	Json(state.inference.status().await)
}
