// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use fundus_server_auth::{IdentityError, RoleMutationError};
use fundus_server_inference::InferenceError;
use serde::Serialize;

use crate::db::ScanRequestError;

/// Body of the 503 returned when the classification service fails.
pub const INFERENCE_UNAVAILABLE: &str = "AI analysis service is unavailable";

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Invalid request payload.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	/// Caller's role does not permit the action.
	#[error("Not Authorized")]
	NotAuthorized,

	#[error("Not found: {0}")]
	NotFound(String),

	/// Request conflicts with the record's current state.
	#[error("Conflict: {0}")]
	Conflict(String),

	/// Identity provider failed or answered unexpectedly.
	#[error("Upstream error: {0}")]
	UpstreamError(String),

	#[error("Inference unavailable: {0}")]
	InferenceUnavailable(#[source] InferenceError),

	#[error("Service unavailable: {0}")]
	ServiceUnavailable(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("bad_request", msg.clone()),
			),
			ServerError::Unauthorized(msg) => (
				StatusCode::UNAUTHORIZED,
				ErrorResponse::new("unauthorized", msg.clone()),
			),
			ServerError::NotAuthorized => (
				StatusCode::FORBIDDEN,
				ErrorResponse::new("Not Authorized", "Insufficient permissions"),
			),
			ServerError::NotFound(msg) => (
				StatusCode::NOT_FOUND,
				ErrorResponse::new("not_found", msg.clone()),
			),
			ServerError::Conflict(msg) => (
				StatusCode::CONFLICT,
				ErrorResponse::new("conflict", msg.clone()),
			),
			ServerError::UpstreamError(msg) => {
				tracing::error!(error = %msg, "identity provider error");
				(
					StatusCode::BAD_GATEWAY,
					ErrorResponse::new("upstream_error", "The identity provider request failed"),
				)
			}
			ServerError::InferenceUnavailable(e) => {
				tracing::error!(error = %e, "inference service error");
				(
					StatusCode::SERVICE_UNAVAILABLE,
					ErrorResponse::new(INFERENCE_UNAVAILABLE, "Please try again later"),
				)
			}
			ServerError::ServiceUnavailable(msg) => (
				StatusCode::SERVICE_UNAVAILABLE,
				ErrorResponse::new("service_unavailable", msg.clone()),
			),
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "An internal error occurred"),
				)
			}
		};

		(status, Json(body)).into_response()
	}
}

impl From<IdentityError> for ServerError {
	fn from(err: IdentityError) -> Self {
		match err {
			IdentityError::NotFound(id) => ServerError::NotFound(format!("Unknown user: {id}")),
			other => ServerError::UpstreamError(other.to_string()),
		}
	}
}

impl From<RoleMutationError> for ServerError {
	fn from(err: RoleMutationError) -> Self {
		match err {
			RoleMutationError::NotAuthorized => ServerError::NotAuthorized,
			RoleMutationError::UnknownIdentity(id) => {
				ServerError::NotFound(format!("Unknown user: {id}"))
			}
			RoleMutationError::Upstream(e) => ServerError::UpstreamError(e.to_string()),
		}
	}
}

impl From<ScanRequestError> for ServerError {
	fn from(err: ScanRequestError) -> Self {
		match err {
			ScanRequestError::NotFound(_) => ServerError::NotFound("Scan request not found".to_string()),
			e @ ScanRequestError::InvalidTransition { .. } => ServerError::Conflict(e.to_string()),
		}
	}
}

impl From<InferenceError> for ServerError {
	fn from(err: InferenceError) -> Self {
		match err {
			InferenceError::InvalidInput(msg) => ServerError::BadRequest(msg),
			other => ServerError::InferenceUnavailable(other),
		}
	}
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
	fn from(err: axum::extract::multipart::MultipartError) -> Self {
		ServerError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
	}
}
