// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use fundus_common_http::{is_transient_status, RetryableError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Request timed out")]
	Timeout,

	#[error("Inference service error: {status} - {detail}")]
	ApiError { status: u16, detail: String },

	#[error("Invalid response from inference service: {0}")]
	InvalidResponse(String),

	#[error("Invalid image upload: {0}")]
	InvalidInput(String),
}

impl InferenceError {
	/// Status code the service answered with, if it answered at all.
	pub fn upstream_status(&self) -> Option<u16> {
		match self {
			InferenceError::ApiError { status, .. } => Some(*status),
			_ => None,
		}
	}
}

impl RetryableError for InferenceError {
	fn is_retryable(&self) -> bool {
		match self {
			InferenceError::Network(e) => e.is_connect(),
			InferenceError::Timeout => false,
			InferenceError::ApiError { status, .. } => reqwest::StatusCode::from_u16(*status)
				.map(is_transient_status)
				.unwrap_or(false),
			InferenceError::InvalidResponse(_) | InferenceError::InvalidInput(_) => false,
		}
	}
}
