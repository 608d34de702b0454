// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for the identity provider client.

use fundus_common_http::{is_transient_status, RetryableError};
use fundus_server_auth::{IdentityError, IdentityId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdpError {
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Request timed out")]
	Timeout,

	#[error("User not found: {0}")]
	NotFound(IdentityId),

	#[error("Identity provider rejected the API key")]
	Unauthorized,

	#[error("Rate limit exceeded")]
	RateLimited,

	#[error("Invalid response from identity provider: {0}")]
	InvalidResponse(String),

	#[error("Identity provider API error: {status} - {message}")]
	ApiError { status: u16, message: String },
}

impl RetryableError for IdpError {
	fn is_retryable(&self) -> bool {
		match self {
			IdpError::Network(e) => e.is_retryable(),
			IdpError::Timeout | IdpError::RateLimited => true,
			IdpError::ApiError { status, .. } => reqwest::StatusCode::from_u16(*status)
				.map(is_transient_status)
				.unwrap_or(false),
			IdpError::NotFound(_) | IdpError::Unauthorized | IdpError::InvalidResponse(_) => false,
		}
	}
}

impl From<IdpError> for IdentityError {
	fn from(err: IdpError) -> Self {
		match err {
			IdpError::NotFound(id) => IdentityError::NotFound(id),
			IdpError::Network(e) => IdentityError::Unavailable(e.to_string()),
			IdpError::Timeout => IdentityError::Unavailable("request timed out".into()),
			IdpError::RateLimited => IdentityError::Unavailable("rate limited".into()),
			IdpError::Unauthorized => IdentityError::Rejected {
				status: 401,
				message: "invalid API key".into(),
			},
			IdpError::ApiError { status, message } => IdentityError::Rejected { status, message },
			IdpError::InvalidResponse(msg) => IdentityError::InvalidResponse(msg),
		}
	}
}
