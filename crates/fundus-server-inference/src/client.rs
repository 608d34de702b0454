// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Inference service client implementation.

use std::time::Duration;

use bytes::Bytes;
use fundus_common_http::{retry, RetryConfig};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use crate::error::InferenceError;
use crate::types::{Prediction, RawPrediction, ServiceStatus};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct InferenceClientConfig {
	pub base_url: String,
	/// Upper bound for one prediction request.
	pub request_timeout: Duration,
	/// Upper bound for the liveness probe.
	pub status_timeout: Duration,
	pub retry: RetryConfig,
}

impl Default for InferenceClientConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			request_timeout: Duration::from_secs(30),
			status_timeout: Duration::from_secs(3),
			retry: RetryConfig {
				max_attempts: 2,
				..RetryConfig::default()
			},
		}
	}
}

#[derive(Debug, Clone)]
pub struct InferenceClient {
	http_client: Client,
	config: InferenceClientConfig,
}

/// Error body the service uses for validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
	detail: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
	message: Option<String>,
}

impl InferenceClient {
	pub fn new(mut config: InferenceClientConfig) -> Result<Self, InferenceError> {
		config.base_url = config.base_url.trim_end_matches('/').to_string();
		let http_client = fundus_common_http::client_with_timeout(config.request_timeout)?;
		Ok(Self {
			http_client,
			config,
		})
	}

	pub fn base_url(&self) -> &str {
		&self.config.base_url
	}

	/// Classifies one fundus image.
	#[instrument(skip(self, image), fields(size = image.len()))]
	pub async fn predict(
		&self,
		file_name: &str,
		content_type: &str,
		image: Bytes,
	) -> Result<Prediction, InferenceError> {
		if image.is_empty() {
			return Err(InferenceError::InvalidInput("empty file".into()));
		}
		retry(&self.config.retry, || {
			self.predict_once(file_name, content_type, image.clone())
		})
		.await
	}

	async fn predict_once(
		&self,
		file_name: &str,
		content_type: &str,
		image: Bytes,
	) -> Result<Prediction, InferenceError> {
		let part = Part::bytes(image.to_vec())
			.file_name(file_name.to_string())
			.mime_str(content_type)
			.map_err(|_| InferenceError::InvalidInput(format!("bad content type {content_type}")))?;
		let form = Form::new().part("file", part);

		let url = format!("{}/predict/", self.config.base_url);
		debug!(url = %url, "sending image to inference service");
		let response = self
			.http_client
			.post(&url)
			.multipart(form)
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					error!("inference request timed out");
					return InferenceError::Timeout;
				}
				error!(error = %e, "network error during inference request");
				InferenceError::Network(e)
			})?;

		let status = response.status();
		let body = response.text().await.map_err(InferenceError::Network)?;

		if !status.is_success() {
			let detail = serde_json::from_str::<ErrorBody>(&body)
				.map(|b| match b.detail {
					serde_json::Value::String(s) => s,
					other => other.to_string(),
				})
				.unwrap_or_else(|_| "failed to analyze image".to_string());
			error!(status = status.as_u16(), detail = %detail, "inference service error");
			return Err(InferenceError::ApiError {
				status: status.as_u16(),
				detail,
			});
		}

		let raw: RawPrediction = serde_json::from_str(&body).map_err(|e| {
			error!(error = %e, "failed to parse inference response");
			InferenceError::InvalidResponse(format!("JSON parse error: {e}"))
		})?;
		let prediction = Prediction::try_from(raw).map_err(InferenceError::InvalidResponse)?;
		debug!(
			top = %prediction.top_prediction,
			confidence = prediction.confidence,
			"prediction received"
		);
		Ok(prediction)
	}

	/// Probes the service. Never fails; unreachable means offline.
	#[instrument(skip(self))]
	pub async fn status(&self) -> ServiceStatus {
		let result = self
			.http_client
			.get(format!("{}/", self.config.base_url))
			.header(reqwest::header::ACCEPT, "application/json")
			.timeout(self.config.status_timeout)
			.send()
			.await;

		match result {
			Ok(response) if response.status().is_success() => {
				let message = response
					.json::<StatusBody>()
					.await
					.ok()
					.and_then(|b| b.message)
					.unwrap_or_else(|| "AI model service is running".to_string());
				ServiceStatus::Online { message }
			}
			Ok(response) => {
				warn!(status = response.status().as_u16(), "inference service unhealthy");
				ServiceStatus::Error {
					message: "AI model service is not responding properly".to_string(),
				}
			}
			Err(e) => {
				warn!(error = %e, "inference service unreachable");
				ServiceStatus::Offline {
					message: "AI model service is currently offline".to_string(),
				}
			}
		}
	}
}
