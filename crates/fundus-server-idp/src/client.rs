// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Identity provider user API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use fundus_common_http::{retry, RetryConfig};
use fundus_common_secret::SecretString;
use fundus_server_auth::{IdentityError, IdentityId, IdentityProvider, IdentityRecord, Role, UserQuery};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use crate::error::IdpError;
use crate::types::{ApiUser, MetadataPatch, RolePatch};

pub const DEFAULT_BASE_URL: &str = "https://api.clerk.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct IdpClient {
	http_client: Client,
	secret_key: SecretString,
	base_url: String,
	retry_config: RetryConfig,
}

impl IdpClient {
	pub fn new(secret_key: SecretString) -> Result<Self, IdpError> {
		let http_client = fundus_common_http::client_with_timeout(REQUEST_TIMEOUT)?;
		Ok(Self {
			http_client,
			secret_key,
			base_url: DEFAULT_BASE_URL.to_string(),
			retry_config: RetryConfig::default(),
		})
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	fn user_url(&self, id: &IdentityId) -> String {
		format!("{}/v1/users/{}", self.base_url, id)
	}

	#[instrument(skip(self), fields(identity_id = %id))]
	pub async fn get_user(&self, id: &IdentityId) -> Result<IdentityRecord, IdpError> {
		retry(&self.retry_config, || self.get_user_once(id)).await
	}

	/// Writes `public_metadata.role`; `None` deletes the key.
	#[instrument(skip(self), fields(identity_id = %id))]
	pub async fn update_role(
		&self,
		id: &IdentityId,
		role: Option<Role>,
	) -> Result<IdentityRecord, IdpError> {
		let body = MetadataPatch {
			public_metadata: RolePatch { role },
		};
		retry(&self.retry_config, || self.update_role_once(id, &body)).await
	}

	#[instrument(skip(self))]
	pub async fn list_users(&self, query: &UserQuery) -> Result<Vec<IdentityRecord>, IdpError> {
		let mut params = vec![
			("limit", query.limit.to_string()),
			("offset", query.offset.to_string()),
			("order_by", "-created_at".to_string()),
		];
		if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
			params.push(("query", search.to_string()));
		}
		retry(&self.retry_config, || self.list_users_once(&params)).await
	}

	async fn get_user_once(&self, id: &IdentityId) -> Result<IdentityRecord, IdpError> {
		let response = self
			.http_client
			.get(self.user_url(id))
			.bearer_auth(self.secret_key.expose())
			.send()
			.await
			.map_err(map_send_error)?;
		let user: ApiUser = decode(response, Some(id)).await?;
		to_record(user)
	}

	async fn update_role_once(
		&self,
		id: &IdentityId,
		body: &MetadataPatch,
	) -> Result<IdentityRecord, IdpError> {
		let response = self
			.http_client
			.patch(format!("{}/metadata", self.user_url(id)))
			.bearer_auth(self.secret_key.expose())
			.json(body)
			.send()
			.await
			.map_err(map_send_error)?;
		let user: ApiUser = decode(response, Some(id)).await?;
		to_record(user)
	}

	async fn list_users_once(
		&self,
		params: &[(&str, String)],
	) -> Result<Vec<IdentityRecord>, IdpError> {
		let response = self
			.http_client
			.get(format!("{}/v1/users", self.base_url))
			.bearer_auth(self.secret_key.expose())
			.query(params)
			.send()
			.await
			.map_err(map_send_error)?;
		let users: Vec<ApiUser> = decode(response, None).await?;
		Ok(users
			.into_iter()
			.filter_map(|user| {
				let raw_id = user.id.clone();
				match IdentityRecord::try_from(user) {
					Ok(record) => Some(record),
					Err(e) => {
						warn!(user_id = %raw_id, error = %e, "skipping user with unusable id");
						None
					}
				}
			})
			.collect())
	}
}

fn map_send_error(e: reqwest::Error) -> IdpError {
	if e.is_timeout() {
		error!("identity provider request timed out");
		return IdpError::Timeout;
	}
	error!(error = %e, "network error talking to identity provider");
	IdpError::Network(e)
}

fn to_record(user: ApiUser) -> Result<IdentityRecord, IdpError> {
	IdentityRecord::try_from(user).map_err(|e| IdpError::InvalidResponse(e.to_string()))
}

async fn decode<T: DeserializeOwned>(
	response: Response,
	id: Option<&IdentityId>,
) -> Result<T, IdpError> {
	let status = response.status();
	debug!(status = %status, "identity provider responded");

	if !status.is_success() {
		let body = response.text().await.unwrap_or_default();
		return Err(match status {
			StatusCode::NOT_FOUND => match id {
				Some(id) => IdpError::NotFound(id.clone()),
				None => IdpError::ApiError {
					status: status.as_u16(),
					message: body,
				},
			},
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
				error!(status = status.as_u16(), "identity provider rejected API key");
				IdpError::Unauthorized
			}
			StatusCode::TOO_MANY_REQUESTS => IdpError::RateLimited,
			_ => {
				error!(status = status.as_u16(), body = %body, "identity provider API error");
				IdpError::ApiError {
					status: status.as_u16(),
					message: body,
				}
			}
		});
	}

	let body = response.text().await.map_err(IdpError::Network)?;
	serde_json::from_str(&body).map_err(|e| {
		error!(error = %e, "failed to parse identity provider response");
		IdpError::InvalidResponse(format!("JSON parse error: {e}"))
	})
}

#[async_trait]
impl IdentityProvider for IdpClient {
	async fn get_identity(&self, id: &IdentityId) -> Result<IdentityRecord, IdentityError> {
		Ok(self.get_user(id).await?)
	}

	async fn write_role(
		&self,
		id: &IdentityId,
		role: Option<Role>,
	) -> Result<IdentityRecord, IdentityError> {
		Ok(self.update_role(id, role).await?)
	}

	async fn list_identities(&self, query: &UserQuery) -> Result<Vec<IdentityRecord>, IdentityError> {
		Ok(self.list_users(query).await?)
	}
}
