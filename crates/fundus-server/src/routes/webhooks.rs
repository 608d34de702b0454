// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Identity provider event webhook.
//!
//! Deliveries are signed; anything that fails verification is rejected
//! before the body is parsed.

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	Json,
};
use fundus_common_webhook::{SignedHeaders, HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use fundus_server_auth::{IdentityError, IdentityId, Role};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
	#[serde(rename = "type")]
	pub event_type: String,
	pub data: IdentityEventData,
}

#[derive(Debug, Deserialize)]
pub struct IdentityEventData {
	pub id: String,
	#[serde(default)]
	pub public_metadata: EventMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventMetadata {
	#[serde(default)]
	pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
	pub received: bool,
	pub role_assigned: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /api/webhook/identity
#[instrument(skip_all, fields(event_type = tracing::field::Empty))]
pub async fn identity_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<(StatusCode, Json<WebhookAck>), ServerError> {
	let verifier = state.webhook.as_ref().ok_or_else(|| {
		tracing::error!("identity webhook received but no signing secret is configured");
		ServerError::ServiceUnavailable("Webhook verification is not configured".to_string())
	})?;

	let signed = SignedHeaders {
		id: header(&headers, HEADER_ID),
		timestamp: header(&headers, HEADER_TIMESTAMP),
		signature: header(&headers, HEADER_SIGNATURE),
	};
	verifier.verify(signed, &body).map_err(|e| {
		tracing::warn!(error = %e, "webhook verification failed");
		ServerError::Unauthorized("Invalid webhook signature".to_string())
	})?;

	let event: IdentityEvent = serde_json::from_slice(&body)
		.map_err(|e| ServerError::BadRequest(format!("Invalid event payload: {e}")))?;
	tracing::Span::current().record("event_type", event.event_type.as_str());

	let role_assigned = match event.event_type.as_str() {
		"user.created" => assign_default_role(&state, &event.data).await?,
		"user.updated" | "user.deleted" => {
			tracing::info!(identity_id = %event.data.id, event = %event.event_type, "identity event");
			false
		}
		other => {
			tracing::debug!(event = %other, "ignoring identity event");
			false
		}
	};

	Ok((
		StatusCode::OK,
		Json(WebhookAck {
			received: true,
			role_assigned,
		}),
	))
}

/// Gives a new identity the `patient` role unless one was set at creation.
async fn assign_default_role(
	state: &AppState,
	data: &IdentityEventData,
) -> Result<bool, ServerError> {
	if data.public_metadata.role.is_some() {
		return Ok(false);
	}
	let id = IdentityId::parse(data.id.as_str())
		.map_err(|e| ServerError::BadRequest(e.to_string()))?;

	match state.identity.write_role(&id, Some(Role::Patient)).await {
		Ok(_) => {
			tracing::info!(identity_id = %id, role = %Role::Patient, "default role assigned");
			Ok(true)
		}
		Err(IdentityError::NotFound(_)) => {
			tracing::warn!(identity_id = %id, "created identity not found at provider");
			Ok(false)
		}
		Err(e) => Err(e.into()),
	}
}
