// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire types of the user API.

use fundus_server_auth::{IdentityId, IdentityRecord, InvalidIdentityId, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
	pub id: String,
	#[serde(default)]
	pub first_name: Option<String>,
	#[serde(default)]
	pub last_name: Option<String>,
	#[serde(default)]
	pub primary_email_address_id: Option<String>,
	#[serde(default)]
	pub email_addresses: Vec<ApiEmailAddress>,
	#[serde(default)]
	pub public_metadata: ApiPublicMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEmailAddress {
	pub id: String,
	pub email_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPublicMetadata {
	#[serde(default)]
	pub role: Option<String>,
}

/// Body of `PATCH /v1/users/{id}/metadata`. The provider deep-merges
/// metadata; a `null` value deletes the key.
#[derive(Debug, Serialize)]
pub struct MetadataPatch {
	pub public_metadata: RolePatch,
}

#[derive(Debug, Serialize)]
pub struct RolePatch {
	pub role: Option<Role>,
}

impl TryFrom<ApiUser> for IdentityRecord {
	type Error = InvalidIdentityId;

	fn try_from(user: ApiUser) -> Result<Self, Self::Error> {
		let email = user
			.primary_email_address_id
			.as_deref()
			.and_then(|primary| user.email_addresses.iter().find(|e| e.id == primary))
			.or_else(|| user.email_addresses.first())
			.map(|e| e.email_address.clone());
		let role_claim = user.public_metadata.role;
		let role = role_claim
			.as_deref()
			.map(|raw| Role::from_claim(Some(raw)));
		Ok(IdentityRecord {
			id: IdentityId::parse(user.id)?,
			email,
			first_name: user.first_name,
			last_name: user.last_name,
			role,
			role_claim,
		})
	}
}
