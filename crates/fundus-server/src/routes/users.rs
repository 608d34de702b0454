// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Role assignment and user lookup handlers.
//!
//! Every handler re-checks the caller's role here even where the route guard
//! already did.

use axum::{
	extract::{Query, State},
	Json,
};
use fundus_server_auth::{
	actions, role_mutation, IdentityId, IdentityRecord, Role, UnknownRole, UserQuery,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
	api::AppState,
	auth_middleware::{Auth, RequireAuth},
	error::ServerError,
};

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleRequest {
	#[serde(default, alias = "userId")]
	pub identity_id: Option<String>,
	#[serde(default)]
	pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRoleRequest {
	#[serde(default, alias = "userId")]
	pub identity_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeResponse {
	pub success: bool,
	pub identity_id: IdentityId,
	pub role: Role,
	/// False when the user already had the requested role.
	pub changed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
	pub user_id: IdentityId,
	pub role: Role,
	pub dashboard: &'static str,
}

impl RoleResponse {
	fn new(user_id: IdentityId, role: Role) -> Self {
		Self {
			user_id,
			role,
			dashboard: role.dashboard_path(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleByIdQuery {
	pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
	pub limit: Option<u32>,
	pub offset: Option<u32>,
	pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
	pub id: IdentityId,
	pub email: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub role: Role,
}

impl From<IdentityRecord> for UserSummary {
	fn from(record: IdentityRecord) -> Self {
		let role = record.effective_role();
		Self {
			id: record.id,
			email: record.email,
			first_name: record.first_name,
			last_name: record.last_name,
			role,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
	pub users: Vec<UserSummary>,
	pub limit: u32,
	pub offset: u32,
}

fn parse_identity_id(raw: Option<&str>) -> Result<IdentityId, ServerError> {
	let raw = raw
		.filter(|s| !s.trim().is_empty())
		.ok_or_else(|| ServerError::BadRequest("Missing required field: identityId".to_string()))?;
	IdentityId::parse(raw).map_err(|e| ServerError::BadRequest(e.to_string()))
}

/// POST /api/users/set-role
#[instrument(skip(state, auth, payload))]
pub async fn set_role(
	State(state): State<AppState>,
	Auth(auth): Auth,
	Json(payload): Json<SetRoleRequest>,
) -> Result<Json<RoleChangeResponse>, ServerError> {
	let identity_id = parse_identity_id(payload.identity_id.as_deref())?;
	let role: Role = payload
		.role
		.as_deref()
		.ok_or_else(|| ServerError::BadRequest("Missing required field: role".to_string()))?
		.parse()
		.map_err(|e: UnknownRole| ServerError::BadRequest(e.to_string()))?;

	let change = role_mutation::set_role(
		&state.policy,
		state.identity.as_ref(),
		&auth,
		&identity_id,
		role,
	)
	.await?;

	Ok(Json(RoleChangeResponse {
		success: true,
		identity_id: change.identity_id,
		role: change.current,
		changed: change.written,
	}))
}

/// POST /api/users/remove-role
#[instrument(skip(state, auth, payload))]
pub async fn remove_role(
	State(state): State<AppState>,
	Auth(auth): Auth,
	Json(payload): Json<RemoveRoleRequest>,
) -> Result<Json<RoleChangeResponse>, ServerError> {
	let identity_id = parse_identity_id(payload.identity_id.as_deref())?;
	let change =
		role_mutation::clear_role(&state.policy, state.identity.as_ref(), &auth, &identity_id)
			.await?;

	Ok(Json(RoleChangeResponse {
		success: true,
		identity_id: change.identity_id,
		role: change.current,
		changed: change.written,
	}))
}

/// GET /api/user/role
///
/// Reads the stored claim rather than the session copy, which may be stale
/// until the session is refreshed.
#[instrument(skip(state, user), fields(identity_id = %user.identity_id))]
pub async fn own_role(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
) -> Result<Json<RoleResponse>, ServerError> {
	let record = state.identity.get_identity(&user.identity_id).await?;
	Ok(Json(RoleResponse::new(record.id.clone(), record.effective_role())))
}

/// GET /api/users/role?userId=
///
/// Callers may read their own role; reading anyone else's requires
/// `users.read_any`.
#[instrument(skip(state, user, query), fields(identity_id = %user.identity_id))]
pub async fn role_by_id(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Query(query): Query<RoleByIdQuery>,
) -> Result<Json<RoleResponse>, ServerError> {
	let target = parse_identity_id(query.user_id.as_deref())?;
	let is_self = target == user.identity_id;
	if !is_self
		&& !state
			.policy
			.evaluate(Some(user.role), actions::USERS_READ_ANY)
			.is_allowed()
	{
		tracing::warn!(target_id = %target, "role read refused");
		return Err(ServerError::NotAuthorized);
	}

	let record = state.identity.get_identity(&target).await?;
	Ok(Json(RoleResponse::new(record.id.clone(), record.effective_role())))
}

/// GET /api/admin/users
#[instrument(skip(state, user, query), fields(identity_id = %user.identity_id))]
pub async fn list_users(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ServerError> {
	if !state
		.policy
		.evaluate(Some(user.role), actions::USERS_LIST)
		.is_allowed()
	{
		return Err(ServerError::NotAuthorized);
	}

	let defaults = UserQuery::default();
	let user_query = UserQuery {
		search: query.search.filter(|s| !s.trim().is_empty()),
		limit: query.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
		offset: query.offset.unwrap_or(0),
	};

	let users = state.identity.list_identities(&user_query).await?;
	tracing::debug!(count = users.len(), "listed users");

	Ok(Json(ListUsersResponse {
		users: users.into_iter().map(UserSummary::from).collect(),
		limit: user_query.limit,
		offset: user_query.offset,
	}))
}
