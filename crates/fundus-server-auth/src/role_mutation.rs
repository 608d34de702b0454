// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The single code path that changes a role claim.
//!
//! The caller's authority is checked against the policy here, on the server,
//! before the provider is touched. UI-level guards are not trusted.

use crate::middleware::AuthContext;
use crate::policy::{actions, PolicyTable};
use crate::provider::{IdentityError, IdentityProvider};
use crate::types::{IdentityId, Role};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum RoleMutationError {
	#[error("Not Authorized")]
	NotAuthorized,

	#[error("unknown identity: {0}")]
	UnknownIdentity(IdentityId),

	#[error("identity provider error: {0}")]
	Upstream(#[source] IdentityError),
}

impl From<IdentityError> for RoleMutationError {
	fn from(err: IdentityError) -> Self {
		match err {
			IdentityError::NotFound(id) => RoleMutationError::UnknownIdentity(id),
			other => RoleMutationError::Upstream(other),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
	pub identity_id: IdentityId,
	pub previous: Role,
	pub current: Role,
	/// False when the stored claim already matched and no write was issued.
	pub written: bool,
}

/// Sets `subject`'s role. Re-running with the same role is a no-op.
#[instrument(skip(policy, provider, caller), fields(actor = ?caller.user().map(|u| u.identity_id.as_str())))]
pub async fn set_role(
	policy: &PolicyTable,
	provider: &dyn IdentityProvider,
	caller: &AuthContext,
	subject: &IdentityId,
	role: Role,
) -> Result<RoleChange, RoleMutationError> {
	mutate(policy, provider, caller, subject, Some(role)).await
}

/// Removes `subject`'s role claim, returning them to the default role.
#[instrument(skip(policy, provider, caller), fields(actor = ?caller.user().map(|u| u.identity_id.as_str())))]
pub async fn clear_role(
	policy: &PolicyTable,
	provider: &dyn IdentityProvider,
	caller: &AuthContext,
	subject: &IdentityId,
) -> Result<RoleChange, RoleMutationError> {
	mutate(policy, provider, caller, subject, None).await
}

async fn mutate(
	policy: &PolicyTable,
	provider: &dyn IdentityProvider,
	caller: &AuthContext,
	subject: &IdentityId,
	role: Option<Role>,
) -> Result<RoleChange, RoleMutationError> {
	if !policy.evaluate(caller.role(), actions::USERS_SET_ROLE).is_allowed() {
		tracing::warn!(target_id = %subject, "role change refused: caller is not an admin");
		return Err(RoleMutationError::NotAuthorized);
	}
	// Checked above; an authorized caller is always authenticated.
	let actor = caller.require_user().map_err(|_| RoleMutationError::NotAuthorized)?;

	let existing = provider.get_identity(subject).await?;
	let previous = existing.effective_role();

	if existing.role == role && !existing.has_noncanonical_claim() {
		tracing::debug!(target_id = %subject, role = ?role, "role already set");
		return Ok(RoleChange {
			identity_id: subject.clone(),
			previous,
			current: previous,
			written: false,
		});
	}

	let updated = provider.write_role(subject, role).await?;
	let current = updated.effective_role();
	tracing::info!(
		actor_id = %actor.identity_id,
		target_id = %subject,
		previous = %previous,
		current = %current,
		"role changed"
	);
	Ok(RoleChange {
		identity_id: subject.clone(),
		previous,
		current,
		written: true,
	})
}
