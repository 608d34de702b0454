// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity and role types.
//!
//! Identities are owned by the hosted identity provider, so [`IdentityId`] is
//! an opaque string (e.g. `user_2Nq8...`) rather than a UUID. The role claim
//! is a closed enum; anything outside it is rejected at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Identity ID
// =============================================================================

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

/// Rejected identity id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identity id: {0:?}")]
pub struct InvalidIdentityId(pub String);

impl IdentityId {
	/// Validates and wraps an identity id.
	///
	/// Ids are interpolated into provider API paths, so they must be non-empty
	/// and limited to `[A-Za-z0-9_-]`.
	pub fn parse(value: impl Into<String>) -> Result<Self, InvalidIdentityId> {
		let value = value.into();
		let valid = !value.is_empty()
			&& value.len() <= 128
			&& value
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
		if valid {
			Ok(Self(value))
		} else {
			Err(InvalidIdentityId(value))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for IdentityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl TryFrom<String> for IdentityId {
	type Error = InvalidIdentityId;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}

impl From<IdentityId> for String {
	fn from(id: IdentityId) -> Self {
		id.0
	}
}

// =============================================================================
// Role
// =============================================================================

/// The role claim carried by every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Manages users and roles; sees everything.
	Admin,
	/// Uploads scans and reviews analyses for any patient.
	Doctor,
	/// Sees only their own scans and requests. Default for new identities.
	Patient,
}

/// A role string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl Role {
	pub fn all() -> &'static [Role] {
		&[Role::Admin, Role::Doctor, Role::Patient]
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Role::Admin => "admin",
			Role::Doctor => "doctor",
			Role::Patient => "patient",
		}
	}

	/// Interprets the role claim stored on an identity.
	///
	/// An absent claim means [`Role::Patient`]. An unrecognised stored value
	/// also resolves to `Patient`, the least privileged role.
	pub fn from_claim(claim: Option<&str>) -> Role {
		match claim {
			None => Role::Patient,
			Some(raw) => raw.parse().unwrap_or_else(|_| {
				tracing::warn!(claim = raw, "unrecognised role claim, treating as patient");
				Role::Patient
			}),
		}
	}

	/// Landing page after sign-in.
	pub fn dashboard_path(self) -> &'static str {
		match self {
			Role::Admin => "/dashboard/admin",
			Role::Doctor => "/dashboard/doctor",
			Role::Patient => "/dashboard/patient",
		}
	}

	/// Admins and doctors see every patient's records.
	pub fn is_clinical_staff(self) -> bool {
		matches!(self, Role::Admin | Role::Doctor)
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(Role::Admin),
			"doctor" => Ok(Role::Doctor),
			"patient" => Ok(Role::Patient),
			other => Err(UnknownRole(other.to_string())),
		}
	}
}

// =============================================================================
// Role Set
// =============================================================================

/// A set of roles. An empty set permits nobody.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
	pub const fn empty() -> Self {
		Self(0)
	}

	pub const fn all() -> Self {
		Self(0b111)
	}

	pub fn of(roles: &[Role]) -> Self {
		roles.iter().fold(Self::empty(), |set, r| set.with(*r))
	}

	pub const fn with(self, role: Role) -> Self {
		Self(self.0 | Self::bit(role))
	}

	pub const fn contains(self, role: Role) -> bool {
		self.0 & Self::bit(role) != 0
	}

	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub fn iter(self) -> impl Iterator<Item = Role> {
		Role::all().iter().copied().filter(move |r| self.contains(*r))
	}

	const fn bit(role: Role) -> u8 {
		match role {
			Role::Admin => 0b001,
			Role::Doctor => 0b010,
			Role::Patient => 0b100,
		}
	}
}

impl fmt::Debug for RoleSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

impl FromIterator<Role> for RoleSet {
	fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
		iter.into_iter().fold(Self::empty(), |set, r| set.with(r))
	}
}
