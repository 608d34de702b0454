// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-based access control for Fundus.
//!
//! Every request passes through the same pipeline:
//!
//! ```text
//! request ─▶ session token ─▶ AuthContext ─▶ route guard ─▶ handler
//!                 │                │              │             │
//!          SessionVerifier   Option<Role>   PolicyTable   RoleRestricted /
//!                                           ::evaluate    role_mutation
//! ```
//!
//! - [`types`]: identity ids, the closed [`Role`] enum and [`RoleSet`]
//! - [`policy`]: the static [`PolicyTable`] and its pure evaluator
//! - [`guard`]: resource-level [`RoleRestricted`] checks
//! - [`session`]: verification of provider-issued session tokens
//! - [`middleware`]: [`AuthContext`] and token extraction from headers
//! - [`provider`]: the [`IdentityProvider`] seam where role claims are stored
//! - [`role_mutation`]: the only code path that changes a role claim

pub mod guard;
pub mod middleware;
pub mod policy;
pub mod provider;
pub mod role_mutation;
pub mod session;
pub mod types;

pub use guard::RoleRestricted;
pub use middleware::{
	extract_bearer_token, extract_session_cookie_with_name, extract_session_token, AuthContext,
	AuthRequired, CurrentUser, SESSION_COOKIE_NAME,
};
pub use policy::{actions, Access, Decision, PolicyTable, PolicyTableBuilder, RoutePattern};
pub use provider::{
	IdentityError, IdentityProvider, IdentityRecord, MemoryIdentityProvider, UserQuery,
};
pub use role_mutation::{clear_role, set_role, RoleChange, RoleMutationError};
pub use session::{SessionClaims, SessionError, SessionMetadata, SessionVerifier, VerifiedSession};
pub use types::{IdentityId, InvalidIdentityId, Role, RoleSet, UnknownRole};
