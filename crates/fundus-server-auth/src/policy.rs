// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Static access policy and its evaluator.
//!
//! The policy is an ordered list of route rules plus a map of named actions.
//! It is assembled once at startup and shared read-only; nothing mutates it
//! while the server runs.
//!
//! # Route rules
//!
//! Route rules are matched first-match-wins against the request path (query
//! string stripped). A path that matches no rule requires an authenticated
//! caller of any role.
//!
//! | Pattern | Access |
//! |---|---|
//! | `/`, `/sign-in*`, `/sign-up*`, `/api/webhook*`, `/health` | public |
//! | `/admin*`, `/management/users*`, `/api/admin*` | admin |
//! | everything else | any authenticated role |
//!
//! # Actions
//!
//! Mutations and privileged reads are checked by action id (see [`actions`]).
//! Unknown action ids are denied.

use crate::types::{Role, RoleSet};
use std::collections::HashMap;
use tracing::instrument;

/// Action identifiers understood by [`PolicyTable::standard`].
pub mod actions {
	/// Upload a scan and run analysis on it.
	pub const SCANS_UPLOAD: &str = "scans.upload";
	/// Read scans that belong to other identities.
	pub const SCANS_READ_ANY: &str = "scans.read_any";
	/// See every pending scan request.
	pub const SCAN_REQUESTS_REVIEW: &str = "scan_requests.review";
	/// Read another identity's role.
	pub const USERS_READ_ANY: &str = "users.read_any";
	/// Change or clear a role claim.
	pub const USERS_SET_ROLE: &str = "users.set_role";
	/// List identities.
	pub const USERS_LIST: &str = "users.list";
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow,
	Deny,
}

impl Decision {
	pub fn is_allowed(self) -> bool {
		matches!(self, Decision::Allow)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
	/// Anyone, including unauthenticated callers.
	Public,
	/// Any authenticated caller.
	Authenticated,
	/// Only the listed roles. Empty means nobody.
	Roles(RoleSet),
}

impl Access {
	fn permits(self, role: Option<Role>) -> bool {
		match self {
			Access::Public => true,
			Access::Authenticated => role.is_some(),
			Access::Roles(set) => role.is_some_and(|r| set.contains(r)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
	/// Matches only this exact path.
	Exact(String),
	/// Matches the path itself and anything below it (`/admin`, `/admin/x`),
	/// but not siblings sharing the prefix (`/administrator`).
	Prefix(String),
}

impl RoutePattern {
	pub fn exact(path: impl Into<String>) -> Self {
		RoutePattern::Exact(path.into())
	}

	pub fn prefix(path: impl Into<String>) -> Self {
		RoutePattern::Prefix(path.into())
	}

	pub fn matches(&self, path: &str) -> bool {
		match self {
			RoutePattern::Exact(p) => path == p,
			RoutePattern::Prefix(p) => match path.strip_prefix(p.as_str()) {
				Some(rest) => rest.is_empty() || rest.starts_with('/'),
				None => false,
			},
		}
	}

	fn as_str(&self) -> &str {
		match self {
			RoutePattern::Exact(p) | RoutePattern::Prefix(p) => p,
		}
	}
}

#[derive(Debug, Clone)]
struct RouteRule {
	pattern: RoutePattern,
	access: Access,
}

// =============================================================================
// Policy Table
// =============================================================================

#[derive(Debug, Clone)]
pub struct PolicyTable {
	routes: Vec<RouteRule>,
	actions: HashMap<String, RoleSet>,
}

#[derive(Debug, Default)]
pub struct PolicyTableBuilder {
	routes: Vec<RouteRule>,
	actions: HashMap<String, RoleSet>,
}

impl PolicyTableBuilder {
	pub fn route(mut self, pattern: RoutePattern, access: Access) -> Self {
		self.routes.push(RouteRule { pattern, access });
		self
	}

	pub fn public(self, pattern: RoutePattern) -> Self {
		self.route(pattern, Access::Public)
	}

	pub fn action(mut self, id: impl Into<String>, roles: RoleSet) -> Self {
		self.actions.insert(id.into(), roles);
		self
	}

	pub fn build(self) -> PolicyTable {
		PolicyTable {
			routes: self.routes,
			actions: self.actions,
		}
	}
}

impl PolicyTable {
	pub fn builder() -> PolicyTableBuilder {
		PolicyTableBuilder::default()
	}

	/// The policy the server runs with.
	pub fn standard() -> Self {
		let admin = RoleSet::of(&[Role::Admin]);
		let staff = RoleSet::of(&[Role::Admin, Role::Doctor]);

		Self::builder()
			.public(RoutePattern::exact("/"))
			.public(RoutePattern::prefix("/sign-in"))
			.public(RoutePattern::prefix("/sign-up"))
			.public(RoutePattern::prefix("/api/webhook"))
			.public(RoutePattern::exact("/health"))
			.route(RoutePattern::prefix("/admin"), Access::Roles(admin))
			.route(RoutePattern::prefix("/management/users"), Access::Roles(admin))
			.route(RoutePattern::prefix("/api/admin"), Access::Roles(admin))
			.action(actions::SCANS_UPLOAD, staff)
			.action(actions::SCANS_READ_ANY, staff)
			.action(actions::SCAN_REQUESTS_REVIEW, staff)
			.action(actions::USERS_READ_ANY, admin)
			.action(actions::USERS_SET_ROLE, admin)
			.action(actions::USERS_LIST, admin)
			.build()
	}

	/// Access level of a request path.
	pub fn route_access(&self, path: &str) -> Access {
		let path = strip_query(path);
		self.routes
			.iter()
			.find(|rule| rule.pattern.matches(path))
			.map(|rule| rule.access)
			.unwrap_or(Access::Authenticated)
	}

	/// Roles allowed to perform an action. Unknown actions permit nobody.
	pub fn action_roles(&self, action: &str) -> RoleSet {
		self.actions.get(action).copied().unwrap_or_default()
	}

	/// Decides whether `role` may reach `target`.
	///
	/// Targets beginning with `/` are request paths; anything else is an
	/// action id. `None` means the caller is not authenticated.
	#[instrument(level = "debug", skip(self), ret)]
	pub fn evaluate(&self, role: Option<Role>, target: &str) -> Decision {
		let access = if target.starts_with('/') {
			self.route_access(target)
		} else {
			Access::Roles(self.action_roles(target))
		};
		if access.permits(role) {
			Decision::Allow
		} else {
			Decision::Deny
		}
	}

	/// Non-public rules whose role set is empty. These deny everyone; the
	/// server logs them at startup.
	pub fn empty_role_sets(&self) -> Vec<String> {
		let routes = self.routes.iter().filter_map(|r| match r.access {
			Access::Roles(set) if set.is_empty() => Some(r.pattern.as_str().to_string()),
			_ => None,
		});
		let actions = self
			.actions
			.iter()
			.filter(|(_, set)| set.is_empty())
			.map(|(id, _)| id.clone());
		let mut out: Vec<String> = routes.chain(actions).collect();
		out.sort();
		out
	}
}

impl Default for PolicyTable {
	fn default() -> Self {
		Self::standard()
	}
}

fn strip_query(path: &str) -> &str {
	match path.find(|c: char| c == '?' || c == '#') {
		Some(idx) => &path[..idx],
		None => path,
	}
}
