// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource-level guard.
//!
//! Wraps a piece of content (an upload form, a management panel) and shows
//! fallback content to roles outside the allowed set. This is presentation
//! only: any mutation behind the content re-checks the policy itself.

use crate::policy::PolicyTable;
use crate::types::{Role, RoleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRestricted {
	allowed: RoleSet,
}

impl RoleRestricted {
	pub fn new(allowed: &[Role]) -> Self {
		Self {
			allowed: RoleSet::of(allowed),
		}
	}

	/// Guard whose allowed roles are those of a policy action.
	pub fn for_action(policy: &PolicyTable, action: &str) -> Self {
		Self {
			allowed: policy.action_roles(action),
		}
	}

	pub fn permits(&self, role: Option<Role>) -> bool {
		role.is_some_and(|r| self.allowed.contains(r))
	}

	/// Produces `children` when `role` is allowed, `fallback` otherwise.
	/// Only the selected closure runs.
	pub fn render<T>(
		&self,
		role: Option<Role>,
		children: impl FnOnce() -> T,
		fallback: impl FnOnce() -> T,
	) -> T {
		if self.permits(role) {
			children()
		} else {
			tracing::debug!(?role, allowed = ?self.allowed, "rendering fallback content");
			fallback()
		}
	}
}
