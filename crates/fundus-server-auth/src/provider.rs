// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The seam between Fundus and wherever identities live.
//!
//! In production this is the hosted identity provider's REST API (see the
//! `fundus-server-idp` crate). [`MemoryIdentityProvider`] backs tests and
//! local development.

use crate::types::{IdentityId, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
	pub id: IdentityId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Role claim as stored. `None` means no claim has been written.
	pub role: Option<Role>,
	/// Verbatim claim value when the provider reports it. Differs from
	/// `role` when the stored value is not a canonical role name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role_claim: Option<String>,
}

impl IdentityRecord {
	pub fn new(id: IdentityId) -> Self {
		Self {
			id,
			email: None,
			first_name: None,
			last_name: None,
			role: None,
			role_claim: None,
		}
	}

	pub fn with_role(mut self, role: Role) -> Self {
		self.role = Some(role);
		self.role_claim = Some(role.as_str().to_string());
		self
	}

	/// Whether the stored claim is something other than a canonical role
	/// name, such as a retired or misspelled value.
	pub fn has_noncanonical_claim(&self) -> bool {
		match &self.role_claim {
			Some(raw) => Some(raw.as_str()) != self.role.map(Role::as_str),
			None => false,
		}
	}

	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());
		self
	}

	pub fn effective_role(&self) -> Role {
		self.role.unwrap_or(Role::Patient)
	}

	fn matches_search(&self, needle: &str) -> bool {
		let needle = needle.to_lowercase();
		[&self.email, &self.first_name, &self.last_name]
			.into_iter()
			.flatten()
			.any(|field| field.to_lowercase().contains(&needle))
			|| self.id.as_str().contains(&needle)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
	pub search: Option<String>,
	pub limit: u32,
	pub offset: u32,
}

impl Default for UserQuery {
	fn default() -> Self {
		Self {
			search: None,
			limit: 50,
			offset: 0,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
	#[error("identity not found: {0}")]
	NotFound(IdentityId),

	#[error("identity provider unavailable: {0}")]
	Unavailable(String),

	#[error("identity provider rejected the request ({status}): {message}")]
	Rejected { status: u16, message: String },

	#[error("identity provider returned an invalid response: {0}")]
	InvalidResponse(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
	async fn get_identity(&self, id: &IdentityId) -> Result<IdentityRecord, IdentityError>;

	/// Writes the role claim. `None` removes it.
	async fn write_role(
		&self,
		id: &IdentityId,
		role: Option<Role>,
	) -> Result<IdentityRecord, IdentityError>;

	async fn list_identities(&self, query: &UserQuery) -> Result<Vec<IdentityRecord>, IdentityError>;
}

/// In-process provider keyed by identity id.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
	records: RwLock<BTreeMap<IdentityId, IdentityRecord>>,
	writes: AtomicUsize,
}

impl MemoryIdentityProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert(&self, record: IdentityRecord) {
		self.records.write().await.insert(record.id.clone(), record);
	}

	pub async fn remove(&self, id: &IdentityId) -> bool {
		self.records.write().await.remove(id).is_some()
	}

	/// Number of role writes performed.
	pub fn write_count(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
	async fn get_identity(&self, id: &IdentityId) -> Result<IdentityRecord, IdentityError> {
		self.records
			.read()
			.await
			.get(id)
			.cloned()
			.ok_or_else(|| IdentityError::NotFound(id.clone()))
	}

	async fn write_role(
		&self,
		id: &IdentityId,
		role: Option<Role>,
	) -> Result<IdentityRecord, IdentityError> {
		let mut records = self.records.write().await;
		let record = records
			.get_mut(id)
			.ok_or_else(|| IdentityError::NotFound(id.clone()))?;
		record.role = role;
		record.role_claim = role.map(|r| r.as_str().to_string());
		self.writes.fetch_add(1, Ordering::SeqCst);
		Ok(record.clone())
	}

	async fn list_identities(&self, query: &UserQuery) -> Result<Vec<IdentityRecord>, IdentityError> {
		let records = self.records.read().await;
		Ok(records
			.values()
			.filter(|r| query.search.as_deref().map_or(true, |s| r.matches_search(s)))
			.skip(query.offset as usize)
			.take(query.limit as usize)
			.cloned()
			.collect())
	}
}
