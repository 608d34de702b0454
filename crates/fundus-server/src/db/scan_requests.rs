// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use fundus_server_auth::IdentityId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type ScanRequestId = Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	Low,
	#[default]
	Medium,
	High,
	Urgent,
}

impl FromStr for Priority {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"low" => Ok(Priority::Low),
			"medium" => Ok(Priority::Medium),
			"high" => Ok(Priority::High),
			"urgent" => Ok(Priority::Urgent),
			other => Err(format!("invalid priority '{other}'")),
		}
	}
}

/// Lifecycle of a request.
///
/// ```text
/// pending ─▶ assigned ─▶ reviewed ─▶ completed
///    │           │           │
///    └───────────┴───────────┴─▶ cancelled
/// ```
///
/// Steps may be skipped forward. `completed` and `cancelled` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
	Pending,
	Assigned,
	Reviewed,
	Completed,
	Cancelled,
}

impl RequestStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			RequestStatus::Pending => "pending",
			RequestStatus::Assigned => "assigned",
			RequestStatus::Reviewed => "reviewed",
			RequestStatus::Completed => "completed",
			RequestStatus::Cancelled => "cancelled",
		}
	}

	pub fn is_final(self) -> bool {
		matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
	}

	pub fn can_become(self, next: RequestStatus) -> bool {
		if self.is_final() {
			return false;
		}
		next == RequestStatus::Cancelled || next > self
	}
}

impl FromStr for RequestStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(RequestStatus::Pending),
			"assigned" => Ok(RequestStatus::Assigned),
			"reviewed" => Ok(RequestStatus::Reviewed),
			"completed" => Ok(RequestStatus::Completed),
			"cancelled" => Ok(RequestStatus::Cancelled),
			other => Err(format!("invalid status '{other}'")),
		}
	}
}

impl std::fmt::Display for RequestStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanRequestError {
	#[error("scan request {0} not found")]
	NotFound(ScanRequestId),

	#[error("cannot move scan request from {from} to {to}")]
	InvalidTransition {
		from: RequestStatus,
		to: RequestStatus,
	},
}

/// Reviewer changes to a request. A non-empty note with no explicit status
/// marks the request `reviewed`.
#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
	pub doctor_note: Option<String>,
	pub status: Option<RequestStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
	pub id: ScanRequestId,
	pub patient_id: IdentityId,
	pub description: String,
	pub symptoms: Option<String>,
	pub medical_history: Option<String>,
	pub priority: Priority,
	pub status: RequestStatus,
	pub assigned_doctor_id: Option<IdentityId>,
	pub doctor_note: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScanRequest {
	pub patient_id: IdentityId,
	pub description: String,
	pub symptoms: Option<String>,
	pub medical_history: Option<String>,
	pub priority: Priority,
}

#[derive(Debug, Default)]
pub struct ScanRequestRepository {
	requests: RwLock<Vec<ScanRequest>>,
}

impl ScanRequestRepository {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn create(&self, new: NewScanRequest) -> ScanRequest {
		let now = Utc::now();
		let request = ScanRequest {
			id: Uuid::new_v4(),
			patient_id: new.patient_id,
			description: new.description,
			symptoms: new.symptoms,
			medical_history: new.medical_history,
			priority: new.priority,
			status: RequestStatus::Pending,
			assigned_doctor_id: None,
			doctor_note: None,
			created_at: now,
			updated_at: now,
		};
		self.requests.write().await.push(request.clone());
		request
	}

	pub async fn get(&self, id: ScanRequestId) -> Option<ScanRequest> {
		self.requests
			.read()
			.await
			.iter()
			.find(|r| r.id == id)
			.cloned()
	}

	/// Takes a request on behalf of `doctor`.
	pub async fn assign(
		&self,
		id: ScanRequestId,
		doctor: &IdentityId,
	) -> Result<ScanRequest, ScanRequestError> {
		self.modify(id, |request| {
			transition(request, RequestStatus::Assigned)?;
			request.assigned_doctor_id = Some(doctor.clone());
			Ok(())
		})
		.await
	}

	pub async fn review(
		&self,
		id: ScanRequestId,
		reviewer: &IdentityId,
		update: ReviewUpdate,
	) -> Result<ScanRequest, ScanRequestError> {
		self.modify(id, |request| {
			let note = update
				.doctor_note
				.map(|n| n.trim().to_string())
				.filter(|n| !n.is_empty());
			let next = match (update.status, &note) {
				(Some(status), _) => Some(status),
				(None, Some(_)) if request.status < RequestStatus::Reviewed => {
					Some(RequestStatus::Reviewed)
				}
				(None, _) => None,
			};
			if let Some(next) = next.filter(|s| *s != request.status) {
				transition(request, next)?;
			} else if request.status.is_final() {
				return Err(ScanRequestError::InvalidTransition {
					from: request.status,
					to: request.status,
				});
			}
			if note.is_some() {
				request.doctor_note = note;
			}
			if request.assigned_doctor_id.is_none() {
				request.assigned_doctor_id = Some(reviewer.clone());
			}
			Ok(())
		})
		.await
	}

	async fn modify<F>(&self, id: ScanRequestId, change: F) -> Result<ScanRequest, ScanRequestError>
	where
		F: FnOnce(&mut ScanRequest) -> Result<(), ScanRequestError>,
	{
		let mut requests = self.requests.write().await;
		let request = requests
			.iter_mut()
			.find(|r| r.id == id)
			.ok_or(ScanRequestError::NotFound(id))?;
		let mut draft = request.clone();
		change(&mut draft)?;
		draft.updated_at = Utc::now();
		*request = draft.clone();
		Ok(draft)
	}

	/// Requests filed by `patient_id`, newest first.
	pub async fn list_for_patient(&self, patient_id: &IdentityId) -> Vec<ScanRequest> {
		self.requests
			.read()
			.await
			.iter()
			.rev()
			.filter(|r| &r.patient_id == patient_id)
			.cloned()
			.collect()
	}

	/// Pending requests, most urgent first, then oldest first.
	pub async fn list_pending(&self) -> Vec<ScanRequest> {
		let mut pending: Vec<ScanRequest> = self
			.requests
			.read()
			.await
			.iter()
			.filter(|r| r.status == RequestStatus::Pending)
			.cloned()
			.collect();
		pending.sort_by(|a, b| {
			b.priority
				.cmp(&a.priority)
				.then(a.created_at.cmp(&b.created_at))
		});
		pending
	}
}

fn transition(request: &mut ScanRequest, next: RequestStatus) -> Result<(), ScanRequestError> {
	if !request.status.can_become(next) {
		return Err(ScanRequestError::InvalidTransition {
			from: request.status,
			to: next,
		});
	}
	request.status = next;
	Ok(())
}
