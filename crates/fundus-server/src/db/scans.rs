// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use fundus_server_auth::IdentityId;
use fundus_server_inference::Prediction;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn parse(s: &str) -> Option<Self> {
		Uuid::parse_str(s).ok().map(Self)
	}
}

impl fmt::Display for ScanId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
	pub id: ScanId,
	pub patient_id: IdentityId,
	pub uploaded_by: IdentityId,
	pub file_name: String,
	pub content_type: String,
	pub size_bytes: u64,
	pub created_at: DateTime<Utc>,
	pub analysis: Option<Prediction>,
	/// Set instead of `analysis` when classification failed.
	pub analysis_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewScan {
	pub patient_id: IdentityId,
	pub uploaded_by: IdentityId,
	pub file_name: String,
	pub content_type: String,
	pub size_bytes: u64,
	pub analysis: Result<Prediction, String>,
}

#[derive(Debug, Default)]
pub struct ScanRepository {
	scans: RwLock<BTreeMap<ScanId, Scan>>,
}

impl ScanRepository {
	pub fn new() -> Self {
		Self::default()
	}

	#[tracing::instrument(skip(self, new), fields(patient_id = %new.patient_id))]
	pub async fn create(&self, new: NewScan) -> Scan {
		let (analysis, analysis_error) = match new.analysis {
			Ok(p) => (Some(p), None),
			Err(e) => (None, Some(e)),
		};
		let scan = Scan {
			id: ScanId::generate(),
			patient_id: new.patient_id,
			uploaded_by: new.uploaded_by,
			file_name: new.file_name,
			content_type: new.content_type,
			size_bytes: new.size_bytes,
			created_at: Utc::now(),
			analysis,
			analysis_error,
		};
		self.scans.write().await.insert(scan.id, scan.clone());
		tracing::debug!(scan_id = %scan.id, "scan stored");
		scan
	}

	pub async fn get(&self, id: ScanId) -> Option<Scan> {
		self.scans.read().await.get(&id).cloned()
	}

	/// All scans, newest first.
	pub async fn list_all(&self) -> Vec<Scan> {
		let mut scans: Vec<Scan> = self.scans.read().await.values().cloned().collect();
		scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		scans
	}

	pub async fn list_for_patient(&self, patient_id: &IdentityId) -> Vec<Scan> {
		let mut scans: Vec<Scan> = self
			.scans
			.read()
			.await
			.values()
			.filter(|s| &s.patient_id == patient_id)
			.cloned()
			.collect();
		scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		scans
	}
}
