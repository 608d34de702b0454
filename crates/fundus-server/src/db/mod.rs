// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-process record stores for scans and scan requests.
//!
//! Stores hold records only. Who may read or write them is decided by the
//! handlers against the policy table.

mod scan_requests;
mod scans;

pub use scan_requests::{
	NewScanRequest, Priority, RequestStatus, ReviewUpdate, ScanRequest, ScanRequestError,
	ScanRequestId, ScanRequestRepository,
};
pub use scans::{NewScan, Scan, ScanId, ScanRepository};
