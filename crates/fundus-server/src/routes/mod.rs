// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod ai;
pub mod health;
pub mod pages;
pub mod scan_requests;
pub mod scans;
pub mod users;
pub mod webhooks;
