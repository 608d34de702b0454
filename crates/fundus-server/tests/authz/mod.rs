// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod pages;
mod scan_requests;
mod scans;
mod support;
mod webhook;
