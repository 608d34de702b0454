// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Fundus.
//!
//! Every outbound call the server makes (identity provider, inference
//! service) goes through a client built here so that User-Agent and timeouts
//! are applied consistently, and transient failures are retried with
//! exponential backoff.

mod client;
mod retry;

pub use client::{builder, client_with_timeout, user_agent};
pub use retry::{is_transient_status, retry, RetryConfig, RetryableError};
