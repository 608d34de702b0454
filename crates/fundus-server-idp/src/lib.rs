// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client for the hosted identity provider's backend user API.
//!
//! Role claims live in each user's `public_metadata.role`. [`IdpClient`]
//! reads and writes them and implements
//! [`fundus_server_auth::IdentityProvider`] so the role-mutation action can
//! run against it.

pub mod client;
pub mod error;
pub mod types;

pub use client::IdpClient;
pub use error::IdpError;
pub use fundus_common_http::RetryConfig;
