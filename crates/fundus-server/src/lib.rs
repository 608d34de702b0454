// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fundus HTTP server.
//!
//! Serves the OphthalmoScan pages and JSON API behind a role-based route
//! guard. Identities and role claims live at the hosted identity provider;
//! fundus image classification is delegated to an external service.

pub mod api;
pub mod auth_middleware;
pub mod db;
pub mod error;
pub mod routes;

pub use api::{create_app_state, create_app_state_with_provider, create_router, AppState, IdentityBackend};
pub use error::{ErrorResponse, ServerError};
pub use fundus_server_config::ServerConfig;
