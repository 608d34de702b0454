// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod auth;
mod http;
mod identity;
mod inference;
mod logging;
mod webhook;

pub use auth::{AuthConfig, AuthConfigLayer, SessionAlgorithm, SessionKey};
pub use http::{HttpConfig, HttpConfigLayer};
pub use identity::{IdentityConfig, IdentityConfigLayer};
pub use inference::{InferenceConfig, InferenceConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use webhook::{WebhookConfig, WebhookConfigLayer};
