// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client for the external disease classification service.
//!
//! The service exposes two endpoints:
//!
//! - `POST /predict/` with a multipart `file` field, answering per-class
//!   probabilities for cataract, diabetic retinopathy, glaucoma and normal
//! - `GET /`, a liveness probe
//!
//! Any failure (timeout, non-2xx, unparseable body) is an
//! [`InferenceError`]; it is never turned into a prediction.

pub mod client;
pub mod error;
pub mod types;

pub use client::{InferenceClient, InferenceClientConfig};
pub use error::InferenceError;
pub use fundus_common_http::RetryConfig;
pub use types::{Disease, DiseaseScores, Prediction, ServiceStatus};
