// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Prediction types, on the wire and as served to the application.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disease {
	Cataract,
	DiabeticRetinopathy,
	Glaucoma,
	Normal,
}

impl Disease {
	pub fn as_str(self) -> &'static str {
		match self {
			Disease::Cataract => "cataract",
			Disease::DiabeticRetinopathy => "diabetic_retinopathy",
			Disease::Glaucoma => "glaucoma",
			Disease::Normal => "normal",
		}
	}
}

impl fmt::Display for Disease {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Probability per class, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiseaseScores {
	pub cataract: f64,
	pub diabetic_retinopathy: f64,
	pub glaucoma: f64,
	pub normal: f64,
}

impl DiseaseScores {
	pub fn iter(&self) -> impl Iterator<Item = (Disease, f64)> {
		[
			(Disease::Cataract, self.cataract),
			(Disease::DiabeticRetinopathy, self.diabetic_retinopathy),
			(Disease::Glaucoma, self.glaucoma),
			(Disease::Normal, self.normal),
		]
		.into_iter()
	}

	pub fn get(&self, disease: Disease) -> f64 {
		match disease {
			Disease::Cataract => self.cataract,
			Disease::DiabeticRetinopathy => self.diabetic_retinopathy,
			Disease::Glaucoma => self.glaucoma,
			Disease::Normal => self.normal,
		}
	}

	pub(crate) fn validate(&self) -> Result<(), String> {
		for (disease, p) in self.iter() {
			if !p.is_finite() || !(0.0..=1.0).contains(&p) {
				return Err(format!("probability for {disease} out of range: {p}"));
			}
		}
		Ok(())
	}
}

/// Body returned by `POST /predict/`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPrediction {
	pub predicted_class: Disease,
	pub confidence: f64,
	pub class_probabilities: DiseaseScores,
}

/// Prediction as served to the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
	pub predictions: DiseaseScores,
	pub top_prediction: Disease,
	pub confidence: f64,
}

impl TryFrom<RawPrediction> for Prediction {
	type Error = String;

	fn try_from(raw: RawPrediction) -> Result<Self, Self::Error> {
		raw.class_probabilities.validate()?;
		if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
			return Err(format!("confidence out of range: {}", raw.confidence));
		}
		Ok(Prediction {
			predictions: raw.class_probabilities,
			top_prediction: raw.predicted_class,
			confidence: raw.confidence,
		})
	}
}

/// Result of the liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServiceStatus {
	/// Reachable and answering 2xx.
	Online { message: String },
	/// Reachable but answering non-2xx.
	Error { message: String },
	/// Unreachable or too slow.
	Offline { message: String },
}

impl ServiceStatus {
	pub fn is_online(&self) -> bool {
		matches!(self, ServiceStatus::Online { .. })
	}
}
