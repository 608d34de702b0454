// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization tests for scan upload, reads and the classification proxy.
//!
//! Key invariant: the upload mutation re-checks the caller's role even
//! though the upload page already hides the form.

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use super::support::{assert_redirect_home, body_json, TestApp};

const IMAGE: &[u8] = b"fake-fundus-image";

async fn mount_prediction(app: &TestApp) {
	Mock::given(method("POST"))
		.and(path("/predict/"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"predicted_class": "glaucoma",
			"confidence": 0.87,
			"class_probabilities": {
				"cataract": 0.03,
				"diabetic_retinopathy": 0.06,
				"glaucoma": 0.87,
				"normal": 0.04
			}
		})))
		.mount(&app.inference)
		.await;
}

async fn upload_for(app: &TestApp, patient_id: &str) -> serde_json::Value {
	let response = app
		.post_multipart(
			"/api/scans",
			Some(&app.fixtures.doctor),
			Some(("eye.png", "image/png", IMAGE)),
			&[("patient_id", patient_id)],
		)
		.await;
	assert_eq!(response.status(), StatusCode::CREATED);
	body_json(response).await
}

#[tokio::test]
async fn doctor_upload_is_analyzed() {
	let app = TestApp::new().await;
	mount_prediction(&app).await;

	let scan = upload_for(&app, "user_patient").await;
	assert_eq!(scan["patientId"], "user_patient");
	assert_eq!(scan["uploadedBy"], "user_doctor");
	assert_eq!(scan["analysis"]["top_prediction"], "glaucoma");
	assert_eq!(scan["analysis"]["predictions"]["normal"], 0.04);
	assert!(scan["analysisError"].is_null());
}

#[tokio::test]
async fn patient_upload_is_rejected_server_side() {
	let app = TestApp::new().await;
	mount_prediction(&app).await;

	let response = app
		.post_multipart(
			"/api/scans",
			Some(&app.fixtures.patient),
			Some(("eye.png", "image/png", IMAGE)),
			&[("patient_id", "user_patient")],
		)
		.await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	assert_eq!(body_json(response).await["error"], "Not Authorized");
	assert!(app.state.scans.list_all().await.is_empty());
}

#[tokio::test]
async fn signed_out_upload_is_redirected() {
	let app = TestApp::new().await;
	let response = app
		.post_multipart(
			"/api/scans",
			None,
			Some(("eye.png", "image/png", IMAGE)),
			&[("patient_id", "user_patient")],
		)
		.await;
	assert_redirect_home(&response);
}

#[tokio::test]
async fn failed_analysis_is_stored_as_error_not_diagnosis() {
	let app = TestApp::new().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(500))
		.mount(&app.inference)
		.await;

	let scan = upload_for(&app, "user_patient").await;
	assert!(scan["analysis"].is_null());
	assert_eq!(scan["analysisError"], "AI analysis service is unavailable");
}

#[tokio::test]
async fn upload_validates_form() {
	let app = TestApp::new().await;
	let doctor = Some(&app.fixtures.doctor);

	let missing_file = app
		.post_multipart("/api/scans", doctor, None, &[("patient_id", "user_patient")])
		.await;
	assert_eq!(missing_file.status(), StatusCode::BAD_REQUEST);

	let not_image = app
		.post_multipart(
			"/api/scans",
			doctor,
			Some(("notes.pdf", "application/pdf", b"%PDF-1.7")),
			&[("patient_id", "user_patient")],
		)
		.await;
	assert_eq!(not_image.status(), StatusCode::BAD_REQUEST);

	let unknown_patient = app
		.post_multipart(
			"/api/scans",
			doctor,
			Some(("eye.png", "image/png", IMAGE)),
			&[("patient_id", "user_nobody")],
		)
		.await;
	assert_eq!(unknown_patient.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scan_reads_are_scoped_to_owner_or_staff() {
	let app = TestApp::new().await;
	mount_prediction(&app).await;
	let f = &app.fixtures;

	let scan = upload_for(&app, "user_patient").await;
	let scan_path = format!("/api/scans/{}", scan["id"].as_str().unwrap());

	for (user, expected) in [
		(&f.patient, StatusCode::OK),
		(&f.doctor, StatusCode::OK),
		(&f.admin, StatusCode::OK),
		(&f.other_patient, StatusCode::NOT_FOUND),
	] {
		assert_eq!(app.get(&scan_path, Some(user)).await.status(), expected);
	}

	let own = body_json(app.get("/api/scans", Some(&f.patient)).await).await;
	assert_eq!(own["scans"].as_array().unwrap().len(), 1);
	let other = body_json(app.get("/api/scans", Some(&f.other_patient)).await).await;
	assert!(other["scans"].as_array().unwrap().is_empty());
	let staff = body_json(app.get("/api/scans", Some(&f.doctor)).await).await;
	assert_eq!(staff["scans"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_scan_id_is_not_found() {
	let app = TestApp::new().await;
	let response = app.get("/api/scans/not-a-uuid", Some(&app.fixtures.admin)).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

mod ai {
	use super::*;

	#[tokio::test]
	async fn predict_reshapes_service_response() {
		let app = TestApp::new().await;
		mount_prediction(&app).await;

		let response = app
			.post_multipart(
				"/api/ai/predict",
				Some(&app.fixtures.patient),
				Some(("eye.png", "image/png", IMAGE)),
				&[],
			)
			.await;
		assert_eq!(response.status(), StatusCode::OK);
		let body = body_json(response).await;
		assert_eq!(body["top_prediction"], "glaucoma");
		assert_eq!(body["predictions"]["glaucoma"], 0.87);
	}

	#[tokio::test]
	async fn predict_fails_closed() {
		let app = TestApp::new().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_string("not json"))
			.mount(&app.inference)
			.await;

		let response = app
			.post_multipart(
				"/api/ai/predict",
				Some(&app.fixtures.doctor),
				Some(("eye.png", "image/png", IMAGE)),
				&[],
			)
			.await;
		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(
			body_json(response).await["error"],
			"AI analysis service is unavailable"
		);
	}

	#[tokio::test]
	async fn status_reports_online_and_error() {
		let app = TestApp::new().await;
		let unhealthy = body_json(app.get("/api/ai/status", Some(&app.fixtures.patient)).await).await;
		assert_eq!(unhealthy["status"], "error");

		Mock::given(method("GET"))
			.and(path("/"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ready" })))
			.mount(&app.inference)
			.await;
		let healthy = body_json(app.get("/api/ai/status", Some(&app.fixtures.patient)).await).await;
		assert_eq!(healthy["status"], "online");
		assert_eq!(healthy["message"], "ready");
	}

	#[tokio::test]
	async fn health_degrades_when_inference_is_down() {
		let app = TestApp::new().await;
		let body = body_json(app.get("/health", None).await).await;
		assert_eq!(body["status"], "degraded");
		assert_eq!(body["components"]["identity_provider"], "in_memory");
		assert_eq!(body["components"]["webhook_configured"], true);
	}
}
