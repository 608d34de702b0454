// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization tests for scan requests.

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::support::{body_json, run_authz_cases, AuthzCase, TestApp};

#[tokio::test]
async fn patient_files_and_lists_own_requests() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	let response = app
		.post(
			"/api/scan-requests",
			Some(&f.patient),
			json!({ "description": "Blurred vision in left eye", "priority": "high" }),
		)
		.await;
	assert_eq!(response.status(), StatusCode::CREATED);
	let created = body_json(response).await;
	assert_eq!(created["patientId"], "user_patient");
	assert_eq!(created["status"], "pending");
	assert_eq!(created["priority"], "high");

	let own = body_json(app.get("/api/scan-requests", Some(&f.patient)).await).await;
	assert_eq!(own["requests"].as_array().unwrap().len(), 1);
	let other = body_json(app.get("/api/scan-requests", Some(&f.other_patient)).await).await;
	assert!(other["requests"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn pending_queue_is_for_reviewers() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	app.post(
		"/api/scan-requests",
		Some(&f.patient),
		json!({ "description": "Routine check" }),
	)
	.await;

	let cases = vec![
		AuthzCase {
			name: "doctor_reviews",
			method: Method::GET,
			path: "/api/scan-requests/pending".to_string(),
			user: Some(f.doctor.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "admin_reviews",
			method: Method::GET,
			path: "/api/scan-requests/pending".to_string(),
			user: Some(f.admin.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "patient_cannot_review",
			method: Method::GET,
			path: "/api/scan-requests/pending".to_string(),
			user: Some(f.patient.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "unassigned_cannot_review",
			method: Method::GET,
			path: "/api/scan-requests/pending".to_string(),
			user: Some(f.unassigned.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
	];
	run_authz_cases(&app, &cases).await;

	let pending = body_json(app.get("/api/scan-requests/pending", Some(&f.doctor)).await).await;
	assert_eq!(pending["requests"][0]["priority"], "medium");
}

#[tokio::test]
async fn scan_request_validation() {
	let app = TestApp::new().await;
	let patient = Some(app.fixtures.patient.clone());

	let cases = vec![
		AuthzCase {
			name: "missing_description",
			method: Method::POST,
			path: "/api/scan-requests".to_string(),
			user: patient.clone(),
			body: Some(json!({ "symptoms": "pain" })),
			expected_status: StatusCode::BAD_REQUEST,
		},
		AuthzCase {
			name: "invalid_priority",
			method: Method::POST,
			path: "/api/scan-requests".to_string(),
			user: patient,
			body: Some(json!({ "description": "pain", "priority": "asap" })),
			expected_status: StatusCode::BAD_REQUEST,
		},
	];
	run_authz_cases(&app, &cases).await;
}

async fn file_request(app: &TestApp) -> String {
	let response = app
		.post(
			"/api/scan-requests",
			Some(&app.fixtures.patient),
			json!({ "description": "Floaters in right eye", "priority": "urgent" }),
		)
		.await;
	body_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn request_reads_are_scoped_to_owner_or_reviewer() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let path = format!("/api/scan-requests/{}", file_request(&app).await);

	let cases = vec![
		AuthzCase {
			name: "owner_reads",
			method: Method::GET,
			path: path.clone(),
			user: Some(f.patient.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "doctor_reads",
			method: Method::GET,
			path: path.clone(),
			user: Some(f.doctor.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "admin_reads",
			method: Method::GET,
			path: path.clone(),
			user: Some(f.admin.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "other_patient_sees_nothing",
			method: Method::GET,
			path: path.clone(),
			user: Some(f.other_patient.clone()),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
		},
		AuthzCase {
			name: "malformed_id",
			method: Method::GET,
			path: "/api/scan-requests/not-a-uuid".to_string(),
			user: Some(f.doctor.clone()),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
		},
	];
	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn doctor_assigns_and_reviews() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let id = file_request(&app).await;

	let assigned = app
		.post(&format!("/api/scan-requests/{id}/assign"), Some(&f.doctor), json!({}))
		.await;
	assert_eq!(assigned.status(), StatusCode::OK);
	let assigned = body_json(assigned).await;
	assert_eq!(assigned["status"], "assigned");
	assert_eq!(assigned["assignedDoctorId"], "user_doctor");

	let pending = body_json(app.get("/api/scan-requests/pending", Some(&f.doctor)).await).await;
	assert!(pending["requests"].as_array().unwrap().is_empty());

	let reviewed = app
		.post(
			&format!("/api/scan-requests/{id}/review"),
			Some(&f.doctor),
			json!({ "doctorNote": "Posterior vitreous detachment, no tear" }),
		)
		.await;
	assert_eq!(reviewed.status(), StatusCode::OK);

	let seen_by_patient = body_json(
		app.get(&format!("/api/scan-requests/{id}"), Some(&f.patient))
			.await,
	)
	.await;
	assert_eq!(seen_by_patient["status"], "reviewed");
	assert_eq!(
		seen_by_patient["doctorNote"],
		"Posterior vitreous detachment, no tear"
	);

	let completed = app
		.post(
			&format!("/api/scan-requests/{id}/review"),
			Some(&f.admin),
			json!({ "status": "completed" }),
		)
		.await;
	assert_eq!(body_json(completed).await["status"], "completed");

	let reopened = app
		.post(&format!("/api/scan-requests/{id}/assign"), Some(&f.doctor), json!({}))
		.await;
	assert_eq!(reopened.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn patients_cannot_advance_requests() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let id = file_request(&app).await;

	for user in [&f.patient, &f.other_patient, &f.unassigned] {
		let assign = app
			.post(&format!("/api/scan-requests/{id}/assign"), Some(user), json!({}))
			.await;
		assert_eq!(assign.status(), StatusCode::FORBIDDEN);
		let review = app
			.post(
				&format!("/api/scan-requests/{id}/review"),
				Some(user),
				json!({ "status": "completed" }),
			)
			.await;
		assert_eq!(review.status(), StatusCode::FORBIDDEN);
	}

	let unchanged = body_json(
		app.get(&format!("/api/scan-requests/{id}"), Some(&f.patient))
			.await,
	)
	.await;
	assert_eq!(unchanged["status"], "pending");
	assert!(unchanged["doctorNote"].is_null());
}

#[tokio::test]
async fn review_validation() {
	let app = TestApp::new().await;
	let doctor = &app.fixtures.doctor;
	let id = file_request(&app).await;

	let bad_status = app
		.post(
			&format!("/api/scan-requests/{id}/review"),
			Some(doctor),
			json!({ "status": "archived" }),
		)
		.await;
	assert_eq!(bad_status.status(), StatusCode::BAD_REQUEST);

	let missing = app
		.post(
			"/api/scan-requests/00000000-0000-0000-0000-000000000000/review",
			Some(doctor),
			json!({ "doctorNote": "x" }),
		)
		.await;
	assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
