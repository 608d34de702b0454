// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route guard behaviour on pages.
//!
//! Key invariant: a denied route is a redirect to `/`, never an error page.

use axum::http::{header, Method, StatusCode};
use fundus_server::routes::pages::PERMISSION_DENIED;

use super::support::{
	assert_redirect_home, body_text, mint_token, run_authz_cases, AuthzCase, TestApp,
};

#[tokio::test]
async fn public_pages_are_open_to_everyone() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	let mut cases = Vec::new();
	for path in ["/", "/sign-in", "/sign-up", "/health"] {
		for user in [None, Some(f.patient.clone()), Some(f.admin.clone())] {
			cases.push(AuthzCase {
				name: "public_page",
				method: Method::GET,
				path: path.to_string(),
				user,
				body: None,
				expected_status: StatusCode::OK,
			});
		}
	}
	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn unauthenticated_management_redirects_home() {
	let app = TestApp::new().await;
	let response = app.get("/management", None).await;
	assert_redirect_home(&response);
}

#[tokio::test]
async fn admin_pages_redirect_non_admins() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	for path in ["/admin", "/management/users", "/admin/settings"] {
		for user in [None, Some(&f.patient), Some(&f.doctor), Some(&f.unassigned)] {
			let response = app.get(path, user).await;
			assert_redirect_home(&response);
		}
	}
}

#[tokio::test]
async fn admin_pages_open_for_admin() {
	let app = TestApp::new().await;

	let cases = vec![
		AuthzCase {
			name: "admin_page",
			method: Method::GET,
			path: "/admin".to_string(),
			user: Some(app.fixtures.admin.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "user_management_page",
			method: Method::GET,
			path: "/management/users".to_string(),
			user: Some(app.fixtures.admin.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
	];
	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn management_root_is_any_authenticated_role() {
	let app = TestApp::new().await;
	let response = app.get("/management", Some(&app.fixtures.patient)).await;
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn prefix_match_respects_segment_boundaries() {
	let app = TestApp::new().await;
	// Not under /admin, so it falls through to the authenticated default and
	// then to the not-found page.
	let response = app.get("/administrator", Some(&app.fixtures.patient)).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_page_shows_fallback_to_patients() {
	let app = TestApp::new().await;

	let patient_page = body_text(app.get("/scans/upload", Some(&app.fixtures.patient)).await).await;
	assert!(patient_page.contains(PERMISSION_DENIED));
	assert!(!patient_page.contains("<form"));

	let doctor_page = body_text(app.get("/scans/upload", Some(&app.fixtures.doctor)).await).await;
	assert!(doctor_page.contains("<form"));
	assert!(!doctor_page.contains(PERMISSION_DENIED));
}

#[tokio::test]
async fn dashboard_redirects_to_role_dashboard() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	for (user, expected) in [
		(&f.admin, "/dashboard/admin"),
		(&f.doctor, "/dashboard/doctor"),
		(&f.patient, "/dashboard/patient"),
		(&f.unassigned, "/dashboard/patient"),
	] {
		let response = app.get("/dashboard", Some(user)).await;
		assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
		assert_eq!(response.headers().get(header::LOCATION).unwrap(), expected);
	}
}

#[tokio::test]
async fn foreign_role_dashboard_redirects_to_own() {
	let app = TestApp::new().await;
	let response = app.get("/dashboard/admin", Some(&app.fixtures.patient)).await;
	assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(
		response.headers().get(header::LOCATION).unwrap(),
		"/dashboard/patient"
	);
}

#[tokio::test]
async fn invalid_sessions_are_treated_as_signed_out() {
	let app = TestApp::new().await;

	let expired = mint_token("user_admin", Some("admin"), -3600);
	assert_redirect_home(&app.get_with_bearer("/admin", &expired).await);

	assert_redirect_home(&app.get_with_bearer("/admin", "not.a.jwt").await);

	let valid = mint_token("user_admin", Some("admin"), 3600);
	assert_eq!(
		app.get_with_bearer("/admin", &valid).await.status(),
		StatusCode::OK
	);
}

#[tokio::test]
async fn unknown_role_claim_is_least_privilege() {
	let app = TestApp::new().await;
	let token = mint_token("user_patient", Some("superuser"), 3600);
	assert_redirect_home(&app.get_with_bearer("/admin", &token).await);
	assert_eq!(
		app.get_with_bearer("/scans", &token).await.status(),
		StatusCode::OK
	);
}

#[tokio::test]
async fn static_assets_bypass_the_guard() {
	let app = TestApp::new().await;
	// Served by the asset layer in production; here nothing matches.
	let response = app.get("/favicon.ico", None).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
