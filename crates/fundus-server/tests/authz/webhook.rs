// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity webhook tests.
//!
//! Key invariant: unsigned or mis-signed deliveries change nothing.

use axum::http::StatusCode;
use fundus_common_webhook::{WebhookVerifier, HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use fundus_server_auth::{IdentityId, IdentityProvider, IdentityRecord, Role};
use serde_json::json;

use super::support::{body_json, TestApp, WEBHOOK_SECRET};

fn signed_headers(body: &[u8], secret: &str) -> Vec<(&'static str, String)> {
	let verifier = WebhookVerifier::from_secret(secret).unwrap();
	let ts = chrono::Utc::now().timestamp();
	let signature = verifier.sign("msg_1", ts, body);
	vec![
		(HEADER_ID, "msg_1".to_string()),
		(HEADER_TIMESTAMP, ts.to_string()),
		(HEADER_SIGNATURE, format!("v1,{signature}")),
	]
}

fn created_event(id: &str, role: Option<&str>) -> Vec<u8> {
	let metadata = match role {
		Some(r) => json!({ "role": r }),
		None => json!({}),
	};
	serde_json::to_vec(&json!({
		"type": "user.created",
		"data": { "id": id, "public_metadata": metadata }
	}))
	.unwrap()
}

async fn insert_new_user(app: &TestApp, id: &str) -> IdentityId {
	let id = IdentityId::parse(id).unwrap();
	app.identities.insert(IdentityRecord::new(id.clone())).await;
	id
}

#[tokio::test]
async fn created_user_gets_patient_role() {
	let app = TestApp::new().await;
	let id = insert_new_user(&app, "user_fresh").await;
	let body = created_event("user_fresh", None);

	let response = app
		.post_raw("/api/webhook/identity", &signed_headers(&body, WEBHOOK_SECRET), &body)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["roleAssigned"], true);
	assert_eq!(
		app.identities.get_identity(&id).await.unwrap().role,
		Some(Role::Patient)
	);
}

#[tokio::test]
async fn created_user_with_role_is_left_alone() {
	let app = TestApp::new().await;
	insert_new_user(&app, "user_seeded").await;
	let body = created_event("user_seeded", Some("doctor"));

	let response = app
		.post_raw("/api/webhook/identity", &signed_headers(&body, WEBHOOK_SECRET), &body)
		.await;
	assert_eq!(body_json(response).await["roleAssigned"], false);
	assert_eq!(app.identities.write_count(), 0);
}

#[tokio::test]
async fn bad_signatures_are_rejected() {
	let app = TestApp::new().await;
	insert_new_user(&app, "user_fresh").await;
	let body = created_event("user_fresh", None);

	let wrong_key = app
		.post_raw(
			"/api/webhook/identity",
			&signed_headers(&body, "whsec_d3Jvbmcta2V5"),
			&body,
		)
		.await;
	assert_eq!(wrong_key.status(), StatusCode::UNAUTHORIZED);

	let unsigned = app.post_raw("/api/webhook/identity", &[], &body).await;
	assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

	let mut tampered_headers = signed_headers(&body, WEBHOOK_SECRET);
	tampered_headers[1].1 = (chrono::Utc::now().timestamp() - 3600).to_string();
	let stale = app
		.post_raw("/api/webhook/identity", &tampered_headers, &body)
		.await;
	assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

	assert_eq!(app.identities.write_count(), 0);
}

#[tokio::test]
async fn extreme_timestamps_are_rejected() {
	let app = TestApp::new().await;
	insert_new_user(&app, "user_fresh").await;
	let body = created_event("user_fresh", None);

	for ts in [i64::MIN, i64::MAX] {
		let mut headers = signed_headers(&body, WEBHOOK_SECRET);
		headers[1].1 = ts.to_string();
		let response = app.post_raw("/api/webhook/identity", &headers, &body).await;
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{ts}");
	}
	assert_eq!(app.identities.write_count(), 0);
}

#[tokio::test]
async fn other_events_are_acknowledged() {
	let app = TestApp::new().await;
	let body = serde_json::to_vec(&json!({
		"type": "user.deleted",
		"data": { "id": "user_gone" }
	}))
	.unwrap();

	let response = app
		.post_raw("/api/webhook/identity", &signed_headers(&body, WEBHOOK_SECRET), &body)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["received"], true);
}
