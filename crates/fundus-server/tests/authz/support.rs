// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use axum::{
	body::Body,
	http::{header, Method, Request, StatusCode},
	response::Response,
	Router,
};
use fundus_server::{create_app_state_with_provider, create_router, AppState, IdentityBackend};
use fundus_server_auth::{
	IdentityId, IdentityRecord, MemoryIdentityProvider, Role, SessionClaims, SessionMetadata,
};
use fundus_server_config::{
	AuthConfigLayer, InferenceConfigLayer, ServerConfigLayer, WebhookConfigLayer,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use tower::ServiceExt;
use wiremock::MockServer;

pub const SESSION_SECRET: &str = "test-session-secret";
/// base64("fundus-webhook-test-key")
pub const WEBHOOK_SECRET: &str = "whsec_ZnVuZHVzLXdlYmhvb2stdGVzdC1rZXk=";
pub const MULTIPART_BOUNDARY: &str = "fundus-test-boundary";

#[derive(Clone)]
pub struct TestUser {
	pub id: IdentityId,
	pub role: Option<Role>,
	pub session_token: String,
}

impl TestUser {
	pub fn cookie(&self) -> String {
		format!("__session={}", self.session_token)
	}
}

#[derive(Clone)]
pub struct Fixtures {
	pub admin: TestUser,
	pub doctor: TestUser,
	pub patient: TestUser,
	pub other_patient: TestUser,
	/// Signed in with no role claim at all.
	pub unassigned: TestUser,
}

pub struct TestApp {
	pub router: Router,
	pub fixtures: Fixtures,
	pub state: AppState,
	pub identities: Arc<MemoryIdentityProvider>,
	pub inference: MockServer,
}

pub fn mint_token(id: &str, role: Option<&str>, exp_offset_secs: i64) -> String {
	let claims = SessionClaims {
		sub: id.to_string(),
		exp: chrono::Utc::now().timestamp() + exp_offset_secs,
		iss: None,
		metadata: SessionMetadata {
			role: role.map(str::to_string),
		},
	};
	encode(
		&Header::default(),
		&claims,
		&EncodingKey::from_secret(SESSION_SECRET.as_bytes()),
	)
	.unwrap()
}

impl TestApp {
	pub async fn new() -> Self {
		let inference = MockServer::start().await;

		let layer = ServerConfigLayer {
			auth: Some(AuthConfigLayer {
				session_secret: Some(SESSION_SECRET.into()),
				..Default::default()
			}),
			inference: Some(InferenceConfigLayer {
				base_url: Some(inference.uri()),
				request_timeout_secs: Some(2),
				status_timeout_secs: Some(1),
			}),
			webhook: Some(WebhookConfigLayer {
				signing_secret: Some(WEBHOOK_SECRET.into()),
			}),
			..Default::default()
		};
		let config = fundus_server_config::finalize(layer).unwrap();

		let identities = Arc::new(MemoryIdentityProvider::new());
		let fixtures = create_fixtures(&identities).await;
		let state =
			create_app_state_with_provider(&config, identities.clone(), IdentityBackend::InMemory)
				.unwrap();
		let router = create_router(state.clone());

		Self {
			router,
			fixtures,
			state,
			identities,
			inference,
		}
	}

	pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response<Body> {
		self.request(Method::GET, path, user, Option::<()>::None).await
	}

	pub async fn post(
		&self,
		path: &str,
		user: Option<&TestUser>,
		body: impl Serialize,
	) -> Response<Body> {
		self.request(Method::POST, path, user, Some(body)).await
	}

	/// GET authenticated with `Authorization: Bearer` instead of the cookie.
	pub async fn get_with_bearer(&self, path: &str, token: &str) -> Response<Body> {
		let request = Request::builder()
			.uri(path)
			.header(header::AUTHORIZATION, format!("Bearer {token}"))
			.body(Body::empty())
			.unwrap();
		self.router.clone().oneshot(request).await.unwrap()
	}

	/// POST a multipart form with an optional image and text fields.
	pub async fn post_multipart(
		&self,
		path: &str,
		user: Option<&TestUser>,
		file: Option<(&str, &str, &[u8])>,
		fields: &[(&str, &str)],
	) -> Response<Body> {
		let mut body = Vec::new();
		for (name, value) in fields {
			body.extend_from_slice(
				format!(
					"--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
				)
				.as_bytes(),
			);
		}
		if let Some((file_name, content_type, data)) = file {
			body.extend_from_slice(
				format!(
					"--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
				)
				.as_bytes(),
			);
			body.extend_from_slice(data);
			body.extend_from_slice(b"\r\n");
		}
		body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(path)
			.header(
				header::CONTENT_TYPE,
				format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
			);
		if let Some(user) = user {
			builder = builder.header(header::COOKIE, user.cookie());
		}
		let request = builder.body(Body::from(body)).unwrap();
		self.router.clone().oneshot(request).await.unwrap()
	}

	/// POST a raw body with extra headers (webhook deliveries).
	pub async fn post_raw(&self, path: &str, headers: &[(&str, String)], body: &[u8]) -> Response<Body> {
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(path)
			.header(header::CONTENT_TYPE, "application/json");
		for (name, value) in headers {
			builder = builder.header(*name, value.as_str());
		}
		let request = builder.body(Body::from(body.to_vec())).unwrap();
		self.router.clone().oneshot(request).await.unwrap()
	}

	async fn request<T: Serialize>(
		&self,
		method: Method,
		path: &str,
		user: Option<&TestUser>,
		body: Option<T>,
	) -> Response<Body> {
		let mut builder = Request::builder().method(method).uri(path);

		if let Some(test_user) = user {
			builder = builder.header(header::COOKIE, test_user.cookie());
		}

		let request_body = match body {
			Some(b) => {
				builder = builder.header(header::CONTENT_TYPE, "application/json");
				Body::from(serde_json::to_string(&b).unwrap())
			}
			None => Body::empty(),
		};

		let request = builder.body(request_body).unwrap();
		self.router.clone().oneshot(request).await.unwrap()
	}
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	String::from_utf8_lossy(&bytes).into_owned()
}

pub fn assert_redirect_home(response: &Response<Body>) {
	assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(
		response.headers().get(header::LOCATION).unwrap(),
		"/",
		"denied routes redirect to the landing page"
	);
}

pub struct AuthzCase {
	pub name: &'static str,
	pub method: Method,
	pub path: String,
	pub user: Option<TestUser>,
	pub body: Option<serde_json::Value>,
	pub expected_status: StatusCode,
}

pub async fn run_authz_cases(app: &TestApp, cases: &[AuthzCase]) {
	for case in cases {
		let response = match (&case.method, &case.body) {
			(m, Some(body)) if *m == Method::POST => {
				app.post(&case.path, case.user.as_ref(), body.clone()).await
			}
			_ => app.get(&case.path, case.user.as_ref()).await,
		};

		if response.status() != case.expected_status {
			let (parts, body) = response.into_parts();
			let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
			let body_str = String::from_utf8_lossy(&body_bytes);
			panic!(
				"Case '{}': {} {} - expected {}, got {}\nResponse body: {}",
				case.name, case.method, case.path, case.expected_status, parts.status, body_str
			);
		}
	}
}

async fn create_user(
	identities: &MemoryIdentityProvider,
	id: &str,
	email: &str,
	role: Option<Role>,
) -> TestUser {
	let identity_id = IdentityId::parse(id).unwrap();
	let mut record = IdentityRecord::new(identity_id.clone()).with_email(email);
	record.role = role;
	identities.insert(record).await;

	TestUser {
		id: identity_id,
		role,
		session_token: mint_token(id, role.map(Role::as_str), 3600),
	}
}

async fn create_fixtures(identities: &MemoryIdentityProvider) -> Fixtures {
	Fixtures {
		admin: create_user(identities, "user_admin", "admin@clinic.test", Some(Role::Admin)).await,
		doctor: create_user(identities, "user_doctor", "doctor@clinic.test", Some(Role::Doctor))
			.await,
		patient: create_user(identities, "user_patient", "pat@home.test", Some(Role::Patient))
			.await,
		other_patient: create_user(
			identities,
			"user_other_patient",
			"other@home.test",
			Some(Role::Patient),
		)
		.await,
		unassigned: create_user(identities, "user_unassigned", "new@home.test", None).await,
	}
}
