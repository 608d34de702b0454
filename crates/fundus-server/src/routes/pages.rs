// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Minimal server-rendered pages.
//!
//! Access to each page is decided by the route guard before these run.
//! Content inside a page that needs a narrower role set goes through
//! [`RoleRestricted`].

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{Html, IntoResponse, Redirect, Response},
};
use fundus_server_auth::{actions, Role, RoleRestricted};

use crate::{
	api::AppState,
	auth_middleware::{Auth, RequireAuth},
};

/// Shown by guarded content to roles outside the allowed set.
pub const PERMISSION_DENIED: &str = "You do not have permission to view this content.";

fn layout(title: &str, body: &str) -> Html<String> {
	Html(format!(
		"<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
		 <title>{title} · OphthalmoScan</title></head>\
		 <body><main><h1>{title}</h1>{body}</main></body></html>"
	))
}

pub async fn home(Auth(auth): Auth) -> Html<String> {
	let body = match auth.user() {
		Some(user) => format!(
			"<p>Signed in as {}.</p><p><a href=\"{}\">Go to dashboard</a></p>",
			user.role,
			user.role.dashboard_path()
		),
		None => "<p>AI-assisted screening of fundus images.</p>\
		         <p><a href=\"/sign-in\">Sign in</a> · <a href=\"/sign-up\">Sign up</a></p>"
			.to_string(),
	};
	layout("OphthalmoScan", &body)
}

pub async fn sign_in() -> Html<String> {
	layout("Sign in", "<div id=\"sign-in\"></div>")
}

pub async fn sign_up() -> Html<String> {
	layout("Sign up", "<div id=\"sign-up\"></div>")
}

/// Sends the caller to the dashboard for their role.
pub async fn dashboard(RequireAuth(user): RequireAuth) -> Redirect {
	Redirect::temporary(user.role.dashboard_path())
}

pub async fn role_dashboard(
	RequireAuth(user): RequireAuth,
	Path(requested): Path<String>,
) -> Response {
	match requested.parse::<Role>() {
		Ok(role) if role == user.role => {
			let links = match role {
				Role::Admin => "<a href=\"/management/users\">Manage users</a> · <a href=\"/scans\">Scans</a>",
				Role::Doctor => "<a href=\"/scans/upload\">Upload scan</a> · <a href=\"/scans\">Scans</a>",
				Role::Patient => "<a href=\"/scans\">My scans</a>",
			};
			layout(&format!("{} dashboard", capitalize(role.as_str())), links).into_response()
		}
		_ => Redirect::temporary(user.role.dashboard_path()).into_response(),
	}
}

pub async fn admin() -> Html<String> {
	layout("Administration", "<p><a href=\"/management/users\">Manage users</a></p>")
}

pub async fn management() -> Html<String> {
	layout("Management", "<p>Clinic management.</p>")
}

pub async fn management_users() -> Html<String> {
	layout("User management", "<div id=\"user-table\" data-source=\"/api/admin/users\"></div>")
}

pub async fn scans(RequireAuth(user): RequireAuth) -> Html<String> {
	let heading = if user.role.is_clinical_staff() {
		"All scans"
	} else {
		"My scans"
	};
	layout(heading, "<div id=\"scan-list\" data-source=\"/api/scans\"></div>")
}

pub async fn scan_upload(State(state): State<AppState>, Auth(auth): Auth) -> Html<String> {
	let guard = RoleRestricted::for_action(&state.policy, actions::SCANS_UPLOAD);
	let body = guard.render(
		auth.role(),
		|| {
			"<form method=\"post\" action=\"/api/scans\" enctype=\"multipart/form-data\">\
			 <input name=\"patient_id\" required>\
			 <input type=\"file\" name=\"file\" accept=\"image/*\" required>\
			 <button type=\"submit\">Upload</button></form>"
				.to_string()
		},
		|| format!("<p class=\"denied\">{PERMISSION_DENIED}</p>"),
	);
	layout("Upload scan", &body)
}

pub async fn not_found() -> (StatusCode, Html<String>) {
	(StatusCode::NOT_FOUND, layout("Not found", "<p>Page not found.</p>"))
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
