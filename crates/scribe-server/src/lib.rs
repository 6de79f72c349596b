// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Scribe HTTP server: GitHub App install callback and webhooks, repository
//! settings, branch listing and publishing.
//!
//! Session handling is done upstream; the signed-in user arrives in the
//! `X-Scribe-User` header.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod user;

use axum::{
	http::{header, HeaderName, HeaderValue, Method, Uri},
	routing::{get, post},
	Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use config::{LogFormat, ServerConfig};
pub use error::{ErrorResponse, ServerError};
pub use state::{create_app_state, AppState};
pub use user::CurrentUser;

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health))
		.route("/api/github/app", get(routes::github::get_github_app_info))
		.route("/api/github/webhook", post(routes::github::github_webhook))
		.route(
			"/api/github/callback",
			get(routes::github::github_install_callback),
		)
		.route(
			"/api/github/branches",
			get(routes::github::list_github_branches),
		)
		.route(
			"/api/settings/github",
			get(routes::github::get_github_settings).put(routes::github::put_github_settings),
		)
		.route("/api/publish", post(routes::publish::publish_post))
		.with_state(state)
}

/// CORS for the dashboard origin taken from `public_url`.
///
/// Browsers may only send `X-Scribe-User` from that origin. Without a usable
/// `public_url` no cross-origin request is allowed.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
	let Some(origin) = config.public_url.as_deref().and_then(dashboard_origin) else {
		tracing::warn!("SCRIBE_PUBLIC_URL not set or invalid, cross-origin requests are disabled");
		return CorsLayer::new();
	};

	CorsLayer::new()
		.allow_origin(AllowOrigin::exact(origin))
		.allow_methods([Method::GET, Method::POST, Method::PUT])
		.allow_headers([
			header::CONTENT_TYPE,
			HeaderName::from_static(user::USER_HEADER),
		])
}

fn dashboard_origin(public_url: &str) -> Option<HeaderValue> {
	let uri: Uri = public_url.parse().ok()?;
	let origin = format!("{}://{}", uri.scheme_str()?, uri.authority()?);
	HeaderValue::from_str(&origin).ok()
}
