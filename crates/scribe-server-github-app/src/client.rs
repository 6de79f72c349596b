// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App client: construction and the single authenticated request path.
//!
//! Operations live next to the resources they touch: installation tokens in
//! [`crate::token`], file reads and commits in [`crate::contents`], branch
//! listing in [`crate::branches`].

use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::GithubAppConfig;
use crate::error::GithubAppError;
use crate::jwt::AppAssertionIssuer;
use crate::token::{InMemoryTokenStore, TokenStore};
use crate::types::{AppInfoResponse, InstallationId};
use crate::GITHUB_API_VERSION;

pub(crate) const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub(crate) const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";

/// One call against the REST API, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	body: Option<Value>,
}

impl ApiRequest {
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into().trim_start_matches('/').to_string(),
			query: Vec::new(),
			body: None,
		}
	}

	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	pub fn put(path: impl Into<String>, body: Value) -> Self {
		Self::new(Method::PUT, path).with_body(body)
	}

	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));
		self
	}

	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);
		self
	}

	pub fn method(&self) -> &Method {
		&self.method
	}

	pub fn path(&self) -> &str {
		&self.path
	}
}

/// Client for acting as the GitHub App on behalf of its installations.
///
/// Cheap to clone; clones share the installation token store.
#[derive(Clone)]
pub struct GithubAppClient {
	pub(crate) http_client: Client,
	pub(crate) config: GithubAppConfig,
	pub(crate) issuer: AppAssertionIssuer,
	pub(crate) tokens: Arc<dyn TokenStore>,
	pub(crate) clock: Arc<dyn Clock>,
}

impl GithubAppClient {
	/// Create a client with an in-memory token store and the system clock.
	///
	/// Succeeds without App credentials; operations then fail with
	/// [`GithubAppError::Config`] before touching the network.
	pub fn new(config: GithubAppConfig) -> Result<Self, GithubAppError> {
		let http_client = scribe_common_http::builder()
			.timeout(config.request_timeout())
			.build()
			.map_err(|e| GithubAppError::Config(format!("Failed to create HTTP client: {e}")))?;

		info!(
			app_id = ?config.app_id().ok(),
			base_url = %config.base_url(),
			configured = config.is_configured(),
			"Created GitHub App client"
		);

		Ok(Self {
			http_client,
			issuer: AppAssertionIssuer::new(config.clone()),
			config,
			tokens: Arc::new(InMemoryTokenStore::default()),
			clock: Arc::new(SystemClock),
		})
	}

	/// Replace the installation token store.
	pub fn with_token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
		self.tokens = tokens;
		self
	}

	/// Replace the time source used for assertions and token expiry.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn config(&self) -> &GithubAppConfig {
		&self.config
	}

	pub fn webhook_secret(&self) -> Option<&str> {
		self.config.webhook_secret()
	}

	pub fn installation_url(&self) -> String {
		self.config.installation_url()
	}

	pub fn app_slug(&self) -> &str {
		self.config.app_slug()
	}

	pub fn app_info(&self) -> AppInfoResponse {
		if self.config.is_configured() {
			AppInfoResponse {
				configured: true,
				app_slug: Some(self.app_slug().to_string()),
				installation_url: Some(self.installation_url()),
			}
		} else {
			AppInfoResponse {
				configured: false,
				app_slug: None,
				installation_url: None,
			}
		}
	}

	pub(crate) fn endpoint(&self, path: &str) -> Result<Url, GithubAppError> {
		self
			.config
			.base_url()
			.join(path.trim_start_matches('/'))
			.map_err(|e| GithubAppError::Config(format!("Invalid URL: {e}")))
	}

	/// Send an authenticated request on behalf of an installation.
	///
	/// Every installation-scoped call goes through here. Status handling:
	///
	/// - 404 becomes [`GithubAppError::NotFound`]
	/// - 409 and 422 become [`GithubAppError::Validation`]
	/// - 401 becomes [`GithubAppError::Auth`] and drops the cached token
	/// - any other non-2xx becomes [`GithubAppError::ApiError`]
	/// - 204 or an empty body yields `Ok(None)`
	#[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
	pub async fn request<T: DeserializeOwned>(
		&self,
		installation_id: InstallationId,
		request: ApiRequest,
	) -> Result<Option<T>, GithubAppError> {
		let token = self.installation_token(installation_id).await?;

		let mut url = self.endpoint(&request.path)?;
		if !request.query.is_empty() {
			let mut pairs = url.query_pairs_mut();
			for (key, value) in &request.query {
				pairs.append_pair(key, value);
			}
		}

		debug!(url = %url, "Sending GitHub API request");

		let mut builder = self
			.http_client
			.request(request.method.clone(), url)
			.bearer_auth(token.expose())
			.header(ACCEPT, GITHUB_ACCEPT)
			.header(API_VERSION_HEADER, GITHUB_API_VERSION);
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder.send().await.map_err(transport_error)?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			if status == StatusCode::UNAUTHORIZED {
				self.invalidate_installation_token(installation_id).await;
			}
			return Err(map_github_error(status, &request.path, &body));
		}

		if status == StatusCode::NO_CONTENT {
			return Ok(None);
		}

		let bytes = response.bytes().await.map_err(transport_error)?;
		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| {
			error!(error = %e, path = %request.path, "Failed to parse GitHub response");
			GithubAppError::InvalidResponse(format!("JSON parse error: {e}"))
		})
	}
}

pub(crate) fn transport_error(e: reqwest::Error) -> GithubAppError {
	if e.is_timeout() {
		error!("GitHub request timed out");
		GithubAppError::Timeout
	} else {
		error!(error = %e, "Network error talking to GitHub");
		GithubAppError::Network(e)
	}
}

/// The `message` field of a GitHub error body, falling back to the raw body
/// and then to the status reason.
pub(crate) fn github_message(status: StatusCode, body: &str) -> String {
	if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
		if let Some(Value::String(message)) = fields.get("message") {
			return message.clone();
		}
	}

	let body = body.trim();
	if body.is_empty() {
		status.canonical_reason().unwrap_or("Unknown error").to_string()
	} else {
		body.to_string()
	}
}

/// Map GitHub API error responses to GithubAppError.
pub(crate) fn map_github_error(status: StatusCode, path: &str, body: &str) -> GithubAppError {
	let status_code = status.as_u16();
	let message = github_message(status, body);

	match status_code {
		401 => {
			warn!(status = status_code, path, "Installation token rejected by GitHub");
			GithubAppError::Auth {
				status: status_code,
				message,
			}
		}
		404 => {
			debug!(path, "GitHub resource not found");
			GithubAppError::not_found(path, message)
		}
		409 | 422 => {
			warn!(status = status_code, path, message = %message, "GitHub rejected request");
			GithubAppError::Validation {
				status: status_code,
				path: path.to_string(),
				message,
			}
		}
		_ => {
			error!(status = status_code, path, message = %message, "GitHub API error");
			GithubAppError::api_error(status_code, path, message)
		}
	}
}

/// `repos/{owner}/{repo}` with both parts percent-encoded.
pub(crate) fn repo_path(owner: &str, repo: &str) -> String {
	format!(
		"repos/{}/{}",
		urlencoding::encode(owner),
		urlencoding::encode(repo)
	)
}

/// Percent-encode each segment of a repository path, keeping the slashes.
pub(crate) fn encode_path(path: &str) -> String {
	path
		.split('/')
		.filter(|segment| !segment.is_empty())
		.map(|segment| urlencoding::encode(segment).into_owned())
		.collect::<Vec<_>>()
		.join("/")
}
