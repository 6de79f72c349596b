// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration for the GitHub App client.

use std::env;
use std::time::Duration;

use reqwest::Url;
use scribe_common_config::{load_secret_env, parse_env, Secret, SecretString};
use tracing::warn;

use crate::error::GithubAppError;
use crate::jwt::decode_private_key;

const DEFAULT_BASE_URL: &str = "https://api.github.com/";
const DEFAULT_APP_SLUG: &str = "scribe";
const DEFAULT_GUARDED_DIRECTORIES: &[&str] = &["posts", "_posts"];

/// Configuration for the GitHub App client.
///
/// The App id and private key are optional here: a client built without them
/// still constructs, and the first operation that needs an App assertion fails
/// with [`GithubAppError::Config`] before any request is sent. Values that are
/// present but malformed are rejected up front.
#[derive(Clone)]
pub struct GithubAppConfig {
	/// GitHub App numeric ID
	app_id: Option<u64>,

	/// Base64-encoded PEM private key, decoded each time an assertion is signed
	private_key: Option<SecretString>,

	/// Secret for webhook signature verification
	webhook_secret: Option<SecretString>,

	/// App slug for installation URL generation
	app_slug: String,

	/// Base URL for the GitHub API, always with a trailing slash
	base_url: Url,

	/// Top-level directories that must already exist before a first commit
	guarded_directories: Vec<String>,

	/// Upper bound for each outbound request
	request_timeout: Duration,
}

impl std::fmt::Debug for GithubAppConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GithubAppConfig")
			.field("app_id", &self.app_id)
			.field("private_key", &self.private_key)
			.field("webhook_secret", &self.webhook_secret)
			.field("app_slug", &self.app_slug)
			.field("base_url", &self.base_url.as_str())
			.field("guarded_directories", &self.guarded_directories)
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}

impl Default for GithubAppConfig {
	fn default() -> Self {
		Self::unconfigured()
	}
}

impl GithubAppConfig {
	/// Validate a base URL: HTTPS, has a host, not loopback.
	fn validate_and_normalize_base_url(raw: &str) -> Result<Url, GithubAppError> {
		let url = Url::parse(raw)
			.map_err(|e| GithubAppError::Config(format!("Invalid GitHub base URL '{raw}': {e}")))?;

		if url.scheme() != "https" {
			return Err(GithubAppError::Config(format!(
				"GitHub base URL must use https, got '{}'",
				url.scheme()
			)));
		}

		let host = url
			.host_str()
			.ok_or_else(|| GithubAppError::Config("GitHub base URL must include a host".to_string()))?;

		if host == "localhost" || host == "127.0.0.1" || host == "[::1]" {
			return Err(GithubAppError::Config(
				"GitHub base URL must not be localhost".to_string(),
			));
		}

		Ok(with_trailing_slash(url))
	}

	/// Configuration with credentials, pointing at api.github.com.
	///
	/// `private_key` is the base64-encoded PEM block as it would appear in the
	/// environment. A raw PEM block is accepted too.
	pub fn new(app_id: u64, private_key: impl Into<String>) -> Self {
		Self {
			app_id: Some(app_id),
			private_key: Some(Secret::new(private_key.into())),
			..Self::unconfigured()
		}
	}

	/// Configuration without App credentials.
	pub fn unconfigured() -> Self {
		Self {
			app_id: None,
			private_key: None,
			webhook_secret: None,
			app_slug: DEFAULT_APP_SLUG.to_string(),
			base_url: Url::parse(DEFAULT_BASE_URL).expect("default URL is valid"),
			guarded_directories: DEFAULT_GUARDED_DIRECTORIES
				.iter()
				.map(|d| d.to_string())
				.collect(),
			request_timeout: scribe_common_http::DEFAULT_TIMEOUT,
		}
	}

	/// Create configuration from environment variables.
	///
	/// - `SCRIBE_GITHUB_APP_ID`: GitHub App numeric ID
	/// - `SCRIBE_GITHUB_APP_PRIVATE_KEY`: base64-encoded PEM private key (or
	///   `_FILE` suffix for a file path)
	/// - `SCRIBE_GITHUB_APP_WEBHOOK_SECRET`: webhook secret (or `_FILE`)
	/// - `SCRIBE_GITHUB_APP_SLUG`: App slug (defaults to "scribe")
	/// - `SCRIBE_GITHUB_APP_BASE_URL`: API base URL (HTTPS only)
	///
	/// Unset credentials are not an error here; see [`GithubAppConfig::validate`].
	pub fn from_env() -> Result<Self, GithubAppError> {
		let app_id = parse_env::<u64>("SCRIBE_GITHUB_APP_ID")
			.map_err(|e| GithubAppError::Config(e.to_string()))?;

		let private_key = load_secret_env("SCRIBE_GITHUB_APP_PRIVATE_KEY")
			.map_err(|e| GithubAppError::Config(e.to_string()))?
			.filter(|key| !key.is_blank());

		let webhook_secret = load_secret_env("SCRIBE_GITHUB_APP_WEBHOOK_SECRET")
			.map_err(|e| GithubAppError::Config(e.to_string()))?
			.filter(|secret| !secret.is_blank());

		let mut config = Self {
			app_id,
			private_key,
			webhook_secret,
			..Self::unconfigured()
		};

		if let Ok(slug) = env::var("SCRIBE_GITHUB_APP_SLUG") {
			config.app_slug = slug;
		}

		if let Ok(raw) = env::var("SCRIBE_GITHUB_APP_BASE_URL") {
			config.base_url = Self::validate_and_normalize_base_url(&raw)?;
		}

		Ok(config)
	}

	/// Check that the App can authenticate: id set, key set and decodable.
	pub fn validate(&self) -> Result<(), GithubAppError> {
		self.app_id()?;
		decode_private_key(self.private_key()?.expose())?;
		Ok(())
	}

	/// True when both App id and private key are present.
	pub fn is_configured(&self) -> bool {
		self.app_id.is_some() && self.private_key.is_some()
	}

	/// Set a custom base URL (for GitHub Enterprise).
	///
	/// The URL must be HTTPS and have a valid host.
	/// If validation fails, logs a warning and keeps the previous value.
	pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
		let url_str = url.into();
		match Self::validate_and_normalize_base_url(&url_str) {
			Ok(validated) => self.base_url = validated,
			Err(e) => {
				warn!(error = %e, url = %url_str, "Invalid base_url in with_base_url, keeping previous value");
			}
		}
		self
	}

	/// Point at any URL, including plain-HTTP loopback mock servers.
	#[cfg(any(test, feature = "test-utils"))]
	pub fn with_unchecked_base_url(mut self, url: &str) -> Self {
		self.base_url = with_trailing_slash(Url::parse(url).expect("test base URL must parse"));
		self
	}

	pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
		self.webhook_secret = Some(Secret::new(secret.into()));
		self
	}

	pub fn with_app_slug(mut self, slug: impl Into<String>) -> Self {
		self.app_slug = slug.into();
		self
	}

	/// Replace the set of directories probed before committing beneath them.
	pub fn with_guarded_directories<I, S>(mut self, directories: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.guarded_directories = directories
			.into_iter()
			.map(|d| d.into().trim_matches('/').to_string())
			.filter(|d| !d.is_empty())
			.collect();
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// The GitHub App ID, or a configuration error when unset.
	pub fn app_id(&self) -> Result<u64, GithubAppError> {
		self.app_id.ok_or_else(|| {
			GithubAppError::Config("GitHub App ID is not configured (SCRIBE_GITHUB_APP_ID)".to_string())
		})
	}

	/// The configured private key, still encoded.
	pub(crate) fn private_key(&self) -> Result<&SecretString, GithubAppError> {
		self.private_key.as_ref().ok_or_else(|| {
			GithubAppError::Config(
				"GitHub App private key is not configured (SCRIBE_GITHUB_APP_PRIVATE_KEY)".to_string(),
			)
		})
	}

	pub fn webhook_secret(&self) -> Option<&str> {
		self.webhook_secret.as_ref().map(|s| s.expose().as_str())
	}

	pub fn app_slug(&self) -> &str {
		&self.app_slug
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn guarded_directories(&self) -> &[String] {
		&self.guarded_directories
	}

	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	/// The guarded directory `path` lives under, if any.
	pub fn guarded_directory_for(&self, path: &str) -> Option<&str> {
		let path = path.trim_start_matches('/');
		self
			.guarded_directories
			.iter()
			.find(|dir| {
				path
					.strip_prefix(dir.as_str())
					.is_some_and(|rest| rest.starts_with('/'))
			})
			.map(String::as_str)
	}

	/// Where users go to install the App.
	pub fn installation_url(&self) -> String {
		if self.base_url.as_str() == DEFAULT_BASE_URL {
			format!(
				"https://github.com/apps/{}/installations/new",
				self.app_slug
			)
		} else {
			let base = self
				.base_url
				.as_str()
				.trim_end_matches('/')
				.trim_end_matches("/api/v3");
			format!("{}/apps/{}/installations/new", base, self.app_slug)
		}
	}
}

fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());
		url.set_path(&path);
	}
	url
}
