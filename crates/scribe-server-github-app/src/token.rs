// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Installation access tokens: exchange and caching.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::ACCEPT;
use scribe_common_config::{Secret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, trace, warn};

use crate::client::{
	github_message, map_github_error, transport_error, GithubAppClient, API_VERSION_HEADER,
	GITHUB_ACCEPT,
};
use crate::error::GithubAppError;
use crate::types::{AccessTokenResponse, InstallationId};
use crate::GITHUB_API_VERSION;

/// GitHub grants one hour; cached tokens are retired a minute early.
const TOKEN_LIFETIME_MINS: i64 = 59;
/// Margin kept below the expiry GitHub reports, if it reports one.
const REPORTED_EXPIRY_MARGIN_SECS: i64 = 60;

/// An installation access token and the instant it stops being reused.
#[derive(Debug, Clone)]
pub struct CachedToken {
	token: SecretString,
	expires_at: DateTime<Utc>,
}

impl CachedToken {
	pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
		Self {
			token: Secret::new(token.into()),
			expires_at,
		}
	}

	pub fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}

	pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at > now
	}

	pub(crate) fn secret(&self) -> &SecretString {
		&self.token
	}
}

/// Storage for installation tokens, keyed by installation.
///
/// The client owns expiry decisions; stores only hold what they are given.
#[async_trait]
pub trait TokenStore: Send + Sync {
	async fn get(&self, installation_id: InstallationId) -> Option<CachedToken>;

	async fn put(&self, installation_id: InstallationId, token: CachedToken);

	/// Remove the token for an installation. Returns whether one was held.
	async fn invalidate(&self, installation_id: InstallationId) -> bool;
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
	tokens: RwLock<HashMap<InstallationId, CachedToken>>,
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
	async fn get(&self, installation_id: InstallationId) -> Option<CachedToken> {
		self.tokens.read().await.get(&installation_id).cloned()
	}

	async fn put(&self, installation_id: InstallationId, token: CachedToken) {
		self.tokens.write().await.insert(installation_id, token);
	}

	async fn invalidate(&self, installation_id: InstallationId) -> bool {
		self.tokens.write().await.remove(&installation_id).is_some()
	}
}

impl GithubAppClient {
	/// A token for `installation_id`, exchanged only when the cache has none
	/// valid at the current instant.
	#[instrument(skip(self), fields(installation_id = %installation_id))]
	pub(crate) async fn installation_token(
		&self,
		installation_id: InstallationId,
	) -> Result<SecretString, GithubAppError> {
		let now = self.clock.now();

		if let Some(cached) = self.tokens.get(installation_id).await {
			if cached.is_valid_at(now) {
				trace!(expires_at = %cached.expires_at, "Using cached installation token");
				return Ok(cached.secret().clone());
			}
			debug!(expires_at = %cached.expires_at, "Cached installation token expired");
		}

		let fresh = self.exchange_installation_token(installation_id, now).await?;
		let token = fresh.secret().clone();
		let expires_at = fresh.expires_at;
		self.tokens.put(installation_id, fresh).await;

		info!(%expires_at, "Obtained installation access token");
		Ok(token)
	}

	/// Drop any cached token for the installation.
	pub async fn invalidate_installation_token(&self, installation_id: InstallationId) {
		if self.tokens.invalidate(installation_id).await {
			info!(%installation_id, "Invalidated cached installation token");
		}
	}

	async fn exchange_installation_token(
		&self,
		installation_id: InstallationId,
		now: DateTime<Utc>,
	) -> Result<CachedToken, GithubAppError> {
		let assertion = self.issuer.issue(now)?;

		let path = format!("app/installations/{installation_id}/access_tokens");
		let url = self.endpoint(&path)?;

		debug!(url = %url, "Exchanging App assertion for installation token");

		let response = self
			.http_client
			.post(url)
			.bearer_auth(assertion.bearer())
			.header(ACCEPT, GITHUB_ACCEPT)
			.header(API_VERSION_HEADER, GITHUB_API_VERSION)
			.send()
			.await
			.map_err(transport_error)?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(match status.as_u16() {
				// Bad assertion, suspended App or removed installation.
				401 | 403 | 404 => {
					let message = github_message(status, &body);
					warn!(status = status.as_u16(), message = %message, "Installation token exchange rejected");
					GithubAppError::Auth {
						status: status.as_u16(),
						message,
					}
				}
				_ => map_github_error(status, &path, &body),
			});
		}

		let body: AccessTokenResponse = response.json().await.map_err(|e| {
			GithubAppError::InvalidResponse(format!("Failed to parse access token response: {e}"))
		})?;

		let mut expires_at = now + Duration::minutes(TOKEN_LIFETIME_MINS);
		if let Some(reported) = body.expires_at {
			expires_at = expires_at.min(reported - Duration::seconds(REPORTED_EXPIRY_MARGIN_SECS));
		}

		Ok(CachedToken::new(body.token, expires_at))
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::clock::ManualClock;
	use crate::config::GithubAppConfig;
	use crate::testing::{access_token_body, test_config, TEST_APP_ID, TEST_PUBLIC_KEY_PEM};
	use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, Request, ResponseTemplate};

	const TOKEN_PATH: &str = "/app/installations/42/access_tokens";

	fn start() -> DateTime<Utc> {
		"2030-01-01T00:00:00Z".parse().unwrap()
	}

	fn client_with_clock(server: &MockServer, clock: Arc<ManualClock>) -> GithubAppClient {
		GithubAppClient::new(test_config(&server.uri()))
			.unwrap()
			.with_clock(clock)
	}

	#[tokio::test]
	async fn token_is_reused_within_lifetime() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(201).set_body_json(access_token_body("ghs_one")))
			.expect(1)
			.mount(&server)
			.await;

		let clock = Arc::new(ManualClock::new(start()));
		let client = client_with_clock(&server, clock.clone());
		let id = InstallationId::new(42);

		let first = client.installation_token(id).await.unwrap();
		clock.advance(Duration::minutes(58));
		let second = client.installation_token(id).await.unwrap();

		assert_eq!(first.expose(), "ghs_one");
		assert_eq!(second.expose(), "ghs_one");
	}

	#[tokio::test]
	async fn token_is_refreshed_after_59_minutes() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(201).set_body_json(access_token_body("ghs_one")))
			.up_to_n_times(1)
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(201).set_body_json(access_token_body("ghs_two")))
			.expect(1)
			.mount(&server)
			.await;

		let clock = Arc::new(ManualClock::new(start()));
		let client = client_with_clock(&server, clock.clone());
		let id = InstallationId::new(42);

		assert_eq!(client.installation_token(id).await.unwrap().expose(), "ghs_one");
		clock.advance(Duration::minutes(59));
		assert_eq!(client.installation_token(id).await.unwrap().expose(), "ghs_two");
		assert_eq!(client.installation_token(id).await.unwrap().expose(), "ghs_two");
	}

	#[tokio::test]
	async fn earlier_reported_expiry_wins() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
				"token": "ghs_short",
				"expires_at": "2030-01-01T00:30:00Z"
			})))
			.expect(2)
			.mount(&server)
			.await;

		let clock = Arc::new(ManualClock::new(start()));
		let client = client_with_clock(&server, clock.clone());
		let id = InstallationId::new(42);

		client.installation_token(id).await.unwrap();
		let cached = client.tokens.get(id).await.unwrap();
		assert_eq!(cached.expires_at(), start() + Duration::minutes(29));

		clock.advance(Duration::minutes(29));
		client.installation_token(id).await.unwrap();
	}

	#[tokio::test]
	async fn installations_are_cached_independently() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(201).set_body_json(access_token_body("ghs_42")))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/app/installations/43/access_tokens"))
			.respond_with(ResponseTemplate::new(201).set_body_json(access_token_body("ghs_43")))
			.expect(1)
			.mount(&server)
			.await;

		let client = GithubAppClient::new(test_config(&server.uri())).unwrap();
		assert_eq!(
			client.installation_token(InstallationId::new(42)).await.unwrap().expose(),
			"ghs_42"
		);
		assert_eq!(
			client.installation_token(InstallationId::new(43)).await.unwrap().expose(),
			"ghs_43"
		);
	}

	#[tokio::test]
	async fn exchange_is_authenticated_with_app_assertion() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.and(header("accept", "application/vnd.github+json"))
			.and(header("x-github-api-version", "2022-11-28"))
			.respond_with(ResponseTemplate::new(201).set_body_json(access_token_body("ghs_one")))
			.expect(1)
			.mount(&server)
			.await;

		let client = GithubAppClient::new(test_config(&server.uri())).unwrap();
		client.installation_token(InstallationId::new(42)).await.unwrap();

		let requests: Vec<Request> = server.received_requests().await.unwrap();
		let authorization = requests[0]
			.headers
			.get("authorization")
			.unwrap()
			.to_str()
			.unwrap()
			.to_string();
		let jwt = authorization.strip_prefix("Bearer ").unwrap();

		let mut validation = Validation::new(Algorithm::RS256);
		validation.set_required_spec_claims(&["exp", "iat", "iss"]);
		let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY_PEM.as_bytes()).unwrap();
		let claims = decode::<crate::jwt::Claims>(jwt, &key, &validation)
			.unwrap()
			.claims;
		assert_eq!(claims.iss, TEST_APP_ID.to_string());
	}

	#[tokio::test]
	async fn rejected_exchange_is_auth_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(
				ResponseTemplate::new(401)
					.set_body_json(serde_json::json!({"message": "A JSON web token could not be decoded"})),
			)
			.mount(&server)
			.await;

		let client = GithubAppClient::new(test_config(&server.uri())).unwrap();
		let err = client
			.installation_token(InstallationId::new(42))
			.await
			.unwrap_err();

		match err {
			GithubAppError::Auth { status, message } => {
				assert_eq!(status, 401);
				assert_eq!(message, "A JSON web token could not be decoded");
			}
			other => panic!("expected Auth, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn unknown_installation_is_auth_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "Not Found"})))
			.mount(&server)
			.await;

		let client = GithubAppClient::new(test_config(&server.uri())).unwrap();
		let err = client
			.installation_token(InstallationId::new(42))
			.await
			.unwrap_err();
		assert!(matches!(err, GithubAppError::Auth { status: 404, .. }));
	}

	#[tokio::test]
	async fn exchange_server_error_keeps_its_category() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
			.mount(&server)
			.await;

		let client = GithubAppClient::new(test_config(&server.uri())).unwrap();
		let err = client
			.installation_token(InstallationId::new(42))
			.await
			.unwrap_err();
		assert!(matches!(err, GithubAppError::ApiError { status: 503, .. }));
	}

	#[tokio::test]
	async fn missing_credentials_make_no_requests() {
		let server = MockServer::start().await;

		let config = GithubAppConfig::unconfigured().with_unchecked_base_url(&server.uri());
		let client = GithubAppClient::new(config).unwrap();
		let err = client
			.installation_token(InstallationId::new(42))
			.await
			.unwrap_err();

		assert!(matches!(err, GithubAppError::Config(_)));
		assert!(server.received_requests().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn invalidate_forces_new_exchange() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(201).set_body_json(access_token_body("ghs_one")))
			.expect(2)
			.mount(&server)
			.await;

		let client = GithubAppClient::new(test_config(&server.uri())).unwrap();
		let id = InstallationId::new(42);

		client.installation_token(id).await.unwrap();
		client.invalidate_installation_token(id).await;
		client.installation_token(id).await.unwrap();
	}

	#[tokio::test]
	async fn in_memory_store_round_trip() {
		let store = InMemoryTokenStore::default();
		let id = InstallationId::new(1);

		assert!(store.get(id).await.is_none());
		assert!(!store.invalidate(id).await);

		store.put(id, CachedToken::new("ghs_x", start())).await;
		assert_eq!(store.get(id).await.unwrap().secret().expose(), "ghs_x");
		assert!(store.invalidate(id).await);
		assert!(store.get(id).await.is_none());
	}

	#[test]
	fn cached_token_validity_is_strict() {
		let token = CachedToken::new("ghs_x", start());
		assert!(token.is_valid_at(start() - Duration::seconds(1)));
		assert!(!token.is_valid_at(start()));
	}
}
