// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! App assertion (JWT) issuance for GitHub App authentication.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use scribe_common_config::{Secret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::GithubAppConfig;
use crate::error::GithubAppError;

/// Backdating of `iat` to tolerate clock skew between us and GitHub.
const CLOCK_SKEW_SECS: i64 = 60;
/// GitHub accepts App assertions valid for at most ten minutes.
const ASSERTION_LIFETIME_SECS: i64 = 10 * 60;

/// JWT claims for GitHub App authentication.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
	/// Issued at timestamp (seconds since epoch).
	pub iat: i64,
	/// Expiration timestamp (seconds since epoch).
	pub exp: i64,
	/// Issuer (GitHub App ID).
	pub iss: String,
}

/// Signed assertion identifying the App itself. Only ever used to request
/// installation tokens.
#[derive(Debug, Clone)]
pub struct AppAssertion {
	token: SecretString,
	issued_at: DateTime<Utc>,
	expires_at: DateTime<Utc>,
}

impl AppAssertion {
	pub(crate) fn bearer(&self) -> &str {
		self.token.expose()
	}

	pub fn issued_at(&self) -> DateTime<Utc> {
		self.issued_at
	}

	pub fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}

	pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at > now
	}
}

/// Issues App assertions from the configured App id and private key.
///
/// Stateless: every call decodes the key and signs a fresh assertion.
#[derive(Clone)]
pub struct AppAssertionIssuer {
	config: GithubAppConfig,
}

impl AppAssertionIssuer {
	pub fn new(config: GithubAppConfig) -> Self {
		Self { config }
	}

	/// Sign `{iat: now - 60s, exp: now + 10min, iss: app_id}` with RS256.
	#[instrument(skip(self))]
	pub fn issue(&self, now: DateTime<Utc>) -> Result<AppAssertion, GithubAppError> {
		let app_id = self.config.app_id()?;
		let private_key_pem = Secret::new(decode_private_key(
			self.config.private_key()?.expose(),
		)?);

		let issued_at = now - Duration::seconds(CLOCK_SKEW_SECS);
		let expires_at = now + Duration::seconds(ASSERTION_LIFETIME_SECS);

		let claims = Claims {
			iat: issued_at.timestamp(),
			exp: expires_at.timestamp(),
			iss: app_id.to_string(),
		};

		let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.expose().as_bytes())
			.map_err(|e| GithubAppError::Jwt(format!("Invalid RSA private key: {e}")))?;

		let token = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
			.map_err(|e| GithubAppError::Jwt(format!("Failed to encode JWT: {e}")))?;

		debug!(app_id, exp = claims.exp, "Generated GitHub App assertion");

		Ok(AppAssertion {
			token: Secret::new(token),
			issued_at,
			expires_at,
		})
	}
}

/// Turn the configured private key into a PEM block.
///
/// The key normally arrives base64-encoded so it fits in a single-line
/// environment value; whitespace and line breaks inside the encoding are
/// ignored, as is missing padding. A raw PEM block is accepted as is, with
/// literal `\n` sequences turned back into newlines.
pub fn decode_private_key(raw: &str) -> Result<String, GithubAppError> {
	let trimmed = raw.trim().trim_matches('"').trim();

	if trimmed.is_empty() {
		return Err(GithubAppError::Config(
			"GitHub App private key is empty".to_string(),
		));
	}

	if trimmed.starts_with("-----BEGIN") {
		return Ok(trimmed.replace("\\n", "\n"));
	}

	let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
	let bytes = STANDARD
		.decode(&compact)
		.or_else(|_| STANDARD_NO_PAD.decode(compact.trim_end_matches('=')))
		.map_err(|e| GithubAppError::Config(format!("GitHub App private key is not valid base64: {e}")))?;

	let pem = String::from_utf8(bytes).map_err(|_| {
		GithubAppError::Config("GitHub App private key does not decode to text".to_string())
	})?;

	if !pem.trim_start().starts_with("-----BEGIN") {
		return Err(GithubAppError::Config(
			"GitHub App private key does not decode to a PEM block".to_string(),
		));
	}

	Ok(pem)
}
