// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Helpers for tests that talk to a mock GitHub API.
//!
//! The key pair under `testdata/` exists only for tests and is not registered
//! with any GitHub App.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::GithubAppConfig;

pub const TEST_APP_ID: u64 = 424242;
pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../testdata/test-app-key.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../testdata/test-app-key.pub.pem");

/// The test private key in the single-line base64 form used in `.env` files.
pub fn test_private_key_base64() -> String {
	STANDARD.encode(TEST_PRIVATE_KEY_PEM)
}

/// A fully configured App pointing at `base_url` (typically a wiremock server).
pub fn test_config(base_url: &str) -> GithubAppConfig {
	GithubAppConfig::new(TEST_APP_ID, test_private_key_base64()).with_unchecked_base_url(base_url)
}

/// Response body GitHub sends for a successful installation token exchange.
pub fn access_token_body(token: &str) -> serde_json::Value {
	serde_json::json!({
		"token": token,
		"expires_at": "2099-01-01T00:00:00Z",
		"permissions": { "contents": "write" },
		"repository_selection": "selected"
	})
}
