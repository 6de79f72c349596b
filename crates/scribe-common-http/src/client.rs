// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

/// Upper bound for any single outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client builder preconfigured with the Scribe User-Agent and
/// [`DEFAULT_TIMEOUT`]. Callers may override the timeout but not remove it.
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.timeout(DEFAULT_TIMEOUT)
}

/// Build a client with a custom timeout.
pub fn new_client(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).build()
}

/// `scribe/<crate version>`
pub fn user_agent() -> String {
	format!("scribe/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_product_and_version() {
		let ua = user_agent();
		let (product, version) = ua.split_once('/').unwrap();
		assert_eq!(product, "scribe");
		assert!(!version.is_empty());
	}

	#[test]
	fn client_builds_with_custom_timeout() {
		assert!(new_client(Duration::from_secs(5)).is_ok());
	}
}
