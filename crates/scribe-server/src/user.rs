// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The signed-in user, as asserted by the session layer in front of Scribe.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ServerError;

pub const USER_HEADER: &str = "x-scribe-user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		headers
			.get(USER_HEADER)
			.and_then(|v| v.to_str().ok())
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(|id| Self(id.to_string()))
	}

	pub fn id(&self) -> &str {
		&self.0
	}
}

impl<S> FromRequestParts<S> for CurrentUser
where
	S: Send + Sync,
{
	type Rejection = ServerError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Self::from_headers(&parts.headers).ok_or_else(|| {
			tracing::debug!("request without signed-in user");
			ServerError::Unauthorized("Not authenticated. Please log in.".to_string())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	#[test]
	fn reads_trimmed_user_header() {
		let mut headers = HeaderMap::new();
		assert!(CurrentUser::from_headers(&headers).is_none());

		headers.insert(USER_HEADER, HeaderValue::from_static("  "));
		assert!(CurrentUser::from_headers(&headers).is_none());

		headers.insert(USER_HEADER, HeaderValue::from_static(" alice "));
		assert_eq!(CurrentUser::from_headers(&headers).unwrap().id(), "alice");
	}
}
