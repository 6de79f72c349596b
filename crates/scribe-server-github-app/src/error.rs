// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for the GitHub App client.

use thiserror::Error;

/// Coarse category of a failure, stable enough for callers to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// App id or private key missing or unusable. Not retryable.
	Configuration,
	/// Installation token exchange failed or a token was rejected.
	Auth,
	/// Repository, path or branch absent (or invisible to the installation).
	NotFound,
	/// GitHub refused the request on structural grounds, typically a stale sha.
	Validation,
	/// Any other non-2xx status.
	Api,
	/// Connection failure or timeout.
	Transport,
	/// 2xx response whose body could not be understood.
	InvalidResponse,
	/// Inbound webhook rejected.
	Webhook,
}

/// Errors that can occur when interacting with the GitHub App API.
#[derive(Debug, Error)]
pub enum GithubAppError {
	/// Missing or invalid App credentials or settings.
	#[error("Configuration error: {0}")]
	Config(String),

	/// Signing the App assertion failed.
	#[error("JWT error: {0}")]
	Jwt(String),

	/// Exchanging the App assertion for an installation token failed, or
	/// GitHub rejected an installation token.
	#[error("GitHub App authentication failed ({status}): {message}")]
	Auth { status: u16, message: String },

	/// HTTP 404.
	#[error("Not Found: {message} (URL: {path})")]
	NotFound { path: String, message: String },

	/// A file was expected at `path` but GitHub listed a directory there.
	#[error("'{path}' is a directory on branch '{branch}', not a file")]
	NotAFile { path: String, branch: String },

	/// HTTP 409 / 422.
	#[error("Validation Error: {message} (URL: {path})")]
	Validation {
		status: u16,
		path: String,
		message: String,
	},

	/// Any other non-2xx status.
	#[error("GitHub API error: {status} - {message} (URL: {path})")]
	ApiError {
		status: u16,
		path: String,
		message: String,
	},

	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// Invalid or unparseable response.
	#[error("Invalid response from GitHub: {0}")]
	InvalidResponse(String),

	/// Webhook signature verification failed.
	#[error("Invalid webhook signature")]
	InvalidWebhookSignature,

	/// Webhook body could not be parsed.
	#[error("Invalid webhook payload: {0}")]
	InvalidWebhookPayload(String),
}

impl GithubAppError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) | Self::Jwt(_) => ErrorKind::Configuration,
			Self::Auth { .. } => ErrorKind::Auth,
			Self::NotFound { .. } | Self::NotAFile { .. } => ErrorKind::NotFound,
			Self::Validation { .. } => ErrorKind::Validation,
			Self::ApiError { .. } => ErrorKind::Api,
			Self::Network(_) | Self::Timeout => ErrorKind::Transport,
			Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
			Self::InvalidWebhookSignature | Self::InvalidWebhookPayload(_) => ErrorKind::Webhook,
		}
	}

	/// HTTP status that produced this error, when there was one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Auth { status, .. }
			| Self::Validation { status, .. }
			| Self::ApiError { status, .. } => Some(*status),
			Self::NotFound { .. } => Some(404),
			Self::Network(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}

	pub fn is_not_found(&self) -> bool {
		self.kind() == ErrorKind::NotFound
	}

	pub fn api_error(status: u16, path: impl Into<String>, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			path: path.into(),
			message: message.into(),
		}
	}

	pub fn not_found(path: impl Into<String>, message: impl Into<String>) -> Self {
		Self::NotFound {
			path: path.into(),
			message: message.into(),
		}
	}
}

/// Failure of a file commit.
///
/// Wraps the underlying [`GithubAppError`] with publish context while keeping
/// its category reachable through [`PublishError::kind`].
#[derive(Debug, Error)]
pub enum PublishError {
	/// The guarded publish directory does not exist on the target branch.
	#[error(
		"Safety check failed: '{directory}' directory not found in the '{branch}' branch. \
		 Create it in the repository before publishing."
	)]
	DirectoryMissing { directory: String, branch: String },

	/// The directory probe could not reach the repository at all.
	#[error("Safety check failed: {0}")]
	SafetyCheck(#[source] GithubAppError),

	#[error(transparent)]
	Github(#[from] GithubAppError),
}

impl PublishError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::DirectoryMissing { .. } => ErrorKind::NotFound,
			Self::SafetyCheck(e) | Self::Github(e) => e.kind(),
		}
	}

	pub fn status(&self) -> Option<u16> {
		self.github_error().and_then(GithubAppError::status)
	}

	pub fn github_error(&self) -> Option<&GithubAppError> {
		match self {
			Self::DirectoryMissing { .. } => None,
			Self::SafetyCheck(e) | Self::Github(e) => Some(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kinds_follow_variants() {
		assert_eq!(
			GithubAppError::Config("missing key".into()).kind(),
			ErrorKind::Configuration
		);
		assert_eq!(
			GithubAppError::Jwt("bad key".into()).kind(),
			ErrorKind::Configuration
		);
		assert_eq!(
			GithubAppError::Auth {
				status: 401,
				message: "Bad credentials".into()
			}
			.kind(),
			ErrorKind::Auth
		);
		assert_eq!(GithubAppError::Timeout.kind(), ErrorKind::Transport);
		assert_eq!(
			GithubAppError::InvalidWebhookSignature.kind(),
			ErrorKind::Webhook
		);
	}

	#[test]
	fn status_is_exposed() {
		let err = GithubAppError::Validation {
			status: 422,
			path: "repos/o/r/contents/posts/a.md".into(),
			message: "sha wasn't supplied".into(),
		};
		assert_eq!(err.status(), Some(422));
		assert_eq!(GithubAppError::not_found("repos/o/r", "Not Found").status(), Some(404));
		assert_eq!(GithubAppError::Config("x".into()).status(), None);
	}

	#[test]
	fn directory_at_file_path_is_not_found_without_status() {
		let err = GithubAppError::NotAFile {
			path: "docs".into(),
			branch: "main".into(),
		};
		assert_eq!(err.kind(), ErrorKind::NotFound);
		assert_eq!(err.status(), None);
		assert_eq!(
			err.to_string(),
			"'docs' is a directory on branch 'main', not a file"
		);
	}

	#[test]
	fn not_found_display_names_the_url() {
		let err = GithubAppError::not_found("repos/octo/blog/contents/posts", "Not Found");
		assert_eq!(
			err.to_string(),
			"Not Found: Not Found (URL: repos/octo/blog/contents/posts)"
		);
	}

	#[test]
	fn publish_error_delegates_kind_and_status() {
		let err = PublishError::from(GithubAppError::Validation {
			status: 409,
			path: "p".into(),
			message: "conflict".into(),
		});
		assert_eq!(err.kind(), ErrorKind::Validation);
		assert_eq!(err.status(), Some(409));

		let err = PublishError::SafetyCheck(GithubAppError::not_found("repos/o/r", "Not Found"));
		assert_eq!(err.kind(), ErrorKind::NotFound);
		assert!(err.to_string().starts_with("Safety check failed: Not Found"));
	}

	#[test]
	fn directory_missing_message_is_actionable() {
		let err = PublishError::DirectoryMissing {
			directory: "posts".into(),
			branch: "main".into(),
		};
		assert_eq!(err.kind(), ErrorKind::NotFound);
		assert_eq!(err.status(), None);
		let msg = err.to_string();
		assert!(msg.contains("'posts' directory not found in the 'main' branch"));
		assert!(msg.contains("Create it"));
	}
}
