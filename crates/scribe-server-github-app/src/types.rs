// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request and response types for GitHub App operations.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Branch used when the caller does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// Numeric id of one installation of the App on a user or organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(i64);

impl InstallationId {
	pub fn new(id: i64) -> Self {
		Self(id)
	}

	pub fn get(self) -> i64 {
		self.0
	}
}

impl fmt::Display for InstallationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl From<i64> for InstallationId {
	fn from(id: i64) -> Self {
		Self(id)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid installation id '{0}': expected a positive integer")]
pub struct ParseInstallationIdError(String);

impl FromStr for InstallationId {
	type Err = ParseInstallationIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().parse::<i64>() {
			Ok(id) if id > 0 => Ok(Self(id)),
			_ => Err(ParseInstallationIdError(s.to_string())),
		}
	}
}

/// Payload of a file commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
	/// UTF-8 text such as a rendered Markdown post.
	Text(String),
	/// Raw bytes such as an image.
	Bytes(Vec<u8>),
	/// Already base64-encoded by the caller; sent as is.
	Base64(String),
}

impl FileContent {
	pub fn base64(encoded: impl Into<String>) -> Self {
		Self::Base64(encoded.into())
	}

	/// Encoding expected by the Contents API.
	pub fn to_base64(&self) -> String {
		match self {
			Self::Text(text) => STANDARD.encode(text.as_bytes()),
			Self::Bytes(bytes) => STANDARD.encode(bytes),
			Self::Base64(encoded) => encoded.trim().to_string(),
		}
	}

	pub fn is_base64(&self) -> bool {
		matches!(self, Self::Base64(_))
	}
}

impl From<String> for FileContent {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&str> for FileContent {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

impl From<Vec<u8>> for FileContent {
	fn from(bytes: Vec<u8>) -> Self {
		Self::Bytes(bytes)
	}
}

/// One create-or-update of a single file.
#[derive(Debug, Clone)]
pub struct CommitRequest {
	pub owner: String,
	pub repo: String,
	pub installation_id: InstallationId,
	pub path: String,
	pub content: FileContent,
	pub message: String,
	pub branch: String,
}

impl CommitRequest {
	pub fn new(
		owner: impl Into<String>,
		repo: impl Into<String>,
		installation_id: InstallationId,
		path: impl Into<String>,
		content: impl Into<FileContent>,
		message: impl Into<String>,
	) -> Self {
		Self {
			owner: owner.into(),
			repo: repo.into(),
			installation_id,
			path: path.into(),
			content: content.into(),
			message: message.into(),
			branch: DEFAULT_BRANCH.to_string(),
		}
	}

	pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
		self.branch = branch.into();
		self
	}
}

/// Current state of a file in the target repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
	pub path: String,
	/// Blob sha; required to update the file.
	pub sha: String,
	pub size: u64,
	pub branch: String,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
	pub path: String,
	/// Blob sha of the file as committed.
	pub sha: Option<String>,
	/// Sha of the commit that carried the change.
	pub commit_sha: Option<String>,
	/// True when the file did not exist before this commit.
	pub created: bool,
}

/// Account an installation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationAccount {
	pub login: String,
	#[serde(rename = "type", default)]
	pub account_type: Option<String>,
}

/// Server response for the app info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfoResponse {
	pub configured: bool,
	pub app_slug: Option<String>,
	pub installation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
	pub token: String,
	#[serde(default)]
	pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentFileResponse {
	pub path: String,
	pub sha: String,
	#[serde(default)]
	pub size: u64,
}

/// `GET contents/{path}` answers with an array for directories.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsResponse {
	Directory(Vec<serde_json::Value>),
	File(ContentFileResponse),
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContentWriteResponse {
	#[serde(default)]
	pub content: Option<ContentWriteFile>,
	#[serde(default)]
	pub commit: Option<ContentWriteCommit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentWriteFile {
	pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentWriteCommit {
	pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchResponse {
	pub name: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn installation_id_parses_numeric_strings() {
		assert_eq!("12345".parse::<InstallationId>().unwrap().get(), 12345);
		assert_eq!(" 42 ".parse::<InstallationId>().unwrap().get(), 42);
		assert!("".parse::<InstallationId>().is_err());
		assert!("abc".parse::<InstallationId>().is_err());
		assert!("-3".parse::<InstallationId>().is_err());
		assert!("0".parse::<InstallationId>().is_err());
	}

	#[test]
	fn installation_id_serializes_as_number() {
		let id = InstallationId::new(99);
		assert_eq!(serde_json::to_string(&id).unwrap(), "99");
		assert_eq!(id.to_string(), "99");
	}

	#[test]
	fn text_content_is_encoded() {
		let content = FileContent::from("---\ntitle: \"Hello World\"\n---\n\nBody text");
		assert_eq!(
			content.to_base64(),
			"LS0tCnRpdGxlOiAiSGVsbG8gV29ybGQiCi0tLQoKQm9keSB0ZXh0"
		);
		assert!(!content.is_base64());
	}

	#[test]
	fn pre_encoded_content_passes_through() {
		let content = FileContent::base64("aGVsbG8=\n");
		assert_eq!(content.to_base64(), "aGVsbG8=");
		assert!(content.is_base64());
	}

	#[test]
	fn bytes_are_encoded() {
		let content = FileContent::from(vec![0xff, 0x00, 0x10]);
		assert_eq!(content.to_base64(), "/wAQ");
	}

	#[test]
	fn commit_request_defaults_to_main() {
		let request = CommitRequest::new(
			"octo",
			"blog",
			InstallationId::new(1),
			"posts/a.md",
			"body",
			"msg",
		);
		assert_eq!(request.branch, DEFAULT_BRANCH);
		assert_eq!(request.with_branch("gh-pages").branch, "gh-pages");
	}

	#[test]
	fn access_token_response_parses_github_shape() {
		let parsed: AccessTokenResponse = serde_json::from_str(
			r#"{"token":"ghs_abc","expires_at":"2016-07-11T22:14:10Z","permissions":{"contents":"write"}}"#,
		)
		.unwrap();
		assert_eq!(parsed.token, "ghs_abc");
		assert_eq!(
			parsed.expires_at.unwrap().to_rfc3339(),
			"2016-07-11T22:14:10+00:00"
		);
	}
}
