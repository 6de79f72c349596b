// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use scribe_server_github_app::{ErrorKind, GithubAppError, ParseInstallationIdError, PublishError};
use serde::Serialize;
use thiserror::Error;

/// Failure in the settings backend.
#[derive(Debug, Error)]
#[error("Settings store error: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, Error)]
pub enum WorkflowError {
	#[error("GitHub settings not found. Please configure them on the settings page.")]
	SettingsMissing,

	#[error("GitHub App is not connected. Install the app from the settings page.")]
	NotConnected,

	#[error("GitHub repository details are incomplete. Please check your settings.")]
	Incomplete,

	#[error("Stored installation id is invalid: {0}")]
	InvalidInstallation(#[from] ParseInstallationIdError),

	#[error("Invalid post: {0}")]
	InvalidPost(String),

	#[error(transparent)]
	Publish(#[from] PublishError),

	#[error(transparent)]
	Github(#[from] GithubAppError),

	#[error(transparent)]
	Store(#[from] StoreError),
}

impl WorkflowError {
	/// Core error category, for errors that came from GitHub.
	pub fn kind(&self) -> Option<ErrorKind> {
		match self {
			Self::Publish(e) => Some(e.kind()),
			Self::Github(e) => Some(e.kind()),
			_ => None,
		}
	}

	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Publish(e) => e.status(),
			Self::Github(e) => e.status(),
			_ => None,
		}
	}

	pub fn reason(&self) -> FailureReason {
		match self {
			Self::SettingsMissing | Self::NotConnected => FailureReason::NotConnected,
			Self::Incomplete | Self::InvalidInstallation(_) => FailureReason::CheckSettings,
			Self::InvalidPost(_) => FailureReason::InvalidPost,
			Self::Store(_) => FailureReason::Unexpected,
			Self::Publish(_) | Self::Github(_) => match self.kind() {
				Some(ErrorKind::Configuration) => FailureReason::Configuration,
				Some(ErrorKind::Auth) => FailureReason::ReconnectRequired,
				Some(ErrorKind::NotFound) => FailureReason::CheckSettings,
				Some(ErrorKind::Validation) => FailureReason::TryAgain,
				_ => FailureReason::Unexpected,
			},
		}
	}
}

/// What the user should do about a failed publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
	/// The server's GitHub App credentials are missing or unusable.
	Configuration,
	/// The installation was revoked or suspended; install the app again.
	ReconnectRequired,
	/// Repository, branch or directory does not match the settings.
	CheckSettings,
	/// The file changed underneath the write; publishing again will succeed.
	TryAgain,
	NotConnected,
	InvalidPost,
	Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct PublishFailure {
	pub reason: FailureReason,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<u16>,
}

impl From<&WorkflowError> for PublishFailure {
	fn from(error: &WorkflowError) -> Self {
		Self {
			reason: error.reason(),
			message: error.to_string(),
			status: error.status(),
		}
	}
}
