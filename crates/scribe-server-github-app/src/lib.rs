// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App client for Scribe.
//!
//! Publishing a post means committing a file into a repository the user owns
//! through their installation of the Scribe GitHub App. This crate provides:
//!
//! - App assertion (RS256 JWT) issuance from the configured private key
//! - installation access tokens, cached per installation until shortly
//!   before expiry
//! - one authenticated request path with a typed error taxonomy
//! - the directory safety probe, the create-or-update file commit and the
//!   branch listing used by the settings page
//! - webhook signature verification and installation event parsing
//!
//! Nothing in this crate retries on its own. A commit that loses a race
//! against a concurrent writer surfaces as a validation error and the caller
//! decides whether to publish again.

pub mod branches;
pub mod client;
pub mod clock;
pub mod config;
pub mod contents;
pub mod error;
pub mod jwt;
pub mod token;
pub mod types;
pub mod webhook;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use client::{ApiRequest, GithubAppClient};
pub use clock::{Clock, SystemClock};
pub use config::GithubAppConfig;
pub use error::{ErrorKind, GithubAppError, PublishError};
pub use jwt::{decode_private_key, AppAssertion, AppAssertionIssuer};
pub use token::{CachedToken, InMemoryTokenStore, TokenStore};
pub use types::{
	AppInfoResponse, CommitOutcome, CommitRequest, FileContent, InstallationAccount, InstallationId,
	ParseInstallationIdError, RemoteFile, DEFAULT_BRANCH,
};
pub use webhook::{
	compute_webhook_signature, verify_webhook_signature, InstallationAction, InstallationEvent,
	WebhookEvent,
};

/// Pinned REST API version sent with every request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";
