// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App webhooks: signature verification and the events Scribe acts on.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::GithubAppError;
use crate::types::{InstallationAccount, InstallationId};

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify the `X-Hub-Signature-256` header (`sha256=<hex>`) against the raw
/// request body.
pub fn verify_webhook_signature(
	secret: &str,
	signature_header: &str,
	body: &[u8],
) -> Result<(), GithubAppError> {
	let Some(signature_hex) = signature_header.strip_prefix(SIGNATURE_PREFIX) else {
		warn!("Invalid webhook signature format: missing 'sha256=' prefix");
		return Err(GithubAppError::InvalidWebhookSignature);
	};

	if scribe_common_webhook::verify_hmac_sha256(secret.as_bytes(), body, signature_hex) {
		debug!("Webhook signature verified");
		Ok(())
	} else {
		warn!("Webhook signature verification failed");
		Err(GithubAppError::InvalidWebhookSignature)
	}
}

/// The `sha256=<hex>` header value GitHub would send for `body`.
pub fn compute_webhook_signature(secret: &str, body: &[u8]) -> String {
	format!(
		"{SIGNATURE_PREFIX}{}",
		scribe_common_webhook::sign_hmac_sha256(secret.as_bytes(), body)
	)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationAction {
	Created,
	Deleted,
	Suspend,
	Unsuspend,
	NewPermissionsAccepted,
	#[serde(other)]
	Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationEvent {
	pub action: InstallationAction,
	pub installation_id: InstallationId,
	pub account: Option<InstallationAccount>,
}

/// A webhook delivery, keyed by the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
	Installation(InstallationEvent),
	Ping,
	Other(String),
}

#[derive(Deserialize)]
struct InstallationPayload {
	action: InstallationAction,
	installation: InstallationRef,
}

#[derive(Deserialize)]
struct InstallationRef {
	id: InstallationId,
	#[serde(default)]
	account: Option<InstallationAccount>,
}

impl WebhookEvent {
	/// Parse a delivery body. Only `installation` payloads are inspected;
	/// other events are returned by name without reading the body.
	pub fn parse(event: &str, body: &[u8]) -> Result<Self, GithubAppError> {
		match event {
			"installation" => {
				let payload: InstallationPayload = serde_json::from_slice(body)
					.map_err(|e| GithubAppError::InvalidWebhookPayload(e.to_string()))?;
				Ok(Self::Installation(InstallationEvent {
					action: payload.action,
					installation_id: payload.installation.id,
					account: payload.installation.account,
				}))
			}
			"ping" => Ok(Self::Ping),
			other => Ok(Self::Other(other.to_string())),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Installation(_) => "installation",
			Self::Ping => "ping",
			Self::Other(name) => name,
		}
	}
}
