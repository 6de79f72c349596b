// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Keeping user settings in step with GitHub App installs and uninstalls.

use std::sync::Arc;

use scribe_server_github_app::{
	verify_webhook_signature, GithubAppClient, GithubAppError, InstallationAction,
	InstallationEvent, InstallationId, WebhookEvent,
};
use tracing::{debug, info, instrument, warn};

use crate::error::WorkflowError;
use crate::settings::SettingsStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
	/// The app was uninstalled; `cleared` settings entries lost their
	/// installation.
	Uninstalled {
		installation_id: InstallationId,
		cleared: usize,
	},
	/// Verified but not acted on.
	Ignored { event: String },
}

#[derive(Clone)]
pub struct InstallationLifecycle {
	github: GithubAppClient,
	settings: Arc<dyn SettingsStore>,
}

impl InstallationLifecycle {
	pub fn new(github: GithubAppClient, settings: Arc<dyn SettingsStore>) -> Self {
		Self { github, settings }
	}

	/// Record the installation GitHub reported in the install callback.
	#[instrument(skip(self))]
	pub async fn on_installed(
		&self,
		user_id: &str,
		installation_id: &str,
	) -> Result<InstallationId, WorkflowError> {
		let installation_id: InstallationId = installation_id.parse()?;
		self
			.settings
			.set_installation(user_id, &installation_id.to_string())
			.await?;
		info!(%installation_id, "Saved GitHub App installation");
		Ok(installation_id)
	}

	/// Verify and apply a webhook delivery.
	///
	/// `installation.deleted` removes the installation from every user's
	/// settings so the next publish reports "not connected" instead of
	/// calling GitHub with a dead id. Other events are acknowledged.
	#[instrument(skip(self, signature, body), fields(body_len = body.len()))]
	pub async fn handle_webhook(
		&self,
		event: &str,
		signature: Option<&str>,
		body: &[u8],
	) -> Result<WebhookOutcome, WorkflowError> {
		let secret = self.github.webhook_secret().ok_or_else(|| {
			GithubAppError::Config("GitHub App webhook secret is not configured".to_string())
		})?;

		let Some(signature) = signature else {
			warn!("Webhook delivery without signature");
			return Err(GithubAppError::InvalidWebhookSignature.into());
		};
		verify_webhook_signature(secret, signature, body)?;

		match WebhookEvent::parse(event, body)? {
			WebhookEvent::Installation(InstallationEvent {
				action: InstallationAction::Deleted,
				installation_id,
				account,
			}) => {
				let cleared = self
					.settings
					.clear_installation(&installation_id.to_string())
					.await?;
				self.github.invalidate_installation_token(installation_id).await;
				info!(
					%installation_id,
					account = account.as_ref().map(|a| a.login.as_str()),
					cleared,
					"GitHub App uninstalled"
				);
				Ok(WebhookOutcome::Uninstalled {
					installation_id,
					cleared,
				})
			}
			other => {
				debug!(event = other.name(), "Ignoring webhook event");
				Ok(WebhookOutcome::Ignored {
					event: other.name().to_string(),
				})
			}
		}
	}
}
