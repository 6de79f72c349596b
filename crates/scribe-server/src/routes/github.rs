// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App HTTP handlers.

use axum::{
	body::Bytes,
	extract::{Query, State},
	http::HeaderMap,
	response::{IntoResponse, Redirect},
	Json,
};
use scribe_server_github_app::{AppInfoResponse, InstallationId};
use scribe_server_publish::{GithubSettings, WebhookOutcome};
use serde::{Deserialize, Serialize};

use crate::{error::ServerError, state::AppState, user::CurrentUser};

const EVENT_HEADER: &str = "X-GitHub-Event";
const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebhookResponse {
	Uninstalled {
		installation_id: InstallationId,
		cleared: usize,
	},
	Ignored {
		event: String,
	},
}

impl From<WebhookOutcome> for WebhookResponse {
	fn from(outcome: WebhookOutcome) -> Self {
		match outcome {
			WebhookOutcome::Uninstalled {
				installation_id,
				cleared,
			} => Self::Uninstalled {
				installation_id,
				cleared,
			},
			WebhookOutcome::Ignored { event } => Self::Ignored { event },
		}
	}
}

/// POST /api/github/webhook - Handle GitHub App webhook events.
///
/// Security: Requires webhook secret to be configured and valid signature.
pub async fn github_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookResponse>, ServerError> {
	let event_type = headers
		.get(EVENT_HEADER)
		.and_then(|v| v.to_str().ok())
		.unwrap_or("unknown");

	tracing::debug!(event_type = %event_type, "github_webhook: received event");

	if state.github.webhook_secret().is_none() {
		return Err(ServerError::Internal(
			"GitHub webhook secret is not configured on the server".into(),
		));
	}

	let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

	let outcome = state
		.lifecycle
		.handle_webhook(event_type, signature, &body)
		.await?;

	Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct InstallCallbackQuery {
	pub installation_id: Option<String>,
	pub setup_action: Option<String>,
}

/// GET /api/github/callback - GitHub redirects here after an install.
///
/// Always answers with a redirect to the settings page carrying a status
/// banner, so failures are shown to the user rather than as a bare error.
pub async fn github_install_callback(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<InstallCallbackQuery>,
) -> Redirect {
	let installation_id = match (params.setup_action.as_deref(), params.installation_id) {
		(Some("install"), Some(id)) if !id.trim().is_empty() => id,
		_ => {
			tracing::warn!(setup_action = ?params.setup_action, "invalid installation callback");
			return Redirect::temporary(
				&state
					.config
					.settings_redirect("error", "Invalid GitHub installation callback received."),
			);
		}
	};

	let Some(user) = CurrentUser::from_headers(&headers) else {
		return Redirect::temporary(
			&state
				.config
				.settings_redirect("error", "Not authenticated. Please log in."),
		);
	};

	match state
		.lifecycle
		.on_installed(user.id(), &installation_id)
		.await
	{
		Ok(_) => Redirect::temporary(
			&state
				.config
				.settings_redirect("success", "GitHub App connected successfully!"),
		),
		Err(e) => {
			tracing::error!(error = %e, "failed to save GitHub installation");
			Redirect::temporary(&state.config.settings_redirect("error", &e.to_string()))
		}
	}
}

/// GET /api/github/app - GitHub App configuration info.
pub async fn get_github_app_info(State(state): State<AppState>) -> Json<AppInfoResponse> {
	Json(state.github.app_info())
}

/// GET /api/github/branches - Branches of the user's configured repository.
pub async fn list_github_branches(
	State(state): State<AppState>,
	user: CurrentUser,
) -> Result<Json<Vec<String>>, ServerError> {
	let branches = state.publisher.list_branches(user.id()).await?;
	Ok(Json(branches))
}

/// GET /api/settings/github
pub async fn get_github_settings(
	State(state): State<AppState>,
	user: CurrentUser,
) -> Result<Json<GithubSettings>, ServerError> {
	Ok(Json(state.publisher.settings(user.id()).await?))
}

/// PUT /api/settings/github - Save repository coordinates. The installation
/// is only ever set by the install callback.
pub async fn put_github_settings(
	State(state): State<AppState>,
	user: CurrentUser,
	Json(update): Json<GithubSettings>,
) -> Result<impl IntoResponse, ServerError> {
	if update.owner.trim().is_empty() || update.repo.trim().is_empty() {
		return Err(ServerError::BadRequest(
			"Repository owner and name are required".into(),
		));
	}
	Ok(Json(state.publisher.save_settings(user.id(), update).await?))
}
