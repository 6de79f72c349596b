// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use scribe_server_github_app::{ErrorKind, GithubAppError};
use scribe_server_publish::{FailureReason, WorkflowError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Invalid request: {0}")]
	BadRequest(String),

	/// No signed-in user on the request.
	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	#[error("Internal error: {0}")]
	Internal(String),

	#[error(transparent)]
	Workflow(#[from] WorkflowError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
		}
	}
}

impl From<GithubAppError> for ServerError {
	fn from(e: GithubAppError) -> Self {
		Self::Workflow(WorkflowError::Github(e))
	}
}

fn reason_code(reason: FailureReason) -> &'static str {
	match reason {
		FailureReason::Configuration => "configuration",
		FailureReason::ReconnectRequired => "reconnect_required",
		FailureReason::CheckSettings => "check_settings",
		FailureReason::TryAgain => "try_again",
		FailureReason::NotConnected => "not_connected",
		FailureReason::InvalidPost => "invalid_post",
		FailureReason::Unexpected => "unexpected",
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("bad_request", msg.clone()),
			),
			ServerError::Unauthorized(msg) => (
				StatusCode::UNAUTHORIZED,
				ErrorResponse::new("unauthorized", msg.clone()),
			),
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "An internal error occurred"),
				)
			}
			ServerError::Workflow(WorkflowError::Github(GithubAppError::InvalidWebhookSignature)) => (
				StatusCode::UNAUTHORIZED,
				ErrorResponse::new("invalid_signature", "Invalid webhook signature"),
			),
			ServerError::Workflow(WorkflowError::Github(e @ GithubAppError::InvalidWebhookPayload(_))) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("invalid_payload", e.to_string()),
			),
			ServerError::Workflow(e) => {
				let reason = e.reason();
				let status = match reason {
					FailureReason::NotConnected
					| FailureReason::CheckSettings
					| FailureReason::InvalidPost => StatusCode::BAD_REQUEST,
					FailureReason::TryAgain => StatusCode::CONFLICT,
					FailureReason::ReconnectRequired => StatusCode::BAD_GATEWAY,
					FailureReason::Configuration => StatusCode::SERVICE_UNAVAILABLE,
					FailureReason::Unexpected => match e.kind() {
						Some(ErrorKind::Transport) => StatusCode::GATEWAY_TIMEOUT,
						Some(_) => StatusCode::BAD_GATEWAY,
						None => StatusCode::INTERNAL_SERVER_ERROR,
					},
				};
				if status.is_server_error() {
					tracing::error!(error = %e, "request failed");
				}
				(status, ErrorResponse::new(reason_code(reason), e.to_string()))
			}
		};

		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn status_of(error: ServerError) -> StatusCode {
		error.into_response().status()
	}

	#[test]
	fn webhook_errors_map_to_401_and_400() {
		assert_eq!(
			status_of(GithubAppError::InvalidWebhookSignature.into()),
			StatusCode::UNAUTHORIZED
		);
		assert_eq!(
			status_of(GithubAppError::InvalidWebhookPayload("eof".into()).into()),
			StatusCode::BAD_REQUEST
		);
	}

	#[test]
	fn missing_configuration_is_server_side() {
		assert_eq!(
			status_of(GithubAppError::Config("no secret".into()).into()),
			StatusCode::SERVICE_UNAVAILABLE
		);
	}

	#[test]
	fn workflow_reasons_map_to_statuses() {
		assert_eq!(
			status_of(WorkflowError::NotConnected.into()),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(
			status_of(
				GithubAppError::Auth {
					status: 401,
					message: "Bad credentials".into()
				}
				.into()
			),
			StatusCode::BAD_GATEWAY
		);
		assert_eq!(status_of(GithubAppError::Timeout.into()), StatusCode::GATEWAY_TIMEOUT);
		assert_eq!(
			status_of(ServerError::Unauthorized("no user".into())),
			StatusCode::UNAUTHORIZED
		);
	}
}
