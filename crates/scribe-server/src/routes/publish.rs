// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use scribe_server_publish::{PostDraft, PublishOutcome};

use crate::{state::AppState, user::CurrentUser};

/// POST /api/publish - Commit a post to the user's repository.
///
/// Publishing failures are part of the 200 response body (`success: false`
/// with a reason); only a missing user or a malformed body is an HTTP error.
pub async fn publish_post(
	State(state): State<AppState>,
	user: CurrentUser,
	Json(draft): Json<PostDraft>,
) -> Json<PublishOutcome> {
	Json(state.publisher.publish(user.id(), draft).await)
}
