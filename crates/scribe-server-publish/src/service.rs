// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The publish workflow: settings, optional cover image, then the post.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use scribe_server_github_app::{Clock, CommitRequest, FileContent, GithubAppClient, SystemClock};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{error, info, instrument, warn};

use crate::error::{FailureReason, PublishFailure, WorkflowError};
use crate::layout::{sanitize_slug, PublishLayout};
use crate::markdown::render_post;
use crate::settings::{GithubSettings, RepositoryTarget, SettingsStore};

const DATA_URI_PREFIX: &str = "data:image/";

/// A post as submitted by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
	pub title: String,
	#[serde(default)]
	pub slug: String,
	#[serde(default)]
	pub body: String,
	/// Existing image path, or a `data:image/...;base64,` URI for a new one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub main_image: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image: Option<ImageUpload>,
}

/// A cover image to commit alongside the post. `data` is base64, optionally
/// as a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
	pub file_name: String,
	pub data: String,
}

impl ImageUpload {
	/// The base64 payload with any data URI header removed.
	pub fn base64_payload(&self) -> &str {
		match self.data.split_once(";base64,") {
			Some((header, payload)) if header.starts_with("data:") => payload.trim(),
			_ => self.data.trim(),
		}
	}

	fn validated_payload(&self) -> Result<&str, WorkflowError> {
		let payload = self.base64_payload();
		if payload.is_empty() {
			return Err(WorkflowError::InvalidPost("image data is empty".to_string()));
		}
		let compact: String = payload.split_whitespace().collect();
		STANDARD
			.decode(compact)
			.map_err(|e| WorkflowError::InvalidPost(format!("image data is not valid base64: {e}")))?;
		Ok(payload)
	}

	fn from_data_uri(uri: &str, slug: &str) -> Self {
		let extension = uri
			.strip_prefix(DATA_URI_PREFIX)
			.and_then(|rest| rest.split(|c: char| matches!(c, ';' | ',' | '+')).next())
			.map(|subtype| match subtype {
				"jpeg" => "jpg",
				other => other,
			})
			.filter(|ext| !ext.is_empty())
			.unwrap_or("img");
		Self {
			file_name: format!("{slug}.{extension}"),
			data: uri.to_string(),
		}
	}
}

impl PostDraft {
	fn upload(&self, slug: &str) -> Option<ImageUpload> {
		if let Some(image) = &self.image {
			return Some(image.clone());
		}
		self
			.main_image
			.as_deref()
			.filter(|image| image.starts_with(DATA_URI_PREFIX))
			.map(|uri| ImageUpload::from_data_uri(uri, slug))
	}

	fn existing_image(&self) -> Option<String> {
		self
			.main_image
			.as_deref()
			.map(str::trim)
			.filter(|image| !image.is_empty() && !image.starts_with(DATA_URI_PREFIX))
			.map(str::to_string)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPost {
	pub slug: String,
	pub path: String,
	pub created: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub commit_sha: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub main_image: Option<String>,
}

/// Result of a publish attempt. Serialises with a `success` flag so the
/// dashboard can branch without relying on HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
	Published(PublishedPost),
	Failed(PublishFailure),
}

impl PublishOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Published(_))
	}

	pub fn failure_reason(&self) -> Option<FailureReason> {
		match self {
			Self::Published(_) => None,
			Self::Failed(failure) => Some(failure.reason),
		}
	}
}

impl Serialize for PublishOutcome {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		#[derive(Serialize)]
		struct Body<'a> {
			success: bool,
			#[serde(flatten)]
			post: Option<&'a PublishedPost>,
			#[serde(flatten)]
			failure: Option<&'a PublishFailure>,
		}

		let body = match self {
			Self::Published(post) => Body {
				success: true,
				post: Some(post),
				failure: None,
			},
			Self::Failed(failure) => Body {
				success: false,
				post: None,
				failure: Some(failure),
			},
		};
		body.serialize(serializer)
	}
}

/// Publishes posts for users into the repository their settings name.
#[derive(Clone)]
pub struct PublishService {
	github: GithubAppClient,
	settings: Arc<dyn SettingsStore>,
	layout: PublishLayout,
	clock: Arc<dyn Clock>,
}

impl PublishService {
	pub fn new(github: GithubAppClient, settings: Arc<dyn SettingsStore>) -> Self {
		Self {
			github,
			settings,
			layout: PublishLayout::default(),
			clock: Arc::new(SystemClock),
		}
	}

	pub fn with_layout(mut self, layout: PublishLayout) -> Self {
		self.layout = layout;
		self
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn github(&self) -> &GithubAppClient {
		&self.github
	}

	pub fn layout(&self) -> &PublishLayout {
		&self.layout
	}

	/// Publish a post, reporting failures as a structured outcome.
	#[instrument(skip(self, draft), fields(slug = %draft.slug))]
	pub async fn publish(&self, user_id: &str, draft: PostDraft) -> PublishOutcome {
		match self.try_publish(user_id, draft).await {
			Ok(post) => PublishOutcome::Published(post),
			Err(e) => {
				let failure = PublishFailure::from(&e);
				match failure.reason {
					FailureReason::Unexpected | FailureReason::Configuration => {
						error!(error = %e, reason = ?failure.reason, "Publish failed")
					}
					_ => warn!(error = %e, reason = ?failure.reason, "Publish failed"),
				}
				PublishOutcome::Failed(failure)
			}
		}
	}

	/// Publish a post. The cover image, if any, is committed first; a failure
	/// committing the post leaves the image in place.
	pub async fn try_publish(
		&self,
		user_id: &str,
		draft: PostDraft,
	) -> Result<PublishedPost, WorkflowError> {
		let title = draft.title.trim();
		if title.is_empty() {
			return Err(WorkflowError::InvalidPost("title is required".to_string()));
		}
		let slug = match draft.slug.trim() {
			"" => sanitize_slug(title),
			slug => sanitize_slug(slug),
		};

		let upload = draft.upload(&slug);
		let payload = upload
			.as_ref()
			.map(ImageUpload::validated_payload)
			.transpose()?;

		let target = self.target(user_id).await?;

		let mut main_image = draft.existing_image();
		if let (Some(upload), Some(payload)) = (&upload, payload) {
			let path = self.layout.image_path(&upload.file_name, self.clock.now());
			self
				.github
				.commit_file(self.commit_request(
					&target,
					&path,
					FileContent::base64(payload),
					format!("feat: add image for {slug}"),
				))
				.await?;
			main_image = Some(format!("/{path}"));
		}

		let path = self.layout.post_path(&slug);
		let markdown = render_post(title, &slug, main_image.as_deref(), &draft.body);
		let outcome = self
			.github
			.commit_file(self.commit_request(
				&target,
				&path,
				FileContent::Text(markdown),
				format!("feat: publish post \"{title}\""),
			))
			.await?;

		info!(
			owner = %target.owner,
			repo = %target.repo,
			path = %outcome.path,
			created = outcome.created,
			"Published post"
		);

		Ok(PublishedPost {
			slug,
			path: outcome.path,
			created: outcome.created,
			commit_sha: outcome.commit_sha,
			main_image,
		})
	}

	/// Branches of the user's repository, for the settings page.
	pub async fn list_branches(&self, user_id: &str) -> Result<Vec<String>, WorkflowError> {
		let target = self.target(user_id).await?;
		Ok(self
			.github
			.list_branches(&target.owner, &target.repo, target.installation_id)
			.await?)
	}

	/// The user's settings, or defaults if none were saved.
	pub async fn settings(&self, user_id: &str) -> Result<GithubSettings, WorkflowError> {
		Ok(self.settings.get(user_id).await?.unwrap_or_default())
	}

	/// Save repository coordinates, keeping the installation the user already
	/// connected.
	pub async fn save_settings(
		&self,
		user_id: &str,
		update: GithubSettings,
	) -> Result<GithubSettings, WorkflowError> {
		let installation_id = self
			.settings
			.get(user_id)
			.await?
			.and_then(|current| current.installation_id);

		let settings = GithubSettings {
			owner: update.owner.trim().to_string(),
			repo: update.repo.trim().to_string(),
			branch: update.branch.trim().to_string(),
			installation_id,
		};
		self.settings.save(user_id, settings.clone()).await?;
		Ok(settings)
	}

	async fn target(&self, user_id: &str) -> Result<RepositoryTarget, WorkflowError> {
		self
			.settings
			.get(user_id)
			.await?
			.ok_or(WorkflowError::SettingsMissing)?
			.connection()
	}

	fn commit_request(
		&self,
		target: &RepositoryTarget,
		path: &str,
		content: FileContent,
		message: String,
	) -> CommitRequest {
		CommitRequest::new(
			target.owner.as_str(),
			target.repo.as_str(),
			target.installation_id,
			path,
			content,
			message,
		)
		.with_branch(target.branch.as_str())
	}
}
