// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Repository contents: the directory guard, file lookup and commits.
//!
//! Commits follow GitHub's optimistic concurrency rule. The current blob sha
//! is read immediately before the write and sent with it; a file with no sha
//! is created. A concurrent writer in between makes GitHub reject the write
//! with a conflict, which surfaces as [`GithubAppError::Validation`] and is
//! not retried here.

use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::client::{encode_path, repo_path, ApiRequest, GithubAppClient};
use crate::error::{GithubAppError, PublishError};
use crate::types::{
	CommitOutcome, CommitRequest, ContentWriteResponse, ContentsResponse, InstallationId,
	RemoteFile,
};

fn contents_path(owner: &str, repo: &str, path: &str) -> String {
	format!("{}/contents/{}", repo_path(owner, repo), encode_path(path))
}

impl GithubAppClient {
	/// Whether `directory` is reachable on `branch`.
	///
	/// A 404 for the directory is `Ok(false)` only when the repository itself
	/// answers; a repository the installation cannot see propagates its own
	/// `NotFound`.
	#[instrument(skip(self), fields(installation_id = %installation_id))]
	pub async fn directory_exists(
		&self,
		owner: &str,
		repo: &str,
		installation_id: InstallationId,
		directory: &str,
		branch: &str,
	) -> Result<bool, GithubAppError> {
		let listing =
			ApiRequest::get(contents_path(owner, repo, directory)).with_query("ref", branch);

		match self.request::<Value>(installation_id, listing).await {
			Ok(_) => Ok(true),
			Err(e) if e.is_not_found() => {
				debug!("Directory lookup returned 404, probing repository");
				self
					.request::<Value>(installation_id, ApiRequest::get(repo_path(owner, repo)))
					.await?;
				Ok(false)
			}
			Err(e) => Err(e),
		}
	}

	/// The file at `path` on `branch`, or `None` if it does not exist.
	#[instrument(skip(self), fields(installation_id = %installation_id))]
	pub async fn get_file(
		&self,
		owner: &str,
		repo: &str,
		installation_id: InstallationId,
		path: &str,
		branch: &str,
	) -> Result<Option<RemoteFile>, GithubAppError> {
		let request = ApiRequest::get(contents_path(owner, repo, path)).with_query("ref", branch);

		match self
			.request::<ContentsResponse>(installation_id, request)
			.await
		{
			Ok(Some(ContentsResponse::Directory(_))) => Err(GithubAppError::NotAFile {
				path: path.to_string(),
				branch: branch.to_string(),
			}),
			Ok(Some(ContentsResponse::File(file))) => Ok(Some(RemoteFile {
				path: file.path,
				sha: file.sha,
				size: file.size,
				branch: branch.to_string(),
			})),
			Ok(None) => Err(GithubAppError::InvalidResponse(format!(
				"Empty response for file {path}"
			))),
			Err(e) if e.is_not_found() => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Create or update one file in a single commit.
	#[instrument(
		skip(self, request),
		fields(
			installation_id = %request.installation_id,
			owner = %request.owner,
			repo = %request.repo,
			path = %request.path,
			branch = %request.branch
		)
	)]
	pub async fn commit_file(&self, request: CommitRequest) -> Result<CommitOutcome, PublishError> {
		self.check_guarded_directory(&request).await?;

		let existing = self
			.get_file(
				&request.owner,
				&request.repo,
				request.installation_id,
				&request.path,
				&request.branch,
			)
			.await?;

		let mut body = json!({
			"message": request.message,
			"content": request.content.to_base64(),
			"branch": request.branch,
		});
		if let Some(file) = &existing {
			debug!(sha = %file.sha, "Updating existing file");
			body["sha"] = Value::String(file.sha.clone());
		} else {
			debug!("Creating new file");
		}

		let put = ApiRequest::put(
			contents_path(&request.owner, &request.repo, &request.path),
			body,
		);
		let response = self
			.request::<ContentWriteResponse>(request.installation_id, put)
			.await
			.map_err(|e| {
				error!(error = %e, "Failed to commit file");
				e
			})?
			.unwrap_or_default();

		let outcome = CommitOutcome {
			path: request.path.clone(),
			sha: response.content.map(|c| c.sha),
			commit_sha: response.commit.map(|c| c.sha),
			created: existing.is_none(),
		};

		info!(
			created = outcome.created,
			commit_sha = ?outcome.commit_sha,
			"Committed file"
		);

		Ok(outcome)
	}

	async fn check_guarded_directory(&self, request: &CommitRequest) -> Result<(), PublishError> {
		let Some(directory) = self.config.guarded_directory_for(&request.path) else {
			return Ok(());
		};

		let exists = self
			.directory_exists(
				&request.owner,
				&request.repo,
				request.installation_id,
				directory,
				&request.branch,
			)
			.await
			.map_err(|e| {
				if e.is_not_found() {
					warn!(directory, error = %e, "Safety check could not reach repository");
					PublishError::SafetyCheck(e)
				} else {
					PublishError::Github(e)
				}
			})?;

		if !exists {
			warn!(directory, "Refusing to publish into missing directory");
			return Err(PublishError::DirectoryMissing {
				directory: directory.to_string(),
				branch: request.branch.clone(),
			});
		}

		Ok(())
	}
}
