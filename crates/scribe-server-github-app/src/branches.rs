// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::{debug, instrument};

use crate::client::{repo_path, ApiRequest, GithubAppClient};
use crate::error::GithubAppError;
use crate::types::{BranchResponse, InstallationId};

/// GitHub's maximum page size for branch listings.
const BRANCHES_PER_PAGE: &str = "100";

impl GithubAppClient {
	/// Branch names in the order GitHub returns them.
	///
	/// Errors propagate unchanged so that "no access" stays distinguishable
	/// from a repository without branches.
	#[instrument(skip(self), fields(installation_id = %installation_id))]
	pub async fn list_branches(
		&self,
		owner: &str,
		repo: &str,
		installation_id: InstallationId,
	) -> Result<Vec<String>, GithubAppError> {
		let request = ApiRequest::get(format!("{}/branches", repo_path(owner, repo)))
			.with_query("per_page", BRANCHES_PER_PAGE);

		let branches: Vec<BranchResponse> = self
			.request(installation_id, request)
			.await?
			.unwrap_or_default();

		debug!(count = branches.len(), "Listed branches");
		Ok(branches.into_iter().map(|b| b.name).collect())
	}
}
