// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Per-user GitHub settings and where they are kept.

use std::collections::HashMap;

use async_trait::async_trait;
use scribe_server_github_app::{InstallationId, DEFAULT_BRANCH};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{StoreError, WorkflowError};

fn default_branch() -> String {
	DEFAULT_BRANCH.to_string()
}

/// The repository a user publishes into and the installation that grants
/// access to it.
///
/// `installation_id` is kept as the string GitHub hands to the install
/// callback; it is parsed when a publish needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubSettings {
	#[serde(default)]
	pub owner: String,
	#[serde(default)]
	pub repo: String,
	#[serde(default = "default_branch")]
	pub branch: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub installation_id: Option<String>,
}

impl Default for GithubSettings {
	fn default() -> Self {
		Self {
			owner: String::new(),
			repo: String::new(),
			branch: default_branch(),
			installation_id: None,
		}
	}
}

/// Settings resolved into everything a commit needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
	pub owner: String,
	pub repo: String,
	pub branch: String,
	pub installation_id: InstallationId,
}

impl GithubSettings {
	pub fn is_connected(&self) -> bool {
		self
			.installation_id
			.as_deref()
			.is_some_and(|id| !id.trim().is_empty())
	}

	/// Resolve the target repository, failing with "not connected" when the
	/// app was never installed (or was uninstalled) and "incomplete" when the
	/// repository coordinates are missing.
	pub fn connection(&self) -> Result<RepositoryTarget, WorkflowError> {
		let installation_id = match self.installation_id.as_deref().map(str::trim) {
			Some(id) if !id.is_empty() => id.parse::<InstallationId>()?,
			_ => return Err(WorkflowError::NotConnected),
		};

		let owner = self.owner.trim();
		let repo = self.repo.trim();
		if owner.is_empty() || repo.is_empty() {
			return Err(WorkflowError::Incomplete);
		}

		let branch = match self.branch.trim() {
			"" => default_branch(),
			branch => branch.to_string(),
		};

		Ok(RepositoryTarget {
			owner: owner.to_string(),
			repo: repo.to_string(),
			branch,
			installation_id,
		})
	}
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
	async fn get(&self, user_id: &str) -> Result<Option<GithubSettings>, StoreError>;

	async fn save(&self, user_id: &str, settings: GithubSettings) -> Result<(), StoreError>;

	/// Record an installation for the user, creating their settings if needed.
	async fn set_installation(&self, user_id: &str, installation_id: &str)
		-> Result<(), StoreError>;

	/// Remove `installation_id` from every user holding it. Returns how many
	/// settings entries changed.
	async fn clear_installation(&self, installation_id: &str) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
	settings: RwLock<HashMap<String, GithubSettings>>,
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
	async fn get(&self, user_id: &str) -> Result<Option<GithubSettings>, StoreError> {
		Ok(self.settings.read().await.get(user_id).cloned())
	}

	async fn save(&self, user_id: &str, settings: GithubSettings) -> Result<(), StoreError> {
		self
			.settings
			.write()
			.await
			.insert(user_id.to_string(), settings);
		Ok(())
	}

	async fn set_installation(
		&self,
		user_id: &str,
		installation_id: &str,
	) -> Result<(), StoreError> {
		self
			.settings
			.write()
			.await
			.entry(user_id.to_string())
			.or_default()
			.installation_id = Some(installation_id.to_string());
		Ok(())
	}

	async fn clear_installation(&self, installation_id: &str) -> Result<usize, StoreError> {
		let mut settings = self.settings.write().await;
		let mut cleared = 0;
		for entry in settings.values_mut() {
			if entry.installation_id.as_deref() == Some(installation_id) {
				entry.installation_id = None;
				cleared += 1;
			}
		}
		Ok(cleared)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn connected() -> GithubSettings {
		GithubSettings {
			owner: "octo".into(),
			repo: "blog".into(),
			branch: "main".into(),
			installation_id: Some("42".into()),
		}
	}

	#[test]
	fn connection_resolves_target() {
		let target = connected().connection().unwrap();
		assert_eq!(target.owner, "octo");
		assert_eq!(target.repo, "blog");
		assert_eq!(target.branch, "main");
		assert_eq!(target.installation_id, InstallationId::new(42));
	}

	#[test]
	fn missing_installation_is_not_connected() {
		for installation_id in [None, Some(String::new()), Some("  ".into())] {
			let settings = GithubSettings {
				installation_id,
				..connected()
			};
			assert!(!settings.is_connected());
			assert!(matches!(settings.connection(), Err(WorkflowError::NotConnected)));
		}
	}

	#[test]
	fn blank_coordinates_are_incomplete() {
		let settings = GithubSettings {
			repo: " ".into(),
			..connected()
		};
		assert!(matches!(settings.connection(), Err(WorkflowError::Incomplete)));
	}

	#[test]
	fn blank_branch_falls_back_to_main() {
		let settings = GithubSettings {
			branch: String::new(),
			..connected()
		};
		assert_eq!(settings.connection().unwrap().branch, "main");
	}

	#[test]
	fn garbage_installation_id_is_rejected() {
		let settings = GithubSettings {
			installation_id: Some("abc".into()),
			..connected()
		};
		assert!(matches!(
			settings.connection(),
			Err(WorkflowError::InvalidInstallation(_))
		));
	}

	#[test]
	fn deserializes_with_defaults() {
		let settings: GithubSettings =
			serde_json::from_str(r#"{"owner": "octo", "repo": "blog"}"#).unwrap();
		assert_eq!(settings.branch, "main");
		assert!(settings.installation_id.is_none());
	}

	#[tokio::test]
	async fn set_installation_creates_and_merges() {
		let store = InMemorySettingsStore::default();

		store.set_installation("alice", "42").await.unwrap();
		let created = store.get("alice").await.unwrap().unwrap();
		assert_eq!(created.installation_id.as_deref(), Some("42"));
		assert_eq!(created.branch, "main");

		store
			.save(
				"bob",
				GithubSettings {
					installation_id: None,
					..connected()
				},
			)
			.await
			.unwrap();
		store.set_installation("bob", "43").await.unwrap();
		let merged = store.get("bob").await.unwrap().unwrap();
		assert_eq!(merged.owner, "octo");
		assert_eq!(merged.installation_id.as_deref(), Some("43"));
	}

	#[tokio::test]
	async fn clear_installation_touches_only_matching_users() {
		let store = InMemorySettingsStore::default();
		store.save("alice", connected()).await.unwrap();
		store.save("carol", connected()).await.unwrap();
		store.set_installation("bob", "99").await.unwrap();

		assert_eq!(store.clear_installation("42").await.unwrap(), 2);
		assert!(!store.get("alice").await.unwrap().unwrap().is_connected());
		assert!(store.get("bob").await.unwrap().unwrap().is_connected());
		assert_eq!(store.clear_installation("42").await.unwrap(), 0);
	}
}
