// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use scribe_server_github_app::GithubAppClient;
use scribe_server_publish::{InstallationLifecycle, PublishService, SettingsStore};

use crate::config::ServerConfig;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
	pub github: GithubAppClient,
	pub publisher: PublishService,
	pub lifecycle: InstallationLifecycle,
	pub config: Arc<ServerConfig>,
}

pub fn create_app_state(
	github: GithubAppClient,
	settings: Arc<dyn SettingsStore>,
	config: ServerConfig,
) -> AppState {
	AppState {
		publisher: PublishService::new(github.clone(), Arc::clone(&settings)),
		lifecycle: InstallationLifecycle::new(github.clone(), settings),
		github,
		config: Arc::new(config),
	}
}
