// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Publishing posts from Scribe into a user's GitHub repository.
//!
//! Builds on [`scribe_server_github_app`]: this crate knows about users, their
//! repository settings, where posts and images live in the repository and how
//! a post is rendered. Failures are reported as a [`PublishOutcome`] carrying
//! a [`FailureReason`] the dashboard can act on.

pub mod error;
pub mod layout;
pub mod lifecycle;
pub mod markdown;
pub mod service;
pub mod settings;

pub use error::{FailureReason, PublishFailure, StoreError, WorkflowError};
pub use layout::{sanitize_file_name, sanitize_slug, PublishLayout};
pub use lifecycle::{InstallationLifecycle, WebhookOutcome};
pub use markdown::render_post;
pub use service::{ImageUpload, PostDraft, PublishOutcome, PublishService, PublishedPost};
pub use settings::{GithubSettings, InMemorySettingsStore, RepositoryTarget, SettingsStore};
