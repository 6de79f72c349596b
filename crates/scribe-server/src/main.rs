// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Scribe server binary.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scribe_server::{cors_layer, create_app_state, create_router, LogFormat, ServerConfig};
use scribe_server_github_app::{GithubAppClient, GithubAppConfig};
use scribe_server_publish::InMemorySettingsStore;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Scribe server - publishes posts to GitHub through the Scribe GitHub App.
#[derive(Parser, Debug)]
#[command(name = "scribe-server", about = "Scribe publishing server", version)]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server (default)
	Serve,
	/// Show version information
	Version,
}

fn init_tracing(config: &ServerConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
	let registry = tracing_subscriber::registry().with(filter);

	match config.log_format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("scribe-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = ServerConfig::from_env().context("invalid server configuration")?;
	init_tracing(&config);

	let github_config = GithubAppConfig::from_env().context("invalid GitHub App configuration")?;
	if let Err(e) = github_config.validate() {
		tracing::warn!(error = %e, "GitHub App credentials unusable; publishing will fail until configured");
	}
	if github_config.webhook_secret().is_none() {
		tracing::warn!("GitHub App webhook secret not set; webhooks will be rejected");
	}

	let github = GithubAppClient::new(github_config)?;
	// TODO: back settings with a database; installs are lost on restart.
	let settings = Arc::new(InMemorySettingsStore::default());
	let addr = config.socket_addr();

	tracing::info!(
		addr = %addr,
		log_format = %config.log_format,
		"starting scribe-server"
	);

	let cors = cors_layer(&config);
	let state = create_app_state(github, settings, config);
	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(cors);

	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;
	tracing::info!("listening on {}", addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "failed to listen for shutdown signal");
			}
			tracing::info!("Received shutdown signal");
		})
		.await?;

	tracing::info!("Server shutdown complete");
	Ok(())
}
