// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server settings from the environment.

use std::fmt;
use std::str::FromStr;

use scribe_common_config::{parse_env, EnvError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const SETTINGS_PAGE: &str = "/dashboard/settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" | "text" => Ok(Self::Pretty),
			"json" => Ok(Self::Json),
			other => Err(format!("unknown log format '{other}' (expected 'pretty' or 'json')")),
		}
	}
}

impl fmt::Display for LogFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pretty => f.write_str("pretty"),
			Self::Json => f.write_str("json"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	pub log_level: String,
	pub log_format: LogFormat,
	/// Origin of the dashboard, used for redirects after the install
	/// callback. Relative redirects when unset.
	pub public_url: Option<String>,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.to_string(),
			port: DEFAULT_PORT,
			log_level: DEFAULT_LOG_LEVEL.to_string(),
			log_format: LogFormat::default(),
			public_url: None,
		}
	}
}

impl ServerConfig {
	/// Read `SCRIBE_SERVER_HOST`, `SCRIBE_SERVER_PORT`, `SCRIBE_LOG_LEVEL`,
	/// `SCRIBE_LOG_FORMAT` and `SCRIBE_PUBLIC_URL`.
	pub fn from_env() -> Result<Self, EnvError> {
		let defaults = Self::default();
		Ok(Self {
			host: parse_env("SCRIBE_SERVER_HOST")?.unwrap_or(defaults.host),
			port: parse_env("SCRIBE_SERVER_PORT")?.unwrap_or(defaults.port),
			log_level: parse_env("SCRIBE_LOG_LEVEL")?.unwrap_or(defaults.log_level),
			log_format: parse_env("SCRIBE_LOG_FORMAT")?.unwrap_or(defaults.log_format),
			public_url: parse_env::<String>("SCRIBE_PUBLIC_URL")?
				.map(|url| url.trim_end_matches('/').to_string()),
		})
	}

	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	/// Settings page URL carrying a status banner.
	pub fn settings_redirect(&self, status: &str, message: &str) -> String {
		format!(
			"{}{SETTINGS_PAGE}?status={}&message={}",
			self.public_url.as_deref().unwrap_or_default(),
			urlencoding::encode(status),
			urlencoding::encode(message)
		)
	}
}
