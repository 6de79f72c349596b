// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Environment variable loading.
//!
//! Secrets may be supplied inline (`VAR=value`) or as a mounted file
//! (`VAR_FILE=/run/secrets/value`). The file form wins when both are set.

use std::path::PathBuf;
use std::str::FromStr;
use std::{env, fs};

use scribe_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },

	#[error("required secret not found: set either {var} or {var}_FILE")]
	Missing { var: String },

	#[error("invalid value for {var}: {message}")]
	Invalid { var: String, message: String },
}

/// Load an optional secret from `VAR_FILE` or `VAR`.
///
/// A single trailing newline is stripped from file contents.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, EnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(EnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(path_str);
		let content = fs::read_to_string(&path).map_err(|source| EnvError::Io {
			path: path.clone(),
			source,
		})?;
		let value = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(value)));
	}

	Ok(env::var(var).ok().map(SecretString::new))
}

/// Like [`load_secret_env`] but absence is an error.
pub fn require_secret_env(var: &str) -> Result<SecretString, EnvError> {
	load_secret_env(var)?.ok_or_else(|| EnvError::Missing {
		var: var.to_string(),
	})
}

/// Parse an optional non-secret variable. Unset or empty yields `Ok(None)`.
pub fn parse_env<T>(var: &str) -> Result<Option<T>, EnvError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match env::var(var) {
		Ok(raw) if !raw.trim().is_empty() => {
			raw.trim().parse().map(Some).map_err(|e: T::Err| EnvError::Invalid {
				var: var.to_string(),
				message: e.to_string(),
			})
		}
		_ => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	// Every test uses its own variable names; the process environment is shared.

	#[test]
	fn unset_secret_is_none() {
		let var = "SCRIBE_TEST_SECRET_UNSET";
		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
		assert!(load_secret_env(var).unwrap().is_none());
	}

	#[test]
	fn inline_secret_is_loaded() {
		let var = "SCRIBE_TEST_SECRET_INLINE";
		env::set_var(var, "inline-value");
		assert_eq!(load_secret_env(var).unwrap().unwrap().expose(), "inline-value");
		env::remove_var(var);
	}

	#[test]
	fn file_secret_wins_and_strips_one_newline() {
		let var = "SCRIBE_TEST_SECRET_FILE";
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();
		env::set_var(var, "inline-value");
		env::set_var(format!("{var}_FILE"), file.path());

		assert_eq!(load_secret_env(var).unwrap().unwrap().expose(), "from-file");

		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn empty_file_path_is_rejected() {
		let var = "SCRIBE_TEST_SECRET_EMPTY_PATH";
		env::set_var(format!("{var}_FILE"), "");
		assert!(matches!(
			load_secret_env(var).unwrap_err(),
			EnvError::EmptyPath { .. }
		));
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn missing_file_is_io_error() {
		let var = "SCRIBE_TEST_SECRET_MISSING_FILE";
		env::set_var(format!("{var}_FILE"), "/nonexistent/scribe/secret");
		assert!(matches!(load_secret_env(var).unwrap_err(), EnvError::Io { .. }));
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn require_reports_missing() {
		let var = "SCRIBE_TEST_SECRET_REQUIRED";
		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
		let err = require_secret_env(var).unwrap_err();
		assert!(err.to_string().contains("SCRIBE_TEST_SECRET_REQUIRED_FILE"));
	}

	#[test]
	fn parse_env_handles_unset_valid_and_invalid() {
		let var = "SCRIBE_TEST_PARSE_PORT";
		env::remove_var(var);
		assert_eq!(parse_env::<u16>(var).unwrap(), None);

		env::set_var(var, " 8080 ");
		assert_eq!(parse_env::<u16>(var).unwrap(), Some(8080));

		env::set_var(var, "eighty");
		assert!(matches!(
			parse_env::<u16>(var).unwrap_err(),
			EnvError::Invalid { .. }
		));
		env::remove_var(var);
	}
}
