// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by the Scribe server crates.
//!
//! - [`Secret`] / [`SecretString`], re-exported from `scribe-common-secret`
//! - [`load_secret_env`] / [`require_secret_env`] for the `VAR` / `VAR_FILE`
//!   convention
//! - [`parse_env`] for typed, optional, non-secret variables

pub mod env;

pub use scribe_common_secret::{Secret, SecretString, REDACTED};

pub use env::{load_secret_env, parse_env, require_secret_env, EnvError};
