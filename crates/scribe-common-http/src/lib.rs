// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction.
//!
//! Every outbound client gets the Scribe `User-Agent` (GitHub rejects requests
//! without one) and a finite timeout.

mod client;

pub use client::{builder, new_client, user_agent, DEFAULT_TIMEOUT};
