// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Time source for assertion issuance and token expiry.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Manually advanced clock for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct ManualClock {
	now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self {
			now: std::sync::Mutex::new(start),
		}
	}

	pub fn advance(&self, by: chrono::Duration) {
		let mut now = self.now.lock().unwrap();
		*now += by;
	}
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		*self.now.lock().unwrap()
	}
}
