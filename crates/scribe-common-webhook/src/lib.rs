// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HMAC-SHA256 helpers for webhook payloads.
//!
//! Signatures are lowercase hex without any `sha256=` prefix; header parsing
//! belongs to the provider-specific crate.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &[u8]) -> HmacSha256 {
	HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size")
}

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn sign_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = keyed(secret);
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature. Malformed hex is simply a mismatch.
pub fn verify_hmac_sha256(secret: &[u8], payload: &[u8], signature_hex: &str) -> bool {
	let Ok(expected) = hex::decode(signature_hex.trim()) else {
		return false;
	};

	let mut mac = keyed(secret);
	mac.update(payload);
	mac.verify_slice(&expected).is_ok()
}
