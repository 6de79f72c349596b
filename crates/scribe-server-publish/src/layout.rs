// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Where published files land in the repository.

use chrono::{DateTime, Utc};

const FALLBACK_SLUG: &str = "post";
const FALLBACK_FILE_NAME: &str = "image";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishLayout {
	pub posts_dir: String,
	pub images_dir: String,
}

impl Default for PublishLayout {
	fn default() -> Self {
		Self {
			posts_dir: "posts".to_string(),
			images_dir: "images".to_string(),
		}
	}
}

impl PublishLayout {
	/// `posts/<slug>.md`
	pub fn post_path(&self, slug: &str) -> String {
		format!("{}/{}.md", self.posts_dir, sanitize_slug(slug))
	}

	/// `images/<unix-millis>-<file name>`, unique per upload instant.
	pub fn image_path(&self, file_name: &str, now: DateTime<Utc>) -> String {
		format!(
			"{}/{}-{}",
			self.images_dir,
			now.timestamp_millis(),
			sanitize_file_name(file_name)
		)
	}
}

/// Reduce a slug to `[a-z0-9._-]`, never empty and never containing `..`.
pub fn sanitize_slug(slug: &str) -> String {
	sanitize(slug, FALLBACK_SLUG)
}

/// Same rules as [`sanitize_slug`], applied to an uploaded file name.
pub fn sanitize_file_name(file_name: &str) -> String {
	sanitize(file_name, FALLBACK_FILE_NAME)
}

fn sanitize(input: &str, fallback: &str) -> String {
	let mut out = String::with_capacity(input.len());

	for c in input.chars().flat_map(char::to_lowercase) {
		let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
			c
		} else {
			'-'
		};
		match (c, out.chars().last()) {
			('-', Some('-')) | ('.', Some('.')) => {}
			_ => out.push(c),
		}
	}

	let trimmed = out.trim_matches(|c: char| c == '-' || c == '.');
	if trimmed.is_empty() {
		fallback.to_string()
	} else {
		trimmed.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn post_path_uses_posts_dir() {
		let layout = PublishLayout::default();
		assert_eq!(layout.post_path("hello-world"), "posts/hello-world.md");
		assert_eq!(layout.post_path("Hello World!"), "posts/hello-world.md");
	}

	#[test]
	fn image_path_is_timestamped() {
		let layout = PublishLayout::default();
		let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
		assert_eq!(
			layout.image_path("My Cover.WEBP", now),
			"images/1700000000123-my-cover.webp"
		);
	}

	#[test]
	fn traversal_and_empty_names_are_neutralised() {
		assert_eq!(sanitize_slug("../../etc/passwd"), "etc-passwd");
		assert_eq!(sanitize_file_name("a..b.png"), "a.b.png");
		assert_eq!(sanitize_slug(""), "post");
		assert_eq!(sanitize_slug("日本語"), "post");
		assert_eq!(sanitize_file_name("..."), "image");
	}

	#[test]
	fn custom_layout() {
		let layout = PublishLayout {
			posts_dir: "_posts".into(),
			images_dir: "assets/img".into(),
		};
		assert_eq!(layout.post_path("a"), "_posts/a.md");
		let now = DateTime::from_timestamp_millis(5).unwrap();
		assert_eq!(layout.image_path("x.png", now), "assets/img/5-x.png");
	}

	proptest! {
		#[test]
		fn prop_sanitized_names_are_safe(input in "\\PC{0,64}") {
			let slug = sanitize_slug(&input);
			prop_assert!(!slug.is_empty());
			prop_assert!(!slug.contains(".."));
			prop_assert!(!slug.starts_with('.') && !slug.starts_with('-'));
			prop_assert!(slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')));
		}

		#[test]
		fn prop_sanitizing_is_idempotent(input in "\\PC{0,64}") {
			let once = sanitize_file_name(&input);
			prop_assert_eq!(sanitize_file_name(&once), once);
		}
	}
}
