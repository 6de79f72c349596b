// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

/// Render a post as Markdown with YAML front matter.
///
/// ```text
/// ---
/// title: "<title>"
/// slug: "<slug>"
/// mainImage: "<path or empty>"
/// ---
///
/// <body>
/// ```
pub fn render_post(title: &str, slug: &str, main_image: Option<&str>, body: &str) -> String {
	format!(
		"---\ntitle: \"{}\"\nslug: \"{}\"\nmainImage: \"{}\"\n---\n\n{}",
		escape(title),
		escape(slug),
		escape(main_image.unwrap_or_default()),
		body
	)
}

/// Escape for a YAML double-quoted scalar.
fn escape(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'\\' => out.push_str("\\\\"),
			'"' => out.push_str("\\\""),
			'\n' => out.push_str("\\n"),
			'\r' => {}
			c => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_front_matter_then_body() {
		let post = render_post("Hello World", "hello-world", Some("/images/1-cover.webp"), "Body text");
		assert_eq!(
			post,
			"---\ntitle: \"Hello World\"\nslug: \"hello-world\"\nmainImage: \"/images/1-cover.webp\"\n---\n\nBody text"
		);
	}

	#[test]
	fn missing_image_is_empty_string() {
		let post = render_post("T", "t", None, "");
		assert!(post.contains("mainImage: \"\"\n"));
	}

	#[test]
	fn quotes_and_newlines_are_escaped() {
		let post = render_post("Say \"hi\"\nnow", "s", None, "b");
		assert!(post.starts_with("---\ntitle: \"Say \\\"hi\\\"\\nnow\"\n"));
	}
}
