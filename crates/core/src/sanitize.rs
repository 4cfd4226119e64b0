//! Filesystem-safe, collision-free brief names.
//!
//! Allowed characters: alphanumerics, space, hyphen, underscore and
//! parentheses. Everything else becomes a space, whitespace runs collapse to one
//! space and leading/trailing separators are trimmed.

use std::path::Path;

/// Base names are cut to this many bytes, leaving room for a discriminator and
/// extension under the common 255-byte file name limit.
pub const MAX_BASE_BYTES: usize = 200;

const PLACEHOLDER_PREFIX: &str = "brief";

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '(' | ')')
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '-' | '_')
}

/// Reduce `raw` to the allow-list. May return an empty string.
pub fn clean_base(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated = truncate_bytes(&collapsed, MAX_BASE_BYTES);

    truncated.trim_matches(is_separator).to_string()
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Pick the base name for a brief: the cleaned title, else the cleaned video
/// name, else a generated placeholder. Never empty.
pub fn choose_base(title: Option<&str>, fallback_base: &str) -> String {
    let from_title = title.map(clean_base).filter(|s| !s.is_empty());
    from_title
        .or_else(|| Some(clean_base(fallback_base)).filter(|s| !s.is_empty()))
        .unwrap_or_else(placeholder_base)
}

fn placeholder_base() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", PLACEHOLDER_PREFIX, &id[..8])
}

/// `base.ext` for discriminator 1, `base (n).ext` afterwards.
pub fn numbered_name(base: &str, extension: &str, n: u32) -> String {
    let extension = extension.trim_start_matches('.');
    let stem = if n <= 1 {
        base.to_string()
    } else {
        format!("{} ({})", base, n)
    };

    if extension.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, extension)
    }
}

/// First `numbered_name` that does not exist in `dir` at call time.
///
/// This is a plain existence check; [`crate::artifact::write_brief`] claims the
/// name atomically when writing.
pub fn sanitize(title: Option<&str>, fallback_base: &str, extension: &str, dir: &Path) -> String {
    let base = choose_base(title, fallback_base);
    (1..)
        .map(|n| numbered_name(&base, extension, n))
        .find(|name| !dir.join(name).exists())
        .unwrap_or_else(|| numbered_name(&placeholder_base(), extension, 1))
}
