//! Title recovery from free-form model output.
//!
//! Matchers run in priority order and the first one that captures a non-empty
//! title wins. Recognising a new title format means appending a matcher.

use once_cell::sync::Lazy;
use regex::Regex;

pub struct TitleMatcher {
    pub name: &'static str,
    regex: Regex,
}

impl TitleMatcher {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("title pattern must compile"),
        }
    }

    /// Cleaned capture group 1 of the first match that is not empty after cleanup.
    pub fn capture(&self, text: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| clean_title(m.as_str()))
            .find(|s| !s.is_empty())
    }
}

/// Strip markdown emphasis and surrounding whitespace. Path separators become
/// spaces so a title never names a directory.
fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .replace(['/', '\\'], " ")
        .trim()
        .to_string()
}

static MATCHERS: Lazy<Vec<TitleMatcher>> = Lazy::new(|| {
    vec![
        // Ad 3: "Summer Sale Teaser"
        TitleMatcher::new("ad-label", r#"Ad (?:.*?):\s*["“]([^"”\n]+)["”]"#),
        // Video Title: "Summer Sale Teaser"
        TitleMatcher::new("video-title", r#"Video Title:\s*["“]([^"”\n]+)["”]"#),
        // Title: Summer Sale Teaser, optionally quoted or wrapped in markdown emphasis
        TitleMatcher::new(
            "title-line",
            r#"(?m)^[ \t]*(?:[#>*-]+[ \t]*)*(?:Title|title|TITLE)(?:\*\*)?:(?:\*\*)?[ \t]*["“]?([^"”\n]*)["”]?"#,
        ),
    ]
});

pub fn matchers() -> &'static [TitleMatcher] {
    &MATCHERS
}

/// Extract a title from `response`, or `None` when no known pattern matches.
pub fn extract_title(response: &str) -> Option<String> {
    matchers().iter().find_map(|m| {
        let title = m.capture(response)?;
        tracing::debug!(matcher = m.name, title = %title, "title found");
        Some(title)
    })
}
