//! Download filename for an export.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest base name kept, in characters
pub const MAX_BASE_LEN: usize = 100;

/// Base name used when the title yields nothing usable
pub const FALLBACK_BASE: &str = "google-ai-conversation";

static UNSAFE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s/\\:*?"<>|]+"#).expect("valid filename pattern"));

/// `{sanitized title}.md`, or the fallback name when the title is missing
/// or sanitizes to nothing. A title already ending in `.md` keeps it.
///
/// Whitespace and characters that are unsafe in file names collapse to
/// single hyphens; the base is capped at [`MAX_BASE_LEN`] characters.
pub fn suggested_filename(title: Option<&str>) -> String {
    let base = title
        .map(sanitize_base)
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| FALLBACK_BASE.to_string());
    if base.ends_with(".md") {
        base
    } else {
        format!("{base}.md")
    }
}

fn sanitize_base(title: &str) -> String {
    let hyphenated = UNSAFE_RUNS.replace_all(title.trim(), "-");
    let truncated: String = hyphenated
        .trim_matches('-')
        .chars()
        .take(MAX_BASE_LEN)
        .collect();
    truncated.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_characters() {
        assert_eq!(
            suggested_filename(Some("What is a <Box>? / Rust: \"ownership\"")),
            "What-is-a-Box-Rust-ownership.md"
        );
    }

    #[test]
    fn test_fallback() {
        assert_eq!(suggested_filename(None), "google-ai-conversation.md");
        assert_eq!(suggested_filename(Some("  ")), "google-ai-conversation.md");
        assert_eq!(suggested_filename(Some("???")), "google-ai-conversation.md");
    }

    #[test]
    fn test_truncation_drops_trailing_hyphen() {
        let title = format!("{} tail", "a".repeat(99));
        let name = suggested_filename(Some(&title));
        assert_eq!(name, format!("{}.md", "a".repeat(99)));

        let long = "word ".repeat(50);
        let name = suggested_filename(Some(&long));
        let base = name.strip_suffix(".md").unwrap();
        assert!(base.chars().count() <= MAX_BASE_LEN);
        assert!(!base.ends_with('-'));
    }

    #[test]
    fn test_existing_extension_kept() {
        assert_eq!(suggested_filename(Some("release notes.md")), "release-notes.md");
    }

    #[test]
    fn test_unicode_kept() {
        assert_eq!(suggested_filename(Some("Café & résumé")), "Café-&-résumé.md");
    }
}
