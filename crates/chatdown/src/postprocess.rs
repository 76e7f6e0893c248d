//! Final cleanup of converted Markdown.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank line pattern"));

/// Squash runs of three or more newlines to two and trim the ends.
pub fn collapse_blank_lines(markdown: &str) -> String {
    BLANK_LINE_RUNS
        .replace_all(markdown, "\n\n")
        .trim()
        .to_string()
}

/// Drop lines that consist of a known UI string and nothing else.
pub fn strip_ui_artifacts(markdown: &str, artifacts: &[String]) -> String {
    markdown
        .split('\n')
        .filter(|line| {
            let line = line.trim();
            !artifacts.iter().any(|artifact| artifact == line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse blank lines, strip artifact lines, then collapse again so that
/// removed lines cannot leave a gap of three newlines behind.
pub fn finalize(markdown: &str, artifacts: &[String]) -> String {
    let collapsed = collapse_blank_lines(markdown);
    let stripped = strip_ui_artifacts(&collapsed, artifacts);
    collapse_blank_lines(&stripped)
}
