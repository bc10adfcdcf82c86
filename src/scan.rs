//! Line scanning helpers shared by every probe parser
//!
//! Probes emit `label: value` lines. A pattern captures the value in group 1;
//! trailing whitespace and carriage returns are trimmed from the capture.

use regex::Regex;

/// Build a case-insensitive pattern. Patterns are compile-time constants,
/// so a bad one is a programming error caught by the tests.
pub(crate) fn pattern(re: &str) -> Regex {
    Regex::new(&format!("(?i){}", re)).unwrap_or_else(|e| panic!("invalid pattern {:?}: {}", re, e))
}

/// Value captured by `re` on a single line, if it matches.
pub fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().to_string())
}

/// First value captured by `re` across all lines. Later matches are ignored.
pub fn first_capture(re: &Regex, text: &str) -> Option<String> {
    text.lines().find_map(|line| capture(re, line))
}

/// Keep the first value seen for a field.
pub(crate) fn keep_first(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}
