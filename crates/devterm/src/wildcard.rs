/// Minimal wildcard matcher for completion detection.
///
/// Exactly three pattern forms, checked in this order: a leading `*`
/// makes a suffix pattern, a trailing `*` a prefix pattern, anything
/// else an exact pattern. All comparisons are case-insensitive. Nothing
/// more is needed to recognize a sentinel prefix or an echoed input
/// line.
pub fn match_wildcard(input: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        return input.to_lowercase().ends_with(&suffix.to_lowercase());
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return input.to_lowercase().starts_with(&prefix.to_lowercase());
    }

    input.to_lowercase() == pattern.to_lowercase()
}
