//! Shared text normalization and matching helpers.

/// Split a comma-separated label list.
///
/// Entries are trimmed, blanks dropped, and case-insensitive duplicates
/// removed while keeping first-seen order.
pub fn split_label_list(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in input.split(',') {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        if out
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(trimmed))
        {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

/// Lowercase `value` and collapse every whitespace run into one `_`.
///
/// Leading and trailing whitespace is removed first, so the result never
/// starts or ends with an underscore produced from spacing.
pub fn underscore_whitespace(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Split a search string into lowercase terms on whitespace.
pub fn search_terms(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_lowercase).collect()
}

/// Case-insensitive substring test against an already-lowercased needle.
pub fn contains_case_insensitive(haystack: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    if needle_lower.is_ascii() {
        let needle = needle_lower.as_bytes();
        let hay = haystack.as_bytes();
        if needle.len() > hay.len() {
            return false;
        }
        return hay
            .windows(needle.len())
            .any(|window| window.iter().map(u8::to_ascii_lowercase).eq(needle.iter().copied()));
    }
    haystack.to_lowercase().contains(needle_lower)
}

/// Returns `true` for `#RGB` or `#RRGGBB` hex colors.
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|ch| ch.is_ascii_hexdigit())
}
