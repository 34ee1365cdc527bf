//! Joining selected prompt texts into one output string.

use crate::constants::EMPTY_COMPOSITION_TEXT;
use crate::models::Snippet;

/// Join the trimmed prompt texts of `snippets` with `separator`.
///
/// Empty prompts are skipped. Returns `None` when nothing is left to join.
pub fn compose<'a, I>(snippets: I, separator: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a Snippet>,
{
    let parts: Vec<&str> = snippets
        .into_iter()
        .map(|snippet| snippet.prompt_text.trim())
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(separator))
    }
}

/// Composition text for display, falling back to the empty placeholder.
pub fn preview_text(composition: Option<&str>) -> &str {
    composition.unwrap_or(EMPTY_COMPOSITION_TEXT)
}
