//! Shared constants used across snipdeck crates.

/// Sort order given to categories created without an explicit one.
pub const DEFAULT_CATEGORY_SORT_ORDER: i32 = 5;

/// Separator placed between prompt texts when composing.
pub const DEFAULT_COMPOSE_SEPARATOR: &str = "; ";

/// Character reserved as the composition delimiter inside prompt text.
pub const PROMPT_DELIMITER: char = ';';

/// Text a renderer shows when nothing is selected for composition.
pub const EMPTY_COMPOSITION_TEXT: &str = "No Snippets Selected";

/// Suffix appended to the name of a cloned snippet.
pub const CLONE_NAME_SUFFIX: &str = " (Copy)";

/// Placeholder names used when adopting orphaned references.
pub const ORPHAN_CATEGORY_NAME: &str = "unknown_category";
/// Placeholder label name used when adopting orphaned references.
pub const ORPHAN_LABEL_NAME: &str = "unknown_label";

/// Snippet document file name inside the data directory.
pub const SNIPPETS_FILE_NAME: &str = "snippets.json";
/// Metadata document file name inside the data directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";
/// Name-based rows copied in when a data directory has no snippets yet.
pub const SAMPLE_SNIPPETS_FILE_NAME: &str = "sample_snippets.json";
/// Writer lock held for the lifetime of a JSON store.
pub const STORE_LOCK_FILE_NAME: &str = "snipdeck.lock";
