//! Data models for snippets and the metadata they reference.

/// Category records.
pub mod category;
/// Label records.
pub mod label;
/// Snippet records, drafts, and legacy import rows.
pub mod snippet;


use crate::error::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use category::Category;
pub use label::Label;
pub use snippet::{LegacySnippetRecord, Snippet, SnippetDraft};

/// The two metadata collections a snippet can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKind {
    Category,
    Label,
}

impl MetadataKind {
    /// Categories are single-valued, so commas are rejected in their names.
    pub fn is_category(self) -> bool {
        matches!(self, MetadataKind::Category)
    }
}

impl From<MetadataKind> for EntityKind {
    fn from(value: MetadataKind) -> Self {
        match value {
            MetadataKind::Category => EntityKind::Category,
            MetadataKind::Label => EntityKind::Label,
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        EntityKind::from(*self).fmt(f)
    }
}

/// Reference to a category or label as supplied by a caller.
///
/// Front ends usually hold display names; storage holds ids. Resolution
/// happens once, in the repository's create/update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaRef {
    Id(Uuid),
    Name(String),
}

impl From<Uuid> for MetaRef {
    fn from(value: Uuid) -> Self {
        MetaRef::Id(value)
    }
}

impl From<&str> for MetaRef {
    fn from(value: &str) -> Self {
        MetaRef::Name(value.to_string())
    }
}

impl From<String> for MetaRef {
    fn from(value: String) -> Self {
        MetaRef::Name(value)
    }
}
