//! Snippet models, caller-facing drafts, and the legacy name-based row.

use super::MetaRef;
use crate::text::split_label_list;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Canonical snippet record owned by the repository.
///
/// Category and labels are held by id only; the metadata store owns the
/// referenced records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snippet {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub label_ids: BTreeSet<Uuid>,
    pub prompt_text: String,
    #[serde(default)]
    pub exclusive: bool,
    pub created_at: DateTime<Utc>,
}

impl Snippet {
    /// Returns `true` when this snippet references `label_id`.
    pub fn has_label(&self, label_id: &Uuid) -> bool {
        self.label_ids.contains(label_id)
    }
}

/// Unvalidated input for creating or replacing a snippet.
///
/// Category and labels may be given by id or by display name; names are
/// resolved (and created on miss) by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetDraft {
    pub name: String,
    pub category: MetaRef,
    pub labels: Vec<MetaRef>,
    pub prompt_text: String,
    pub exclusive: bool,
}

impl SnippetDraft {
    /// Start a draft with no labels that is not exclusive.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<MetaRef>,
        prompt_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            labels: Vec::new(),
            prompt_text: prompt_text.into(),
            exclusive: false,
        }
    }

    /// Add labels from a comma-separated list such as `"formal, short"`.
    pub fn with_labels_csv(mut self, input: &str) -> Self {
        self.labels
            .extend(split_label_list(input).into_iter().map(MetaRef::Name));
        self
    }

    /// Add labels by reference.
    pub fn with_labels<I, R>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<MetaRef>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Build a draft that reproduces an existing snippet.
    pub fn from_snippet(snippet: &Snippet) -> Self {
        Self {
            name: snippet.name.clone(),
            category: MetaRef::Id(snippet.category_id),
            labels: snippet.label_ids.iter().copied().map(MetaRef::Id).collect(),
            prompt_text: snippet.prompt_text.clone(),
            exclusive: snippet.exclusive,
        }
    }
}

/// Snippet row as written by earlier releases, with names instead of ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacySnippetRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub prompt_text: String,
    #[serde(default)]
    pub exclusive: bool,
}

impl LegacySnippetRecord {
    /// Convert to a draft; label entries may themselves be comma lists.
    pub fn to_draft(&self) -> SnippetDraft {
        let mut draft = SnippetDraft::new(
            self.name.clone(),
            self.category.as_str(),
            self.prompt_text.clone(),
        )
        .exclusive(self.exclusive);
        for entry in &self.labels {
            draft = draft.with_labels_csv(entry);
        }
        draft
    }
}
