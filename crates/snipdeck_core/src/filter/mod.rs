//! Filter criteria and the pure visible-id computation.


use crate::error::AppError;
use crate::metadata::MetadataStore;
use crate::models::{MetadataKind, Snippet};
use crate::repository::SnippetRepository;
use crate::text::{contains_case_insensitive, search_terms};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How an active label filter set is combined.
///
/// Categories are always OR-combined, since a snippet has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    #[default]
    And,
    Or,
}

impl LabelMode {
    pub fn toggled(self) -> Self {
        match self {
            LabelMode::And => LabelMode::Or,
            LabelMode::Or => LabelMode::And,
        }
    }
}

impl fmt::Display for LabelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LabelMode::And => "AND",
            LabelMode::Or => "OR",
        })
    }
}

impl FromStr for LabelMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(LabelMode::And),
            "or" => Ok(LabelMode::Or),
            other => Err(AppError::InvalidInput(format!(
                "unknown label mode '{}' (expected 'and' or 'or')",
                other
            ))),
        }
    }
}

/// Layered filter state: category bubbles, label bubbles, search text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub categories: BTreeSet<Uuid>,
    pub labels: BTreeSet<Uuid>,
    pub label_mode: LabelMode,
    pub search: String,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories<I: IntoIterator<Item = Uuid>>(mut self, ids: I) -> Self {
        self.categories.extend(ids);
        self
    }

    pub fn with_labels<I: IntoIterator<Item = Uuid>>(mut self, ids: I) -> Self {
        self.labels.extend(ids);
        self
    }

    pub fn with_label_mode(mut self, mode: LabelMode) -> Self {
        self.label_mode = mode;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    fn has_search(&self) -> bool {
        !self.search.trim().is_empty()
    }

    /// True iff any criterion would exclude something.
    pub fn is_active(&self) -> bool {
        !self.categories.is_empty() || !self.labels.is_empty() || self.has_search()
    }

    /// Add `id` to the bubble set for `kind`, or remove it if present.
    ///
    /// # Returns
    /// `true` when the bubble is active after the call.
    pub fn toggle(&mut self, kind: MetadataKind, id: Uuid) -> bool {
        let set = self.set_mut(kind);
        if set.remove(&id) {
            false
        } else {
            set.insert(id);
            true
        }
    }

    fn set_mut(&mut self, kind: MetadataKind) -> &mut BTreeSet<Uuid> {
        match kind {
            MetadataKind::Category => &mut self.categories,
            MetadataKind::Label => &mut self.labels,
        }
    }

    /// Drop a deleted entity from the bubble sets.
    pub(crate) fn forget(&mut self, kind: MetadataKind, id: &Uuid) -> bool {
        self.set_mut(kind).remove(id)
    }

    /// Point an active bubble at a merge target.
    pub(crate) fn replace(&mut self, kind: MetadataKind, source: &Uuid, target: Uuid) {
        let set = self.set_mut(kind);
        if set.remove(source) {
            set.insert(target);
        }
    }

    /// Human-readable summary, e.g. `Text: 'x' + [OR] Categories: a, b OR Labels: c`.
    ///
    /// Returns `None` when no criterion is active. Unknown ids render as
    /// their raw uuid.
    pub fn describe(&self, metadata: &MetadataStore) -> Option<String> {
        let mut parts = Vec::new();
        if self.has_search() {
            parts.push(format!("Text: '{}'", self.search.trim()));
        }

        let names = |kind: MetadataKind, ids: &BTreeSet<Uuid>| {
            let mut names: Vec<String> = ids
                .iter()
                .map(|id| {
                    metadata
                        .name_of(kind, id)
                        .map(str::to_string)
                        .unwrap_or_else(|| id.to_string())
                })
                .collect();
            names.sort();
            names.join(", ")
        };
        let mut bubbles = Vec::new();
        if !self.categories.is_empty() {
            bubbles.push(format!(
                "Categories: {}",
                names(MetadataKind::Category, &self.categories)
            ));
        }
        if !self.labels.is_empty() {
            bubbles.push(format!("Labels: {}", names(MetadataKind::Label, &self.labels)));
        }
        if !bubbles.is_empty() {
            let mode = self.label_mode.to_string();
            parts.push(format!(
                "[{}] {}",
                mode,
                bubbles.join(&format!(" {} ", mode))
            ));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" + "))
        }
    }
}

fn category_matches(snippet: &Snippet, criteria: &FilterCriteria) -> bool {
    criteria.categories.is_empty() || criteria.categories.contains(&snippet.category_id)
}

fn label_matches(snippet: &Snippet, criteria: &FilterCriteria) -> bool {
    if criteria.labels.is_empty() {
        return true;
    }
    match criteria.label_mode {
        LabelMode::Or => !snippet.label_ids.is_disjoint(&criteria.labels),
        LabelMode::And => snippet.label_ids.is_superset(&criteria.labels),
    }
}

fn search_matches(snippet: &Snippet, terms: &[String], metadata: &MetadataStore) -> bool {
    if terms.is_empty() {
        return true;
    }
    let category_name = metadata
        .name_of(MetadataKind::Category, &snippet.category_id)
        .unwrap_or_default();
    let label_names: Vec<&str> = snippet
        .label_ids
        .iter()
        .filter_map(|id| metadata.name_of(MetadataKind::Label, id))
        .collect();

    terms.iter().all(|term| {
        contains_case_insensitive(&snippet.name, term)
            || contains_case_insensitive(&snippet.prompt_text, term)
            || contains_case_insensitive(category_name, term)
            || label_names
                .iter()
                .any(|name| contains_case_insensitive(name, term))
    })
}

/// Visible ids, in collection order.
///
/// Recomputed from scratch on every call; inactive criteria match
/// everything.
pub fn visible_ids_ordered(
    snippets: &SnippetRepository,
    metadata: &MetadataStore,
    criteria: &FilterCriteria,
) -> Vec<Uuid> {
    let terms = search_terms(&criteria.search);
    snippets
        .iter()
        .filter(|snippet| {
            category_matches(snippet, criteria)
                && label_matches(snippet, criteria)
                && search_matches(snippet, &terms, metadata)
        })
        .map(|snippet| snippet.id)
        .collect()
}

/// Visible ids as a set.
pub fn visible_ids(
    snippets: &SnippetRepository,
    metadata: &MetadataStore,
    criteria: &FilterCriteria,
) -> BTreeSet<Uuid> {
    visible_ids_ordered(snippets, metadata, criteria)
        .into_iter()
        .collect()
}

/// One filter bubble a renderer can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub id: Uuid,
    pub name: String,
    pub count: usize,
    pub active: bool,
}

/// Bubbles for every category and label referenced by at least one snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<FilterOption>,
    pub labels: Vec<FilterOption>,
}

/// Build bubbles in listing order, counting over the whole collection.
pub fn filter_options(
    snippets: &SnippetRepository,
    metadata: &MetadataStore,
    criteria: &FilterCriteria,
) -> FilterOptions {
    let mut category_counts: BTreeMap<Uuid, usize> = BTreeMap::new();
    let mut label_counts: BTreeMap<Uuid, usize> = BTreeMap::new();
    for snippet in snippets.iter() {
        *category_counts.entry(snippet.category_id).or_insert(0) += 1;
        for id in &snippet.label_ids {
            *label_counts.entry(*id).or_insert(0) += 1;
        }
    }

    let categories = metadata
        .categories()
        .into_iter()
        .filter_map(|category| {
            category_counts.get(&category.id).map(|count| FilterOption {
                id: category.id,
                name: category.name.clone(),
                count: *count,
                active: criteria.categories.contains(&category.id),
            })
        })
        .collect();
    let labels = metadata
        .labels()
        .into_iter()
        .filter_map(|label| {
            label_counts.get(&label.id).map(|count| FilterOption {
                id: label.id,
                name: label.name.clone(),
                count: *count,
                active: criteria.labels.contains(&label.id),
            })
        })
        .collect();
    FilterOptions { categories, labels }
}
