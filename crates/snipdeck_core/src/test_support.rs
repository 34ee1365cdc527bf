//! Shared test-only helpers for snipdeck_core.

use crate::metadata::MetadataStore;
use crate::models::{MetadataKind, Snippet, SnippetDraft};
use crate::repository::SnippetRepository;
use std::collections::HashMap;
use uuid::Uuid;

/// Three snippets over two categories and two labels:
///
/// | snippet   | category | labels |
/// |-----------|----------|--------|
/// | `first`   | writing  | formal |
/// | `second`  | writing  | casual |
/// | `third`   | coding   | formal |
pub(crate) struct Scenario {
    pub metadata: MetadataStore,
    pub snippets: SnippetRepository,
    pub first: Uuid,
    pub second: Uuid,
    pub third: Uuid,
}

impl Scenario {
    pub fn category(&self, name: &str) -> Uuid {
        self.metadata
            .find_by_name(MetadataKind::Category, name)
            .expect("scenario category")
    }

    pub fn label(&self, name: &str) -> Uuid {
        self.metadata
            .find_by_name(MetadataKind::Label, name)
            .expect("scenario label")
    }

    pub fn snippet(&self, id: &Uuid) -> &Snippet {
        self.snippets.get(id).expect("scenario snippet")
    }
}

/// Build the three-snippet scenario.
///
/// # Panics
/// Panics if any fixture snippet fails validation.
pub(crate) fn scenario() -> Scenario {
    let mut metadata = MetadataStore::default();
    let mut snippets = SnippetRepository::new();
    let mut add = |name: &str, category: &str, label: &str, prompt: &str| {
        snippets
            .create(
                &mut metadata,
                SnippetDraft::new(name, category, prompt).with_labels_csv(label),
            )
            .expect("fixture snippet")
            .id
    };
    let first = add("Formal greeting", "writing", "formal", "Open with a formal greeting");
    let second = add("Casual tone", "writing", "casual", "Keep the tone relaxed");
    let third = add("Typed errors", "coding", "formal", "Return typed errors");
    Scenario {
        metadata,
        snippets,
        first,
        second,
        third,
    }
}

/// Asserts stored usage counts equal counts derived from the snippets.
///
/// # Panics
/// Panics on any drift, or when a snippet references a missing entity.
pub(crate) fn assert_usage_counts_match_canonical(
    metadata: &MetadataStore,
    snippets: &SnippetRepository,
) {
    let mut category_counts: HashMap<Uuid, usize> = HashMap::new();
    let mut label_counts: HashMap<Uuid, usize> = HashMap::new();
    for snippet in snippets.iter() {
        *category_counts.entry(snippet.category_id).or_insert(0) += 1;
        for id in &snippet.label_ids {
            *label_counts.entry(*id).or_insert(0) += 1;
        }
    }

    for category in metadata.categories() {
        let expected = category_counts.remove(&category.id).unwrap_or(0);
        assert_eq!(
            category.usage_count, expected,
            "usage drift for category {}",
            category.name
        );
    }
    for label in metadata.labels() {
        let expected = label_counts.remove(&label.id).unwrap_or(0);
        assert_eq!(
            label.usage_count, expected,
            "usage drift for label {}",
            label.name
        );
    }
    assert!(
        category_counts.is_empty() && label_counts.is_empty(),
        "snippets must not reference missing metadata: {:?} {:?}",
        category_counts.keys().collect::<Vec<_>>(),
        label_counts.keys().collect::<Vec<_>>()
    );
}
