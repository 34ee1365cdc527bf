//! Merging one category or label into another across all snippets.

use super::MetadataStore;
use crate::error::AppError;
use crate::models::{MetadataKind, Snippet};
use crate::repository::SnippetRepository;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Outcome of a successful merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub kind: MetadataKind,
    pub source_id: Uuid,
    pub target_id: Uuid,
    /// Snippets whose references were rewritten.
    pub snippets_updated: usize,
}

fn rewrite_reference(
    snippet: &Snippet,
    kind: MetadataKind,
    source_id: Uuid,
    target_id: Uuid,
) -> Option<Snippet> {
    match kind {
        MetadataKind::Category => {
            if snippet.category_id != source_id {
                return None;
            }
            let mut updated = snippet.clone();
            updated.category_id = target_id;
            Some(updated)
        }
        MetadataKind::Label => {
            if !snippet.has_label(&source_id) {
                return None;
            }
            let mut updated = snippet.clone();
            updated.label_ids.remove(&source_id);
            // Set semantics: a snippet holding both ends up with one entry.
            updated.label_ids.insert(target_id);
            Some(updated)
        }
    }
}

impl MetadataStore {
    /// Reassign every reference to `source_id` onto `target_id`, then
    /// delete the source.
    ///
    /// All rewrites and the recount are staged against copies first; the
    /// store and repository only change once everything has validated.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] when source and target are the
    /// same id, and [`AppError::NotFound`] when either does not exist.
    pub fn merge(
        &mut self,
        repository: &mut SnippetRepository,
        source_id: Uuid,
        target_id: Uuid,
        kind: MetadataKind,
    ) -> Result<MergeReport, AppError> {
        if source_id == target_id {
            return Err(AppError::InvalidInput(format!(
                "cannot merge {} '{}' into itself",
                kind, source_id
            )));
        }
        if !self.contains(kind, &source_id) {
            return Err(AppError::not_found(kind, source_id));
        }
        if !self.contains(kind, &target_id) {
            return Err(AppError::not_found(kind, target_id));
        }

        let staged: HashMap<Uuid, Snippet> = repository
            .iter()
            .filter_map(|snippet| rewrite_reference(snippet, kind, source_id, target_id))
            .map(|snippet| (snippet.id, snippet))
            .collect();

        let mut next = self.clone();
        next.remove_unchecked(&source_id, kind);
        next.recompute_usage_counts(
            repository
                .iter()
                .map(|snippet| staged.get(&snippet.id).unwrap_or(snippet)),
        )?;

        let snippets_updated = staged.len();
        repository.apply_rewrites(staged.into_values());
        *self = next;

        info!(
            "Merged {} {} into {} ({} snippets updated)",
            kind, source_id, target_id, snippets_updated
        );
        Ok(MergeReport {
            kind,
            source_id,
            target_id,
            snippets_updated,
        })
    }
}
