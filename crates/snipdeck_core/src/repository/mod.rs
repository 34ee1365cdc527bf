//! Snippet collection with reference resolution and count upkeep.


use crate::constants::{CLONE_NAME_SUFFIX, PROMPT_DELIMITER};
use crate::error::{AppError, EntityKind};
use crate::metadata::{AffectedRefs, MetadataStore};
use crate::models::{LegacySnippetRecord, Snippet, SnippetDraft};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of [`SnippetRepository::import_legacy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    /// Rows whose id already existed (in the repository or earlier in the batch).
    pub skipped: usize,
}

/// Owner of every [`Snippet`], kept in collection order.
///
/// Collection order is creation order; it decides list and composition
/// order for front ends.
#[derive(Debug, Clone, Default)]
pub struct SnippetRepository {
    order: Vec<Uuid>,
    snippets: HashMap<Uuid, Snippet>,
}

/// Trimmed and checked text fields of a draft.
fn validate_fields(draft: &SnippetDraft) -> Result<(String, String), AppError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("snippet name is required".to_string()));
    }
    let prompt_text = draft.prompt_text.trim();
    if prompt_text.is_empty() {
        return Err(AppError::InvalidInput("prompt text is required".to_string()));
    }
    if prompt_text.contains(PROMPT_DELIMITER) {
        return Err(AppError::InvalidInput(format!(
            "prompt text must not contain '{}'",
            PROMPT_DELIMITER
        )));
    }
    Ok((name.to_string(), prompt_text.to_string()))
}

impl SnippetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records, ordered by creation time.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] on duplicate ids.
    pub fn from_snippets(snippets: Vec<Snippet>) -> Result<Self, AppError> {
        let mut repository = Self::new();
        for snippet in snippets {
            let id = snippet.id;
            if repository.snippets.insert(id, snippet).is_some() {
                return Err(AppError::InvalidInput(format!("duplicate snippet id '{}'", id)));
            }
            repository.order.push(id);
        }
        repository.sort_order();
        Ok(repository)
    }

    fn sort_order(&mut self) {
        let snippets = &self.snippets;
        self.order.sort_by(|a, b| {
            let left = snippets.get(a).map(|s| s.created_at);
            let right = snippets.get(b).map(|s| s.created_at);
            left.cmp(&right).then_with(|| a.cmp(b))
        });
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.snippets.contains_key(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Snippet> {
        self.snippets.get(id)
    }

    /// Snippets in collection order.
    pub fn iter(&self) -> impl Iterator<Item = &Snippet> + '_ {
        self.order.iter().filter_map(|id| self.snippets.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.order.iter().copied()
    }

    fn insert_draft(
        &mut self,
        metadata: &mut MetadataStore,
        draft: &SnippetDraft,
        id: Uuid,
    ) -> Result<Snippet, AppError> {
        let (name, prompt_text) = validate_fields(draft)?;
        let plan = metadata.plan_references(&draft.category, &draft.labels)?;
        let (category_id, label_ids) = metadata.commit_references(plan);

        let snippet = Snippet {
            id,
            name,
            category_id,
            label_ids,
            prompt_text,
            exclusive: draft.exclusive,
            created_at: Utc::now(),
        };
        self.snippets.insert(id, snippet.clone());
        self.order.push(id);
        metadata.refresh_counts_for(&AffectedRefs::of(&snippet), self.iter());
        debug!("Created snippet '{}' ({})", snippet.name, id);
        Ok(snippet)
    }

    /// Validate a draft, resolve its references, and append it.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] for blank fields, a `;` in the
    /// prompt text, or bad metadata names, and
    /// [`AppError::DanglingReference`] for unknown metadata ids. No state
    /// changes on error.
    pub fn create(
        &mut self,
        metadata: &mut MetadataStore,
        draft: SnippetDraft,
    ) -> Result<Snippet, AppError> {
        self.insert_draft(metadata, &draft, Uuid::new_v4())
    }

    /// Replace the editable fields of an existing snippet.
    ///
    /// Identity, creation time, and collection position are preserved.
    /// Only the categories and labels that actually changed are recounted.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids, otherwise as
    /// [`Self::create`].
    pub fn update(
        &mut self,
        metadata: &mut MetadataStore,
        id: &Uuid,
        draft: SnippetDraft,
    ) -> Result<Snippet, AppError> {
        let old = self
            .snippets
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(EntityKind::Snippet, id))?;
        let (name, prompt_text) = validate_fields(&draft)?;
        let plan = metadata.plan_references(&draft.category, &draft.labels)?;
        let (category_id, label_ids) = metadata.commit_references(plan);

        let updated = Snippet {
            name,
            category_id,
            label_ids,
            prompt_text,
            exclusive: draft.exclusive,
            ..old.clone()
        };
        let affected = AffectedRefs::between(&old, &updated);
        self.snippets.insert(*id, updated.clone());
        metadata.refresh_counts_for(&affected, self.iter());
        debug!("Updated snippet '{}' ({})", updated.name, id);
        Ok(updated)
    }

    /// Remove snippets by id, ignoring ids that do not exist.
    ///
    /// # Returns
    /// The number of snippets actually removed.
    pub fn delete(&mut self, metadata: &mut MetadataStore, ids: &[Uuid]) -> usize {
        let mut affected = AffectedRefs::default();
        let mut removed = BTreeSet::new();
        for id in ids {
            if let Some(snippet) = self.snippets.remove(id) {
                affected.extend(AffectedRefs::of(&snippet));
                removed.insert(*id);
            }
        }
        if removed.is_empty() {
            return 0;
        }
        self.order.retain(|id| !removed.contains(id));
        metadata.refresh_counts_for(&affected, self.iter());
        debug!("Deleted {} snippet(s)", removed.len());
        removed.len()
    }

    /// Copy a snippet under a new id with ` (Copy)` appended to its name.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids.
    pub fn clone_snippet(
        &mut self,
        metadata: &mut MetadataStore,
        id: &Uuid,
    ) -> Result<Snippet, AppError> {
        let source = self
            .snippets
            .get(id)
            .ok_or_else(|| AppError::not_found(EntityKind::Snippet, id))?;
        let mut draft = SnippetDraft::from_snippet(source);
        draft.name.push_str(CLONE_NAME_SUFFIX);
        self.insert_draft(metadata, &draft, Uuid::new_v4())
    }

    /// Import rows from the name-based format used by earlier releases.
    ///
    /// Rows whose id already exists are skipped. The import is atomic:
    /// any invalid row aborts it and leaves both stores untouched.
    ///
    /// # Errors
    /// Propagates the first row validation failure.
    pub fn import_legacy(
        &mut self,
        metadata: &mut MetadataStore,
        records: &[LegacySnippetRecord],
    ) -> Result<ImportReport, AppError> {
        let mut next_repository = self.clone();
        let mut next_metadata = metadata.clone();
        let mut report = ImportReport::default();

        for (index, record) in records.iter().enumerate() {
            let parsed_id = record.id.as_deref().and_then(|raw| match Uuid::parse_str(raw.trim()) {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("Legacy row {} has non-uuid id '{}'; assigning a new one", index, raw);
                    None
                }
            });
            let id = match parsed_id {
                Some(id) if next_repository.contains(&id) => {
                    report.skipped += 1;
                    continue;
                }
                Some(id) => id,
                None => Uuid::new_v4(),
            };
            next_repository
                .insert_draft(&mut next_metadata, &record.to_draft(), id)
                .map_err(|err| match err {
                    AppError::InvalidInput(message) => {
                        AppError::InvalidInput(format!("legacy row {}: {}", index, message))
                    }
                    other => other,
                })?;
            report.imported += 1;
        }
        next_metadata.recompute_usage_counts(next_repository.iter())?;

        *self = next_repository;
        *metadata = next_metadata;
        info!(
            "Imported {} legacy snippet(s), skipped {}",
            report.imported, report.skipped
        );
        Ok(report)
    }

    /// Replace snippets with pre-validated rewrites; ids not present are ignored.
    pub(crate) fn apply_rewrites<I>(&mut self, rewrites: I)
    where
        I: IntoIterator<Item = Snippet>,
    {
        for snippet in rewrites {
            if let Some(slot) = self.snippets.get_mut(&snippet.id) {
                *slot = snippet;
            }
        }
    }
}
