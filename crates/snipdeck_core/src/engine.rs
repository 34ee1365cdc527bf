//! Engine facade: one owner for metadata, snippets, and selection.
//!
//! Every state transition is a `&mut self` method that runs to
//! completion and refreshes the cached filter output before returning.
//! Front ends call [`SnippetEngine::render_state`] afterwards.

use crate::compose::compose;
use crate::config::Config;
use crate::error::{AppError, EntityKind};
use crate::filter::{self, FilterCriteria, FilterOptions, LabelMode};
use crate::metadata::{CleanupReport, MergeReport, MetadataStore};
use crate::models::{LegacySnippetRecord, MetadataKind, Snippet, SnippetDraft};
use crate::repository::{ImportReport, SnippetRepository};
use crate::selection::{FilterInput, SelectionState, SelectionStateManager};
use crate::store::{Snapshot, SnippetStore};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};
use uuid::Uuid;

/// Immutable snapshot handed to a renderer after each transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderState {
    /// Visible snippets in collection order.
    pub visible_ids: Vec<Uuid>,
    pub selected_ids: BTreeSet<Uuid>,
    /// `selected ∩ visible` when filtered, else `selected`.
    pub highlighted_ids: BTreeSet<Uuid>,
    pub is_filtered: bool,
    pub filter_description: Option<String>,
}

#[derive(Debug)]
pub struct SnippetEngine {
    config: Config,
    metadata: MetadataStore,
    snippets: SnippetRepository,
    selection: SelectionStateManager,
}

impl SnippetEngine {
    /// Empty engine.
    pub fn new(config: Config) -> Self {
        let metadata = MetadataStore::new(config.default_sort_order);
        let snippets = SnippetRepository::new();
        Self::assemble(config, metadata, snippets)
    }

    fn assemble(config: Config, metadata: MetadataStore, snippets: SnippetRepository) -> Self {
        let selection = SelectionStateManager::new(
            config.default_label_mode,
            FilterInput {
                snippets: &snippets,
                metadata: &metadata,
            },
        );
        Self {
            config,
            metadata,
            snippets,
            selection,
        }
    }

    /// Build from persisted records, validating every reference.
    ///
    /// Usage counts are recomputed; persisted counts that disagree are
    /// corrected with a warning.
    ///
    /// # Errors
    /// Returns [`AppError::DanglingReference`] when a snippet references a
    /// missing category or label, and [`AppError::InvalidInput`] for
    /// duplicate ids or malformed names.
    pub fn from_snapshot(config: Config, snapshot: Snapshot) -> Result<Self, AppError> {
        let persisted = persisted_counts(&snapshot);
        let metadata = MetadataStore::from_parts(
            snapshot.categories,
            snapshot.labels,
            config.default_sort_order,
        )?;
        let (engine, _) = Self::restore(config, metadata, snapshot.snippets, &persisted)?;
        Ok(engine)
    }

    /// Like [`Self::from_snapshot`], but first creates placeholder
    /// entities for any orphaned category or label ids.
    ///
    /// # Returns
    /// The engine plus `(categories_adopted, labels_adopted)`.
    ///
    /// # Errors
    /// As [`Self::from_snapshot`], minus dangling references.
    pub fn from_snapshot_adopting_orphans(
        config: Config,
        snapshot: Snapshot,
    ) -> Result<(Self, (usize, usize)), AppError> {
        let persisted = persisted_counts(&snapshot);
        let mut metadata = MetadataStore::from_parts(
            snapshot.categories,
            snapshot.labels,
            config.default_sort_order,
        )?;
        let adopted = metadata.adopt_orphan_references(snapshot.snippets.iter());
        let (engine, _) = Self::restore(config, metadata, snapshot.snippets, &persisted)?;
        Ok((engine, adopted))
    }

    /// Recount against `snippets` and assemble.
    ///
    /// Only entities present in `persisted` take part in the drift check,
    /// so placeholders created during repair are not reported.
    ///
    /// # Returns
    /// The engine and the number of persisted counts that were corrected.
    fn restore(
        config: Config,
        mut metadata: MetadataStore,
        snippets: Vec<Snippet>,
        persisted: &HashMap<Uuid, usize>,
    ) -> Result<(Self, usize), AppError> {
        let snippets = SnippetRepository::from_snippets(snippets)?;
        metadata.recompute_usage_counts(snippets.iter())?;

        let drifted = metadata
            .categories()
            .iter()
            .map(|c| (c.id, c.usage_count))
            .chain(metadata.labels().iter().map(|l| (l.id, l.usage_count)))
            .filter(|(id, count)| persisted.get(id).is_some_and(|stored| stored != count))
            .count();
        if drifted > 0 {
            warn!("Corrected {} persisted usage count(s) on load", drifted);
        }

        Ok((Self::assemble(config, metadata, snippets), drifted))
    }

    /// Load through a persistence collaborator.
    ///
    /// When the store holds no snippets and offers first-run samples, they
    /// are imported as legacy rows and saved straight back.
    ///
    /// # Errors
    /// Storage failures are returned unchanged; see [`Self::from_snapshot`].
    pub fn load<S: SnippetStore + ?Sized>(config: Config, store: &S) -> Result<Self, AppError> {
        let snapshot = store.load()?;
        let seed = if snapshot.snippets.is_empty() {
            store.first_run_samples()?
        } else {
            Vec::new()
        };
        let mut engine = Self::from_snapshot(config, snapshot)?;
        if !seed.is_empty() {
            let report = engine.import_legacy(&seed)?;
            engine.save(store)?;
            info!("Seeded {} sample snippet(s) on first run", report.imported);
        }
        info!(
            "Loaded {} snippets, {} categories, {} labels",
            engine.snippets.len(),
            engine.metadata.categories().len(),
            engine.metadata.labels().len()
        );
        Ok(engine)
    }

    /// Current collections as plain records.
    pub fn snapshot(&self) -> Snapshot {
        let (categories, labels) = self.metadata.to_parts();
        Snapshot {
            snippets: self.snippets.iter().cloned().collect(),
            categories,
            labels,
        }
    }

    /// # Errors
    /// Storage failures are returned unchanged; nothing is retried.
    pub fn save<S: SnippetStore + ?Sized>(&self, store: &S) -> Result<(), AppError> {
        store.save(&self.snapshot())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn snippets(&self) -> &SnippetRepository {
        &self.snippets
    }

    pub fn selection(&self) -> &SelectionStateManager {
        &self.selection
    }

    fn refresh(&mut self) {
        self.selection.refresh(FilterInput {
            snippets: &self.snippets,
            metadata: &self.metadata,
        });
    }

    /// Drop bubbles whose entity no longer exists.
    fn forget_missing_filters(&mut self) {
        let criteria = self.selection.criteria();
        let stale: Vec<(MetadataKind, Uuid)> = criteria
            .categories
            .iter()
            .map(|id| (MetadataKind::Category, *id))
            .chain(criteria.labels.iter().map(|id| (MetadataKind::Label, *id)))
            .filter(|(kind, id)| !self.metadata.contains(*kind, id))
            .collect();
        for (kind, id) in stale {
            self.selection.forget_metadata(kind, &id);
        }
    }

    fn require_snippet(&self, id: &Uuid) -> Result<&Snippet, AppError> {
        self.snippets
            .get(id)
            .ok_or_else(|| AppError::not_found(EntityKind::Snippet, id))
    }

    /// # Errors
    /// See [`SnippetRepository::create`].
    pub fn create_snippet(&mut self, draft: SnippetDraft) -> Result<Snippet, AppError> {
        let snippet = self.snippets.create(&mut self.metadata, draft)?;
        self.refresh();
        Ok(snippet)
    }

    /// Replace a snippet's fields, keeping selection exclusivity intact.
    ///
    /// # Errors
    /// See [`SnippetRepository::update`].
    pub fn update_snippet(&mut self, id: &Uuid, draft: SnippetDraft) -> Result<Snippet, AppError> {
        let snippet = self.snippets.update(&mut self.metadata, id, draft)?;
        if self.selection.reconcile_exclusive_flag(snippet.id, snippet.exclusive) {
            info!("Deselected {} after it became exclusive", snippet.id);
        }
        self.refresh();
        Ok(snippet)
    }

    /// Delete snippets and prune them from the selection.
    ///
    /// # Returns
    /// The number actually deleted.
    pub fn delete_snippets(&mut self, ids: &[Uuid]) -> usize {
        let removed = self.snippets.delete(&mut self.metadata, ids);
        self.selection.clear_selections(ids);
        self.refresh();
        removed
    }

    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids.
    pub fn clone_snippet(&mut self, id: &Uuid) -> Result<Snippet, AppError> {
        let snippet = self.snippets.clone_snippet(&mut self.metadata, id)?;
        self.refresh();
        Ok(snippet)
    }

    /// # Errors
    /// See [`SnippetRepository::import_legacy`].
    pub fn import_legacy(
        &mut self,
        records: &[LegacySnippetRecord],
    ) -> Result<ImportReport, AppError> {
        let report = self.snippets.import_legacy(&mut self.metadata, records)?;
        self.refresh();
        Ok(report)
    }

    /// # Errors
    /// See [`MetadataStore::create_category`].
    pub fn create_category(
        &mut self,
        name: &str,
        sort_order: Option<i32>,
        color: Option<String>,
    ) -> Result<Uuid, AppError> {
        self.metadata.create_category(name, sort_order, color)
    }

    /// # Errors
    /// See [`MetadataStore::create_label`].
    pub fn create_label(&mut self, name: &str) -> Result<Uuid, AppError> {
        self.metadata.create_label(name)
    }

    /// # Errors
    /// See [`MetadataStore::rename`].
    pub fn rename_metadata(
        &mut self,
        id: &Uuid,
        new_name: &str,
        kind: MetadataKind,
    ) -> Result<(), AppError> {
        self.metadata.rename(id, new_name, kind)?;
        // Search matches category and label names.
        self.refresh();
        Ok(())
    }

    /// # Errors
    /// See [`MetadataStore::update_category_style`].
    pub fn update_category_style(
        &mut self,
        id: &Uuid,
        sort_order: Option<i32>,
        color: Option<String>,
    ) -> Result<(), AppError> {
        self.metadata.update_category_style(id, sort_order, color)
    }

    /// Delete an unused category or label and drop it from the filters.
    ///
    /// # Errors
    /// See [`MetadataStore::delete`].
    pub fn delete_metadata(&mut self, id: &Uuid, kind: MetadataKind) -> Result<(), AppError> {
        self.metadata.delete(id, kind)?;
        self.selection.forget_metadata(kind, id);
        self.refresh();
        Ok(())
    }

    /// Merge `source_id` into `target_id`; active filters follow the merge.
    ///
    /// # Errors
    /// See [`MetadataStore::merge`].
    pub fn merge_metadata(
        &mut self,
        source_id: Uuid,
        target_id: Uuid,
        kind: MetadataKind,
    ) -> Result<MergeReport, AppError> {
        let report = self
            .metadata
            .merge(&mut self.snippets, source_id, target_id, kind)?;
        self.selection.retarget_metadata(kind, &source_id, target_id);
        self.refresh();
        Ok(report)
    }

    pub fn cleanup_unused(&mut self, remove: bool) -> CleanupReport {
        let report = self.metadata.cleanup_unused(remove);
        if remove {
            self.forget_missing_filters();
            self.refresh();
        }
        report
    }

    fn toggle_filter(&mut self, kind: MetadataKind, id: Uuid) -> Result<bool, AppError> {
        if !self.metadata.contains(kind, &id) {
            return Err(AppError::not_found(kind, id));
        }
        Ok(self.selection.toggle_bubble(
            kind,
            id,
            FilterInput {
                snippets: &self.snippets,
                metadata: &self.metadata,
            },
        ))
    }

    /// # Returns
    /// `true` when the bubble is active afterwards.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown categories.
    pub fn toggle_category_filter(&mut self, id: Uuid) -> Result<bool, AppError> {
        self.toggle_filter(MetadataKind::Category, id)
    }

    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown labels.
    pub fn toggle_label_filter(&mut self, id: Uuid) -> Result<bool, AppError> {
        self.toggle_filter(MetadataKind::Label, id)
    }

    pub fn set_label_mode(&mut self, mode: LabelMode) {
        self.selection.set_label_mode(
            mode,
            FilterInput {
                snippets: &self.snippets,
                metadata: &self.metadata,
            },
        );
    }

    pub fn toggle_label_mode(&mut self) -> LabelMode {
        let mode = self.selection.criteria().label_mode.toggled();
        self.set_label_mode(mode);
        mode
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.selection.set_search_text(
            text,
            FilterInput {
                snippets: &self.snippets,
                metadata: &self.metadata,
            },
        );
    }

    /// Reset only the search term.
    pub fn clear_search_filter(&mut self) {
        self.selection.clear_search_filter(FilterInput {
            snippets: &self.snippets,
            metadata: &self.metadata,
        });
    }

    pub fn reset_filters(&mut self) {
        self.selection.reset_filters(FilterInput {
            snippets: &self.snippets,
            metadata: &self.metadata,
        });
    }

    /// Replace every criterion at once.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when a bubble names a missing entity.
    pub fn apply_criteria(&mut self, criteria: FilterCriteria) -> Result<(), AppError> {
        if let Some(id) = criteria
            .categories
            .iter()
            .find(|id| !self.metadata.contains(MetadataKind::Category, id))
        {
            return Err(AppError::not_found(MetadataKind::Category, id));
        }
        if let Some(id) = criteria
            .labels
            .iter()
            .find(|id| !self.metadata.contains(MetadataKind::Label, id))
        {
            return Err(AppError::not_found(MetadataKind::Label, id));
        }
        self.selection.apply_criteria(
            criteria,
            FilterInput {
                snippets: &self.snippets,
                metadata: &self.metadata,
            },
        );
        Ok(())
    }

    pub fn filter_options(&self) -> FilterOptions {
        filter::filter_options(&self.snippets, &self.metadata, self.selection.criteria())
    }

    /// Set a snippet's selection state using its own exclusive flag.
    ///
    /// # Returns
    /// Ids deselected to honor exclusivity.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids.
    pub fn set_state(&mut self, id: &Uuid, state: SelectionState) -> Result<Vec<Uuid>, AppError> {
        let exclusive = self.require_snippet(id)?.exclusive;
        Ok(self.selection.set_state(*id, state, exclusive))
    }

    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids.
    pub fn toggle_selection(&mut self, id: &Uuid) -> Result<SelectionState, AppError> {
        let next = match self.selection.get_state(id) {
            SelectionState::Selected => SelectionState::Unselected,
            SelectionState::Unselected => SelectionState::Selected,
        };
        self.set_state(id, next)?;
        Ok(next)
    }

    pub fn clear_selections(&mut self, ids: &[Uuid]) {
        self.selection.clear_selections(ids);
    }

    pub fn clear_all_selections(&mut self) {
        self.selection.clear_all_selections();
    }

    /// Selected snippets in collection order.
    pub fn selected_snippets(&self) -> Vec<&Snippet> {
        let selected = self.selection.selected_ids();
        self.snippets
            .iter()
            .filter(|snippet| selected.contains(&snippet.id))
            .collect()
    }

    /// Composition of the current selection with the configured separator.
    pub fn compose_selected(&self) -> Option<String> {
        compose(self.selected_snippets(), &self.config.compose_separator)
    }

    pub fn render_state(&self) -> RenderState {
        let filtered = self.selection.filtered_ids();
        RenderState {
            visible_ids: self
                .snippets
                .ids()
                .filter(|id| filtered.contains(id))
                .collect(),
            selected_ids: self.selection.selected_ids().clone(),
            highlighted_ids: self.selection.highlighted_ids(),
            is_filtered: self.selection.is_filtered(),
            filter_description: self.selection.criteria().describe(&self.metadata),
        }
    }
}

fn persisted_counts(snapshot: &Snapshot) -> HashMap<Uuid, usize> {
    snapshot
        .categories
        .iter()
        .map(|c| (c.id, c.usage_count))
        .chain(snapshot.labels.iter().map(|l| (l.id, l.usage_count)))
        .collect()
}
