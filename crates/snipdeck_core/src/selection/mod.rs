//! Selection state, exclusivity, and the cached filter output.

#[cfg(test)]
mod tests;

use crate::filter::{self, FilterCriteria, LabelMode};
use crate::metadata::MetadataStore;
use crate::models::MetadataKind;
use crate::repository::SnippetRepository;
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

/// Per-snippet selection state, independent of visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Unselected,
    Selected,
}

/// Read-only view the filter engine needs.
#[derive(Debug, Clone, Copy)]
pub struct FilterInput<'a> {
    pub snippets: &'a SnippetRepository,
    pub metadata: &'a MetadataStore,
}

/// Owner of `selected_ids`, the active criteria, and `filtered_ids`.
///
/// At most one exclusive snippet is selected, or any number of
/// non-exclusive ones, never a mix. Highlighting is derived on demand
/// from the current sets and never cached.
#[derive(Debug, Clone, Default)]
pub struct SelectionStateManager {
    selected: BTreeSet<Uuid>,
    exclusive_selected: Option<Uuid>,
    criteria: FilterCriteria,
    filtered_ids: BTreeSet<Uuid>,
}

impl SelectionStateManager {
    /// Start unfiltered, with every snippet in `input` visible.
    pub fn new(label_mode: LabelMode, input: FilterInput<'_>) -> Self {
        let mut manager = Self {
            criteria: FilterCriteria::new().with_label_mode(label_mode),
            ..Self::default()
        };
        manager.refresh(input);
        manager
    }

    pub fn selected_ids(&self) -> &BTreeSet<Uuid> {
        &self.selected
    }

    pub fn filtered_ids(&self) -> &BTreeSet<Uuid> {
        &self.filtered_ids
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// True iff any filter criterion is active.
    pub fn is_filtered(&self) -> bool {
        self.criteria.is_active()
    }

    pub fn get_state(&self, id: &Uuid) -> SelectionState {
        if self.selected.contains(id) {
            SelectionState::Selected
        } else {
            SelectionState::Unselected
        }
    }

    /// Ids a renderer should highlight, computed fresh from current state.
    pub fn highlighted_ids(&self) -> BTreeSet<Uuid> {
        if self.is_filtered() {
            self.selected
                .intersection(&self.filtered_ids)
                .copied()
                .collect()
        } else {
            self.selected.clone()
        }
    }

    /// Set one snippet's state, applying exclusivity in both directions.
    ///
    /// # Returns
    /// Ids that were deselected to make room for `id`.
    pub fn set_state(&mut self, id: Uuid, state: SelectionState, exclusive: bool) -> Vec<Uuid> {
        match state {
            SelectionState::Unselected => {
                self.selected.remove(&id);
                if self.exclusive_selected == Some(id) {
                    self.exclusive_selected = None;
                }
                Vec::new()
            }
            SelectionState::Selected if exclusive => {
                let cleared: Vec<Uuid> = self.selected.iter().copied().filter(|s| *s != id).collect();
                self.selected.clear();
                self.selected.insert(id);
                self.exclusive_selected = Some(id);
                if !cleared.is_empty() {
                    debug!("Exclusive selection {} cleared {} other(s)", id, cleared.len());
                }
                cleared
            }
            SelectionState::Selected => {
                let mut cleared = Vec::new();
                match self.exclusive_selected {
                    Some(current) if current != id => {
                        self.selected.remove(&current);
                        cleared.push(current);
                        self.exclusive_selected = None;
                    }
                    Some(_) => self.exclusive_selected = None,
                    None => {}
                }
                self.selected.insert(id);
                cleared
            }
        }
    }

    /// Remove exactly `ids` from the selection, visible or not.
    pub fn clear_selections<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a Uuid>,
    {
        for id in ids {
            self.selected.remove(id);
            if self.exclusive_selected == Some(*id) {
                self.exclusive_selected = None;
            }
        }
    }

    pub fn clear_all_selections(&mut self) {
        self.selected.clear();
        self.exclusive_selected = None;
    }

    /// Keep the exclusivity invariant after a snippet's flag was edited.
    ///
    /// # Returns
    /// `true` when the snippet had to be deselected.
    pub fn reconcile_exclusive_flag(&mut self, id: Uuid, exclusive: bool) -> bool {
        if !self.selected.contains(&id) {
            return false;
        }
        if exclusive {
            if self.selected.len() > 1 {
                self.clear_selections([&id]);
                return true;
            }
            self.exclusive_selected = Some(id);
        } else if self.exclusive_selected == Some(id) {
            self.exclusive_selected = None;
        }
        false
    }

    /// Recompute `filtered_ids` from the current criteria.
    pub fn refresh(&mut self, input: FilterInput<'_>) {
        self.filtered_ids = filter::visible_ids(input.snippets, input.metadata, &self.criteria);
    }

    /// Replace every criterion at once.
    pub fn apply_criteria(&mut self, criteria: FilterCriteria, input: FilterInput<'_>) {
        self.criteria = criteria;
        self.refresh(input);
    }

    /// Toggle one category or label bubble.
    ///
    /// # Returns
    /// `true` when the bubble is active afterwards.
    pub fn toggle_bubble(&mut self, kind: MetadataKind, id: Uuid, input: FilterInput<'_>) -> bool {
        let active = self.criteria.toggle(kind, id);
        self.refresh(input);
        active
    }

    pub fn set_label_mode(&mut self, mode: LabelMode, input: FilterInput<'_>) {
        self.criteria.label_mode = mode;
        self.refresh(input);
    }

    pub fn set_search_text(&mut self, text: impl Into<String>, input: FilterInput<'_>) {
        self.criteria.search = text.into();
        self.refresh(input);
    }

    /// Reset only the search term; bubbles and selection are untouched.
    pub fn clear_search_filter(&mut self, input: FilterInput<'_>) {
        self.criteria.search.clear();
        self.refresh(input);
    }

    /// Clear search and every bubble, keeping the label mode.
    pub fn reset_filters(&mut self, input: FilterInput<'_>) {
        self.criteria = FilterCriteria::new().with_label_mode(self.criteria.label_mode);
        self.refresh(input);
    }

    /// Drop a deleted category or label from the bubbles.
    pub(crate) fn forget_metadata(&mut self, kind: MetadataKind, id: &Uuid) {
        self.criteria.forget(kind, id);
    }

    /// Follow a merge so an active source bubble becomes the target.
    pub(crate) fn retarget_metadata(&mut self, kind: MetadataKind, source: &Uuid, target: Uuid) {
        self.criteria.replace(kind, source, target);
    }
}
