//! Category and label ownership: naming rules, identity, and usage counts.

mod merge;
#[cfg(test)]
mod tests;

pub use merge::MergeReport;

use crate::constants::{DEFAULT_CATEGORY_SORT_ORDER, ORPHAN_CATEGORY_NAME, ORPHAN_LABEL_NAME};
use crate::error::AppError;
use crate::models::{Category, Label, MetaRef, MetadataKind, Snippet};
use crate::text::{is_hex_color, underscore_whitespace};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of a full usage-count recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageSummary {
    pub categories_used: usize,
    pub categories_total: usize,
    pub labels_used: usize,
    pub labels_total: usize,
}

/// Outcome of [`MetadataStore::cleanup_unused`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub categories_removed: usize,
    pub labels_removed: usize,
    pub categories_unused: usize,
    pub labels_unused: usize,
}

/// Category and label ids whose usage counts must be refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AffectedRefs {
    pub categories: BTreeSet<Uuid>,
    pub labels: BTreeSet<Uuid>,
}

impl AffectedRefs {
    pub(crate) fn of(snippet: &Snippet) -> Self {
        Self {
            categories: BTreeSet::from([snippet.category_id]),
            labels: snippet.label_ids.clone(),
        }
    }

    /// Refs touched when `old` is replaced by `new`: both categories when
    /// they differ, and the symmetric difference of the label sets.
    pub(crate) fn between(old: &Snippet, new: &Snippet) -> Self {
        let mut categories = BTreeSet::new();
        if old.category_id != new.category_id {
            categories.insert(old.category_id);
            categories.insert(new.category_id);
        }
        Self {
            categories,
            labels: old
                .label_ids
                .symmetric_difference(&new.label_ids)
                .copied()
                .collect(),
        }
    }

    pub(crate) fn extend(&mut self, other: AffectedRefs) {
        self.categories.extend(other.categories);
        self.labels.extend(other.labels);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.labels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
    Existing(Uuid),
    Missing(String),
}

/// Validated, not-yet-applied resolution of a draft's references.
///
/// Produced by [`MetadataStore::plan_references`] without touching the
/// store; [`MetadataStore::commit_references`] creates the missing names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferencePlan {
    category: Resolved,
    labels: Vec<Resolved>,
}

/// Owner of every [`Category`] and [`Label`].
#[derive(Debug, Clone)]
pub struct MetadataStore {
    categories: BTreeMap<Uuid, Category>,
    labels: BTreeMap<Uuid, Label>,
    default_sort_order: i32,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_SORT_ORDER)
    }
}

impl MetadataStore {
    pub fn new(default_sort_order: i32) -> Self {
        Self {
            categories: BTreeMap::new(),
            labels: BTreeMap::new(),
            default_sort_order,
        }
    }

    /// Rebuild a store from persisted records.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] when a name is not in normalized
    /// form (or is a category name containing a comma), or when an id or
    /// name appears twice within one collection.
    pub fn from_parts(
        categories: Vec<Category>,
        labels: Vec<Label>,
        default_sort_order: i32,
    ) -> Result<Self, AppError> {
        let mut store = Self::new(default_sort_order);
        for category in categories {
            store.check_persisted_name(MetadataKind::Category, &category.name)?;
            let id = category.id;
            if store.categories.insert(id, category).is_some() {
                return Err(AppError::InvalidInput(format!(
                    "duplicate category id '{}'",
                    id
                )));
            }
        }
        for label in labels {
            store.check_persisted_name(MetadataKind::Label, &label.name)?;
            let id = label.id;
            if store.labels.insert(id, label).is_some() {
                return Err(AppError::InvalidInput(format!(
                    "duplicate label id '{}'",
                    id
                )));
            }
        }
        Ok(store)
    }

    /// Persisted names must already be sanitized and unique per kind.
    fn check_persisted_name(&self, kind: MetadataKind, name: &str) -> Result<(), AppError> {
        let normalized = Self::sanitize(name, kind.is_category())
            .map_err(|err| AppError::InvalidInput(format!("persisted {} name: {}", kind, err)))?;
        if normalized != name {
            return Err(AppError::InvalidInput(format!(
                "persisted {} name '{}' is not normalized (expected '{}')",
                kind, name, normalized
            )));
        }
        if self.find_existing(kind, name).is_some() {
            return Err(AppError::InvalidInput(format!(
                "duplicate {} name '{}'",
                kind, name
            )));
        }
        Ok(())
    }

    /// Normalize a user-supplied name.
    ///
    /// Trims, lowercases, and replaces internal whitespace runs with a
    /// single underscore. Never touches store state.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] when the name is blank, or when
    /// `is_category` is set and the input contains a comma.
    pub fn sanitize(text: &str, is_category: bool) -> Result<String, AppError> {
        let trimmed = text.trim();
        if is_category && trimmed.contains(',') {
            return Err(AppError::InvalidInput(format!(
                "category name '{}' must not contain a comma",
                trimmed
            )));
        }
        let normalized = underscore_whitespace(trimmed);
        if normalized.is_empty() {
            return Err(AppError::InvalidInput("name must not be empty".to_string()));
        }
        Ok(normalized)
    }

    pub fn default_sort_order(&self) -> i32 {
        self.default_sort_order
    }

    pub fn category(&self, id: &Uuid) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn label(&self, id: &Uuid) -> Option<&Label> {
        self.labels.get(id)
    }

    pub fn contains(&self, kind: MetadataKind, id: &Uuid) -> bool {
        match kind {
            MetadataKind::Category => self.categories.contains_key(id),
            MetadataKind::Label => self.labels.contains_key(id),
        }
    }

    pub fn name_of(&self, kind: MetadataKind, id: &Uuid) -> Option<&str> {
        match kind {
            MetadataKind::Category => self.categories.get(id).map(|c| c.name.as_str()),
            MetadataKind::Label => self.labels.get(id).map(|l| l.name.as_str()),
        }
    }

    pub fn usage_count(&self, kind: MetadataKind, id: &Uuid) -> Option<usize> {
        match kind {
            MetadataKind::Category => self.categories.get(id).map(|c| c.usage_count),
            MetadataKind::Label => self.labels.get(id).map(|l| l.usage_count),
        }
    }

    /// Categories ordered by `(sort_order, name)`.
    pub fn categories(&self) -> Vec<&Category> {
        let mut out: Vec<&Category> = self.categories.values().collect();
        out.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        out
    }

    /// Labels ordered by name.
    pub fn labels(&self) -> Vec<&Label> {
        let mut out: Vec<&Label> = self.labels.values().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    fn find_existing(&self, kind: MetadataKind, normalized: &str) -> Option<Uuid> {
        match kind {
            MetadataKind::Category => self
                .categories
                .values()
                .find(|c| c.name == normalized)
                .map(|c| c.id),
            MetadataKind::Label => self
                .labels
                .values()
                .find(|l| l.name == normalized)
                .map(|l| l.id),
        }
    }

    /// Look up an entity by display name (normalized before comparison).
    pub fn find_by_name(&self, kind: MetadataKind, name: &str) -> Option<Uuid> {
        let normalized = Self::sanitize(name, kind.is_category()).ok()?;
        self.find_existing(kind, &normalized)
    }

    fn insert_new(&mut self, kind: MetadataKind, normalized: String) -> Uuid {
        match kind {
            MetadataKind::Category => {
                let category = Category::new(normalized, self.default_sort_order, None);
                let id = category.id;
                debug!("Created category '{}' ({})", category.name, id);
                self.categories.insert(id, category);
                id
            }
            MetadataKind::Label => {
                let label = Label::new(normalized);
                let id = label.id;
                debug!("Created label '{}' ({})", label.name, id);
                self.labels.insert(id, label);
                id
            }
        }
    }

    /// Return the id for `name`, creating the entity on miss.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] when the name fails sanitization.
    pub fn resolve_or_create(&mut self, name: &str, kind: MetadataKind) -> Result<Uuid, AppError> {
        let normalized = Self::sanitize(name, kind.is_category())?;
        if let Some(id) = self.find_existing(kind, &normalized) {
            return Ok(id);
        }
        Ok(self.insert_new(kind, normalized))
    }

    /// Create (or return) a category with explicit styling.
    ///
    /// An existing category with the same normalized name is returned
    /// unchanged.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] for bad names or colors.
    pub fn create_category(
        &mut self,
        name: &str,
        sort_order: Option<i32>,
        color: Option<String>,
    ) -> Result<Uuid, AppError> {
        let normalized = Self::sanitize(name, true)?;
        let color = normalize_color(color)?;
        if let Some(id) = self.find_existing(MetadataKind::Category, &normalized) {
            return Ok(id);
        }
        let category = Category::new(
            normalized,
            sort_order.unwrap_or(self.default_sort_order),
            color,
        );
        let id = category.id;
        self.categories.insert(id, category);
        Ok(id)
    }

    /// Create (or return) a label by name.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] when the name fails sanitization.
    pub fn create_label(&mut self, name: &str) -> Result<Uuid, AppError> {
        self.resolve_or_create(name, MetadataKind::Label)
    }

    /// Rename an entity, keeping its id and every snippet reference.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids and
    /// [`AppError::InvalidInput`] for bad names or a name already held by
    /// another entity of the same kind.
    pub fn rename(&mut self, id: &Uuid, new_name: &str, kind: MetadataKind) -> Result<(), AppError> {
        if !self.contains(kind, id) {
            return Err(AppError::not_found(kind, id));
        }
        let normalized = Self::sanitize(new_name, kind.is_category())?;
        if let Some(existing) = self.find_existing(kind, &normalized) {
            if existing != *id {
                return Err(AppError::InvalidInput(format!(
                    "{} '{}' already exists",
                    kind, normalized
                )));
            }
        }
        match kind {
            MetadataKind::Category => {
                if let Some(category) = self.categories.get_mut(id) {
                    category.name = normalized;
                }
            }
            MetadataKind::Label => {
                if let Some(label) = self.labels.get_mut(id) {
                    label.name = normalized;
                }
            }
        }
        Ok(())
    }

    /// Update category sort order and/or color.
    ///
    /// `color`: `None` keeps the current color, `Some("")` clears it.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids and
    /// [`AppError::InvalidInput`] for malformed colors.
    pub fn update_category_style(
        &mut self,
        id: &Uuid,
        sort_order: Option<i32>,
        color: Option<String>,
    ) -> Result<(), AppError> {
        let color = match color {
            Some(raw) if raw.trim().is_empty() => Some(None),
            Some(raw) => Some(normalize_color(Some(raw))?),
            None => None,
        };
        let category = self
            .categories
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(MetadataKind::Category, id))?;
        if let Some(sort_order) = sort_order {
            category.sort_order = sort_order;
        }
        if let Some(color) = color {
            category.color = color;
        }
        Ok(())
    }

    /// Remove an unused entity.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids and
    /// [`AppError::EntityInUse`] while any snippet still references it.
    pub fn delete(&mut self, id: &Uuid, kind: MetadataKind) -> Result<(), AppError> {
        let usage_count = self
            .usage_count(kind, id)
            .ok_or_else(|| AppError::not_found(kind, id))?;
        if usage_count > 0 {
            return Err(AppError::EntityInUse {
                kind: kind.into(),
                id: id.to_string(),
                usage_count,
            });
        }
        match kind {
            MetadataKind::Category => {
                self.categories.remove(id);
            }
            MetadataKind::Label => {
                self.labels.remove(id);
            }
        }
        debug!("Deleted {} {}", kind, id);
        Ok(())
    }

    fn plan_one(&self, reference: &MetaRef, kind: MetadataKind) -> Result<Resolved, AppError> {
        match reference {
            MetaRef::Id(id) => {
                if self.contains(kind, id) {
                    Ok(Resolved::Existing(*id))
                } else {
                    Err(AppError::dangling(kind, id))
                }
            }
            MetaRef::Name(name) => {
                let normalized = Self::sanitize(name, kind.is_category())?;
                Ok(match self.find_existing(kind, &normalized) {
                    Some(id) => Resolved::Existing(id),
                    None => Resolved::Missing(normalized),
                })
            }
        }
    }

    /// Validate a draft's references without mutating the store.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidInput`] for names failing sanitization and
    /// [`AppError::DanglingReference`] for ids that do not exist.
    pub(crate) fn plan_references(
        &self,
        category: &MetaRef,
        labels: &[MetaRef],
    ) -> Result<ReferencePlan, AppError> {
        let category = self.plan_one(category, MetadataKind::Category)?;
        let labels = labels
            .iter()
            .map(|label| self.plan_one(label, MetadataKind::Label))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReferencePlan { category, labels })
    }

    /// Apply a plan, creating any missing names, and return the ids.
    pub(crate) fn commit_references(&mut self, plan: ReferencePlan) -> (Uuid, BTreeSet<Uuid>) {
        let category_id = self.commit_one(plan.category, MetadataKind::Category);
        let label_ids = plan
            .labels
            .into_iter()
            .map(|label| self.commit_one(label, MetadataKind::Label))
            .collect();
        (category_id, label_ids)
    }

    fn commit_one(&mut self, resolved: Resolved, kind: MetadataKind) -> Uuid {
        match resolved {
            Resolved::Existing(id) => id,
            // Two draft names can normalize to the same missing entry.
            Resolved::Missing(name) => match self.find_existing(kind, &name) {
                Some(id) => id,
                None => self.insert_new(kind, name),
            },
        }
    }

    fn count_references<'a, I>(
        &self,
        snippets: I,
    ) -> Result<(HashMap<Uuid, usize>, HashMap<Uuid, usize>), AppError>
    where
        I: IntoIterator<Item = &'a Snippet>,
    {
        let mut category_counts: HashMap<Uuid, usize> = HashMap::new();
        let mut label_counts: HashMap<Uuid, usize> = HashMap::new();
        for snippet in snippets {
            if !self.categories.contains_key(&snippet.category_id) {
                return Err(AppError::dangling(MetadataKind::Category, snippet.category_id));
            }
            *category_counts.entry(snippet.category_id).or_insert(0) += 1;
            for label_id in &snippet.label_ids {
                if !self.labels.contains_key(label_id) {
                    return Err(AppError::dangling(MetadataKind::Label, label_id));
                }
                *label_counts.entry(*label_id).or_insert(0) += 1;
            }
        }
        Ok((category_counts, label_counts))
    }

    /// Recalculate every usage count from `snippets`.
    ///
    /// Counts are only written after the whole scan succeeds, so a failure
    /// leaves previous counts untouched.
    ///
    /// # Errors
    /// Returns [`AppError::DanglingReference`] when any snippet references
    /// a category or label the store does not hold.
    pub fn recompute_usage_counts<'a, I>(&mut self, snippets: I) -> Result<UsageSummary, AppError>
    where
        I: IntoIterator<Item = &'a Snippet>,
    {
        let (category_counts, label_counts) = self.count_references(snippets)?;
        for category in self.categories.values_mut() {
            category.usage_count = category_counts.get(&category.id).copied().unwrap_or(0);
        }
        for label in self.labels.values_mut() {
            label.usage_count = label_counts.get(&label.id).copied().unwrap_or(0);
        }

        let summary = UsageSummary {
            categories_used: self.categories.values().filter(|c| c.usage_count > 0).count(),
            categories_total: self.categories.len(),
            labels_used: self.labels.values().filter(|l| l.usage_count > 0).count(),
            labels_total: self.labels.len(),
        };
        debug!(
            "Usage counts refreshed: {}/{} categories, {}/{} labels in use",
            summary.categories_used,
            summary.categories_total,
            summary.labels_used,
            summary.labels_total
        );
        Ok(summary)
    }

    /// Recount only the given ids by scanning `snippets`.
    pub(crate) fn refresh_counts_for<'a, I>(&mut self, affected: &AffectedRefs, snippets: I)
    where
        I: IntoIterator<Item = &'a Snippet>,
    {
        if affected.is_empty() {
            return;
        }
        let mut category_counts: HashMap<Uuid, usize> =
            affected.categories.iter().map(|id| (*id, 0)).collect();
        let mut label_counts: HashMap<Uuid, usize> =
            affected.labels.iter().map(|id| (*id, 0)).collect();
        for snippet in snippets {
            if let Some(count) = category_counts.get_mut(&snippet.category_id) {
                *count += 1;
            }
            for label_id in &snippet.label_ids {
                if let Some(count) = label_counts.get_mut(label_id) {
                    *count += 1;
                }
            }
        }
        for (id, count) in category_counts {
            if let Some(category) = self.categories.get_mut(&id) {
                category.usage_count = count;
            }
        }
        for (id, count) in label_counts {
            if let Some(label) = self.labels.get_mut(&id) {
                label.usage_count = count;
            }
        }
    }

    /// Report (and optionally remove) entities no snippet references.
    pub fn cleanup_unused(&mut self, remove: bool) -> CleanupReport {
        let mut report = CleanupReport::default();
        if remove {
            let before = self.categories.len();
            self.categories.retain(|_, c| c.usage_count > 0);
            report.categories_removed = before - self.categories.len();

            let before = self.labels.len();
            self.labels.retain(|_, l| l.usage_count > 0);
            report.labels_removed = before - self.labels.len();

            if report.categories_removed > 0 || report.labels_removed > 0 {
                info!(
                    "Removed {} unused categories and {} unused labels",
                    report.categories_removed, report.labels_removed
                );
            }
        }
        report.categories_unused = self.categories.values().filter(|c| c.usage_count == 0).count();
        report.labels_unused = self.labels.values().filter(|l| l.usage_count == 0).count();
        report
    }

    fn unique_placeholder(&self, kind: MetadataKind, base: &str) -> String {
        if self.find_existing(kind, base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| self.find_existing(kind, candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Create placeholder entities for ids that snippets reference but the
    /// store lacks. Explicit repair only; recomputation never calls this.
    ///
    /// # Returns
    /// `(categories_created, labels_created)`.
    pub fn adopt_orphan_references<'a, I>(&mut self, snippets: I) -> (usize, usize)
    where
        I: IntoIterator<Item = &'a Snippet>,
    {
        let mut orphan_categories = BTreeSet::new();
        let mut orphan_labels = BTreeSet::new();
        for snippet in snippets {
            if !self.categories.contains_key(&snippet.category_id) {
                orphan_categories.insert(snippet.category_id);
            }
            for label_id in &snippet.label_ids {
                if !self.labels.contains_key(label_id) {
                    orphan_labels.insert(*label_id);
                }
            }
        }
        for id in &orphan_categories {
            let name = self.unique_placeholder(MetadataKind::Category, ORPHAN_CATEGORY_NAME);
            warn!("Adopting orphaned category id {} as '{}'", id, name);
            self.categories
                .insert(*id, Category::with_id(*id, name, self.default_sort_order));
        }
        for id in &orphan_labels {
            let name = self.unique_placeholder(MetadataKind::Label, ORPHAN_LABEL_NAME);
            warn!("Adopting orphaned label id {} as '{}'", id, name);
            self.labels.insert(*id, Label::with_id(*id, name));
        }
        (orphan_categories.len(), orphan_labels.len())
    }

    /// Owned copies for persistence, in listing order.
    pub fn to_parts(&self) -> (Vec<Category>, Vec<Label>) {
        (
            self.categories().into_iter().cloned().collect(),
            self.labels().into_iter().cloned().collect(),
        )
    }

    pub(crate) fn remove_unchecked(&mut self, id: &Uuid, kind: MetadataKind) {
        match kind {
            MetadataKind::Category => {
                self.categories.remove(id);
            }
            MetadataKind::Label => {
                self.labels.remove(id);
            }
        }
    }
}

fn normalize_color(color: Option<String>) -> Result<Option<String>, AppError> {
    match color.map(|raw| raw.trim().to_string()) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) if is_hex_color(&raw) => Ok(Some(raw.to_ascii_lowercase())),
        Some(raw) => Err(AppError::InvalidInput(format!(
            "color '{}' is not a #RGB or #RRGGBB hex value",
            raw
        ))),
    }
}
