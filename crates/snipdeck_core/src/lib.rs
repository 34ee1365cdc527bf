//! Core library for snipdeck (metadata, snippets, filtering, selection, storage).

/// Composition of selected prompt texts.
pub mod compose;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Engine facade over every component.
pub mod engine;
/// Application error types.
pub mod error;
/// Filter criteria and visible-id computation.
pub mod filter;
/// Tracing subscriber setup.
pub mod logging;
/// Category/label ownership and usage counts.
pub mod metadata;
/// Data models for snippets and metadata.
pub mod models;
/// Snippet collection and reference resolution.
pub mod repository;
/// Selection state and exclusivity.
pub mod selection;
/// Persistence collaborators.
pub mod store;
/// Text normalization helpers.
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use engine::{RenderState, SnippetEngine};
pub use error::{AppError, EntityKind};
pub use filter::{FilterCriteria, LabelMode};
pub use metadata::MetadataStore;
pub use models::{MetaRef, MetadataKind, Snippet, SnippetDraft};
pub use repository::SnippetRepository;
pub use selection::{SelectionState, SelectionStateManager};
pub use store::{JsonStore, MemoryStore, Snapshot, SnippetStore};
