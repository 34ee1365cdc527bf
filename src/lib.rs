//! Root crate facade for snipdeck.

pub use snipdeck_core::{
    compose, config, constants, engine, error, filter, logging, metadata, models, repository,
    selection, store, text, AppError, Config, EntityKind, FilterCriteria, JsonStore, LabelMode,
    MemoryStore, MetaRef, MetadataKind, MetadataStore, RenderState, SelectionState,
    SelectionStateManager, Snapshot, Snippet, SnippetDraft, SnippetEngine, SnippetRepository,
    SnippetStore,
};
