use snipdeck::models::LegacySnippetRecord;
use snipdeck::{
    AppError, Config, JsonStore, LabelMode, MetadataKind, SelectionState, SnippetDraft,
    SnippetEngine,
};
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;
use uuid::Uuid;

fn config_for(dir: &TempDir) -> Config {
    Config::default().with_data_dir(dir.path())
}

fn seed(engine: &mut SnippetEngine) -> [Uuid; 3] {
    let mut add = |name: &str, category: &str, labels: &str, prompt: &str| {
        engine
            .create_snippet(SnippetDraft::new(name, category, prompt).with_labels_csv(labels))
            .expect("seed snippet")
            .id
    };
    [
        add("Formal greeting", "writing", "formal", "Open with a formal greeting"),
        add("Casual tone", "writing", "casual", "Keep the tone relaxed"),
        add("Typed errors", "coding", "formal", "Return typed errors"),
    ]
}

#[test]
fn scenario_filters_then_selection_survives_reload() {
    let temp = TempDir::new().expect("temp dir");
    let config = config_for(&temp);
    let [s1, s2, s3] = {
        let store = JsonStore::open(&config.data_dir).expect("open");
        let mut engine = SnippetEngine::load(config.clone(), &store).expect("load");
        let ids = seed(&mut engine);
        engine.save(&store).expect("save");
        ids
    };

    let store = JsonStore::open(&config.data_dir).expect("reopen");
    let mut engine = SnippetEngine::load(config, &store).expect("reload");
    assert_eq!(engine.render_state().visible_ids, vec![s1, s2, s3]);

    let writing = engine
        .metadata()
        .find_by_name(MetadataKind::Category, "writing")
        .expect("writing");
    let formal = engine
        .metadata()
        .find_by_name(MetadataKind::Label, "formal")
        .expect("formal");
    engine.toggle_category_filter(writing).expect("category");
    assert_eq!(engine.render_state().visible_ids, vec![s1, s2]);
    engine.set_label_mode(LabelMode::Or);
    engine.toggle_label_filter(formal).expect("label");
    assert_eq!(engine.render_state().visible_ids, vec![s1]);

    engine.reset_filters();
    engine.set_search_text("casual");
    assert_eq!(engine.render_state().visible_ids, vec![s2]);

    assert!(matches!(
        engine.delete_metadata(&writing, MetadataKind::Category),
        Err(AppError::EntityInUse { usage_count: 2, .. })
    ));
    assert_eq!(
        engine.metadata().usage_count(MetadataKind::Category, &writing),
        Some(2)
    );
}

#[test]
fn merge_is_persisted_and_reload_is_lossless() {
    let temp = TempDir::new().expect("temp dir");
    let config = config_for(&temp);
    let store = JsonStore::open(&config.data_dir).expect("open");
    let mut engine = SnippetEngine::load(config.clone(), &store).expect("load");
    let [_, s2, _] = seed(&mut engine);

    let writing = engine
        .metadata()
        .find_by_name(MetadataKind::Category, "writing")
        .expect("writing");
    let coding = engine
        .metadata()
        .find_by_name(MetadataKind::Category, "coding")
        .expect("coding");
    engine
        .merge_metadata(writing, coding, MetadataKind::Category)
        .expect("merge");
    engine.save(&store).expect("save");

    let before: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("snippets.json")).expect("read"))
            .expect("json");
    let reloaded = SnippetEngine::load(config, &store).expect("reload");
    assert_eq!(
        reloaded.snippets().get(&s2).map(|s| s.category_id),
        Some(coding)
    );
    assert_eq!(
        reloaded.metadata().usage_count(MetadataKind::Category, &coding),
        Some(3)
    );
    assert!(reloaded.metadata().category(&writing).is_none());

    reloaded.save(&store).expect("save again");
    let after: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("snippets.json")).expect("read"))
            .expect("json");
    assert_eq!(before, after);
}

#[test]
fn exclusive_selection_rules_and_composition() {
    let mut engine = SnippetEngine::new(Config::default());
    let [s1, s2, _] = seed(&mut engine);
    let solo = engine
        .create_snippet(SnippetDraft::new("Solo", "misc", "Only me").exclusive(true))
        .expect("solo")
        .id;

    engine.set_state(&s1, SelectionState::Selected).expect("s1");
    engine.set_state(&s2, SelectionState::Selected).expect("s2");
    assert_eq!(
        engine.compose_selected().as_deref(),
        Some("Open with a formal greeting; Keep the tone relaxed")
    );

    engine.set_state(&solo, SelectionState::Selected).expect("solo");
    assert_eq!(engine.render_state().selected_ids, BTreeSet::from([solo]));

    engine.set_state(&s2, SelectionState::Selected).expect("s2 again");
    assert_eq!(engine.render_state().selected_ids, BTreeSet::from([s2]));
}

#[test]
fn legacy_import_then_dangling_snapshot_fails_loudly() {
    let temp = TempDir::new().expect("temp dir");
    let config = config_for(&temp);
    let store = JsonStore::open(&config.data_dir).expect("open");
    let mut engine = SnippetEngine::load(config.clone(), &store).expect("load");

    let rows: Vec<LegacySnippetRecord> = serde_json::from_str(
        r#"[
            {"name": "Tone", "category": "Writing Style", "labels": ["formal, polite"], "prompt_text": "Be polite"},
            {"name": "Brevity", "category": "writing style", "labels": [], "prompt_text": "Be brief", "exclusive": true}
        ]"#,
    )
    .expect("rows");
    let report = engine.import_legacy(&rows).expect("import");
    assert_eq!(report.imported, 2);
    let style = engine
        .metadata()
        .find_by_name(MetadataKind::Category, "Writing Style")
        .expect("style");
    assert_eq!(
        engine.metadata().usage_count(MetadataKind::Category, &style),
        Some(2)
    );

    let mut snapshot = engine.snapshot();
    snapshot.labels.clear();
    assert!(matches!(
        SnippetEngine::from_snapshot(config, snapshot),
        Err(AppError::DanglingReference { .. })
    ));
}
