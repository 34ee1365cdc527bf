use super::*;
use crate::error::EntityKind;
use crate::models::SnippetDraft;
use crate::repository::SnippetRepository;
use crate::test_support::{assert_usage_counts_match_canonical, scenario};

#[test]
fn sanitize_normalizes_and_rejects_category_commas() {
    assert_eq!(
        MetadataStore::sanitize("  Writing   Style ", true).expect("sanitize"),
        "writing_style"
    );
    assert_eq!(
        MetadataStore::sanitize("formal, polite", false).expect("label commas allowed"),
        "formal,_polite"
    );
    assert!(matches!(
        MetadataStore::sanitize("a, b", true),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        MetadataStore::sanitize("   ", false),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn resolve_or_create_only_adds_on_miss() {
    let mut store = MetadataStore::default();
    let first = store
        .resolve_or_create("Writing Tips", MetadataKind::Category)
        .expect("create");
    let second = store
        .resolve_or_create("writing  tips", MetadataKind::Category)
        .expect("resolve");

    assert_eq!(first, second);
    assert_eq!(store.categories().len(), 1);
    let category = store.category(&first).expect("category");
    assert_eq!(category.name, "writing_tips");
    assert_eq!(category.sort_order, DEFAULT_CATEGORY_SORT_ORDER);
    assert_eq!(category.usage_count, 0);
}

#[test]
fn delete_in_use_category_fails_and_keeps_count() {
    let mut s = scenario();
    let writing = s.category("writing");

    let err = s
        .metadata
        .delete(&writing, MetadataKind::Category)
        .expect_err("in use");
    assert!(matches!(
        err,
        AppError::EntityInUse {
            kind: EntityKind::Category,
            usage_count: 2,
            ..
        }
    ));
    assert_eq!(s.metadata.usage_count(MetadataKind::Category, &writing), Some(2));
}

#[test]
fn delete_unused_and_missing_entities() {
    let mut store = MetadataStore::default();
    let id = store.create_label("spare").expect("label");

    store.delete(&id, MetadataKind::Label).expect("delete");
    assert!(store.label(&id).is_none());
    assert!(matches!(
        store.delete(&id, MetadataKind::Label),
        Err(AppError::NotFound { .. })
    ));
}

#[test]
fn merge_category_rewrites_snippets_and_removes_source() {
    let mut metadata = MetadataStore::default();
    let mut snippets = SnippetRepository::new();
    let s1 = snippets
        .create(&mut metadata, SnippetDraft::new("one", "a", "first"))
        .expect("s1");
    let s2 = snippets
        .create(&mut metadata, SnippetDraft::new("two", "b", "second"))
        .expect("s2");
    let a = s1.category_id;
    let b = s2.category_id;

    let report = metadata
        .merge(&mut snippets, b, a, MetadataKind::Category)
        .expect("merge");

    assert_eq!(report.snippets_updated, 1);
    assert_eq!(snippets.get(&s2.id).expect("s2").category_id, a);
    assert_eq!(metadata.usage_count(MetadataKind::Category, &a), Some(2));
    assert!(metadata.category(&b).is_none());
    assert_usage_counts_match_canonical(&metadata, &snippets);
}

#[test]
fn merge_label_collapses_duplicate_references() {
    let mut s = scenario();
    let formal = s.label("formal");
    let casual = s.label("casual");
    let both = s
        .snippets
        .create(
            &mut s.metadata,
            SnippetDraft::new("both", "writing", "mixed").with_labels([formal, casual]),
        )
        .expect("both");

    s.metadata
        .merge(&mut s.snippets, casual, formal, MetadataKind::Label)
        .expect("merge");

    assert_eq!(s.snippet(&both.id).label_ids, BTreeSet::from([formal]));
    assert_eq!(s.snippet(&s.second).label_ids, BTreeSet::from([formal]));
    assert_eq!(s.metadata.usage_count(MetadataKind::Label, &formal), Some(4));
    assert!(s.metadata.label(&casual).is_none());
    assert_usage_counts_match_canonical(&s.metadata, &s.snippets);
}

#[test]
fn merge_rejects_self_and_missing_ids() {
    let mut s = scenario();
    let writing = s.category("writing");
    let before = s.snippets.iter().cloned().collect::<Vec<_>>();

    assert!(matches!(
        s.metadata
            .merge(&mut s.snippets, writing, writing, MetadataKind::Category),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        s.metadata
            .merge(&mut s.snippets, Uuid::new_v4(), writing, MetadataKind::Category),
        Err(AppError::NotFound { .. })
    ));
    assert!(matches!(
        s.metadata
            .merge(&mut s.snippets, writing, Uuid::new_v4(), MetadataKind::Category),
        Err(AppError::NotFound { .. })
    ));
    assert_eq!(s.snippets.iter().cloned().collect::<Vec<_>>(), before);
}

#[test]
fn recompute_is_idempotent_and_fails_loudly_on_dangling() {
    let mut s = scenario();
    let first = s.metadata.recompute_usage_counts(s.snippets.iter()).expect("first");
    let second = s.metadata.recompute_usage_counts(s.snippets.iter()).expect("second");
    assert_eq!(first, second);
    assert_eq!(first.categories_used, 2);
    assert_eq!(first.labels_total, 2);

    let mut orphan = s.snippet(&s.first).clone();
    orphan.category_id = Uuid::new_v4();
    let writing = s.category("writing");
    let err = s
        .metadata
        .recompute_usage_counts(s.snippets.iter().chain(std::iter::once(&orphan)))
        .expect_err("dangling");
    assert!(matches!(err, AppError::DanglingReference { .. }));
    assert_eq!(s.metadata.usage_count(MetadataKind::Category, &writing), Some(2));
}

#[test]
fn rename_keeps_id_and_rejects_collisions() {
    let mut s = scenario();
    let writing = s.category("writing");

    s.metadata
        .rename(&writing, "Prose Writing", MetadataKind::Category)
        .expect("rename");
    assert_eq!(
        s.metadata.name_of(MetadataKind::Category, &writing),
        Some("prose_writing")
    );
    assert!(matches!(
        s.metadata.rename(&writing, "coding", MetadataKind::Category),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn category_style_validates_color_and_orders_listing() {
    let mut store = MetadataStore::default();
    let zeta = store.create_category("zeta", Some(1), None).expect("zeta");
    let alpha = store.create_category("alpha", None, None).expect("alpha");

    assert!(matches!(
        store.update_category_style(&alpha, None, Some("red".to_string())),
        Err(AppError::InvalidInput(_))
    ));
    store
        .update_category_style(&alpha, Some(0), Some("#FF5733".to_string()))
        .expect("style");
    let names: Vec<&str> = store.categories().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(store.category(&alpha).and_then(|c| c.color.as_deref()), Some("#ff5733"));

    store
        .update_category_style(&alpha, None, Some(String::new()))
        .expect("clear color");
    assert_eq!(store.category(&alpha).and_then(|c| c.color.clone()), None);
    assert!(store.category(&zeta).is_some());
}

#[test]
fn cleanup_reports_then_removes_unused() {
    let mut s = scenario();
    s.metadata.create_category("empty", None, None).expect("category");
    s.metadata.create_label("spare").expect("label");

    let report = s.metadata.cleanup_unused(false);
    assert_eq!(report.categories_unused, 1);
    assert_eq!(report.labels_unused, 1);
    assert_eq!(report.categories_removed, 0);

    let report = s.metadata.cleanup_unused(true);
    assert_eq!(report.categories_removed, 1);
    assert_eq!(report.labels_removed, 1);
    assert_eq!(report.categories_unused, 0);
    assert!(s.metadata.find_by_name(MetadataKind::Label, "spare").is_none());
}

#[test]
fn adopt_orphans_creates_unique_placeholders() {
    let mut store = MetadataStore::default();
    let make = |category_id: Uuid, label: Uuid| Snippet {
        id: Uuid::new_v4(),
        name: "orphan".to_string(),
        category_id,
        label_ids: BTreeSet::from([label]),
        prompt_text: "text".to_string(),
        exclusive: false,
        created_at: chrono::Utc::now(),
    };
    let orphans = vec![
        make(Uuid::new_v4(), Uuid::new_v4()),
        make(Uuid::new_v4(), Uuid::new_v4()),
    ];

    assert_eq!(store.adopt_orphan_references(orphans.iter()), (2, 2));
    let mut names: Vec<&str> = store.categories().iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec![ORPHAN_CATEGORY_NAME, "unknown_category_2"]);
    let summary = store.recompute_usage_counts(orphans.iter()).expect("recompute");
    assert_eq!(summary.labels_used, 2);
}

#[test]
fn from_parts_rejects_duplicate_names() {
    let a = Label::new("same".to_string());
    let b = Label::new("same".to_string());
    assert!(matches!(
        MetadataStore::from_parts(Vec::new(), vec![a, b], 5),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn from_parts_rejects_unnormalized_names() {
    let spaced = Category::new("Writing Style".to_string(), 5, None);
    let err = MetadataStore::from_parts(vec![spaced], Vec::new(), 5).expect_err("spaced");
    assert!(err.to_string().contains("writing_style"), "{}", err);

    let comma = Category::new("a,b".to_string(), 5, None);
    assert!(matches!(
        MetadataStore::from_parts(vec![comma], Vec::new(), 5),
        Err(AppError::InvalidInput(_))
    ));

    let upper = Label::new("Formal".to_string());
    let lower = Label::new("formal".to_string());
    assert!(matches!(
        MetadataStore::from_parts(Vec::new(), vec![upper, lower], 5),
        Err(AppError::InvalidInput(_))
    ));

    let listed = Label::new("formal,polite".to_string());
    let store = MetadataStore::from_parts(Vec::new(), vec![listed.clone()], 5).expect("label");
    assert_eq!(store.find_by_name(MetadataKind::Label, "formal,polite"), Some(listed.id));
}
