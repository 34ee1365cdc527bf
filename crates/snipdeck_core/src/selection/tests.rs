use super::*;
use crate::test_support::{scenario, Scenario};

fn input(s: &Scenario) -> FilterInput<'_> {
    FilterInput {
        snippets: &s.snippets,
        metadata: &s.metadata,
    }
}

#[test]
fn exclusive_selection_clears_everything_else() {
    let s = scenario();
    let mut manager = SelectionStateManager::new(LabelMode::And, input(&s));
    manager.set_state(s.second, SelectionState::Selected, false);
    manager.set_state(s.third, SelectionState::Selected, false);

    let cleared = manager.set_state(s.first, SelectionState::Selected, true);

    assert_eq!(manager.selected_ids(), &BTreeSet::from([s.first]));
    assert_eq!(cleared.len(), 2);
}

#[test]
fn non_exclusive_selection_clears_the_exclusive_one() {
    let s = scenario();
    let mut manager = SelectionStateManager::new(LabelMode::And, input(&s));
    manager.set_state(s.first, SelectionState::Selected, true);

    let cleared = manager.set_state(s.second, SelectionState::Selected, false);

    assert_eq!(cleared, vec![s.first]);
    assert_eq!(manager.selected_ids(), &BTreeSet::from([s.second]));
    manager.set_state(s.third, SelectionState::Selected, false);
    assert_eq!(manager.selected_ids().len(), 2);
}

#[test]
fn unselect_and_clear_selections_ignore_visibility() {
    let s = scenario();
    let mut manager = SelectionStateManager::new(LabelMode::And, input(&s));
    for id in [s.first, s.second, s.third] {
        manager.set_state(id, SelectionState::Selected, false);
    }
    manager.set_search_text("typed", input(&s));

    manager.clear_selections([&s.first, &s.second]);
    assert_eq!(manager.selected_ids(), &BTreeSet::from([s.third]));
    manager.set_state(s.third, SelectionState::Unselected, false);
    assert_eq!(manager.get_state(&s.third), SelectionState::Unselected);
}

#[test]
fn clear_search_filter_keeps_bubbles_and_selection() {
    let s = scenario();
    let mut manager = SelectionStateManager::new(LabelMode::And, input(&s));
    let writing = s.category("writing");
    manager.set_state(s.first, SelectionState::Selected, false);
    manager.toggle_bubble(MetadataKind::Category, writing, input(&s));
    manager.set_search_text("casual", input(&s));
    assert_eq!(manager.filtered_ids(), &BTreeSet::from([s.second]));

    manager.clear_search_filter(input(&s));

    assert_eq!(manager.criteria().categories, BTreeSet::from([writing]));
    assert!(manager.criteria().search.is_empty());
    assert_eq!(manager.selected_ids(), &BTreeSet::from([s.first]));
    assert_eq!(manager.filtered_ids(), &BTreeSet::from([s.first, s.second]));
    assert!(manager.is_filtered());
}

#[test]
fn highlight_is_selection_intersect_filtered() {
    let s = scenario();
    let mut manager = SelectionStateManager::new(LabelMode::And, input(&s));
    manager.set_state(s.first, SelectionState::Selected, false);
    manager.set_state(s.third, SelectionState::Selected, false);

    manager.toggle_bubble(MetadataKind::Category, s.category("coding"), input(&s));
    assert_eq!(manager.highlighted_ids(), BTreeSet::from([s.third]));

    // A hidden selection stays selected and reappears once visible.
    manager.reset_filters(input(&s));
    assert!(!manager.is_filtered());
    assert_eq!(manager.highlighted_ids(), BTreeSet::from([s.first, s.third]));
}

#[test]
fn reset_filters_keeps_label_mode() {
    let s = scenario();
    let mut manager = SelectionStateManager::new(LabelMode::Or, input(&s));
    manager.toggle_bubble(MetadataKind::Label, s.label("formal"), input(&s));
    manager.set_label_mode(LabelMode::And, input(&s));

    manager.reset_filters(input(&s));

    assert_eq!(manager.criteria().label_mode, LabelMode::And);
    assert!(manager.criteria().labels.is_empty());
    assert_eq!(manager.filtered_ids().len(), 3);
}

#[test]
fn exclusive_flag_edit_deselects_when_others_are_selected() {
    let s = scenario();
    let mut manager = SelectionStateManager::new(LabelMode::And, input(&s));
    manager.set_state(s.first, SelectionState::Selected, false);
    manager.set_state(s.second, SelectionState::Selected, false);

    assert!(manager.reconcile_exclusive_flag(s.first, true));
    assert_eq!(manager.selected_ids(), &BTreeSet::from([s.second]));

    // Alone in the selection, it simply becomes the exclusive one.
    assert!(!manager.reconcile_exclusive_flag(s.second, true));
    let cleared = manager.set_state(s.third, SelectionState::Selected, false);
    assert_eq!(cleared, vec![s.second]);
}
