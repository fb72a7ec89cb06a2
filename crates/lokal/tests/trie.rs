//! Integration tests for the segment trie.

use lokal::{Key, Trie};

fn key(text: &str) -> Key {
    Key::parse(text).unwrap()
}

fn sample() -> Trie<&'static str> {
    [
        ("UI.Item.Sword.name", "Sword"),
        ("UI.Item.Sword.desc", "A blade"),
        ("UI.Item.Shield.name", "Shield"),
        ("UI.title", "Inventory"),
        ("Status.burn", "Burn"),
    ]
    .into_iter()
    .map(|(k, v)| (key(k), v))
    .collect()
}

// =============================================================================
// Insert and lookup
// =============================================================================

#[test]
fn test_insert_and_get() {
    let mut trie = Trie::new();
    assert_eq!(trie.insert(&key("A.B"), 1), None);
    assert_eq!(trie.get(&key("A.B")), Some(&1));
    assert_eq!(trie.get(&key("A")), None);
    assert_eq!(trie.len(), 1);
}

#[test]
fn test_insert_replaces_and_returns_previous() {
    let mut trie = Trie::new();
    trie.insert(&key("A.B"), 1);
    assert_eq!(trie.insert(&key("A.B"), 2), Some(1));
    assert_eq!(trie.get(&key("A.B")), Some(&2));
    assert_eq!(trie.len(), 1);
}

#[test]
fn test_value_at_interior_node() {
    let mut trie = Trie::new();
    trie.insert(&key("A.B"), "child");
    trie.insert(&key("A"), "parent");
    assert_eq!(trie.get(&key("A")), Some(&"parent"));
    assert_eq!(trie.get(&key("A.B")), Some(&"child"));
    assert_eq!(trie.len(), 2);
}

#[test]
fn test_get_mut() {
    let mut trie = sample();
    *trie.get_mut(&key("UI.title")).unwrap() = "Bag";
    assert_eq!(trie.get(&key("UI.title")), Some(&"Bag"));
    assert!(trie.get_mut(&key("UI.Item")).is_none());
}

#[test]
fn test_root_key_stores_a_value() {
    let mut trie = Trie::new();
    trie.insert(&Key::root(), 0);
    assert_eq!(trie.get(&Key::root()), Some(&0));
    assert_eq!(trie.len(), 1);
}

// =============================================================================
// Segments
// =============================================================================

#[test]
fn test_segment_first_level_keys_are_sorted() {
    let trie = sample();
    let items = trie.segment(&key("UI.Item")).unwrap();
    let names: Vec<&str> = items.first_level_keys().collect();
    assert_eq!(names, ["Shield", "Sword"]);
    assert_eq!(items.len(), 3);
    assert!(!items.is_terminal());
}

#[test]
fn test_segment_of_missing_path_is_none() {
    let trie = sample();
    assert!(trie.segment(&key("UI.Missing")).is_none());
    assert!(trie.segment(&key("UI.title.extra")).is_none());
}

#[test]
fn test_segment_keys_are_depth_first() {
    let trie = sample();
    let keys: Vec<String> = trie
        .segment(&key("UI"))
        .unwrap()
        .keys()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        keys,
        [
            "UI.Item.Shield.name",
            "UI.Item.Sword.desc",
            "UI.Item.Sword.name",
            "UI.title",
        ]
    );
}

#[test]
fn test_segment_child_navigation() {
    let trie = sample();
    let ui = trie.segment(&key("UI")).unwrap();
    let title = ui.child("title").unwrap();
    assert!(title.is_terminal());
    assert_eq!(title.value(), Some(&"Inventory"));
    assert_eq!(title.key().as_str(), "UI.title");
    assert!(ui.child("nope").is_none());

    let children: Vec<String> = ui.children().map(|c| c.key().to_string()).collect();
    assert_eq!(children, ["UI.Item", "UI.title"]);
}

#[test]
fn test_root_segment_covers_everything() {
    let trie = sample();
    let root = trie.root();
    assert_eq!(root.len(), 5);
    let names: Vec<&str> = root.first_level_keys().collect();
    assert_eq!(names, ["Status", "UI"]);
    assert_eq!(trie.segment(&Key::root()).unwrap().len(), 5);
}

#[test]
fn test_iter_yields_pairs_in_segment_order() {
    let trie = sample();
    let pairs: Vec<(String, &str)> = trie.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    assert_eq!(pairs[0], ("Status.burn".to_string(), "Burn"));
    assert_eq!(pairs.len(), 5);
    assert_eq!(trie.iter().len(), 5);
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn test_remove_returns_value_and_prunes() {
    let mut trie = sample();
    assert_eq!(trie.remove(&key("UI.Item.Shield.name")), Some("Shield"));
    assert!(trie.segment(&key("UI.Item.Shield")).is_none());

    let names: Vec<&str> = trie
        .segment(&key("UI.Item"))
        .unwrap()
        .first_level_keys()
        .collect();
    assert_eq!(names, ["Sword"]);
    assert_eq!(trie.len(), 4);
}

#[test]
fn test_remove_last_value_prunes_whole_branch() {
    let mut trie = sample();
    trie.remove(&key("Status.burn"));
    assert!(trie.segment(&key("Status")).is_none());
    let names: Vec<&str> = trie.root().first_level_keys().collect();
    assert_eq!(names, ["UI"]);
}

#[test]
fn test_remove_missing_key_changes_nothing() {
    let mut trie = sample();
    assert_eq!(trie.remove(&key("UI.Item")), None);
    assert_eq!(trie.remove(&key("Nope.Never")), None);
    assert_eq!(trie.len(), 5);
    assert_eq!(trie.segment(&key("UI.Item")).unwrap().len(), 3);
}

#[test]
fn test_remove_parent_keeps_child() {
    let mut trie = Trie::new();
    trie.insert(&key("A"), 1);
    trie.insert(&key("A.B"), 2);

    assert_eq!(trie.remove(&key("A")), Some(1));
    assert_eq!(trie.get(&key("A.B")), Some(&2));
    let a = trie.segment(&key("A")).unwrap();
    assert!(!a.is_terminal());
    assert_eq!(a.len(), 1);
}

#[test]
fn test_remove_child_keeps_terminal_parent() {
    let mut trie = Trie::new();
    trie.insert(&key("A"), 1);
    trie.insert(&key("A.B"), 2);

    assert_eq!(trie.remove(&key("A.B")), Some(2));
    let a = trie.segment(&key("A")).unwrap();
    assert!(a.is_terminal());
    assert_eq!(a.first_level_keys().count(), 0);
    assert_eq!(trie.len(), 1);
}

#[test]
fn test_clear() {
    let mut trie = sample();
    trie.clear();
    assert!(trie.is_empty());
    assert!(trie.keys().is_empty());
}

#[test]
fn test_debug_lists_entries_in_order() {
    let mut trie = Trie::new();
    trie.insert(&key("UI.title"), "Inventory");
    trie.insert(&key("UI.Item.name"), "Sword");
    assert_eq!(
        format!("{trie:?}"),
        r#"{Key("UI.Item.name"): "Sword", Key("UI.title"): "Inventory"}"#
    );
}
