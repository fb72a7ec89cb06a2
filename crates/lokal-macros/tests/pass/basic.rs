// Test basic key! usage compiles and builds the expected key
use lokal::{Key, key};

fn main() {
    let name = key!("UI.Item.Sword.name");
    assert_eq!(name.len(), 4);
    assert_eq!(name.as_str(), "UI.Item.Sword.name");
    assert_eq!(name, Key::parse("UI.Item.Sword.name").unwrap());

    let root = key!("");
    assert!(root.is_root());
}
