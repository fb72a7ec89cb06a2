// Test key! in a struct field and in trie lookups
use lokal::{Trie, key};

struct Labels {
    title: lokal::Key,
}

fn main() {
    let labels = Labels { title: key!("Menu.title") };
    let mut trie = Trie::new();
    trie.insert(&labels.title, "Main menu");
    assert_eq!(trie.get(&key!("Menu.title")), Some(&"Main menu"));
}
