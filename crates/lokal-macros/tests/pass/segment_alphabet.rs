// Test that every character of the segment alphabet is accepted
use lokal::key;

fn main() {
    let key = key!("Stats.hp_max.+5.-1.A-b_c");
    assert_eq!(key.last(), Some("A-b_c"));
    assert_eq!(key.parent().map(|p| p.to_string()), Some("Stats.hp_max.+5.-1".to_string()));
}
