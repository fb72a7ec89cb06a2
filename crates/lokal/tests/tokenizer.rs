//! Integration tests for the template tokenizer.

use insta::assert_snapshot;
use lokal::Pools;
use lokal::parser::{IssueKind, MAX_COLOR_NESTING, TokenKind, tokenize};
use proptest::prelude::*;

fn dump(source: &str) -> String {
    let pools = Pools::new();
    tokenize(source, &pools).to_string()
}

// =============================================================================
// Literals and escapes
// =============================================================================

#[test]
fn test_pure_literal() {
    assert_snapshot!(dump("Hello, world!"), @r#"
    Root
      Literal "Hello, world!"
    "#);
}

#[test]
fn test_empty_source_has_no_tokens() {
    let pools = Pools::new();
    let tree = tokenize("", &pools);
    assert!(tree.is_empty());
    assert_eq!(tree.root().children().count(), 0);
    assert_eq!(tree.to_string(), "Root");
}

#[test]
fn test_root_content_is_whole_source() {
    let pools = Pools::new();
    let source = "Deal {damage} to $Unit.name$";
    let tree = tokenize(source, &pools);
    assert_eq!(tree.source(), source);
    assert_eq!(tree.root().content(), source);
    assert_eq!(tree.root().kind(), TokenKind::Literal);
}

#[test]
fn test_escapes_resolve_to_their_character() {
    assert_snapshot!(dump(r"\$x\$"), @r#"
    Root
      Literal "$x$"
    "#);
}

#[test]
fn test_escapes_merge_into_surrounding_text() {
    assert_snapshot!(dump(r"Cost: \{5\} \§ \\ done"), @r#"
    Root
      Literal "Cost: {5} § \\ done"
    "#);
}

#[test]
fn test_trailing_backslash_is_text() {
    let pools = Pools::new();
    let tree = tokenize(r"50\", &pools);
    let children: Vec<_> = tree.root().children().collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].content(), r"50\");
}

// =============================================================================
// Key references
// =============================================================================

#[test]
fn test_key_references() {
    assert_snapshot!(dump("See $UI.Help.title$ and $@Status.burn$."), @r#"
    Root
      Literal "See "
      KeyReference "UI.Help.title"
      Literal " and "
      KeyReference "Status.burn" tooltip
      Literal "."
    "#);
}

#[test]
fn test_reference_content_is_everything_up_to_next_dollar() {
    assert_snapshot!(dump("Costs $5 off$ or $$"), @r#"
    Root
      Literal "Costs "
      KeyReference "5 off"
      Literal " or "
      KeyReference ""
    "#);
}

#[test]
fn test_dollar_without_closer_is_text() {
    let pools = Pools::new();
    let tree = tokenize("Costs $5", &pools);
    let children: Vec<_> = tree.root().children().collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].content(), "Costs $5");
    assert!(tree.issues().is_empty());
}

#[test]
fn test_key_reference_raw_span() {
    let pools = Pools::new();
    let tree = tokenize("a $@B.c$ d", &pools);
    let reference = tree.root().children().nth(1).unwrap();
    assert_eq!(reference.kind(), TokenKind::KeyReference);
    assert_eq!(reference.raw(), "$@B.c$");
    assert_eq!(reference.raw_span(), 2..8);
    assert_eq!(reference.content(), "B.c");
    assert!(reference.is_tooltip());
}

// =============================================================================
// Dynamic values
// =============================================================================

#[test]
fn test_dynamic_value_with_format() {
    assert_snapshot!(dump("Deal {damage:F1} damage"), @r#"
    Root
      Literal "Deal "
      DynamicValue "damage" format "F1"
      Literal " damage"
    "#);
}

#[test]
fn test_dynamic_value_nested_braces() {
    assert_snapshot!(dump("{a{b}c}{x:{y}}"), @r#"
    Root
      DynamicValue "a{b}c"
      DynamicValue "x" format "{y}"
    "#);
}

#[test]
fn test_dynamic_value_expression_is_kept_verbatim() {
    let pools = Pools::new();
    let tree = tokenize("{ (hp + 2) * 3 :N0}", &pools);
    let value = tree.root().children().next().unwrap();
    assert_eq!(value.kind(), TokenKind::DynamicValue);
    assert_eq!(value.content(), " (hp + 2) * 3 ");
    assert_eq!(value.metadata(), Some("N0"));
    assert!(!value.has_children());
}

// =============================================================================
// Color tags
// =============================================================================

#[test]
fn test_color_tag_with_dynamic_value() {
    assert_snapshot!(dump("Hello §R{damage:F1}§ world"), @r#"
    Root
      Literal "Hello "
      ColorTag R
        DynamicValue "damage" format "F1"
      Literal " world"
    "#);
}

#[test]
fn test_nested_color_tags() {
    assert_snapshot!(dump("§Gouter§Rinner§outer§"), @r#"
    Root
      ColorTag G
        Literal "outer"
        ColorTag R
          Literal "inner"
        Literal "outer"
    "#);
}

#[test]
fn test_hex_color_tag() {
    assert_snapshot!(dump("§#00FF00go§!"), @r#"
    Root
      ColorTag #00FF00
        Literal "go"
      Literal "!"
    "#);
}

#[test]
fn test_color_tag_content_is_inner_text() {
    let pools = Pools::new();
    let tree = tokenize("§Y$Unit.name$ wins§", &pools);
    let tag = tree.root().children().next().unwrap();
    assert_eq!(tag.kind(), TokenKind::ColorTag);
    assert_eq!(tag.metadata(), Some("Y"));
    assert_eq!(tag.content(), "$Unit.name$ wins");
    assert_eq!(tag.raw(), "§Y$Unit.name$ wins§");
    let kinds: Vec<TokenKind> = tag.children().map(|t| t.kind()).collect();
    assert_eq!(kinds, [TokenKind::KeyReference, TokenKind::Literal]);
}

#[test]
fn test_unbalanced_marks_close_at_first_mark() {
    assert_snapshot!(dump("§Y10§Gold"), @r#"
    Root
      ColorTag Y
        Literal "10"
      Literal "Gold"
    "#);
}

#[test]
fn test_lowercase_letter_is_not_a_color_code() {
    assert_snapshot!(dump("§rnot a tag§"), @r#"
    Root
      Literal "§rnot a tag§"
    "#);
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_unclosed_constructs_become_text() {
    let pools = Pools::new();
    let tree = tokenize("$open and {brace and §Runclosed", &pools);
    let children: Vec<_> = tree.root().children().collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].content(), "$open and {brace and §Runclosed");

    let issues: Vec<(IssueKind, _)> = tree
        .issues()
        .iter()
        .map(|issue| (issue.kind, issue.span.clone()))
        .collect();
    assert_eq!(
        issues,
        [
            (IssueKind::UnbalancedBraces, 10..11),
            (IssueKind::UnclosedColorTag, 21..23),
        ]
    );
}

#[test]
fn test_color_nesting_is_capped() {
    let openers = 5_000;
    let source = format!("{}x{}", "§R".repeat(openers), "§".repeat(openers));
    let pools = Pools::new();
    let tree = tokenize(&source, &pools);

    let mut depth = 0;
    let mut tag = tree.root().children().find(|t| t.kind() == TokenKind::ColorTag);
    while let Some(current) = tag {
        depth += 1;
        tag = current.children().find(|t| t.kind() == TokenKind::ColorTag);
    }
    assert_eq!(depth, MAX_COLOR_NESTING);

    assert_eq!(tree.issues().len(), openers - MAX_COLOR_NESTING);
    assert!(
        tree.issues()
            .iter()
            .all(|issue| issue.kind == IssueKind::ColorNestingTooDeep)
    );
    assert_eq!(tree.issues()[0].span, 0..2);
}

#[test]
fn test_recovery_keeps_later_constructs() {
    assert_snapshot!(dump("50{% off {rate:P0}"), @r#"
    Root
      Literal "50{% off "
      DynamicValue "rate" format "P0"
    "#);
}

#[test]
fn test_pool_is_balanced_after_drop() {
    let pools = Pools::new();
    {
        let tree = tokenize("§R§G§B{deep}§§§", &pools);
        assert!(!tree.is_empty());
        assert!(!pools.is_balanced());
    }
    assert!(pools.is_balanced());
}

#[test]
fn test_reused_tree_carries_nothing_over() {
    let pools = Pools::new();
    drop(tokenize("{a} $B$ §Rc§", &pools));
    let tree = tokenize("plain", &pools);
    assert_eq!(tree.to_string(), "Root\n  Literal \"plain\"");
    assert!(tree.issues().is_empty());
    assert_eq!(pools.trees.stats().created, 1);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn test_text_without_specials_is_one_literal(source in "[^$\\{§\\\\]{0,40}") {
        let pools = Pools::new();
        let tree = tokenize(&source, &pools);
        let children: Vec<_> = tree.root().children().collect();
        if source.is_empty() {
            prop_assert!(children.is_empty());
        } else {
            prop_assert_eq!(children.len(), 1);
            prop_assert_eq!(children[0].kind(), TokenKind::Literal);
            prop_assert_eq!(children[0].content(), source.as_str());
        }
    }

    #[test]
    fn test_any_input_tokenizes_and_returns_its_buffers(source in "\\PC{0,60}") {
        let pools = Pools::new();
        {
            let tree = tokenize(&source, &pools);
            prop_assert_eq!(tree.root().content(), source.as_str());
        }
        prop_assert!(pools.is_balanced());
    }

    #[test]
    fn test_escaping_specials_round_trips(source in "[a-z $\\{}§]{0,30}") {
        let mut escaped = String::new();
        for c in source.chars() {
            if matches!(c, '$' | '{' | '}' | '§') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        let pools = Pools::new();
        let tree = tokenize(&escaped, &pools);
        let text: String = tree.root().children().map(|t| t.content()).collect();
        prop_assert_eq!(text, source);
    }
}
