//! Integration tests for template evaluation through the translator.

use std::thread;

use lokal::interpreter::{Arguments, FormatRegistry};
use lokal::parser::MAX_COLOR_NESTING;
use lokal::{
    DecorationScope, DiagnosticKind, Evaluation, Key, Params, ReferenceDecoration, Severity,
    SubtractionMode, Translator, Value, params,
};

fn translator(pairs: &[(&str, &str)]) -> Translator {
    let mut translator = Translator::new();
    translator.reload(pairs.iter().copied()).unwrap();
    translator
}

fn render(translator: &Translator, template: &str, params: &Params) -> Evaluation {
    translator.render(template, translator.context(params))
}

fn key(text: &str) -> Key {
    Key::parse(text).unwrap()
}

// =============================================================================
// Literals, values, colors
// =============================================================================

#[test]
fn test_plain_text_renders_unchanged() {
    let t = Translator::new();
    let result = render(&t, "Just text.", &params! {});
    assert_eq!(result.text, "Just text.");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_colored_formatted_value() {
    let t = Translator::new();
    let result = render(
        &t,
        "Hello §R{damage:F1}§ world",
        &params! { "damage" => 12.34 },
    );
    assert_eq!(result.text, "Hello <color=#FF0000>12.3</color> world");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_nested_and_hex_colors() {
    let t = Translator::new();
    let result = render(&t, "§Gouter §#123ABCin§ out§", &params! {});
    assert_eq!(
        result.text,
        "<color=#00FF00>outer <color=#123ABC>in</color> out</color>"
    );
}

#[test]
fn test_unbalanced_color_marks_close_at_first_mark() {
    let t = Translator::new();
    let result = render(&t, "Costs §Y10§Gold", &params! {});
    assert_eq!(result.text, "Costs <color=#FFFF00>10</color>Gold");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_deep_color_nesting_is_cut_off() {
    let t = Translator::new();
    let openers = 8_000;
    let template = format!("{}x{}", "§R".repeat(openers), "§".repeat(openers));
    let result = render(&t, &template, &params! {});

    let kept = openers - MAX_COLOR_NESTING;
    let expected = format!(
        "{}{}x{}{}",
        "§R".repeat(kept),
        "<color=#FF0000>".repeat(MAX_COLOR_NESTING),
        "</color>".repeat(MAX_COLOR_NESTING),
        "§".repeat(kept),
    );
    assert_eq!(result.text, expected);
    assert_eq!(result.diagnostics.count(DiagnosticKind::TokenizationError), kept);
    assert!(!result.diagnostics.has_errors());
    assert!(t.pools().is_balanced());
}

#[test]
fn test_empty_color_tag() {
    let t = Translator::new();
    assert_eq!(render(&t, "§R§", &params! {}).text, "<color=#FF0000></color>");
}

#[test]
fn test_escapes_render_their_character() {
    let t = Translator::new();
    let result = render(&t, r"Costs \$5 \{not a value\}", &params! {});
    assert_eq!(result.text, "Costs $5 {not a value}");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_expression_precedence() {
    let t = Translator::new();
    let p = params! {};
    assert_eq!(render(&t, "{2+3*4}", &p).text, "14");
    assert_eq!(render(&t, "{(2+3)*4}", &p).text, "20");
    assert_eq!(render(&t, "{2^3+1}", &p).text, "9");
}

#[test]
fn test_legacy_subtraction_is_the_default() {
    let t = Translator::new();
    assert_eq!(render(&t, "{10 - 3}", &params! {}).text, "13");

    let arithmetic = Translator::builder()
        .subtraction(SubtractionMode::Arithmetic)
        .build();
    assert_eq!(render(&arithmetic, "{10 - 3}", &params! {}).text, "7");
}

#[test]
fn test_number_formats() {
    let t = Translator::new();
    let p = params! {
        "count" => 3,
        "ratio" => 0.25,
        "size" => 1536,
        "delta" => 5,
        "gold" => 1234567.891,
    };
    assert_eq!(render(&t, "{count}", &p).text, "3");
    assert_eq!(render(&t, "{ratio}", &p).text, "0.25");
    assert_eq!(render(&t, "{count:D3}", &p).text, "003");
    assert_eq!(render(&t, "{ratio:P1}", &p).text, "25.0 %");
    assert_eq!(render(&t, "{ratio:‰}", &p).text, "250‰");
    assert_eq!(render(&t, "{size:bytes}", &p).text, "1.5 KB");
    assert_eq!(render(&t, "{delta:+F0}", &p).text, "+5");
    assert_eq!(render(&t, "{gold:N2}", &p).text, "1,234,567.89");
    assert_eq!(render(&t, "{count:whatever}", &p).text, "3");
}

#[test]
fn test_string_values_ignore_format() {
    let t = Translator::new();
    let result = render(&t, "{name:F2}", &params! { "name" => "Orc" });
    assert_eq!(result.text, "Orc");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_custom_format_handler() {
    let mut t = Translator::new();
    t.formats_mut()
        .register(|value: f64, spec: &str| (spec == "stars").then(|| "*".repeat(value as usize)));
    assert_eq!(render(&t, "{3:stars}", &params! {}).text, "***");
}

// =============================================================================
// Key references
// =============================================================================

#[test]
fn test_key_reference_expands_recursively() {
    let t = translator(&[
        ("Unit.name", "Knight"),
        ("Combat.hit", "$Unit.name$ hits for {damage}"),
        ("Combat.log", "> $Combat.hit$"),
    ]);
    let text = t.translate(&key("Combat.log"), &params! { "damage" => 7 });
    assert_eq!(text, "> Knight hits for 7");
}

#[test]
fn test_key_reference_inside_color() {
    let t = translator(&[("Unit.name", "Knight")]);
    let result = render(&t, "§Y$Unit.name$§", &params! {});
    assert_eq!(result.text, "<color=#FFFF00>Knight</color>");
}

#[test]
fn test_missing_key_emits_raw_name() {
    let t = Translator::new();
    let result = render(&t, "$Unknown.Key$", &params! {});
    assert_eq!(result.text, "Unknown.Key");
    assert_eq!(result.diagnostics.len(), 1);

    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::KeyNotFound);
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert_eq!(diagnostic.span, Some(0..13));
    assert!(!result.diagnostics.has_errors());
}

#[test]
fn test_reference_with_invalid_key_is_not_found() {
    let t = Translator::new();
    let result = render(&t, "$Unknown Key$", &params! {});
    assert_eq!(result.text, "Unknown Key");
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::KeyNotFound);
    assert_eq!(diagnostic.span, Some(0..13));
}

#[test]
fn test_missing_key_suggests_siblings() {
    let t = translator(&[("UI.title", "Inventory"), ("UI.close", "Close")]);
    let result = render(&t, "$UI.titel$", &params! {});
    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert!(
        diagnostic.message.contains("did you mean: UI.title"),
        "{}",
        diagnostic.message
    );
}

#[test]
fn test_mutual_references_stop_at_depth_limit() {
    let t = translator(&[("A", "a$B$"), ("B", "b$A$")]);
    let result = t.translate_with(&key("A"), t.context(&params! {}));
    assert_eq!(result.diagnostics.count(DiagnosticKind::RecursionDepth), 1);
    assert!(result.text.starts_with("ababab"));
    assert!(result.text.ends_with('$'));
}

#[test]
fn test_depth_limit_is_configurable() {
    let mut t = Translator::builder().max_depth(2).build();
    t.reload([("Loop", "x$Loop$")]).unwrap();
    let result = t.translate_with(&key("Loop"), t.context(&params! {}));
    assert_eq!(result.text, "xxxx$Loop$");
    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::RecursionDepth);
    assert_eq!(diagnostic.depth, 2);
}

#[test]
fn test_translate_missing_key_returns_key_text() {
    let t = Translator::new();
    assert_eq!(t.translate(&key("No.Such.Key"), &params! {}), "No.Such.Key");
    let result = t.translate_with(&key("No.Such.Key"), t.context(&params! {}));
    assert_eq!(result.diagnostics.count(DiagnosticKind::KeyNotFound), 1);
}

#[test]
fn test_translate_missing_key_suggests_siblings() {
    let t = translator(&[("UI.title", "Inventory"), ("UI.close", "Close")]);
    let result = t.translate_with(&key("UI.titel"), t.context(&params! {}));
    assert_eq!(result.text, "UI.titel");
    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::KeyNotFound);
    assert_eq!(
        diagnostic.message,
        "key 'UI.titel' not found; did you mean: UI.title"
    );
}

#[test]
fn test_store_colors_are_normalized() {
    let t = translator(&[("Fx.hot", "<color=R>hot</color>")]);
    assert_eq!(
        t.translate(&key("Fx.hot"), &params! {}),
        "<color=#FF0000>hot</color>"
    );
}

// =============================================================================
// Decoration
// =============================================================================

#[test]
fn test_tooltip_references_are_decorated_by_default() {
    let t = translator(&[("Status.burn", "Burn")]);
    let result = render(&t, "Apply $@Status.burn$ or $Status.burn$", &params! {});
    assert_eq!(
        result.text,
        "Apply <link=Status.burn><u>Burn</u></link> or Burn"
    );
}

#[test]
fn test_decoration_scope_all_without_link() {
    let mut t = Translator::builder()
        .decoration(
            ReferenceDecoration::builder()
                .link(false)
                .scope(DecorationScope::All)
                .build(),
        )
        .build();
    t.reload([("Status.burn", "Burn")]).unwrap();
    let result = render(&t, "$@Status.burn$ $Status.burn$", &params! {});
    assert_eq!(result.text, "<u>Burn</u> <u>Burn</u>");
}

#[test]
fn test_decoration_can_be_disabled() {
    let mut t = Translator::builder()
        .decoration(ReferenceDecoration::NONE)
        .build();
    t.reload([("Status.burn", "Burn")]).unwrap();
    assert_eq!(render(&t, "$@Status.burn$", &params! {}).text, "Burn");
}

#[test]
fn test_missing_tooltip_reference_is_not_decorated() {
    let t = Translator::new();
    assert_eq!(render(&t, "$@Status.gone$", &params! {}).text, "Status.gone");
}

// =============================================================================
// Variables
// =============================================================================

#[test]
fn test_string_parameter_is_expanded() {
    let t = translator(&[("Unit.name", "Knight")]);
    let result = render(
        &t,
        "{who} arrives",
        &params! { "who" => "$Unit.name$ of §Bblue§" },
    );
    assert_eq!(result.text, "Knight of <color=#0000FF>blue</color> arrives");
}

#[test]
fn test_self_referencing_parameter_stops_at_depth_limit() {
    let t = Translator::new();
    let result = render(&t, "{loop}", &params! { "loop" => "{loop}" });
    assert_eq!(result.text, "{loop}");
    assert_eq!(result.diagnostics.count(DiagnosticKind::RecursionDepth), 1);
}

#[test]
fn test_variable_source_resolves_unbound_names() {
    let t = Translator::new();
    let source = |name: &str, args: &Arguments<'_>| -> Option<Value> {
        match name {
            "hp" => Some(Value::Number(42)),
            "stat" => {
                let kind = args.get("kind")?;
                let suffix = if args.has_flag("raw") { "!" } else { "" };
                Some(Value::from(format!("{kind}{suffix}")))
            }
            _ => None,
        }
    };
    let p = params! { "kind" => "min" };
    let ctx = t.context(&p).with_source(&source);

    assert_eq!(t.render("{hp * 2}", ctx).text, "84");
    assert_eq!(t.render("{stat<kind=max>}", ctx).text, "max");
    assert_eq!(t.render("{stat<raw>}", ctx).text, "min!");
}

#[test]
fn test_parameters_shadow_variable_source() {
    let t = Translator::new();
    let source = |_: &str, _: &Arguments<'_>| -> Option<Value> { Some(Value::Number(1)) };
    let p = params! { "hp" => 5 };
    let ctx = t.context(&p).with_source(&source);
    assert_eq!(t.render("{hp}/{mp}", ctx).text, "5/1");
}

#[test]
fn test_unresolved_variable_echoes_original() {
    let t = Translator::new();
    let result = render(&t, "HP: {missing}", &params! {});
    assert_eq!(result.text, "HP: {missing}");
    assert_eq!(result.diagnostics.count(DiagnosticKind::VariableResolution), 1);
    assert!(result.diagnostics.has_errors());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_parse_error_echoes_original() {
    let t = Translator::new();
    let result = render(&t, "x{2 +}y", &params! {});
    assert_eq!(result.text, "x{2 +}y");
    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::ParseError);
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.context, "{2 +}");
    assert_eq!(diagnostic.span, Some(1..6));
}

#[test]
fn test_division_by_zero_is_evaluation_error() {
    let t = Translator::new();
    let result = render(&t, "{1/0}", &params! {});
    assert_eq!(result.text, "{1/0}");
    assert_eq!(result.diagnostics.count(DiagnosticKind::EvaluationError), 1);
}

#[test]
fn test_unbalanced_brace_is_tokenization_warning() {
    let t = Translator::new();
    let result = render(&t, "50{% off", &params! {});
    assert_eq!(result.text, "50{% off");
    assert_eq!(result.diagnostics.count(DiagnosticKind::TokenizationError), 1);
    assert!(!result.diagnostics.has_errors());
}

#[test]
fn test_panicking_source_is_unexpected_error() {
    let t = Translator::new();
    let source = |_: &str, _: &Arguments<'_>| -> Option<Value> { panic!("source exploded") };
    let p = params! {};
    let result = t.render("a {boom} b", t.context(&p).with_source(&source));
    assert_eq!(result.text, "a {boom} b");
    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::UnexpectedError);
    assert!(diagnostic.message.contains("source exploded"));
    assert!(t.pools().is_balanced());
}

#[test]
fn test_panicking_format_handler_is_unexpected_error() {
    let mut formats = FormatRegistry::with_defaults();
    formats.register(|_: f64, spec: &str| -> Option<String> {
        if spec == "boom" {
            panic!("formatter exploded");
        }
        None
    });
    let t = Translator::builder().formats(formats).build();
    let result = render(&t, "{1:boom} {2:F0}", &params! {});
    assert_eq!(result.text, "{1:boom} 2");
    assert_eq!(result.diagnostics.count(DiagnosticKind::UnexpectedError), 1);
}

#[test]
fn test_diagnostics_accumulate_in_order() {
    let t = Translator::new();
    let result = render(&t, "$Gone$ {nope} {1/0}", &params! {});
    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            DiagnosticKind::KeyNotFound,
            DiagnosticKind::VariableResolution,
            DiagnosticKind::EvaluationError,
        ]
    );
}

// =============================================================================
// Tree reuse, pools, threads
// =============================================================================

#[test]
fn test_evaluate_pretokenized_tree() {
    let t = translator(&[("Unit.name", "Knight")]);
    let tree = t.tokenize("$Unit.name$: {hp}");
    let first = t.evaluate(&tree, t.context(&params! { "hp" => 10 }));
    let second = t.evaluate(&tree, t.context(&params! { "hp" => 3 }));
    assert_eq!(first.text, "Knight: 10");
    assert_eq!(second.text, "Knight: 3");
}

#[test]
fn test_pools_are_balanced_after_rendering() {
    let t = translator(&[
        ("A", "§R$B$§ {x}"),
        ("B", "{y} $C$"),
        ("C", "§G{z:F1}§"),
    ]);
    let p = params! { "x" => "$B$", "y" => 1, "z" => 2.5 };
    for _ in 0..3 {
        let text = t.translate(&key("A"), &p);
        assert_eq!(
            text,
            "<color=#FF0000>1 <color=#00FF00>2.5</color></color> 1 <color=#00FF00>2.5</color>"
        );
    }
    assert!(t.pools().is_balanced());
    assert!(t.pools().strings.stats().created < t.pools().strings.stats().rented);
}

#[test]
fn test_concurrent_translation() {
    let t = translator(&[("Unit.name", "Knight"), ("Greet", "Hail, $Unit.name$ #{n}!")]);
    thread::scope(|scope| {
        for n in 0..4 {
            let t = &t;
            scope.spawn(move || {
                for _ in 0..50 {
                    let text = t.translate(&key("Greet"), &params! { "n" => n });
                    assert_eq!(text, format!("Hail, Knight #{n}!"));
                }
            });
        }
    });
    assert!(t.pools().is_balanced());
}

// =============================================================================
// Completion
// =============================================================================

#[test]
fn test_options_and_lookup() {
    let t = translator(&[
        ("UI.Item.Sword.name", "Sword"),
        ("UI.Item.Shield.name", "Shield"),
        ("UI.Item.Potion.name", "Potion"),
    ]);
    assert_eq!(t.options("UI.Item.S"), ["Shield", "Sword"]);
    assert_eq!(t.options("UI.Item."), ["Potion", "Shield", "Sword"]);
    assert_eq!(t.options("UI"), ["UI"]);
    assert!(t.options("UI.Nothing.x").is_empty());

    let keys: Vec<String> = t
        .lookup(&key("UI.Item.Sword"))
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(keys, ["UI.Item.Sword.name"]);
}
