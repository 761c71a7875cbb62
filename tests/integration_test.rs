//! End-to-end scenarios pinned against the public API surface: parse, then
//! run each analysis, and check the result a user of the crate would see.

use pcre_audit::{lint, optimize, parse, profile_redos, validate, Node, Severity};

fn pattern_of(root: &Node) -> &Node {
    match root {
        Node::Regex { pattern, .. } => pattern,
        other => other,
    }
}

#[test]
fn s1_plain_pattern_parses_and_validates() {
    let root = parse("/hello/").expect("plain pattern should parse");
    assert!(validate(&root).is_ok());
    assert!(lint(&root).is_empty());
    assert_eq!(profile_redos(&root).severity, Severity::Safe);
}

#[test]
fn s2_dangling_backreference_is_rejected_by_validate() {
    let root = parse("/(a)\\5/").expect("pattern should parse even if semantically invalid");
    let err = validate(&root).expect_err("backreference to a nonexistent group must fail validation");
    assert_eq!(err.code, "regex.backref.missing_group");
}

#[test]
fn s3_useless_flags_on_plain_literal_are_linted() {
    let root = parse("/abc/ism").expect("pattern should parse");
    let issues = lint(&root);
    let codes: Vec<&str> = issues.iter().map(|i| i.code.as_str()).collect();
    assert!(codes.contains(&"regex.lint.flag.useless.i"));
    assert!(codes.contains(&"regex.lint.flag.useless.s"));
    assert!(codes.contains(&"regex.lint.flag.useless.m"));
}

#[test]
fn s4_digit_class_optimizes_to_char_type() {
    let root = parse("/[0-9]/").expect("pattern should parse");
    let optimized = optimize(&root);
    let want = parse("/\\d/").expect("pattern should parse");
    assert_eq!(
        format!("{:?}", pattern_of(&optimized)).replace(char::is_numeric, ""),
        format!("{:?}", pattern_of(&want)).replace(char::is_numeric, "")
    );
}

#[test]
fn s5_adjacent_classes_in_alternation_merge() {
    let root = parse("/[a-z]|[0-9]/").expect("pattern should parse");
    let optimized = optimize(&root);
    assert!(matches!(pattern_of(&optimized), Node::CharClass { .. }));
}

#[test]
fn s6_nested_unbounded_quantifiers_are_critical_redos_risk() {
    let root = parse("/(a+)+$/").expect("pattern should parse");
    let report = profile_redos(&root);
    assert_eq!(report.severity, Severity::Critical);
}

#[test]
fn s7_disjoint_siblings_stay_low_risk() {
    let root = parse("/a+[^a]+a/").expect("pattern should parse");
    let report = profile_redos(&root);
    assert!(report.severity <= Severity::Low);
}

#[test]
fn flags_round_trip_through_parse() {
    let root = parse("/x/imsuxUADSJ").expect("pattern with every flag should parse");
    let Node::Regex { flags, .. } = &root else { panic!("expected Regex root") };
    assert_eq!(flags, "imsuxUADSJ");
}

#[test]
fn positions_are_preserved_through_parse() {
    let root = parse("/ab/").expect("pattern should parse");
    let Node::Regex { pattern, .. } = &root else { panic!("expected Regex root") };
    let pos = pattern.pos();
    assert_eq!(pos.start, 0);
    assert_eq!(pos.end, 2);
}
