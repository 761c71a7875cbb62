//! Serde round-trip tests for the AST and the diagnostic types, since both
//! are part of the public contract for LSP/JSON bridging.

use pcre_audit::{parse, LintIssue, Node, PatternFlags, Position, ReDoSReport, SemanticError, Severity};

fn round_trip(node: &Node) -> Node {
    let json = serde_json::to_string(node).expect("Node should serialize");
    serde_json::from_str(&json).expect("Node should deserialize")
}

#[test]
fn literal_round_trips() {
    let root = parse("/hello/").unwrap();
    assert_eq!(round_trip(&root), root);
}

#[test]
fn quantifier_round_trips() {
    let root = parse("/a{2,5}?/").unwrap();
    assert_eq!(round_trip(&root), root);
}

#[test]
fn character_class_round_trips() {
    let root = parse("/[a-z0-9_]/").unwrap();
    assert_eq!(round_trip(&root), root);
}

#[test]
fn nested_group_and_alternation_round_trip() {
    let root = parse("/(?<name>a|bc)+/").unwrap();
    assert_eq!(round_trip(&root), root);
}

#[test]
fn node_tag_is_the_variant_name() {
    let root = parse("/a/").unwrap();
    let json = serde_json::to_value(&root).unwrap();
    assert_eq!(json["type"], "Regex");
}

#[test]
fn semantic_error_round_trips() {
    let err = SemanticError::new("regex.backref.zero", "backreference to group 0", Position::new(0, 2));
    let json = serde_json::to_string(&err).unwrap();
    let back: SemanticError = serde_json::from_str(&json).unwrap();
    assert_eq!(back.code, err.code);
    assert_eq!(back.position, err.position);
}

#[test]
fn lint_issue_round_trips() {
    let issue = LintIssue::new("regex.lint.group.redundant_noncapturing", "redundant group").at(Position::new(0, 4));
    let json = serde_json::to_string(&issue).unwrap();
    let back: LintIssue = serde_json::from_str(&json).unwrap();
    assert_eq!(back, issue);
}

#[test]
fn redos_report_round_trips() {
    let mut report = ReDoSReport::safe();
    report.raise(Severity::Critical, "nested unbounded quantifiers");
    let json = serde_json::to_string(&report).unwrap();
    let back: ReDoSReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn pattern_flags_letters_round_trip_through_apply_inline() {
    let base = PatternFlags::from_letters("i");
    let toggled = base.apply_inline("-i");
    assert!(base.ignore_case);
    assert!(!toggled.ignore_case);
}
