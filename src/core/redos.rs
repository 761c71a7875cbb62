//! ReDoS profiler.
//!
//! Assigns a `Severity` and a set of human-readable recommendations by
//! walking the tree bottom-up, tracking the ambient nesting of unbounded
//! quantifiers and atomic contexts as it goes. Severity is max-wins: a
//! subtree's report absorbs its children's reports, keeping the worse
//! finding and the union of recommendations (`ReDoSReport::absorb`).
//!
//! Never mutates the AST.

use crate::core::charset::{first_chars, last_chars};
use crate::core::errors::{ReDoSReport, Severity};
use crate::core::flags::PatternFlags;
use crate::core::length_range::length_range;
use crate::core::nodes::{Greediness, GroupKind, Node};
use crate::core::visit::Visitor;

pub fn profile_redos(root: &Node) -> ReDoSReport {
    let flags = match root {
        Node::Regex { flags, .. } => PatternFlags::from_letters(flags),
        _ => PatternFlags::default(),
    };
    let mut profiler = Redos {
        unbounded_depth: 0,
        total_depth: 0,
        in_atomic: false,
        flags,
    };
    profiler.visit(root)
}

struct Redos {
    /// Count of unbounded, non-possessive, non-atomic quantifiers currently
    /// enclosing the node being visited.
    unbounded_depth: u32,
    /// Count of any quantifier currently enclosing the node being visited.
    total_depth: u32,
    in_atomic: bool,
    flags: PatternFlags,
}

fn cap_at_low(mut report: ReDoSReport) -> ReDoSReport {
    if report.severity > Severity::Low {
        report.severity = Severity::Low;
    }
    report
}

/// Strip the wrapping a quantifier's child always has when the author
/// repeats an alternation: `(?:a|ab)+` parses to
/// `Quantifier{ child: Group{ child: Alternation } }`, never a bare
/// `Alternation`. Unwraps pass-through groups and singleton sequences until
/// something else is found.
fn unwrap_pass_through(node: &Node) -> &Node {
    match node {
        Node::Group { child, kind, .. } if !kind.is_lookaround() => unwrap_pass_through(child),
        Node::Sequence { children, .. } if children.len() == 1 => unwrap_pass_through(&children[0]),
        other => other,
    }
}

/// True when `node`'s trailing element is one of the backtracking-control
/// verbs that make the preceding match irrevocable, the same effect entering
/// an atomic group has.
fn ends_with_control_verb(node: &Node) -> bool {
    fn is_control_verb(node: &Node) -> bool {
        matches!(node, Node::PcreVerb { verb, .. } if matches!(verb.as_str(), "COMMIT" | "PRUNE" | "SKIP"))
    }
    match node {
        Node::Sequence { children, .. } => children.last().is_some_and(is_control_verb),
        other => is_control_verb(other),
    }
}

/// Conservative approximation of a backreference-driven backtracking loop:
/// true when `node` contains both a capturing group of non-fixed length and a
/// backreference anywhere in the same subtree. A precise check would match
/// the backref's target group number against the variable-length group
/// specifically; this approximation errs toward flagging too much rather
/// than missing a real loop.
fn subtree_has_backref_loop(node: &Node) -> bool {
    let mut has_variable_capture = false;
    let mut has_backref = false;
    scan_backref_loop(node, &mut has_variable_capture, &mut has_backref);
    has_variable_capture && has_backref
}

fn scan_backref_loop(node: &Node, has_variable_capture: &mut bool, has_backref: &mut bool) {
    match node {
        Node::Backref { .. } => *has_backref = true,
        Node::Group { child, kind, .. } => {
            if kind.is_capturing() {
                let (min, max) = length_range(child);
                if max.map_or(true, |m| m != min) {
                    *has_variable_capture = true;
                }
            }
            scan_backref_loop(child, has_variable_capture, has_backref);
        }
        Node::Sequence { children, .. } => {
            for c in children {
                scan_backref_loop(c, has_variable_capture, has_backref);
            }
        }
        Node::Alternation { alternatives, .. } => {
            for a in alternatives {
                scan_backref_loop(a, has_variable_capture, has_backref);
            }
        }
        Node::Quantifier { child, .. } => scan_backref_loop(child, has_variable_capture, has_backref),
        Node::Conditional { condition, yes, no, .. } => {
            scan_backref_loop(condition, has_variable_capture, has_backref);
            scan_backref_loop(yes, has_variable_capture, has_backref);
            scan_backref_loop(no, has_variable_capture, has_backref);
        }
        Node::Define { content, .. } => scan_backref_loop(content, has_variable_capture, has_backref),
        _ => {}
    }
}

/// If `node` is an unbounded, non-possessive quantifier, its repeated child.
fn unbounded_quantified_child(node: &Node) -> Option<&Node> {
    if let Node::Quantifier { child, repr, greediness, .. } = node {
        if matches!(greediness, Greediness::Possessive) {
            return None;
        }
        let (_, max) = crate::core::cache::parse_quantifier_bounds(repr);
        if max.is_none() {
            return Some(child);
        }
    }
    None
}

impl Visitor for Redos {
    type Output = ReDoSReport;

    fn neutral(&self) -> Self::Output {
        ReDoSReport::safe()
    }

    fn visit_regex(&mut self, node: &Node) -> Self::Output {
        if let Node::Regex { pattern, .. } = node {
            self.visit(pattern)
        } else {
            self.neutral()
        }
    }

    fn visit_sequence(&mut self, node: &Node) -> Self::Output {
        let Node::Sequence { children, .. } = node else { return self.neutral() };
        let mut report = ReDoSReport::safe();
        let child_reports: Vec<ReDoSReport> = children.iter().map(|c| self.visit(c)).collect();
        for cr in &child_reports {
            report.absorb(cr.clone());
        }
        for i in 0..children.len().saturating_sub(1) {
            if let Some(inner) = unbounded_quantified_child(&children[i]) {
                let last = last_chars(inner, &self.flags);
                let first = first_chars(&children[i + 1], &self.flags);
                if !last.provably_disjoint(&first) {
                    report.raise(
                        Severity::Medium,
                        "content following an unbounded quantifier is not provably disjoint from what it repeats, risking backtracking ambiguity",
                    );
                }
            }
        }
        report
    }

    fn visit_alternation(&mut self, node: &Node) -> Self::Output {
        let Node::Alternation { alternatives, .. } = node else { return self.neutral() };
        let mut report = ReDoSReport::safe();
        for alt in alternatives {
            report.absorb(self.visit(alt));
        }
        report
    }

    fn visit_group(&mut self, node: &Node) -> Self::Output {
        let Node::Group { child, kind, .. } = node else { return self.neutral() };
        let atomic_here = matches!(kind, GroupKind::Atomic);
        let saved = self.in_atomic;
        if atomic_here {
            self.in_atomic = true;
        }
        let mut report = self.visit(child);
        if atomic_here {
            report = cap_at_low(report);
        }
        self.in_atomic = saved;
        report
    }

    fn visit_quantifier(&mut self, node: &Node) -> Self::Output {
        let Node::Quantifier { child, repr, greediness, .. } = node else { return self.neutral() };
        let (_, max) = crate::core::cache::parse_quantifier_bounds(repr);
        let unbounded = max.is_none();
        let possessive = matches!(greediness, Greediness::Possessive);
        let atomic_here = possessive || ends_with_control_verb(child);
        let becomes_atomic = self.in_atomic || atomic_here;

        let mut report = ReDoSReport::safe();

        if unbounded && subtree_has_backref_loop(child) {
            report.raise(
                Severity::Critical,
                "a variable-length capturing group and a backreference to it both sit inside this unbounded quantifier",
            );
        }

        if unbounded {
            if let Node::Alternation { alternatives, .. } = unwrap_pass_through(child) {
                'pairs: for i in 0..alternatives.len() {
                    for j in (i + 1)..alternatives.len() {
                        let fi = first_chars(&alternatives[i], &self.flags);
                        let fj = first_chars(&alternatives[j], &self.flags);
                        if fi.intersects(&fj) {
                            report.raise(
                                Severity::Critical,
                                "alternation branches repeated by this unbounded quantifier overlap in their starting characters",
                            );
                            break 'pairs;
                        }
                    }
                }
            }
        }

        let was_unbounded_depth = self.unbounded_depth;
        let was_total_depth = self.total_depth;

        if unbounded && !becomes_atomic {
            report.raise(Severity::Low, "unbounded quantifier present");
            if was_unbounded_depth > 0 {
                report.raise(
                    Severity::Critical,
                    "nested unbounded quantifiers (Star Height > 1)",
                );
            }
            self.unbounded_depth += 1;
        }
        if !unbounded {
            if let Some(m) = max {
                if m > 1000 {
                    report.raise(Severity::Low, "quantifier upper bound exceeds 1000 repetitions");
                }
            }
            if was_total_depth > 0 {
                report.raise(Severity::Low, "nested bounded quantifiers");
            }
        }
        self.total_depth += 1;

        let saved_in_atomic = self.in_atomic;
        self.in_atomic = becomes_atomic;
        let mut child_report = self.visit(child);
        self.in_atomic = saved_in_atomic;

        self.unbounded_depth = was_unbounded_depth;
        self.total_depth = was_total_depth;

        if becomes_atomic {
            child_report = cap_at_low(child_report);
        } else if unbounded && child_report.severity == Severity::High {
            report.raise(
                Severity::Critical,
                "unbounded quantifier nests an already-High-severity subtree",
            );
        }

        report.absorb(child_report);
        report
    }

    fn visit_subroutine(&mut self, _node: &Node) -> Self::Output {
        let mut report = ReDoSReport::safe();
        report.raise(
            Severity::Medium,
            "subroutine calls are hard to prove non-recursive and safe",
        );
        report
    }

    fn visit_conditional(&mut self, node: &Node) -> Self::Output {
        let Node::Conditional { condition, yes, no, .. } = node else { return self.neutral() };
        let mut report = self.visit(condition);
        report.absorb(self.visit(yes));
        report.absorb(self.visit(no));
        report
    }

    fn visit_define(&mut self, node: &Node) -> Self::Output {
        if let Node::Define { content, .. } = node {
            self.visit(content)
        } else {
            self.neutral()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse;

    fn profile(pattern: &str) -> ReDoSReport {
        let root = parse(pattern).expect("pattern should parse");
        profile_redos(&root)
    }

    #[test]
    fn s6_nested_unbounded_quantifier_is_critical() {
        let report = profile("/(a+)+$/");
        assert_eq!(report.severity, Severity::Critical);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("Star Height > 1")));
    }

    #[test]
    fn s7_disjoint_boundaries_downgrade_to_low() {
        let report = profile("/a+[^a]+a/");
        assert!(report.severity <= Severity::Low);
        assert!(!report.recommendations.iter().any(|r| r.contains("overlap")));
    }

    #[test]
    fn plain_literal_is_safe() {
        let report = profile("/abc/");
        assert_eq!(report.severity, Severity::Safe);
    }

    #[test]
    fn single_unbounded_quantifier_alone_is_low() {
        let report = profile("/a+/");
        assert_eq!(report.severity, Severity::Low);
    }

    #[test]
    fn overlapping_alternation_in_unbounded_quantifier_is_critical() {
        let report = profile("/(?:a|ab)+/");
        assert_eq!(report.severity, Severity::Critical);
    }

    #[test]
    fn atomic_group_caps_nested_severity_at_low() {
        let report = profile("/(?>(a+)+)/");
        assert_eq!(report.severity, Severity::Low);
    }

    #[test]
    fn subroutine_call_raises_medium() {
        let report = profile("/(a)\\g<1>/");
        assert!(report.severity >= Severity::Medium);
    }

    #[test]
    fn bounded_quantifier_large_max_is_low() {
        let report = profile("/a{0,2000}/");
        assert_eq!(report.severity, Severity::Low);
    }
}
