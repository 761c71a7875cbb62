//! Inductive length-range walk.
//!
//! Computes the `(min, max)` number of code points a subtree can consume,
//! where `max` is `None` when unbounded. The validator uses this to bound
//! lookbehind assertions, which PCRE requires to match a fixed or
//! width-limited number of characters.

use crate::core::nodes::Node;

/// `(min, max)` consumed length, `max = None` meaning unbounded.
pub type LengthRange = (u32, Option<u32>);

fn add(a: LengthRange, b: LengthRange) -> LengthRange {
    let min = a.0.saturating_add(b.0);
    let max = match (a.1, b.1) {
        (Some(x), Some(y)) => Some(x.saturating_add(y)),
        _ => None,
    };
    (min, max)
}

fn union(a: LengthRange, b: LengthRange) -> LengthRange {
    let min = a.0.min(b.0);
    let max = match (a.1, b.1) {
        (Some(x), Some(y)) => Some(x.max(y)),
        _ => None,
    };
    (min, max)
}

fn mul(range: LengthRange, min_reps: u32, max_reps: Option<u32>) -> LengthRange {
    let min = range.0.saturating_mul(min_reps);
    let max = match (range.1, max_reps) {
        (Some(x), Some(reps)) => Some(x.saturating_mul(reps)),
        (Some(0), None) => Some(0),
        _ => None,
    };
    (min, max)
}

/// Walk `node` bottom-up, returning the range of code points it can
/// consume. Backreferences and subroutine calls are treated as unbounded
/// (`(0, None)`), since their contribution depends on what they resolve to
/// and PCRE itself refuses variable-length backreferences inside
/// lookbehind — the validator surfaces that refusal separately, this walk
/// just needs to not under-report.
pub fn length_range(node: &Node) -> LengthRange {
    match node {
        Node::Literal { value, .. } => {
            let n = value.chars().count() as u32;
            (n, Some(n))
        }
        Node::CharLiteral { .. }
        | Node::CharType { .. }
        | Node::Dot { .. }
        | Node::ControlChar { .. }
        | Node::CharClass { .. }
        | Node::PosixClass { .. }
        | Node::UnicodeProp { .. }
        | Node::UnicodeNamed { .. }
        | Node::Unicode { .. }
        | Node::ScriptRun { .. } => (1, Some(1)),
        Node::Range { .. } | Node::ClassOperation { .. } => (1, Some(1)),
        Node::Sequence { children, .. } => {
            children.iter().fold((0, Some(0)), |acc, c| add(acc, length_range(c)))
        }
        Node::Alternation { alternatives, .. } => {
            let mut iter = alternatives.iter();
            match iter.next() {
                Some(first) => iter.fold(length_range(first), |acc, c| union(acc, length_range(c))),
                None => (0, Some(0)),
            }
        }
        Node::Group { child, kind, .. } => {
            if kind.is_lookaround() {
                (0, Some(0))
            } else {
                length_range(child)
            }
        }
        Node::Quantifier { child, repr, .. } => {
            let (min_reps, max_reps) = crate::core::cache::parse_quantifier_bounds(repr);
            mul(length_range(child), min_reps, max_reps)
        }
        Node::Conditional { yes, no, .. } => union(length_range(yes), length_range(no)),
        Node::Backref { .. } | Node::Subroutine { .. } => (0, None),
        Node::Regex { pattern, .. } => length_range(pattern),
        Node::Define { .. } => (0, Some(0)),
        _ if node.is_zero_width() => (0, Some(0)),
        _ => (0, None),
    }
}

/// True when `node`'s consumed length is provably bounded above — the
/// condition PCRE's lookbehind requires.
pub fn is_bounded(node: &Node) -> bool {
    length_range(node).1.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::{Greediness, Position};

    fn lit(s: &str) -> Node {
        Node::Literal {
            value: s.to_string(),
            is_raw: false,
            pos: Position::zero(),
        }
    }

    #[test]
    fn literal_length_is_exact() {
        assert_eq!(length_range(&lit("abc")), (3, Some(3)));
    }

    #[test]
    fn star_quantifier_is_unbounded() {
        let q = Node::Quantifier {
            child: Box::new(lit("a")),
            repr: "*".to_string(),
            greediness: Greediness::Greedy,
            pos: Position::zero(),
        };
        assert_eq!(length_range(&q), (0, None));
        assert!(!is_bounded(&q));
    }

    #[test]
    fn bounded_brace_quantifier_scales_range() {
        let q = Node::Quantifier {
            child: Box::new(lit("ab")),
            repr: "{2,3}".to_string(),
            greediness: Greediness::Greedy,
            pos: Position::zero(),
        };
        assert_eq!(length_range(&q), (4, Some(6)));
    }

    #[test]
    fn alternation_unions_branch_ranges() {
        let alt = Node::Alternation {
            alternatives: vec![lit("a"), lit("bcd")],
            pos: Position::zero(),
        };
        assert_eq!(length_range(&alt), (1, Some(3)));
    }

    #[test]
    fn lookaround_group_contributes_nothing() {
        let look = Node::Group {
            child: Box::new(lit("abc")),
            kind: crate::core::nodes::GroupKind::LookaheadPos,
            name: None,
            local_flags: None,
            pos: Position::zero(),
        };
        assert_eq!(length_range(&look), (0, Some(0)));
    }

    #[test]
    fn backreference_is_treated_unbounded() {
        let br = Node::Backref {
            reference: "1".to_string(),
            pos: Position::zero(),
        };
        assert!(!is_bounded(&br));
    }
}
