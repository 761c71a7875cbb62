//! Character-set analyzer.
//!
//! Computes `first_chars`/`last_chars`: an overapproximation of the code
//! points a subtree can begin or end a match with. Used by the linter, the
//! validator is not a consumer directly but the optimizer and the ReDoS
//! profiler both lean on it to prove two subtrees are disjoint.
//!
//! `CharSet` is a sorted vector of disjoint, closed `[lo, hi]` intervals,
//! which keeps union, intersection-test, and emptiness all close to linear
//! in the number of intervals.

use crate::core::flags::PatternFlags;
use crate::core::nodes::{ClassOpKind, GroupKind, Node};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharSet {
    /// Analysis gave up: treat as "might be anything".
    Unknown,
    /// No string can match (e.g. an empty alternation branch set).
    Empty,
    /// A finite union of disjoint, sorted, closed intervals `[lo, hi]`.
    Intervals(Vec<(i32, i32)>),
}

impl CharSet {
    pub fn single(cp: i32) -> Self {
        CharSet::Intervals(vec![(cp, cp)])
    }

    pub fn range(lo: i32, hi: i32) -> Self {
        if lo > hi {
            CharSet::Empty
        } else {
            CharSet::Intervals(vec![(lo, hi)])
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CharSet::Unknown)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CharSet::Empty) || matches!(self, CharSet::Intervals(v) if v.is_empty())
    }

    /// Union of two sets. `Unknown` absorbs anything; `Empty` is the
    /// identity.
    pub fn union(&self, other: &CharSet) -> CharSet {
        match (self, other) {
            (CharSet::Unknown, _) | (_, CharSet::Unknown) => CharSet::Unknown,
            (CharSet::Empty, x) | (x, CharSet::Empty) => x.clone(),
            (CharSet::Intervals(a), CharSet::Intervals(b)) => {
                let mut merged: Vec<(i32, i32)> = a.iter().chain(b.iter()).cloned().collect();
                merged.sort_unstable();
                CharSet::Intervals(coalesce(merged))
            }
        }
    }

    /// Whether the two sets can be proven to share a code point.
    ///
    /// `Unknown` can never be proven *disjoint* from anything, so this
    /// returns `true` whenever either side is `Unknown`: callers treat that
    /// conservatively, since disjointness can only be claimed when this
    /// returns `false`.
    pub fn intersects(&self, other: &CharSet) -> bool {
        match (self, other) {
            (CharSet::Unknown, _) | (_, CharSet::Unknown) => true,
            (CharSet::Empty, _) | (_, CharSet::Empty) => false,
            (CharSet::Intervals(a), CharSet::Intervals(b)) => {
                let mut i = 0;
                let mut j = 0;
                while i < a.len() && j < b.len() {
                    let (alo, ahi) = a[i];
                    let (blo, bhi) = b[j];
                    if ahi < blo {
                        i += 1;
                    } else if bhi < alo {
                        j += 1;
                    } else {
                        return true;
                    }
                }
                false
            }
        }
    }

    /// True when two boundary sets are provably disjoint: neither is
    /// `Unknown` and `intersects` is false. This is the predicate the linter
    /// and the ReDoS profiler actually gate suppression/downgrade decisions
    /// on (merely "not intersecting" would also hold vacuously for two
    /// `Unknown` sets under a naive reading, which is exactly wrong).
    pub fn provably_disjoint(&self, other: &CharSet) -> bool {
        !self.is_unknown() && !other.is_unknown() && !self.intersects(other)
    }
}

fn coalesce(mut intervals: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    intervals.retain(|(lo, hi)| lo <= hi);
    if intervals.is_empty() {
        return intervals;
    }
    let mut out: Vec<(i32, i32)> = Vec::with_capacity(intervals.len());
    for (lo, hi) in intervals.into_iter() {
        if let Some(last) = out.last_mut() {
            if lo <= last.1.saturating_add(1) {
                last.1 = last.1.max(hi);
                continue;
            }
        }
        out.push((lo, hi));
    }
    out
}

fn class_for_type(c: char, flags: &PatternFlags) -> CharSet {
    // ASCII-mode ranges; under `u` mode the exact Unicode general-category
    // members are unbounded in count, so we fall back to Unknown rather than
    // materializing huge interval lists (see SPEC_FULL.md Open Question A.1
    // sibling decision: precision is only claimed where it is cheap).
    match c {
        'd' if !flags.unicode => CharSet::range('0' as i32, '9' as i32),
        'd' => CharSet::Unknown,
        'D' if !flags.unicode => complement_ascii(&CharSet::range('0' as i32, '9' as i32)),
        'D' => CharSet::Unknown,
        'w' if !flags.unicode => {
            let mut s = CharSet::range('a' as i32, 'z' as i32);
            s = s.union(&CharSet::range('A' as i32, 'Z' as i32));
            s = s.union(&CharSet::range('0' as i32, '9' as i32));
            s.union(&CharSet::single('_' as i32))
        }
        'w' => CharSet::Unknown,
        'W' if !flags.unicode => {
            let w = class_for_type('w', flags);
            complement_ascii(&w)
        }
        'W' => CharSet::Unknown,
        's' => CharSet::Intervals(vec![
            (' ' as i32, ' ' as i32),
            ('\t' as i32, '\r' as i32),
        ]),
        'S' => complement_ascii(&class_for_type('s', flags)),
        'h' => CharSet::Intervals(vec![(' ' as i32, ' ' as i32), ('\t' as i32, '\t' as i32)]),
        'H' => complement_ascii(&class_for_type('h', flags)),
        'v' => CharSet::Intervals(vec![('\n' as i32, '\r' as i32)]),
        'V' => complement_ascii(&class_for_type('v', flags)),
        'R' => CharSet::Intervals(vec![('\n' as i32, '\r' as i32)]),
        'N' => complement_ascii(&CharSet::single('\n' as i32)),
        _ => CharSet::Unknown,
    }
}

fn complement_ascii(set: &CharSet) -> CharSet {
    // Negated shorthand classes and negated character classes are only
    // tracked precisely when the inner set is itself known; `Unknown`
    // passes straight through.
    match set {
        CharSet::Intervals(intervals) => {
            let mut out = Vec::new();
            let mut cursor = 0i32;
            for &(lo, hi) in intervals {
                if cursor < lo {
                    out.push((cursor, lo - 1));
                }
                cursor = hi + 1;
            }
            if cursor <= 0x10FFFF {
                out.push((cursor, 0x10FFFF));
            }
            CharSet::Intervals(out)
        }
        CharSet::Unknown => CharSet::Unknown,
        CharSet::Empty => CharSet::range(0, 0x10FFFF),
    }
}

/// The set of code points a character class's body denotes. A class body
/// with more than one item is a `Sequence` of them, but unlike a pattern
/// `Sequence`, the items are a union, not a concatenation — `boundary_chars`
/// doesn't apply here. `&&`-joined segments (`ClassOperation`) are a true
/// set intersection instead.
fn class_item_chars(node: &Node, flags: &PatternFlags) -> CharSet {
    match node {
        Node::Sequence { children, .. } => children
            .iter()
            .map(|c| class_item_chars(c, flags))
            .fold(CharSet::Empty, |acc, s| acc.union(&s)),
        Node::ClassOperation { left, right, kind, .. } => {
            let l = class_item_chars(left, flags);
            let r = class_item_chars(right, flags);
            match kind {
                ClassOpKind::Intersection => intersect_sets(&l, &r),
                ClassOpKind::Subtraction => CharSet::Unknown,
            }
        }
        Node::Range { start, end, .. } => match (start.as_single_char(), end.as_single_char()) {
            (Some(lo), Some(hi)) => CharSet::range(lo, hi),
            _ => CharSet::Unknown,
        },
        Node::CharType { value, .. } => class_for_type(*value, flags),
        Node::PosixClass { .. } | Node::UnicodeProp { .. } | Node::UnicodeNamed { .. } => {
            CharSet::Unknown
        }
        other => match other.as_single_char() {
            Some(cp) => CharSet::single(cp),
            None => CharSet::Unknown,
        },
    }
}

/// The overapproximation of the code points a subtree can begin a match
/// with.
pub fn first_chars(node: &Node, flags: &PatternFlags) -> CharSet {
    boundary_chars(node, flags, true)
}

/// The overapproximation of the code points a subtree can end a match with.
pub fn last_chars(node: &Node, flags: &PatternFlags) -> CharSet {
    boundary_chars(node, flags, false)
}

fn boundary_chars(node: &Node, flags: &PatternFlags, first: bool) -> CharSet {
    match node {
        Node::Literal { value, .. } => {
            let ch = if first { value.chars().next() } else { value.chars().last() };
            match ch {
                Some(c) => CharSet::single(c as i32),
                None => CharSet::Empty,
            }
        }
        Node::CharLiteral { code_point, .. } => {
            if *code_point < 0 {
                CharSet::Unknown
            } else {
                CharSet::single(*code_point)
            }
        }
        Node::ControlChar { code_point, .. } => CharSet::single(*code_point),
        Node::CharType { value, .. } => class_for_type(*value, flags),
        Node::Dot { .. } => CharSet::Unknown,
        Node::PosixClass { .. } => CharSet::Unknown,
        Node::UnicodeProp { .. } | Node::UnicodeNamed { .. } | Node::ScriptRun { .. } => {
            CharSet::Unknown
        }
        Node::Unicode { code, .. } => match i32::from_str_radix(code, 16) {
            Ok(cp) => CharSet::single(cp),
            Err(_) => CharSet::Unknown,
        },
        Node::CharClass { expression, is_negated, .. } => {
            let items = class_item_chars(expression, flags);
            if *is_negated {
                if flags.unicode {
                    CharSet::Unknown
                } else {
                    complement_ascii(&items)
                }
            } else {
                items
            }
        }
        Node::Range { start, end, .. } => {
            match (start.as_single_char(), end.as_single_char()) {
                (Some(lo), Some(hi)) => CharSet::range(lo, hi),
                _ => CharSet::Unknown,
            }
        }
        Node::ClassOperation { left, right, kind, .. } => {
            let l = boundary_chars(left, flags, first);
            let r = boundary_chars(right, flags, first);
            match kind {
                ClassOpKind::Intersection => intersect_sets(&l, &r),
                ClassOpKind::Subtraction => CharSet::Unknown,
            }
        }
        Node::Sequence { children, .. } => boundary_chars_sequence(children, flags, first),
        Node::Alternation { alternatives, .. } => alternatives
            .iter()
            .map(|n| boundary_chars(n, flags, first))
            .fold(CharSet::Empty, |acc, s| acc.union(&s)),
        Node::Group { child, kind, .. } => {
            if kind.is_lookaround() {
                CharSet::Empty
            } else {
                boundary_chars(child, flags, first)
            }
        }
        Node::Quantifier { child, repr, .. } => {
            let (min, _max) = crate::core::cache::parse_quantifier_bounds(repr);
            let inner = boundary_chars(child, flags, first);
            if min == 0 {
                inner.union(&CharSet::Empty)
            } else {
                inner
            }
        }
        Node::Conditional { yes, no, .. } => {
            boundary_chars(yes, flags, first).union(&boundary_chars(no, flags, first))
        }
        Node::Backref { .. } | Node::Subroutine { .. } => CharSet::Unknown,
        Node::Regex { pattern, .. } => boundary_chars(pattern, flags, first),
        _ if node.is_zero_width() => CharSet::Empty,
        _ => CharSet::Unknown,
    }
}

fn intersect_sets(a: &CharSet, b: &CharSet) -> CharSet {
    match (a, b) {
        (CharSet::Unknown, other) | (other, CharSet::Unknown) => other.clone(),
        (CharSet::Empty, _) | (_, CharSet::Empty) => CharSet::Empty,
        (CharSet::Intervals(x), CharSet::Intervals(y)) => {
            let mut out = Vec::new();
            for &(xlo, xhi) in x {
                for &(ylo, yhi) in y {
                    let lo = xlo.max(ylo);
                    let hi = xhi.min(yhi);
                    if lo <= hi {
                        out.push((lo, hi));
                    }
                }
            }
            CharSet::Intervals(coalesce(out))
        }
    }
}

/// `first`/`last` of a sequence: union over the longest nullable prefix (or
/// suffix).
fn boundary_chars_sequence(children: &[Node], flags: &PatternFlags, first: bool) -> CharSet {
    if children.is_empty() {
        return CharSet::Empty;
    }
    let ordered: Vec<&Node> = if first {
        children.iter().collect()
    } else {
        children.iter().rev().collect()
    };
    let mut result = CharSet::Empty;
    for child in ordered {
        if child.is_zero_width() {
            continue;
        }
        let child_set = boundary_chars(child, flags, first);
        result = result.union(&child_set);
        if !is_nullable(child, flags) {
            return result;
        }
    }
    result
}

/// Whether a node can match the empty string — used to decide how far the
/// sequence rule's union needs to extend.
fn is_nullable(node: &Node, flags: &PatternFlags) -> bool {
    match node {
        _ if node.is_zero_width() => true,
        Node::Literal { value, .. } => value.is_empty(),
        Node::Quantifier { repr, .. } => crate::core::cache::parse_quantifier_bounds(repr).0 == 0,
        Node::Group { child, kind, .. } => kind.is_lookaround() || is_nullable(child, flags),
        Node::Sequence { children, .. } => children.iter().all(|c| is_nullable(c, flags)),
        Node::Alternation { alternatives, .. } => {
            alternatives.iter().any(|c| is_nullable(c, flags))
        }
        Node::Conditional { yes, no, .. } => is_nullable(yes, flags) || is_nullable(no, flags),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::Position;

    fn lit(s: &str) -> Node {
        Node::Literal {
            value: s.to_string(),
            is_raw: false,
            pos: Position::zero(),
        }
    }

    #[test]
    fn literal_first_and_last() {
        let flags = PatternFlags::default();
        let node = lit("abc");
        assert_eq!(first_chars(&node, &flags), CharSet::single('a' as i32));
        assert_eq!(last_chars(&node, &flags), CharSet::single('c' as i32));
    }

    #[test]
    fn alternation_unions_branches() {
        let flags = PatternFlags::default();
        let node = Node::Alternation {
            alternatives: vec![lit("a"), lit("b")],
            pos: Position::zero(),
        };
        let fc = first_chars(&node, &flags);
        assert!(fc.intersects(&CharSet::single('a' as i32)));
        assert!(fc.intersects(&CharSet::single('b' as i32)));
        assert!(!fc.intersects(&CharSet::single('c' as i32)));
    }

    #[test]
    fn star_quantifier_includes_empty_so_next_char_joins() {
        // first_chars(a*b) = {a, b}: the star can match zero times, so `b`
        // is also a valid starting character.
        let flags = PatternFlags::default();
        let seq = Node::Sequence {
            children: vec![
                Node::Quantifier {
                    child: Box::new(lit("a")),
                    repr: "*".to_string(),
                    greediness: crate::core::nodes::Greediness::Greedy,
                    pos: Position::zero(),
                },
                lit("b"),
            ],
            pos: Position::zero(),
        };
        let fc = first_chars(&seq, &flags);
        assert!(fc.intersects(&CharSet::single('a' as i32)));
        assert!(fc.intersects(&CharSet::single('b' as i32)));
    }

    #[test]
    fn negated_class_with_known_body_complements_it() {
        let flags = PatternFlags::default();
        let class = Node::CharClass {
            expression: Box::new(lit("a")),
            is_negated: true,
            pos: Position::zero(),
        };
        let fc = first_chars(&class, &flags);
        assert!(!fc.intersects(&CharSet::single('a' as i32)));
        assert!(fc.intersects(&CharSet::single('b' as i32)));
    }

    #[test]
    fn negated_class_under_unicode_is_unknown() {
        let mut flags = PatternFlags::default();
        flags.unicode = true;
        let class = Node::CharClass {
            expression: Box::new(lit("a")),
            is_negated: true,
            pos: Position::zero(),
        };
        assert!(first_chars(&class, &flags).is_unknown());
    }

    #[test]
    fn dot_is_unknown_regardless_of_dotall() {
        let mut flags = PatternFlags::default();
        assert!(first_chars(&Node::Dot { pos: Position::zero() }, &flags).is_unknown());
        flags.dot_all = true;
        assert!(first_chars(&Node::Dot { pos: Position::zero() }, &flags).is_unknown());
    }

    #[test]
    fn lookaround_group_is_empty() {
        let flags = PatternFlags::default();
        let look = Node::Group {
            child: Box::new(lit("a")),
            kind: GroupKind::LookaheadPos,
            name: None,
            local_flags: None,
            pos: Position::zero(),
        };
        assert_eq!(first_chars(&look, &flags), CharSet::Empty);
    }

    #[test]
    fn provably_disjoint_requires_both_known() {
        let a = CharSet::single('a' as i32);
        assert!(a.provably_disjoint(&CharSet::single('b' as i32)));
        assert!(!a.provably_disjoint(&CharSet::Unknown));
    }
}
