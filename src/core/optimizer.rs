//! AST optimizer: semantics-preserving tree rewrites.
//!
//! Rewrites are semantics-preserving: capture numbering, match offsets, and
//! backreference/atomic behavior are never altered. Each rewrite function
//! reports whether it changed anything; `optimize_with_config` iterates to a
//! fixpoint (bounded, since a strictly size/shape-reducing rewrite set
//! converges quickly in practice).
//!
//! This crate's `Node` has no structural sharing (no `Rc`), so "unchanged"
//! input is returned as "a `Node` equal under `node_eq_ignoring_pos` to the
//! input" — positions may still be renumbered even when nothing else
//! changed, since a flattened/merged tree's spans differ from the
//! original's.

use crate::core::charset::{first_chars, last_chars};
use crate::core::flags::PatternFlags;
use crate::core::length_range::length_range;
use crate::core::nodes::{CharLiteralKind, Greediness, GroupKind, Node, Position};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub optimize_digits: bool,
    pub optimize_word: bool,
    pub ranges: bool,
    pub auto_possessify: bool,
    pub allow_alternation_factorization: bool,
    pub min_quantifier_count: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            optimize_digits: true,
            optimize_word: true,
            ranges: false,
            auto_possessify: false,
            allow_alternation_factorization: false,
            min_quantifier_count: 4,
        }
    }
}

impl OptimizerConfig {
    fn min_run(&self) -> u32 {
        self.min_quantifier_count.max(2)
    }
}

pub fn optimize(root: &Node) -> Node {
    optimize_with_config(root, &OptimizerConfig::default())
}

pub fn optimize_with_config(root: &Node, config: &OptimizerConfig) -> Node {
    let flags = match root {
        Node::Regex { flags, .. } => PatternFlags::from_letters(flags),
        _ => PatternFlags::default(),
    };
    let mut current = root.clone();
    for iteration in 0..8 {
        let (next, changed) = rewrite(&current, config, &flags);
        if !changed {
            log::debug!("optimizer reached a fixpoint after {iteration} rewrite pass(es)");
            return next;
        }
        current = next;
    }
    log::debug!("optimizer stopped after hitting its 8-pass iteration cap without reaching a fixpoint");
    current
}

fn rewrite(node: &Node, config: &OptimizerConfig, flags: &PatternFlags) -> (Node, bool) {
    match node {
        Node::Regex { pattern, flags: flag_letters, delimiter, pos } => {
            let (new_pattern, changed) = rewrite(pattern, config, flags);
            let new_flags = remove_useless_flags(&new_pattern, flag_letters);
            let flags_changed = new_flags != *flag_letters;
            (
                Node::Regex {
                    pattern: Box::new(new_pattern),
                    flags: new_flags,
                    delimiter: *delimiter,
                    pos: *pos,
                },
                changed || flags_changed,
            )
        }
        Node::Sequence { children, pos } => rewrite_sequence(children, *pos, config, flags),
        Node::Alternation { alternatives, pos } => rewrite_alternation(alternatives, *pos, config, flags),
        Node::Group { child, kind, name, local_flags, pos } => {
            rewrite_group(child, *kind, name.clone(), local_flags.clone(), *pos, config, flags)
        }
        Node::Quantifier { child, repr, greediness, pos } => {
            rewrite_quantifier(child, repr, *greediness, *pos, config, flags)
        }
        Node::CharClass { expression, is_negated, pos } => {
            rewrite_char_class(expression, *is_negated, *pos, config, flags)
        }
        Node::Literal { value, is_raw, pos } => {
            let (pieces, changed) = split_repeated_chars(value, *is_raw, *pos, config.min_run());
            (items_to_expression(pieces, *pos), changed)
        }
        other => (other.clone(), false),
    }
}

// ---------------------------------------------------------------------
// Structural equality ignoring position (needed everywhere a rewrite wants
// to compare two subtrees that may carry different spans but are otherwise
// identical — plain derived `PartialEq` would treat those as different).
// ---------------------------------------------------------------------

fn node_eq_ignoring_pos(a: &Node, b: &Node) -> bool {
    strip_pos(a) == strip_pos(b)
}

fn strip_pos(node: &Node) -> Node {
    let z = Position::zero();
    match node.clone() {
        Node::Regex { pattern, flags, delimiter, .. } => {
            Node::Regex { pattern: Box::new(strip_pos(&pattern)), flags, delimiter, pos: z }
        }
        Node::Sequence { children, .. } => {
            Node::Sequence { children: children.iter().map(strip_pos).collect(), pos: z }
        }
        Node::Alternation { alternatives, .. } => {
            Node::Alternation { alternatives: alternatives.iter().map(strip_pos).collect(), pos: z }
        }
        Node::Group { child, kind, name, local_flags, .. } => {
            Node::Group { child: Box::new(strip_pos(&child)), kind, name, local_flags, pos: z }
        }
        Node::Quantifier { child, repr, greediness, .. } => {
            Node::Quantifier { child: Box::new(strip_pos(&child)), repr, greediness, pos: z }
        }
        Node::Literal { value, is_raw, .. } => Node::Literal { value, is_raw, pos: z },
        Node::CharLiteral { code_point, original_repr, kind, .. } => {
            Node::CharLiteral { code_point, original_repr, kind, pos: z }
        }
        Node::CharType { value, .. } => Node::CharType { value, pos: z },
        Node::Dot { .. } => Node::Dot { pos: z },
        Node::Anchor { value, .. } => Node::Anchor { value, pos: z },
        Node::Assertion { value, .. } => Node::Assertion { value, pos: z },
        Node::Keep { .. } => Node::Keep { pos: z },
        Node::ControlChar { ch, code_point, .. } => Node::ControlChar { ch, code_point, pos: z },
        Node::CharClass { expression, is_negated, .. } => {
            Node::CharClass { expression: Box::new(strip_pos(&expression)), is_negated, pos: z }
        }
        Node::Range { start, end, .. } => {
            Node::Range { start: Box::new(strip_pos(&start)), end: Box::new(strip_pos(&end)), pos: z }
        }
        Node::ClassOperation { left, right, kind, .. } => Node::ClassOperation {
            left: Box::new(strip_pos(&left)),
            right: Box::new(strip_pos(&right)),
            kind,
            pos: z,
        },
        Node::Backref { reference, .. } => Node::Backref { reference, pos: z },
        Node::Subroutine { reference, .. } => Node::Subroutine { reference, pos: z },
        Node::Conditional { condition, yes, no, .. } => Node::Conditional {
            condition: Box::new(strip_pos(&condition)),
            yes: Box::new(strip_pos(&yes)),
            no: Box::new(strip_pos(&no)),
            pos: z,
        },
        Node::PcreVerb { verb, .. } => Node::PcreVerb { verb, pos: z },
        Node::LimitMatch { limit, .. } => Node::LimitMatch { limit, pos: z },
        Node::Callout { identifier, .. } => Node::Callout { identifier, pos: z },
        Node::Unicode { code, .. } => Node::Unicode { code, pos: z },
        Node::UnicodeProp { prop, .. } => Node::UnicodeProp { prop, pos: z },
        Node::UnicodeNamed { name, .. } => Node::UnicodeNamed { name, pos: z },
        Node::Define { content, .. } => Node::Define { content: Box::new(strip_pos(&content)), pos: z },
        Node::Comment { text, .. } => Node::Comment { text, pos: z },
        Node::ScriptRun { script, .. } => Node::ScriptRun { script, pos: z },
        Node::VersionCondition { version, .. } => Node::VersionCondition { version, pos: z },
        Node::PosixClass { class, .. } => Node::PosixClass { class, pos: z },
    }
}

fn is_capture_sensitive(node: &Node) -> bool {
    match node {
        Node::Group { kind, .. } if kind.is_capturing() => true,
        Node::Backref { .. } | Node::Subroutine { .. } | Node::Conditional { .. } => true,
        Node::Group { child, .. } => is_capture_sensitive(child),
        Node::Sequence { children, .. } => children.iter().any(is_capture_sensitive),
        Node::Alternation { alternatives, .. } => alternatives.iter().any(is_capture_sensitive),
        Node::Quantifier { child, .. } => is_capture_sensitive(child),
        Node::CharClass { expression, .. } => is_capture_sensitive(expression),
        Node::ClassOperation { left, right, .. } => is_capture_sensitive(left) || is_capture_sensitive(right),
        Node::Define { content, .. } => is_capture_sensitive(content),
        _ => false,
    }
}

fn items_to_expression(mut items: Vec<Node>, pos: Position) -> Node {
    if items.len() == 1 {
        items.pop().unwrap()
    } else if items.is_empty() {
        Node::Literal { value: String::new(), is_raw: false, pos }
    } else {
        Node::Sequence { children: items, pos }
    }
}

// ---------------------------------------------------------------------
// Sequence-level transforms: flattening, literal merging, run compaction,
// repeated-literal compaction, singleton collapse, auto-possessification.
// ---------------------------------------------------------------------

fn rewrite_sequence(children: &[Node], pos: Position, config: &OptimizerConfig, flags: &PatternFlags) -> (Node, bool) {
    let mut changed = false;

    let mut flat: Vec<Node> = Vec::new();
    for c in children {
        let (rc, c_changed) = rewrite(c, config, flags);
        changed |= c_changed;
        match rc {
            Node::Sequence { children: inner, .. } => {
                changed = true;
                flat.extend(inner);
            }
            Node::Literal { value, .. } if value.is_empty() => changed = true,
            other => flat.push(other),
        }
    }

    let mut merged: Vec<Node> = Vec::new();
    for node in flat {
        if let (Some(Node::Literal { is_raw: prev_raw, .. }), Node::Literal { is_raw: cur_raw, .. }) =
            (merged.last(), &node)
        {
            if prev_raw == cur_raw {
                if let Some(Node::Literal { value: prev_v, pos: prev_pos, .. }) = merged.pop() {
                    if let Node::Literal { value: cur_v, pos: cur_pos, is_raw } = node {
                        changed = true;
                        let mut new_value = prev_v;
                        new_value.push_str(&cur_v);
                        merged.push(Node::Literal { value: new_value, is_raw, pos: prev_pos.span(&cur_pos) });
                        continue;
                    }
                }
            }
        }
        merged.push(node);
    }

    let min_run = config.min_run();
    let mut expanded: Vec<Node> = Vec::new();
    for node in merged {
        if let Node::Literal { value, is_raw, pos } = &node {
            let (pieces, lit_changed) = split_repeated_chars(value, *is_raw, *pos, min_run);
            changed |= lit_changed;
            expanded.extend(pieces);
        } else {
            expanded.push(node);
        }
    }

    let mut compacted: Vec<Node> = Vec::new();
    let mut i = 0;
    while i < expanded.len() {
        let mut j = i + 1;
        while j < expanded.len() && node_eq_ignoring_pos(&expanded[j], &expanded[i]) {
            j += 1;
        }
        let run_len = j - i;
        if run_len as u32 >= min_run && !is_capture_sensitive(&expanded[i]) {
            changed = true;
            let span = expanded[i].pos().span(&expanded[j - 1].pos());
            compacted.push(Node::Quantifier {
                child: Box::new(expanded[i].clone()),
                repr: format!("{{{}}}", run_len),
                greediness: Greediness::Greedy,
                pos: span,
            });
        } else {
            compacted.extend(expanded[i..j].iter().cloned());
        }
        i = j;
    }

    if config.auto_possessify {
        for idx in 0..compacted.len() {
            let promote = if let Node::Quantifier { child, greediness, .. } = &compacted[idx] {
                matches!(greediness, Greediness::Greedy)
                    && !is_capture_sensitive(child)
                    && length_range(child).0 > 0
                    && compacted
                        .get(idx + 1)
                        .map(|next| last_chars(child, flags).provably_disjoint(&first_chars(next, flags)))
                        .unwrap_or(false)
            } else {
                false
            };
            if promote {
                if let Node::Quantifier { child, repr, pos, .. } = compacted[idx].clone() {
                    changed = true;
                    compacted[idx] = Node::Quantifier { child, repr, greediness: Greediness::Possessive, pos };
                }
            }
        }
    }

    if compacted.len() == 1 {
        return (compacted.into_iter().next().unwrap(), true);
    }
    if compacted.is_empty() {
        return (Node::Literal { value: String::new(), is_raw: false, pos }, true);
    }
    (Node::Sequence { children: compacted, pos }, changed)
}

/// Splits runs of `min_run` or more identical characters out of a literal's
/// text into a quantified single-char node, leaving the rest as literal
/// text either side.
fn split_repeated_chars(value: &str, is_raw: bool, pos: Position, min_run: u32) -> (Vec<Node>, bool) {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return (vec![Node::Literal { value: String::new(), is_raw, pos }], false);
    }
    let mut out = Vec::new();
    let mut changed = false;
    let mut buf = String::new();
    let mut i = 0;
    while i < chars.len() {
        let mut j = i + 1;
        while j < chars.len() && chars[j] == chars[i] {
            j += 1;
        }
        let run_len = j - i;
        if run_len as u32 >= min_run {
            if !buf.is_empty() {
                out.push(Node::Literal { value: std::mem::take(&mut buf), is_raw, pos });
            }
            out.push(Node::Quantifier {
                child: Box::new(Node::Literal { value: chars[i].to_string(), is_raw, pos }),
                repr: format!("{{{}}}", run_len),
                greediness: Greediness::Greedy,
                pos,
            });
            changed = true;
        } else {
            for _ in 0..run_len {
                buf.push(chars[i]);
            }
        }
        i = j;
    }
    if !buf.is_empty() {
        out.push(Node::Literal { value: buf, is_raw, pos });
    }
    if out.is_empty() {
        out.push(Node::Literal { value: String::new(), is_raw, pos });
    }
    (out, changed)
}

// ---------------------------------------------------------------------
// Group unwrap (#7) and quantifier normalization (#6).
// ---------------------------------------------------------------------

fn rewrite_group(
    child: &Node,
    kind: GroupKind,
    name: Option<String>,
    local_flags: Option<String>,
    pos: Position,
    config: &OptimizerConfig,
    flags: &PatternFlags,
) -> (Node, bool) {
    let (new_child, changed) = rewrite(child, config, flags);
    // A single atomic child never needs the grouping `(?:X)` provides; a
    // Sequence/Alternation child does (it defines the scope a following
    // quantifier or an enclosing alternation binds to), so unwrapping is
    // suppressed exactly when that grouping is still load-bearing.
    if matches!(kind, GroupKind::NonCapturing)
        && !matches!(new_child, Node::Sequence { .. } | Node::Alternation { .. })
    {
        return (new_child, true);
    }
    (
        Node::Group { child: Box::new(new_child), kind, name, local_flags, pos },
        changed,
    )
}

fn rewrite_quantifier(
    child: &Node,
    repr: &str,
    greediness: Greediness,
    pos: Position,
    config: &OptimizerConfig,
    flags: &PatternFlags,
) -> (Node, bool) {
    let (new_child, mut changed) = rewrite(child, config, flags);

    match repr {
        "{1}" | "{1,1}" => return (new_child, true),
        "{0}" | "{0,0}" => return (Node::Literal { value: String::new(), is_raw: false, pos }, true),
        _ => {}
    }
    let normalized_repr = match repr {
        "{0,}" => {
            changed = true;
            "*".to_string()
        }
        "{1,}" => {
            changed = true;
            "+".to_string()
        }
        "{0,1}" => {
            changed = true;
            "?".to_string()
        }
        other => other.to_string(),
    };

    (
        Node::Quantifier { child: Box::new(new_child), repr: normalized_repr, greediness, pos },
        changed,
    )
}

// ---------------------------------------------------------------------
// Character class normalization (#8, #9) and alternation transforms
// (#10, #11, #12, #13).
// ---------------------------------------------------------------------

fn flatten_class_items_owned(node: &Node) -> Vec<Node> {
    match node {
        Node::ClassOperation { left, right, .. } => {
            let mut v = flatten_class_items_owned(left);
            v.extend(flatten_class_items_owned(right));
            v
        }
        Node::Sequence { children, .. } => children.iter().flat_map(flatten_class_items_owned).collect(),
        other => vec![other.clone()],
    }
}

fn ascii_category(cp: i32) -> u8 {
    match cp {
        0x30..=0x39 => 0,
        0x41..=0x5A => 1,
        0x61..=0x7A => 2,
        _ => 3,
    }
}

fn coalesce_intervals(mut intervals: Vec<(i32, i32)>, category_respecting: bool) -> Vec<(i32, i32)> {
    intervals.sort_unstable();
    let mut out: Vec<(i32, i32)> = Vec::new();
    for (lo, hi) in intervals {
        if let Some(last) = out.last_mut() {
            let touching = lo <= last.1.saturating_add(1);
            let same_category = !category_respecting || ascii_category(last.1) == ascii_category(lo);
            if touching && same_category {
                last.1 = last.1.max(hi);
                continue;
            }
        }
        out.push((lo, hi));
    }
    out
}

fn mk_char(cp: i32, pos: Position) -> Node {
    Node::CharLiteral { code_point: cp, original_repr: String::new(), kind: CharLiteralKind::Unicode, pos }
}

fn mk_range(lo: i32, hi: i32, pos: Position) -> Node {
    Node::Range { start: Box::new(mk_char(lo, pos)), end: Box::new(mk_char(hi, pos)), pos }
}

/// Collects every single-codepoint item and explicit `Range` into one
/// coalesced interval set, drops literals already covered by a range,
/// dedups non-range "other" items (`CharType`, `PosixClass`, ...), and
/// rebuilds a minimal item list (ranges of length ≥ 3, bare code points
/// otherwise).
fn normalize_class_items(items: Vec<Node>, pos: Position, config: &OptimizerConfig) -> (Vec<Node>, bool) {
    let mut changed = false;
    let mut singles: Vec<i32> = Vec::new();
    let mut explicit_ranges: Vec<(i32, i32)> = Vec::new();
    let mut others: Vec<Node> = Vec::new();

    for item in items {
        match &item {
            Node::Range { start, end, .. } => match (start.as_single_char(), end.as_single_char()) {
                (Some(lo), Some(hi)) => explicit_ranges.push((lo.min(hi), lo.max(hi))),
                _ => others.push(item),
            },
            _ => {
                if let Some(cp) = item.as_single_char() {
                    singles.push(cp);
                } else {
                    others.push(item);
                }
            }
        }
    }

    let before = singles.len();
    singles.retain(|cp| !explicit_ranges.iter().any(|&(lo, hi)| *cp >= lo && *cp <= hi));
    singles.sort_unstable();
    singles.dedup();
    if singles.len() != before {
        changed = true;
    }

    let mut all: Vec<(i32, i32)> = explicit_ranges.clone();
    all.extend(singles.iter().map(|&c| (c, c)));
    let total_before = all.len();
    let coalesced = coalesce_intervals(all, config.ranges);
    if coalesced.len() != total_before {
        changed = true;
    }

    let mut result: Vec<Node> = Vec::new();
    for (lo, hi) in coalesced {
        if hi - lo + 1 >= 3 {
            result.push(mk_range(lo, hi, pos));
        } else {
            for cp in lo..=hi {
                result.push(mk_char(cp, pos));
            }
        }
    }

    let mut dedup_others: Vec<Node> = Vec::new();
    for o in others {
        if dedup_others.iter().any(|x| node_eq_ignoring_pos(x, &o)) {
            changed = true;
        } else {
            dedup_others.push(o);
        }
    }
    result.extend(dedup_others);

    (result, changed)
}

fn is_digit_range_only(items: &[Node]) -> bool {
    items.len() == 1
        && matches!(&items[0], Node::Range { start, end, .. }
            if start.as_single_char() == Some('0' as i32) && end.as_single_char() == Some('9' as i32))
}

fn is_word_class(items: &[Node]) -> bool {
    let mut cps: Vec<(i32, i32)> = Vec::new();
    for item in items {
        match item {
            Node::Range { start, end, .. } => match (start.as_single_char(), end.as_single_char()) {
                (Some(lo), Some(hi)) => cps.push((lo, hi)),
                _ => return false,
            },
            _ => match item.as_single_char() {
                Some(cp) => cps.push((cp, cp)),
                None => return false,
            },
        }
    }
    let merged = coalesce_intervals(cps, false);
    merged == vec![(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)]
}

fn rewrite_char_class(
    expression: &Node,
    is_negated: bool,
    pos: Position,
    config: &OptimizerConfig,
    flags: &PatternFlags,
) -> (Node, bool) {
    // `ClassOperation` subtrees (`&&` intersection/subtraction) short-circuit:
    // the operands are each recursed into, but nothing is merged across the
    // operator itself.
    if matches!(expression, Node::ClassOperation { .. }) {
        let (new_expr, changed) = rewrite(expression, config, flags);
        return (Node::CharClass { expression: Box::new(new_expr), is_negated, pos }, changed);
    }

    let items = flatten_class_items_owned(expression);
    let (normalized, mut changed) = normalize_class_items(items, pos, config);

    if !flags.unicode {
        if config.optimize_digits && is_digit_range_only(&normalized) {
            return (
                Node::CharClass { expression: Box::new(Node::CharType { value: 'd', pos }), is_negated, pos },
                true,
            );
        }
        if config.optimize_word && is_word_class(&normalized) {
            return (
                Node::CharClass { expression: Box::new(Node::CharType { value: 'w', pos }), is_negated, pos },
                true,
            );
        }
    }

    let new_expr = items_to_expression(normalized, pos);
    if !node_eq_ignoring_pos(&new_expr, expression) {
        changed = true;
    }
    (Node::CharClass { expression: Box::new(new_expr), is_negated, pos }, changed)
}

fn class_like_items(node: &Node) -> Option<Vec<Node>> {
    match node {
        Node::CharClass { expression, is_negated: false, .. } => {
            if matches!(expression.as_ref(), Node::ClassOperation { .. }) {
                None
            } else {
                Some(flatten_class_items_owned(expression))
            }
        }
        // `\d` is liftable to an equivalent `[0-9]` for alternation merging;
        // `\w`/`\s` are left alone rather than guessing at a broader rule.
        Node::CharType { value: 'd', pos } => Some(vec![mk_range('0' as i32, '9' as i32, *pos)]),
        _ => None,
    }
}

fn single_plain_char(node: &Node) -> Option<i32> {
    if let Node::Literal { value, .. } = node {
        let mut chars = value.chars();
        let c = chars.next()?;
        if chars.next().is_none() {
            return Some(c as i32);
        }
    }
    None
}

fn is_contiguous(sorted: &[i32]) -> bool {
    sorted.windows(2).all(|w| w[1] == w[0] + 1)
}

fn rewrite_alternation(alternatives: &[Node], pos: Position, config: &OptimizerConfig, flags: &PatternFlags) -> (Node, bool) {
    let mut changed = false;
    let mut rewritten: Vec<Node> = Vec::new();
    for alt in alternatives {
        let (r, c) = rewrite(alt, config, flags);
        changed |= c;
        rewritten.push(r);
    }

    let mut deduped: Vec<Node> = Vec::new();
    for alt in rewritten {
        if deduped.iter().any(|x| node_eq_ignoring_pos(x, &alt)) {
            changed = true;
        } else {
            deduped.push(alt);
        }
    }

    if deduped.len() > 1 && deduped.iter().all(|a| class_like_items(a).is_some()) {
        let combined: Vec<Node> = deduped.iter().flat_map(|a| class_like_items(a).unwrap()).collect();
        let (normalized, _) = normalize_class_items(combined, pos, config);
        let expr = items_to_expression(normalized, pos);
        return (Node::CharClass { expression: Box::new(expr), is_negated: false, pos }, true);
    }

    if deduped.len() > 1 && deduped.iter().all(|a| single_plain_char(a).is_some()) {
        let mut cps: Vec<i32> = deduped.iter().map(|a| single_plain_char(a).unwrap()).collect();
        cps.sort_unstable();
        cps.dedup();
        if cps.len() >= 3 && is_contiguous(&cps) {
            let range = mk_range(cps[0], *cps.last().unwrap(), pos);
            return (Node::CharClass { expression: Box::new(range), is_negated: false, pos }, true);
        }
        let items: Vec<Node> = cps.into_iter().map(|cp| mk_char(cp, pos)).collect();
        let expr = items_to_expression(items, pos);
        return (Node::CharClass { expression: Box::new(expr), is_negated: false, pos }, true);
    }

    if config.allow_alternation_factorization && deduped.len() > 1 {
        if let Some(factored) = try_factorize(&deduped, pos) {
            return (factored, true);
        }
    }

    if deduped.len() == 1 {
        return (deduped.into_iter().next().unwrap(), true);
    }

    (Node::Alternation { alternatives: deduped, pos }, changed)
}

/// A minimal pretty-printer for alternation factorization: only defined
/// over trees built purely from `Literal`/`CharType`/`Quantifier` nodes,
/// which is exactly the shape factorization is allowed to touch.
fn stringify_literal_branch(node: &Node) -> Option<String> {
    match node {
        Node::Literal { value, .. } => Some(value.clone()),
        Node::CharType { value, .. } => Some(format!("\\{}", value)),
        Node::Quantifier { child, repr, .. } => Some(format!("{}{}", stringify_literal_branch(child)?, repr)),
        Node::Sequence { children, .. } => {
            let mut s = String::new();
            for c in children {
                s.push_str(&stringify_literal_branch(c)?);
            }
            Some(s)
        }
        _ => None,
    }
}

/// Re-lexes a stringified remainder (produced by `stringify_literal_branch`
/// and then sliced) back into a minimal node tree: a lone char is a
/// `Literal`; `\X` for `X` in the `CharType` alphabet becomes a `CharType`;
/// any other `\M` becomes a plain (non-raw) `Literal`; a standalone
/// `{n}`/`{n,m}` run is kept as a raw `Literal`.
fn parse_literal_remainder(s: &str, pos: Position) -> Node {
    let mut nodes: Vec<Node> = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                if matches!(next, 'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'h' | 'H' | 'v' | 'V' | 'R' | 'N') {
                    nodes.push(Node::CharType { value: next, pos });
                } else {
                    nodes.push(Node::Literal { value: next.to_string(), is_raw: false, pos });
                }
            }
        } else if c == '{' {
            let mut brace = String::from("{");
            while let Some(&next) = chars.peek() {
                brace.push(next);
                chars.next();
                if next == '}' {
                    break;
                }
            }
            nodes.push(Node::Literal { value: brace, is_raw: true, pos });
        } else {
            nodes.push(Node::Literal { value: c.to_string(), is_raw: false, pos });
        }
    }
    let mut merged: Vec<Node> = Vec::new();
    for n in nodes {
        let merge_with_prev = matches!(
            (merged.last(), &n),
            (Some(Node::Literal { is_raw: false, .. }), Node::Literal { is_raw: false, .. })
        );
        if merge_with_prev {
            if let (Some(Node::Literal { value: pv, pos: pp, .. }), Node::Literal { value: cv, .. }) =
                (merged.pop(), &n)
            {
                let mut v = pv;
                v.push_str(cv);
                merged.push(Node::Literal { value: v, is_raw: false, pos: pp });
                continue;
            }
        }
        merged.push(n);
    }
    items_to_expression(merged, pos)
}

fn common_prefix_len(strings: &[String]) -> usize {
    if strings.is_empty() {
        return 0;
    }
    let first: Vec<char> = strings[0].chars().collect();
    let mut len = 0;
    'outer: while len < first.len() {
        for s in &strings[1..] {
            if s.chars().nth(len) != Some(first[len]) {
                break 'outer;
            }
        }
        len += 1;
    }
    len
}

fn common_suffix_len(strings: &[String]) -> usize {
    let reversed: Vec<String> = strings.iter().map(|s| s.chars().rev().collect()).collect();
    common_prefix_len(&reversed)
}

fn try_factorize(branches: &[Node], pos: Position) -> Option<Node> {
    let strings: Vec<String> = branches.iter().map(stringify_literal_branch).collect::<Option<Vec<_>>>()?;
    if strings.len() < 2 {
        return None;
    }

    let prefix_len = common_prefix_len(&strings);
    if prefix_len > 0 {
        let chars: Vec<Vec<char>> = strings.iter().map(|s| s.chars().collect()).collect();
        let prefix: String = chars[0][..prefix_len].iter().collect();
        let rests: Vec<String> = chars.iter().map(|cs| cs[prefix_len..].iter().collect()).collect();
        return Some(build_factored(prefix, rests, pos, true));
    }

    let suffix_len = common_suffix_len(&strings);
    if suffix_len > 0 {
        let chars: Vec<Vec<char>> = strings.iter().map(|s| s.chars().collect()).collect();
        let suffix: String = chars[0][chars[0].len() - suffix_len..].iter().collect();
        let rests: Vec<String> = chars.iter().map(|cs| cs[..cs.len() - suffix_len].iter().collect()).collect();
        return Some(build_factored(suffix, rests, pos, false));
    }

    None
}

fn build_factored(fixed: String, rests: Vec<String>, pos: Position, is_prefix: bool) -> Node {
    let has_empty = rests.iter().any(|r| r.is_empty());
    let mut rest_nodes: Vec<Node> = rests
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| parse_literal_remainder(r, pos))
        .collect();
    let mut deduped: Vec<Node> = Vec::new();
    for n in rest_nodes.drain(..) {
        if !deduped.iter().any(|x| node_eq_ignoring_pos(x, &n)) {
            deduped.push(n);
        }
    }

    let fixed_node = parse_literal_remainder(&fixed, pos);
    if deduped.is_empty() {
        return fixed_node;
    }

    let inner = if deduped.len() == 1 {
        deduped.into_iter().next().unwrap()
    } else {
        Node::Alternation { alternatives: deduped, pos }
    };
    let mut grouped = Node::Group { child: Box::new(inner), kind: GroupKind::NonCapturing, name: None, local_flags: None, pos };
    if has_empty {
        grouped = Node::Quantifier { child: Box::new(grouped), repr: "?".to_string(), greediness: Greediness::Greedy, pos };
    }
    let children = if is_prefix { vec![fixed_node, grouped] } else { vec![grouped, fixed_node] };
    Node::Sequence { children, pos }
}

// ---------------------------------------------------------------------
// Useless-flag removal (#15).
// ---------------------------------------------------------------------

fn remove_useless_flags(pattern: &Node, flags: &str) -> String {
    let mut has_dot = false;
    let mut has_anchor = false;
    scan_dot_anchor(pattern, &mut has_dot, &mut has_anchor);
    flags
        .chars()
        .filter(|&c| match c {
            's' => has_dot,
            'm' => has_anchor,
            _ => true,
        })
        .collect()
}

fn scan_dot_anchor(node: &Node, has_dot: &mut bool, has_anchor: &mut bool) {
    match node {
        Node::Dot { .. } => *has_dot = true,
        Node::Anchor { .. } => *has_anchor = true,
        Node::Sequence { children, .. } => children.iter().for_each(|c| scan_dot_anchor(c, has_dot, has_anchor)),
        Node::Alternation { alternatives, .. } => {
            alternatives.iter().for_each(|c| scan_dot_anchor(c, has_dot, has_anchor))
        }
        Node::Group { child, .. } => scan_dot_anchor(child, has_dot, has_anchor),
        Node::Quantifier { child, .. } => scan_dot_anchor(child, has_dot, has_anchor),
        Node::Conditional { condition, yes, no, .. } => {
            scan_dot_anchor(condition, has_dot, has_anchor);
            scan_dot_anchor(yes, has_dot, has_anchor);
            scan_dot_anchor(no, has_dot, has_anchor);
        }
        Node::Define { content, .. } => scan_dot_anchor(content, has_dot, has_anchor),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse;

    fn optimized_pattern(pattern: &str) -> Node {
        let root = parse(pattern).expect("pattern should parse");
        let Node::Regex { pattern, .. } = optimize(&root) else { unreachable!() };
        *pattern
    }

    fn expected_pattern(pattern: &str) -> Node {
        let root = parse(pattern).expect("pattern should parse");
        let Node::Regex { pattern, .. } = root else { unreachable!() };
        *pattern
    }

    #[test]
    fn s4_digit_class_becomes_char_type() {
        let got = optimized_pattern("/[0-9]/");
        let want = expected_pattern("/\\d/");
        assert!(node_eq_ignoring_pos(&got, &want));
    }

    #[test]
    fn s5_adjacent_classes_in_alternation_merge() {
        let got = optimized_pattern("/[a-z]|[0-9]/");
        let want = expected_pattern("/[0-9a-z]/");
        assert!(node_eq_ignoring_pos(&got, &want));
    }

    #[test]
    fn idempotent_on_already_optimized_pattern() {
        let once = optimize(&parse("/[0-9]/").unwrap());
        let twice = optimize(&once);
        assert!(node_eq_ignoring_pos(&once, &twice));
    }

    #[test]
    fn sequence_singleton_is_unwrapped() {
        let root = Node::Sequence {
            children: vec![Node::Literal { value: "a".into(), is_raw: false, pos: Position::zero() }],
            pos: Position::zero(),
        };
        let (result, changed) = rewrite(&root, &OptimizerConfig::default(), &PatternFlags::default());
        assert!(changed);
        assert!(matches!(result, Node::Literal { .. }));
    }

    #[test]
    fn literal_run_compacts_into_quantifier() {
        let got = optimized_pattern("/aaaa/");
        assert!(matches!(got, Node::Quantifier { .. }));
    }

    #[test]
    fn quantifier_brace_forms_normalize() {
        let got = optimized_pattern("/a{0,}/");
        assert!(matches!(&got, Node::Quantifier{repr, ..} if repr == "*"));
    }

    #[test]
    fn redundant_noncapturing_group_unwraps() {
        let got = optimized_pattern("/(?:a)/");
        assert!(matches!(got, Node::Literal { .. }));
    }

    #[test]
    fn duplicate_alternation_branches_dedup() {
        let got = optimized_pattern("/cat|cat/");
        assert!(matches!(got, Node::Literal { value, .. } if value == "cat"));
    }

    #[test]
    fn capture_sensitive_runs_are_not_compacted() {
        let got = optimized_pattern("/(a)(a)(a)(a)/");
        assert!(!matches!(got, Node::Quantifier { .. }));
    }

    #[test]
    fn factorization_is_opt_in() {
        let mut config = OptimizerConfig::default();
        config.allow_alternation_factorization = true;
        let root = parse("/ab|ac/").unwrap();
        let optimized = optimize_with_config(&root, &config);
        let Node::Regex { pattern, .. } = optimized else { unreachable!() };
        assert!(matches!(*pattern, Node::Sequence { .. }));
    }
}
