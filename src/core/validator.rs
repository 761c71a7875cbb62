//! Semantic validator.
//!
//! A single pre-order walk that either returns `Ok(())` or the first
//! `SemanticError` it finds — there is no recovery or continuation, unlike
//! the linter, which collects every issue it sees.

use std::collections::HashSet;

use crate::core::cache;
use crate::core::errors::SemanticError;
use crate::core::flags::PatternFlags;
use crate::core::group_numbering::{self, GroupNumbering};
use crate::core::length_range::length_range;
use crate::core::nodes::{CalloutId, CharLiteralKind, GroupKind, Greediness, Node, Position};
use crate::core::visit::Visitor;

const POSIX_CLASSES: [&str; 14] = [
    "alpha", "alnum", "ascii", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
    "space", "upper", "word", "xdigit",
];

const PCRE_CONTROL_VERBS: [&str; 8] = ["ACCEPT", "FAIL", "F", "COMMIT", "PRUNE", "SKIP", "THEN", "MARK"];

#[derive(Debug, Clone, Copy)]
pub struct ValidatorConfig {
    pub max_lookbehind_length: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { max_lookbehind_length: 255 }
    }
}

/// Validate with the default lookbehind budget (overridable in-pattern by
/// `(*LIMIT_LOOKBEHIND=n)`).
pub fn validate(root: &Node) -> Result<(), SemanticError> {
    validate_with_config(root, ValidatorConfig::default())
}

pub fn validate_with_config(root: &Node, config: ValidatorConfig) -> Result<(), SemanticError> {
    let group_numbering = group_numbering::number_groups(root);
    let flags_from_root = match root {
        Node::Regex { flags, .. } => PatternFlags::from_letters(flags),
        _ => PatternFlags::default(),
    };
    let dupnames_allowed = flags_from_root.dupnames || scan_enables_j(root);
    let lookbehind_limit = prescan_lookbehind_limit(root).unwrap_or(config.max_lookbehind_length);

    let mut validator = Validator {
        group_numbering,
        in_lookbehind: false,
        lookbehind_limit,
        capture_index: 0,
        dupnames_allowed,
        seen_names: HashSet::new(),
    };
    validator.visit(root)
}

struct Validator {
    group_numbering: GroupNumbering,
    in_lookbehind: bool,
    lookbehind_limit: u32,
    /// Mirrors `capture_sequence.len()` as the walk progresses — both grow
    /// by exactly one per capturing/named group visited in pre-order, branch
    /// resets included, so the two stay in lock-step without re-deriving the
    /// branch-reset aliasing logic here.
    capture_index: u32,
    dupnames_allowed: bool,
    seen_names: HashSet<String>,
}

impl Visitor for Validator {
    type Output = Result<(), SemanticError>;

    fn neutral(&self) -> Self::Output {
        Ok(())
    }

    fn visit_regex(&mut self, node: &Node) -> Self::Output {
        if let Node::Regex { pattern, .. } = node {
            self.visit(pattern)?;
        }
        Ok(())
    }

    fn visit_sequence(&mut self, node: &Node) -> Self::Output {
        if let Node::Sequence { children, .. } = node {
            for child in children {
                self.visit(child)?;
            }
        }
        Ok(())
    }

    fn visit_alternation(&mut self, node: &Node) -> Self::Output {
        if let Node::Alternation { alternatives, .. } = node {
            for alt in alternatives {
                self.visit(alt)?;
            }
        }
        Ok(())
    }

    fn visit_group(&mut self, node: &Node) -> Self::Output {
        if let Node::Group { child, kind, name, pos, .. } = node {
            if kind.is_capturing() {
                self.capture_index += 1;
                if let Some(n) = name {
                    if self.seen_names.contains(n) && !self.dupnames_allowed {
                        return Err(SemanticError::new(
                            "regex.group.duplicate_name",
                            format!("duplicate group name '{}'", n),
                            *pos,
                        ));
                    }
                    self.seen_names.insert(n.clone());
                }
            }
            if kind.is_lookbehind() {
                let (_, max) = length_range(child);
                let max = match max {
                    None => {
                        let offending = find_unbounded_node(child).unwrap_or(child.as_ref());
                        return Err(SemanticError::new(
                            "regex.lookbehind.unbounded",
                            "lookbehind assertion must match a bounded number of characters",
                            offending.pos(),
                        ));
                    }
                    Some(m) => m,
                };
                if max > self.lookbehind_limit {
                    return Err(SemanticError::new(
                        "regex.lookbehind.too_long",
                        format!("lookbehind maximum length {} exceeds limit {}", max, self.lookbehind_limit),
                        child.pos(),
                    ));
                }
                let was_in_lookbehind = self.in_lookbehind;
                self.in_lookbehind = true;
                let result = self.visit(child);
                self.in_lookbehind = was_in_lookbehind;
                return result;
            }
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_quantifier(&mut self, node: &Node) -> Self::Output {
        if let Node::Quantifier { child, repr, greediness, pos } = node {
            let (min, max) = cache::parse_quantifier_bounds(repr);
            if let Some(m) = max {
                if min > m {
                    let suffix_len = if matches!(greediness, Greediness::Greedy) { 0 } else { 1 };
                    let brace_start = pos.end.saturating_sub(repr.len() + suffix_len);
                    let brace_end = pos.end.saturating_sub(suffix_len);
                    return Err(SemanticError::new(
                        "regex.quantifier.invalid_range",
                        format!("quantifier lower bound {} exceeds upper bound {}", min, m),
                        Position::new(brace_start, brace_end),
                    ));
                }
            }
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_char_class(&mut self, node: &Node) -> Self::Output {
        if let Node::CharClass { expression, .. } = node {
            self.visit(expression)?;
        }
        Ok(())
    }

    fn visit_class_operation(&mut self, node: &Node) -> Self::Output {
        if let Node::ClassOperation { left, right, .. } = node {
            self.visit(left)?;
            self.visit(right)?;
        }
        Ok(())
    }

    fn visit_range(&mut self, node: &Node) -> Self::Output {
        if let Node::Range { start, end, pos } = node {
            let (lo, hi) = match (start.as_single_char(), end.as_single_char()) {
                (Some(lo), Some(hi)) => (lo, hi),
                _ => {
                    return Err(SemanticError::new(
                        "regex.range.invalid_endpoint",
                        "range endpoints must be single characters",
                        *pos,
                    ))
                }
            };
            if lo > hi {
                return Err(SemanticError::new(
                    "regex.range.unordered",
                    format!("range start {} exceeds end {}", lo, hi),
                    *pos,
                ));
            }
            self.visit(start)?;
            self.visit(end)?;
        }
        Ok(())
    }

    fn visit_backref(&mut self, node: &Node) -> Self::Output {
        if let Node::Backref { reference, pos } = node {
            self.check_backref(reference, *pos)?;
        }
        Ok(())
    }

    fn visit_subroutine(&mut self, node: &Node) -> Self::Output {
        if let Node::Subroutine { reference, pos } = node {
            self.check_subroutine(reference, *pos)?;
        }
        Ok(())
    }

    fn visit_conditional(&mut self, node: &Node) -> Self::Output {
        if let Node::Conditional { condition, yes, no, pos } = node {
            let valid = matches!(condition.as_ref(), Node::Backref { .. })
                || matches!(condition.as_ref(), Node::Subroutine { .. })
                || matches!(condition.as_ref(), Node::Define { .. })
                || matches!(condition.as_ref(), Node::Group { kind, .. } if kind.is_lookaround());
            if !valid {
                return Err(SemanticError::new(
                    "regex.conditional.invalid_condition",
                    "conditional condition must be a backreference, subroutine call, lookaround group, or (DEFINE)",
                    *pos,
                ));
            }
            self.visit(condition)?;
            self.visit(yes)?;
            self.visit(no)?;
        }
        Ok(())
    }

    fn visit_define(&mut self, node: &Node) -> Self::Output {
        if let Node::Define { content, .. } = node {
            self.visit(content)?;
        }
        Ok(())
    }

    fn visit_unicode(&mut self, node: &Node) -> Self::Output {
        if let Node::Unicode { code, pos } = node {
            match i32::from_str_radix(code, 16) {
                Ok(cp) if (0..=0x0010_FFFF).contains(&cp) => {}
                _ => {
                    return Err(SemanticError::new(
                        "regex.unicode.out_of_range",
                        format!("'{}' is not a valid Unicode code point", code),
                        *pos,
                    ))
                }
            }
        }
        Ok(())
    }

    fn visit_unicode_prop(&mut self, node: &Node) -> Self::Output {
        if let Node::UnicodeProp { prop, pos } = node {
            let body = prop.strip_prefix('^').unwrap_or(prop);
            if !cache::is_known_unicode_property(body) {
                return Err(SemanticError::new(
                    "regex.unicode.unsupported_property",
                    format!("unsupported Unicode property '{}'", body),
                    *pos,
                ));
            }
        }
        Ok(())
    }

    fn visit_unicode_named(&mut self, node: &Node) -> Self::Output {
        if let Node::UnicodeNamed { name, pos } = node {
            if !cache::is_known_unicode_name(name) {
                return Err(SemanticError::new(
                    "regex.unicode.unknown_named",
                    format!("unrecognized Unicode character name '{}'", name),
                    *pos,
                ));
            }
        }
        Ok(())
    }

    fn visit_char_literal(&mut self, node: &Node) -> Self::Output {
        if let Node::CharLiteral { code_point, kind, pos, .. } = node {
            match kind {
                CharLiteralKind::Octal => {
                    if *code_point < 0 || *code_point > 0xFF {
                        return Err(SemanticError::new(
                            "regex.unicode.octal_out_of_range",
                            "\\o{..} escape must resolve to 0..=0xFF",
                            *pos,
                        ));
                    }
                }
                CharLiteralKind::OctalLegacy => {
                    if *code_point <= 0 || *code_point > 0xFF {
                        return Err(SemanticError::new(
                            "regex.unicode.octal_out_of_range",
                            "legacy octal escape must be nonzero and at most 0xFF",
                            *pos,
                        ));
                    }
                }
                CharLiteralKind::Unicode | CharLiteralKind::UnicodeNamed => {
                    if *code_point < 0 || *code_point > 0x0010_FFFF {
                        return Err(SemanticError::new(
                            "regex.unicode.out_of_range",
                            "code point exceeds U+10FFFF",
                            *pos,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn visit_posix_class(&mut self, node: &Node) -> Self::Output {
        if let Node::PosixClass { class, pos } = node {
            if !POSIX_CLASSES.contains(&class.as_str()) {
                return Err(SemanticError::new(
                    "regex.posix.unknown_class",
                    format!("'{}' is not a recognized POSIX class", class),
                    *pos,
                ));
            }
        }
        Ok(())
    }

    fn visit_assertion(&mut self, node: &Node) -> Self::Output {
        if let Node::Assertion { value, pos } = node {
            if !matches!(value, 'A' | 'z' | 'Z' | 'G' | 'b' | 'B') {
                return Err(SemanticError::new(
                    "regex.assertion.unknown",
                    format!("'\\{}' is not a recognized assertion", value),
                    *pos,
                ));
            }
        }
        Ok(())
    }

    fn visit_pcre_verb(&mut self, node: &Node) -> Self::Output {
        if let Node::PcreVerb { verb, pos } = node {
            let name = verb.split(['(', ':', '=']).next().unwrap_or("").to_ascii_uppercase();
            if name.starts_with("LIMIT_") {
                return Ok(());
            }
            if !PCRE_CONTROL_VERBS.contains(&name.as_str()) {
                return Err(SemanticError::new(
                    "regex.verb.unknown",
                    format!("'(*{})' is not a recognized PCRE verb", verb),
                    *pos,
                ));
            }
        }
        Ok(())
    }

    fn visit_callout(&mut self, node: &Node) -> Self::Output {
        if let Node::Callout { identifier, pos } = node {
            match identifier {
                CalloutId::Numeric(n) => {
                    if *n < 0 || *n > 255 {
                        return Err(SemanticError::new(
                            "regex.callout.invalid_identifier",
                            "numeric callout identifier must be in 0..=255",
                            *pos,
                        ));
                    }
                }
                CalloutId::Str(s) => {
                    if s.is_empty() {
                        return Err(SemanticError::new(
                            "regex.callout.invalid_identifier",
                            "string callout identifier must not be empty",
                            *pos,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn visit_control_char(&mut self, node: &Node) -> Self::Output {
        if let Node::ControlChar { code_point, pos, .. } = node {
            if *code_point < 0 || *code_point > 0xFF {
                return Err(SemanticError::new(
                    "regex.control_char.out_of_range",
                    "\\cX control character escape must resolve to 0..=0xFF",
                    *pos,
                ));
            }
        }
        Ok(())
    }

    fn visit_keep(&mut self, node: &Node) -> Self::Output {
        if self.in_lookbehind {
            if let Node::Keep { pos } = node {
                return Err(SemanticError::new(
                    "regex.lookbehind.keep_forbidden",
                    "\\K cannot appear inside a lookbehind assertion",
                    *pos,
                ));
            }
        }
        Ok(())
    }
}

impl Validator {
    fn check_backref(&self, reference: &str, pos: Position) -> Result<(), SemanticError> {
        if let Some(name) = named_backref_target(reference) {
            if self.group_numbering.resolve_name(name).is_none() {
                return Err(SemanticError::new(
                    "regex.backref.unknown_name",
                    format!("backreference to unknown group name '{}'", name),
                    pos,
                ));
            }
            return Ok(());
        }
        if let Some(sign_digits) = reference.strip_prefix('+').or_else(|| reference.strip_prefix('-')) {
            if !sign_digits.is_empty() && sign_digits.chars().all(|c| c.is_ascii_digit()) {
                let magnitude: i64 = sign_digits.parse().unwrap_or(0);
                if magnitude == 0 {
                    return Err(SemanticError::new("regex.backref.zero", "backreference to group 0 is not valid", pos));
                }
                let offset = if reference.starts_with('+') { magnitude } else { -magnitude };
                if self.group_numbering.resolve_relative(self.capture_index as usize, offset).is_none() {
                    return Err(SemanticError::new(
                        "regex.backref.relative_out_of_range",
                        "relative backreference is out of range",
                        pos,
                    ));
                }
                return Ok(());
            }
        }
        if !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit()) {
            let n: u32 = reference.parse().unwrap_or(0);
            if n == 0 {
                return Err(SemanticError::new("regex.backref.zero", "backreference to group 0 is not valid", pos));
            }
            if n > self.group_numbering.max_group_number {
                return Err(SemanticError::new(
                    "regex.backref.missing_group",
                    format!("backreference to nonexistent group {}", n),
                    pos,
                ));
            }
            return Ok(());
        }
        if self.group_numbering.resolve_name(reference).is_none() {
            return Err(SemanticError::new(
                "regex.backref.unknown_name",
                format!("backreference to unknown group name '{}'", reference),
                pos,
            ));
        }
        Ok(())
    }

    fn check_subroutine(&self, reference: &str, pos: Position) -> Result<(), SemanticError> {
        if reference == "R" || reference == "0" {
            return Ok(());
        }
        if let Some(name) = reference.strip_prefix("R&") {
            if self.group_numbering.resolve_name(name).is_none() {
                return Err(SemanticError::new(
                    "regex.subroutine.unknown_name",
                    format!("subroutine call to unknown group name '{}'", name),
                    pos,
                ));
            }
            return Ok(());
        }
        if let Some(rest) = reference.strip_prefix('R') {
            if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
                let n: u32 = rest.parse().unwrap_or(0);
                if n > self.group_numbering.max_group_number {
                    return Err(SemanticError::new(
                        "regex.backref.missing_group",
                        format!("subroutine call to nonexistent group {}", n),
                        pos,
                    ));
                }
                return Ok(());
            }
        }
        if let Some(sign_digits) = reference.strip_prefix('+').or_else(|| reference.strip_prefix('-')) {
            if !sign_digits.is_empty() && sign_digits.chars().all(|c| c.is_ascii_digit()) {
                let magnitude: i64 = sign_digits.parse().unwrap_or(0);
                let offset = if reference.starts_with('+') { magnitude } else { -magnitude };
                if self.group_numbering.resolve_relative(self.capture_index as usize, offset).is_none() {
                    return Err(SemanticError::new(
                        "regex.backref.relative_out_of_range",
                        "relative subroutine call is out of range",
                        pos,
                    ));
                }
                return Ok(());
            }
        }
        if !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit()) {
            let n: u32 = reference.parse().unwrap_or(0);
            if n > self.group_numbering.max_group_number {
                return Err(SemanticError::new(
                    "regex.backref.missing_group",
                    format!("subroutine call to nonexistent group {}", n),
                    pos,
                ));
            }
            return Ok(());
        }
        if self.group_numbering.resolve_name(reference).is_none() {
            return Err(SemanticError::new(
                "regex.subroutine.unknown_name",
                format!("subroutine call to unknown group name '{}'", reference),
                pos,
            ));
        }
        Ok(())
    }
}

/// Extracts the group name out of the parser's named-backreference
/// spellings (`k<name>`, `k'name'`, `k{name}`, `P=name`), or `None` if
/// `reference` is not one of those forms.
fn named_backref_target(reference: &str) -> Option<&str> {
    reference
        .strip_prefix("k<")
        .and_then(|s| s.strip_suffix('>'))
        .or_else(|| reference.strip_prefix("k'").and_then(|s| s.strip_suffix('\'')))
        .or_else(|| reference.strip_prefix("k{").and_then(|s| s.strip_suffix('}')))
        .or_else(|| reference.strip_prefix("P="))
}

/// Finds the first node (pre-order) whose own length range is unbounded,
/// mirroring `length_range`'s recursive structure but stopping to report the
/// offending node rather than folding a total.
fn find_unbounded_node(node: &Node) -> Option<&Node> {
    match node {
        Node::Sequence { children, .. } => children.iter().find_map(|c| {
            if length_range(c).1.is_none() {
                Some(find_unbounded_node(c).unwrap_or(c))
            } else {
                None
            }
        }),
        Node::Alternation { alternatives, .. } => alternatives.iter().find_map(|a| {
            if length_range(a).1.is_none() {
                Some(find_unbounded_node(a).unwrap_or(a))
            } else {
                None
            }
        }),
        Node::Group { child, kind, .. } => {
            if kind.is_lookaround() {
                None
            } else {
                find_unbounded_node(child)
            }
        }
        Node::Quantifier { child, repr, .. } => {
            let (_, max) = cache::parse_quantifier_bounds(repr);
            if max.is_none() {
                Some(node)
            } else {
                find_unbounded_node(child)
            }
        }
        Node::Conditional { yes, no, .. } => find_unbounded_node(yes).or_else(|| find_unbounded_node(no)),
        Node::Backref { .. } | Node::Subroutine { .. } => Some(node),
        Node::Regex { pattern, .. } => find_unbounded_node(pattern),
        _ => None,
    }
}

/// Whether any `(?J)`-style inline-flags marker anywhere in the tree enables
/// duplicate group names. Read as pattern-wide once set, rather than
/// scope-limited to where it appears.
fn scan_enables_j(node: &Node) -> bool {
    match node {
        Node::Regex { pattern, .. } => scan_enables_j(pattern),
        Node::Sequence { children, .. } => children.iter().any(scan_enables_j),
        Node::Alternation { alternatives, .. } => alternatives.iter().any(scan_enables_j),
        Node::Group { child, kind, local_flags, .. } => {
            if matches!(kind, GroupKind::InlineFlags) {
                if let Some(lf) = local_flags {
                    let set_part = lf.split('-').next().unwrap_or("");
                    if set_part.contains('J') {
                        return true;
                    }
                }
            }
            scan_enables_j(child)
        }
        Node::Quantifier { child, .. } => scan_enables_j(child),
        Node::Conditional { condition, yes, no, .. } => {
            scan_enables_j(condition) || scan_enables_j(yes) || scan_enables_j(no)
        }
        Node::Define { content, .. } => scan_enables_j(content),
        _ => false,
    }
}

/// Pre-scan for `(*LIMIT_LOOKBEHIND=n)`, evaluated once up front so a
/// lookbehind earlier in the pattern than the verb that raises its budget
/// still sees the raised limit.
fn prescan_lookbehind_limit(node: &Node) -> Option<u32> {
    match node {
        Node::Regex { pattern, .. } => prescan_lookbehind_limit(pattern),
        Node::Sequence { children, .. } => children.iter().find_map(prescan_lookbehind_limit),
        Node::Alternation { alternatives, .. } => alternatives.iter().find_map(prescan_lookbehind_limit),
        Node::Group { child, .. } => prescan_lookbehind_limit(child),
        Node::Quantifier { child, .. } => prescan_lookbehind_limit(child),
        Node::Conditional { condition, yes, no, .. } => prescan_lookbehind_limit(condition)
            .or_else(|| prescan_lookbehind_limit(yes))
            .or_else(|| prescan_lookbehind_limit(no)),
        Node::Define { content, .. } => prescan_lookbehind_limit(content),
        Node::PcreVerb { verb, .. } => {
            let upper = verb.to_ascii_uppercase();
            upper.strip_prefix("LIMIT_LOOKBEHIND=").and_then(|n| n.trim().parse().ok())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse;

    fn code_of(err: SemanticError) -> String {
        err.code
    }

    #[test]
    fn s1_invalid_quantifier_range_is_rejected() {
        let root = parse("/a{5,2}/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.quantifier.invalid_range");
    }

    #[test]
    fn s2_backref_past_group_count_is_rejected() {
        let root = parse("/(a)(b)\\3/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.backref.missing_group");
    }

    #[test]
    fn backref_to_zero_is_rejected() {
        let root = parse("/(a)\\0/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.backref.zero");
    }

    #[test]
    fn valid_backref_passes() {
        let root = parse("/(a)(b)\\2/").unwrap();
        assert!(validate(&root).is_ok());
    }

    #[test]
    fn unbounded_lookbehind_is_rejected() {
        let root = parse("/(?<=a*)b/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.lookbehind.unbounded");
    }

    #[test]
    fn bounded_lookbehind_passes() {
        let root = parse("/(?<=abc)d/").unwrap();
        assert!(validate(&root).is_ok());
    }

    #[test]
    fn keep_inside_lookbehind_is_rejected() {
        let root = parse("/(?<=a\\K)b/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.lookbehind.keep_forbidden");
    }

    #[test]
    fn duplicate_names_rejected_without_j_flag() {
        let root = parse("/(?<x>a)(?<x>b)/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.group.duplicate_name");
    }

    #[test]
    fn duplicate_names_allowed_with_j_flag() {
        let root = parse("/(?<x>a)(?<x>b)/J").unwrap();
        assert!(validate(&root).is_ok());
    }

    #[test]
    fn unknown_posix_class_is_rejected() {
        let root = parse("/[[:bogus:]]/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.posix.unknown_class");
    }

    #[test]
    fn unsupported_unicode_property_is_rejected() {
        let root = parse("/\\p{NotARealPropertyXyz}/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.unicode.unsupported_property");
    }

    #[test]
    fn reversed_range_is_rejected() {
        let root = parse("/[z-a]/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.range.unordered");
    }

    #[test]
    fn conditional_with_unknown_name_condition_is_rejected() {
        let root = parse("/(?(abc)x|y)/").unwrap();
        // "abc" is re-parsed as a bare backreference-shaped condition; since
        // no group named "abc" exists this is rejected as an unknown name
        // rather than an invalid-condition-shape error — still a correct
        // rejection of the overall pattern.
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.backref.unknown_name");
    }

    #[test]
    fn octal_legacy_zero_is_rejected() {
        let root = parse("/\\000/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.unicode.octal_out_of_range");
    }

    #[test]
    fn callout_numeric_out_of_range_is_rejected() {
        let root = parse("/a(?C999)b/").unwrap();
        let err = validate(&root).unwrap_err();
        assert_eq!(code_of(err), "regex.callout.invalid_identifier");
    }

    #[test]
    fn valid_conditional_with_lookaround_condition_passes() {
        let root = parse("/(?(?=a)b|c)/").unwrap();
        assert!(validate(&root).is_ok());
    }
}
