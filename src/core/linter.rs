//! Best-effort style linter.
//!
//! Unlike the validator, the linter never stops: it walks the whole tree and
//! accumulates `LintIssue`s, returning them all after traversal. A pattern
//! with zero issues returns an empty vec, not an error.

use std::collections::HashSet;

use crate::core::cache;
use crate::core::charset::first_chars;
use crate::core::errors::LintIssue;
use crate::core::flags::PatternFlags;
use crate::core::group_numbering::{self, GroupNumbering};
use crate::core::length_range::length_range;
use crate::core::nodes::{GroupKind, Node};
use crate::core::visit::Visitor;

/// Run every lint diagnostic over `root` and return the accumulated issues
/// in pre-order.
pub fn lint(root: &Node) -> Vec<LintIssue> {
    let flags = match root {
        Node::Regex { flags, .. } => PatternFlags::from_letters(flags),
        _ => PatternFlags::default(),
    };
    let group_numbering = group_numbering::number_groups(root);

    let mut scan = GlobalScan::default();
    scan_globals(root, &mut scan);

    let mut issues = Vec::new();
    if flags.ignore_case && !scan.has_case_sensitive && !scan.has_backref {
        issues.push(LintIssue::new(
            "regex.lint.flag.useless.i",
            "the 'i' flag has no effect: no character class, range, or backreference in this pattern depends on letter case",
        ));
    }
    if flags.dot_all && !scan.has_dot {
        issues.push(LintIssue::new(
            "regex.lint.flag.useless.s",
            "the 's' flag has no effect: this pattern contains no '.'",
        ));
    }
    if flags.multiline && !scan.has_anchor {
        issues.push(LintIssue::new(
            "regex.lint.flag.useless.m",
            "the 'm' flag has no effect: this pattern contains no '^' or '$'",
        ));
    }

    let mut linter = Linter {
        group_numbering,
        current_flags: flags,
        issues,
    };
    linter.visit(root);
    linter.issues
}

/// Whole-tree scan for the facts the "useless flag" diagnostics need before
/// any per-node rule can fire — run once, up front, separately from the
/// main `Linter` walk below.
#[derive(Default)]
struct GlobalScan {
    has_case_sensitive: bool,
    has_backref: bool,
    has_dot: bool,
    has_anchor: bool,
}

/// Letters inside a character class, range, or POSIX class are the only
/// place an `i` flag's effect is structurally visible in the pattern
/// itself — whether a bare literal happens to match differently under `i`
/// depends on the input text, not on anything this scan can see.
fn scan_globals(node: &Node, acc: &mut GlobalScan) {
    match node {
        Node::Regex { pattern, .. } => scan_globals(pattern, acc),
        Node::Sequence { children, .. } => children.iter().for_each(|c| scan_globals(c, acc)),
        Node::Alternation { alternatives, .. } => {
            alternatives.iter().for_each(|c| scan_globals(c, acc))
        }
        Node::Group { child, .. } => scan_globals(child, acc),
        Node::Quantifier { child, .. } => scan_globals(child, acc),
        Node::Conditional { condition, yes, no, .. } => {
            scan_globals(condition, acc);
            scan_globals(yes, acc);
            scan_globals(no, acc);
        }
        Node::Define { content, .. } => scan_globals(content, acc),
        Node::Dot { .. } => acc.has_dot = true,
        Node::Anchor { .. } => acc.has_anchor = true,
        Node::Backref { .. } => acc.has_backref = true,
        Node::CharClass { expression, .. } => {
            scan_class_for_case(expression, acc);
        }
        Node::PosixClass { class, .. } => {
            if class == "upper" || class == "lower" || class == "alpha" || class == "alnum" {
                acc.has_case_sensitive = true;
            }
        }
        _ => {}
    }
}

fn scan_class_for_case(node: &Node, acc: &mut GlobalScan) {
    match node {
        Node::ClassOperation { left, right, .. } => {
            scan_class_for_case(left, acc);
            scan_class_for_case(right, acc);
        }
        Node::Sequence { children, .. } => {
            children.iter().for_each(|c| scan_class_for_case(c, acc))
        }
        Node::Range { .. } => acc.has_case_sensitive = true,
        Node::Literal { value, .. } if value.chars().any(|c| c.is_alphabetic()) => {
            acc.has_case_sensitive = true;
        }
        Node::PosixClass { class, .. } => {
            if class == "upper" || class == "lower" || class == "alpha" || class == "alnum" {
                acc.has_case_sensitive = true;
            }
        }
        _ => {}
    }
}

struct Linter {
    group_numbering: GroupNumbering,
    current_flags: PatternFlags,
    issues: Vec<LintIssue>,
}

impl Visitor for Linter {
    type Output = ();

    fn neutral(&self) -> Self::Output {}

    fn visit_regex(&mut self, node: &Node) -> Self::Output {
        if let Node::Regex { pattern, .. } = node {
            self.visit(pattern);
        }
    }

    fn visit_sequence(&mut self, node: &Node) -> Self::Output {
        let Node::Sequence { children, .. } = node else { return };

        let mut running_min: u32 = 0;
        for child in children {
            if let Node::Anchor { value, pos } = child {
                if value == "^" && running_min > 0 && !self.current_flags.multiline {
                    self.issues.push(
                        LintIssue::new(
                            "regex.lint.anchor.impossible_caret",
                            "'^' can never match here: the preceding content always consumes at least one character and multiline mode is off",
                        )
                        .at(*pos),
                    );
                }
            }
            running_min = running_min.saturating_add(length_range(child).0);
        }

        let mut suffix_min: u32 = 0;
        for child in children.iter().rev() {
            if let Node::Anchor { value, pos } = child {
                if value == "$" && suffix_min > 0 {
                    self.issues.push(
                        LintIssue::new(
                            "regex.lint.anchor.impossible_dollar",
                            "'$' can never match here: the following content always consumes at least one character",
                        )
                        .at(*pos),
                    );
                }
            }
            suffix_min = suffix_min.saturating_add(length_range(child).0);
        }

        for child in children {
            self.visit(child);
        }
    }

    fn visit_alternation(&mut self, node: &Node) -> Self::Output {
        if let Node::Alternation { alternatives, pos } = node {
            let mut seen = HashSet::new();
            for alt in alternatives {
                if let Node::Literal { value, .. } = alt {
                    if !seen.insert(value.clone()) {
                        self.issues.push(
                            LintIssue::new(
                                "regex.lint.alternation.duplicate_branch",
                                format!("alternation branch '{}' is duplicated", value),
                            )
                            .at(*pos),
                        );
                    }
                }
            }
            for alt in alternatives {
                self.visit(alt);
            }
        }
    }

    fn visit_group(&mut self, node: &Node) -> Self::Output {
        let Node::Group { child, kind, local_flags, pos, .. } = node else { return };

        if matches!(kind, GroupKind::NonCapturing)
            && !matches!(child.as_ref(), Node::Sequence { .. } | Node::Alternation { .. })
        {
            self.issues.push(
                LintIssue::new(
                    "regex.lint.group.redundant_noncapturing",
                    "this non-capturing group wraps a single atom and can be removed",
                )
                .at(*pos),
            );
        }

        if matches!(kind, GroupKind::InlineFlags) {
            if let Some(lf) = local_flags {
                if let Some(verdict) = inline_flag_verdict(&self.current_flags, lf) {
                    self.issues.push(LintIssue::new(verdict.0, verdict.1).at(*pos));
                }
                let saved = self.current_flags;
                self.current_flags = self.current_flags.apply_inline(lf);
                self.visit(child);
                self.current_flags = saved;
                return;
            }
        }

        self.visit(child);
    }

    fn visit_quantifier(&mut self, node: &Node) -> Self::Output {
        let Node::Quantifier { child, repr, pos, .. } = node else { return };
        let (min, max) = cache::parse_quantifier_bounds(repr);
        let unbounded = max.is_none();

        if unbounded && matches!(child.as_ref(), Node::Dot { .. }) {
            self.issues.push(
                LintIssue::new(
                    "regex.lint.quantifier.unbounded_dot",
                    "an unbounded quantifier over '.' can consume the rest of the input",
                )
                .at(*pos),
            );
        }

        if unbounded {
            if let Node::Alternation { alternatives, .. } = unwrap_pass_through(child) {
                'pairs: for i in 0..alternatives.len() {
                    for j in (i + 1)..alternatives.len() {
                        let fi = first_chars(&alternatives[i], &self.current_flags);
                        let fj = first_chars(&alternatives[j], &self.current_flags);
                        if !fi.is_empty() && !fj.is_empty() && fi.intersects(&fj) {
                            self.issues.push(
                                LintIssue::new(
                                    "regex.lint.alternation.overlapping_in_unbounded_quantifier",
                                    "alternation branches repeated by this unbounded quantifier are not provably disjoint, which can cause catastrophic backtracking",
                                )
                                .at(*pos),
                            );
                            break 'pairs;
                        }
                    }
                }
            }
        }

        let outer_variable = min == 0 || max.map_or(true, |m| m > 1);
        if outer_variable {
            if let Some(inner_repr) = find_inner_quantifier_repr(child) {
                let (imin, imax) = cache::parse_quantifier_bounds(&inner_repr);
                let inner_variable = imin == 0 || imax.map_or(true, |m| m > 1);
                if inner_variable {
                    self.issues.push(
                        LintIssue::new(
                            "regex.lint.quantifier.nested",
                            "a variably-repeated group is itself repeated a variable number of times, a common source of catastrophic backtracking",
                        )
                        .at(*pos),
                    );
                }
            }
        }

        self.visit(child);
    }

    fn visit_char_class(&mut self, node: &Node) -> Self::Output {
        let Node::CharClass { expression, pos, .. } = node else { return };
        let items = flatten_class_items(expression);

        let mut seen_codes = HashSet::new();
        for item in &items {
            if let Some(cp) = item.as_single_char() {
                if !seen_codes.insert(cp) {
                    self.issues.push(
                        LintIssue::new(
                            "regex.lint.class.redundant_element",
                            "this character class repeats the same character",
                        )
                        .at(item.pos()),
                    );
                }
            }
        }

        for item in &items {
            if let Node::Range { start, end, pos: rpos } = item {
                if let (Some(lo), Some(hi)) = (start.as_single_char(), end.as_single_char()) {
                    if lo >= 'A' as i32 && lo <= 'Z' as i32 && hi >= 'a' as i32 {
                        self.issues.push(
                            LintIssue::new(
                                "regex.lint.class.suspicious_ascii_range",
                                "this range spans the ASCII punctuation gap between uppercase and lowercase letters",
                            )
                            .at(*rpos),
                        );
                    }
                }
            }
        }

        let mut letter_count = 0usize;
        let mut pipe_count = 0usize;
        for item in &items {
            if let Node::Literal { value, .. } = item {
                if value == "|" {
                    pipe_count += 1;
                } else if value.len() == 1 && value.chars().all(|c| c.is_ascii_alphabetic()) {
                    letter_count += 1;
                }
            }
        }
        if pipe_count >= 1 && letter_count >= 4 {
            self.issues.push(
                LintIssue::new(
                    "regex.lint.class.suspicious_pipe",
                    "'|' has no special meaning inside a character class; did you mean an alternation outside the brackets?",
                )
                .at(*pos),
            );
        }

        self.visit(expression);
    }

    fn visit_class_operation(&mut self, node: &Node) -> Self::Output {
        if let Node::ClassOperation { left, right, .. } = node {
            self.visit(left);
            self.visit(right);
        }
    }

    fn visit_backref(&mut self, node: &Node) -> Self::Output {
        if let Node::Backref { reference, pos } = node {
            if is_dangling_backref(&self.group_numbering, reference) {
                self.issues.push(
                    LintIssue::new(
                        "regex.lint.backref.dangling",
                        format!("backreference '{}' does not refer to any group in this pattern", reference),
                    )
                    .at(*pos),
                );
            }
        }
    }

    fn visit_char_literal(&mut self, node: &Node) -> Self::Output {
        use crate::core::nodes::CharLiteralKind;
        if let Node::CharLiteral { code_point, kind, pos, .. } = node {
            let bad = match kind {
                CharLiteralKind::Octal | CharLiteralKind::OctalLegacy => {
                    *code_point <= 0 || *code_point > 0xFF
                }
                CharLiteralKind::Unicode | CharLiteralKind::UnicodeNamed => {
                    *code_point < 0 || *code_point > 0x10FFFF
                }
            };
            if bad {
                self.issues.push(
                    LintIssue::new(
                        "regex.lint.escape.suspicious",
                        "this escape resolves to a code point outside its valid range",
                    )
                    .at(*pos),
                );
            }
        }
    }

    fn visit_unicode_named(&mut self, node: &Node) -> Self::Output {
        if let Node::UnicodeNamed { name, pos } = node {
            if !cache::is_known_unicode_name(name) {
                self.issues.push(
                    LintIssue::new(
                        "regex.lint.escape.suspicious",
                        format!("'\\N{{{}}}' does not refer to a recognized Unicode character name", name),
                    )
                    .at(*pos),
                );
            }
        }
    }

    fn visit_conditional(&mut self, node: &Node) -> Self::Output {
        if let Node::Conditional { condition, yes, no, .. } = node {
            self.visit(condition);
            self.visit(yes);
            self.visit(no);
        }
    }

    fn visit_define(&mut self, node: &Node) -> Self::Output {
        if let Node::Define { content, .. } = node {
            self.visit(content);
        }
    }
}

/// Decide whether inline flags `lf` (applied against `previous`) are
/// "redundant" (every letter mentioned already holds its desired value) or
/// an "override" (clearing a letter that was actually set). Returns the
/// `(code, message)` pair to report, or `None` when `lf` genuinely changes
/// something.
fn inline_flag_verdict(previous: &PatternFlags, lf: &str) -> Option<(&'static str, String)> {
    let mut clearing = false;
    let mut mentioned = false;
    let mut all_already_matched = true;
    let mut clears_a_set_bit = false;

    for ch in lf.chars() {
        if ch == '-' {
            clearing = true;
            continue;
        }
        let current = match ch {
            'i' => previous.ignore_case,
            'm' => previous.multiline,
            's' => previous.dot_all,
            'u' => previous.unicode,
            'x' => previous.extended,
            'U' => previous.ungreedy,
            'J' => previous.dupnames,
            _ => continue,
        };
        mentioned = true;
        let desired = !clearing;
        if current != desired {
            all_already_matched = false;
        }
        if clearing && current {
            clears_a_set_bit = true;
        }
    }

    if !mentioned {
        return None;
    }
    if all_already_matched {
        Some((
            "regex.lint.flag.inline_redundant",
            format!("inline flags '{}' do not change any currently active flag", lf),
        ))
    } else if clears_a_set_bit {
        Some((
            "regex.lint.flag.inline_redundant",
            format!("inline flags '{}' override a flag set earlier in the pattern", lf),
        ))
    } else {
        None
    }
}

fn flatten_class_items(node: &Node) -> Vec<&Node> {
    match node {
        Node::ClassOperation { left, right, .. } => {
            let mut v = flatten_class_items(left);
            v.extend(flatten_class_items(right));
            v
        }
        Node::Sequence { children, .. } => children.iter().flat_map(flatten_class_items).collect(),
        other => vec![other],
    }
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

/// Unwrap pass-through groups and singleton sequences to find a directly
/// nested `Quantifier`'s `repr`, the shape `(a+)+` and `(?:a+)+` both take.
fn find_inner_quantifier_repr(node: &Node) -> Option<String> {
    match node {
        Node::Quantifier { repr, .. } => Some(repr.clone()),
        Node::Group { child, kind, .. } if !kind.is_lookaround() => {
            find_inner_quantifier_repr(child)
        }
        Node::Sequence { children, .. } if children.len() == 1 => {
            find_inner_quantifier_repr(&children[0])
        }
        _ => None,
    }
}

/// A coarser, soft duplicate of the validator's hard backreference check:
/// only numeric and bare-name forms are covered, since the named-wrapper
/// spellings (`\k<name>`, `(?P=name)`, ...) are already validated fatally
/// and a dangling one never reaches the linter on a pattern worth linting.
fn is_dangling_backref(numbering: &GroupNumbering, reference: &str) -> bool {
    if reference.starts_with('+') || reference.starts_with('-') {
        return false;
    }
    if let Ok(n) = reference.parse::<u32>() {
        return n == 0 || n > numbering.max_group_number;
    }
    numbering.resolve_name(reference).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse;

    fn issue_codes(pattern: &str) -> Vec<String> {
        let root = parse(pattern).expect("pattern should parse");
        lint(&root).into_iter().map(|i| i.code).collect()
    }

    #[test]
    fn s3_useless_flags_on_plain_literal() {
        let codes = issue_codes("/abc/ism");
        assert!(codes.contains(&"regex.lint.flag.useless.i".to_string()));
        assert!(codes.contains(&"regex.lint.flag.useless.s".to_string()));
        assert!(codes.contains(&"regex.lint.flag.useless.m".to_string()));
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn case_insensitive_flag_is_useful_with_a_range() {
        let codes = issue_codes("/[a-z]/i");
        assert!(!codes.contains(&"regex.lint.flag.useless.i".to_string()));
    }

    #[test]
    fn redundant_noncapturing_group_is_flagged() {
        let codes = issue_codes("/(?:a)/");
        assert!(codes.contains(&"regex.lint.group.redundant_noncapturing".to_string()));
    }

    #[test]
    fn noncapturing_group_around_sequence_is_not_flagged() {
        let codes = issue_codes("/(?:ab)/");
        assert!(!codes.contains(&"regex.lint.group.redundant_noncapturing".to_string()));
    }

    #[test]
    fn suspicious_ascii_range_is_flagged() {
        let codes = issue_codes("/[A-z]/");
        assert!(codes.contains(&"regex.lint.class.suspicious_ascii_range".to_string()));
    }

    #[test]
    fn suspicious_pipe_in_class_is_flagged() {
        let codes = issue_codes("/[a|b|c|d]/");
        assert!(codes.contains(&"regex.lint.class.suspicious_pipe".to_string()));
    }

    #[test]
    fn duplicate_literal_alternation_branch_is_flagged() {
        let codes = issue_codes("/cat|dog|cat/");
        assert!(codes.contains(&"regex.lint.alternation.duplicate_branch".to_string()));
    }

    #[test]
    fn nested_variable_quantifiers_are_flagged() {
        let codes = issue_codes("/(a+)+/");
        assert!(codes.contains(&"regex.lint.quantifier.nested".to_string()));
    }

    #[test]
    fn bounded_outer_quantifier_is_not_flagged_as_nested() {
        let codes = issue_codes("/(a+){3}/");
        assert!(!codes.contains(&"regex.lint.quantifier.nested".to_string()));
    }

    #[test]
    fn unbounded_dot_quantifier_is_flagged() {
        let codes = issue_codes("/.*end/");
        assert!(codes.contains(&"regex.lint.quantifier.unbounded_dot".to_string()));
    }

    #[test]
    fn dangling_backref_is_flagged() {
        let codes = issue_codes("/(a)\\5/");
        assert!(codes.contains(&"regex.lint.backref.dangling".to_string()));
    }

    #[test]
    fn impossible_caret_after_nonempty_prefix_is_flagged() {
        let codes = issue_codes("/a^b/");
        assert!(codes.contains(&"regex.lint.anchor.impossible_caret".to_string()));
    }

    #[test]
    fn caret_after_nonempty_prefix_is_allowed_under_multiline() {
        let codes = issue_codes("/a^b/m");
        assert!(!codes.contains(&"regex.lint.anchor.impossible_caret".to_string()));
    }

    #[test]
    fn impossible_dollar_before_nonempty_suffix_is_flagged() {
        let codes = issue_codes("/a$b/");
        assert!(codes.contains(&"regex.lint.anchor.impossible_dollar".to_string()));
    }

    #[test]
    fn redundant_element_in_class_is_flagged() {
        let codes = issue_codes("/[aa]/");
        assert!(codes.contains(&"regex.lint.class.redundant_element".to_string()));
    }
}
