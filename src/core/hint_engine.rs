//! Hint Engine - Context-Aware Diagnostic Hints
//!
//! Maps stable diagnostic codes (parser errors, validator `SemanticError`
//! codes, linter `LintIssue` codes) to short, instructional hint strings, a
//! code-keyed lookup rather than message-sniffing, since every diagnostic in
//! this crate already carries a stable code rather than only a free-text
//! message.

/// Look up the instructional hint for a stable diagnostic code.
///
/// Returns `None` when no hint is registered; diagnostics are still valid
/// and usable without one (hints are an enhancement, not a requirement).
pub fn hint_for(code: &str) -> Option<&'static str> {
    match code {
        "regex.quantifier.invalid_range" => Some(
            "The lower bound of a {n,m} quantifier must not exceed the upper bound. \
            Swap the two numbers or widen the upper bound.",
        ),
        "regex.range.unordered" => Some(
            "A character range like [a-z] must have its start code point at or below its \
            end code point. Check for a reversed range.",
        ),
        "regex.range.invalid_endpoint" => Some(
            "Range endpoints must be single characters, not multi-character literals or \
            classes.",
        ),
        "regex.backref.zero" => Some(
            "Group numbering starts at 1; there is no group 0 to reference (group 0 is the \
            whole match implicitly).",
        ),
        "regex.backref.missing_group" => Some(
            "This backreference points at a capturing group number that does not exist in \
            this pattern. Check the group count or use a named group instead.",
        ),
        "regex.backref.unknown_name" => Some(
            "This backreference names a group that was never declared with (?<name>...). \
            Check for a typo in the group name.",
        ),
        "regex.backref.relative_out_of_range" => Some(
            "This relative backreference (\\g{+k} or \\g{-k}) counts too many or too few \
            groups from the current position.",
        ),
        "regex.subroutine.unknown_name" => Some(
            "This subroutine call names a group that was never declared. Check for a typo \
            in the group name.",
        ),
        "regex.unicode.out_of_range" => Some(
            "Unicode code points must be at most U+10FFFF.",
        ),
        "regex.unicode.octal_out_of_range" => Some(
            "A \\o{..} or legacy octal escape can only address bytes 0-255 (octal 0-377).",
        ),
        "regex.unicode.unknown_named" => Some(
            "This \\N{name} escape does not refer to a recognized Unicode character name.",
        ),
        "regex.unicode.unsupported_property" => Some(
            "This \\p{...} or \\P{...} property name is not supported by the target regex \
            engine. Check for a typo or use a more common property alias.",
        ),
        "regex.posix.unknown_class" => Some(
            "POSIX classes must be one of the 14 recognized names, e.g. [:alpha:] or \
            [:digit:]. A negated form like [:^word:] is not a POSIX class.",
        ),
        "regex.assertion.unknown" => Some(
            "Only \\A, \\z, \\Z, \\G, \\b, and \\B are recognized assertions.",
        ),
        "regex.verb.unknown" => Some(
            "This (*VERB) is not on the recognized list of PCRE control verbs.",
        ),
        "regex.lookbehind.unbounded" => Some(
            "Lookbehind assertions must match a bounded number of characters. Replace the \
            unbounded quantifier inside the lookbehind with a fixed or capped repetition.",
        ),
        "regex.lookbehind.too_long" => Some(
            "This lookbehind's maximum length exceeds the configured limit. Shorten it or \
            raise the limit with (*LIMIT_LOOKBEHIND=n).",
        ),
        "regex.lookbehind.keep_forbidden" => Some(
            "\\K cannot appear inside a lookbehind assertion.",
        ),
        "regex.callout.invalid_identifier" => Some(
            "Numeric callout identifiers must be in the range 0-255; string identifiers \
            must be non-empty.",
        ),
        "regex.control_char.out_of_range" => Some(
            "A \\cX control character escape must resolve to a code point in 0-255.",
        ),
        "regex.conditional.invalid_condition" => Some(
            "A conditional's condition must be a backreference, a subroutine call, a \
            lookaround group, or (DEFINE).",
        ),
        "regex.group.duplicate_name" => Some(
            "This group name is already used elsewhere in the pattern. Enable the J flag \
            (or wrap the group in (?J)) to allow duplicate names, or rename one of them.",
        ),
        "Unterminated group" => Some(
            "This group was opened with '(' but never closed. Add a matching ')' to close \
            the group.",
        ),
        "Unterminated character class" => Some(
            "This character class was opened with '[' but never closed. Add a matching \
            ']' to close the character class.",
        ),
        "Empty character class" => Some(
            "Character classes must contain at least one item. Add characters, ranges, or \
            escapes inside the brackets.",
        ),
        "Invalid flag" => Some(
            "Valid flags are: i (case-insensitive), m (multiline), s (dotall), u (unicode), \
            x (extended/free-spacing), U (ungreedy), A (anchored), D (dollar-end), S \
            (study), J (duplicate names).",
        ),
        "Alternation lacks left-hand side" => Some(
            "An alternation '|' must have content on both sides. Remove the leading '|' or \
            add content before it.",
        ),
        "Alternation lacks right-hand side" => Some(
            "An alternation '|' must have content on both sides. Remove the trailing '|' \
            or add content after it.",
        ),
        "regex.lint.flag.useless.i" => Some(
            "No case-sensitive character (a letter, range, or POSIX class) appears in this \
            pattern, so the i flag has nothing to affect.",
        ),
        "regex.lint.flag.useless.s" => Some(
            "This pattern contains no '.' metacharacter, so the s flag (dot matches \
            newline) has nothing to affect.",
        ),
        "regex.lint.flag.useless.m" => Some(
            "This pattern contains no '^' or '$' anchor, so the m flag (anchors match at \
            line boundaries) has nothing to affect.",
        ),
        "regex.lint.flag.inline_redundant" => Some(
            "This inline flag group either repeats a flag already in its current state or \
            clears a flag that another enclosing scope relies on. Remove the redundant \
            letter or double-check the intended scope.",
        ),
        "regex.lint.group.redundant_noncapturing" => Some(
            "A non-capturing group wrapping a single atomic item adds nothing; the group \
            can be removed without changing what the pattern matches.",
        ),
        "regex.lint.class.redundant_element" => Some(
            "The same character appears more than once in this character class.",
        ),
        "regex.lint.class.suspicious_ascii_range" => Some(
            "This range spans from an uppercase letter into lowercase (or similar), \
            sweeping in the punctuation characters between them. Split it into two ranges \
            if that punctuation wasn't intended.",
        ),
        "regex.lint.class.suspicious_pipe" => Some(
            "A '|' inside a character class matches the literal pipe character, not \
            alternation; character classes don't support '|' as an operator.",
        ),
        "regex.lint.alternation.duplicate_branch" => Some(
            "The same literal branch appears more than once in this alternation.",
        ),
        "regex.lint.alternation.overlapping_in_unbounded_quantifier" => Some(
            "These alternation branches can both match the same starting characters, which \
            invites catastrophic backtracking once repeated by an unbounded quantifier. \
            Consider making the branches mutually exclusive or possessive.",
        ),
        "regex.lint.quantifier.unbounded_dot" => Some(
            "An unbounded '.' tends to be a greedier match than intended; consider a \
            narrower character class or an explicit upper bound.",
        ),
        "regex.lint.quantifier.nested" => Some(
            "A variable-repetition quantifier directly wraps another variable-repetition \
            quantifier, a classic catastrophic-backtracking shape. Consider merging the two \
            quantifiers, or making the inner one possessive or atomic.",
        ),
        "regex.lint.anchor.impossible_caret" => Some(
            "This '^' is preceded by content that must already have consumed at least one \
            character, so it can never match here outside multiline mode.",
        ),
        "regex.lint.anchor.impossible_dollar" => Some(
            "This '$' is followed by content that must consume at least one more character, \
            so it can never match at this position.",
        ),
        "regex.lint.backref.dangling" => Some(
            "This backreference points at a group number or name that isn't declared in \
            this pattern.",
        ),
        "regex.lint.escape.suspicious" => Some(
            "This escape's code point or name falls outside the range this engine can \
            represent. Double check the intended character.",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_has_hint() {
        let hint = hint_for("regex.quantifier.invalid_range");
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("lower bound"));
    }

    #[test]
    fn legacy_message_keys_still_resolve() {
        let hint = hint_for("Unterminated group");
        assert!(hint.unwrap().contains("matching ')'"));
    }

    #[test]
    fn unknown_code_has_no_hint() {
        assert!(hint_for("regex.not.a.real.code").is_none());
    }
}
