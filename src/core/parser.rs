//! PCRE pattern parser.
//!
//! Turns delimited pattern source (`/a{5,2}/i`) into the `Regex` root of
//! the node algebra in `nodes.rs`. The analyses themselves are defined
//! purely in terms of the AST; this module exists so they have something
//! real to run over, end to end, in this crate's own tests.
//!
//! A handful of corners of full PCRE syntax are simplified rather than
//! chased to their last edge case — each simplification is called out where
//! it happens rather than silently assumed.

use crate::core::errors::PatternError;
use crate::core::flags::PatternFlags;
use crate::core::hint_engine::hint_for;
use crate::core::nodes::{CalloutId, CharLiteralKind, ClassOpKind, GroupKind, Greediness, Node, Position};

fn closing_for(delimiter: char) -> char {
    match delimiter {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    }
}

/// Parse delimited pattern source into a `Regex` root.
pub fn parse(source: &str) -> Result<Node, PatternError> {
    let mut chars = source.char_indices();
    let (_, delimiter) = chars
        .next()
        .ok_or_else(|| PatternError::new("Empty pattern".to_string(), 0, source.to_string(), None))?;
    let closing = closing_for(delimiter);
    let body_start = delimiter.len_utf8();

    let mut class_depth: i32 = 0;
    let mut escaped = false;
    let mut end_byte = None;
    for (byte_idx, ch) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' => class_depth += 1,
            ']' if class_depth > 0 => class_depth -= 1,
            c if c == closing && class_depth == 0 => {
                end_byte = Some(byte_idx);
                break;
            }
            _ => {}
        }
    }
    let end_byte = end_byte.ok_or_else(|| {
        PatternError::new(
            format!("Unterminated pattern: missing closing delimiter '{}'", closing),
            source.len(),
            source.to_string(),
            Some("Every delimited pattern needs a matching closing delimiter before its flags.".to_string()),
        )
    })?;

    let body = &source[body_start..end_byte];
    let flags_str = &source[end_byte + closing.len_utf8()..];
    let flags = PatternFlags::from_letters(flags_str);

    let mut parser = Parser::new(body, flags);
    let pattern = parser.parse_pattern()?;
    Ok(Node::Regex {
        pattern: Box::new(pattern),
        flags: flags_str.to_string(),
        delimiter,
        pos: Position::new(0, body.len()),
    })
}

struct Cursor {
    text: String,
    i: usize,
    in_class: u32,
}

impl Cursor {
    fn new(text: String) -> Self {
        Self { text, i: 0, in_class: 0 }
    }

    fn rest(&self) -> &str {
        &self.text[self.i..]
    }

    fn is_eof(&self) -> bool {
        self.i >= self.text.len()
    }

    fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.i += c.len_utf8();
        Some(c)
    }
}

pub struct Parser {
    flags: PatternFlags,
    cur: Cursor,
    total_capture_groups: u32,
}

impl Parser {
    fn new(body: &str, flags: PatternFlags) -> Self {
        let total_capture_groups = count_capturing_groups(body);
        Parser {
            flags,
            cur: Cursor::new(body.to_string()),
            total_capture_groups,
        }
    }

    fn error(&self, message: String, pos: usize) -> PatternError {
        let hint = hint_for(&message).map(str::to_string);
        PatternError::new(message, pos, self.cur.text.clone(), hint)
    }

    fn expect(&mut self, expected: char, error_msg: &str) -> Result<(), PatternError> {
        match self.cur.current() {
            Some(c) if c == expected => {
                self.cur.advance();
                Ok(())
            }
            _ => Err(self.error(error_msg.to_string(), self.cur.i)),
        }
    }

    fn skip_ws_and_comments(&mut self) {
        if !self.flags.extended || self.cur.in_class > 0 {
            return;
        }
        loop {
            match self.cur.current() {
                Some(c) if c.is_whitespace() => {
                    self.cur.advance();
                }
                Some('#') => {
                    while let Some(c) = self.cur.current() {
                        if c == '\n' {
                            break;
                        }
                        self.cur.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn parse_pattern(&mut self) -> Result<Node, PatternError> {
        let node = self.parse_alt()?;
        self.skip_ws_and_comments();
        if !self.cur.is_eof() {
            if self.cur.current() == Some(')') {
                return Err(self.error("Unmatched ')'".to_string(), self.cur.i));
            }
            return Err(self.error("Unexpected trailing input".to_string(), self.cur.i));
        }
        Ok(node)
    }

    fn parse_alt(&mut self) -> Result<Node, PatternError> {
        self.skip_ws_and_comments();
        if self.cur.current() == Some('|') {
            return Err(self.error("Alternation lacks left-hand side".to_string(), self.cur.i));
        }
        let start = self.cur.i;
        let mut branches = vec![self.parse_seq()?];
        self.skip_ws_and_comments();
        while self.cur.current() == Some('|') {
            let pipe_pos = self.cur.i;
            self.cur.advance();
            self.skip_ws_and_comments();
            if self.cur.is_eof() || self.cur.current() == Some(')') {
                return Err(self.error("Alternation lacks right-hand side".to_string(), pipe_pos));
            }
            branches.push(self.parse_seq()?);
            self.skip_ws_and_comments();
        }
        if branches.len() == 1 {
            Ok(branches.into_iter().next().unwrap())
        } else {
            let end = self.cur.i;
            Ok(Node::Alternation { alternatives: branches, pos: Position::new(start, end) })
        }
    }

    fn parse_seq(&mut self) -> Result<Node, PatternError> {
        let start = self.cur.i;
        let mut parts = Vec::new();
        loop {
            self.skip_ws_and_comments();
            if self.cur.is_eof() {
                break;
            }
            if matches!(self.cur.current(), Some('|') | Some(')')) {
                break;
            }
            if let Some((local_flags, marker_pos)) = self.try_parse_bare_inline_flags()? {
                self.skip_ws_and_comments();
                let rest = self.parse_seq()?;
                let merged_pos = marker_pos.span(&rest.pos());
                parts.push(Node::Group {
                    child: Box::new(rest),
                    kind: GroupKind::InlineFlags,
                    name: None,
                    local_flags: Some(local_flags),
                    pos: merged_pos,
                });
                break;
            }
            let atom = self.parse_atom()?;
            let atom = self.maybe_wrap_quantifier(atom)?;
            parts.push(atom);
        }
        let end = self.cur.i;
        if parts.is_empty() {
            Ok(Node::Literal { value: String::new(), is_raw: false, pos: Position::new(start, end) })
        } else if parts.len() == 1 {
            Ok(parts.into_iter().next().unwrap())
        } else {
            Ok(Node::Sequence { children: parts, pos: Position::new(start, end) })
        }
    }

    /// Looks ahead for a standalone `(?flags)` marker (no trailing `:`),
    /// which scopes over the remainder of the enclosing sequence rather
    /// than a bracketed child. Restores the cursor on mismatch.
    fn try_parse_bare_inline_flags(&mut self) -> Result<Option<(String, Position)>, PatternError> {
        if !self.cur.rest().starts_with("(?") {
            return Ok(None);
        }
        let saved = self.cur.i;
        let start = self.cur.i;
        self.cur.advance();
        self.cur.advance();
        let mut letters = String::new();
        while let Some(c) = self.cur.current() {
            if "imsuxUJ-".contains(c) {
                letters.push(c);
                self.cur.advance();
            } else {
                break;
            }
        }
        if self.cur.current() == Some(')') && !letters.is_empty() && letters != "-" {
            self.cur.advance();
            let end = self.cur.i;
            return Ok(Some((letters, Position::new(start, end))));
        }
        self.cur.i = saved;
        Ok(None)
    }

    fn maybe_wrap_quantifier(&mut self, atom: Node) -> Result<Node, PatternError> {
        let atom_start = atom.pos().start;
        if let Some((repr, greediness)) = self.try_parse_quantifier()? {
            let end = self.cur.i;
            Ok(Node::Quantifier {
                child: Box::new(atom),
                repr,
                greediness,
                pos: Position::new(atom_start, end),
            })
        } else {
            Ok(atom)
        }
    }

    fn try_parse_quantifier(&mut self) -> Result<Option<(String, Greediness)>, PatternError> {
        let repr = match self.cur.current() {
            Some('*') => {
                self.cur.advance();
                "*".to_string()
            }
            Some('+') => {
                self.cur.advance();
                "+".to_string()
            }
            Some('?') => {
                self.cur.advance();
                "?".to_string()
            }
            Some('{') => {
                let saved = self.cur.i;
                self.cur.advance();
                let mut inner = String::new();
                while let Some(c) = self.cur.current() {
                    if c == '}' {
                        break;
                    }
                    inner.push(c);
                    self.cur.advance();
                }
                if self.cur.current() == Some('}') && is_valid_brace_inner(&inner) {
                    self.cur.advance();
                    let normalized: String = inner.chars().filter(|c| !c.is_whitespace()).collect();
                    format!("{{{}}}", normalized)
                } else {
                    self.cur.i = saved;
                    return Ok(None);
                }
            }
            _ => return Ok(None),
        };
        let greediness = match self.cur.current() {
            Some('?') => {
                self.cur.advance();
                Greediness::Lazy
            }
            Some('+') => {
                self.cur.advance();
                Greediness::Possessive
            }
            _ => Greediness::Greedy,
        };
        Ok(Some((repr, greediness)))
    }

    fn parse_atom(&mut self) -> Result<Node, PatternError> {
        self.skip_ws_and_comments();
        if self.cur.is_eof() {
            return Err(self.error("Unexpected end of pattern".to_string(), self.cur.i));
        }
        let start = self.cur.i;
        match self.cur.current().unwrap() {
            '.' => {
                self.cur.advance();
                Ok(Node::Dot { pos: Position::new(start, self.cur.i) })
            }
            '^' => {
                self.cur.advance();
                Ok(Node::Anchor { value: "^".to_string(), pos: Position::new(start, self.cur.i) })
            }
            '$' => {
                self.cur.advance();
                Ok(Node::Anchor { value: "$".to_string(), pos: Position::new(start, self.cur.i) })
            }
            '(' => self.parse_group(),
            '[' => self.parse_char_class(),
            '\\' => self.parse_escape(),
            ')' => Err(self.error("Unmatched ')'".to_string(), start)),
            _ => {
                let ch = self.cur.advance().unwrap();
                Ok(Node::Literal { value: ch.to_string(), is_raw: false, pos: Position::new(start, self.cur.i) })
            }
        }
    }

    fn parse_escape(&mut self) -> Result<Node, PatternError> {
        let start = self.cur.i;
        self.cur.advance();
        let ch = self
            .cur
            .current()
            .ok_or_else(|| self.error("Incomplete escape sequence".to_string(), start))?;
        match ch {
            'A' | 'z' | 'Z' | 'G' | 'b' | 'B' => {
                self.cur.advance();
                Ok(Node::Assertion { value: ch, pos: Position::new(start, self.cur.i) })
            }
            'K' => {
                self.cur.advance();
                Ok(Node::Keep { pos: Position::new(start, self.cur.i) })
            }
            'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'h' | 'H' | 'v' | 'V' | 'R' => {
                self.cur.advance();
                Ok(Node::CharType { value: ch, pos: Position::new(start, self.cur.i) })
            }
            'N' => {
                self.cur.advance();
                if self.cur.current() == Some('{') {
                    self.parse_unicode_named(start)
                } else {
                    Ok(Node::CharType { value: 'N', pos: Position::new(start, self.cur.i) })
                }
            }
            'p' | 'P' => self.parse_unicode_property(start, ch == 'P'),
            'x' => self.parse_hex_escape(start),
            'u' => self.parse_u_escape(start),
            'o' => self.parse_octal_brace_escape(start),
            'c' => self.parse_control_escape(start),
            'k' => self.parse_named_backref(start),
            'g' => self.parse_g_escape(start),
            '0'..='9' => self.parse_numeric_escape(start),
            'n' => self.single_char_literal(start, '\n'),
            'r' => self.single_char_literal(start, '\r'),
            't' => self.single_char_literal(start, '\t'),
            'f' => self.single_char_literal(start, '\u{000C}'),
            'e' => self.single_char_literal(start, '\u{001B}'),
            'a' => self.single_char_literal(start, '\u{0007}'),
            _ => {
                let literal_char = self.cur.advance().unwrap();
                Ok(Node::Literal { value: literal_char.to_string(), is_raw: false, pos: Position::new(start, self.cur.i) })
            }
        }
    }

    fn single_char_literal(&mut self, start: usize, ch: char) -> Result<Node, PatternError> {
        self.cur.advance();
        Ok(Node::Literal { value: ch.to_string(), is_raw: false, pos: Position::new(start, self.cur.i) })
    }

    fn parse_unicode_named(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        let mut name = String::new();
        while let Some(c) = self.cur.current() {
            if c == '}' {
                break;
            }
            name.push(c);
            self.cur.advance();
        }
        self.expect('}', "Unterminated \\N{...} escape")?;
        Ok(Node::UnicodeNamed { name, pos: Position::new(start, self.cur.i) })
    }

    fn parse_unicode_property(&mut self, start: usize, is_upper: bool) -> Result<Node, PatternError> {
        self.cur.advance();
        let mut negated = is_upper;
        let prop_body = if self.cur.current() == Some('{') {
            self.cur.advance();
            if self.cur.current() == Some('^') {
                negated = !negated;
                self.cur.advance();
            }
            let mut name = String::new();
            while let Some(c) = self.cur.current() {
                if c == '}' {
                    break;
                }
                name.push(c);
                self.cur.advance();
            }
            self.expect('}', "Unterminated \\p{...} escape")?;
            name
        } else {
            let c = self
                .cur
                .advance()
                .ok_or_else(|| self.error("Incomplete \\p escape".to_string(), start))?;
            c.to_string()
        };
        let prop = if negated { format!("^{}", prop_body) } else { prop_body };
        Ok(Node::UnicodeProp { prop, pos: Position::new(start, self.cur.i) })
    }

    fn parse_hex_escape(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        if self.cur.current() == Some('{') {
            self.cur.advance();
            let mut hex = String::new();
            while let Some(c) = self.cur.current() {
                if c == '}' {
                    break;
                }
                hex.push(c);
                self.cur.advance();
            }
            self.expect('}', "Unterminated \\x{...} escape")?;
            let code_point = i32::from_str_radix(&hex, 16).unwrap_or(-1);
            Ok(Node::CharLiteral {
                code_point,
                original_repr: format!("\\x{{{}}}", hex),
                kind: CharLiteralKind::Unicode,
                pos: Position::new(start, self.cur.i),
            })
        } else {
            let mut hex = String::new();
            for _ in 0..2 {
                match self.cur.current() {
                    Some(c) if c.is_ascii_hexdigit() => {
                        hex.push(c);
                        self.cur.advance();
                    }
                    _ => break,
                }
            }
            let code_point = if hex.is_empty() { 0 } else { i32::from_str_radix(&hex, 16).unwrap_or(0) };
            Ok(Node::CharLiteral {
                code_point,
                original_repr: format!("\\x{}", hex),
                kind: CharLiteralKind::Unicode,
                pos: Position::new(start, self.cur.i),
            })
        }
    }

    fn parse_u_escape(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        if self.cur.current() == Some('{') {
            self.cur.advance();
            let mut hex = String::new();
            while let Some(c) = self.cur.current() {
                if c == '}' {
                    break;
                }
                hex.push(c);
                self.cur.advance();
            }
            self.expect('}', "Unterminated \\u{...} escape")?;
            let code_point = i32::from_str_radix(&hex, 16).unwrap_or(-1);
            Ok(Node::CharLiteral {
                code_point,
                original_repr: format!("\\u{{{}}}", hex),
                kind: CharLiteralKind::Unicode,
                pos: Position::new(start, self.cur.i),
            })
        } else {
            let mut hex = String::new();
            for _ in 0..4 {
                match self.cur.current() {
                    Some(c) if c.is_ascii_hexdigit() => {
                        hex.push(c);
                        self.cur.advance();
                    }
                    _ => break,
                }
            }
            let code_point = if hex.is_empty() { 0 } else { i32::from_str_radix(&hex, 16).unwrap_or(0) };
            Ok(Node::CharLiteral {
                code_point,
                original_repr: format!("\\u{}", hex),
                kind: CharLiteralKind::Unicode,
                pos: Position::new(start, self.cur.i),
            })
        }
    }

    fn parse_octal_brace_escape(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        self.expect('{', "Expected '{' after \\o")?;
        let mut digits = String::new();
        while let Some(c) = self.cur.current() {
            if c == '}' {
                break;
            }
            digits.push(c);
            self.cur.advance();
        }
        self.expect('}', "Unterminated \\o{...} escape")?;
        let code_point = i32::from_str_radix(&digits, 8).unwrap_or(-1);
        Ok(Node::CharLiteral {
            code_point,
            original_repr: format!("\\o{{{}}}", digits),
            kind: CharLiteralKind::Octal,
            pos: Position::new(start, self.cur.i),
        })
    }

    fn parse_control_escape(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        let ch = self
            .cur
            .advance()
            .ok_or_else(|| self.error("Incomplete \\c escape".to_string(), start))?;
        let code_point = (ch.to_ascii_uppercase() as i32) ^ 0x40;
        Ok(Node::ControlChar { ch, code_point, pos: Position::new(start, self.cur.i) })
    }

    fn parse_named_backref(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        let (open, close) = match self.cur.current() {
            Some('<') => ('<', '>'),
            Some('\'') => ('\'', '\''),
            Some('{') => ('{', '}'),
            _ => return Err(self.error("Expected '<', ''' or '{' after \\k".to_string(), start)),
        };
        self.cur.advance();
        let mut name = String::new();
        while let Some(c) = self.cur.current() {
            if c == close {
                break;
            }
            name.push(c);
            self.cur.advance();
        }
        self.expect(close, "Unterminated \\k named backreference")?;
        Ok(Node::Backref {
            reference: format!("k{}{}{}", open, name, close),
            pos: Position::new(start, self.cur.i),
        })
    }

    fn parse_g_escape(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        match self.cur.current() {
            Some(open @ ('<' | '\'')) => {
                let close = if open == '<' { '>' } else { '\'' };
                self.cur.advance();
                let mut name = String::new();
                while let Some(c) = self.cur.current() {
                    if c == close {
                        break;
                    }
                    name.push(c);
                    self.cur.advance();
                }
                self.expect(close, "Unterminated \\g subroutine call")?;
                Ok(Node::Subroutine { reference: name, pos: Position::new(start, self.cur.i) })
            }
            Some('{') => {
                self.cur.advance();
                let mut inner = String::new();
                while let Some(c) = self.cur.current() {
                    if c == '}' {
                        break;
                    }
                    inner.push(c);
                    self.cur.advance();
                }
                self.expect('}', "Unterminated \\g{...} backreference")?;
                Ok(Node::Backref { reference: inner, pos: Position::new(start, self.cur.i) })
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => {
                let mut digits = String::new();
                if matches!(self.cur.current(), Some('-') | Some('+')) {
                    digits.push(self.cur.advance().unwrap());
                }
                while let Some(c) = self.cur.current() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        self.cur.advance();
                    } else {
                        break;
                    }
                }
                Ok(Node::Backref { reference: digits, pos: Position::new(start, self.cur.i) })
            }
            _ => Err(self.error("Invalid \\g escape".to_string(), start)),
        }
    }

    fn parse_numeric_escape(&mut self, start: usize) -> Result<Node, PatternError> {
        let mut digits = String::new();
        while let Some(c) = self.cur.current() {
            if c.is_ascii_digit() && digits.len() < 3 {
                digits.push(c);
                self.cur.advance();
            } else {
                break;
            }
        }
        let as_number: u32 = digits.parse().unwrap_or(0);
        let starts_zero = digits.starts_with('0');
        if !starts_zero && as_number >= 1 && as_number <= self.total_capture_groups {
            Ok(Node::Backref { reference: digits, pos: Position::new(start, self.cur.i) })
        } else {
            let octal_digits: String = digits.chars().take_while(|c| matches!(c, '0'..='7')).collect();
            let dropped = digits.len() - octal_digits.len();
            self.cur.i -= dropped;
            let code_point = i32::from_str_radix(&octal_digits, 8).unwrap_or(-1);
            Ok(Node::CharLiteral {
                code_point,
                original_repr: format!("\\{}", octal_digits),
                kind: CharLiteralKind::OctalLegacy,
                pos: Position::new(start, self.cur.i),
            })
        }
    }

    fn parse_group(&mut self) -> Result<Node, PatternError> {
        let start = self.cur.i;
        self.cur.advance();
        if self.cur.current() == Some('*') {
            return self.parse_star_construct(start);
        }
        if self.cur.current() != Some('?') {
            let child = self.parse_alt()?;
            self.expect(')', "Unterminated group")?;
            return Ok(Node::Group {
                child: Box::new(child),
                kind: GroupKind::Capturing,
                name: None,
                local_flags: None,
                pos: Position::new(start, self.cur.i),
            });
        }
        self.cur.advance();
        match self.cur.current() {
            Some(':') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated non-capturing group")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::NonCapturing, name: None, local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            Some('=') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated lookahead")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::LookaheadPos, name: None, local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            Some('!') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated negative lookahead")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::LookaheadNeg, name: None, local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            Some('>') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated atomic group")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::Atomic, name: None, local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            Some('|') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated branch-reset group")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::BranchReset, name: None, local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            Some('#') => {
                self.cur.advance();
                let mut text = String::new();
                while let Some(c) = self.cur.current() {
                    if c == ')' {
                        break;
                    }
                    text.push(c);
                    self.cur.advance();
                }
                self.expect(')', "Unterminated comment")?;
                Ok(Node::Comment { text, pos: Position::new(start, self.cur.i) })
            }
            Some('<') => self.parse_angle_group(start),
            Some('\'') => self.parse_quote_named_group(start),
            Some('P') => self.parse_p_group(start),
            Some('&') => {
                self.cur.advance();
                let mut name = String::new();
                while let Some(c) = self.cur.current() {
                    if c == ')' {
                        break;
                    }
                    name.push(c);
                    self.cur.advance();
                }
                self.expect(')', "Unterminated subroutine call")?;
                Ok(Node::Subroutine { reference: name, pos: Position::new(start, self.cur.i) })
            }
            Some('(') => self.parse_conditional(start),
            Some('C') => self.parse_callout(start),
            Some('R') => {
                self.cur.advance();
                self.expect(')', "Unterminated (?R) recursion")?;
                Ok(Node::Subroutine { reference: "R".to_string(), pos: Position::new(start, self.cur.i) })
            }
            Some(c) if c.is_ascii_digit() || c == '+' || c == '-' => {
                let mut digits = String::new();
                if matches!(c, '+' | '-') {
                    digits.push(self.cur.advance().unwrap());
                }
                while let Some(c) = self.cur.current() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        self.cur.advance();
                    } else {
                        break;
                    }
                }
                self.expect(')', "Unterminated subroutine call")?;
                Ok(Node::Subroutine { reference: digits, pos: Position::new(start, self.cur.i) })
            }
            Some(c) if "imsuxUJAD-".contains(c) => self.parse_inline_flags_group(start),
            Some(other) => Err(self.error(format!("Unknown group modifier '?{}'", other), start)),
            None => Err(self.error("Unterminated group".to_string(), start)),
        }
    }

    fn parse_angle_group(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        match self.cur.current() {
            Some('=') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated lookbehind")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::LookbehindPos, name: None, local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            Some('!') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated negative lookbehind")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::LookbehindNeg, name: None, local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            _ => {
                let name = self.parse_name_until('>')?;
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated named group")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::Named, name: Some(name), local_flags: None, pos: Position::new(start, self.cur.i) })
            }
        }
    }

    fn parse_quote_named_group(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        let name = self.parse_name_until('\'')?;
        let child = self.parse_alt()?;
        self.expect(')', "Unterminated named group")?;
        Ok(Node::Group { child: Box::new(child), kind: GroupKind::Named, name: Some(name), local_flags: None, pos: Position::new(start, self.cur.i) })
    }

    fn parse_p_group(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        match self.cur.current() {
            Some('<') => {
                self.cur.advance();
                let name = self.parse_name_until('>')?;
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated named group")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::Named, name: Some(name), local_flags: None, pos: Position::new(start, self.cur.i) })
            }
            Some('=') => {
                self.cur.advance();
                let name = self.parse_name_until(')')?;
                Ok(Node::Backref { reference: format!("P={}", name), pos: Position::new(start, self.cur.i) })
            }
            Some('>') => {
                self.cur.advance();
                let name = self.parse_name_until(')')?;
                Ok(Node::Subroutine { reference: name, pos: Position::new(start, self.cur.i) })
            }
            _ => Err(self.error("Unknown (?P...) construct".to_string(), start)),
        }
    }

    fn parse_name_until(&mut self, close: char) -> Result<String, PatternError> {
        let start = self.cur.i;
        let mut name = String::new();
        while let Some(c) = self.cur.current() {
            if c == close {
                break;
            }
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.cur.advance();
            } else {
                return Err(self.error(format!("Invalid character '{}' in group name", c), self.cur.i));
            }
        }
        if name.is_empty() {
            return Err(self.error("Empty group name".to_string(), start));
        }
        self.expect(close, "Unterminated group name")?;
        Ok(name)
    }

    fn parse_inline_flags_group(&mut self, start: usize) -> Result<Node, PatternError> {
        let mut letters = String::new();
        while let Some(c) = self.cur.current() {
            if c == ':' || c == ')' {
                break;
            }
            letters.push(c);
            self.cur.advance();
        }
        match self.cur.current() {
            Some(':') => {
                self.cur.advance();
                let child = self.parse_alt()?;
                self.expect(')', "Unterminated inline-flags group")?;
                Ok(Node::Group { child: Box::new(child), kind: GroupKind::InlineFlags, name: None, local_flags: Some(letters), pos: Position::new(start, self.cur.i) })
            }
            Some(')') => {
                // Reached only when parse_group is entered directly rather
                // than through parse_seq's bare-marker lookahead (e.g. as
                // the sole alternative in a branch); the scope then has
                // nothing left to apply to.
                self.cur.advance();
                let pos = Position::new(start, self.cur.i);
                Ok(Node::Group {
                    child: Box::new(Node::Literal { value: String::new(), is_raw: false, pos }),
                    kind: GroupKind::InlineFlags,
                    name: None,
                    local_flags: Some(letters),
                    pos,
                })
            }
            _ => Err(self.error("Unterminated inline flags".to_string(), start)),
        }
    }

    fn parse_callout(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        let identifier = match self.cur.current() {
            Some(')') => CalloutId::Numeric(0),
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(c) = self.cur.current() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        self.cur.advance();
                    } else {
                        break;
                    }
                }
                CalloutId::Numeric(digits.parse().unwrap_or(0))
            }
            Some(q @ ('"' | '\'')) => {
                self.cur.advance();
                let mut text = String::new();
                while let Some(c) = self.cur.current() {
                    if c == q {
                        break;
                    }
                    text.push(c);
                    self.cur.advance();
                }
                self.expect(q, "Unterminated callout string identifier")?;
                CalloutId::Str(text)
            }
            _ => return Err(self.error("Invalid callout identifier".to_string(), start)),
        };
        self.expect(')', "Unterminated callout")?;
        Ok(Node::Callout { identifier, pos: Position::new(start, self.cur.i) })
    }

    fn parse_star_construct(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        let mut name = String::new();
        while let Some(c) = self.cur.current() {
            if c == ')' || c == ':' || c == '=' {
                break;
            }
            name.push(c);
            self.cur.advance();
        }
        let mut arg = String::new();
        if matches!(self.cur.current(), Some(':') | Some('=')) {
            self.cur.advance();
            while let Some(c) = self.cur.current() {
                if c == ')' {
                    break;
                }
                arg.push(c);
                self.cur.advance();
            }
        }
        self.expect(')', "Unterminated (*VERB) construct")?;
        let pos = Position::new(start, self.cur.i);
        let upper = name.to_ascii_uppercase();
        if upper.starts_with("LIMIT_MATCH") {
            return Ok(Node::LimitMatch { limit: arg.trim().parse().unwrap_or(0), pos });
        }
        if upper.starts_with("VERSION") {
            return Ok(Node::VersionCondition { version: arg, pos });
        }
        if upper.starts_with("SCRIPT_RUN") || upper == "ASR" {
            return Ok(Node::ScriptRun { script: arg, pos });
        }
        let verb_text = if arg.is_empty() { name } else { format!("{}:{}", name, arg) };
        Ok(Node::PcreVerb { verb: verb_text, pos })
    }

    fn parse_conditional(&mut self, start: usize) -> Result<Node, PatternError> {
        self.cur.advance();
        let cond_start = self.cur.i;
        let mut depth = 0i32;
        let mut cond_text = String::new();
        loop {
            match self.cur.current() {
                None => return Err(self.error("Unterminated conditional".to_string(), start)),
                Some('(') => {
                    depth += 1;
                    cond_text.push('(');
                    self.cur.advance();
                }
                Some(')') if depth > 0 => {
                    depth -= 1;
                    cond_text.push(')');
                    self.cur.advance();
                }
                Some(')') => break,
                Some(c) => {
                    cond_text.push(c);
                    self.cur.advance();
                }
            }
        }
        self.expect(')', "Unterminated conditional condition")?;
        let condition = self.build_condition_node(&cond_text, cond_start)?;
        let yes = self.parse_seq()?;
        let no = if self.cur.current() == Some('|') {
            self.cur.advance();
            self.parse_seq()?
        } else {
            Node::Literal { value: String::new(), is_raw: false, pos: Position::new(self.cur.i, self.cur.i) }
        };
        self.expect(')', "Unterminated conditional")?;
        Ok(Node::Conditional {
            condition: Box::new(condition),
            yes: Box::new(yes),
            no: Box::new(no),
            pos: Position::new(start, self.cur.i),
        })
    }

    fn build_condition_node(&mut self, cond_text: &str, cond_start: usize) -> Result<Node, PatternError> {
        let cond_end = cond_start + cond_text.len();
        let pos = Position::new(cond_start, cond_end);
        // Lookaround-form conditions re-parse their own fragment through a
        // throwaway parser; positions inside them are local to the
        // fragment, not shifted into the outer body — an accepted gap for
        // this rarely used corner of the grammar.
        if let Some(rest) = cond_text.strip_prefix("?=") {
            return Ok(Node::Group { child: Box::new(self.parse_fragment(rest)?), kind: GroupKind::LookaheadPos, name: None, local_flags: None, pos });
        }
        if let Some(rest) = cond_text.strip_prefix("?!") {
            return Ok(Node::Group { child: Box::new(self.parse_fragment(rest)?), kind: GroupKind::LookaheadNeg, name: None, local_flags: None, pos });
        }
        if let Some(rest) = cond_text.strip_prefix("?<=") {
            return Ok(Node::Group { child: Box::new(self.parse_fragment(rest)?), kind: GroupKind::LookbehindPos, name: None, local_flags: None, pos });
        }
        if let Some(rest) = cond_text.strip_prefix("?<!") {
            return Ok(Node::Group { child: Box::new(self.parse_fragment(rest)?), kind: GroupKind::LookbehindNeg, name: None, local_flags: None, pos });
        }
        if cond_text == "DEFINE" {
            return Ok(Node::Define { content: Box::new(Node::Literal { value: String::new(), is_raw: false, pos }), pos });
        }
        let looks_like_recursion = cond_text == "R"
            || cond_text.starts_with("R&")
            || (cond_text.starts_with('R') && cond_text.len() > 1 && cond_text[1..].chars().all(|c| c.is_ascii_digit()));
        if looks_like_recursion {
            return Ok(Node::Subroutine { reference: cond_text.to_string(), pos });
        }
        Ok(Node::Backref { reference: cond_text.to_string(), pos })
    }

    fn parse_fragment(&self, text: &str) -> Result<Node, PatternError> {
        let mut inner = Parser {
            flags: self.flags,
            cur: Cursor::new(text.to_string()),
            total_capture_groups: self.total_capture_groups,
        };
        inner.parse_alt()
    }

    fn parse_char_class(&mut self) -> Result<Node, PatternError> {
        let start = self.cur.i;
        self.cur.advance();
        self.cur.in_class += 1;
        let negated = if self.cur.current() == Some('^') {
            self.cur.advance();
            true
        } else {
            false
        };
        let mut segments: Vec<Vec<Node>> = vec![Vec::new()];
        let mut first_item = true;
        loop {
            match self.cur.current() {
                None => return Err(self.error("Unterminated character class".to_string(), start)),
                Some(']') if !first_item => {
                    self.cur.advance();
                    break;
                }
                Some(']') => {
                    let item_start = self.cur.i;
                    self.cur.advance();
                    segments.last_mut().unwrap().push(Node::Literal { value: "]".to_string(), is_raw: false, pos: Position::new(item_start, self.cur.i) });
                    first_item = false;
                }
                Some('&') if self.cur.rest().starts_with("&&") => {
                    self.cur.advance();
                    self.cur.advance();
                    segments.push(Vec::new());
                }
                Some('[') if self.cur.rest().starts_with("[:") => {
                    segments.last_mut().unwrap().push(self.parse_posix_class()?);
                    first_item = false;
                }
                _ => {
                    let item = self.parse_class_item()?;
                    let item = self.maybe_parse_range(item)?;
                    segments.last_mut().unwrap().push(item);
                    first_item = false;
                }
            }
        }
        self.cur.in_class -= 1;
        if segments.iter().all(|s| s.is_empty()) {
            return Err(self.error("Empty character class".to_string(), start));
        }
        let segment_nodes: Vec<Node> = segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|items| {
                if items.len() == 1 {
                    items.into_iter().next().unwrap()
                } else {
                    let pos = items.first().unwrap().pos().span(&items.last().unwrap().pos());
                    Node::Sequence { children: items, pos }
                }
            })
            .collect();
        let expression = segment_nodes
            .into_iter()
            .reduce(|l, r| {
                let pos = l.pos().span(&r.pos());
                Node::ClassOperation { left: Box::new(l), right: Box::new(r), kind: ClassOpKind::Intersection, pos }
            })
            .unwrap();
        Ok(Node::CharClass { expression: Box::new(expression), is_negated: negated, pos: Position::new(start, self.cur.i) })
    }

    fn parse_posix_class(&mut self) -> Result<Node, PatternError> {
        let start = self.cur.i;
        self.cur.advance();
        self.cur.advance();
        let mut name = String::new();
        while !self.cur.rest().starts_with(":]") && !self.cur.is_eof() {
            name.push(self.cur.advance().unwrap());
        }
        if !self.cur.rest().starts_with(":]") {
            return Err(self.error("Unterminated POSIX class".to_string(), start));
        }
        self.cur.advance();
        self.cur.advance();
        Ok(Node::PosixClass { class: name, pos: Position::new(start, self.cur.i) })
    }

    fn parse_class_item(&mut self) -> Result<Node, PatternError> {
        if self.cur.rest().starts_with("\\b") {
            let start = self.cur.i;
            self.cur.advance();
            self.cur.advance();
            return Ok(Node::CharLiteral { code_point: 0x08, original_repr: "\\b".to_string(), kind: CharLiteralKind::Unicode, pos: Position::new(start, self.cur.i) });
        }
        if self.cur.current() == Some('\\') {
            self.parse_escape()
        } else {
            let start = self.cur.i;
            let ch = self.cur.advance().unwrap();
            Ok(Node::Literal { value: ch.to_string(), is_raw: false, pos: Position::new(start, self.cur.i) })
        }
    }

    fn maybe_parse_range(&mut self, item: Node) -> Result<Node, PatternError> {
        if self.cur.current() == Some('-') {
            let after_dash = self.cur.rest()[1..].chars().next();
            if matches!(after_dash, Some(c) if c != ']') {
                self.cur.advance();
                let end_item = self.parse_class_item()?;
                let pos = item.pos().span(&end_item.pos());
                return Ok(Node::Range { start: Box::new(item), end: Box::new(end_item), pos });
            }
        }
        Ok(item)
    }
}

fn is_valid_brace_inner(raw: &str) -> bool {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.is_empty() {
        return false;
    }
    let mut parts = stripped.splitn(2, ',');
    let lo = parts.next().unwrap_or("");
    match parts.next() {
        None => !lo.is_empty() && lo.chars().all(|c| c.is_ascii_digit()),
        Some(hi) => {
            (lo.is_empty() || lo.chars().all(|c| c.is_ascii_digit()))
                && (hi.is_empty() || hi.chars().all(|c| c.is_ascii_digit()))
                && !(lo.is_empty() && hi.is_empty())
        }
    }
}

/// One pass over the raw body counting capturing (named or plain) groups,
/// used only to disambiguate `\N` between a backreference and legacy octal
/// (PCRE's own rule: a numeric escape refers to a capture if and only if
/// that many captures exist in the whole pattern).
fn count_capturing_groups(body: &str) -> u32 {
    let mut count = 0u32;
    let mut class_depth = 0i32;
    let mut escaped = false;
    for (idx, ch) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' if class_depth == 0 => class_depth += 1,
            ']' if class_depth > 0 => class_depth -= 1,
            '(' if class_depth == 0 => {
                let rest = &body[idx..];
                if rest.starts_with("(?") {
                    if (rest.starts_with("(?<") && !rest.starts_with("(?<=") && !rest.starts_with("(?<!"))
                        || rest.starts_with("(?P<")
                        || rest.starts_with("(?'")
                    {
                        count += 1;
                    }
                } else {
                    count += 1;
                }
            }
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Node {
        parse(src).unwrap_or_else(|e| panic!("parse({:?}) failed: {}", src, e))
    }

    #[test]
    fn parses_simple_literal_sequence() {
        let root = parse_ok("/abc/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Sequence { children, .. } => assert_eq!(children.len(), 3),
                other => panic!("expected Sequence, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn parses_flags_after_closing_delimiter() {
        let root = parse_ok("/abc/ism");
        if let Node::Regex { flags, .. } = root {
            assert_eq!(flags, "ism");
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn s1_invalid_quantifier_range_parses_with_raw_repr() {
        let root = parse_ok("/a{5,2}/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Quantifier { repr, .. } => assert_eq!(repr, "{5,2}"),
                other => panic!("expected Quantifier, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn s2_numeric_escape_beyond_group_count_is_backref() {
        let root = parse_ok("/(a)(b)\\3/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Sequence { children, .. } => match children.last().unwrap() {
                    Node::Backref { reference, .. } => assert_eq!(reference, "3"),
                    other => panic!("expected Backref, got {:?}", other),
                },
                other => panic!("expected Sequence, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn alternation_builds_two_branches() {
        let root = parse_ok("/a|b/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Alternation { alternatives, .. } => assert_eq!(alternatives.len(), 2),
                other => panic!("expected Alternation, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn named_group_is_parsed() {
        let root = parse_ok("/(?<word>abc)/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Group { kind, name, .. } => {
                    assert_eq!(kind, GroupKind::Named);
                    assert_eq!(name, Some("word".to_string()));
                }
                other => panic!("expected Group, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn char_class_negation_and_range() {
        let root = parse_ok("/[^a-z]/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::CharClass { is_negated, expression, .. } => {
                    assert!(is_negated);
                    assert!(matches!(*expression, Node::Range { .. }));
                }
                other => panic!("expected CharClass, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn posix_class_is_recognized() {
        let root = parse_ok("/[[:alpha:]]/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::CharClass { expression, .. } => {
                    assert!(matches!(*expression, Node::PosixClass { .. }));
                }
                other => panic!("expected CharClass, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn bare_inline_flags_scope_to_rest_of_sequence() {
        let root = parse_ok("/a(?i)bc/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Sequence { children, .. } => {
                    assert_eq!(children.len(), 2);
                    assert!(matches!(children[1], Node::Group { kind: GroupKind::InlineFlags, .. }));
                }
                other => panic!("expected Sequence, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn scoped_inline_flags_wrap_only_their_group() {
        let root = parse_ok("/(?i:abc)d/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Sequence { children, .. } => {
                    assert!(matches!(children[0], Node::Group { kind: GroupKind::InlineFlags, .. }));
                }
                other => panic!("expected Sequence, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn conditional_with_backref_condition() {
        let root = parse_ok("/(a)(?(1)b|c)/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Sequence { children, .. } => match &children[1] {
                    Node::Conditional { condition, .. } => {
                        assert!(matches!(**condition, Node::Backref { .. }));
                    }
                    other => panic!("expected Conditional, got {:?}", other),
                },
                other => panic!("expected Sequence, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn comment_group_is_zero_width_marker() {
        let root = parse_ok("/a(?#note)b/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Sequence { children, .. } => {
                    assert!(matches!(children[1], Node::Comment { .. }));
                }
                other => panic!("expected Sequence, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn callout_parses_numeric_identifier() {
        let root = parse_ok("/a(?C3)b/");
        if let Node::Regex { pattern, .. } = root {
            match *pattern {
                Node::Sequence { children, .. } => {
                    assert!(matches!(children[1], Node::Callout { identifier: CalloutId::Numeric(3), .. }));
                }
                other => panic!("expected Sequence, got {:?}", other),
            }
        } else {
            panic!("expected Regex root");
        }
    }

    #[test]
    fn unterminated_group_is_an_error() {
        assert!(parse("/(abc/").is_err());
    }

    #[test]
    fn empty_character_class_is_an_error() {
        assert!(parse("/[]/").is_err());
    }
}
