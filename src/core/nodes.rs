//! PCRE AST Node Definitions
//!
//! This module defines the complete set of Abstract Syntax Tree (AST) node
//! variants that represent a parsed PCRE-style regular expression. The AST is
//! produced by the parser and consumed, read-only, by every analysis in this
//! crate: the validator, the linter, the optimizer, and the ReDoS profiler.
//!
//! Nodes are designed to:
//!   - Carry enough source position information to report precise diagnostics
//!   - Be trivially serializable (for LSP diagnostics and debugging dumps)
//!   - Form a strict tree: every non-root node has exactly one parent
//!
//! The optimizer is the only analysis that produces new nodes; every other
//! analysis treats the tree as immutable.

use serde::{Deserialize, Serialize};

/// A half-open byte-offset span `[start, end)` into the original pattern
/// source (the text between the delimiters, not including flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

impl Position {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width position, used for synthetic nodes that inherit the span
    /// of their enclosing construct but have no independent extent.
    pub fn zero() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn span(&self, other: &Position) -> Position {
        Position::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// The kind of group a `Group` node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Capturing,
    Named,
    NonCapturing,
    Atomic,
    LookaheadPos,
    LookaheadNeg,
    LookbehindPos,
    LookbehindNeg,
    BranchReset,
    InlineFlags,
}

impl GroupKind {
    pub fn is_lookaround(&self) -> bool {
        matches!(
            self,
            GroupKind::LookaheadPos
                | GroupKind::LookaheadNeg
                | GroupKind::LookbehindPos
                | GroupKind::LookbehindNeg
        )
    }

    pub fn is_lookbehind(&self) -> bool {
        matches!(self, GroupKind::LookbehindPos | GroupKind::LookbehindNeg)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, GroupKind::Capturing | GroupKind::Named)
    }
}

/// Greediness mode of a `Quantifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Greediness {
    Greedy,
    Lazy,
    Possessive,
}

/// The syntactic origin of a single resolved character (`CharLiteral`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharLiteralKind {
    Unicode,
    Octal,
    OctalLegacy,
    UnicodeNamed,
}

/// The operator joining two character-class subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassOpKind {
    Intersection,
    Subtraction,
}

/// A callout identifier: `(?C3)` is numeric, `(?C"tag")` is a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CalloutId {
    Numeric(i64),
    Str(String),
}

/// Every AST node variant a pattern can parse into, tagged by `type` for
/// serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Regex {
        pattern: Box<Node>,
        flags: String,
        delimiter: char,
        pos: Position,
    },
    Sequence {
        children: Vec<Node>,
        pos: Position,
    },
    Alternation {
        alternatives: Vec<Node>,
        pos: Position,
    },
    Group {
        child: Box<Node>,
        kind: GroupKind,
        name: Option<String>,
        local_flags: Option<String>,
        pos: Position,
    },
    Quantifier {
        child: Box<Node>,
        repr: String,
        greediness: Greediness,
        pos: Position,
    },
    Literal {
        value: String,
        is_raw: bool,
        pos: Position,
    },
    CharLiteral {
        code_point: i32,
        original_repr: String,
        kind: CharLiteralKind,
        pos: Position,
    },
    CharType {
        value: char,
        pos: Position,
    },
    Dot {
        pos: Position,
    },
    Anchor {
        value: String,
        pos: Position,
    },
    Assertion {
        value: char,
        pos: Position,
    },
    Keep {
        pos: Position,
    },
    ControlChar {
        ch: char,
        code_point: i32,
        pos: Position,
    },
    CharClass {
        expression: Box<Node>,
        is_negated: bool,
        pos: Position,
    },
    Range {
        start: Box<Node>,
        end: Box<Node>,
        pos: Position,
    },
    ClassOperation {
        left: Box<Node>,
        right: Box<Node>,
        kind: ClassOpKind,
        pos: Position,
    },
    Backref {
        reference: String,
        pos: Position,
    },
    Subroutine {
        reference: String,
        pos: Position,
    },
    Conditional {
        condition: Box<Node>,
        yes: Box<Node>,
        no: Box<Node>,
        pos: Position,
    },
    PcreVerb {
        verb: String,
        pos: Position,
    },
    LimitMatch {
        limit: i64,
        pos: Position,
    },
    Callout {
        identifier: CalloutId,
        pos: Position,
    },
    Unicode {
        code: String,
        pos: Position,
    },
    UnicodeProp {
        /// Includes a leading `^` when the property is negated (`\P{..}` or
        /// `\p{^..}`).
        prop: String,
        pos: Position,
    },
    UnicodeNamed {
        name: String,
        pos: Position,
    },
    Define {
        content: Box<Node>,
        pos: Position,
    },
    Comment {
        text: String,
        pos: Position,
    },
    ScriptRun {
        script: String,
        pos: Position,
    },
    VersionCondition {
        version: String,
        pos: Position,
    },
    PosixClass {
        class: String,
        pos: Position,
    },
}

impl Node {
    pub fn pos(&self) -> Position {
        match self {
            Node::Regex { pos, .. }
            | Node::Sequence { pos, .. }
            | Node::Alternation { pos, .. }
            | Node::Group { pos, .. }
            | Node::Quantifier { pos, .. }
            | Node::Literal { pos, .. }
            | Node::CharLiteral { pos, .. }
            | Node::CharType { pos, .. }
            | Node::Dot { pos }
            | Node::Anchor { pos, .. }
            | Node::Assertion { pos, .. }
            | Node::Keep { pos }
            | Node::ControlChar { pos, .. }
            | Node::CharClass { pos, .. }
            | Node::Range { pos, .. }
            | Node::ClassOperation { pos, .. }
            | Node::Backref { pos, .. }
            | Node::Subroutine { pos, .. }
            | Node::Conditional { pos, .. }
            | Node::PcreVerb { pos, .. }
            | Node::LimitMatch { pos, .. }
            | Node::Callout { pos, .. }
            | Node::Unicode { pos, .. }
            | Node::UnicodeProp { pos, .. }
            | Node::UnicodeNamed { pos, .. }
            | Node::Define { pos, .. }
            | Node::Comment { pos, .. }
            | Node::ScriptRun { pos, .. }
            | Node::VersionCondition { pos, .. }
            | Node::PosixClass { pos, .. } => *pos,
        }
    }

    /// True for nodes that are zero-width: they never advance the match
    /// position and contribute no characters to `firstChars`/`lastChars`.
    pub fn is_zero_width(&self) -> bool {
        matches!(
            self,
            Node::Anchor { .. }
                | Node::Assertion { .. }
                | Node::Keep { .. }
                | Node::Comment { .. }
                | Node::Callout { .. }
                | Node::ScriptRun { .. }
                | Node::Define { .. }
                | Node::LimitMatch { .. }
                | Node::PcreVerb { .. }
                | Node::VersionCondition { .. }
        ) || matches!(self, Node::Group { kind, .. } if kind.is_lookaround())
    }

    /// A single literal character, used when validating `Range` endpoints.
    pub fn as_single_char(&self) -> Option<i32> {
        match self {
            Node::Literal { value, .. } => {
                let mut chars = value.chars();
                let first = chars.next()?;
                if chars.next().is_some() {
                    None
                } else {
                    Some(first as i32)
                }
            }
            Node::CharLiteral { code_point, .. } => Some(*code_point),
            Node::ControlChar { code_point, .. } => Some(*code_point),
            Node::Unicode { code, .. } => i32::from_str_radix(code, 16).ok(),
            _ => None,
        }
    }
}

/// Build a synthetic node's position from its enclosing construct: a node
/// introduced by an analysis rather than by the parser inherits the span of
/// whatever it's standing in for.
pub fn inherited_pos(enclosing: &Node) -> Position {
    enclosing.pos()
}
