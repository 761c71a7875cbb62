//! Diagnostic types shared by the validator, the linter, and the ReDoS
//! profiler, plus the parse-time error of the external-collaborator parser.
//!
//! `SemanticError` and `LintIssue` both carry a stable, dot-separated `code`
//! so that downstream tooling and tests can pattern-match on diagnostic
//! identity across versions without parsing the message text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::hint_engine::hint_for;
use crate::core::nodes::Position;

/// A fatal, structural error raised by the semantic validator.
///
/// Unlike `LintIssue`, a `SemanticError` means the pattern is not well
/// formed: validation stops and surfaces the first one found, with no
/// recovery or continuation past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code} at byte {}: {message}", self.position.start)]
pub struct SemanticError {
    /// Stable, dot-separated identifier, e.g. `regex.quantifier.invalid_range`.
    pub code: String,
    pub message: String,
    pub position: Position,
    pub hint: Option<String>,
    pub pattern_snippet: Option<String>,
}

impl SemanticError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, position: Position) -> Self {
        let code = code.into();
        let hint = hint_for(&code).map(str::to_string);
        Self {
            code,
            message: message.into(),
            position,
            hint,
            pattern_snippet: None,
        }
    }

    pub fn with_snippet(mut self, source: &str) -> Self {
        let start = self.position.start.min(source.len());
        let end = self.position.end.clamp(start, source.len());
        self.pattern_snippet = Some(source[start..end].to_string());
        self
    }

    /// The one-line `Display` form with the instructional hint appended.
    pub fn to_formatted_string(&self) -> String {
        match &self.hint {
            Some(hint) => format!("{}\nHint: {}", self, hint),
            None => self.to_string(),
        }
    }
}

/// A non-fatal diagnostic produced by the style linter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintIssue {
    pub code: String,
    pub message: String,
    pub position: Option<Position>,
    pub hint: Option<String>,
}

impl LintIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let hint = hint_for(&code).map(str::to_string);
        Self {
            code,
            message: message.into(),
            position: None,
            hint,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// Severity assigned by the ReDoS profiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Safe,
    Low,
    Unknown,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Safe
    }
}

/// Output of the ReDoS profiler: a severity, a set of recommendations, and
/// (when available) the fragment of the pattern responsible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReDoSReport {
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub vulnerable_fragment: Option<String>,
}

impl ReDoSReport {
    pub fn safe() -> Self {
        Self::default()
    }

    /// Merge another report's findings in, keeping the higher severity and
    /// the union of recommendations.
    pub fn absorb(&mut self, other: ReDoSReport) {
        if other.severity > self.severity {
            self.severity = other.severity;
            if other.vulnerable_fragment.is_some() {
                self.vulnerable_fragment = other.vulnerable_fragment.clone();
            }
        }
        for rec in other.recommendations {
            if !self.recommendations.contains(&rec) {
                self.recommendations.push(rec);
            }
        }
    }

    pub fn raise(&mut self, severity: Severity, recommendation: impl Into<String>) {
        if severity > self.severity {
            self.severity = severity;
        }
        let rec = recommendation.into();
        if !self.recommendations.contains(&rec) {
            self.recommendations.push(rec);
        }
    }
}

/// Rich parse error with position tracking and instructional hints, raised
/// by the parser that turns source text into an AST.
///
/// Carries a message, a byte position, the source text, and an optional
/// hint, with a caret-pointing `Display` impl and an LSP diagnostic bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternError {
    pub message: String,
    pub pos: usize,
    pub text: String,
    pub hint: Option<String>,
}

impl PatternError {
    pub fn new(message: String, pos: usize, text: String, hint: Option<String>) -> Self {
        PatternError {
            message,
            pos,
            text,
            hint,
        }
    }

    fn format_error(&self) -> String {
        let caret_line = " ".repeat(self.pos.min(self.text.len()));
        let mut parts = vec![
            format!("Pattern error: {}", self.message),
            String::new(),
            format!("> {}", self.text),
            format!(">  {}^", caret_line),
        ];
        if let Some(ref hint) = self.hint {
            parts.push(String::new());
            parts.push(format!("Hint: {}", hint));
        }
        parts.join("\n")
    }

    pub fn to_formatted_string(&self) -> String {
        self.format_error()
    }

    pub fn to_lsp_diagnostic(&self) -> serde_json::Value {
        let mut message = self.message.clone();
        if let Some(ref hint) = self.hint {
            message.push_str(&format!("\n\nHint: {}", hint));
        }
        serde_json::json!({
            "range": {
                "start": {"line": 0, "character": self.pos},
                "end": {"line": 0, "character": self.pos + 1}
            },
            "severity": 1,
            "message": message,
            "source": "pcre_audit",
        })
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_error())
    }
}

impl std::error::Error for PatternError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_error_picks_up_hint() {
        let err = SemanticError::new(
            "regex.quantifier.invalid_range",
            "min exceeds max",
            Position::new(1, 5),
        );
        assert!(err.hint.is_some());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low > Severity::Safe);
    }

    #[test]
    fn redos_report_absorb_keeps_max_severity() {
        let mut report = ReDoSReport::safe();
        report.raise(Severity::Low, "a");
        let mut other = ReDoSReport::safe();
        other.raise(Severity::Critical, "b");
        report.absorb(other);
        assert_eq!(report.severity, Severity::Critical);
        assert_eq!(report.recommendations.len(), 2);
    }

    #[test]
    fn pattern_error_formats_with_caret() {
        let err = PatternError::new("Unterminated group".into(), 3, "(abc".into(), None);
        let formatted = err.to_formatted_string();
        assert!(formatted.contains('^'));
    }
}
