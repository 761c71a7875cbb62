//! A static-analysis toolkit for PCRE-style regular expressions.
//!
//! Parses a pattern into an AST (`core::nodes`), then runs one or more
//! independent analyses over it:
//!
//! - [`validate`] — semantic correctness (dangling backreferences, invalid
//!   quantifier bounds, unknown Unicode properties, ...)
//! - [`lint`] — style and likely-mistake diagnostics
//! - [`optimize`] — semantics-preserving tree rewrites
//! - [`profile_redos`] — catastrophic-backtracking risk assessment
//!
//! None of these analyses execute the pattern; they only reason about its
//! structure.

pub mod core;

pub use core::cache;
pub use core::charset::CharSet;
pub use core::errors::{LintIssue, PatternError, ReDoSReport, SemanticError, Severity};
pub use core::flags::PatternFlags;
pub use core::group_numbering::GroupNumbering;
pub use core::linter::lint;
pub use core::nodes::{
    CalloutId, CharLiteralKind, ClassOpKind, Greediness, GroupKind, Node, Position,
};
pub use core::optimizer::{optimize, optimize_with_config, OptimizerConfig};
pub use core::parser::parse;
pub use core::redos::profile_redos;
pub use core::validator::{validate, validate_with_config, ValidatorConfig};
