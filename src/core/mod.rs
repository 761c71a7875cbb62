//! Core module: the AST, the traversal protocol, and every analysis built
//! on top of it.
//!
//! - AST node definitions (`nodes`) and the PCRE parser that produces them
//!   (`parser`)
//! - The shared traversal protocol (`visit`)
//! - Pattern modifier flags (`flags`) and group numbering (`group_numbering`)
//! - Supporting analyses: character-set reasoning (`charset`), length-range
//!   reasoning (`length_range`), and the process-wide caches they share
//!   (`cache`)
//! - The three top-level analyses: the semantic validator (`validator`),
//!   the style linter (`linter`), and the ReDoS profiler (`redos`), plus
//!   the optimizer (`optimizer`)
//! - Diagnostic types (`errors`) and their instructional hints (`hint_engine`)

pub mod cache;
pub mod charset;
pub mod errors;
pub mod flags;
pub mod group_numbering;
pub mod hint_engine;
pub mod length_range;
pub mod linter;
pub mod nodes;
pub mod optimizer;
pub mod parser;
pub mod redos;
pub mod validator;
pub mod visit;
