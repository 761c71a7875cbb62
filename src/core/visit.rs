//! Traversal protocol shared by every analysis.
//!
//! Every analysis is a visitor over `Node` producing a result of some type
//! `Output`. There is one `visit_*` entry point per node variant; a default
//! implementation returns the analysis's neutral value, so a concrete
//! analysis overrides only the variants it cares about. Recursion into
//! children is the overriding method's own responsibility (not a generic
//! walker's) because several analyses need to interleave state updates
//! between children — see `ValidatorVisitor`'s `previous_node`/`next_node`
//! bookkeeping and `RedosVisitor`'s depth counters for why a walker that
//! recursed on their behalf would not work.
//!
//! Traversal order is pre-order, left-to-right: a conforming `visit_*`
//! override visits itself (or records state) before recursing into its
//! children, and visits children in source order.

use crate::core::nodes::Node;

/// A tree-walking analysis over the AST, parameterized by its result type.
///
/// `visit` dispatches to the matching `visit_*` method; it performs no
/// recursion itself. Override `visit_*` methods to recurse explicitly via
/// `self.visit(child)`.
pub trait Visitor {
    type Output;

    /// The neutral value returned by any `visit_*` method this analysis
    /// does not override (e.g. `Ok(())` for the validator, `Severity::Safe`
    /// for the profiler, `()` for the linter).
    fn neutral(&self) -> Self::Output;

    fn visit(&mut self, node: &Node) -> Self::Output {
        match node {
            Node::Regex { .. } => self.visit_regex(node),
            Node::Sequence { .. } => self.visit_sequence(node),
            Node::Alternation { .. } => self.visit_alternation(node),
            Node::Group { .. } => self.visit_group(node),
            Node::Quantifier { .. } => self.visit_quantifier(node),
            Node::Literal { .. } => self.visit_literal(node),
            Node::CharLiteral { .. } => self.visit_char_literal(node),
            Node::CharType { .. } => self.visit_char_type(node),
            Node::Dot { .. } => self.visit_dot(node),
            Node::Anchor { .. } => self.visit_anchor(node),
            Node::Assertion { .. } => self.visit_assertion(node),
            Node::Keep { .. } => self.visit_keep(node),
            Node::ControlChar { .. } => self.visit_control_char(node),
            Node::CharClass { .. } => self.visit_char_class(node),
            Node::Range { .. } => self.visit_range(node),
            Node::ClassOperation { .. } => self.visit_class_operation(node),
            Node::Backref { .. } => self.visit_backref(node),
            Node::Subroutine { .. } => self.visit_subroutine(node),
            Node::Conditional { .. } => self.visit_conditional(node),
            Node::PcreVerb { .. } => self.visit_pcre_verb(node),
            Node::LimitMatch { .. } => self.visit_limit_match(node),
            Node::Callout { .. } => self.visit_callout(node),
            Node::Unicode { .. } => self.visit_unicode(node),
            Node::UnicodeProp { .. } => self.visit_unicode_prop(node),
            Node::UnicodeNamed { .. } => self.visit_unicode_named(node),
            Node::Define { .. } => self.visit_define(node),
            Node::Comment { .. } => self.visit_comment(node),
            Node::ScriptRun { .. } => self.visit_script_run(node),
            Node::VersionCondition { .. } => self.visit_version_condition(node),
            Node::PosixClass { .. } => self.visit_posix_class(node),
        }
    }

    fn visit_regex(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_sequence(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_alternation(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_group(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_quantifier(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_literal(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_char_literal(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_char_type(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_dot(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_anchor(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_assertion(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_keep(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_control_char(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_char_class(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_range(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_class_operation(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_backref(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_subroutine(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_conditional(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_pcre_verb(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_limit_match(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_callout(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_unicode(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_unicode_prop(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_unicode_named(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_define(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_comment(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_script_run(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_version_condition(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
    fn visit_posix_class(&mut self, _node: &Node) -> Self::Output {
        self.neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::*;

    /// A trivial counting visitor used only to exercise the dispatch table:
    /// every variant should reach its matching `visit_*` method exactly once.
    struct CountLiterals {
        count: usize,
    }

    impl Visitor for CountLiterals {
        type Output = ();

        fn neutral(&self) -> Self::Output {}

        fn visit_literal(&mut self, _node: &Node) -> Self::Output {
            self.count += 1;
        }

        fn visit_sequence(&mut self, node: &Node) -> Self::Output {
            if let Node::Sequence { children, .. } = node {
                for child in children {
                    self.visit(child);
                }
            }
        }
    }

    #[test]
    fn dispatch_reaches_overridden_method() {
        let seq = Node::Sequence {
            children: vec![
                Node::Literal {
                    value: "a".into(),
                    is_raw: false,
                    pos: Position::zero(),
                },
                Node::Dot { pos: Position::zero() },
                Node::Literal {
                    value: "b".into(),
                    is_raw: false,
                    pos: Position::zero(),
                },
            ],
            pos: Position::zero(),
        };
        let mut visitor = CountLiterals { count: 0 };
        visitor.visit(&seq);
        assert_eq!(visitor.count, 2);
    }

    #[test]
    fn unoverridden_variant_returns_neutral() {
        let mut visitor = CountLiterals { count: 0 };
        let dot = Node::Dot { pos: Position::zero() };
        visitor.visit(&dot);
        assert_eq!(visitor.count, 0);
    }
}
