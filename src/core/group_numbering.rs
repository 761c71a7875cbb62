//! Group numbering pre-pass.
//!
//! Walks the tree once, in source order, assigning capture numbers to every
//! capturing and named group. The validator and the linter both consume the
//! resulting `GroupNumbering` rather than repeating the walk.

use crate::core::nodes::{GroupKind, Node};
use crate::core::visit::Visitor;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNumbering {
    pub max_group_number: u32,
    pub named_groups: HashMap<String, Vec<u32>>,
    pub capture_sequence: Vec<u32>,
}

impl GroupNumbering {
    pub fn resolve_name(&self, name: &str) -> Option<&[u32]> {
        self.named_groups.get(name).map(Vec::as_slice)
    }

    /// Resolve a relative reference (`\g{+k}` / `\g{-k}`, `(?+k)` / `(?-k)`)
    /// against `capture_sequence` as of the given 0-based encounter index
    /// `current_index` (the count of captures already encountered at the
    /// reference site).
    pub fn resolve_relative(&self, current_index: usize, offset: i64) -> Option<u32> {
        let target = current_index as i64 + offset;
        if target < 0 {
            return None;
        }
        self.capture_sequence.get(target as usize).copied()
    }
}

struct GroupNumberingVisitor {
    counter: u32,
    named_groups: HashMap<String, Vec<u32>>,
    capture_sequence: Vec<u32>,
}

impl Visitor for GroupNumberingVisitor {
    type Output = ();

    fn neutral(&self) -> Self::Output {}

    fn visit_regex(&mut self, node: &Node) -> Self::Output {
        if let Node::Regex { pattern, .. } = node {
            self.visit(pattern);
        }
    }

    fn visit_sequence(&mut self, node: &Node) -> Self::Output {
        if let Node::Sequence { children, .. } = node {
            for child in children {
                self.visit(child);
            }
        }
    }

    fn visit_alternation(&mut self, node: &Node) -> Self::Output {
        if let Node::Alternation { alternatives, .. } = node {
            for alt in alternatives {
                self.visit(alt);
            }
        }
    }

    fn visit_group(&mut self, node: &Node) -> Self::Output {
        if let Node::Group { child, kind, name, .. } = node {
            if matches!(kind, GroupKind::BranchReset) {
                self.visit_branch_reset(child);
                return;
            }
            if kind.is_capturing() {
                self.counter += 1;
                let number = self.counter;
                self.capture_sequence.push(number);
                if let Some(n) = name {
                    self.named_groups.entry(n.clone()).or_default().push(number);
                }
            }
            self.visit(child);
        }
    }

    fn visit_quantifier(&mut self, node: &Node) -> Self::Output {
        if let Node::Quantifier { child, .. } = node {
            self.visit(child);
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

impl GroupNumberingVisitor {
    /// Branch-reset groups: every alternative renumbers from the same
    /// starting counter, so named slots within a branch-reset may alias
    /// numbers across branches. After all alternatives are visited, the
    /// counter advances past whichever alternative used the most numbers,
    /// so a group following the branch-reset does not collide with any of
    /// them.
    fn visit_branch_reset(&mut self, child: &Node) {
        let start = self.counter;
        let mut max_reached = start;
        let alternatives: Vec<&Node> = match child {
            Node::Alternation { alternatives, .. } => alternatives.iter().collect(),
            other => vec![other],
        };
        for alt in alternatives {
            self.counter = start;
            self.visit(alt);
            max_reached = max_reached.max(self.counter);
        }
        self.counter = max_reached;
    }
}

/// Run the group-numbering pre-pass over a parsed root.
pub fn number_groups(root: &Node) -> GroupNumbering {
    let mut visitor = GroupNumberingVisitor {
        counter: 0,
        named_groups: HashMap::new(),
        capture_sequence: Vec::new(),
    };
    visitor.visit(root);
    GroupNumbering {
        max_group_number: visitor.counter,
        named_groups: visitor.named_groups,
        capture_sequence: visitor.capture_sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::Position;

    fn capturing(child: Node, name: Option<&str>) -> Node {
        Node::Group {
            child: Box::new(child),
            kind: if name.is_some() { GroupKind::Named } else { GroupKind::Capturing },
            name: name.map(str::to_string),
            local_flags: None,
            pos: Position::zero(),
        }
    }

    fn lit(s: &str) -> Node {
        Node::Literal { value: s.into(), is_raw: false, pos: Position::zero() }
    }

    #[test]
    fn sequential_capturing_groups_number_in_order() {
        let root = Node::Sequence {
            children: vec![capturing(lit("a"), None), capturing(lit("b"), None)],
            pos: Position::zero(),
        };
        let numbering = number_groups(&root);
        assert_eq!(numbering.max_group_number, 2);
        assert_eq!(numbering.capture_sequence, vec![1, 2]);
    }

    #[test]
    fn named_group_is_recorded() {
        let root = capturing(lit("a"), Some("word"));
        let numbering = number_groups(&root);
        assert_eq!(numbering.named_groups.get("word"), Some(&vec![1]));
    }

    #[test]
    fn branch_reset_aliases_numbers_across_alternatives() {
        // (?|(a)|(b)(c))
        let branch = Node::Group {
            child: Box::new(Node::Alternation {
                alternatives: vec![
                    capturing(lit("a"), None),
                    Node::Sequence {
                        children: vec![capturing(lit("b"), None), capturing(lit("c"), None)],
                        pos: Position::zero(),
                    },
                ],
                pos: Position::zero(),
            }),
            kind: GroupKind::BranchReset,
            name: None,
            local_flags: None,
            pos: Position::zero(),
        };
        let numbering = number_groups(&branch);
        // First alternative uses group 1; second alternative reuses group 1
        // then introduces group 2. The branch-reset as a whole leaves behind
        // max_group_number = 2, not 3.
        assert_eq!(numbering.max_group_number, 2);
        assert_eq!(numbering.capture_sequence, vec![1, 1, 2]);
    }

    #[test]
    fn group_after_branch_reset_does_not_collide() {
        let branch = Node::Group {
            child: Box::new(Node::Alternation {
                alternatives: vec![
                    capturing(lit("a"), None),
                    Node::Sequence {
                        children: vec![capturing(lit("b"), None), capturing(lit("c"), None)],
                        pos: Position::zero(),
                    },
                ],
                pos: Position::zero(),
            }),
            kind: GroupKind::BranchReset,
            name: None,
            local_flags: None,
            pos: Position::zero(),
        };
        let root = Node::Sequence {
            children: vec![branch, capturing(lit("d"), None)],
            pos: Position::zero(),
        };
        let numbering = number_groups(&root);
        assert_eq!(numbering.max_group_number, 3);
    }
}
