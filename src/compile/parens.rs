//! Closing-parenthesis plan for a flattened expression tree

use crate::error::{CriteriaError, Result};
use crate::tree::{ExpressionTree, NodeId};
use serde::{Deserialize, Serialize};

/// What to emit after a group's own fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "lowercase")]
pub enum Closing {
    /// The group stays open for its children
    None,
    /// Close this many groups
    Parens(usize),
}

impl Closing {
    pub fn count(self) -> usize {
        match self {
            Closing::None => 0,
            Closing::Parens(n) => n,
        }
    }

    fn bump(&mut self) {
        *self = Closing::Parens(self.count() + 1);
    }
}

/// Flatten the non-root groups in pre-order and plan their closings
///
/// Every group opens exactly once. Leaving a group adds one closing to the
/// last emitted slot, so a leaf closes itself plus every ancestor group it
/// is the last descendant of. The root is never parenthesized.
pub fn compile_closings(tree: &ExpressionTree) -> Result<(Vec<NodeId>, Vec<Closing>)> {
    let mut groups = Vec::with_capacity(tree.len().saturating_sub(1));
    let mut closings: Vec<Closing> = Vec::with_capacity(tree.len().saturating_sub(1));
    let mut visited = vec![false; tree.len()];

    let mut stack: Vec<Step> = tree
        .node(NodeId::ROOT)
        .children()
        .iter()
        .rev()
        .map(|c| Step::Enter(*c))
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                if visited[id.index()] {
                    continue;
                }
                visited[id.index()] = true;

                let node = tree.node(id);
                if node.is_leaf() && node.predicates().is_empty() {
                    return Err(CriteriaError::EmptyGroup);
                }

                groups.push(id);
                closings.push(Closing::None);
                stack.push(Step::Leave);
                stack.extend(node.children().iter().rev().map(|c| Step::Enter(*c)));
            }
            Step::Leave => {
                if let Some(last) = closings.last_mut() {
                    last.bump();
                }
            }
        }
    }
    Ok((groups, closings))
}

enum Step {
    Enter(NodeId),
    Leave,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Dimension, Term};
    use crate::tree::LogicalOperator;

    fn leaf(tree: &mut ExpressionTree, parent: NodeId, op: LogicalOperator) -> NodeId {
        let id = tree.add_child(parent, op);
        tree.predicates_mut(id)
            .set_term(Dimension::Name, Term::Text("x".into()), op);
        id
    }

    #[test]
    fn test_root_only_has_no_groups() {
        let (groups, closings) = compile_closings(&ExpressionTree::new()).unwrap();
        assert!(groups.is_empty());
        assert!(closings.is_empty());
    }

    #[test]
    fn test_nested_groups() {
        // root AND( A, OR( B, C ) )
        let mut tree = ExpressionTree::new();
        let a = leaf(&mut tree, NodeId::ROOT, LogicalOperator::Or);
        let g = tree.add_child(NodeId::ROOT, LogicalOperator::Or);
        let b = leaf(&mut tree, g, LogicalOperator::And);
        let c = leaf(&mut tree, g, LogicalOperator::And);

        let (groups, closings) = compile_closings(&tree).unwrap();
        assert_eq!(groups, vec![a, g, b, c]);
        assert_eq!(
            closings,
            vec![
                Closing::Parens(1),
                Closing::None,
                Closing::Parens(1),
                Closing::Parens(2)
            ]
        );
    }

    #[test]
    fn test_deep_chain_closes_at_leaf() {
        let mut tree = ExpressionTree::new();
        let a = tree.add_child(NodeId::ROOT, LogicalOperator::Or);
        let b = tree.add_child(a, LogicalOperator::And);
        leaf(&mut tree, b, LogicalOperator::Or);

        let (_, closings) = compile_closings(&tree).unwrap();
        assert_eq!(closings, vec![Closing::None, Closing::None, Closing::Parens(3)]);
    }

    #[test]
    fn test_very_deep_chain() {
        let mut tree = ExpressionTree::new();
        let mut parent = NodeId::ROOT;
        for _ in 0..20_000 {
            parent = tree.add_child(parent, LogicalOperator::Or);
        }
        leaf(&mut tree, parent, LogicalOperator::Or);

        let (groups, closings) = compile_closings(&tree).unwrap();
        assert_eq!(groups.len(), 20_001);
        assert_eq!(closings.last(), Some(&Closing::Parens(20_001)));
    }

    #[test]
    fn test_empty_leaf_group_rejected() {
        let mut tree = ExpressionTree::new();
        leaf(&mut tree, NodeId::ROOT, LogicalOperator::Or);
        let g = tree.add_child(NodeId::ROOT, LogicalOperator::And);
        tree.add_child(g, LogicalOperator::Or);
        assert_eq!(compile_closings(&tree), Err(CriteriaError::EmptyGroup));
    }
}
