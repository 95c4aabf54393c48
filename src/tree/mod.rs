//! Expression tree stored as an arena of nodes
//!
//! Nodes live in one growable vector owned by the tree. Parent, children
//! and root are indices into that vector, so a tree can be cloned, moved
//! and serialized without shared references. The root is always node 0.

use crate::predicate::PredicateSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean operator of a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn sql(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Index of a node inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }

    pub fn is_root(self) -> bool {
        self == NodeId::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One logical group: an operator, its predicates and its child groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionNode {
    operator: LogicalOperator,
    predicates: PredicateSet,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ExpressionNode {
    fn new(operator: LogicalOperator, parent: Option<NodeId>) -> Self {
        Self {
            operator,
            predicates: PredicateSet::new(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of expression nodes rooted at node 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionTree {
    nodes: Vec<ExpressionNode>,
}

impl Default for ExpressionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionTree {
    /// Create a tree holding only an AND root
    pub fn new() -> Self {
        Self {
            nodes: vec![ExpressionNode::new(LogicalOperator::And, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, id: NodeId) -> Option<&ExpressionNode> {
        self.nodes.get(id.0)
    }

    /// Node lookup for ids handed out by this tree
    pub(crate) fn node(&self, id: NodeId) -> &ExpressionNode {
        &self.nodes[id.0]
    }

    pub(crate) fn predicates_mut(&mut self, id: NodeId) -> &mut PredicateSet {
        &mut self.nodes[id.0].predicates
    }

    /// Nodes in construction order, root first
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ExpressionNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Append a child group under `parent` and return its id
    pub(crate) fn add_child(&mut self, parent: NodeId, operator: LogicalOperator) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ExpressionNode::new(operator, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Deep-copy the subtree at `source_id` of `source` under `parent`
    pub(crate) fn graft(&mut self, parent: NodeId, source: &ExpressionTree, source_id: NodeId) -> NodeId {
        let top = NodeId(self.nodes.len());
        let mut stack = vec![(source_id, parent)];
        while let Some((from, into)) = stack.pop() {
            let source_node = source.node(from);
            let id = self.add_child(into, source_node.operator);
            self.nodes[id.0].predicates = source_node.predicates.clone();
            stack.extend(source_node.children.iter().rev().map(|c| (*c, id)));
        }
        top
    }

    /// Replace the root's predicates
    pub(crate) fn set_root_predicates(&mut self, predicates: PredicateSet) {
        self.nodes[0].predicates = predicates;
    }

    /// Number of ancestors between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Depth-first pre-order walk starting at the root
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// True when no node carries any filter
    pub fn has_no_filters(&self) -> bool {
        self.nodes.iter().all(|n| n.predicates.is_empty())
    }

    /// True when the subtree at `id` carries at least one filter
    pub fn subtree_has_filters(&self, id: NodeId) -> bool {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = self.node(next);
            if !node.predicates.is_empty() {
                return true;
            }
            stack.extend(node.children.iter().copied());
        }
        false
    }
}
