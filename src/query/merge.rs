//! Combining two queries with `extend`

use crate::error::{CriteriaError, Result};
use crate::predicate::{Dimension, Flag, PredicateSet};
use crate::query::TaskQuery;
use crate::tree::{ExpressionTree, NodeId};
use crate::validate;
use ahash::AHashSet;

impl TaskQuery {
    /// Build a new query from `self` overridden by `extending`
    ///
    /// Neither operand is modified. Root predicates are merged dimension by
    /// dimension with `extending` winning wherever it sets a value or an
    /// expression; flags are the union of both roots. Child groups of both
    /// queries are copied under the merged root, base groups first.
    pub fn extend(&self, extending: &TaskQuery) -> Result<TaskQuery> {
        if !self.is_at_root() || !extending.is_at_root() {
            return Err(CriteriaError::Structural(
                "both queries must be at their root group to be merged".to_string(),
            ));
        }

        let base_root = self.tree.node(NodeId::ROOT).predicates();
        let ext_root = extending.tree.node(NodeId::ROOT).predicates();
        let merged = merge_predicates(base_root, ext_root)?;

        let mut tree = ExpressionTree::new();
        tree.set_root_predicates(merged);
        for source in [&self.tree, &extending.tree] {
            for child in source.node(NodeId::ROOT).children() {
                tree.graft(NodeId::ROOT, source, *child);
            }
        }

        let mut orderings = self.orderings.clone();
        for ordering in &extending.orderings {
            if !orderings.iter().any(|o| o.property() == ordering.property()) {
                orderings.push(*ordering);
            }
        }

        tracing::debug!(
            nodes = tree.len(),
            variables = tree.node(NodeId::ROOT).predicates().variables().len(),
            orderings = orderings.len(),
            "extended task query"
        );

        Ok(TaskQuery {
            tree,
            current: NodeId::ROOT,
            orderings,
        })
    }
}

fn merge_predicates(base: &PredicateSet, extending: &PredicateSet) -> Result<PredicateSet> {
    let mut merged = PredicateSet::new();

    for dimension in Dimension::ALL.iter().copied() {
        let source = if extending.has_predicate(dimension) {
            extending
        } else {
            base
        };
        if let Some(terms) = source.terms.get(&dimension) {
            merged.terms.insert(dimension, terms.clone());
        } else if let Some(expression) = source.expressions.get(&dimension) {
            merged.expressions.insert(dimension, expression.clone());
        }
    }

    merged.flags = base
        .flags
        .union(&extending.flags)
        .copied()
        .filter(|f| *f != Flag::IncludeAssignedTasks)
        .collect();

    let overridden: AHashSet<_> = extending.variables.iter().map(|v| v.merge_key()).collect();
    merged.variables = extending.variables.clone();
    merged.variables.extend(
        base.variables
            .iter()
            .filter(|v| !overridden.contains(&v.merge_key()))
            .cloned(),
    );

    validate::check_and_group_exclusion(&merged)?;

    if base.has_flag(Flag::IncludeAssignedTasks) || extending.has_flag(Flag::IncludeAssignedTasks) {
        validate::check_include_assigned_tasks(&merged)?;
        merged.set_flag(Flag::IncludeAssignedTasks);
    }

    Ok(merged)
}
