//! Compilation of a finished `TaskQuery`
//!
//! Compiling validates the query, flattens the expression tree with its
//! closing-parenthesis plan and resolves candidate users to their groups.
//! The result is immutable and can be shared between executors.

mod parens;
mod render;

pub use parens::*;
pub use render::*;

use crate::config::CriteriaConfig;
use crate::error::Result;
use crate::executor::IdentityResolver;
use crate::predicate::{Dimension, Term};
use crate::query::{Direction, QueryOrdering, TaskQuery};
use crate::tree::{ExpressionTree, NodeId};
use crate::validate::ValidatorChain;
use serde::Serialize;
use std::collections::BTreeMap;

/// Validated, flattened and bracketed criteria
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledCriteria {
    tree: ExpressionTree,
    groups: Vec<NodeId>,
    closings: Vec<Closing>,
    orderings: Vec<QueryOrdering>,
    candidate_groups: BTreeMap<String, Vec<String>>,
    like_escape: char,
}

impl CompiledCriteria {
    pub fn tree(&self) -> &ExpressionTree {
        &self.tree
    }

    /// Non-root groups in pre-order
    pub fn groups(&self) -> &[NodeId] {
        &self.groups
    }

    /// Closing plan aligned with `groups`
    pub fn closings(&self) -> &[Closing] {
        &self.closings
    }

    pub fn orderings(&self) -> &[QueryOrdering] {
        &self.orderings
    }

    /// Groups a candidate user was expanded to at compile time
    pub fn candidate_groups_of(&self, user_id: &str) -> &[String] {
        self.candidate_groups
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn like_escape(&self) -> char {
        self.like_escape
    }

    /// Total number of "(" and ")" the rendered clause contains
    pub fn paren_counts(&self) -> (usize, usize) {
        let closed = self.closings.iter().map(|c| c.count()).sum();
        (self.groups.len(), closed)
    }
}

/// Validate and compile a query
pub fn compile(
    query: &TaskQuery,
    identity: &dyn IdentityResolver,
    config: &CriteriaConfig,
) -> Result<CompiledCriteria> {
    ValidatorChain::standard().run(query)?;

    let tree = query.tree().clone();
    let (groups, closings) = compile_closings(&tree)?;

    let mut candidate_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if config.expand_candidate_groups {
        for (_, node) in tree.iter() {
            for term in node.predicates().terms(Dimension::CandidateUser) {
                if let Term::Text(user_id) = term {
                    candidate_groups
                        .entry(user_id.clone())
                        .or_insert_with(|| identity.groups_for_user(user_id).into_iter().collect());
                }
            }
        }
    }

    // validated above, so every ordering has a direction
    let orderings = query
        .orderings()
        .iter()
        .map(|o| QueryOrdering::new(o.property(), o.direction().unwrap_or(Direction::Asc)))
        .collect();

    tracing::debug!(
        nodes = tree.len(),
        groups = groups.len(),
        expanded_users = candidate_groups.len(),
        "compiled task query"
    );

    Ok(CompiledCriteria {
        tree,
        groups,
        closings,
        orderings,
        candidate_groups,
        like_escape: config.like_escape,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CriteriaError;
    use crate::executor::StaticIdentityResolver;

    fn compile_default(query: &TaskQuery) -> Result<CompiledCriteria> {
        query.compile(&StaticIdentityResolver::new(), &CriteriaConfig::default())
    }

    #[test]
    fn test_empty_or_group_fails_at_compile_time() {
        let mut query = TaskQuery::new();
        query.start_or().end_or().unwrap();
        assert_eq!(compile_default(&query), Err(CriteriaError::EmptyGroup));
    }

    #[test]
    fn test_group_with_only_modifiers_is_empty() {
        let mut query = TaskQuery::new();
        query
            .start_or()
            .match_variable_names_ignore_case()
            .end_or()
            .unwrap();
        assert_eq!(compile_default(&query), Err(CriteriaError::EmptyGroup));
    }

    #[test]
    fn test_nested_tree_is_balanced() {
        let mut query = TaskQuery::new();
        query
            .task_definition_key("approve")
            .start_or()
            .assignee("kermit")
            .start_and()
            .unassigned()
            .priority(50)
            .end_and()
            .unwrap()
            .end_or()
            .unwrap()
            .start_or()
            .name("a")
            .end_or()
            .unwrap();

        let compiled = compile_default(&query).unwrap();
        assert_eq!(compiled.groups().len(), 3);
        assert_eq!(
            compiled.closings(),
            &[Closing::None, Closing::Parens(2), Closing::Parens(1)]
        );
        assert_eq!(compiled.paren_counts(), (3, 3));
    }

    #[test]
    fn test_candidate_users_are_expanded() {
        let identity = StaticIdentityResolver::new().with_membership("kermit", "management");
        let mut query = TaskQuery::new();
        query.start_or().candidate_user("kermit").unwrap().end_or().unwrap();

        let compiled = query.compile(&identity, &CriteriaConfig::default()).unwrap();
        assert_eq!(compiled.candidate_groups_of("kermit"), &["management".to_string()]);

        let config = CriteriaConfig {
            expand_candidate_groups: false,
            ..CriteriaConfig::default()
        };
        let compiled = query.compile(&identity, &config).unwrap();
        assert!(compiled.candidate_groups_of("kermit").is_empty());
    }

    #[test]
    fn test_ordering_without_direction_fails() {
        let mut query = TaskQuery::new();
        query.order_by_task_name().unwrap();
        assert!(matches!(
            compile_default(&query),
            Err(CriteriaError::Structural(_))
        ));
    }

    #[test]
    fn test_merged_tree_is_validated() {
        let mut base = TaskQuery::new();
        base.start_or().candidate_user("kermit").unwrap().end_or().unwrap();
        let mut extending = TaskQuery::new();
        extending.start_or().end_or().unwrap();
        let merged = base.extend(&extending).unwrap();
        assert_eq!(compile_default(&merged), Err(CriteriaError::EmptyGroup));
    }

    #[test]
    fn test_compiled_criteria_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledCriteria>();
    }
}
