//! Task query builder
//!
//! `TaskQuery` owns an `ExpressionTree` and a cursor naming the group that
//! setters currently write to. `start_and`/`start_or` open a child group
//! and move the cursor into it; `end_and`/`end_or` move it back out.
//!
//! ```
//! use task_criteria::query::TaskQuery;
//!
//! let mut query = TaskQuery::new();
//! query
//!     .task_definition_key("approve")
//!     .start_or()
//!     .assignee("kermit")
//!     .assignee("gonzo")
//!     .end_or()
//!     .unwrap();
//! assert!(query.is_at_root());
//! ```

mod builder;
mod merge;
mod ordering;


pub use ordering::*;

use crate::compile::{self, CompiledCriteria};
use crate::config::CriteriaConfig;
use crate::error::{CriteriaError, Result};
use crate::executor::{translate_backend_error, IdentityResolver, Page, QueryContext, Task};
use crate::predicate::{Dimension, Flag, Term};
use crate::tree::{ExpressionTree, LogicalOperator, NodeId};

/// Fluent builder for nested task filter criteria
#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    tree: ExpressionTree,
    current: NodeId,
    orderings: Vec<QueryOrdering>,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQuery {
    pub fn new() -> Self {
        Self {
            tree: ExpressionTree::new(),
            current: NodeId::ROOT,
            orderings: Vec::new(),
        }
    }

    pub fn tree(&self) -> &ExpressionTree {
        &self.tree
    }

    /// Group that setters currently write to
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn is_at_root(&self) -> bool {
        self.current.is_root()
    }

    pub fn orderings(&self) -> &[QueryOrdering] {
        &self.orderings
    }

    fn current_operator(&self) -> LogicalOperator {
        self.tree.node(self.current).operator()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Group navigation
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a nested AND group under the current group
    pub fn start_and(&mut self) -> &mut Self {
        self.start(LogicalOperator::And)
    }

    /// Open a nested OR group under the current group
    pub fn start_or(&mut self) -> &mut Self {
        self.start(LogicalOperator::Or)
    }

    /// Close the current group, which must be an AND group
    pub fn end_and(&mut self) -> Result<&mut Self> {
        self.end(LogicalOperator::And)
    }

    /// Close the current group, which must be an OR group
    pub fn end_or(&mut self) -> Result<&mut Self> {
        self.end(LogicalOperator::Or)
    }

    fn start(&mut self, operator: LogicalOperator) -> &mut Self {
        let child = self.tree.add_child(self.current, operator);
        tracing::trace!(parent = %self.current, child = %child, %operator, "opened group");
        self.current = child;
        self
    }

    fn end(&mut self, operator: LogicalOperator) -> Result<&mut Self> {
        let node = self.tree.node(self.current);
        let Some(parent) = node.parent() else {
            return Err(CriteriaError::Structural(format!(
                "end{} called without a matching start{}",
                camel(operator),
                camel(operator)
            )));
        };
        if node.operator() != operator {
            return Err(CriteriaError::Structural(format!(
                "end{} called while the current group is {}",
                camel(operator),
                node.operator()
            )));
        }
        self.current = parent;
        Ok(self)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Predicate plumbing
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn set_term(&mut self, dimension: Dimension, term: Term) -> &mut Self {
        let operator = self.current_operator();
        self.tree
            .predicates_mut(self.current)
            .set_term(dimension, term, operator);
        self
    }

    pub(crate) fn set_expression(&mut self, dimension: Dimension, expression: String) -> &mut Self {
        debug_assert!(dimension.supports_expression());
        self.tree
            .predicates_mut(self.current)
            .set_expression(dimension, expression);
        self
    }

    pub(crate) fn set_flag(&mut self, flag: Flag) -> &mut Self {
        self.tree.predicates_mut(self.current).set_flag(flag);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Compilation and execution
    // ═══════════════════════════════════════════════════════════════════════

    /// Validate the query and compile it into an immutable criteria value
    pub fn compile(
        &self,
        identity: &dyn IdentityResolver,
        config: &CriteriaConfig,
    ) -> Result<CompiledCriteria> {
        compile::compile(self, identity, config)
    }

    /// Run the query through an executor and return one page of tasks
    pub fn execute_list(&self, ctx: &QueryContext<'_>, page: Page) -> Result<Vec<Task>> {
        let criteria = self.compile(ctx.identity, ctx.config)?;
        let page = page.clamp(ctx.config.max_results);
        tracing::debug!(
            groups = criteria.groups().len(),
            first_result = page.first_result,
            max_results = page.max_results,
            "executing task list query"
        );
        ctx.executor
            .execute_list(&criteria, page)
            .map_err(translate_backend_error)
    }

    /// Run the query through an executor and count the matching tasks
    pub fn execute_count(&self, ctx: &QueryContext<'_>) -> Result<u64> {
        let criteria = self.compile(ctx.identity, ctx.config)?;
        tracing::debug!(groups = criteria.groups().len(), "executing task count query");
        ctx.executor
            .execute_count(&criteria)
            .map_err(translate_backend_error)
    }
}

fn camel(operator: LogicalOperator) -> &'static str {
    match operator {
        LogicalOperator::And => "And",
        LogicalOperator::Or => "Or",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::StaticIdentityResolver;

    #[test]
    fn test_start_and_end_move_cursor() {
        let mut query = TaskQuery::new();
        query.start_or();
        let or_group = query.current();
        assert!(!query.is_at_root());
        query.start_and();
        assert_eq!(query.tree().get(query.current()).unwrap().parent(), Some(or_group));
        query.end_and().unwrap();
        assert_eq!(query.current(), or_group);
        query.end_or().unwrap();
        assert!(query.is_at_root());
    }

    #[test]
    fn test_mismatched_end_fails() {
        let mut query = TaskQuery::new();
        query.start_or();
        let err = query.end_and().unwrap_err();
        assert!(matches!(err, CriteriaError::Structural(_)));
        assert!(!query.is_at_root());
    }

    #[test]
    fn test_closing_root_fails() {
        let mut query = TaskQuery::new();
        assert!(matches!(query.end_and(), Err(CriteriaError::Structural(_))));
        assert!(matches!(query.end_or(), Err(CriteriaError::Structural(_))));
    }

    #[test]
    fn test_setters_use_current_group_operator() {
        let mut query = TaskQuery::new();
        query.assignee("a").assignee("b");
        query.start_or().assignee("c").assignee("d");
        let group = query.current();
        query.end_or().unwrap();

        let root = query.tree().get(NodeId::ROOT).unwrap();
        assert_eq!(
            root.predicates().terms(Dimension::Assignee),
            &[Term::Text("b".into())]
        );
        let or_node = query.tree().get(group).unwrap();
        assert_eq!(
            or_node.predicates().terms(Dimension::Assignee),
            &[Term::Text("c".into()), Term::Text("d".into())]
        );
    }

    #[test]
    fn test_compile_inside_group_fails() {
        let mut query = TaskQuery::new();
        query.start_or().assignee("a");
        let err = query
            .compile(&StaticIdentityResolver::default(), &CriteriaConfig::default())
            .unwrap_err();
        assert!(matches!(err, CriteriaError::Structural(_)));
    }
}
