//! Evaluation of compiled criteria against a single task
//!
//! Mirrors the rendered WHERE clause: a node's own predicates and its child
//! groups are combined with the node's operator, and a missing column never
//! satisfies a comparison.

use crate::compile::CompiledCriteria;
use crate::executor::{BackendError, BackendErrorKind, ExpressionResolver, ExpressionValue, Task};
use crate::predicate::{
    Arity, Comparison, DelegationState, Dimension, Flag, PredicateSet, SuspensionState, TaskField,
    Term,
};
use crate::tree::{LogicalOperator, NodeId};
use crate::value::like_matches;
use crate::variable::VariablePredicate;
use chrono::{DateTime, Utc};

/// Column value of a task for one field
enum Column<'t> {
    Text(Option<&'t str>),
    Int(i32),
    Date(Option<DateTime<Utc>>),
    Suspended(bool),
    Delegation(Option<DelegationState>),
}

fn column<'t>(task: &'t Task, field: TaskField) -> Column<'t> {
    match field {
        TaskField::Id => Column::Text(Some(&task.id)),
        TaskField::Name => Column::Text(task.name.as_deref()),
        TaskField::Description => Column::Text(task.description.as_deref()),
        TaskField::Assignee => Column::Text(task.assignee.as_deref()),
        TaskField::Owner => Column::Text(task.owner.as_deref()),
        TaskField::ProcessInstanceId => Column::Text(task.process_instance_id.as_deref()),
        TaskField::ProcessDefinitionKey => Column::Text(task.process_definition_key.as_deref()),
        TaskField::ExecutionId => Column::Text(task.execution_id.as_deref()),
        TaskField::CaseInstanceId => Column::Text(task.case_instance_id.as_deref()),
        TaskField::CaseExecutionId => Column::Text(task.case_execution_id.as_deref()),
        TaskField::TaskDefinitionKey => Column::Text(task.task_definition_key.as_deref()),
        TaskField::ParentTaskId => Column::Text(task.parent_task_id.as_deref()),
        TaskField::TenantId => Column::Text(task.tenant_id.as_deref()),
        TaskField::DelegationState => Column::Delegation(task.delegation_state),
        TaskField::Priority => Column::Int(task.priority),
        TaskField::CreateTime => Column::Date(Some(task.create_time)),
        TaskField::DueDate => Column::Date(task.due_date),
        TaskField::FollowUpDate => Column::Date(task.follow_up_date),
        TaskField::Suspended => Column::Suspended(task.suspended),
        TaskField::IdentityLink => Column::Text(None),
    }
}

pub(crate) struct Evaluator<'a> {
    criteria: &'a CompiledCriteria,
    expressions: &'a dyn ExpressionResolver,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(criteria: &'a CompiledCriteria, expressions: &'a dyn ExpressionResolver) -> Self {
        Self {
            criteria,
            expressions,
        }
    }

    /// Evaluate the tree bottom-up, children before their parent
    pub(crate) fn matches(&self, task: &Task) -> Result<bool, BackendError> {
        let tree = self.criteria.tree();
        let mut outcomes = vec![true; tree.len()];
        for id in tree.preorder().into_iter().rev() {
            let node = tree.node(id);
            let mut results = self.own_results(node.predicates(), task)?;
            results.extend(node.children().iter().map(|c| outcomes[c.index()]));
            outcomes[id.index()] = combine(node.operator(), &results);
        }
        Ok(outcomes[NodeId::ROOT.index()])
    }

    fn own_results(&self, set: &PredicateSet, task: &Task) -> Result<Vec<bool>, BackendError> {
        let mut results = Vec::new();
        for (dimension, terms) in set.iter_terms() {
            for term in terms {
                results.push(self.term_matches(set, dimension, term, false, task)?);
            }
        }
        for (dimension, expression) in set.iter_expressions() {
            let term = self.resolve(dimension, expression)?;
            results.push(self.term_matches(set, dimension, &term, true, task)?);
        }
        for flag in set.filter_flags() {
            results.push(flag_matches(set, flag, task));
        }
        for variable in set.variables() {
            results.push(self.variable_matches(set, variable, task)?);
        }
        Ok(results)
    }

    fn resolve(&self, dimension: Dimension, expression: &str) -> Result<Term, BackendError> {
        let value = self.expressions.resolve(expression)?;
        let term = match (dimension.arity(), value) {
            (Arity::Set, ExpressionValue::Text(s)) => Term::TextSet(vec![s]),
            (Arity::Set, ExpressionValue::TextList(list)) => Term::TextSet(list),
            (_, ExpressionValue::Text(s)) => Term::Text(s),
            (_, ExpressionValue::Date(d)) => Term::Date(d),
            (_, ExpressionValue::TextList(_)) => {
                return Err(BackendError::new(
                    BackendErrorKind::Malformed,
                    format!("expression {} resolved to a list for {}", expression, dimension),
                ))
            }
        };
        Ok(term)
    }

    fn term_matches(
        &self,
        set: &PredicateSet,
        dimension: Dimension,
        term: &Term,
        from_expression: bool,
        task: &Task,
    ) -> Result<bool, BackendError> {
        let comparison = dimension.comparison();
        match (comparison, term) {
            (Comparison::Candidate, _) => {
                return self.candidate_matches(set, dimension, term, from_expression, task)
            }
            (Comparison::Involved, Term::Text(user)) => {
                return Ok(task.assignee.as_deref() == Some(user.as_str())
                    || task.owner.as_deref() == Some(user.as_str())
                    || task.candidate_users.contains(user)
                    || task.participants.contains(user));
            }
            _ => {}
        }

        let escape = self.criteria.like_escape();
        let matched = match (column(task, dimension.field()), term) {
            (Column::Text(value), Term::Text(expected)) => match (comparison, value) {
                (_, None) => false,
                (Comparison::Eq, Some(v)) => v == expected,
                (Comparison::Ne, Some(v)) => v != expected,
                (Comparison::Like, Some(v)) => like(v, expected, escape)?,
                (Comparison::NotLike, Some(v)) => !like(v, expected, escape)?,
                _ => return Err(mismatch(dimension, term)),
            },
            (Column::Text(value), Term::TextSet(expected)) => match (comparison, value) {
                (_, None) => false,
                (Comparison::In, Some(v)) => expected.iter().any(|e| e == v),
                (Comparison::NotIn, Some(v)) => !expected.iter().any(|e| e == v),
                _ => return Err(mismatch(dimension, term)),
            },
            (Column::Int(value), Term::Int(expected)) => match comparison {
                Comparison::Eq => value == *expected,
                Comparison::Ge => value >= *expected,
                Comparison::Le => value <= *expected,
                _ => return Err(mismatch(dimension, term)),
            },
            (Column::Date(value), Term::Date(expected)) => match (comparison, value) {
                (_, None) => false,
                (Comparison::Eq, Some(v)) => v == *expected,
                (Comparison::Lt, Some(v)) => v < *expected,
                (Comparison::Gt, Some(v)) => v > *expected,
                _ => return Err(mismatch(dimension, term)),
            },
            (Column::Suspended(suspended), Term::Suspension(state)) => {
                suspended == (*state == SuspensionState::Suspended)
            }
            (Column::Delegation(value), Term::Delegation(state)) => value == Some(*state),
            _ => return Err(mismatch(dimension, term)),
        };
        Ok(matched)
    }

    fn candidate_matches(
        &self,
        set: &PredicateSet,
        dimension: Dimension,
        term: &Term,
        from_expression: bool,
        task: &Task,
    ) -> Result<bool, BackendError> {
        if task.assignee.is_some() && !set.has_flag(Flag::IncludeAssignedTasks) {
            return Ok(false);
        }
        let matched = match (dimension, term) {
            (Dimension::CandidateUser, Term::Text(user)) => {
                // expression users only match direct links, like the rendered clause
                let groups: &[String] = if from_expression {
                    &[]
                } else {
                    self.criteria.candidate_groups_of(user)
                };
                task.candidate_users.contains(user)
                    || task.candidate_groups.iter().any(|g| groups.contains(g))
            }
            (Dimension::CandidateGroup, Term::Text(group)) => task.candidate_groups.contains(group),
            (Dimension::CandidateGroupIn, Term::TextSet(groups)) => {
                task.candidate_groups.iter().any(|g| groups.contains(g))
            }
            _ => return Err(mismatch(dimension, term)),
        };
        Ok(matched)
    }

    fn variable_matches(
        &self,
        set: &PredicateSet,
        predicate: &VariablePredicate,
        task: &Task,
    ) -> Result<bool, BackendError> {
        let names_ignore_case = set.has_flag(Flag::MatchVariableNamesIgnoreCase);
        let values_ignore_case = set.has_flag(Flag::MatchVariableValuesIgnoreCase);
        let visible = predicate.scope().visible(predicate.is_local());

        for variable in &task.variables {
            if !visible.contains(&variable.scope)
                || !predicate.matches_name(&variable.name, names_ignore_case)
            {
                continue;
            }
            let matched = predicate
                .matches_value(&variable.value, values_ignore_case, self.criteria.like_escape())
                .map_err(|e| BackendError::new(BackendErrorKind::Malformed, e.to_string()))?;
            if matched {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn combine(operator: LogicalOperator, results: &[bool]) -> bool {
    if results.is_empty() {
        return true;
    }
    match operator {
        LogicalOperator::And => results.iter().all(|r| *r),
        LogicalOperator::Or => results.iter().any(|r| *r),
    }
}

fn flag_matches(set: &PredicateSet, flag: Flag, task: &Task) -> bool {
    let candidate_visible = task.assignee.is_none() || set.has_flag(Flag::IncludeAssignedTasks);
    match flag {
        Flag::Unassigned => task.assignee.is_none(),
        Flag::Assigned => task.assignee.is_some(),
        Flag::WithCandidateGroups => candidate_visible && !task.candidate_groups.is_empty(),
        Flag::WithCandidateUsers => candidate_visible && !task.candidate_users.is_empty(),
        Flag::WithoutCandidateGroups => task.candidate_groups.is_empty(),
        Flag::WithoutCandidateUsers => task.candidate_users.is_empty(),
        Flag::WithoutTenantId => task.tenant_id.is_none(),
        Flag::WithoutDueDate => task.due_date.is_none(),
        Flag::IncludeAssignedTasks
        | Flag::MatchVariableNamesIgnoreCase
        | Flag::MatchVariableValuesIgnoreCase => true,
    }
}

fn like(value: &str, pattern: &str, escape: char) -> Result<bool, BackendError> {
    like_matches(value, pattern, escape, false)
        .map_err(|e| BackendError::new(BackendErrorKind::Malformed, e.to_string()))
}

fn mismatch(dimension: Dimension, term: &Term) -> BackendError {
    BackendError::new(
        BackendErrorKind::Malformed,
        format!("{:?} cannot be compared with {}", term, dimension),
    )
}
