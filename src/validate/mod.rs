//! Named invariant checks
//!
//! The builder calls the per-node checks when a setter runs, so misuse fails
//! at the offending call. The `ValidatorChain` re-runs the structural
//! invariants over a finished query before it is compiled, which also
//! covers trees produced by `TaskQuery::extend`.

use crate::error::{CriteriaError, Result};
use crate::predicate::{Dimension, Flag, PredicateSet};
use crate::query::TaskQuery;
use crate::tree::LogicalOperator;
use crate::variable::check_variable;

/// A single named check over a finished query
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, query: &TaskQuery) -> Result<()>;
}

/// Execution entry points are only legal on the root group
pub struct CursorAtRoot;

impl Validator for CursorAtRoot {
    fn name(&self) -> &'static str {
        "cursor-at-root"
    }

    fn validate(&self, query: &TaskQuery) -> Result<()> {
        if query.is_at_root() {
            Ok(())
        } else {
            Err(CriteriaError::Structural(format!(
                "query is still inside group {}; close every group with endAnd()/endOr() before executing",
                query.current()
            )))
        }
    }
}

/// Candidate user and candidate group never share an AND group
pub struct CandidateExclusion;

impl Validator for CandidateExclusion {
    fn name(&self) -> &'static str {
        "candidate-exclusion"
    }

    fn validate(&self, query: &TaskQuery) -> Result<()> {
        for (_, node) in query.tree().iter() {
            if node.operator() == LogicalOperator::And {
                check_and_group_exclusion(node.predicates())?;
            }
        }
        Ok(())
    }
}

/// `includeAssignedTasks` only refines an existing candidate predicate
pub struct AssignedTasksPrecondition;

impl Validator for AssignedTasksPrecondition {
    fn name(&self) -> &'static str {
        "assigned-tasks-precondition"
    }

    fn validate(&self, query: &TaskQuery) -> Result<()> {
        for (_, node) in query.tree().iter() {
            if node.predicates().has_flag(Flag::IncludeAssignedTasks) {
                check_include_assigned_tasks(node.predicates())?;
            }
        }
        Ok(())
    }
}

/// Variable predicates still satisfy their operator and type restrictions
pub struct VariableOperators;

impl Validator for VariableOperators {
    fn name(&self) -> &'static str {
        "variable-operators"
    }

    fn validate(&self, query: &TaskQuery) -> Result<()> {
        for (_, node) in query.tree().iter() {
            for variable in node.predicates().variables() {
                check_variable(variable.name(), variable.value(), variable.operator())?;
            }
        }
        Ok(())
    }
}

/// Every `orderBy` call has been given a direction
pub struct OrderingDirections;

impl Validator for OrderingDirections {
    fn name(&self) -> &'static str {
        "ordering-directions"
    }

    fn validate(&self, query: &TaskQuery) -> Result<()> {
        match query.orderings().iter().find(|o| o.direction().is_none()) {
            Some(ordering) => Err(CriteriaError::Structural(format!(
                "call asc() or desc() after orderBy {}",
                ordering.property()
            ))),
            None => Ok(()),
        }
    }
}

/// Ordered list of validators run before compilation
pub struct ValidatorChain {
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidatorChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl ValidatorChain {
    pub fn empty() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// The checks every compiled query must pass
    pub fn standard() -> Self {
        Self::empty()
            .with(CursorAtRoot)
            .with(OrderingDirections)
            .with(CandidateExclusion)
            .with(AssignedTasksPrecondition)
            .with(VariableOperators)
    }

    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run every validator in order; the first failure wins
    pub fn run(&self, query: &TaskQuery) -> Result<()> {
        for validator in &self.validators {
            tracing::trace!(validator = validator.name(), "validating task query");
            validator.validate(query)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Per-node checks shared with the builder
// ═══════════════════════════════════════════════════════════════════════════

fn has_candidate_groups(set: &PredicateSet) -> Option<&'static str> {
    if set.has_predicate(Dimension::CandidateGroup) {
        Some("candidateGroup")
    } else if set.has_predicate(Dimension::CandidateGroupIn) {
        Some("candidateGroupIn")
    } else {
        None
    }
}

/// Checks run by `candidateUser`
///
/// Value setters only enforce exclusion inside an AND group, while
/// expression setters enforce it under either operator.
pub(crate) fn check_candidate_user(
    set: &PredicateSet,
    operator: LogicalOperator,
    is_expression: bool,
) -> Result<()> {
    if operator == LogicalOperator::And || is_expression {
        if let Some(other) = has_candidate_groups(set) {
            return Err(CriteriaError::MutualExclusion(format!(
                "cannot set both candidateUser and {}",
                other
            )));
        }
    }
    Ok(())
}

/// Checks run by `candidateGroup` and `candidateGroupIn`
pub(crate) fn check_candidate_group(
    set: &PredicateSet,
    operator: LogicalOperator,
    is_expression: bool,
    setter: &str,
) -> Result<()> {
    if (operator == LogicalOperator::And || is_expression)
        && set.has_predicate(Dimension::CandidateUser)
    {
        return Err(CriteriaError::MutualExclusion(format!(
            "cannot set both {} and candidateUser",
            setter
        )));
    }
    Ok(())
}

/// Symmetric exclusion check for a finished AND group
pub(crate) fn check_and_group_exclusion(set: &PredicateSet) -> Result<()> {
    if set.has_predicate(Dimension::CandidateUser) {
        if let Some(other) = has_candidate_groups(set) {
            return Err(CriteriaError::MutualExclusion(format!(
                "cannot set both candidateUser and {}",
                other
            )));
        }
    }
    Ok(())
}

pub(crate) fn check_include_assigned_tasks(set: &PredicateSet) -> Result<()> {
    if set.has_candidate_predicate() {
        Ok(())
    } else {
        Err(CriteriaError::MissingPrecondition(
            "candidateUser, candidateGroup, candidateGroupIn, withCandidateGroups, \
             withoutCandidateGroups, withCandidateUsers, withoutCandidateUsers has to be \
             called before 'includeAssignedTasks'"
                .to_string(),
        ))
    }
}
