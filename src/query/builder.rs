//! Predicate setters of `TaskQuery`
//!
//! Every setter writes to the current group. Multi-valued predicates follow
//! the group's operator: AND replaces the previous value, OR adds another
//! alternative.

use crate::error::{CriteriaError, Result};
use crate::predicate::{DelegationState, Dimension, Flag, SuspensionState, Term};
use crate::query::TaskQuery;
use crate::validate;
use crate::value::{DefaultTypeRegistry, RawValue};
use crate::variable::{VariableOperator, VariablePredicate, VariablePredicateCompiler, VariableScope};
use chrono::{DateTime, Utc};

macro_rules! text_setters {
    ($( $(#[$doc:meta])* $method:ident => $dimension:ident ),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&mut self, value: impl Into<String>) -> &mut Self {
                self.set_term(Dimension::$dimension, Term::Text(value.into()))
            }
        )+
    };
}

macro_rules! set_setters {
    ($( $(#[$doc:meta])* $method:ident => $dimension:ident ),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method<I, S>(&mut self, values: I) -> Result<&mut Self>
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                let term = non_empty_set(Dimension::$dimension, values)?;
                Ok(self.set_term(Dimension::$dimension, term))
            }
        )+
    };
}

macro_rules! date_setters {
    ($( $(#[$doc:meta])* $method:ident => $dimension:ident ),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&mut self, value: DateTime<Utc>) -> &mut Self {
                self.set_term(Dimension::$dimension, Term::Date(value))
            }
        )+
    };
}

macro_rules! expression_setters {
    ($( $(#[$doc:meta])* $method:ident => $dimension:ident ),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&mut self, expression: impl Into<String>) -> &mut Self {
                self.set_expression(Dimension::$dimension, expression.into())
            }
        )+
    };
}

macro_rules! flag_setters {
    ($( $(#[$doc:meta])* $method:ident => $flag:ident ),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&mut self) -> &mut Self {
                self.set_flag(Flag::$flag)
            }
        )+
    };
}

fn non_empty_set<I, S>(dimension: Dimension, values: I) -> Result<Term>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Err(CriteriaError::InvalidArgument(format!(
            "{} list is empty",
            dimension
        )));
    }
    Ok(Term::TextSet(values))
}

impl TaskQuery {
    text_setters! {
        /// Only select the task with the given id
        task_id => TaskId,
        name => Name,
        name_not_equal => NameNotEqual,
        /// Name matches an SQL LIKE pattern
        name_like => NameLike,
        name_not_like => NameNotLike,
        description => Description,
        description_like => DescriptionLike,
        assignee => Assignee,
        assignee_like => AssigneeLike,
        owner => Owner,
        /// Assignee, owner or any identity link of the task is the given user
        involved_user => InvolvedUser,
        process_instance_id => ProcessInstanceId,
        process_definition_key => ProcessDefinitionKey,
        execution_id => ExecutionId,
        case_instance_id => CaseInstanceId,
        case_execution_id => CaseExecutionId,
        task_definition_key => TaskDefinitionKey,
        task_definition_key_like => TaskDefinitionKeyLike,
        /// Only select subtasks of the given task
        parent_task_id => ParentTaskId,
    }

    set_setters! {
        task_id_in => TaskIdIn,
        assignee_in => AssigneeIn,
        assignee_not_in => AssigneeNotIn,
        process_instance_id_in => ProcessInstanceIdIn,
        process_definition_key_in => ProcessDefinitionKeyIn,
        task_definition_key_in => TaskDefinitionKeyIn,
        tenant_id_in => TenantIdIn,
    }

    date_setters! {
        /// Created strictly before the given instant
        created_before => CreatedBefore,
        created_after => CreatedAfter,
        created_on => CreatedOn,
        due_before => DueBefore,
        due_after => DueAfter,
        due_date => DueDate,
        follow_up_before => FollowUpBefore,
        follow_up_after => FollowUpAfter,
    }

    expression_setters! {
        /// Assignee resolved from an expression at execution time
        assignee_expression => Assignee,
        assignee_like_expression => AssigneeLike,
        assignee_in_expression => AssigneeIn,
        owner_expression => Owner,
        involved_user_expression => InvolvedUser,
        created_before_expression => CreatedBefore,
        created_after_expression => CreatedAfter,
        created_on_expression => CreatedOn,
        due_before_expression => DueBefore,
        due_after_expression => DueAfter,
        due_date_expression => DueDate,
        follow_up_before_expression => FollowUpBefore,
        follow_up_after_expression => FollowUpAfter,
    }

    flag_setters! {
        unassigned => Unassigned,
        assigned => Assigned,
        with_candidate_groups => WithCandidateGroups,
        without_candidate_groups => WithoutCandidateGroups,
        with_candidate_users => WithCandidateUsers,
        without_candidate_users => WithoutCandidateUsers,
        without_tenant_id => WithoutTenantId,
        without_due_date => WithoutDueDate,
        /// Variable names of this group compare case-insensitively
        match_variable_names_ignore_case => MatchVariableNamesIgnoreCase,
        /// String variable values of this group compare case-insensitively
        match_variable_values_ignore_case => MatchVariableValuesIgnoreCase,
    }

    pub fn priority(&mut self, priority: i32) -> &mut Self {
        self.set_term(Dimension::Priority, Term::Int(priority))
    }

    pub fn min_priority(&mut self, priority: i32) -> &mut Self {
        self.set_term(Dimension::MinPriority, Term::Int(priority))
    }

    pub fn max_priority(&mut self, priority: i32) -> &mut Self {
        self.set_term(Dimension::MaxPriority, Term::Int(priority))
    }

    pub fn delegation_state(&mut self, state: DelegationState) -> &mut Self {
        self.set_term(Dimension::DelegationState, Term::Delegation(state))
    }

    pub fn active(&mut self) -> &mut Self {
        self.set_term(
            Dimension::SuspensionState,
            Term::Suspension(SuspensionState::Active),
        )
    }

    pub fn suspended(&mut self) -> &mut Self {
        self.set_term(
            Dimension::SuspensionState,
            Term::Suspension(SuspensionState::Suspended),
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Candidate predicates
    // ═══════════════════════════════════════════════════════════════════════

    /// Tasks the user may claim, directly or through one of their groups
    pub fn candidate_user(&mut self, user_id: impl Into<String>) -> Result<&mut Self> {
        validate::check_candidate_user(self.current_predicates(), self.current_operator(), false)?;
        Ok(self.set_term(Dimension::CandidateUser, Term::Text(user_id.into())))
    }

    pub fn candidate_user_expression(&mut self, expression: impl Into<String>) -> Result<&mut Self> {
        validate::check_candidate_user(self.current_predicates(), self.current_operator(), true)?;
        Ok(self.set_expression(Dimension::CandidateUser, expression.into()))
    }

    pub fn candidate_group(&mut self, group_id: impl Into<String>) -> Result<&mut Self> {
        validate::check_candidate_group(
            self.current_predicates(),
            self.current_operator(),
            false,
            "candidateGroup",
        )?;
        Ok(self.set_term(Dimension::CandidateGroup, Term::Text(group_id.into())))
    }

    pub fn candidate_group_expression(&mut self, expression: impl Into<String>) -> Result<&mut Self> {
        validate::check_candidate_group(
            self.current_predicates(),
            self.current_operator(),
            true,
            "candidateGroup",
        )?;
        Ok(self.set_expression(Dimension::CandidateGroup, expression.into()))
    }

    pub fn candidate_group_in<I, S>(&mut self, group_ids: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let term = non_empty_set(Dimension::CandidateGroupIn, group_ids)?;
        validate::check_candidate_group(
            self.current_predicates(),
            self.current_operator(),
            false,
            "candidateGroupIn",
        )?;
        Ok(self.set_term(Dimension::CandidateGroupIn, term))
    }

    pub fn candidate_group_in_expression(&mut self, expression: impl Into<String>) -> Result<&mut Self> {
        validate::check_candidate_group(
            self.current_predicates(),
            self.current_operator(),
            true,
            "candidateGroupIn",
        )?;
        Ok(self.set_expression(Dimension::CandidateGroupIn, expression.into()))
    }

    /// Also return assigned tasks for the candidate predicates of this group
    pub fn include_assigned_tasks(&mut self) -> Result<&mut Self> {
        validate::check_include_assigned_tasks(self.current_predicates())?;
        Ok(self.set_flag(Flag::IncludeAssignedTasks))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Variable predicates
    // ═══════════════════════════════════════════════════════════════════════

    /// Add an already compiled variable predicate to the current group
    pub fn variable_predicate(&mut self, predicate: VariablePredicate) -> &mut Self {
        self.tree.predicates_mut(self.current).add_variable(predicate);
        self
    }

    /// Compile and add a variable comparison with the default type registry
    pub fn variable(
        &mut self,
        name: &str,
        operator: VariableOperator,
        value: impl Into<RawValue>,
        scope: VariableScope,
        is_local: bool,
    ) -> Result<&mut Self> {
        let predicate =
            VariablePredicateCompiler::new(DefaultTypeRegistry).compile(name, value.into(), operator, scope, is_local)?;
        Ok(self.variable_predicate(predicate))
    }

    /// Variable visible from the task equals `value`
    pub fn variable_value_equals(&mut self, name: &str, value: impl Into<RawValue>) -> Result<&mut Self> {
        self.variable(name, VariableOperator::Equals, value, VariableScope::TaskLocal, false)
    }

    /// Task-local variable comparison
    pub fn task_variable(
        &mut self,
        name: &str,
        operator: VariableOperator,
        value: impl Into<RawValue>,
    ) -> Result<&mut Self> {
        self.variable(name, operator, value, VariableScope::TaskLocal, true)
    }

    pub fn task_variable_value_equals(&mut self, name: &str, value: impl Into<RawValue>) -> Result<&mut Self> {
        self.task_variable(name, VariableOperator::Equals, value)
    }

    /// Process-instance variable comparison
    pub fn process_variable(
        &mut self,
        name: &str,
        operator: VariableOperator,
        value: impl Into<RawValue>,
    ) -> Result<&mut Self> {
        self.variable(name, operator, value, VariableScope::ProcessInstance, false)
    }

    pub fn process_variable_value_equals(&mut self, name: &str, value: impl Into<RawValue>) -> Result<&mut Self> {
        self.process_variable(name, VariableOperator::Equals, value)
    }

    /// Case-execution variable comparison
    pub fn case_instance_variable(
        &mut self,
        name: &str,
        operator: VariableOperator,
        value: impl Into<RawValue>,
    ) -> Result<&mut Self> {
        self.variable(name, operator, value, VariableScope::CaseExecution, false)
    }

    pub fn case_instance_variable_value_equals(
        &mut self,
        name: &str,
        value: impl Into<RawValue>,
    ) -> Result<&mut Self> {
        self.case_instance_variable(name, VariableOperator::Equals, value)
    }

    fn current_predicates(&self) -> &crate::predicate::PredicateSet {
        self.tree.node(self.current).predicates()
    }
}
