//! Filter dimensions, term values and flags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How repeated setter calls combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One value per call; AND replaces, OR appends
    Multi,
    /// A whole set per call; AND replaces, OR appends another set
    Set,
    /// Always overwritten
    Single,
}

/// How a dimension is compared against the task column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Like,
    NotLike,
    In,
    NotIn,
    Lt,
    Gt,
    Ge,
    Le,
    /// Candidate user/group through identity links
    Candidate,
    /// Assignee, owner or any identity link
    Involved,
}

/// Task attribute a dimension filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Id,
    Name,
    Description,
    Assignee,
    Owner,
    ProcessInstanceId,
    ProcessDefinitionKey,
    ExecutionId,
    CaseInstanceId,
    CaseExecutionId,
    TaskDefinitionKey,
    ParentTaskId,
    TenantId,
    DelegationState,
    Priority,
    CreateTime,
    DueDate,
    FollowUpDate,
    Suspended,
    IdentityLink,
}

impl TaskField {
    pub fn column(self) -> &'static str {
        match self {
            TaskField::Id => "RES.ID_",
            TaskField::Name => "RES.NAME_",
            TaskField::Description => "RES.DESCRIPTION_",
            TaskField::Assignee => "RES.ASSIGNEE_",
            TaskField::Owner => "RES.OWNER_",
            TaskField::ProcessInstanceId => "RES.PROC_INST_ID_",
            TaskField::ProcessDefinitionKey => "D.KEY_",
            TaskField::ExecutionId => "RES.EXECUTION_ID_",
            TaskField::CaseInstanceId => "RES.CASE_INST_ID_",
            TaskField::CaseExecutionId => "RES.CASE_EXECUTION_ID_",
            TaskField::TaskDefinitionKey => "RES.TASK_DEF_KEY_",
            TaskField::ParentTaskId => "RES.PARENT_TASK_ID_",
            TaskField::TenantId => "RES.TENANT_ID_",
            TaskField::DelegationState => "RES.DELEGATION_",
            TaskField::Priority => "RES.PRIORITY_",
            TaskField::CreateTime => "RES.CREATE_TIME_",
            TaskField::DueDate => "RES.DUE_DATE_",
            TaskField::FollowUpDate => "RES.FOLLOW_UP_DATE_",
            TaskField::Suspended => "RES.SUSPENSION_STATE_",
            TaskField::IdentityLink => "I.ID_",
        }
    }
}

macro_rules! dimensions {
    ($( $variant:ident => ($arity:ident, $cmp:ident, $field:ident, $expr:literal) ),+ $(,)?) => {
        /// Every filterable dimension of a task query
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum Dimension {
            $( $variant, )+
        }

        impl Dimension {
            pub const ALL: &'static [Dimension] = &[ $( Dimension::$variant, )+ ];

            pub fn arity(self) -> Arity {
                match self { $( Dimension::$variant => Arity::$arity, )+ }
            }

            pub fn comparison(self) -> Comparison {
                match self { $( Dimension::$variant => Comparison::$cmp, )+ }
            }

            pub fn field(self) -> TaskField {
                match self { $( Dimension::$variant => TaskField::$field, )+ }
            }

            /// Whether a deferred expression may stand in for a literal value
            pub fn supports_expression(self) -> bool {
                match self { $( Dimension::$variant => $expr, )+ }
            }

            pub fn name(self) -> &'static str {
                match self { $( Dimension::$variant => stringify!($variant), )+ }
            }
        }
    };
}

dimensions! {
    TaskId => (Multi, Eq, Id, false),
    TaskIdIn => (Set, In, Id, false),
    Name => (Multi, Eq, Name, false),
    NameNotEqual => (Multi, Ne, Name, false),
    NameLike => (Multi, Like, Name, false),
    NameNotLike => (Multi, NotLike, Name, false),
    Description => (Multi, Eq, Description, false),
    DescriptionLike => (Multi, Like, Description, false),
    Assignee => (Multi, Eq, Assignee, true),
    AssigneeLike => (Multi, Like, Assignee, true),
    AssigneeIn => (Set, In, Assignee, true),
    AssigneeNotIn => (Set, NotIn, Assignee, false),
    Owner => (Multi, Eq, Owner, true),
    CandidateUser => (Multi, Candidate, IdentityLink, true),
    CandidateGroup => (Multi, Candidate, IdentityLink, true),
    CandidateGroupIn => (Set, Candidate, IdentityLink, true),
    InvolvedUser => (Multi, Involved, IdentityLink, true),
    ProcessInstanceId => (Multi, Eq, ProcessInstanceId, false),
    ProcessInstanceIdIn => (Set, In, ProcessInstanceId, false),
    ProcessDefinitionKey => (Multi, Eq, ProcessDefinitionKey, false),
    ProcessDefinitionKeyIn => (Set, In, ProcessDefinitionKey, false),
    ExecutionId => (Multi, Eq, ExecutionId, false),
    CaseInstanceId => (Multi, Eq, CaseInstanceId, false),
    CaseExecutionId => (Multi, Eq, CaseExecutionId, false),
    TaskDefinitionKey => (Multi, Eq, TaskDefinitionKey, false),
    TaskDefinitionKeyIn => (Set, In, TaskDefinitionKey, false),
    TaskDefinitionKeyLike => (Multi, Like, TaskDefinitionKey, false),
    ParentTaskId => (Multi, Eq, ParentTaskId, false),
    TenantIdIn => (Set, In, TenantId, false),
    DelegationState => (Multi, Eq, DelegationState, false),
    Priority => (Multi, Eq, Priority, false),
    MinPriority => (Single, Ge, Priority, false),
    MaxPriority => (Single, Le, Priority, false),
    CreatedBefore => (Single, Lt, CreateTime, true),
    CreatedAfter => (Single, Gt, CreateTime, true),
    CreatedOn => (Single, Eq, CreateTime, true),
    DueBefore => (Single, Lt, DueDate, true),
    DueAfter => (Single, Gt, DueDate, true),
    DueDate => (Single, Eq, DueDate, true),
    FollowUpBefore => (Single, Lt, FollowUpDate, true),
    FollowUpAfter => (Single, Gt, FollowUpDate, true),
    SuspensionState => (Single, Eq, Suspended, false),
}

impl Dimension {
    /// Candidate user/group predicates, subject to mutual exclusion
    pub fn is_candidate(self) -> bool {
        matches!(
            self,
            Dimension::CandidateUser | Dimension::CandidateGroup | Dimension::CandidateGroupIn
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuspensionState {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DelegationState {
    Pending,
    Resolved,
}

impl DelegationState {
    pub fn as_str(self) -> &'static str {
        match self {
            DelegationState::Pending => "PENDING",
            DelegationState::Resolved => "RESOLVED",
        }
    }
}

/// A literal value held by a dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Term {
    Text(String),
    TextSet(Vec<String>),
    Int(i32),
    Date(DateTime<Utc>),
    Suspension(SuspensionState),
    Delegation(DelegationState),
}

/// Boolean switches; set means true, absent means unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Flag {
    Unassigned,
    Assigned,
    WithCandidateGroups,
    WithoutCandidateGroups,
    WithCandidateUsers,
    WithoutCandidateUsers,
    WithoutTenantId,
    WithoutDueDate,
    IncludeAssignedTasks,
    MatchVariableNamesIgnoreCase,
    MatchVariableValuesIgnoreCase,
}

impl Flag {
    /// Modifiers change how other predicates of the node evaluate
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Flag::IncludeAssignedTasks
                | Flag::MatchVariableNamesIgnoreCase
                | Flag::MatchVariableValuesIgnoreCase
        )
    }

    /// Flags that satisfy the include-assigned-tasks precondition
    pub fn is_candidate_related(self) -> bool {
        matches!(
            self,
            Flag::WithCandidateGroups
                | Flag::WithoutCandidateGroups
                | Flag::WithCandidateUsers
                | Flag::WithoutCandidateUsers
        )
    }
}
