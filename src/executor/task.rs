//! Task entities returned by executors

use crate::predicate::DelegationState;
use crate::value::TypedValue;
use crate::variable::VariableScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored variable visible to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskVariable {
    pub name: String,
    pub value: TypedValue,
    pub scope: VariableScope,
}

impl TaskVariable {
    pub fn new(name: impl Into<String>, value: TypedValue, scope: VariableScope) -> Self {
        Self {
            name: name.into(),
            value,
            scope,
        }
    }
}

/// A user task as seen by the query layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub owner: Option<String>,
    pub process_instance_id: Option<String>,
    pub process_definition_key: Option<String>,
    pub execution_id: Option<String>,
    pub case_instance_id: Option<String>,
    pub case_execution_id: Option<String>,
    pub task_definition_key: Option<String>,
    pub parent_task_id: Option<String>,
    pub tenant_id: Option<String>,
    pub delegation_state: Option<DelegationState>,
    pub priority: i32,
    pub create_time: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub suspended: bool,
    /// Users linked as candidates
    pub candidate_users: Vec<String>,
    /// Groups linked as candidates
    pub candidate_groups: Vec<String>,
    /// Users linked with any other identity link type
    pub participants: Vec<String>,
    pub variables: Vec<TaskVariable>,
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority: 50,
            ..Self::default()
        }
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_candidate_user(mut self, user_id: impl Into<String>) -> Self {
        self.candidate_users.push(user_id.into());
        self
    }

    pub fn with_candidate_group(mut self, group_id: impl Into<String>) -> Self {
        self.candidate_groups.push(group_id.into());
        self
    }

    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        value: TypedValue,
        scope: VariableScope,
    ) -> Self {
        self.variables.push(TaskVariable::new(name, value, scope));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_partial_json() {
        let task: Task = serde_json::from_str(
            r#"{"id": "t1", "assignee": "kermit", "candidate_groups": ["management"]}"#,
        )
        .unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.assignee.as_deref(), Some("kermit"));
        assert_eq!(task.candidate_groups, vec!["management".to_string()]);
        assert!(!task.suspended);
    }

    #[test]
    fn test_builder_helpers() {
        let task = Task::new("t1")
            .with_candidate_user("kermit")
            .with_variable("amount", TypedValue::integer(5), VariableScope::TaskLocal);
        assert_eq!(task.priority, 50);
        assert_eq!(task.candidate_users.len(), 1);
        assert_eq!(task.variables[0].name, "amount");
    }
}
