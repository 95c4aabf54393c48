//! Result ordering

use crate::error::{CriteriaError, Result};
use crate::query::TaskQuery;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task attribute a query can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskQueryProperty {
    TaskId,
    Name,
    Assignee,
    Priority,
    CreateTime,
    DueDate,
    FollowUpDate,
}

impl TaskQueryProperty {
    pub fn column(self) -> &'static str {
        match self {
            TaskQueryProperty::TaskId => "RES.ID_",
            TaskQueryProperty::Name => "RES.NAME_",
            TaskQueryProperty::Assignee => "RES.ASSIGNEE_",
            TaskQueryProperty::Priority => "RES.PRIORITY_",
            TaskQueryProperty::CreateTime => "RES.CREATE_TIME_",
            TaskQueryProperty::DueDate => "RES.DUE_DATE_",
            TaskQueryProperty::FollowUpDate => "RES.FOLLOW_UP_DATE_",
        }
    }
}

impl fmt::Display for TaskQueryProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskQueryProperty::TaskId => "id",
            TaskQueryProperty::Name => "name",
            TaskQueryProperty::Assignee => "assignee",
            TaskQueryProperty::Priority => "priority",
            TaskQueryProperty::CreateTime => "createTime",
            TaskQueryProperty::DueDate => "dueDate",
            TaskQueryProperty::FollowUpDate => "followUpDate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// An `orderBy` call, with its direction once `asc()`/`desc()` ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOrdering {
    property: TaskQueryProperty,
    direction: Option<Direction>,
}

impl QueryOrdering {
    pub fn new(property: TaskQueryProperty, direction: Direction) -> Self {
        Self {
            property,
            direction: Some(direction),
        }
    }

    pub fn property(&self) -> TaskQueryProperty {
        self.property
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }
}

impl TaskQuery {
    /// Start an ordering; must be followed by `asc()` or `desc()`
    pub fn order_by(&mut self, property: TaskQueryProperty) -> Result<&mut Self> {
        if !self.is_at_root() {
            return Err(CriteriaError::OrderingNotAllowed(format!(
                "orderBy {} is not allowed inside group {}",
                property, self.current
            )));
        }
        if let Some(pending) = self.pending_ordering() {
            return Err(CriteriaError::Structural(format!(
                "call asc() or desc() after orderBy {}",
                pending.property
            )));
        }
        self.orderings.push(QueryOrdering {
            property,
            direction: None,
        });
        Ok(self)
    }

    pub fn order_by_task_id(&mut self) -> Result<&mut Self> {
        self.order_by(TaskQueryProperty::TaskId)
    }

    pub fn order_by_task_name(&mut self) -> Result<&mut Self> {
        self.order_by(TaskQueryProperty::Name)
    }

    pub fn order_by_task_assignee(&mut self) -> Result<&mut Self> {
        self.order_by(TaskQueryProperty::Assignee)
    }

    pub fn order_by_task_priority(&mut self) -> Result<&mut Self> {
        self.order_by(TaskQueryProperty::Priority)
    }

    pub fn order_by_task_create_time(&mut self) -> Result<&mut Self> {
        self.order_by(TaskQueryProperty::CreateTime)
    }

    pub fn order_by_due_date(&mut self) -> Result<&mut Self> {
        self.order_by(TaskQueryProperty::DueDate)
    }

    pub fn order_by_follow_up_date(&mut self) -> Result<&mut Self> {
        self.order_by(TaskQueryProperty::FollowUpDate)
    }

    pub fn asc(&mut self) -> Result<&mut Self> {
        self.direction(Direction::Asc)
    }

    pub fn desc(&mut self) -> Result<&mut Self> {
        self.direction(Direction::Desc)
    }

    fn direction(&mut self, direction: Direction) -> Result<&mut Self> {
        if self.pending_ordering().is_none() {
            return Err(CriteriaError::Structural(format!(
                "call orderBy before {}()",
                direction.sql().to_lowercase()
            )));
        }
        if let Some(ordering) = self.orderings.last_mut() {
            ordering.direction = Some(direction);
        }
        Ok(self)
    }

    fn pending_ordering(&self) -> Option<&QueryOrdering> {
        self.orderings.last().filter(|o| o.direction.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_with_direction() {
        let mut query = TaskQuery::new();
        query
            .order_by_task_priority()
            .unwrap()
            .desc()
            .unwrap()
            .order_by_task_name()
            .unwrap()
            .asc()
            .unwrap();
        assert_eq!(
            query.orderings(),
            &[
                QueryOrdering::new(TaskQueryProperty::Priority, Direction::Desc),
                QueryOrdering::new(TaskQueryProperty::Name, Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_ordering_inside_group_fails() {
        let mut query = TaskQuery::new();
        query.start_or();
        let err = query.order_by_task_create_time().unwrap_err();
        assert!(matches!(err, CriteriaError::OrderingNotAllowed(_)));
        assert!(query.orderings().is_empty());
    }

    #[test]
    fn test_direction_without_order_by_fails() {
        let mut query = TaskQuery::new();
        assert!(matches!(query.asc(), Err(CriteriaError::Structural(_))));
        query.order_by_due_date().unwrap().asc().unwrap();
        assert!(matches!(query.desc(), Err(CriteriaError::Structural(_))));
    }

    #[test]
    fn test_pending_ordering_blocks_next_order_by() {
        let mut query = TaskQuery::new();
        query.order_by_task_id().unwrap();
        assert!(matches!(
            query.order_by_task_name(),
            Err(CriteriaError::Structural(_))
        ));
    }
}
