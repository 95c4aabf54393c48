//! In-memory reference backend

use crate::compile::CompiledCriteria;
use crate::executor::eval::Evaluator;
use crate::executor::{
    BackendError, ExpressionValue, Page, QueryExecutor, StaticExpressionResolver, Task,
};
use crate::query::{Direction, TaskQueryProperty};
use parking_lot::RwLock;
use std::cmp::Ordering;

/// Executes compiled criteria over tasks held in memory
#[derive(Debug, Default)]
pub struct InMemoryExecutor {
    tasks: RwLock<Vec<Task>>,
    expressions: StaticExpressionResolver,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks.into_iter().collect()),
            expressions: StaticExpressionResolver::new(),
        }
    }

    /// Register the value a deferred expression resolves to
    pub fn with_expression(mut self, expression: impl Into<String>, value: ExpressionValue) -> Self {
        self.expressions.insert(expression, value);
        self
    }

    pub fn insert(&self, task: Task) {
        self.tasks.write().push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    fn matching(&self, criteria: &CompiledCriteria) -> Result<Vec<Task>, BackendError> {
        let evaluator = Evaluator::new(criteria, &self.expressions);
        let tasks = self.tasks.read();
        let mut matched = Vec::new();
        for task in tasks.iter() {
            if evaluator.matches(task)? {
                matched.push(task.clone());
            }
        }
        Ok(matched)
    }
}

impl QueryExecutor for InMemoryExecutor {
    fn execute_list(&self, criteria: &CompiledCriteria, page: Page) -> Result<Vec<Task>, BackendError> {
        let mut tasks = self.matching(criteria)?;
        tasks.sort_by(|a, b| {
            criteria
                .orderings()
                .iter()
                .map(|o| {
                    let ordering = compare_by(a, b, o.property());
                    match o.direction() {
                        Some(Direction::Desc) => ordering.reverse(),
                        _ => ordering,
                    }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(tasks
            .into_iter()
            .skip(page.first_result as usize)
            .take(page.max_results as usize)
            .collect())
    }

    fn execute_count(&self, criteria: &CompiledCriteria) -> Result<u64, BackendError> {
        Ok(self.matching(criteria)?.len() as u64)
    }
}

fn compare_by(a: &Task, b: &Task, property: TaskQueryProperty) -> Ordering {
    match property {
        TaskQueryProperty::TaskId => a.id.cmp(&b.id),
        TaskQueryProperty::Name => a.name.cmp(&b.name),
        TaskQueryProperty::Assignee => a.assignee.cmp(&b.assignee),
        TaskQueryProperty::Priority => a.priority.cmp(&b.priority),
        TaskQueryProperty::CreateTime => a.create_time.cmp(&b.create_time),
        TaskQueryProperty::DueDate => a.due_date.cmp(&b.due_date),
        TaskQueryProperty::FollowUpDate => a.follow_up_date.cmp(&b.follow_up_date),
    }
}
