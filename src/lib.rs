//! Task Criteria - Dynamic boolean filter-criteria compiler for task queries
//!
//! This crate lets callers declare filters over user tasks, nest them in
//! AND/OR groups, merge independently built queries and compile the result
//! into a parameterized, correctly parenthesized criteria value that a
//! persistence backend can execute.

pub mod compile;
pub mod config;
pub mod error;
pub mod executor;
pub mod predicate;
pub mod query;
pub mod tree;
pub mod validate;
pub mod value;
pub mod variable;

pub use compile::{CompiledCriteria, SqlFragment};
pub use config::CriteriaConfig;
pub use error::{CriteriaError, Result};
pub use executor::{InMemoryExecutor, Page, QueryContext, QueryExecutor, Task};
pub use query::TaskQuery;
pub use tree::{ExpressionTree, LogicalOperator, NodeId};
pub use value::{number_value, TypedValue};
pub use variable::{VariableOperator, VariablePredicate, VariableScope};
