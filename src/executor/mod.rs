//! Backend boundary
//!
//! A `QueryExecutor` receives an immutable `CompiledCriteria` and returns
//! tasks or a count. Backends report failures as `BackendError`; the raw
//! message is logged and replaced by a stable `CriteriaError` before it
//! reaches the caller.

mod eval;
mod memory;
mod task;

pub use memory::*;
pub use task::*;

use crate::compile::CompiledCriteria;
use crate::config::CriteriaConfig;
use crate::error::CriteriaError;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use thiserror::Error;

/// Failure category reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// A group rendered to nothing
    EmptyGroup,
    /// The bracket structure or a parameter was rejected
    Malformed,
    /// A deferred expression could not be resolved
    Unresolved,
    Other,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind:?}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Map a backend failure to the caller-facing error
pub fn translate_backend_error(err: BackendError) -> CriteriaError {
    tracing::warn!(kind = ?err.kind, message = %err.message, "backend rejected compiled criteria");
    match err.kind {
        BackendErrorKind::EmptyGroup => CriteriaError::EmptyGroup,
        _ => CriteriaError::CompiledQuery,
    }
}

/// Executes compiled criteria against some task store
pub trait QueryExecutor: Send + Sync {
    fn execute_list(&self, criteria: &CompiledCriteria, page: Page) -> Result<Vec<Task>, BackendError>;
    fn execute_count(&self, criteria: &CompiledCriteria) -> Result<u64, BackendError>;
}

/// Group membership lookup used to expand candidate users
pub trait IdentityResolver: Send + Sync {
    fn groups_for_user(&self, user_id: &str) -> BTreeSet<String>;
}

/// Value a deferred expression resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionValue {
    Text(String),
    TextList(Vec<String>),
    Date(DateTime<Utc>),
}

/// Resolves deferred expressions at execution time
pub trait ExpressionResolver: Send + Sync {
    fn resolve(&self, expression: &str) -> Result<ExpressionValue, BackendError>;
}

/// Fixed user to group memberships
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    memberships: AHashMap<String, BTreeSet<String>>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_membership(mut self, user_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        self.memberships
            .entry(user_id.into())
            .or_default()
            .insert(group_id.into());
        self
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn groups_for_user(&self, user_id: &str) -> BTreeSet<String> {
        self.memberships.get(user_id).cloned().unwrap_or_default()
    }
}

/// Fixed expression to value table
#[derive(Debug, Clone, Default)]
pub struct StaticExpressionResolver {
    values: AHashMap<String, ExpressionValue>,
}

impl StaticExpressionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, expression: impl Into<String>, value: ExpressionValue) {
        self.values.insert(expression.into(), value);
    }
}

impl ExpressionResolver for StaticExpressionResolver {
    fn resolve(&self, expression: &str) -> Result<ExpressionValue, BackendError> {
        self.values.get(expression).cloned().ok_or_else(|| {
            BackendError::new(
                BackendErrorKind::Unresolved,
                format!("unknown expression {}", expression),
            )
        })
    }
}

/// Result window of a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub first_result: u32,
    pub max_results: u32,
}

impl Page {
    pub fn new(first_result: u32, max_results: u32) -> Self {
        Self {
            first_result,
            max_results,
        }
    }

    /// Everything from the first row; clamped by the configured maximum
    pub fn all() -> Self {
        Self::new(0, u32::MAX)
    }

    pub fn clamp(self, max_results: u32) -> Self {
        Self {
            first_result: self.first_result,
            max_results: self.max_results.min(max_results),
        }
    }
}

/// Everything a query needs to run
pub struct QueryContext<'a> {
    pub executor: &'a dyn QueryExecutor,
    pub identity: &'a dyn IdentityResolver,
    pub config: &'a CriteriaConfig,
}

impl<'a> QueryContext<'a> {
    pub fn new(
        executor: &'a dyn QueryExecutor,
        identity: &'a dyn IdentityResolver,
        config: &'a CriteriaConfig,
    ) -> Self {
        Self {
            executor,
            identity,
            config,
        }
    }
}
