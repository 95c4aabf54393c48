//! Variable predicates
//!
//! A variable predicate compares a named, scoped variable against a typed
//! value. Operator restrictions are checked when the predicate is built,
//! so an existing `VariablePredicate` is always executable.

mod compiler;

pub use compiler::*;

use crate::error::{CriteriaError, Result};
use crate::value::{compare_values, like_matches, TypedValue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators for variable values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableOperator {
    Equals,
    NotEquals,
    Like,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl VariableOperator {
    /// Operators that only test identity
    pub fn is_identity(self) -> bool {
        matches!(self, VariableOperator::Equals | VariableOperator::NotEquals)
    }

    pub fn sql(self) -> &'static str {
        match self {
            VariableOperator::Equals => "=",
            VariableOperator::NotEquals => "<>",
            VariableOperator::Like => "LIKE",
            VariableOperator::GreaterThan => ">",
            VariableOperator::GreaterThanOrEqual => ">=",
            VariableOperator::LessThan => "<",
            VariableOperator::LessThanOrEqual => "<=",
        }
    }
}

impl fmt::Display for VariableOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableOperator::Equals => "EQUALS",
            VariableOperator::NotEquals => "NOT_EQUALS",
            VariableOperator::Like => "LIKE",
            VariableOperator::GreaterThan => "GREATER_THAN",
            VariableOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            VariableOperator::LessThan => "LESS_THAN",
            VariableOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        };
        f.write_str(name)
    }
}

/// Visibility level a variable predicate targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    TaskLocal,
    ProcessInstance,
    CaseExecution,
}

impl VariableScope {
    /// Stored scopes visible to a predicate of this scope
    pub fn visible(self, is_local: bool) -> &'static [VariableScope] {
        match (self, is_local) {
            (VariableScope::TaskLocal, true) => &[VariableScope::TaskLocal],
            (VariableScope::TaskLocal, false) => &[
                VariableScope::TaskLocal,
                VariableScope::ProcessInstance,
                VariableScope::CaseExecution,
            ],
            (VariableScope::ProcessInstance, _) => &[VariableScope::ProcessInstance],
            (VariableScope::CaseExecution, _) => &[VariableScope::CaseExecution],
        }
    }
}

/// A compiled comparison against a named variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVariablePredicate")]
pub struct VariablePredicate {
    name: String,
    value: TypedValue,
    operator: VariableOperator,
    scope: VariableScope,
    is_local: bool,
}

impl VariablePredicate {
    /// Build a predicate from an already tagged value
    pub fn new(
        name: impl Into<String>,
        value: TypedValue,
        operator: VariableOperator,
        scope: VariableScope,
        is_local: bool,
    ) -> Result<Self> {
        let name = name.into();
        check_variable(&name, &value, operator)?;
        Ok(Self {
            name,
            value,
            operator,
            scope,
            is_local,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &TypedValue {
        &self.value
    }

    pub fn operator(&self) -> VariableOperator {
        self.operator
    }

    pub fn scope(&self) -> VariableScope {
        self.scope
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Identity used when merging two predicate lists
    pub fn merge_key(&self) -> (&str, VariableScope, bool) {
        (&self.name, self.scope, self.is_local)
    }

    pub fn matches_name(&self, name: &str, ignore_case: bool) -> bool {
        if ignore_case {
            self.name.to_lowercase() == name.to_lowercase()
        } else {
            self.name == name
        }
    }

    /// Apply the operator to a stored value
    pub fn matches_value(
        &self,
        stored: &TypedValue,
        ignore_case: bool,
        escape: char,
    ) -> std::result::Result<bool, regex::Error> {
        if self.operator == VariableOperator::Like {
            return match (stored, &self.value) {
                (TypedValue::String(s), TypedValue::String(pattern)) => {
                    like_matches(s, pattern, escape, ignore_case)
                }
                _ => Ok(false),
            };
        }

        if self.operator == VariableOperator::NotEquals && self.value == TypedValue::Null {
            return Ok(*stored != TypedValue::Null);
        }

        let ordering = compare_values(stored, &self.value, ignore_case);
        Ok(match self.operator {
            VariableOperator::Equals => ordering == Some(Ordering::Equal),
            VariableOperator::NotEquals => matches!(ordering, Some(o) if o != Ordering::Equal),
            VariableOperator::GreaterThan => ordering == Some(Ordering::Greater),
            VariableOperator::GreaterThanOrEqual => {
                matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
            }
            VariableOperator::LessThan => ordering == Some(Ordering::Less),
            VariableOperator::LessThanOrEqual => {
                matches!(ordering, Some(Ordering::Less | Ordering::Equal))
            }
            VariableOperator::Like => false,
        })
    }
}

/// Wire form of a predicate; deserializing goes through `VariablePredicate::new`
#[derive(Deserialize)]
struct RawVariablePredicate {
    name: String,
    value: TypedValue,
    operator: VariableOperator,
    scope: VariableScope,
    is_local: bool,
}

impl TryFrom<RawVariablePredicate> for VariablePredicate {
    type Error = CriteriaError;

    fn try_from(raw: RawVariablePredicate) -> Result<Self> {
        VariablePredicate::new(raw.name, raw.value, raw.operator, raw.scope, raw.is_local)
    }
}

/// Name, value type and operator restrictions of a variable predicate
pub(crate) fn check_variable(name: &str, value: &TypedValue, operator: VariableOperator) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CriteriaError::InvalidArgument(
            "variable name must not be empty".to_string(),
        ));
    }

    if let TypedValue::Unsupported(kind) = value {
        return Err(CriteriaError::UnsupportedVariableType(
            kind.type_name().to_string(),
        ));
    }

    if value.is_null_or_boolean() && !operator.is_identity() {
        return Err(unsupported_operator(operator, value));
    }

    if operator == VariableOperator::Like && !matches!(value, TypedValue::String(_)) {
        return Err(unsupported_operator(operator, value));
    }
    Ok(())
}

fn unsupported_operator(operator: VariableOperator, value: &TypedValue) -> CriteriaError {
    CriteriaError::UnsupportedOperatorForType {
        operator: operator.to_string(),
        value_type: value.type_name().to_string(),
    }
}
