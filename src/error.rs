//! Error types for the task criteria compiler

use thiserror::Error;

/// Main error type for building, compiling and executing task criteria
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CriteriaError {
    #[error("Invalid query structure: {0}")]
    Structural(String),

    #[error("Ordering not allowed: {0}")]
    OrderingNotAllowed(String),

    #[error("Invalid query usage: {0}")]
    MutualExclusion(String),

    #[error("Invalid query usage: {0}")]
    MissingPrecondition(String),

    #[error("Operator {operator} is not supported for {value_type} values")]
    UnsupportedOperatorForType {
        operator: String,
        value_type: String,
    },

    #[error("Variables of type {0} cannot be used to query")]
    UnsupportedVariableType(String),

    #[error("At least one filter must be defined within a nested group")]
    EmptyGroup,

    #[error("Compiled query could not be executed")]
    CompiledQuery,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for CriteriaError {
    fn from(err: serde_json::Error) -> Self {
        CriteriaError::Config(err.to_string())
    }
}

/// Result type alias for the task criteria compiler
pub type Result<T> = std::result::Result<T, CriteriaError>;
