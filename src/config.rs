//! Compiler and backend configuration

use crate::error::{CriteriaError, Result};
use serde::Deserialize;

/// Settings shared by the compiler, the renderer and the in-memory backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriteriaConfig {
    /// Upper bound for `Page::max_results`
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Escape character for LIKE patterns
    #[serde(default = "default_like_escape")]
    pub like_escape: char,
    /// Expand candidate users to their groups at compile time
    #[serde(default = "default_expand_candidate_groups")]
    pub expand_candidate_groups: bool,
}

fn default_max_results() -> u32 {
    10_000
}

fn default_like_escape() -> char {
    '\\'
}

fn default_expand_candidate_groups() -> bool {
    true
}

impl Default for CriteriaConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            like_escape: default_like_escape(),
            expand_candidate_groups: default_expand_candidate_groups(),
        }
    }
}

impl CriteriaConfig {
    /// Load a configuration from a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_results == 0 {
            return Err(CriteriaError::Config(
                "max_results must be greater than zero".to_string(),
            ));
        }
        if config.like_escape == '%' || config.like_escape == '_' {
            return Err(CriteriaError::Config(format!(
                "'{}' is a LIKE wildcard and cannot be the escape character",
                config.like_escape
            )));
        }
        Ok(config)
    }
}
