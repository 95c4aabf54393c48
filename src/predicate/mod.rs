//! Predicate catalogue and per-group predicate sets

mod dimension;
mod set;

pub use dimension::*;
pub use set::*;
