//! The bag of predicates attached to one logical group

use crate::predicate::dimension::{Arity, Dimension, Flag, Term};
use crate::tree::LogicalOperator;
use crate::variable::VariablePredicate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

/// Values of one dimension; almost always a single element
pub type TermList = SmallVec<[Term; 1]>;

/// All filters of one expression node
///
/// A literal value and a deferred expression never coexist for the same
/// dimension: setting one clears the other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredicateSet {
    pub(crate) terms: BTreeMap<Dimension, TermList>,
    pub(crate) expressions: BTreeMap<Dimension, String>,
    pub(crate) flags: BTreeSet<Flag>,
    pub(crate) variables: Vec<VariablePredicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a literal value
    ///
    /// Under AND the dimension's list is replaced by the new value; under OR
    /// the value is appended as another alternative. Single-valued
    /// dimensions are overwritten under either operator.
    pub fn set_term(&mut self, dimension: Dimension, term: Term, operator: LogicalOperator) {
        self.expressions.remove(&dimension);

        let replace = dimension.arity() == Arity::Single || operator == LogicalOperator::And;
        let list = self.terms.entry(dimension).or_default();
        if replace {
            list.clear();
        }
        list.push(term);
    }

    /// Record a deferred expression, dropping any literal value
    pub fn set_expression(&mut self, dimension: Dimension, expression: impl Into<String>) {
        self.terms.remove(&dimension);
        self.expressions.insert(dimension, expression.into());
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.flags.insert(flag);
    }

    pub fn add_variable(&mut self, predicate: VariablePredicate) {
        self.variables.push(predicate);
    }

    pub fn terms(&self, dimension: Dimension) -> &[Term] {
        self.terms
            .get(&dimension)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn expression(&self, dimension: Dimension) -> Option<&str> {
        self.expressions.get(&dimension).map(String::as_str)
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn variables(&self) -> &[VariablePredicate] {
        &self.variables
    }

    /// Dimensions with literal values, in dimension order
    pub fn iter_terms(&self) -> impl Iterator<Item = (Dimension, &[Term])> {
        self.terms.iter().map(|(d, list)| (*d, list.as_slice()))
    }

    /// Dimensions with deferred expressions, in dimension order
    pub fn iter_expressions(&self) -> impl Iterator<Item = (Dimension, &str)> {
        self.expressions.iter().map(|(d, e)| (*d, e.as_str()))
    }

    /// Filter flags, excluding modifiers
    pub fn filter_flags(&self) -> impl Iterator<Item = Flag> + '_ {
        self.flags.iter().copied().filter(|f| !f.is_modifier())
    }

    /// A literal value or an expression is present for `dimension`
    pub fn has_predicate(&self, dimension: Dimension) -> bool {
        self.terms.contains_key(&dimension) || self.expressions.contains_key(&dimension)
    }

    /// Any predicate that `include_assigned_tasks` may build on
    pub fn has_candidate_predicate(&self) -> bool {
        Dimension::ALL
            .iter()
            .any(|d| d.is_candidate() && self.has_predicate(*d))
            || self.flags.iter().any(|f| f.is_candidate_related())
    }

    /// True when the set contributes no filter
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
            && self.expressions.is_empty()
            && self.variables.is_empty()
            && self.filter_flags().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{VariableOperator, VariableScope};
    use crate::value::TypedValue;

    fn text(s: &str) -> Term {
        Term::Text(s.to_string())
    }

    #[test]
    fn test_and_replaces() {
        let mut set = PredicateSet::new();
        set.set_term(Dimension::Assignee, text("a"), LogicalOperator::And);
        set.set_term(Dimension::Assignee, text("b"), LogicalOperator::And);
        assert_eq!(set.terms(Dimension::Assignee), &[text("b")]);
    }

    #[test]
    fn test_or_appends() {
        let mut set = PredicateSet::new();
        set.set_term(Dimension::Assignee, text("a"), LogicalOperator::Or);
        set.set_term(Dimension::Assignee, text("b"), LogicalOperator::Or);
        assert_eq!(set.terms(Dimension::Assignee), &[text("a"), text("b")]);
    }

    #[test]
    fn test_single_valued_overwrites_under_or() {
        let mut set = PredicateSet::new();
        set.set_term(Dimension::MinPriority, Term::Int(1), LogicalOperator::Or);
        set.set_term(Dimension::MinPriority, Term::Int(5), LogicalOperator::Or);
        assert_eq!(set.terms(Dimension::MinPriority), &[Term::Int(5)]);
    }

    #[test]
    fn test_literal_and_expression_are_exclusive() {
        let mut set = PredicateSet::new();
        set.set_term(Dimension::Assignee, text("a"), LogicalOperator::And);
        set.set_expression(Dimension::Assignee, "${currentUser()}");
        assert!(set.terms(Dimension::Assignee).is_empty());
        assert_eq!(set.expression(Dimension::Assignee), Some("${currentUser()}"));

        set.set_term(Dimension::Assignee, text("b"), LogicalOperator::And);
        assert_eq!(set.expression(Dimension::Assignee), None);
        assert_eq!(set.terms(Dimension::Assignee), &[text("b")]);
    }

    #[test]
    fn test_modifiers_do_not_count_as_filters() {
        let mut set = PredicateSet::new();
        assert!(set.is_empty());
        set.set_flag(Flag::MatchVariableNamesIgnoreCase);
        assert!(set.is_empty());
        set.set_flag(Flag::Unassigned);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_candidate_detection() {
        let mut set = PredicateSet::new();
        set.set_term(Dimension::Assignee, text("a"), LogicalOperator::And);
        assert!(!set.has_candidate_predicate());
        set.set_expression(Dimension::CandidateGroup, "${group}");
        assert!(set.has_candidate_predicate());

        let mut set = PredicateSet::new();
        set.set_flag(Flag::WithoutCandidateUsers);
        assert!(set.has_candidate_predicate());
    }

    #[test]
    fn test_variables_always_append() {
        let mut set = PredicateSet::new();
        for _ in 0..2 {
            set.add_variable(
                VariablePredicate::new(
                    "v",
                    TypedValue::integer(1),
                    VariableOperator::Equals,
                    VariableScope::TaskLocal,
                    true,
                )
                .unwrap(),
            );
        }
        assert_eq!(set.variables().len(), 2);
        assert!(!set.is_empty());
    }
}
