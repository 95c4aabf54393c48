//! Rendering compiled criteria to a parameterized WHERE clause

use crate::compile::CompiledCriteria;
use crate::predicate::{Comparison, Dimension, Flag, PredicateSet, SuspensionState, Term};
use crate::tree::{ExpressionNode, NodeId};
use crate::value::{IntegerWidth, Numeric, TypedValue};
use crate::variable::{VariableOperator, VariablePredicate, VariableScope};
use chrono::{DateTime, Utc};
use serde::Serialize;

const IDENTITY_LINK: &str =
    "SELECT 1 FROM ACT_RU_IDENTITYLINK I WHERE I.TASK_ID_ = RES.ID_";
const CANDIDATE_LINK: &str =
    "SELECT 1 FROM ACT_RU_IDENTITYLINK I WHERE I.TASK_ID_ = RES.ID_ AND I.TYPE_ = 'candidate'";

/// Bound parameter of a rendered clause
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Param {
    Text(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    /// Resolved by the backend's expression resolver
    Expression(String),
}

/// WHERE clause with `?` placeholders and their parameters in order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SqlFragment {
    pub where_clause: String,
    pub params: Vec<Param>,
}

impl CompiledCriteria {
    /// Render the criteria as a parameterized WHERE clause
    ///
    /// The root's own predicates are emitted bare. Every nested group opens
    /// with "(" and is closed by the planned closings after its last leaf.
    pub fn render(&self) -> SqlFragment {
        let mut params = Vec::new();
        let tree = self.tree();
        let root = tree.node(NodeId::ROOT);
        let root_fragment = self.node_fragment(root, &mut params);

        let mut out = root_fragment.clone().unwrap_or_default();
        let mut own_fragments = vec![root_fragment.is_some()];
        own_fragments.resize(tree.len(), false);

        for (id, closing) in self.groups().iter().zip(self.closings()) {
            let node = tree.node(*id);
            let Some(parent_id) = node.parent() else {
                continue;
            };
            let parent = tree.node(parent_id);
            let is_first_child = parent.children().first() == Some(id);
            if own_fragments[parent_id.index()] || !is_first_child {
                out.push(' ');
                out.push_str(parent.operator().sql());
                out.push(' ');
            }
            out.push('(');
            if let Some(fragment) = self.node_fragment(node, &mut params) {
                own_fragments[id.index()] = true;
                out.push_str(&fragment);
            }
            out.push_str(&")".repeat(closing.count()));
        }

        SqlFragment {
            where_clause: out,
            params,
        }
    }

    fn node_fragment(&self, node: &ExpressionNode, params: &mut Vec<Param>) -> Option<String> {
        let set = node.predicates();
        let mut parts = Vec::new();

        for (dimension, terms) in set.iter_terms() {
            for term in terms {
                parts.push(self.term_fragment(set, dimension, term, params));
            }
        }
        for (dimension, expression) in set.iter_expressions() {
            parts.push(self.expression_fragment(set, dimension, expression, params));
        }
        for flag in set.filter_flags() {
            parts.push(flag_fragment(set, flag));
        }
        for variable in set.variables() {
            parts.push(self.variable_fragment(set, variable, params));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(&format!(" {} ", node.operator().sql())))
        }
    }

    fn term_fragment(
        &self,
        set: &PredicateSet,
        dimension: Dimension,
        term: &Term,
        params: &mut Vec<Param>,
    ) -> String {
        let start = params.len();
        push_term_params(term, params);
        let marks = placeholders(params.len() - start);
        match dimension {
            Dimension::CandidateUser => {
                let user = match term {
                    Term::Text(u) => u.as_str(),
                    _ => "",
                };
                let groups = self.candidate_groups_of(user);
                let link = if groups.is_empty() {
                    "I.USER_ID_ = ?".to_string()
                } else {
                    params.extend(groups.iter().cloned().map(Param::Text));
                    format!("(I.USER_ID_ = ? OR I.GROUP_ID_ IN ({}))", placeholders(groups.len()))
                };
                candidate_clause(set, &link)
            }
            Dimension::CandidateGroup => candidate_clause(set, "I.GROUP_ID_ = ?"),
            Dimension::CandidateGroupIn => {
                candidate_clause(set, &format!("I.GROUP_ID_ IN ({})", marks))
            }
            _ => self.column_fragment(dimension, &marks, params, start),
        }
    }

    fn expression_fragment(
        &self,
        set: &PredicateSet,
        dimension: Dimension,
        expression: &str,
        params: &mut Vec<Param>,
    ) -> String {
        let start = params.len();
        params.push(Param::Expression(expression.to_string()));
        match dimension {
            Dimension::CandidateUser => candidate_clause(set, "I.USER_ID_ = ?"),
            Dimension::CandidateGroup => candidate_clause(set, "I.GROUP_ID_ = ?"),
            Dimension::CandidateGroupIn => candidate_clause(set, "I.GROUP_ID_ IN (?)"),
            _ => self.column_fragment(dimension, "?", params, start),
        }
    }

    fn column_fragment(
        &self,
        dimension: Dimension,
        marks: &str,
        params: &mut Vec<Param>,
        start: usize,
    ) -> String {
        let column = dimension.field().column();
        match dimension.comparison() {
            Comparison::Eq => format!("{} = {}", column, marks),
            Comparison::Ne => format!("{} <> {}", column, marks),
            Comparison::Like => format!("{} LIKE {} ESCAPE '{}'", column, marks, self.like_escape()),
            Comparison::NotLike => {
                format!("{} NOT LIKE {} ESCAPE '{}'", column, marks, self.like_escape())
            }
            Comparison::In => format!("{} IN ({})", column, marks),
            Comparison::NotIn => format!("{} NOT IN ({})", column, marks),
            Comparison::Lt => format!("{} < {}", column, marks),
            Comparison::Gt => format!("{} > {}", column, marks),
            Comparison::Ge => format!("{} >= {}", column, marks),
            Comparison::Le => format!("{} <= {}", column, marks),
            Comparison::Involved => {
                if let Some(user) = params.get(start).cloned() {
                    params.push(user.clone());
                    params.push(user);
                }
                format!(
                    "(RES.ASSIGNEE_ = ? OR RES.OWNER_ = ? OR EXISTS ({} AND I.USER_ID_ = ?))",
                    IDENTITY_LINK
                )
            }
            Comparison::Candidate => format!("EXISTS ({} AND {} = ?)", CANDIDATE_LINK, column),
        }
    }

    fn variable_fragment(
        &self,
        set: &PredicateSet,
        variable: &VariablePredicate,
        params: &mut Vec<Param>,
    ) -> String {
        let scope = scope_condition(variable.scope(), variable.is_local());
        let name = if set.has_flag(Flag::MatchVariableNamesIgnoreCase) {
            "UPPER(V.NAME_) = UPPER(?)"
        } else {
            "V.NAME_ = ?"
        };
        params.push(Param::Text(variable.name().to_string()));

        let op = variable.operator();
        let ignore_case = set.has_flag(Flag::MatchVariableValuesIgnoreCase);
        let value = match variable.value() {
            TypedValue::Null => {
                if op == VariableOperator::NotEquals {
                    "V.TYPE_ <> 'null'".to_string()
                } else {
                    "V.TYPE_ = 'null'".to_string()
                }
            }
            TypedValue::Boolean(b) => {
                params.push(Param::Bool(*b));
                format!("V.TYPE_ = 'boolean' AND V.LONG_ {} ?", op.sql())
            }
            TypedValue::String(s) => {
                params.push(Param::Text(s.clone()));
                let escape = if op == VariableOperator::Like {
                    format!(" ESCAPE '{}'", self.like_escape())
                } else {
                    String::new()
                };
                if ignore_case {
                    format!("V.TYPE_ = 'string' AND UPPER(V.TEXT_) {} UPPER(?){}", op.sql(), escape)
                } else {
                    format!("V.TYPE_ = 'string' AND V.TEXT_ {} ?{}", op.sql(), escape)
                }
            }
            TypedValue::Integer64 { value, .. } => {
                params.push(Param::Int(*value));
                format!(
                    "V.TYPE_ IN ('{}', '{}', '{}') AND V.LONG_ {} ?",
                    IntegerWidth::Short.type_name(),
                    IntegerWidth::Integer.type_name(),
                    IntegerWidth::Long.type_name(),
                    op.sql()
                )
            }
            TypedValue::Double(d) => {
                params.push(Param::Double(*d));
                format!("V.TYPE_ = 'double' AND V.DOUBLE_ {} ?", op.sql())
            }
            TypedValue::Number(n) => {
                params.push(match n {
                    Numeric::Int(i) => Param::Int(*i),
                    Numeric::Float(f) => Param::Double(*f),
                });
                format!(
                    "V.TYPE_ IN ('short', 'integer', 'long', 'double') AND COALESCE(V.LONG_, V.DOUBLE_) {} ?",
                    op.sql()
                )
            }
            TypedValue::Date(d) => {
                params.push(Param::Date(*d));
                format!("V.TYPE_ = 'date' AND V.LONG_ {} ?", op.sql())
            }
            // rejected by check_variable before rendering
            TypedValue::Unsupported(_) => "1 = 0".to_string(),
        };

        format!(
            "EXISTS (SELECT 1 FROM ACT_RU_VARIABLE V WHERE {} AND {} AND {})",
            scope, name, value
        )
    }
}

fn push_term_params(term: &Term, params: &mut Vec<Param>) {
    match term {
        Term::Text(s) => params.push(Param::Text(s.clone())),
        Term::TextSet(values) => params.extend(values.iter().cloned().map(Param::Text)),
        Term::Int(i) => params.push(Param::Int(i64::from(*i))),
        Term::Date(d) => params.push(Param::Date(*d)),
        Term::Suspension(state) => params.push(Param::Int(match state {
            SuspensionState::Active => 1,
            SuspensionState::Suspended => 2,
        })),
        Term::Delegation(state) => params.push(Param::Text(state.as_str().to_string())),
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Positive candidate predicates only see unassigned tasks unless the node
/// includes assigned tasks
fn candidate_clause(set: &PredicateSet, link: &str) -> String {
    let exists = format!("EXISTS ({} AND {})", CANDIDATE_LINK, link);
    if set.has_flag(Flag::IncludeAssignedTasks) {
        exists
    } else {
        format!("(RES.ASSIGNEE_ IS NULL AND {})", exists)
    }
}

fn flag_fragment(set: &PredicateSet, flag: Flag) -> String {
    match flag {
        Flag::Unassigned => "RES.ASSIGNEE_ IS NULL".to_string(),
        Flag::Assigned => "RES.ASSIGNEE_ IS NOT NULL".to_string(),
        Flag::WithCandidateGroups => candidate_clause(set, "I.GROUP_ID_ IS NOT NULL"),
        Flag::WithCandidateUsers => candidate_clause(set, "I.USER_ID_ IS NOT NULL"),
        Flag::WithoutCandidateGroups => {
            format!("NOT EXISTS ({} AND I.GROUP_ID_ IS NOT NULL)", CANDIDATE_LINK)
        }
        Flag::WithoutCandidateUsers => {
            format!("NOT EXISTS ({} AND I.USER_ID_ IS NOT NULL)", CANDIDATE_LINK)
        }
        Flag::WithoutTenantId => "RES.TENANT_ID_ IS NULL".to_string(),
        Flag::WithoutDueDate => "RES.DUE_DATE_ IS NULL".to_string(),
        Flag::IncludeAssignedTasks
        | Flag::MatchVariableNamesIgnoreCase
        | Flag::MatchVariableValuesIgnoreCase => String::new(),
    }
}

fn scope_condition(scope: VariableScope, is_local: bool) -> &'static str {
    match (scope, is_local) {
        (VariableScope::TaskLocal, true) => "V.TASK_ID_ = RES.ID_",
        (VariableScope::TaskLocal, false) => {
            "(V.TASK_ID_ = RES.ID_ OR V.EXECUTION_ID_ = RES.PROC_INST_ID_ \
             OR V.CASE_EXECUTION_ID_ = RES.CASE_EXECUTION_ID_)"
        }
        (VariableScope::ProcessInstance, _) => {
            "V.TASK_ID_ IS NULL AND V.EXECUTION_ID_ = RES.PROC_INST_ID_"
        }
        (VariableScope::CaseExecution, _) => {
            "V.TASK_ID_ IS NULL AND V.CASE_EXECUTION_ID_ = RES.CASE_EXECUTION_ID_"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CriteriaConfig;
    use crate::executor::StaticIdentityResolver;
    use crate::query::TaskQuery;
    use crate::value::number_value;

    fn render(query: &TaskQuery) -> SqlFragment {
        render_with(query, &StaticIdentityResolver::new())
    }

    fn render_with(query: &TaskQuery, identity: &StaticIdentityResolver) -> SqlFragment {
        query
            .compile(identity, &CriteriaConfig::default())
            .unwrap()
            .render()
    }

    fn count(s: &str, c: char) -> usize {
        s.chars().filter(|x| *x == c).count()
    }

    #[test]
    fn test_root_only() {
        let mut query = TaskQuery::new();
        query.assignee("kermit").min_priority(10);
        let sql = render(&query);
        assert_eq!(sql.where_clause, "RES.ASSIGNEE_ = ? AND RES.PRIORITY_ >= ?");
        assert_eq!(sql.params, vec![Param::Text("kermit".into()), Param::Int(10)]);
    }

    #[test]
    fn test_empty_query_renders_nothing() {
        let sql = render(&TaskQuery::new());
        assert!(sql.where_clause.is_empty());
        assert!(sql.params.is_empty());
    }

    #[test]
    fn test_or_group_accumulates_alternatives() {
        let mut query = TaskQuery::new();
        query
            .task_definition_key("approve")
            .start_or()
            .assignee("kermit")
            .assignee("gonzo")
            .end_or()
            .unwrap();
        let sql = render(&query);
        assert_eq!(
            sql.where_clause,
            "RES.TASK_DEF_KEY_ = ? AND (RES.ASSIGNEE_ = ? OR RES.ASSIGNEE_ = ?)"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn test_nested_groups_close_after_last_leaf() {
        let mut query = TaskQuery::new();
        query
            .start_or()
            .name("a")
            .start_and()
            .priority(1)
            .owner("o")
            .end_and()
            .unwrap()
            .start_and()
            .priority(2)
            .end_and()
            .unwrap()
            .end_or()
            .unwrap();
        let sql = render(&query);
        assert_eq!(
            sql.where_clause,
            "(RES.NAME_ = ? OR (RES.OWNER_ = ? AND RES.PRIORITY_ = ?) OR (RES.PRIORITY_ = ?))"
        );
        assert_eq!(count(&sql.where_clause, '('), count(&sql.where_clause, ')'));
    }

    #[test]
    fn test_sibling_groups_without_own_predicates() {
        let mut query = TaskQuery::new();
        query
            .start_or()
            .name("a")
            .end_or()
            .unwrap()
            .start_or()
            .name("b")
            .end_or()
            .unwrap();
        let sql = render(&query);
        assert_eq!(sql.where_clause, "(RES.NAME_ = ?) AND (RES.NAME_ = ?)");
    }

    #[test]
    fn test_candidate_user_expansion() {
        let identity = StaticIdentityResolver::new().with_membership("kermit", "management");
        let mut query = TaskQuery::new();
        query.candidate_user("kermit").unwrap();
        let sql = render_with(&query, &identity);
        assert!(sql.where_clause.starts_with("(RES.ASSIGNEE_ IS NULL AND EXISTS"));
        assert!(sql.where_clause.contains("(I.USER_ID_ = ? OR I.GROUP_ID_ IN (?))"));
        assert_eq!(
            sql.params,
            vec![Param::Text("kermit".into()), Param::Text("management".into())]
        );

        query.include_assigned_tasks().unwrap();
        let sql = render_with(&query, &identity);
        assert!(sql.where_clause.starts_with("EXISTS"));
    }

    #[test]
    fn test_expressions_become_parameters() {
        let mut query = TaskQuery::new();
        query.assignee_in_expression("${candidates}");
        let sql = render(&query);
        assert_eq!(sql.where_clause, "RES.ASSIGNEE_ IN (?)");
        assert_eq!(sql.params, vec![Param::Expression("${candidates}".into())]);
    }

    #[test]
    fn test_variable_fragment() {
        let mut query = TaskQuery::new();
        query
            .match_variable_values_ignore_case()
            .process_variable("customer", VariableOperator::Like, "acme%")
            .unwrap()
            .variable_value_equals("amount", number_value(5))
            .unwrap();
        let sql = render(&query);
        assert!(sql.where_clause.contains("UPPER(V.TEXT_) LIKE UPPER(?) ESCAPE '\\'"));
        assert!(sql.where_clause.contains("COALESCE(V.LONG_, V.DOUBLE_) = ?"));
        assert_eq!(sql.params.len(), 4);
    }

    #[test]
    fn test_set_dimension_placeholders() {
        let mut query = TaskQuery::new();
        query.tenant_id_in(["a", "b", "c"]).unwrap();
        let sql = render(&query);
        assert_eq!(sql.where_clause, "RES.TENANT_ID_ IN (?, ?, ?)");
    }
}
