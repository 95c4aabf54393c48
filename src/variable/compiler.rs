//! Variable predicate compiler

use crate::error::Result;
use crate::value::{DefaultTypeRegistry, RawValue, VariableTypeRegistry};
use crate::variable::{VariableOperator, VariablePredicate, VariableScope};

/// Tags raw values through a registry and builds checked predicates
#[derive(Debug, Clone, Default)]
pub struct VariablePredicateCompiler<R = DefaultTypeRegistry> {
    registry: R,
}

impl<R: VariableTypeRegistry> VariablePredicateCompiler<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// Compile a raw comparison into a `VariablePredicate`
    ///
    /// Fails with `UnsupportedVariableType` for byte, object and file
    /// values regardless of operator, and with `UnsupportedOperatorForType`
    /// when an ordering or LIKE operator is applied to a value that does
    /// not support it.
    pub fn compile(
        &self,
        name: &str,
        raw: RawValue,
        operator: VariableOperator,
        scope: VariableScope,
        is_local: bool,
    ) -> Result<VariablePredicate> {
        let value = self.registry.normalize(raw);
        tracing::trace!(name, %operator, value_type = value.type_name(), "compiling variable predicate");
        VariablePredicate::new(name, value, operator, scope, is_local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CriteriaError;
    use crate::value::{number_value, TypedValue};

    fn compile(raw: RawValue, operator: VariableOperator) -> Result<VariablePredicate> {
        VariablePredicateCompiler::new(DefaultTypeRegistry).compile(
            "v",
            raw,
            operator,
            VariableScope::TaskLocal,
            true,
        )
    }

    #[test]
    fn test_null_and_boolean_reject_ordering() {
        for op in [
            VariableOperator::GreaterThan,
            VariableOperator::GreaterThanOrEqual,
            VariableOperator::LessThan,
            VariableOperator::LessThanOrEqual,
            VariableOperator::Like,
        ] {
            let err = compile(RawValue::Null, op).unwrap_err();
            assert!(matches!(err, CriteriaError::UnsupportedOperatorForType { .. }));
            let err = compile(true.into(), op).unwrap_err();
            assert!(matches!(
                err,
                CriteriaError::UnsupportedOperatorForType { ref value_type, .. } if value_type == "boolean"
            ));
        }
    }

    #[test]
    fn test_null_and_boolean_accept_identity() {
        assert!(compile(RawValue::Null, VariableOperator::Equals).is_ok());
        assert!(compile(false.into(), VariableOperator::NotEquals).is_ok());
    }

    #[test]
    fn test_unsupported_types_rejected_for_every_operator() {
        for op in [
            VariableOperator::Equals,
            VariableOperator::NotEquals,
            VariableOperator::Like,
            VariableOperator::GreaterThan,
        ] {
            let err = compile(vec![0u8, 1].into(), op).unwrap_err();
            assert_eq!(err, CriteriaError::UnsupportedVariableType("bytes".into()));
            let err = compile(RawValue::File { name: "x".into() }, op).unwrap_err();
            assert_eq!(err, CriteriaError::UnsupportedVariableType("file".into()));
            let err = compile(RawValue::Object { type_name: "Pojo".into() }, op).unwrap_err();
            assert_eq!(err, CriteriaError::UnsupportedVariableType("object".into()));
        }
    }

    #[test]
    fn test_like_requires_string() {
        assert!(compile("a%".into(), VariableOperator::Like).is_ok());
        let err = compile(12i32.into(), VariableOperator::Like).unwrap_err();
        assert!(matches!(err, CriteriaError::UnsupportedOperatorForType { .. }));
    }

    #[test]
    fn test_compiled_predicate_carries_tagged_value() {
        let p = compile(number_value(123), VariableOperator::Equals).unwrap();
        assert_eq!(p.name(), "v");
        assert!(matches!(p.value(), TypedValue::Number(_)));
        assert_eq!(p.scope(), VariableScope::TaskLocal);
        assert!(p.is_local());
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = VariablePredicateCompiler::new(DefaultTypeRegistry)
            .compile(" ", 1i32.into(), VariableOperator::Equals, VariableScope::TaskLocal, false)
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidArgument(_)));
    }
}
