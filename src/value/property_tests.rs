//! Property tests for value comparison
//!
//! Numeric equality is representation-insensitive but never wraps.

use proptest::prelude::*;
use std::cmp::Ordering;

use crate::value::compare::{compare_numeric, compare_values};
use crate::value::{Numeric, TypedValue};

proptest! {
    /// A query number equals every stored representation of the same value
    #[test]
    fn prop_numeric_equality_is_width_insensitive(v in any::<i16>()) {
        let query = TypedValue::Number(Numeric::Int(i64::from(v)));
        let stored = [
            TypedValue::short(v),
            TypedValue::integer(i32::from(v)),
            TypedValue::long(i64::from(v)),
            TypedValue::Double(f64::from(v)),
        ];
        for s in &stored {
            prop_assert_eq!(compare_values(s, &query, false), Some(Ordering::Equal));
        }
    }

    /// Out-of-range queries never match a narrow stored value
    #[test]
    fn prop_no_false_positive_from_narrowing(v in any::<i16>(), k in 1i64..1000) {
        let wide = i64::from(v) + k * 65_536;
        let query = TypedValue::Number(Numeric::Int(wide));
        prop_assert_ne!(compare_values(&TypedValue::short(v), &query, false), Some(Ordering::Equal));
    }

    /// A fractional query never equals an integer stored value
    #[test]
    fn prop_fraction_never_matches_integer(i in -1_000_000i64..1_000_000, frac in 0.01f64..0.99) {
        let query = TypedValue::Number(Numeric::Float(i as f64 + frac));
        prop_assert_eq!(compare_values(&TypedValue::long(i), &query, false), Some(Ordering::Less));
    }

    /// Mixed int/float ordering agrees with exact arithmetic on small values
    #[test]
    fn prop_mixed_ordering_matches_f64(i in -1_000_000i64..1_000_000, f in -1.0e6f64..1.0e6) {
        let expected = (i as f64).partial_cmp(&f);
        prop_assert_eq!(compare_numeric(Numeric::Int(i), Numeric::Float(f)), expected);
        prop_assert_eq!(
            compare_numeric(Numeric::Float(f), Numeric::Int(i)),
            expected.map(Ordering::reverse)
        );
    }
}
