//! Value comparison - exact numeric ordering and cached LIKE matching

use crate::value::{Numeric, TypedValue};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::cmp::Ordering;

/// 2^63 as f64; every f64 at or above it is beyond i64::MAX
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Order a stored value against a query value
///
/// Returns `None` when the two values belong to different type families.
/// Integer widths order against each other, and an untyped `Number`
/// orders against every numeric family. Integer and float values are
/// compared exactly, without narrowing either side.
pub fn compare_values(stored: &TypedValue, query: &TypedValue, ignore_case: bool) -> Option<Ordering> {
    match (stored, query) {
        (TypedValue::Null, TypedValue::Null) => Some(Ordering::Equal),
        (TypedValue::Boolean(a), TypedValue::Boolean(b)) => Some(a.cmp(b)),
        (TypedValue::String(a), TypedValue::String(b)) => {
            if ignore_case {
                Some(a.to_lowercase().cmp(&b.to_lowercase()))
            } else {
                Some(a.cmp(b))
            }
        }
        (TypedValue::Integer64 { value: a, .. }, TypedValue::Integer64 { value: b, .. }) => {
            Some(a.cmp(b))
        }
        (TypedValue::Double(a), TypedValue::Double(b)) => a.partial_cmp(b),
        (TypedValue::Date(a), TypedValue::Date(b)) => Some(a.cmp(b)),
        (stored, TypedValue::Number(n)) => as_numeric(stored).and_then(|s| compare_numeric(s, *n)),
        _ => None,
    }
}

fn as_numeric(value: &TypedValue) -> Option<Numeric> {
    match value {
        TypedValue::Integer64 { value, .. } => Some(Numeric::Int(*value)),
        TypedValue::Double(d) => Some(Numeric::Float(*d)),
        TypedValue::Number(n) => Some(*n),
        _ => None,
    }
}

/// Exact ordering between two numbers of any representation
pub fn compare_numeric(a: Numeric, b: Numeric) -> Option<Ordering> {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => Some(x.cmp(&y)),
        (Numeric::Float(x), Numeric::Float(y)) => x.partial_cmp(&y),
        (Numeric::Int(x), Numeric::Float(f)) => compare_int_float(x, f),
        (Numeric::Float(f), Numeric::Int(x)) => compare_int_float(x, f).map(Ordering::reverse),
    }
}

fn compare_int_float(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f >= I64_UPPER_BOUND {
        return Some(Ordering::Less);
    }
    if f < -I64_UPPER_BOUND {
        return Some(Ordering::Greater);
    }

    // f is now within i64 range, so its integral part converts without loss
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => {
            let fraction = f - whole;
            if fraction > 0.0 {
                Some(Ordering::Less)
            } else if fraction < 0.0 {
                Some(Ordering::Greater)
            } else {
                Some(Ordering::Equal)
            }
        }
        other => Some(other),
    }
}

/// Patterns held before the cache is cleared
pub const LIKE_CACHE_CAPACITY: usize = 1024;

/// Compiled LIKE patterns, keyed by flags, escape character and pattern
static LIKE_CACHE: Lazy<RwLock<AHashMap<String, Regex>>> = Lazy::new(|| {
    let map = AHashMap::with_capacity(256);
    RwLock::new(map)
});

/// Match `value` against an SQL LIKE pattern (`%` and `_` wildcards)
pub fn like_matches(
    value: &str,
    pattern: &str,
    escape: char,
    ignore_case: bool,
) -> Result<bool, regex::Error> {
    let key = format!("{}{}{}", u8::from(ignore_case), escape, pattern);

    {
        let cache = LIKE_CACHE.read();
        if let Some(regex) = cache.get(&key) {
            return Ok(regex.is_match(value));
        }
    }

    let regex = Regex::new(&like_to_regex(pattern, escape, ignore_case))?;
    let matched = regex.is_match(value);

    {
        let mut cache = LIKE_CACHE.write();
        if cache.len() >= LIKE_CACHE_CAPACITY {
            tracing::debug!(patterns = cache.len(), "like cache full, clearing");
            cache.clear();
        }
        cache.insert(key, regex);
    }

    Ok(matched)
}

fn like_to_regex(pattern: &str, escape: char, ignore_case: bool) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str(if ignore_case { "(?is)^" } else { "(?s)^" });

    let mut chars = pattern.chars();
    let mut buf = [0u8; 4];
    while let Some(c) = chars.next() {
        if c == escape {
            // a trailing escape character matches itself
            let literal = chars.next().unwrap_or(escape);
            out.push_str(&regex::escape(literal.encode_utf8(&mut buf)));
        } else if c == '%' {
            out.push_str(".*");
        } else if c == '_' {
            out.push('.');
        } else {
            out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }

    out.push('$');
    out
}

/// Drop every cached LIKE pattern
pub fn clear_like_cache() {
    LIKE_CACHE.write().clear();
}

/// Number of cached LIKE patterns
pub fn like_cache_size() -> usize {
    LIKE_CACHE.read().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_cross_width_integer_equality() {
        let query = TypedValue::Number(Numeric::Int(123));
        for stored in [
            TypedValue::short(123),
            TypedValue::integer(123),
            TypedValue::long(123),
            TypedValue::Double(123.0),
        ] {
            assert_eq!(compare_values(&stored, &query, false), Some(Ordering::Equal));
        }
    }

    #[test]
    fn test_fraction_never_equals_integer() {
        let query = TypedValue::Number(Numeric::Float(42.4));
        let ordering = compare_values(&TypedValue::integer(42), &query, false);
        assert_eq!(ordering, Some(Ordering::Less));

        let query = TypedValue::Number(Numeric::Int(42));
        let ordering = compare_values(&TypedValue::Double(42.4), &query, false);
        assert_eq!(ordering, Some(Ordering::Greater));
    }

    #[test]
    fn test_no_wrapping_on_out_of_range_query() {
        // 65659 would wrap to 123 when narrowed to a short
        let query = TypedValue::Number(Numeric::Int(65_659));
        let ordering = compare_values(&TypedValue::short(123), &query, false);
        assert_eq!(ordering, Some(Ordering::Less));

        let query = TypedValue::Number(Numeric::Float(1e19));
        let ordering = compare_values(&TypedValue::long(i64::MAX), &query, false);
        assert_eq!(ordering, Some(Ordering::Less));
    }

    #[test]
    fn test_type_families_do_not_mix() {
        assert_eq!(
            compare_values(&TypedValue::integer(1), &TypedValue::Double(1.0), false),
            None
        );
        assert_eq!(
            compare_values(&TypedValue::String("1".into()), &TypedValue::integer(1), false),
            None
        );
        assert_eq!(
            compare_values(&TypedValue::Boolean(true), &TypedValue::Number(Numeric::Int(1)), false),
            None
        );
    }

    #[test]
    fn test_string_and_date_ordering() {
        let a = TypedValue::String("Kermit".into());
        let b = TypedValue::String("kermit".into());
        assert_ne!(compare_values(&a, &b, false), Some(Ordering::Equal));
        assert_eq!(compare_values(&a, &b, true), Some(Ordering::Equal));

        let early = TypedValue::Date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let late = TypedValue::Date(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(compare_values(&early, &late, false), Some(Ordering::Less));
    }

    #[test]
    fn test_nan_is_unordered() {
        let query = TypedValue::Number(Numeric::Float(f64::NAN));
        assert_eq!(compare_values(&TypedValue::integer(1), &query, false), None);
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like_matches("kermit", "ker%", '\\', false).unwrap());
        assert!(like_matches("kermit", "k_rmit", '\\', false).unwrap());
        assert!(!like_matches("kermit", "k_mit", '\\', false).unwrap());
        assert!(like_matches("a.b", "a.b", '\\', false).unwrap());
        assert!(!like_matches("axb", "a.b", '\\', false).unwrap());
        assert!(like_matches("KERMIT", "ker%", '\\', true).unwrap());
    }

    #[test]
    fn test_like_escape() {
        assert!(like_matches("100%", "100\\%", '\\', false).unwrap());
        assert!(!like_matches("1000", "100\\%", '\\', false).unwrap());
        assert!(like_matches("a_b", "a!_b", '!', false).unwrap());
        assert!(!like_matches("axb", "a!_b", '!', false).unwrap());
    }

    #[test]
    fn test_like_cache_hit() {
        assert!(like_matches("cached-x", "cached-%", '\\', false).unwrap());
        assert!(like_matches("cached-y", "cached-%", '\\', false).unwrap());
        assert!(!like_matches("other", "cached-%", '\\', false).unwrap());
    }

    #[test]
    fn test_like_cache_is_bounded() {
        for i in 0..LIKE_CACHE_CAPACITY * 3 {
            assert!(like_matches("p1x", &format!("p{}%", i), '\\', false).is_ok());
            assert!(like_cache_size() <= LIKE_CACHE_CAPACITY);
        }
        clear_like_cache();
        assert!(like_matches("p1x", "p1%", '\\', false).unwrap());
    }
}
