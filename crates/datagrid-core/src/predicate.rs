//! In-memory evaluation of filter operators
//!
//! Used by the array data source and by conditional styles. How values
//! compare depends on a [`CompareMode`]: filters on a typed column compare
//! the way a SQL backend would, conditional styles compare loosely. A NULL
//! or missing cell reads as the empty string. LIKE variants ignore case.

use std::cmp::Ordering;

use crate::{Column, FilterOperator, GridError, Result, Value, compare_loose, parse_number};

/// How a cell is compared against filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMode {
    /// Numeric when both sides read as numbers, text otherwise
    Loose,
    /// Numeric; a cell that is not a number never satisfies an ordering
    Numeric,
    /// Byte-wise text
    Text,
}

impl CompareMode {
    pub fn for_column(column: &Column) -> Self {
        if column.value_type.is_number() {
            Self::Numeric
        } else {
            Self::Text
        }
    }

    fn equal(self, a: &str, b: &str) -> bool {
        match self {
            Self::Loose | Self::Numeric => loose_eq(a, b),
            Self::Text => a == b,
        }
    }

    fn order(self, a: &str, b: &str) -> Option<Ordering> {
        match self {
            Self::Loose => Some(compare_loose(a, b)),
            Self::Numeric => parse_number(a)?.partial_cmp(&parse_number(b)?),
            Self::Text => Some(a.cmp(b)),
        }
    }
}

/// Test a single cell with loose comparison, see [`matches_with`]
pub fn matches_value(operator: &FilterOperator, values: &[String], cell: &Value) -> Result<bool> {
    matches_with(CompareMode::Loose, operator, values, cell)
}

/// Test a single cell against an operator and its value list.
///
/// Multiple values are ORed, except NOT_IN (must differ from all) and
/// BETWEEN (one inclusive range).
pub fn matches_with(
    mode: CompareMode,
    operator: &FilterOperator,
    values: &[String],
    cell: &Value,
) -> Result<bool> {
    let text = cell.to_string();
    let ordered = |v: &str, accept: fn(Ordering) -> bool| mode.order(&text, v).is_some_and(accept);

    let matched = match operator {
        FilterOperator::Like => any(values, |v| contains_ci(&text, v)),
        FilterOperator::LikeLeft => any(values, |v| ends_with_ci(&text, v)),
        FilterOperator::LikeRight => any(values, |v| starts_with_ci(&text, v)),
        FilterOperator::NotLike => any(values, |v| !contains_ci(&text, v)),
        FilterOperator::NotLikeLeft => any(values, |v| !ends_with_ci(&text, v)),
        FilterOperator::NotLikeRight => any(values, |v| !starts_with_ci(&text, v)),
        FilterOperator::Equal | FilterOperator::In => any(values, |v| mode.equal(&text, v)),
        FilterOperator::NotEqual => any(values, |v| !mode.equal(&text, v)),
        FilterOperator::NotIn => values.iter().all(|v| !mode.equal(&text, v)),
        FilterOperator::GreaterEqual => any(values, |v| ordered(v, Ordering::is_ge)),
        FilterOperator::Greater => any(values, |v| ordered(v, Ordering::is_gt)),
        FilterOperator::LessEqual => any(values, |v| ordered(v, Ordering::is_le)),
        FilterOperator::Less => any(values, |v| ordered(v, Ordering::is_lt)),
        FilterOperator::Between => {
            let min = values.first().map(String::as_str).unwrap_or("");
            let max = values.get(1).map(String::as_str).unwrap_or(min);
            ordered(min, Ordering::is_ge) && ordered(max, Ordering::is_le)
        }
        FilterOperator::Other(raw) => return Err(GridError::UnsupportedOperator(raw.clone())),
    };

    Ok(matched)
}

fn any(values: &[String], test: impl Fn(&str) -> bool) -> bool {
    values.iter().any(|v| test(v))
}

/// `==` on text, numeric when both sides are numbers
pub fn loose_eq(a: &str, b: &str) -> bool {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().starts_with(&needle.to_lowercase())
}

fn ends_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().ends_with(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(op: FilterOperator, values: &[&str], cell: impl Into<Value>) -> bool {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        matches_value(&op, &values, &cell.into()).unwrap()
    }

    #[test]
    fn like_family_ignores_case() {
        assert!(check(FilterOperator::Like, &["ell"], "Hello"));
        assert!(check(FilterOperator::LikeLeft, &["LO"], "Hello"));
        assert!(check(FilterOperator::LikeRight, &["he"], "Hello"));
        assert!(!check(FilterOperator::NotLike, &["ell"], "Hello"));
        assert!(check(FilterOperator::NotLikeRight, &["x"], "Hello"));
    }

    #[test]
    fn equality_is_loose() {
        assert!(check(FilterOperator::Equal, &["85"], 85i64));
        assert!(check(FilterOperator::Equal, &["85.0"], "85"));
        assert!(!check(FilterOperator::Equal, &["abc"], "ABC"));
        assert!(check(FilterOperator::Equal, &["x", "y"], "y"));
    }

    #[test]
    fn not_in_requires_all_to_differ() {
        assert!(!check(FilterOperator::NotIn, &["a", "b"], "b"));
        assert!(check(FilterOperator::NotIn, &["a", "b"], "c"));
        assert!(check(FilterOperator::NotEqual, &["a", "b"], "b"));
    }

    #[test]
    fn comparisons_are_numeric_for_numbers() {
        assert!(check(FilterOperator::GreaterEqual, &["85"], 85i64));
        assert!(check(FilterOperator::Greater, &["9"], 10i64));
        assert!(!check(FilterOperator::Less, &["9"], 10i64));
        assert!(check(FilterOperator::LessEqual, &["b"], "abc"));
    }

    #[test]
    fn between_is_inclusive() {
        assert!(check(FilterOperator::Between, &["15", "30"], 15i64));
        assert!(check(FilterOperator::Between, &["15", "30"], 30i64));
        assert!(!check(FilterOperator::Between, &["15", "30"], 31i64));
        assert!(check(FilterOperator::Between, &["15"], 15i64));
    }

    #[test]
    fn missing_value_compares_as_empty() {
        assert!(check(FilterOperator::Equal, &[""], Value::Null));
        assert!(!check(FilterOperator::Like, &["a"], Value::Null));
    }

    fn check_with(mode: CompareMode, op: FilterOperator, values: &[&str], cell: Value) -> bool {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        matches_with(mode, &op, &values, &cell).unwrap()
    }

    #[test]
    fn text_mode_orders_digits_as_text() {
        assert!(!check_with(CompareMode::Text, FilterOperator::Greater, &["5"], "10".into()));
        assert!(check_with(CompareMode::Text, FilterOperator::Greater, &["5"], "9".into()));
        assert!(!check_with(CompareMode::Text, FilterOperator::Equal, &["85.0"], "85".into()));
        assert!(check_with(CompareMode::Text, FilterOperator::Less, &["a"], Value::Null));
    }

    #[test]
    fn numeric_mode_skips_non_numbers() {
        assert!(check_with(CompareMode::Numeric, FilterOperator::Greater, &["5"], 10i64.into()));
        assert!(!check_with(CompareMode::Numeric, FilterOperator::Less, &["5"], Value::Null));
        assert!(!check_with(CompareMode::Numeric, FilterOperator::Between, &["1", "9"], "x".into()));
        assert!(check_with(CompareMode::Numeric, FilterOperator::NotEqual, &["5"], Value::Null));
    }

    #[test]
    fn mode_follows_column_type() {
        use crate::{NumberType, ValueType};

        let title = Column::select("title", None);
        let vol = Column::select("vol", None).with_type(ValueType::Number(NumberType::default()));
        assert_eq!(CompareMode::for_column(&title), CompareMode::Text);
        assert_eq!(CompareMode::for_column(&vol), CompareMode::Numeric);
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = matches_value(
            &FilterOperator::Other("xyz".into()),
            &["1".to_string()],
            &Value::Null,
        )
        .unwrap_err();
        assert!(err.to_string().contains("xyz"));
    }
}
