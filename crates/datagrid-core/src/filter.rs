//! Filter model and the filter expression parser
//!
//! Users type compact filter strings into a column's filter box. The parser
//! turns them into an operator plus a list of values:
//!
//! ```text
//! ~foo*     LIKE_RIGHT  ["foo"]
//! !~bar     NOT_LIKE    ["bar"]
//! >=5       GREATER_EQUAL ["5"]
//! 15<>30    BETWEEN     ["15", "30"]
//! =(a,b)    IN          ["a", "b"]
//! red,blue  <column default> ["red", "blue"]
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Column, parse_number};

/// Filter operators understood by every backend translator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Like,
    LikeLeft,
    LikeRight,
    NotLike,
    NotLikeLeft,
    NotLikeRight,
    Equal,
    NotEqual,
    GreaterEqual,
    Greater,
    LessEqual,
    Less,
    In,
    NotIn,
    Between,
    /// Operator value this crate does not understand, e.g. read back from a
    /// cache entry written by another version. Translators reject it.
    Other(String),
}

impl FilterOperator {
    /// Stable raw value used for serialization and error messages
    pub fn as_str(&self) -> &str {
        match self {
            Self::Like => "~ *%",
            Self::LikeLeft => "~ *",
            Self::LikeRight => "~ %",
            Self::NotLike => "!~ *%",
            Self::NotLikeLeft => "!~ *",
            Self::NotLikeRight => "!~ %",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterEqual => ">=",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::Less => "<",
            Self::In => "=(",
            Self::NotIn => "!=(",
            Self::Between => "%s <> %s",
            Self::Other(raw) => raw,
        }
    }

    /// Get all supported operators
    pub fn all() -> [FilterOperator; 15] {
        [
            Self::Like,
            Self::LikeLeft,
            Self::LikeRight,
            Self::NotLike,
            Self::NotLikeLeft,
            Self::NotLikeRight,
            Self::Equal,
            Self::NotEqual,
            Self::GreaterEqual,
            Self::Greater,
            Self::LessEqual,
            Self::Less,
            Self::In,
            Self::NotIn,
            Self::Between,
        ]
    }
}

impl From<&str> for FilterOperator {
    fn from(raw: &str) -> Self {
        Self::all()
            .into_iter()
            .find(|op| op.as_str() == raw)
            .unwrap_or_else(|| Self::Other(raw.to_string()))
    }
}

impl From<String> for FilterOperator {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, backend-agnostic filter on one column
#[derive(Debug, Clone)]
pub struct Filter {
    column: Arc<Column>,
    operator: FilterOperator,
    values: Vec<String>,
    display_value: String,
}

impl Filter {
    /// Build a filter from already-structured parts.
    ///
    /// An empty value list is normalized to a single empty string.
    pub fn new(
        column: Arc<Column>,
        operator: FilterOperator,
        values: Vec<String>,
        display_value: impl Into<String>,
    ) -> Self {
        let values = if values.is_empty() {
            vec![String::new()]
        } else {
            values
        };
        Self {
            column,
            operator,
            values,
            display_value: display_value.into(),
        }
    }

    /// Parse user input using the column's default operator
    pub fn parse(column: Arc<Column>, raw_input: &str) -> Self {
        let default_operator = column.filter_default_operator();
        Self::parse_with_default(column, raw_input, default_operator)
    }

    /// Parse user input, falling back to `default_operator` when the input
    /// carries no operator pattern
    pub fn parse_with_default(
        column: Arc<Column>,
        raw_input: &str,
        default_operator: FilterOperator,
    ) -> Self {
        let input = raw_input.trim();
        let (operator, raw_value) = detect_operator(input, default_operator);
        let value_type = &column.value_type;

        let split: Vec<String> = match raw_value {
            RawValue::Pair(min, max) => vec![min, max],
            RawValue::Single(value) if value_type.is_daterange() => {
                value.split(" - ").map(str::to_string).collect()
            }
            RawValue::Single(value) if value_type.is_number() => vec![value],
            RawValue::Single(value) => value.split(',').map(str::to_string).collect(),
        };

        let mut values: Vec<String> = split
            .iter()
            .map(|value| value_type.parse_user_input(value.trim()))
            .collect();

        if operator == FilterOperator::Between
            && !value_type.is_datetime()
            && values.len() == 2
            && compare_loose(&values[0], &values[1]) == std::cmp::Ordering::Greater
        {
            values.swap(0, 1);
        }

        tracing::trace!(
            column = %column.unique_id(),
            operator = %operator,
            values = ?values,
            "parsed filter input"
        );

        Self::new(column, operator, values, input)
    }

    pub fn column(&self) -> &Arc<Column> {
        &self.column
    }

    pub fn operator(&self) -> &FilterOperator {
        &self.operator
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The original trimmed input, echoed back to the UI
    pub fn display_value(&self) -> &str {
        &self.display_value
    }

    /// Range bounds for BETWEEN; a single value is used as both bounds
    pub fn range(&self) -> (&str, &str) {
        let min = self.values.first().map(String::as_str).unwrap_or("");
        let max = self.values.get(1).map(String::as_str).unwrap_or(min);
        (min, max)
    }
}

enum RawValue {
    Single(String),
    Pair(String, String),
}

fn single(value: &str) -> RawValue {
    RawValue::Single(value.to_string())
}

fn has_wildcard(value: &str) -> bool {
    value.starts_with(['%', '*']) || value.ends_with(['%', '*'])
}

/// Pick the LIKE variant from the wildcard markers and strip them
fn like_family(value: &str, negated: bool) -> (FilterOperator, RawValue) {
    let both = (value.starts_with('*') && value.ends_with('*'))
        || (value.starts_with('%') && value.ends_with('%'));

    let (operator, stripped) = if both {
        let inner = &value[1..];
        let inner = if inner.is_empty() {
            inner
        } else {
            &inner[..inner.len() - 1]
        };
        (FilterOperator::Like, inner)
    } else if value.starts_with(['%', '*']) {
        (FilterOperator::LikeLeft, &value[1..])
    } else if value.ends_with(['%', '*']) {
        (FilterOperator::LikeRight, &value[..value.len() - 1])
    } else {
        (FilterOperator::Like, value)
    };

    let operator = match (operator, negated) {
        (FilterOperator::Like, true) => FilterOperator::NotLike,
        (FilterOperator::LikeLeft, true) => FilterOperator::NotLikeLeft,
        (FilterOperator::LikeRight, true) => FilterOperator::NotLikeRight,
        (operator, _) => operator,
    };

    (operator, single(stripped))
}

/// Operator patterns in precedence order; the first match wins.
fn detect_operator(input: &str, default_operator: FilterOperator) -> (FilterOperator, RawValue) {
    if let Some(rest) = input.strip_prefix("=(") {
        return (FilterOperator::In, single(rest.strip_suffix(')').unwrap_or(rest)));
    }
    if let Some(rest) = input.strip_prefix("!=(") {
        return (FilterOperator::NotIn, single(rest.strip_suffix(')').unwrap_or(rest)));
    }
    if let Some(rest) = input.strip_prefix("!=").or_else(|| input.strip_prefix("<>")) {
        return (FilterOperator::NotEqual, single(rest));
    }
    if let Some(rest) = input.strip_prefix('!') {
        // `!~` forces the LIKE family even without wildcard markers
        let (forced, value) = match rest.strip_prefix('~') {
            Some(value) => (true, value.trim()),
            None => (false, rest.trim()),
        };
        if forced || has_wildcard(value) {
            return like_family(value, true);
        }
        return (FilterOperator::NotEqual, single(value));
    }
    if input.starts_with('~') || has_wildcard(input) {
        let value = input.strip_prefix('~').unwrap_or(input).trim();
        return like_family(value, false);
    }
    if let Some(rest) = input.strip_prefix("==") {
        return (FilterOperator::Equal, single(rest));
    }
    if let Some(rest) = input.strip_prefix('=') {
        return (FilterOperator::Equal, single(rest));
    }
    if let Some(rest) = input.strip_prefix(">=") {
        return (FilterOperator::GreaterEqual, single(rest));
    }
    if let Some(rest) = input.strip_prefix('>') {
        return (FilterOperator::Greater, single(rest));
    }
    if let Some(rest) = input.strip_prefix("<=") {
        return (FilterOperator::LessEqual, single(rest));
    }
    if let Some(rest) = input.strip_prefix('<') {
        return (FilterOperator::Less, single(rest));
    }
    if let Some((min, max)) = input.split_once("<>") {
        return (
            FilterOperator::Between,
            RawValue::Pair(min.to_string(), max.to_string()),
        );
    }

    (default_operator, single(input))
}

/// Numeric comparison when both sides are numbers, lexicographic otherwise
pub fn compare_loose(a: &str, b: &str) -> std::cmp::Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DateTimeType, NumberType, ValueType};

    fn text_column() -> Arc<Column> {
        Arc::new(Column::select("title", None))
    }

    fn number_column() -> Arc<Column> {
        Arc::new(Column::select("vol", None).with_type(ValueType::Number(NumberType::default())))
    }

    fn parse(column: &Arc<Column>, input: &str) -> Filter {
        Filter::parse(column.clone(), input)
    }

    #[test]
    fn tilde_prefix_is_like() {
        let col = text_column();
        for s in ["foo", " bar baz ", "x"] {
            let filter = parse(&col, &format!("~{}", s));
            assert_eq!(filter.operator(), &FilterOperator::Like);
            assert_eq!(filter.values(), &[s.trim().to_string()]);
        }
    }

    #[test]
    fn wildcard_markers_pick_like_variant() {
        let col = text_column();
        assert_eq!(parse(&col, "*abc*").operator(), &FilterOperator::Like);
        assert_eq!(parse(&col, "*abc").operator(), &FilterOperator::LikeLeft);
        assert_eq!(parse(&col, "abc*").operator(), &FilterOperator::LikeRight);
        assert_eq!(parse(&col, "%abc%").values(), &["abc"]);
        assert_eq!(parse(&col, "abc%").values(), &["abc"]);

        assert_eq!(parse(&col, "!*abc*").operator(), &FilterOperator::NotLike);
        assert_eq!(parse(&col, "!*abc").operator(), &FilterOperator::NotLikeLeft);
        assert_eq!(parse(&col, "!abc*").operator(), &FilterOperator::NotLikeRight);
        assert_eq!(parse(&col, "!abc*").values(), &["abc"]);
    }

    #[test]
    fn mixed_wildcards_resolve_by_leading_marker() {
        let filter = parse(&text_column(), "*abc%");
        assert_eq!(filter.operator(), &FilterOperator::LikeLeft);
        assert_eq!(filter.values(), &["abc%"]);
    }

    #[test]
    fn lone_wildcard_yields_empty_like() {
        let filter = parse(&text_column(), "*");
        assert_eq!(filter.operator(), &FilterOperator::Like);
        assert_eq!(filter.values(), &[""]);
    }

    #[test]
    fn bang_tilde_without_wildcard_is_not_like() {
        let filter = parse(&text_column(), "!~plainword");
        assert_eq!(filter.operator(), &FilterOperator::NotLike);
        assert_eq!(filter.values(), &["plainword"]);
    }

    #[test]
    fn bare_bang_without_wildcard_is_not_equal() {
        let filter = parse(&text_column(), "!plainword");
        assert_eq!(filter.operator(), &FilterOperator::NotEqual);
        assert_eq!(filter.values(), &["plainword"]);
    }

    #[test]
    fn not_equal_prefixes() {
        let col = text_column();
        assert_eq!(parse(&col, "!=abc").operator(), &FilterOperator::NotEqual);
        assert_eq!(parse(&col, "<>abc").operator(), &FilterOperator::NotEqual);
        assert_eq!(parse(&col, "<>abc").values(), &["abc"]);
    }

    #[test]
    fn in_and_not_in_strip_parentheses() {
        let col = text_column();
        let filter = parse(&col, "=(a,b,c)");
        assert_eq!(filter.operator(), &FilterOperator::In);
        assert_eq!(filter.values(), &["a", "b", "c"]);

        let filter = parse(&col, "!=(a, b)");
        assert_eq!(filter.operator(), &FilterOperator::NotIn);
        assert_eq!(filter.values(), &["a", "b"]);

        let filter = parse(&col, "=(a,b");
        assert_eq!(filter.values(), &["a", "b"]);
    }

    #[test]
    fn equality_and_comparisons() {
        let col = number_column();
        assert_eq!(parse(&col, "==5").operator(), &FilterOperator::Equal);
        assert_eq!(parse(&col, "=5").values(), &["5"]);
        assert_eq!(parse(&col, ">=85").operator(), &FilterOperator::GreaterEqual);
        assert_eq!(parse(&col, ">=85").values(), &["85"]);
        assert_eq!(parse(&col, ">5").operator(), &FilterOperator::Greater);
        assert_eq!(parse(&col, "<=5").operator(), &FilterOperator::LessEqual);
        assert_eq!(parse(&col, "< 5").operator(), &FilterOperator::Less);
        assert_eq!(parse(&col, "< 5").values(), &["5"]);
    }

    #[test]
    fn bare_equals_yields_one_empty_value() {
        let filter = parse(&text_column(), "=");
        assert_eq!(filter.operator(), &FilterOperator::Equal);
        assert_eq!(filter.values(), &[""]);
    }

    #[test]
    fn between_orders_numeric_bounds() {
        let col = number_column();
        for (a, b) in [(30, 15), (15, 30), (-4, -10), (7, 7), (100, 9)] {
            let filter = parse(&col, &format!("{}<>{}", a, b));
            assert_eq!(filter.operator(), &FilterOperator::Between);
            assert_eq!(
                filter.values(),
                &[a.min(b).to_string(), a.max(b).to_string()]
            );
        }
    }

    #[test]
    fn between_orders_bounds_after_locale_conversion() {
        let german = NumberType::new(crate::NumberLocale::from_code("de_DE").unwrap());
        let col = Arc::new(Column::select("vol", None).with_type(ValueType::Number(german)));

        // "1.000" reads as 1.0 before conversion and as 1000 after
        let filter = parse(&col, "1.000<>5");
        assert_eq!(filter.operator(), &FilterOperator::Between);
        assert_eq!(filter.values(), &["5", "1000"]);
    }

    #[test]
    fn between_keeps_datetime_order() {
        let col = Arc::new(
            Column::select("created", None).with_type(ValueType::DateTime(DateTimeType {
                daterange_enabled: true,
                ..Default::default()
            })),
        );
        let filter = parse(&col, "2024-02-01 00:00:00 - 2024-01-01 00:00:00");
        assert_eq!(filter.operator(), &FilterOperator::Between);
        assert_eq!(
            filter.values(),
            &["2024-02-01 00:00:00", "2024-01-01 00:00:00"]
        );

        let filter = parse(&col, "2024-02-01 00:00:00<>2024-01-01 00:00:00");
        assert_eq!(filter.values()[0], "2024-02-01 00:00:00");
    }

    #[test]
    fn default_operator_splits_on_comma() {
        let filter = parse(&text_column(), " red , blue ");
        assert_eq!(filter.operator(), &FilterOperator::Like);
        assert_eq!(filter.values(), &["red", "blue"]);
        assert_eq!(filter.display_value(), "red , blue");
    }

    #[test]
    fn number_values_are_never_comma_split() {
        let filter = parse(&number_column(), "1,5");
        assert_eq!(filter.operator(), &FilterOperator::Equal);
        assert_eq!(filter.values(), &["15"]);

        let filter = parse(&number_column(), "=(1,2)");
        assert_eq!(filter.values().len(), 1);
    }

    #[test]
    fn range_uses_single_value_as_both_bounds() {
        let filter = Filter::new(text_column(), FilterOperator::Between, vec!["x".into()], "x");
        assert_eq!(filter.range(), ("x", "x"));
    }

    #[test]
    fn operator_round_trips_through_raw_value() {
        for op in FilterOperator::all() {
            assert_eq!(FilterOperator::from(op.as_str()), op);
        }
        assert_eq!(
            FilterOperator::from("~~~"),
            FilterOperator::Other("~~~".to_string())
        );
        let json = serde_json::to_string(&FilterOperator::GreaterEqual).unwrap();
        assert_eq!(json, "\">=\"");
    }
}
