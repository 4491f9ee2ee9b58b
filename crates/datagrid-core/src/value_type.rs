//! Column value types
//!
//! A value type governs three conversions:
//! - `parse_user_input` turns a filter value typed by a user into the
//!   canonical form the backend compares against. It never fails; values it
//!   cannot read are passed through trimmed.
//! - `to_display_value` turns a raw backend value into what a user sees.
//! - `default_filter_operator` is used when a filter string carries no
//!   operator pattern.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::{FilterOperator, NumberLocale, Value, parse_number};

/// Closed set of column value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValueType {
    #[default]
    String,
    Number(NumberType),
    DateTime(DateTimeType),
    ArrayOfStrings(ArrayType),
    Image,
}

impl ValueType {
    /// Stable type name used in configuration and logs
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number(_) => "number",
            ValueType::DateTime(_) => "datetime",
            ValueType::ArrayOfStrings(_) => "array_of_strings",
            ValueType::Image => "image",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, ValueType::Number(_))
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, ValueType::DateTime(_))
    }

    /// Whether filter input is a `from - to` date range
    pub fn is_daterange(&self) -> bool {
        matches!(self, ValueType::DateTime(dt) if dt.daterange_enabled)
    }

    pub fn default_filter_operator(&self) -> FilterOperator {
        match self {
            ValueType::Number(_) => FilterOperator::Equal,
            ValueType::DateTime(dt) if dt.daterange_enabled => FilterOperator::Between,
            _ => FilterOperator::Like,
        }
    }

    pub fn parse_user_input(&self, raw: &str) -> String {
        match self {
            ValueType::Number(number) => number.parse_user_input(raw),
            ValueType::DateTime(datetime) => datetime.parse_user_input(raw),
            _ => raw.to_string(),
        }
    }

    pub fn to_display_value(&self, raw: Value) -> Value {
        match self {
            ValueType::String => match raw {
                Value::Array(_) => raw,
                Value::String(_) => raw,
                other => Value::String(other.to_string()),
            },
            ValueType::Number(number) => number.to_display_value(raw),
            ValueType::DateTime(datetime) => datetime.to_display_value(raw),
            ValueType::ArrayOfStrings(array) => array.to_display_value(raw),
            ValueType::Image => raw,
        }
    }
}

/// Locale-aware number formatting
#[derive(Debug, Clone, PartialEq)]
pub struct NumberType {
    pub locale: NumberLocale,
    /// Fixed number of fraction digits; `None` prints the shortest form
    pub fraction_digits: Option<usize>,
    pub grouping: bool,
    pub prefix: String,
    pub suffix: String,
}

impl Default for NumberType {
    fn default() -> Self {
        Self {
            locale: NumberLocale::default(),
            fraction_digits: None,
            grouping: true,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl NumberType {
    pub fn new(locale: NumberLocale) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }

    pub fn with_fraction_digits(mut self, digits: usize) -> Self {
        self.fraction_digits = Some(digits);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Read a localized number; returns the input unchanged if it is not one.
    pub fn parse_user_input(&self, raw: &str) -> String {
        let mut text = raw.trim();
        if !self.prefix.is_empty() {
            text = text.strip_prefix(self.prefix.as_str()).unwrap_or(text).trim();
        }
        if !self.suffix.is_empty() {
            text = text.strip_suffix(self.suffix.as_str()).unwrap_or(text).trim();
        }

        let mut cleaned: String = text
            .chars()
            .filter(|c| Some(*c) != self.locale.grouping_separator)
            .collect();
        if self.locale.grouping_separator.is_some_and(char::is_whitespace) {
            cleaned.retain(|c| !c.is_whitespace());
        }
        if self.locale.decimal_separator != '.' {
            cleaned = cleaned.replace(self.locale.decimal_separator, ".");
        }

        if parse_number(&cleaned).is_some() {
            cleaned
        } else {
            raw.trim().to_string()
        }
    }

    pub fn to_display_value(&self, raw: Value) -> Value {
        match raw {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.to_display_value(item))
                    .collect(),
            ),
            other => match other.as_f64() {
                Some(number) => Value::String(self.format(number)),
                None => other,
            },
        }
    }

    pub fn format(&self, number: f64) -> String {
        let negative = number < 0.0;
        let magnitude = number.abs();
        let text = match self.fraction_digits {
            Some(digits) => format!("{:.*}", digits, magnitude),
            None => format!("{}", magnitude),
        };

        let (int_part, frac_part) = match text.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (text.as_str(), None),
        };

        let grouped = match self.locale.grouping_separator {
            Some(sep) if self.grouping => group_digits(int_part, sep),
            _ => int_part.to_string(),
        };

        let mut out = String::with_capacity(text.len() + 8);
        out.push_str(&self.prefix);
        if negative && magnitude != 0.0 {
            out.push('-');
        }
        out.push_str(&grouped);
        if let Some(frac) = frac_part {
            out.push(self.locale.decimal_separator);
            out.push_str(frac);
        }
        out.push_str(&self.suffix);
        out
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Date/time parsing and formatting between a backend and a user time zone
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeType {
    /// chrono format of the raw backend value
    pub source_format: String,
    pub source_timezone: FixedOffset,
    /// chrono format shown to users and expected in filter input
    pub output_pattern: String,
    pub output_timezone: FixedOffset,
    /// Filter input is a `from - to` range
    pub daterange_enabled: bool,
}

impl Default for DateTimeType {
    fn default() -> Self {
        let utc = Utc.fix();
        Self {
            source_format: "%Y-%m-%d %H:%M:%S".to_string(),
            source_timezone: utc,
            output_pattern: "%Y-%m-%d %H:%M:%S".to_string(),
            output_timezone: utc,
            daterange_enabled: false,
        }
    }
}

impl DateTimeType {
    pub fn parse_user_input(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.convert(trimmed, &self.output_pattern, self.output_timezone) {
            Some(local) => local
                .with_timezone(&self.source_timezone)
                .format(&self.source_format)
                .to_string(),
            None => trimmed.to_string(),
        }
    }

    pub fn to_display_value(&self, raw: Value) -> Value {
        let parsed = match &raw {
            Value::DateTime(ndt) => self.localize(*ndt, self.source_timezone),
            Value::Date(date) => date
                .and_hms_opt(0, 0, 0)
                .and_then(|ndt| self.localize(ndt, self.source_timezone)),
            Value::String(s) if !s.trim().is_empty() => {
                self.convert(s.trim(), &self.source_format, self.source_timezone)
            }
            _ => None,
        };

        match parsed {
            Some(dt) => Value::String(
                dt.with_timezone(&self.output_timezone)
                    .format(&self.output_pattern)
                    .to_string(),
            ),
            None => raw,
        }
    }

    fn convert(
        &self,
        text: &str,
        format: &str,
        zone: FixedOffset,
    ) -> Option<DateTime<FixedOffset>> {
        let naive = NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
        self.localize(naive, zone)
    }

    fn localize(&self, naive: NaiveDateTime, zone: FixedOffset) -> Option<DateTime<FixedOffset>> {
        zone.from_local_datetime(&naive).single()
    }
}

/// Delimited string to array conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub separator: String,
}

impl Default for ArrayType {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
        }
    }
}

impl ArrayType {
    pub fn to_display_value(&self, raw: Value) -> Value {
        match raw {
            Value::Array(_) => raw,
            Value::Null => Value::Array(Vec::new()),
            Value::String(s) if s.trim().is_empty() => Value::Array(Vec::new()),
            Value::String(s) => Value::Array(
                s.split(self.separator.as_str())
                    .map(|part| Value::String(part.trim().to_string()))
                    .collect(),
            ),
            other => Value::Array(vec![Value::String(other.to_string())]),
        }
    }
}
