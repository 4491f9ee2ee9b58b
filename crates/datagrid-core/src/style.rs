//! Cell and row styles
//!
//! A style is one of a closed set of kinds plus optional conditions. All
//! conditions must hold for the style to apply to a row.

use serde::{Deserialize, Serialize};

use crate::{FilterOperator, RawRow, Result, Value, predicate::matches_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    pub fn as_css(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum StyleKind {
    Bold,
    Italic,
    Color { color: String },
    BackgroundColor { color: String },
    Align { align: Align },
    CssClass { class: String },
    /// Wraps the cell value in the given markup; `:value:` is replaced by it
    Html { template: String },
}

/// What a style contributes to an HTML cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleEffect {
    /// Inline CSS declaration, e.g. `font-weight: bold`
    Css(String),
    /// Extra class attribute value
    Class(String),
    /// Value rewrite, no attribute change
    Content,
}

impl StyleKind {
    pub fn css_side_effect(&self) -> StyleEffect {
        match self {
            Self::Bold => StyleEffect::Css("font-weight: bold".to_string()),
            Self::Italic => StyleEffect::Css("font-style: italic".to_string()),
            Self::Color { color } => StyleEffect::Css(format!("color: {}", color)),
            Self::BackgroundColor { color } => {
                StyleEffect::Css(format!("background-color: {}", color))
            }
            Self::Align { align } => StyleEffect::Css(format!("text-align: {}", align.as_css())),
            Self::CssClass { class } => StyleEffect::Class(class.clone()),
            Self::Html { .. } => StyleEffect::Content,
        }
    }

    /// Rewrite an already rendered cell value
    pub fn apply(&self, value: String) -> String {
        match self {
            Self::Html { template } => template.replace(":value:", &value),
            _ => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleCondition {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    #[serde(flatten)]
    pub kind: StyleKind,
    #[serde(default)]
    pub conditions: Vec<StyleCondition>,
}

impl Style {
    pub fn new(kind: StyleKind) -> Self {
        Self {
            kind,
            conditions: Vec::new(),
        }
    }

    pub fn when(
        mut self,
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        self.conditions.push(StyleCondition {
            column: column.into(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Whether every condition holds for the row
    pub fn applies_to(&self, row: &RawRow) -> Result<bool> {
        for condition in &self.conditions {
            let cell = row.get(&condition.column).unwrap_or(&Value::Null);
            let values = [condition.value.clone()];
            if !matches_value(&condition.operator, &values, cell)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_use_in_memory_semantics() {
        let style = Style::new(StyleKind::Bold).when("vol", FilterOperator::GreaterEqual, "85");

        let mut row = RawRow::new();
        row.insert("vol".into(), Value::Int64(86));
        assert!(style.applies_to(&row).unwrap());

        row.insert("vol".into(), Value::Int64(67));
        assert!(!style.applies_to(&row).unwrap());
    }

    #[test]
    fn unconditional_style_always_applies() {
        let style = Style::new(StyleKind::Italic);
        assert!(style.applies_to(&RawRow::new()).unwrap());
    }

    #[test]
    fn effects_and_content() {
        assert_eq!(
            StyleKind::Color { color: "red".into() }.css_side_effect(),
            StyleEffect::Css("color: red".into())
        );
        let html = StyleKind::Html {
            template: "<strong>:value:</strong>".into(),
        };
        assert_eq!(html.apply("x".into()), "<strong>x</strong>");
    }

    #[test]
    fn deserializes_tagged_style() {
        let style: Style = toml::from_str(
            r##"
            style = "background_color"
            color = "#eee"

            [[conditions]]
            column = "status"
            operator = "="
            value = "late"
            "##,
        )
        .unwrap();
        assert_eq!(style.kind, StyleKind::BackgroundColor { color: "#eee".into() });
        assert_eq!(style.conditions[0].operator, FilterOperator::Equal);
    }
}
