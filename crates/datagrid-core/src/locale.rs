//! Locale and time zone settings resolved at configuration time
//!
//! Number and date types never read process-wide locale state. A locale code
//! is turned into explicit separators once, when the column type is built.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// Separators used to read and write localized numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLocale {
    /// Locale code this was resolved from (e.g. "de_DE")
    pub code: String,
    pub decimal_separator: char,
    /// Thousands separator, `None` for locales without grouping
    pub grouping_separator: Option<char>,
}

impl NumberLocale {
    /// Resolve a locale code such as `en_US` or `de-DE`.
    pub fn from_code(code: &str) -> Result<Self> {
        let normalized = code.trim().replace('-', "_");
        let (decimal, grouping) = match normalized.as_str() {
            "C" | "POSIX" => ('.', None),
            "en" | "en_US" | "en_GB" | "en_AU" | "en_CA" => ('.', Some(',')),
            "de_CH" => ('.', Some('\'')),
            "de" | "de_DE" | "de_AT" | "es" | "es_ES" | "it" | "it_IT" | "nl" | "nl_NL" => {
                (',', Some('.'))
            }
            "fr" | "fr_FR" => (',', Some(' ')),
            other => {
                return Err(GridError::Configuration(format!(
                    "Unknown number locale: {}",
                    other
                )));
            }
        };

        Ok(Self {
            code: normalized,
            decimal_separator: decimal,
            grouping_separator: grouping,
        })
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self {
            code: "en_US".to_string(),
            decimal_separator: '.',
            grouping_separator: Some(','),
        }
    }
}

/// Parse a fixed-offset time zone: `UTC`, `Z`, `+02:00`, `-0530`, `+2`.
pub fn parse_time_zone(spec: &str) -> Result<FixedOffset> {
    let trimmed = spec.trim();
    let invalid = || GridError::Configuration(format!("Invalid time zone: {}", spec));

    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
