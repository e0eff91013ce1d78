use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// A recommended, still-in-print work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedWork {
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    /// Most recent edition year inside the in-print window
    pub most_recent_in_print_year: i32,
}

/// The catalog's work description, which arrives either as a bare string
/// or wrapped as `{"type": "/type/text", "value": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
    PlainString(String),
    WrappedValue(String),
    Absent,
}

impl Description {
    /// Decodes the raw `description` field; unknown shapes are treated as absent
    pub fn from_value(raw: Option<&Value>) -> Self {
        match raw {
            Some(Value::String(text)) => Description::PlainString(text.clone()),
            Some(Value::Object(fields)) => match fields.get("value") {
                Some(Value::String(text)) => Description::WrappedValue(text.clone()),
                _ => Description::Absent,
            },
            _ => Description::Absent,
        }
    }

    /// Blank text counts as absent
    pub fn into_option(self) -> Option<String> {
        match self {
            Description::PlainString(text) | Description::WrappedValue(text) => {
                if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Description::Absent => None,
        }
    }
}

fn year_pattern() -> Result<&'static Regex, &'static regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\b(1[0-9]{3}|2[0-9]{3})\b"))
        .as_ref()
}

/// Extracts the first four-digit year from a free-form publish date
/// such as "2023", "March 5, 2024" or "2024-01-02"
pub fn parse_year(publish_date: &str) -> Option<i32> {
    match year_pattern() {
        Ok(pattern) => pattern
            .find(publish_date)
            .and_then(|m| m.as_str().parse().ok()),
        Err(e) => {
            tracing::error!(error = %e, "Year pattern failed to compile");
            None
        }
    }
}

/// Most recent year within `[current_year - window, current_year]`
///
/// Future years are bad data and never qualify.
pub fn most_recent_in_window<I>(years: I, current_year: i32, window: i32) -> Option<i32>
where
    I: IntoIterator<Item = i32>,
{
    years
        .into_iter()
        .filter(|year| (current_year - window..=current_year).contains(year))
        .max()
}
