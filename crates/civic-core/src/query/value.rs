//! Field access for the tabular query engine.
//!
//! Records expose named fields as [`FieldValue`]s. The engine never needs
//! to know the concrete record type beyond this.
//!
//! # Ordering
//!
//! [`FieldValue::compare`] is a total order:
//!
//! - `Missing` sorts before everything else;
//! - values of different kinds sort by kind (bool < number < date/time < text);
//! - integers and floats compare numerically with each other;
//! - dates compare with timestamps as midnight of that day;
//! - text compares case-insensitively.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// A single field read from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Time(NaiveDateTime),
    Text(Cow<'a, str>),
}

impl<'a> FieldValue<'a> {
    #[must_use]
    pub fn text(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }

    #[must_use]
    pub fn owned(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }

    /// Borrowed text when present, `Missing` otherwise.
    #[must_use]
    pub fn opt_text(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, Self::text)
    }

    #[must_use]
    pub fn opt_time(value: Option<NaiveDateTime>) -> Self {
        value.map_or(Self::Missing, Self::Time)
    }

    #[must_use]
    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map_or(Self::Missing, Self::Date)
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Date(_) | Self::Time(_) => 3,
            Self::Text(_) => 4,
        }
    }

    /// Text used for substring search, `None` for missing values.
    #[must_use]
    pub fn search_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Missing => None,
            Self::Bool(b) => Some(Cow::Owned(b.to_string())),
            Self::Int(i) => Some(Cow::Owned(i.to_string())),
            Self::Float(f) => Some(Cow::Owned(f.to_string())),
            Self::Date(d) => Some(Cow::Owned(d.format("%Y-%m-%d").to_string())),
            Self::Time(t) => Some(Cow::Owned(t.format("%Y-%m-%d %H:%M").to_string())),
            Self::Text(s) => Some(Cow::Borrowed(s.as_ref())),
        }
    }

    /// Case-insensitive equality against a filter value typed by a user.
    #[must_use]
    pub fn matches(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        match self {
            Self::Missing => false,
            Self::Bool(b) => parse_flag(wanted) == Some(*b),
            Self::Int(i) => wanted.parse::<i64>().is_ok_and(|w| w == *i),
            #[allow(clippy::float_cmp)]
            Self::Float(f) => wanted.parse::<f64>().is_ok_and(|w| w == *f),
            Self::Date(d) => wanted.parse::<NaiveDate>().is_ok_and(|w| w == *d),
            Self::Time(t) => {
                wanted.parse::<NaiveDate>().is_ok_and(|w| w == t.date())
                    || wanted.parse::<NaiveDateTime>().is_ok_and(|w| w == *t)
            }
            Self::Text(s) => s.trim().to_lowercase() == wanted.to_lowercase(),
        }
    }

    /// Total order used by the engine's sort step.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Date(a), Self::Time(b)) => midnight(*a).cmp(b),
            (Self::Time(a), Self::Date(b)) => a.cmp(&midnight(*b)),
            (Self::Text(a), Self::Text(b)) => compare_text(a, b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Parse the boolean spellings used by filter dropdowns.
#[must_use]
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "active" => Some(true),
        "false" | "0" | "no" | "inactive" => Some(false),
        _ => None,
    }
}

/// A record whose fields the query engine can read by name.
///
/// Unknown field names must yield [`FieldValue::Missing`], never panic.
pub trait Record {
    fn field(&self, name: &str) -> FieldValue<'_>;
}

impl Record for Value {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match self.get(name) {
            None | Some(Value::Null | Value::Array(_) | Value::Object(_)) => FieldValue::Missing,
            Some(Value::Bool(b)) => FieldValue::Bool(*b),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(FieldValue::Int)
                .or_else(|| n.as_f64().map(FieldValue::Float))
                .unwrap_or(FieldValue::Missing),
            Some(Value::String(s)) => FieldValue::text(s),
        }
    }
}
