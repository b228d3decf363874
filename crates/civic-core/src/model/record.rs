//! Wire shapes returned by the portal API and the lenient decoders used to
//! read them.
//!
//! The API is loose about types: ids may arrive as numbers or strings, fees
//! as `150`, `"150.00"` or `null`, and timestamps in several layouts. These
//! decoders accept all of them and degrade to "missing" rather than failing
//! the whole snapshot.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// One document request as returned by the portal API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    #[serde(deserialize_with = "lenient_id")]
    pub document_id: Option<u64>,
    #[serde(deserialize_with = "lenient_text")]
    pub document_type: String,
    #[serde(deserialize_with = "lenient_text")]
    pub purpose: String,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub remarks: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub status_text: String,
    #[serde(
        deserialize_with = "lenient_timestamp",
        serialize_with = "serialize_timestamp"
    )]
    pub created_at: Option<NaiveDateTime>,
    #[serde(
        deserialize_with = "lenient_timestamp",
        serialize_with = "serialize_timestamp"
    )]
    pub processed_at: Option<NaiveDateTime>,
    pub fee: Fee,
    #[serde(deserialize_with = "lenient_id")]
    pub resident_id: Option<u64>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub resident_name: Option<String>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub processed_by: Option<String>,
}

/// Non-negative amount in centavos. Zero means the document is free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fee(u64);

impl Fee {
    pub const FREE: Self = Self(0);

    #[must_use]
    pub const fn from_centavos(centavos: u64) -> Self {
        Self(centavos)
    }

    /// Build a fee from a decimal peso amount. Negative and non-finite
    /// amounts clamp to free.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_pesos(amount: f64) -> Self {
        if !amount.is_finite() || amount < 0.0 {
            warn!(amount, "invalid fee amount, treating as free");
            return Self::FREE;
        }
        Self((amount * 100.0).round() as u64)
    }

    #[must_use]
    pub const fn centavos(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_free(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_pesos(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            f.write_str("Free")
        } else {
            write!(f, "₱{}.{:02}", self.0 / 100, self.0 % 100)
        }
    }
}

impl Serialize for Fee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_pesos())
    }
}

impl<'de> Deserialize<'de> for Fee {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match &value {
            Value::Number(n) => n.as_f64().map_or(Self::FREE, Self::from_pesos),
            Value::String(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                    .collect();
                cleaned.parse::<f64>().map_or_else(
                    |_| {
                        if !s.trim().is_empty() {
                            warn!(fee = s.as_str(), "unparseable fee, treating as free");
                        }
                        Self::FREE
                    },
                    Self::from_pesos,
                )
            }
            _ => Self::FREE,
        })
    }
}

/// Parse a portal timestamp.
///
/// Accepts RFC 3339 (offset dropped, wall clock kept), `YYYY-MM-DDTHH:MM[:SS[.f]]`,
/// `YYYY-MM-DD HH:MM[:SS[.f]]` and bare `YYYY-MM-DD` (midnight).
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const LAYOUTS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for layout in LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Text of a scalar JSON value; `null`, arrays and objects have none.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => {
            warn!(value = %other, "expected a scalar, treating as missing");
            None
        }
    }
}

/// Text field that reads `null` and non-text shapes as empty.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

pub(crate) fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = scalar_text(Value::deserialize(deserializer)?);
    Ok(raw.as_deref().and_then(|text| {
        let parsed = parse_timestamp(text);
        if parsed.is_none() && !text.trim().is_empty() {
            warn!(timestamp = text, "unparseable timestamp, treating as missing");
        }
        parsed
    }))
}

/// Calendar date in any layout [`parse_timestamp`] accepts; a time part is
/// dropped.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_timestamp(deserializer)?.map(|dt| dt.date()))
}

#[allow(clippy::ref_option)]
fn serialize_timestamp<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Required id; unusable values decode as `0`.
pub(crate) fn lenient_key<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_id(deserializer)?.unwrap_or_default())
}
