//! Resident registry and user-access record shapes.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::model::record::{
    lenient_date, lenient_key, lenient_opt_text, lenient_text, lenient_timestamp,
};

/// A registered resident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resident {
    #[serde(deserialize_with = "lenient_key")]
    pub id: u64,
    #[serde(deserialize_with = "lenient_text")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub middle_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub suffix: Option<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub birth_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub civil_status: Option<String>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub purok: Option<String>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub contact_number: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_active: bool,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub registered_at: Option<NaiveDateTime>,
}

impl Resident {
    /// `Last, First Middle Suffix`, skipping absent parts.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut given = vec![self.first_name.trim()];
        given.extend(self.middle_name.as_deref().map(str::trim));
        given.extend(self.suffix.as_deref().map(str::trim));
        let given = given
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match (self.last_name.trim(), given.as_str()) {
            ("", g) => g.to_string(),
            (l, "") => l.to_string(),
            (l, g) => format!("{l}, {g}"),
        }
    }

    /// Completed years of age on `as_of`, `None` without a birth date or
    /// when the birth date is in the future.
    #[must_use]
    pub fn age_on(&self, as_of: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let mut years = as_of.year() - birth.year();
        if (as_of.month(), as_of.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }
}

/// Coarse age groups used by the resident registry filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBracket {
    Minor,
    Adult,
    Senior,
}

impl AgeBracket {
    pub const SENIOR_AGE: u32 = 60;
    pub const ADULT_AGE: u32 = 18;

    #[must_use]
    pub const fn from_age(age: u32) -> Self {
        if age >= Self::SENIOR_AGE {
            Self::Senior
        } else if age >= Self::ADULT_AGE {
            Self::Adult
        } else {
            Self::Minor
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Adult => "adult",
            Self::Senior => "senior",
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeBracket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" | "youth" => Ok(Self::Minor),
            "adult" => Ok(Self::Adult),
            "senior" | "senior citizen" => Ok(Self::Senior),
            other => Err(format!("unknown age bracket: {other}")),
        }
    }
}

/// A staff or resident login managed from the user-access list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAccount {
    #[serde(deserialize_with = "lenient_key")]
    pub id: u64,
    #[serde(deserialize_with = "lenient_text")]
    pub username: String,
    #[serde(deserialize_with = "lenient_text")]
    pub full_name: String,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub role: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_active: bool,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_login: Option<NaiveDateTime>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

/// Accept `true`/`false`, `1`/`0` and their string forms.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "active"
        ),
        _ => false,
    })
}
