// ai
//! 📦 Common data structures: the building blocks of rdx
//!
//! 🎬 COLD OPEN. INT. SUBREDDIT. 11:58 PM
//!
//! The daily top posts are settling in for the night. Scores frozen-ish. Comments
//! trickling. One post was edited at 1700000100 and now its `edited` field is a
//! float instead of a bool, because Reddit decided consistency was optional.
//!
//! This module holds the shapes that ferry posts through the pipeline:
//!
//! - [`RawPost`]: what the API gave us. Every field a `serde_json::Value`,
//!   because the API is a box of chocolates.
//! - [`NormalizedPost`]: what we promise downstream. Typed. Boring. Beautiful.
//! - [`PostTable`]: one run's worth of normalized rows, in upstream ranking order.
//! - [`TimeFilter`]: the fixed window enumeration Reddit accepts for `/top`.
//!
//! 🦆 The duck read the README. The duck still doesn't know why `edited` is a float.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// 📋 The fixed column set of the artifact, in order. The CSV header IS this list.
///
/// If you add a column here, add it to [`NormalizedPost`] in the same position.
/// The csv writer serializes struct fields in declaration order, and the header
/// is written from this slice, so the two must agree or the file lies.
pub const POST_COLUMNS: [&str; 11] = [
    "id",
    "title",
    "score",
    "num_comments",
    "author",
    "created_utc",
    "url",
    "over_18",
    "edited",
    "spoiler",
    "stickied",
];

/// 🗓️ Reddit's `t=` parameter for `/top` listings.
///
/// Validated at config/CLI parse time, so no freestyle windows survive to the
/// request builder. "fortnight" is not a window. We checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    /// 🏷️ The wire value. Matches the serde names exactly.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 💀 Someone typed a time window Reddit has never heard of.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("💀 '{0}' is not a time filter. Pick one of: hour, day, week, month, year, all")]
pub struct ParseTimeFilterError(pub String);

impl FromStr for TimeFilter {
    type Err = ParseTimeFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(ParseTimeFilterError(s.to_string())),
        }
    }
}

/// 🎯 One post, exactly as the API handed it over. Immutable once fetched.
///
/// Every field is a raw [`Value`] because the API's types are suggestions:
/// `edited` is `false` or a float, `author` can be a string or `null`,
/// and a test fixture somewhere has `score: "5"`. Missing fields land as `Null`.
/// Fields outside [`POST_COLUMNS`] are dropped at deserialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub score: Value,
    #[serde(default)]
    pub num_comments: Value,
    #[serde(default)]
    pub author: Value,
    #[serde(default)]
    pub created_utc: Value,
    #[serde(default)]
    pub url: Value,
    #[serde(default)]
    pub over_18: Value,
    #[serde(default)]
    pub edited: Value,
    #[serde(default)]
    pub spoiler: Value,
    #[serde(default)]
    pub stickied: Value,
}

/// ✅ One post after the transformer has had its way with it.
///
/// Field order is load-bearing: it is the CSV column order. See [`POST_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub num_comments: i64,
    pub author: String,
    /// 🕰️ `None` when the raw value was not a usable epoch. Written as an empty cell.
    #[serde(with = "created_utc_format")]
    pub created_utc: Option<DateTime<Utc>>,
    pub url: String,
    pub over_18: bool,
    pub edited: bool,
    pub spoiler: bool,
    pub stickied: bool,
}

/// 📋 The normalized batch. Ordered, fixed columns, one row per post.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostTable {
    pub rows: Vec<NormalizedPost>,
}

impl PostTable {
    pub fn new(rows: Vec<NormalizedPost>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 📋 The column set. Same for every table. That's the point.
    pub fn columns(&self) -> &'static [&'static str] {
        &POST_COLUMNS
    }
}

/// 🕰️ The artifact's timestamp format: `2023-11-14 22:13:20`, with fractional
/// seconds only when the epoch had them. Empty cell for a missing timestamp.
pub(crate) mod created_utc_format {
    use super::*;

    pub(crate) const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
    const WHOLE_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

    pub(crate) fn render(value: &DateTime<Utc>) -> String {
        value.format(FORMAT).to_string()
    }

    pub(crate) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, WHOLE_SECONDS))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&render(ts)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        parse(trimmed).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "💀 '{trimmed}' does not look like a created_utc timestamp"
            ))
        })
    }
}
