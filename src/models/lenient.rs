//! Tolerant deserializers for fields earlier web-client builds wrote loosely.
//! Serialization is unchanged: dates go back out as `YYYY-MM-DD`, numbers
//! as numbers.

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::schedule::parse_stored_date;

/// `YYYY-MM-DD` or an ISO datetime string (date part kept).
pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_stored_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date {raw:?}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

/// A non-negative number, also accepted as numeric text (`"7"`).
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("invalid number {text:?}")))?,
    };
    u32::try_from(value).map_err(|_| de::Error::custom(format!("number {value} out of range")))
}
