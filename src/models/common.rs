use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Parses an ISO-8601 timestamp. Accepts RFC 3339 date-times and plain
/// `YYYY-MM-DD` dates, the latter read as midnight UTC.
pub fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapters for ISO-8601 request dates.
pub mod iso_date {
    use super::*;
    use serde::de::Error;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_iso_datetime(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid ISO-8601 date: {raw}")))
    }

    pub fn option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse_iso_datetime(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid ISO-8601 date: {raw}"))),
        }
    }

    /// Absent field stays `None`, explicit `null` becomes `Some(None)`.
    pub fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        option(deserializer).map(Some)
    }
}

/// Distinguishes an absent field from an explicit `null` in patch bodies.
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Reads an enum from its wire name (`"HIGH"`, `"FULL_BODY"`), ignoring case.
pub fn parse_enum<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_uppercase())).ok()
}

/// `skip`/`take` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<u32>,
    pub take: Option<u32>,
}

impl Pagination {
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = self.skip.unwrap_or(0) as usize;
        let iter = items.into_iter().skip(skip);
        match self.take {
            Some(take) => iter.take(take as usize).collect(),
            None => iter.collect(),
        }
    }
}
