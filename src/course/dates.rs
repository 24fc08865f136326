#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de};

/// Date layout Gson writes when no date format is configured, as in
/// `Jan 1, 1970 3:00:00 AM`.
const GSON_DATE_FORMAT: &str = "%b %e, %Y %l:%M:%S %p";

/// Parses an `update_date`, either RFC 3339 or the Gson default layout.
///
/// Gson dates carry no zone and are read as UTC.
pub fn parse_update_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    // newer JDKs put a narrow no-break space before the AM/PM marker
    let text = text.replace(['\u{202f}', '\u{a0}'], " ");
    NaiveDateTime::parse_from_str(&text, GSON_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde `deserialize_with` hook for `update_date` fields.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_update_date(&text)
        .ok_or_else(|| de::Error::custom(format!("unrecognized update date `{text}`")))
}
