// Date normalization for stored transactions.
//
// Stored documents carry dates in two representations: a native temporal
// value (integer milliseconds since the Unix epoch, the way document stores
// persist datetimes) or free text written by an upstream importer. Everything
// downstream of this module works with a single canonical type,
// `DateTime<Utc>`. Year/month boundaries are therefore UTC boundaries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::Transaction;

/// A transaction date as it appears in a stored document.
///
/// Untagged: a JSON number is the native representation, a JSON string is
/// the textual one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    /// Native temporal value, milliseconds since the Unix epoch.
    Millis(i64),
    /// Textual representation, parsed on normalization.
    Text(String),
}

/// A transaction after date normalization. This is also the `items` element
/// shape in the response payload, so field names follow the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum DateError {
    #[error("unparseable date text: {0:?}")]
    Unparseable(String),
    #[error("epoch milliseconds out of range: {0}")]
    OutOfRange(i64),
}

/// Accepted textual formats, tried in order. All are read as UTC; text
/// carrying an explicit offset is converted to UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Convert a stored date value into the canonical `DateTime<Utc>`.
///
/// Native values pass through (epoch millis -> instant). Text is parsed as
/// RFC 3339 first, then as a naive datetime, then as a bare date at
/// midnight UTC. Malformed text is an error, never a default.
pub fn normalize_date(value: &DateValue) -> Result<DateTime<Utc>, DateError> {
    match value {
        DateValue::Millis(ms) => {
            DateTime::from_timestamp_millis(*ms).ok_or(DateError::OutOfRange(*ms))
        }
        DateValue::Text(text) => parse_date_text(text),
    }
}

fn parse_date_text(text: &str) -> Result<DateTime<Utc>, DateError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        // Bare dates land at midnight UTC, same as the document store's
        // string-to-date coercion.
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(DateError::Unparseable(text.to_string()))
}

/// Normalize one stored transaction. Only the date changes representation;
/// type and amount pass through untouched.
pub fn normalize(tx: &Transaction) -> Result<NormalizedTransaction, DateError> {
    Ok(NormalizedTransaction {
        kind: tx.kind.clone(),
        amount: tx.amount,
        date: normalize_date(&tx.date)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_bare_date_text_is_midnight_utc() {
        let dt = normalize_date(&DateValue::Text("2024-03-05".to_string())).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_rfc3339_text_converts_offset_to_utc() {
        let dt = normalize_date(&DateValue::Text("2024-03-05T22:30:00-05:00".to_string())).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 6, 3, 30, 0).unwrap());
        // Offset shifts the UTC month boundary: March 6th, not March 5th.
        assert_eq!(dt.day(), 6);
    }

    #[test]
    fn test_naive_datetime_text() {
        let dt = normalize_date(&DateValue::Text("2024-01-02 13:45:00".to_string())).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 2, 13, 45, 0).unwrap());
    }

    #[test]
    fn test_native_millis_pass_through() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let dt = normalize_date(&DateValue::Millis(instant.timestamp_millis())).unwrap();
        assert_eq!(dt, instant);
    }

    #[test]
    fn test_text_and_native_agree_on_same_instant() {
        let from_text = normalize_date(&DateValue::Text("2024-03-05".to_string())).unwrap();
        let from_millis = normalize_date(&DateValue::Millis(from_text.timestamp_millis())).unwrap();
        assert_eq!(from_text, from_millis);
        assert_eq!(from_text.year(), from_millis.year());
        assert_eq!(from_text.month(), from_millis.month());
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        let err = normalize_date(&DateValue::Text("not-a-date".to_string())).unwrap_err();
        assert!(matches!(err, DateError::Unparseable(_)));
    }

    #[test]
    fn test_out_of_range_millis_is_an_error() {
        let err = normalize_date(&DateValue::Millis(i64::MAX)).unwrap_err();
        assert!(matches!(err, DateError::OutOfRange(_)));
    }

    #[test]
    fn test_date_value_deserializes_untagged() {
        let text: DateValue = serde_json::from_str("\"2024-03-05\"").unwrap();
        assert!(matches!(text, DateValue::Text(_)));

        let millis: DateValue = serde_json::from_str("1709596800000").unwrap();
        assert!(matches!(millis, DateValue::Millis(1709596800000)));
    }
}
