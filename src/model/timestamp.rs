//! Timestamp (de)serialization for task records.
//!
//! The task service emits naive ISO-8601 timestamps (UTC, no offset) while
//! exported files and other clients use RFC 3339. Both are accepted, as is a
//! bare `YYYY-MM-DD` date (midnight UTC). Output is always RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse any accepted timestamp form
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical text form
pub fn format(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(dt))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_some(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 20, 17, 0, 0).unwrap();
        assert_eq!(parse("2025-12-20T17:00:00Z"), Some(expected));
        assert_eq!(parse("2025-12-20T18:00:00+01:00"), Some(expected));
        assert_eq!(parse("2025-12-20T17:00:00"), Some(expected));
        assert_eq!(parse("2025-12-20T17:00"), Some(expected));
        assert_eq!(
            parse("2025-12-20"),
            Some(Utc.with_ymd_and_hms(2025, 12, 20, 0, 0, 0).unwrap())
        );
        assert_eq!(parse("next tuesday"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_format_is_rfc3339() {
        let dt = Utc.with_ymd_and_hms(2025, 12, 20, 17, 0, 0).unwrap();
        assert_eq!(format(&dt), "2025-12-20T17:00:00Z");
    }
}
