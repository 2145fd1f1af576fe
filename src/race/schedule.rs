use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::warn;

use super::types::RaceConfig;

/// Resolve the datetime used to order races chronologically.
///
/// A `date` that already carries a time component wins outright. Otherwise
/// the race-level start time, or the earliest per-category start time, is
/// combined with the date. Everything is normalized to timezone-naive UTC
/// before comparison; unparseable values degrade to `None`.
pub fn race_datetime(race: &RaceConfig) -> Option<NaiveDateTime> {
    let date_raw = race.date.as_deref().unwrap_or("");
    let parsed_date = parse_datetime(date_raw);

    if let Some(dt) = parsed_date {
        if date_raw.contains('T') || date_raw.contains(' ') {
            return Some(dt);
        }
    }

    let start_time = race.start_time.clone().or_else(|| {
        let mut times: Vec<&String> = race
            .event_configuration
            .iter()
            .filter_map(|c| c.start_time.as_ref())
            .collect();
        times.sort();
        times.first().map(|s| s.to_string())
    });

    if let Some(start) = start_time {
        if let Some(dt) = parse_datetime(&start) {
            return Some(dt);
        }
        if !date_raw.is_empty() {
            if let Some(dt) = parse_datetime(&format!("{date_raw}T{start}")) {
                return Some(dt);
            }
        }
    }

    if parsed_date.is_none() && race.date.is_some() {
        warn!("race {}: cannot parse date '{}'", race.id, date_raw);
    }
    parsed_date
}

/// Lenient datetime parsing for the formats persistence actually contains:
/// RFC 3339 (with `Z` or an offset), naive datetimes with or without
/// fractional seconds, and bare dates (midnight).
pub(crate) fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let with_offset = raw.replace('Z', "+00:00");
    if let Ok(dt) = DateTime::parse_from_rfc3339(&with_offset) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::types::CategoryConfig;

    fn race_with(date: Option<&str>, start_time: Option<&str>) -> RaceConfig {
        RaceConfig {
            id: "r".into(),
            date: date.map(str::to_string),
            start_time: start_time.map(str::to_string),
            ..RaceConfig::default()
        }
    }

    #[test]
    fn test_date_with_time_component_wins() {
        let race = race_with(Some("2024-03-05T18:30:00Z"), Some("19:00:00"));
        let dt = race_datetime(&race).unwrap();
        assert_eq!(dt.to_string(), "2024-03-05 18:30:00");
    }

    #[test]
    fn test_bare_date_combines_with_start_time() {
        let race = race_with(Some("2024-03-05"), Some("18:30"));
        let dt = race_datetime(&race).unwrap();
        assert_eq!(dt.to_string(), "2024-03-05 18:30:00");
    }

    #[test]
    fn test_earliest_category_start_time_is_used() {
        let mut race = race_with(Some("2024-03-05"), None);
        race.event_configuration = vec![
            CategoryConfig {
                category: "A".into(),
                start_time: Some("18:45".into()),
                sprints: None,
            },
            CategoryConfig {
                category: "B".into(),
                start_time: Some("18:30".into()),
                sprints: None,
            },
        ];
        let dt = race_datetime(&race).unwrap();
        assert_eq!(dt.to_string(), "2024-03-05 18:30:00");
    }

    #[test]
    fn test_full_iso_start_time_stands_alone() {
        let race = race_with(None, Some("2024-03-05T18:30:00+01:00"));
        let dt = race_datetime(&race).unwrap();
        // Offset is folded into UTC before the naive comparison.
        assert_eq!(dt.to_string(), "2024-03-05 17:30:00");
    }

    #[test]
    fn test_bare_date_without_start_time_is_midnight() {
        let race = race_with(Some("2024-03-05"), None);
        let dt = race_datetime(&race).unwrap();
        assert_eq!(dt.to_string(), "2024-03-05 00:00:00");
    }

    #[test]
    fn test_garbage_degrades_to_none() {
        assert_eq!(race_datetime(&race_with(Some("next tuesday"), None)), None);
        assert_eq!(race_datetime(&race_with(None, None)), None);
    }

    #[test]
    fn test_parse_datetime_fractional_seconds() {
        let dt = parse_datetime("2024-03-05T18:30:00.250").unwrap();
        assert_eq!(dt.to_string(), "2024-03-05 18:30:00.250");
    }
}
