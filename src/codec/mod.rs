//! Trainee title codec.
//!
//! Older clients stored a trainee's name, depot and vehicle packed into one
//! title string, `Name (Depot) [Vehicle]`. Periods are now stored as
//! structured records; this module only translates to and from that packed
//! form when reading or serving legacy data, and owns the period-length
//! arithmetic shared by everything that expands a period into days.

use chrono::{DateTime, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;

/// Length of a training period in calendar days, start day included.
pub const TRAINING_DAYS: u32 = 14;

static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^(]+?)\s*\((?P<depot>[^)]+)\).*\[(?P<vehicle>[^\[\]]+)\]\s*$")
        .expect("bracketed title pattern")
});

static PIPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^(]+?)\s*\((?P<depot>[^|)]+?)\s*\|\s*(?P<vehicle>[^)]+?)\s*\)\s*$")
        .expect("piped title pattern")
});

// Depot is the first parenthesized token; anything after it is ignored.
static LEGACY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^(]+?)\s*\((?P<depot>[^)]+)\).*$").expect("legacy title pattern")
});

/// Which known layout a title matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TitleFormat {
    /// `Name (Depot) [Vehicle]`
    Bracketed,
    /// `Name (Depot | Vehicle)`
    Piped,
    /// `Name (Depot)`, possibly followed by free text
    Legacy,
    /// Nothing matched; the whole title is the name.
    Unstructured,
}

/// Fields recovered from a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTitle {
    pub name: String,
    pub depot: Option<String>,
    pub vehicle: Option<String>,
    pub format: TitleFormat,
}

/// Pack name, depot and vehicle into a title. Missing trailing parts are
/// left out, producing the legacy layouts.
pub fn encode(name: &str, depot: Option<&str>, vehicle: Option<&str>) -> String {
    if name.contains(" (") {
        tracing::warn!(name, "Trainee name contains \" (\"; title will not decode cleanly");
    }
    match (depot, vehicle) {
        (Some(depot), Some(vehicle)) => format!("{} ({}) [{}]", name, depot, vehicle),
        (Some(depot), None) => format!("{} ({})", name, depot),
        (None, Some(vehicle)) => format!("{} [{}]", name, vehicle),
        (None, None) => name.to_string(),
    }
}

/// Recover name, depot and vehicle from a title. Never fails: a title in no
/// known layout becomes a bare name.
pub fn decode(title: &str) -> DecodedTitle {
    let patterns: [(&Lazy<Regex>, TitleFormat); 3] = [
        (&BRACKETED, TitleFormat::Bracketed),
        (&PIPED, TitleFormat::Piped),
        (&LEGACY, TitleFormat::Legacy),
    ];

    for (pattern, format) in patterns {
        if let Some(caps) = pattern.captures(title) {
            let field = |group: &str| caps.name(group).map(|m| m.as_str().trim().to_string());
            return DecodedTitle {
                name: field("name").unwrap_or_default(),
                depot: field("depot").filter(|s| !s.is_empty()),
                vehicle: field("vehicle").filter(|s| !s.is_empty()),
                format,
            };
        }
    }

    tracing::debug!(title, "Title matches no known layout; using it as the name");
    DecodedTitle {
        name: title.to_string(),
        depot: None,
        vehicle: None,
        format: TitleFormat::Unstructured,
    }
}

/// Last day of a period starting on `start`.
pub fn derive_end(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_days(Days::new(u64::from(TRAINING_DAYS - 1)))
        .unwrap_or(NaiveDate::MAX)
}

/// The days of a period as `(day number, date)`, day numbers starting at 1.
pub fn period_days(start: NaiveDate) -> impl Iterator<Item = (u32, NaiveDate)> {
    (0..TRAINING_DAYS).filter_map(move |offset| {
        start
            .checked_add_days(Days::new(u64::from(offset)))
            .map(|date| (offset + 1, date))
    })
}

/// Trim a trainee name and check it can be stored and packed into a title.
pub fn normalize_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Trainee name is required".to_string()));
    }
    if name.contains('(') {
        return Err(AppError::Validation(
            "Trainee name must not contain \"(\"".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Best-effort trainee name from free text: everything before the first
/// `(`, normalized. Fails only when nothing is left.
pub fn recover_name(raw: &str) -> Result<String, AppError> {
    let Some((head, _)) = raw.split_once('(') else {
        return normalize_name(raw);
    };
    if head.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "No trainee name before \"(\" in \"{}\"",
            raw.trim()
        )));
    }
    tracing::warn!(raw, name = head.trim(), "Dropping text after \"(\" in trainee name");
    normalize_name(head)
}

/// Case-insensitive identity of a trainee name.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parse a day sent by a client: `YYYY-MM-DD` or an RFC 3339 timestamp
/// (only its date part is kept).
pub fn parse_day(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.date_naive()))
        .map_err(|_| AppError::Validation(format!("Invalid date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_encode_full_title() {
        assert_eq!(
            encode("Jane Doe", Some("Aarhus C"), Some("scooter45")),
            "Jane Doe (Aarhus C) [scooter45]"
        );
    }

    #[test]
    fn test_encode_degrades_for_missing_parts() {
        assert_eq!(encode("Jane", Some("Randers"), None), "Jane (Randers)");
        assert_eq!(encode("Jane", None, None), "Jane");
    }

    #[test]
    fn test_round_trip_for_every_depot_and_vehicle() {
        use crate::models::{Depot, Vehicle};
        for depot in Depot::ALL {
            for vehicle in Vehicle::ALL {
                let title = encode("Mads B. Jensen", Some(depot.as_str()), Some(vehicle.as_str()));
                let decoded = decode(&title);
                assert_eq!(decoded.name, "Mads B. Jensen");
                assert_eq!(decoded.depot.as_deref(), Some(depot.as_str()));
                assert_eq!(decoded.vehicle.as_deref(), Some(vehicle.as_str()));
                assert_eq!(decoded.format, TitleFormat::Bracketed);
            }
        }
    }

    #[test]
    fn test_decode_legacy_two_field_title() {
        let decoded = decode("Jane (Aarhus C)");
        assert_eq!(decoded.name, "Jane");
        assert_eq!(decoded.depot.as_deref(), Some("Aarhus C"));
        assert_eq!(decoded.vehicle, None);
        assert_eq!(decoded.format, TitleFormat::Legacy);
    }

    #[test]
    fn test_decode_piped_title() {
        let decoded = decode("Ole (Horsens | kyburz)");
        assert_eq!(decoded.name, "Ole");
        assert_eq!(decoded.depot.as_deref(), Some("Horsens"));
        assert_eq!(decoded.vehicle.as_deref(), Some("kyburz"));
        assert_eq!(decoded.format, TitleFormat::Piped);
    }

    #[test]
    fn test_decode_malformed_title_falls_back_to_name() {
        let decoded = decode("No Parens Here");
        assert_eq!(decoded.name, "No Parens Here");
        assert_eq!(decoded.depot, None);
        assert_eq!(decoded.vehicle, None);
        assert_eq!(decoded.format, TitleFormat::Unstructured);
    }

    #[test]
    fn test_decode_takes_last_bracket_as_vehicle() {
        let decoded = decode("Per (Folle) [old] [car]");
        assert_eq!(decoded.name, "Per");
        assert_eq!(decoded.depot.as_deref(), Some("Folle"));
        assert_eq!(decoded.vehicle.as_deref(), Some("car"));
    }

    #[test]
    fn test_decode_legacy_keeps_first_paren_group_as_depot() {
        let decoded = decode("Jane (Aarhus C) (moved)");
        assert_eq!(decoded.name, "Jane");
        assert_eq!(decoded.depot.as_deref(), Some("Aarhus C"));
        assert_eq!(decoded.vehicle, None);
        assert_eq!(decoded.format, TitleFormat::Legacy);
    }

    #[test]
    fn test_decode_legacy_ignores_trailing_text() {
        let decoded = decode("Anna (Horsens) - late start");
        assert_eq!(decoded.name, "Anna");
        assert_eq!(decoded.depot.as_deref(), Some("Horsens"));
        assert_eq!(decoded.format, TitleFormat::Legacy);
    }

    #[test]
    fn test_recover_name() {
        assert_eq!(recover_name("  Bo  ").unwrap(), "Bo");
        assert_eq!(recover_name("Anna (Horsens").unwrap(), "Anna");
        assert!(matches!(recover_name("(Horsens) Anna"), Err(AppError::Validation(_))));
        assert!(matches!(recover_name(""), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_derive_end_is_thirteen_days_later() {
        for start in [day(2025, 7, 5), day(2024, 2, 20), day(2025, 12, 25)] {
            assert_eq!((derive_end(start) - start).num_days(), 13);
        }
        assert_eq!(derive_end(day(2025, 7, 5)), day(2025, 7, 18));
    }

    #[test]
    fn test_period_days_cover_window() {
        let days: Vec<_> = period_days(day(2025, 7, 5)).collect();
        assert_eq!(days.len(), 14);
        assert_eq!(days[0], (1, day(2025, 7, 5)));
        assert_eq!(days[13], (14, day(2025, 7, 18)));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Jane  ").unwrap(), "Jane");
        assert!(matches!(normalize_name("   "), Err(AppError::Validation(_))));
        assert!(matches!(normalize_name("Jane (x"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_day_accepts_dates_and_timestamps() {
        assert_eq!(parse_day("2025-07-05").unwrap(), day(2025, 7, 5));
        assert_eq!(parse_day("2025-07-05T00:00:00.000Z").unwrap(), day(2025, 7, 5));
        assert!(parse_day("05/07/2025").is_err());
    }
}
