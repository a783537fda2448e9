//! The canonical instant format.
//!
//! There is a single format for both machine round-trip and display:
//! `YYYY-MM-DDTHH:MM:SSZ`, rendered as wall-clock time in the coercer's time
//! zone. The trailing `Z` is a literal.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render an instant in the canonical format.
pub fn format_instant(instant: &DateTime<Utc>, zone: Tz) -> String {
    instant.with_timezone(&zone).format(INSTANT_FORMAT).to_string()
}

/// Parse canonical text, interpreting the wall-clock time in `zone`.
///
/// Times that do not exist in the zone (inside a DST gap) have no reading;
/// ambiguous times resolve to the earlier instant.
pub fn parse_instant(text: &str, zone: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), INSTANT_FORMAT).ok()?;
    let local = zone.from_local_datetime(&naive).earliest()?;
    Some(local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_round_trip() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let text = format_instant(&instant, Tz::UTC);
        assert_eq!(text, "2024-03-09T14:05:07Z");
        assert_eq!(parse_instant(&text, Tz::UTC), Some(instant));
    }

    #[test]
    fn test_zone_is_applied_both_ways() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let text = format_instant(&instant, Tz::Europe__Berlin);
        assert_eq!(text, "2024-01-15T13:00:00Z");
        assert_eq!(parse_instant(&text, Tz::Europe__Berlin), Some(instant));
    }

    #[test]
    fn test_rejects_other_formats() {
        assert_eq!(parse_instant("2024-01-15 12:00:00", Tz::UTC), None);
        assert_eq!(parse_instant("yesterday", Tz::UTC), None);
    }
}
