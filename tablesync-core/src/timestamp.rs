//! Loose timestamp parsing for the remote `updated` field and the stored
//! watermark.
//!
//! Parse order, first match wins:
//! 1. `DD.MM.YYYY HH:MM:SS`
//! 2. `DD.MM.YYYY HH:MM`
//! 3. flexible fallback (RFC 3339, RFC 2822, ISO-ish with optional fractional
//!    seconds, month-name and date-only forms)
//!
//! A trailing `UTC`, `GMT` or `Z` is accepted on the naive forms. Naive values
//! are read as UTC. Anything unparsable maps to [`zero`], which
//! is never newer than a real watermark.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Display format for the `Updated` column.
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Storage format for watermarks (always UTC).
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const EXACT_FORMATS: &[&str] = &["%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"];

const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
];

const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// Zone names treated as UTC when they trail a naive value.
const UTC_SUFFIXES: &[&str] = &["UTC", "GMT", "Z"];

/// The oldest possible instant (Unix epoch).
pub fn zero() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Parse `input`, returning `None` when no rule matches.
pub fn parse(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    EXACT_FORMATS
        .iter()
        .find_map(|fmt| parse_naive(s, fmt))
        .or_else(|| parse_flexible(s))
}

/// Parse `input`, mapping failures to [`zero`].
pub fn parse_or_zero(input: &str) -> DateTime<Utc> {
    parse(input).unwrap_or_else(zero)
}

/// Reformat `input` as `DD.MM.YYYY HH:MM`; unparsable input is returned as-is.
pub fn display(input: &str) -> String {
    match parse(input) {
        Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        None => input.to_string(),
    }
}

/// Render an instant in watermark form.
pub fn format_watermark(instant: DateTime<Utc>) -> String {
    instant.format(WATERMARK_FORMAT).to_string()
}

fn parse_naive(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, fmt)
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_flexible(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let s = strip_utc_suffix(s);
    if let Some(dt) = FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| parse_naive(s, fmt))
    {
        return Some(dt);
    }
    FLEXIBLE_DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

fn strip_utc_suffix(s: &str) -> &str {
    for suffix in UTC_SUFFIXES {
        let Some(split) = s.len().checked_sub(suffix.len()) else {
            continue;
        };
        if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(suffix) {
            return s[..split].trim_end();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn parses_finnish_with_seconds() {
        assert_eq!(parse("05.03.2024 14:07:09"), Some(utc(2024, 3, 5, 14, 7, 9)));
    }

    #[test]
    fn parses_finnish_without_seconds() {
        assert_eq!(parse(" 5.3.2024 14:07 "), Some(utc(2024, 3, 5, 14, 7, 0)));
    }

    #[test]
    fn falls_back_to_flexible_forms() {
        assert_eq!(parse("2024-03-05 14:07:09"), Some(utc(2024, 3, 5, 14, 7, 9)));
        assert_eq!(parse("2024-03-05T14:07:09Z"), Some(utc(2024, 3, 5, 14, 7, 9)));
        assert_eq!(parse("2024-03-05T16:07:09+02:00"), Some(utc(2024, 3, 5, 14, 7, 9)));
        assert_eq!(parse("2024-03-05"), Some(utc(2024, 3, 5, 0, 0, 0)));
        assert_eq!(parse("05.03.2024"), Some(utc(2024, 3, 5, 0, 0, 0)));
    }

    #[test]
    fn accepts_fractional_seconds() {
        let with_millis = parse("2024-03-05 14:07:09.123").unwrap();
        assert_eq!(with_millis.timestamp(), utc(2024, 3, 5, 14, 7, 9).timestamp());
        assert_eq!(with_millis.timestamp_subsec_millis(), 123);

        let with_tenths = parse("2024-03-05T14:07:09.5").unwrap();
        assert_eq!(with_tenths.timestamp(), utc(2024, 3, 5, 14, 7, 9).timestamp());
        assert_eq!(with_tenths.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn accepts_trailing_utc_zone_names() {
        let expected = Some(utc(2024, 3, 5, 14, 7, 9));
        assert_eq!(parse("2024-03-05 14:07:09 UTC"), expected);
        assert_eq!(parse("2024-03-05 14:07:09 gmt"), expected);
        assert_eq!(parse("2024-03-05 14:07:09Z"), expected);
        assert_eq!(parse("2024/03/05 14:07:09 UTC"), expected);
    }

    #[test]
    fn accepts_month_names() {
        assert_eq!(parse("5 March 2024 14:07"), Some(utc(2024, 3, 5, 14, 7, 0)));
        assert_eq!(parse("Mar 5, 2024 14:07:09"), Some(utc(2024, 3, 5, 14, 7, 9)));
        assert_eq!(parse("March 5 2024 14:07"), Some(utc(2024, 3, 5, 14, 7, 0)));
        assert_eq!(parse("5 Mar 2024"), Some(utc(2024, 3, 5, 0, 0, 0)));
    }

    #[test]
    fn accepts_rfc2822() {
        assert_eq!(
            parse("Tue, 05 Mar 2024 16:07:09 +0200"),
            Some(utc(2024, 3, 5, 14, 7, 9))
        );
    }

    #[test]
    fn accepts_slash_separated_dates() {
        assert_eq!(parse("2024/03/05 14:07:09"), Some(utc(2024, 3, 5, 14, 7, 9)));
        assert_eq!(parse("2024/03/05 14:07"), Some(utc(2024, 3, 5, 14, 7, 0)));
        assert_eq!(parse("2024/03/05"), Some(utc(2024, 3, 5, 0, 0, 0)));
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(parse("not a date"), None);
        assert_eq!(parse_or_zero("not a date"), zero());
        assert_eq!(parse_or_zero(""), zero());
        assert!(parse_or_zero("not a date") < utc(1970, 1, 1, 0, 0, 1));
    }

    #[test]
    fn display_normalizes_or_passes_through() {
        assert_eq!(display("05.03.2024 14:07:09"), "05.03.2024 14:07");
        assert_eq!(display("2024-03-05 14:07:09"), "05.03.2024 14:07");
        assert_eq!(display("sometime soon"), "sometime soon");
        assert_eq!(display(""), "");
    }

    #[test]
    fn watermark_format_round_trips() {
        let t = utc(2024, 12, 31, 23, 59, 58);
        let stored = format_watermark(t);
        assert_eq!(stored, "2024-12-31 23:59:58");
        assert_eq!(parse(&stored), Some(t));
    }
}
