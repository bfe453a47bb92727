//! Auction date parsing and display formatting.
//!
//! Dates arrive as `YYYY-MM-DD` or `YYYY/MM/DD`, times as 24-hour `HH:MM`.
//! Parsing validates the calendar instant (no silent roll-over of e.g.
//! 2025-02-31 into March); formatting produces the display string used on
//! every template, `"Saturday, 15 March 2025 @ 14:00"`. Malformed input
//! degrades to an empty string rather than an error.

use chrono::NaiveDate;

fn two_digits(s: &str) -> Option<u32> {
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Parse a `YYYY-MM-DD` / `YYYY/MM/DD` date string into a validated calendar
/// date. Returns `None` for pattern mismatches and impossible dates.
pub fn parse_event_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    let mut parts = date.split(['-', '/']);
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    if y.len() != 4 || !y.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month = two_digits(m)?;
    let day = two_digits(d)?;
    // from_ymd_opt rejects roll-over dates outright (day 31 in a 30-day month)
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Check a 24-hour `HH:MM` time string. The time is echoed verbatim by the
/// formatter, so only the pattern is enforced here.
pub fn valid_event_time(time: &str) -> bool {
    let time = time.trim();
    let mut parts = time.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), None) => two_digits(h).is_some() && two_digits(m).is_some(),
        _ => false,
    }
}

/// Format a date string without the time suffix: `"Saturday, 15 March 2025"`.
/// Empty string when the date is missing or malformed.
pub fn format_event_day(date: &str) -> String {
    match parse_event_date(date) {
        Some(d) => d.format("%A, %-d %B %Y").to_string(),
        None => String::new(),
    }
}

/// Format a date+time pair into the full display string
/// `"<weekday>, <day> <month> <year> @ <HH:MM>"`.
///
/// Either input missing or malformed yields an empty string.
pub fn format_event_date(date: &str, time: &str) -> String {
    let time = time.trim();
    if date.trim().is_empty() || time.is_empty() || !valid_event_time(time) {
        return String::new();
    }
    match parse_event_date(date) {
        Some(d) => format!("{} @ {}", d.format("%A, %-d %B %Y"), time),
        None => String::new(),
    }
}

/// Today's date in the `YYYY-MM-DD` form the form surface uses as a default.
pub fn today_ymd() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_valid_pairs() {
        assert_eq!(
            format_event_date("2025-03-15", "14:00"),
            "Saturday, 15 March 2025 @ 14:00"
        );
        // Slash separators are accepted too
        assert_eq!(
            format_event_date("2025/03/15", "14:00"),
            "Saturday, 15 March 2025 @ 14:00"
        );
    }

    #[test]
    fn formatted_string_ends_with_time() {
        for (d, t) in [("2024-01-01", "00:00"), ("2025-12-31", "23:59"), ("2025-06-07", "09:30")] {
            let s = format_event_date(d, t);
            assert!(s.ends_with(&format!(" @ {}", t)), "{:?}", s);
        }
    }

    #[test]
    fn malformed_dates_yield_empty() {
        // Roll-over candidates must not slide into the next month
        assert_eq!(format_event_date("2025-02-31", "10:00"), "");
        assert_eq!(format_event_date("2025-04-31", "10:00"), "");
        assert_eq!(format_event_date("2025-13-01", "10:00"), "");
        assert_eq!(format_event_date("2025-00-10", "10:00"), "");
        // Pattern mismatches
        assert_eq!(format_event_date("15-03-2025", "10:00"), "");
        assert_eq!(format_event_date("2025-3-15", "10:00"), "");
        assert_eq!(format_event_date("soon", "10:00"), "");
        assert_eq!(format_event_date("", "10:00"), "");
    }

    #[test]
    fn malformed_times_yield_empty() {
        assert_eq!(format_event_date("2025-03-15", ""), "");
        assert_eq!(format_event_date("2025-03-15", "9:00"), "");
        assert_eq!(format_event_date("2025-03-15", "nine"), "");
        assert_eq!(format_event_date("2025-03-15", "09:00:00"), "");
    }

    #[test]
    fn leap_day_is_accepted_only_in_leap_years() {
        assert!(parse_event_date("2024-02-29").is_some());
        assert!(parse_event_date("2025-02-29").is_none());
    }

    #[test]
    fn day_format_omits_time() {
        assert_eq!(format_event_day("2025-03-15"), "Saturday, 15 March 2025");
        assert_eq!(format_event_day("nope"), "");
    }

    #[test]
    fn today_matches_pattern() {
        let t = today_ymd();
        assert!(parse_event_date(&t).is_some());
    }
}
