//! Timestamp parsing for report fields and page footers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::patterns::{EPOCH, FOOTER_TIMESTAMP, FORM_DATE, FORM_DATETIME};
use super::{ExtractionMatch, FieldExtractor};

const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse any timestamp shape a report or upstream feed produces.
///
/// Accepts, in order: epoch seconds (milliseconds when above
/// 10,000,000,000), RFC 3339, ISO date-times, `YYYY-MM-DD`, the report form
/// `MM/DD/YYYY hh:mm AM`, and bare `MM/DD/YYYY` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if EPOCH.is_match(value) {
        return parse_epoch(value);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for fmt in ISO_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    parse_form_datetime(value)
}

fn parse_epoch(value: &str) -> Option<NaiveDateTime> {
    let n: f64 = value.parse().ok()?;
    let secs = if n > 10_000_000_000.0 { n / 1000.0 } else { n };
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
    DateTime::from_timestamp(whole, nanos).map(|dt| dt.naive_utc())
}

/// Parse report form text such as `03/14/2024 07:30 AM` or
/// `03/14/2024 Time 07:30 AM`. A date without a time gives midnight.
pub fn parse_form_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = FORM_DATETIME.captures(value) {
        let date = NaiveDate::parse_from_str(&caps[1], "%m/%d/%Y").ok()?;
        let meridiem = caps
            .get(3)
            .map(|m| m.as_str().replace('.', "").to_uppercase());
        let time = parse_clock(&caps[2], meridiem.as_deref())?;
        return Some(date.and_time(time));
    }

    let caps = FORM_DATE.captures(value)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

fn parse_clock(clock: &str, meridiem: Option<&str>) -> Option<NaiveTime> {
    let with_seconds = clock.matches(':').count() == 2;
    match meridiem {
        Some(ampm) => {
            let fmt = if with_seconds { "%I:%M:%S %p" } else { "%I:%M %p" };
            NaiveTime::parse_from_str(&format!("{} {}", clock, ampm), fmt).ok()
        }
        None => {
            let fmt = if with_seconds { "%H:%M:%S" } else { "%H:%M" };
            NaiveTime::parse_from_str(clock, fmt).ok()
        }
    }
}

/// The last page-footer submission stamp in the text, e.g.
/// `3/15/2024 10:22:11 AM`.
pub fn footer_timestamp(text: &str) -> Option<NaiveDateTime> {
    FooterStampExtractor::new().extract(text).map(|m| m.value)
}

/// Page footer stamp extractor.
pub struct FooterStampExtractor;

impl FooterStampExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FooterStampExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for FooterStampExtractor {
    type Output = ExtractionMatch<NaiveDateTime>;

    /// Latest occurrence in the text; footers repeat on every page.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).pop()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        FOOTER_TIMESTAMP
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let stamp = format!("{} {} {}", &caps[1], &caps[2], caps[3].to_uppercase());
                let dt = NaiveDateTime::parse_from_str(&stamp, "%m/%d/%Y %I:%M:%S %p").ok()?;
                Some(
                    ExtractionMatch::new(dt, 0.9, full.as_str())
                        .with_position(full.start(), full.end()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_form_datetime() {
        assert_eq!(parse_timestamp("03/14/2024 07:30 AM"), Some(dt(2024, 3, 14, 7, 30, 0)));
        assert_eq!(parse_timestamp("3/14/2024 Time 11:15 pm"), Some(dt(2024, 3, 14, 23, 15, 0)));
        assert_eq!(parse_timestamp("03/14/2024 12:05 AM"), Some(dt(2024, 3, 14, 0, 5, 0)));
    }

    #[test]
    fn test_date_only() {
        assert_eq!(parse_timestamp("03/14/2024"), Some(dt(2024, 3, 14, 0, 0, 0)));
        assert_eq!(parse_timestamp("2024-03-14"), Some(dt(2024, 3, 14, 0, 0, 0)));
    }

    #[test]
    fn test_iso_and_rfc3339() {
        assert_eq!(parse_timestamp("2024-03-14 07:30:00"), Some(dt(2024, 3, 14, 7, 30, 0)));
        assert_eq!(parse_timestamp("2024-03-14T07:30:00"), Some(dt(2024, 3, 14, 7, 30, 0)));
        assert_eq!(
            parse_timestamp("2024-03-14T07:30:00-05:00"),
            Some(dt(2024, 3, 14, 7, 30, 0))
        );
    }

    #[test]
    fn test_epoch_seconds_and_millis() {
        assert_eq!(parse_timestamp("1710401400"), Some(dt(2024, 3, 14, 7, 30, 0)));
        assert_eq!(parse_timestamp("1710401400000"), Some(dt(2024, 3, 14, 7, 30, 0)));
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("13/45/2024"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_footer_takes_last_stamp() {
        let text = "page 1\n3/15/2024 9:02:11 AM\npage 2\n3/15/2024 10:22:11 PM\n";
        assert_eq!(footer_timestamp(text), Some(dt(2024, 3, 15, 22, 22, 11)));
        assert_eq!(FooterStampExtractor::new().extract_all(text).len(), 2);
        assert_eq!(footer_timestamp("no stamps here"), None);
    }
}
