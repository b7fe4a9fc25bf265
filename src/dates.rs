use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Inclusive window of instants an event's start must fall into: local
/// midnight today through local midnight `days_range - 1` days later.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Window anchored to the current calendar day on the local clock.
    pub fn from_today(days_range: u32) -> Self {
        Self::from_day(Local::now().date_naive(), days_range)
    }

    /// Same rule anchored to an explicit day. A `days_range` of zero is
    /// treated as one so `start <= end` always holds.
    pub fn from_day(day: NaiveDate, days_range: u32) -> Self {
        let start = local_to_utc(day.and_time(NaiveTime::MIN));
        let end = start + Duration::days(i64::from(days_range.saturating_sub(1)));
        Self { start, end }
    }

    /// Containment is inclusive on both bounds.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Lenient timestamp parsing for API-supplied values: RFC 3339 first, then a
/// naive datetime read as local clock time, then a bare date at local
/// midnight. Anything else is `None`; callers treat that as "no timestamp"
/// rather than an error.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(local_to_utc(naive));
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(local_to_utc(day.and_time(NaiveTime::MIN)));
    }

    None
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // A DST gap can swallow the local wall time; read it as UTC then
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    // A June anchor keeps the window clear of DST transitions wherever the
    // test host is located.
    fn june_tenth() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn window_spans_days_range_minus_one_days() {
        let window = DateWindow::from_day(june_tenth(), 3);
        assert_eq!(window.end - window.start, Duration::days(2));
    }

    #[test]
    fn single_day_window_closes_at_its_start() {
        let window = DateWindow::from_day(june_tenth(), 1);
        assert_eq!(window.start, window.end);
        assert!(window.contains(window.start));
    }

    #[test]
    fn zero_days_range_degrades_to_one() {
        let window = DateWindow::from_day(june_tenth(), 0);
        assert_eq!(window.start, window.end);
    }

    #[test]
    fn bounds_are_inclusive() {
        let window = DateWindow::from_day(june_tenth(), 3);
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(window.start - Duration::seconds(1)));
        assert!(!window.contains(window.end + Duration::seconds(1)));
    }

    #[test]
    fn naive_timestamps_share_the_window_clock() {
        // Both the window and naive parsing go through local time, so their
        // comparison is stable regardless of the host timezone.
        let window = DateWindow::from_day(june_tenth(), 3);
        let inside = parse_timestamp("2025-06-11 14:30:00").unwrap();
        assert!(window.contains(inside));

        let first_instant = parse_timestamp("2025-06-10 00:00:00").unwrap();
        assert_eq!(first_instant, window.start);

        let beyond = parse_timestamp("2025-06-13 00:00:00").unwrap();
        assert!(!window.contains(beyond));
    }

    #[test]
    fn rfc3339_offsets_convert_to_utc() {
        let parsed = parse_timestamp("2025-06-10T12:00:00+07:00").unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2025, 6, 10, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn t_separated_naive_datetime_parses() {
        assert!(parse_timestamp("2025-06-10T09:00:00").is_some());
    }

    #[test]
    fn bare_date_parses_at_midnight() {
        let window = DateWindow::from_day(june_tenth(), 1);
        let parsed = parse_timestamp("2025-06-10").unwrap();
        assert_eq!(parsed, window.start);
    }

    #[test]
    fn garbage_and_empty_yield_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2025-13-40").is_none());
    }
}
