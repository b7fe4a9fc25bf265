use serde_json::Value;

use crate::dates::{parse_timestamp, DateWindow};
use crate::geo::{within_radius, Coordinate};

/// Which criterion rejected an item. Rejections feed aggregate counters
/// only; individual items are never logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Category,
    Date,
    Distance,
}

impl Rejection {
    /// Metric label for the rejection counters.
    pub fn label(self) -> &'static str {
        match self {
            Rejection::Category => "category",
            Rejection::Date => "date",
            Rejection::Distance => "distance",
        }
    }
}

/// Verdict for a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Rejection),
}

/// The three per-item acceptance criteria, applied in order: category,
/// date window, distance.
pub struct EventFilter {
    activity: String,
    window: DateWindow,
    center: Coordinate,
    radius_km: f64,
}

impl EventFilter {
    pub fn new(activity: &str, window: DateWindow, center: Coordinate, radius_km: f64) -> Self {
        Self {
            activity: activity.to_lowercase(),
            window,
            center,
            radius_km,
        }
    }

    pub fn evaluate(&self, ev: &Value) -> Verdict {
        if !self.matches_activity(ev) {
            return Verdict::Reject(Rejection::Category);
        }

        let start = ev
            .get("start_timestamp")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        let start = match start {
            Some(instant) => instant,
            None => return Verdict::Reject(Rejection::Date),
        };
        if !self.window.contains(start) {
            return Verdict::Reject(Rejection::Date);
        }

        // Distance applies only when the event carries a finite coordinate
        // pair; missing location data must not exclude a matching event.
        if let Some(point) = event_coordinate(ev) {
            if !within_radius(self.center, point, self.radius_km) {
                return Verdict::Reject(Rejection::Distance);
            }
        }

        Verdict::Accept
    }

    /// Exact match on `category`, or substring match within `categories`,
    /// case-insensitive on both sides.
    fn matches_activity(&self, ev: &Value) -> bool {
        let category = ev
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        let categories = ev
            .get("categories")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        category == self.activity || categories.contains(&self.activity)
    }
}

/// Both coordinates, present and finite, or nothing.
fn event_coordinate(ev: &Value) -> Option<Coordinate> {
    let lat = ev
        .get("latitude")
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())?;
    let lon = ev
        .get("longitude")
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())?;
    Some(Coordinate { lat, lon })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    const BANDUNG: Coordinate = Coordinate {
        lat: -6.9,
        lon: 107.6,
    };

    fn june_window() -> DateWindow {
        DateWindow::from_day(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 3)
    }

    fn yoga_filter() -> EventFilter {
        EventFilter::new("yoga", june_window(), BANDUNG, 10.0)
    }

    // Naive local timestamp squarely inside the June window.
    const IN_WINDOW: &str = "2025-06-11 09:00:00";

    #[test]
    fn accepts_exact_category_match() {
        let verdict = yoga_filter().evaluate(&json!({
            "category": "Yoga",
            "start_timestamp": IN_WINDOW
        }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn accepts_substring_in_categories() {
        let verdict = yoga_filter().evaluate(&json!({
            "categories": "Wellness, YOGA, Meditation",
            "start_timestamp": IN_WINDOW
        }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn requested_activity_is_lowered_once() {
        let filter = EventFilter::new("YoGa", june_window(), BANDUNG, 10.0);
        let verdict = filter.evaluate(&json!({
            "category": "yoga",
            "start_timestamp": IN_WINDOW
        }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn rejects_other_category() {
        let verdict = yoga_filter().evaluate(&json!({
            "category": "tennis",
            "categories": "racket sports",
            "start_timestamp": IN_WINDOW
        }));
        assert_eq!(verdict, Verdict::Reject(Rejection::Category));
    }

    #[test]
    fn category_must_match_exactly_not_by_substring() {
        // Substring matching is only for the plural `categories` field.
        let verdict = yoga_filter().evaluate(&json!({
            "category": "hot yoga retreat",
            "start_timestamp": IN_WINDOW
        }));
        assert_eq!(verdict, Verdict::Reject(Rejection::Category));
    }

    #[test]
    fn rejects_missing_or_unparsable_start() {
        let filter = yoga_filter();
        let verdict = filter.evaluate(&json!({"category": "yoga"}));
        assert_eq!(verdict, Verdict::Reject(Rejection::Date));

        let verdict = filter.evaluate(&json!({
            "category": "yoga",
            "start_timestamp": "someday"
        }));
        assert_eq!(verdict, Verdict::Reject(Rejection::Date));
    }

    #[test]
    fn rejects_start_outside_window() {
        let verdict = yoga_filter().evaluate(&json!({
            "category": "yoga",
            "start_timestamp": "2025-07-01 09:00:00"
        }));
        assert_eq!(verdict, Verdict::Reject(Rejection::Date));
    }

    #[test]
    fn rejects_event_outside_radius() {
        // Jakarta is ~115 km from the Bandung center, radius is 10.
        let verdict = yoga_filter().evaluate(&json!({
            "category": "yoga",
            "start_timestamp": IN_WINDOW,
            "latitude": -6.2088,
            "longitude": 106.8456
        }));
        assert_eq!(verdict, Verdict::Reject(Rejection::Distance));
    }

    #[test]
    fn accepts_event_inside_radius() {
        let verdict = yoga_filter().evaluate(&json!({
            "category": "yoga",
            "start_timestamp": IN_WINDOW,
            "latitude": -6.91,
            "longitude": 107.62
        }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn missing_coordinates_skip_the_distance_filter() {
        let verdict = yoga_filter().evaluate(&json!({
            "category": "yoga",
            "start_timestamp": IN_WINDOW
        }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn one_coordinate_alone_skips_the_distance_filter() {
        let verdict = yoga_filter().evaluate(&json!({
            "category": "yoga",
            "start_timestamp": IN_WINDOW,
            "latitude": -50.0
        }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn string_coordinates_do_not_count_as_location() {
        let verdict = yoga_filter().evaluate(&json!({
            "category": "yoga",
            "start_timestamp": IN_WINDOW,
            "latitude": "-50.0",
            "longitude": "0.0"
        }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn criteria_apply_in_order() {
        // An item failing several filters reports the first, category.
        let verdict = yoga_filter().evaluate(&json!({
            "category": "tennis",
            "start_timestamp": "garbage",
            "latitude": 50.0,
            "longitude": 50.0
        }));
        assert_eq!(verdict, Verdict::Reject(Rejection::Category));
    }
}
