//! Activity catalog and per-run input defaults shared across the crate.

/// Activity keys the Kuyy feed can be filtered by. Input validation rejects
/// anything outside this set.
pub const ACTIVITIES: [&str; 8] = [
    "tennis",
    "padel",
    "softball",
    "yoga",
    "workout",
    "cycling",
    "climbing",
    "badminton",
];

/// Default events endpoint; overridable per run via `baseApiUrl`.
pub const DEFAULT_BASE_API_URL: &str = "https://kuyy.app/api/events";

/// Default geocoding endpoint; overridable via `config.toml`.
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Region qualifier appended to every geocode query. The feed serves
/// Indonesian cities, and the qualifier keeps ambiguous city names from
/// resolving elsewhere.
pub const GEOCODE_REGION: &str = "Indonesia";

// Input defaults, applied when the corresponding field is absent.
pub const DEFAULT_DAYS_RANGE: u32 = 7;
pub const DEFAULT_MAX_ITEMS: usize = 500;
pub const DEFAULT_DISTANCE_KM: f64 = 20.0;
pub const DEFAULT_LIMIT_PER_PAGE: u32 = 50;

/// Whether `key` (already lowercased) names a supported activity.
pub fn is_supported_activity(key: &str) -> bool {
    ACTIVITIES.contains(&key)
}

/// All supported activity keys, for CLI listings and error messages.
pub fn supported_activities() -> Vec<&'static str> {
    ACTIVITIES.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_activity_is_supported() {
        assert!(is_supported_activity("yoga"));
        assert!(is_supported_activity("badminton"));
    }

    #[test]
    fn unknown_or_uppercase_activity_is_not() {
        assert!(!is_supported_activity("chess"));
        // Callers lowercase before checking; the set itself is exact-match.
        assert!(!is_supported_activity("Yoga"));
    }
}
