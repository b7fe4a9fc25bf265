//! Great-circle distance math used by the proximity filter.

/// A WGS-84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// True when `point` lies within `radius_km` of `center`, boundary included.
pub fn within_radius(center: Coordinate, point: Coordinate, radius_km: f64) -> bool {
    haversine_km(center, point) <= radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANDUNG: Coordinate = Coordinate {
        lat: -6.9175,
        lon: 107.6191,
    };
    const JAKARTA: Coordinate = Coordinate {
        lat: -6.2088,
        lon: 106.8456,
    };

    #[test]
    fn zero_self_distance() {
        assert!(haversine_km(BANDUNG, BANDUNG) < 1e-9);
        assert!(within_radius(BANDUNG, BANDUNG, 0.0));
    }

    #[test]
    fn bandung_to_jakarta_is_about_115_km() {
        let distance = haversine_km(BANDUNG, JAKARTA);
        assert!(
            distance > 110.0 && distance < 120.0,
            "got {distance} km"
        );
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let distance = haversine_km(BANDUNG, JAKARTA);
        assert!(within_radius(BANDUNG, JAKARTA, distance + 0.001));
        assert!(!within_radius(BANDUNG, JAKARTA, distance - 0.001));
    }

    #[test]
    fn distance_is_symmetric() {
        let there = haversine_km(BANDUNG, JAKARTA);
        let back = haversine_km(JAKARTA, BANDUNG);
        assert!((there - back).abs() < 1e-9);
    }
}
