use serde::{Deserialize, Serialize};

const EARTH_RADIUS_MILES: f64 = 3_959.0;

/// Placeholder distance used when either side of a pairing has no position.
pub const SENTINEL_DISTANCE_MILES: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// A point with a zero coordinate is treated as "not reported yet".
    pub fn is_known(&self) -> bool {
        self.lat != 0.0 && self.lng != 0.0
    }
}

pub fn haversine_miles(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    // Rounding can push the term marginally past 1.0 for antipodal points.
    let haversine =
        (sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng).clamp(0.0, 1.0);
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_MILES * central_angle
}

/// Distance between two optional positions, falling back to
/// [`SENTINEL_DISTANCE_MILES`] when either one is missing or unknown.
pub fn distance_or_sentinel(a: Option<&GeoPoint>, b: Option<&GeoPoint>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a.is_known() && b.is_known() => haversine_miles(a, b),
        _ => SENTINEL_DISTANCE_MILES,
    }
}

#[cfg(test)]
mod tests {
    use super::{distance_or_sentinel, haversine_miles, GeoPoint, SENTINEL_DISTANCE_MILES};

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint::new(40.7128, -74.0060);
        let distance = haversine_miles(&p, &p);
        assert!(distance.abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (GeoPoint::new(40.7128, -74.0060), GeoPoint::new(34.0522, -118.2437)),
            (GeoPoint::new(-33.8688, 151.2093), GeoPoint::new(51.5074, -0.1278)),
            (GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)),
        ];

        for (a, b) in pairs {
            let forward = haversine_miles(&a, &b);
            let backward = haversine_miles(&b, &a);
            assert!((forward - backward).abs() < 1e-9, "{forward} != {backward}");
        }
    }

    #[test]
    fn one_degree_of_longitude_at_equator_is_about_69_miles() {
        let distance = haversine_miles(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(0.0, 1.0));
        let arc = 3_959.0 * 1f64.to_radians();
        assert!((distance - arc).abs() < 1e-9, "got {distance}");
        assert!((distance - 69.17).abs() < 0.1, "got {distance}");
    }

    #[test]
    fn new_york_to_los_angeles_is_around_2450_miles() {
        let nyc = GeoPoint::new(40.7128, -74.0060);
        let la = GeoPoint::new(34.0522, -118.2437);
        let distance = haversine_miles(&nyc, &la);
        assert!((distance - 2_445.0).abs() < 15.0, "got {distance}");
    }

    #[test]
    fn out_of_range_coordinates_do_not_panic() {
        let distance =
            haversine_miles(&GeoPoint::new(400.0, -900.0), &GeoPoint::new(-91.0, 181.0));
        assert!(distance.is_finite());
        assert!(distance >= 0.0);
    }

    #[test]
    fn missing_or_zero_location_falls_back_to_sentinel() {
        let booking = GeoPoint::new(40.7128, -74.0060);
        let unreported = GeoPoint::new(0.0, 0.0);

        assert_eq!(distance_or_sentinel(Some(&booking), None), SENTINEL_DISTANCE_MILES);
        assert_eq!(distance_or_sentinel(None, Some(&booking)), SENTINEL_DISTANCE_MILES);
        assert_eq!(
            distance_or_sentinel(Some(&booking), Some(&unreported)),
            SENTINEL_DISTANCE_MILES
        );
        assert!(distance_or_sentinel(Some(&booking), Some(&booking)) < 1e-9);
    }
}
