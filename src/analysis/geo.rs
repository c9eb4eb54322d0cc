//! Great-circle distance and nearest-landmark lookup

use serde::Serialize;

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A named coordinate with an importance weight (0-100)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub name: &'static str,
    pub point: GeoPoint,
    pub weight: f64,
}

impl Landmark {
    pub const fn new(name: &'static str, lat: f64, lon: f64, weight: f64) -> Self {
        Self {
            name,
            point: GeoPoint::new(lat, lon),
            weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearestLandmark {
    pub name: &'static str,
    pub distance_m: f64,
    pub weight: f64,
}

/// Haversine distance in meters
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn distance_between(a: GeoPoint, b: GeoPoint) -> f64 {
    distance(a.lat, a.lon, b.lat, b.lon)
}

/// Linear scan for the closest landmark; the first of equally distant entries wins
pub fn nearest_landmark(point: GeoPoint, landmarks: &[Landmark]) -> Option<NearestLandmark> {
    let mut best: Option<NearestLandmark> = None;

    for landmark in landmarks {
        let d = distance_between(point, landmark.point);
        if best.map_or(true, |b| d < b.distance_m) {
            best = Some(NearestLandmark {
                name: landmark.name,
                distance_m: d,
                weight: landmark.weight,
            });
        }
    }

    best
}

/// Coordinate of a named place: exact name first, then containment either way
pub fn locate(name: &str, places: &[(&'static str, GeoPoint)]) -> Option<GeoPoint> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    places
        .iter()
        .find(|(key, _)| *key == name)
        .or_else(|| {
            places
                .iter()
                .find(|(key, _)| name.contains(key) || key.contains(name))
        })
        .map(|(_, point)| *point)
}

/// Landmark weight discounted by distance band
pub fn proximity_score(weight: f64, distance_km: f64) -> f64 {
    let factor = match distance_km {
        d if d <= 2.0 => 1.0,
        d if d <= 5.0 => 0.9,
        d if d <= 10.0 => 0.8,
        d if d <= 15.0 => 0.7,
        d if d <= 20.0 => 0.6,
        d if d <= 30.0 => 0.5,
        _ => 0.3,
    };
    (weight * factor).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_known_pair() {
        // Gangnam station to Samseong station is roughly 3.4 km
        let d = distance(37.4979, 127.0276, 37.5087, 127.0633);
        assert!((d - 3_350.0).abs() < 300.0, "got {d}");

        assert!(distance(37.5, 127.0, 37.5, 127.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = distance(37.3949, 127.1111, 37.5214, 126.9245);
        let b = distance(37.5214, 126.9245, 37.3949, 127.1111);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_landmark_first_minimum_wins() {
        let table = [
            Landmark::new("far", 38.0, 128.0, 50.0),
            Landmark::new("twin-a", 37.5, 127.1, 80.0),
            Landmark::new("twin-b", 37.5, 127.1, 90.0),
        ];
        let nearest = nearest_landmark(GeoPoint::new(37.5, 127.0), &table).unwrap();

        assert_eq!(nearest.name, "twin-a");
        assert_eq!(nearest.weight, 80.0);
        assert!(nearest_landmark(GeoPoint::new(0.0, 0.0), &[]).is_none());
    }

    #[test]
    fn test_locate_exact_before_containment() {
        let places = [
            ("목동", GeoPoint::new(1.0, 1.0)),
            ("신목동", GeoPoint::new(2.0, 2.0)),
        ];
        assert_eq!(locate("신목동", &places), Some(GeoPoint::new(2.0, 2.0)));
        assert_eq!(locate("목동1가", &places), Some(GeoPoint::new(1.0, 1.0)));
        assert_eq!(locate("역삼동", &places), None);
        assert_eq!(locate("", &places), None);
    }

    #[test]
    fn test_proximity_bands() {
        assert_eq!(proximity_score(95.0, 1.6), 95.0);
        assert_eq!(proximity_score(90.0, 4.0), 81.0);
        assert_eq!(proximity_score(80.0, 12.0), 56.0);
        assert_eq!(proximity_score(100.0, 31.0), 30.0);
    }
}
