//! Spherical-earth distance calculations shared by the location and match
//! services.

/// Mean earth radius in kilometers, as required by spec §4.3.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance between two points in kilometers, using the
/// haversine formula:
///
/// `2 * R * asin(sqrt(sin^2(dphi/2) + cos(phi1) * cos(phi2) * sin^2(dlambda/2)))`
///
/// Symmetric (`haversine(a, b) == haversine(b, a)`) and zero at identity
/// (`haversine(a, a) == 0`).
pub fn haversine(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let sin_d_phi = (d_phi / 2.0).sin();
    let sin_d_lambda = (d_lambda / 2.0).sin();

    let h = sin_d_phi * sin_d_phi + phi1.cos() * phi2.cos() * sin_d_lambda * sin_d_lambda;
    2.0 * EARTH_RADIUS_KM * h.sqrt().clamp(0.0, 1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_zero() {
        let p = GeoPoint::new(-6.2088, 106.8456);
        assert_eq!(haversine(p, p), 0.0);
    }

    #[test]
    fn is_symmetric() {
        let a = GeoPoint::new(-6.2088, 106.8456);
        let b = GeoPoint::new(-6.1754, 106.8272);
        assert_eq!(haversine(a, b), haversine(b, a));
    }

    #[test]
    fn matches_known_segment() {
        // Jakarta-ish sample segment from the spec's seed scenario #2.
        let a = GeoPoint::new(-6.20, 106.80);
        let b = GeoPoint::new(-6.21, 106.81);
        let d = haversine(a, b);
        assert!((d - 1.453).abs() < 0.01, "got {d}");
    }
}
