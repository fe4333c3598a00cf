//! Coarse bounding-box prefilter for radius queries.

use icare_core::proximity::EARTH_RADIUS_KM;
use icare_core::FacilityLocation;

/// Widens the box slightly so points on the circle survive float rounding.
const MARGIN: f64 = 1.01;

/// Latitude/longitude box that fully contains a circle. Exact distances are
/// computed afterwards by the ranker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn around(center: FacilityLocation, radius_km: f64) -> Self {
        // Same sphere as the haversine ranker.
        let lat_delta = (radius_km / EARTH_RADIUS_KM).to_degrees() * MARGIN;
        // Never let cos() collapse the box near the poles.
        let cos_lat = center.latitude.to_radians().cos().abs().max(0.01);
        let lng_delta = lat_delta / cos_lat;
        Self {
            min_latitude: center.latitude - lat_delta,
            max_latitude: center.latitude + lat_delta,
            min_longitude: center.longitude - lng_delta,
            max_longitude: center.longitude + lng_delta,
        }
    }

    #[must_use]
    pub fn contains(&self, location: FacilityLocation) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&location.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&location.longitude)
    }
}
