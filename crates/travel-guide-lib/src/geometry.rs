//! Geographic primitives shared by the guide tree and the projection engine

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Earth's mean radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Zoom used when every point of a bounding box collapses onto one location
pub const SINGLE_POINT_ZOOM: f64 = 12.0;

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the point is a finite coordinate inside the WGS84 range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in meters (Haversine formula)
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Coord {
            x: point.lng,
            y: point.lat,
        }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(coord: Coord<f64>) -> Self {
        GeoPoint::new(coord.y, coord.x)
    }
}

/// Arithmetic mean of the latitudes and longitudes, `None` for an empty slice
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let count = points.len() as f64;
    let (lat_sum, lng_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(GeoPoint::new(lat_sum / count, lng_sum / count))
}

/// Total length of a polyline in meters
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].haversine_distance(&pair[1]))
        .sum()
}

/// Axis-aligned lat/lng bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    rect: Rect<f64>,
}

impl Bounds {
    /// Smallest box containing a single point
    pub fn around(point: GeoPoint) -> Self {
        Self {
            rect: Rect::new(Coord::from(point), Coord::from(point)),
        }
    }

    /// Smallest box containing every point, `None` when there are none
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut points = points.into_iter();
        let mut bounds = Self::around(points.next()?);
        for point in points {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Grow the box so it contains `point`
    pub fn extend(&mut self, point: GeoPoint) {
        let min = self.rect.min();
        let max = self.rect.max();
        self.rect = Rect::new(
            Coord {
                x: min.x.min(point.lng),
                y: min.y.min(point.lat),
            },
            Coord {
                x: max.x.max(point.lng),
                y: max.y.max(point.lat),
            },
        );
    }

    /// South-west corner
    pub fn south_west(&self) -> GeoPoint {
        self.rect.min().into()
    }

    /// North-east corner
    pub fn north_east(&self) -> GeoPoint {
        self.rect.max().into()
    }

    pub fn center(&self) -> GeoPoint {
        self.rect.center().into()
    }

    pub fn lat_span(&self) -> f64 {
        self.rect.height()
    }

    pub fn lng_span(&self) -> f64 {
        self.rect.width()
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        let min = self.rect.min();
        let max = self.rect.max();
        (min.y..=max.y).contains(&point.lat) && (min.x..=max.x).contains(&point.lng)
    }

    /// Zoom level at which the whole box fits a typical viewport
    pub fn fit_zoom(&self) -> f64 {
        let max_span = self.lat_span().abs().max(self.lng_span().abs());
        if max_span > 0.0 {
            let zoom_estimate = (4.0 * 360.0 / max_span).log2();
            (zoom_estimate - 0.5).clamp(1.0, 18.0)
        } else {
            SINGLE_POINT_ZOOM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_is_arithmetic_mean() {
        let points = [
            GeoPoint::new(35.0, 139.0),
            GeoPoint::new(36.0, 140.0),
            GeoPoint::new(37.0, 141.0),
        ];
        let center = centroid(&points).unwrap();
        assert!((center.lat - 36.0).abs() < 1e-9);
        assert!((center.lng - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_empty() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_bounds_extend_and_contains() {
        let mut bounds = Bounds::around(GeoPoint::new(35.6762, 139.6503));
        bounds.extend(GeoPoint::new(35.66, 139.70));

        assert!(bounds.contains(GeoPoint::new(35.6762, 139.6503)));
        assert!(bounds.contains(GeoPoint::new(35.66, 139.70)));
        assert!(!bounds.contains(GeoPoint::new(34.0, 139.68)));
        assert_eq!(bounds.south_west(), GeoPoint::new(35.66, 139.6503));
        assert_eq!(bounds.north_east(), GeoPoint::new(35.6762, 139.70));
    }

    #[test]
    fn test_bounds_from_no_points() {
        assert!(Bounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_fit_zoom_single_point() {
        let bounds = Bounds::around(GeoPoint::new(10.0, 10.0));
        assert_eq!(bounds.fit_zoom(), SINGLE_POINT_ZOOM);
    }

    #[test]
    fn test_fit_zoom_shrinks_with_span() {
        let city = Bounds::from_points([GeoPoint::new(35.6, 139.6), GeoPoint::new(35.7, 139.8)])
            .unwrap();
        let country =
            Bounds::from_points([GeoPoint::new(31.0, 130.0), GeoPoint::new(43.0, 145.0)]).unwrap();
        assert!(city.fit_zoom() > country.fit_zoom());
        assert!(country.fit_zoom() >= 1.0);
        assert!(city.fit_zoom() <= 18.0);
    }

    #[test]
    fn test_haversine_distance() {
        let shibuya = GeoPoint::new(35.6595, 139.7004);
        let tokyo_tower = GeoPoint::new(35.6586, 139.7454);
        let distance = shibuya.haversine_distance(&tokyo_tower);
        // Roughly four kilometers apart
        assert!(distance > 3_500.0 && distance < 4_500.0);
    }

    #[test]
    fn test_path_length_sums_legs() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        let c = GeoPoint::new(0.0, 2.0);
        let total = path_length(&[a, b, c]);
        let expected = a.haversine_distance(&b) + b.haversine_distance(&c);
        assert!((total - expected).abs() < 1e-6);
        assert_eq!(path_length(&[a]), 0.0);
    }

    #[test]
    fn test_is_valid() {
        assert!(GeoPoint::new(45.0, -90.0).is_valid());
        assert!(!GeoPoint::new(95.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
