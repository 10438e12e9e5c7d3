//! # Geographic Utilities
//!
//! Geographic helpers used by the density grids and the map region.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two coordinates |
//! | [`wrap_longitude`] | Bring a longitude back into -180..180 |
//! | [`window_radius_meters`] | Overlay circle radius for a grid window |
//! | [`window_polygon`] | Overlay rectangle for a grid window |
//!
//! ## Example
//!
//! ```rust
//! use whep_density::{MapCoordinate, geo_utils};
//!
//! let center = MapCoordinate::new(51.5074, -0.1278);
//!
//! // A 0.1° tall window is about 11km across, so its circle is ~5.5km
//! let radius = geo_utils::window_radius_meters(&center, 0.1);
//! assert!((radius - 5_560.0).abs() < 50.0);
//! ```
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).
//! `geo` types use x = longitude and y = latitude.

use geo::{Distance, Haversine, LineString, Point, Polygon};
use crate::MapCoordinate;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two coordinates.
///
/// ```rust
/// use whep_density::{MapCoordinate, geo_utils};
///
/// let london = MapCoordinate::new(51.5074, -0.1278);
/// let paris = MapCoordinate::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &MapCoordinate, p2: &MapCoordinate) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Wrap a longitude into -180..=180.
///
/// Values that land exactly on the meridian keep the sign of the input,
/// so `180.0` stays `180.0` and `-180.0` stays `-180.0`.
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        return longitude;
    }
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && longitude > 0.0 {
        180.0
    } else {
        wrapped
    }
}

// =============================================================================
// Grid Window Geometry
// =============================================================================

/// Radius in meters of the circle drawn for a grid window.
///
/// Measured from the center to the northern edge of the window, i.e. half
/// of `latitude_delta` northwards.
pub fn window_radius_meters(center: &MapCoordinate, latitude_delta: f64) -> f64 {
    let edge = MapCoordinate::new(center.latitude + latitude_delta / 2.0, center.longitude);
    haversine_distance(center, &edge)
}

/// Closed rectangle covering a grid window around `center`.
///
/// Corners run south-west, south-east, north-east, north-west.
pub fn window_polygon(center: &MapCoordinate, latitude_delta: f64, longitude_delta: f64) -> Polygon<f64> {
    let half_lat = latitude_delta / 2.0;
    let half_lng = longitude_delta / 2.0;
    let south = center.latitude - half_lat;
    let north = center.latitude + half_lat;
    let west = center.longitude - half_lng;
    let east = center.longitude + half_lng;

    Polygon::new(
        LineString::from(vec![(west, south), (east, south), (east, north), (west, north)]),
        vec![],
    )
}

// =============================================================================
// Map Span Limits
// =============================================================================

/// Zoom limits for the committed map region, in degrees of span.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SpanLimits {
    /// Smallest latitude span before zooming back out. Default: 0.01
    pub min_latitude_delta: f64,
    /// Longitude span used when zooming back out. Default: 0.01
    pub min_longitude_delta: f64,
    /// Largest latitude span before zooming back in. Default: 3.0
    pub max_latitude_delta: f64,
    /// Longitude span used when zooming back in. Default: 3.0
    pub max_longitude_delta: f64,
}

impl Default for SpanLimits {
    fn default() -> Self {
        Self {
            min_latitude_delta: 0.01,
            min_longitude_delta: 0.01,
            max_latitude_delta: 3.0,
            max_longitude_delta: 3.0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
