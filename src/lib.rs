//! # Whep Density
//!
//! Density clustering of nearby points of interest ("wheps") for map overlays.
//!
//! This library provides:
//! - Greedy densest-cluster extraction over the visible map region
//! - Rendering-ready overlay records (center, radius, polygon, density)
//! - A count legend for colouring overlays
//! - Map span clamping for the committed region
//!
//! ## Features
//!
//! - **`parallel`** - Score cluster candidates in parallel with rayon
//! - **`serde`** - Serde derives matching the backend JSON shape
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use whep_density::{GeoPoint, Region, build_density_grids};
//!
//! let region = Region::new(51.0, -1.0, 52.0, 0.0);
//! let points = vec![
//!     GeoPoint::new("a", 51.5074, -0.1278),
//!     GeoPoint::new("b", 51.5080, -0.1290),
//!     GeoPoint::new("c", 51.5090, -0.1300),
//! ];
//!
//! if let Some(grids) = build_density_grids(&region, &points) {
//!     for grid in &grids {
//!         println!("{} wheps around {:?}", grid.count(), grid.center().id);
//!     }
//! }
//! ```

use std::fmt;

pub mod geo_utils;
pub use geo_utils::SpanLimits;

// Density grid clustering
pub mod density;
pub use density::{
    DensityConfig, DensityGrid, GridWindow,
    build_density_grids, build_density_grids_with_config, grid_window,
    MAX_PASSES, MAX_WINDOW_DELTA, MIN_POINTS_TO_CLUSTER, WINDOW_FRACTION,
};

#[cfg(feature = "parallel")]
pub use density::build_density_grids_parallel;

// Rendering-facing derivations
pub mod overlay;
pub use overlay::{
    DensityOverlay, LegendEntry,
    clustered_point_ids, density_legend, legend_from_overlays, overlays_from_grids,
};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("WhepDensityRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A plain latitude/longitude pair.
///
/// # Example
/// ```
/// use whep_density::MapCoordinate;
/// let london = MapCoordinate::new(51.5074, -0.1278);
/// assert!(london.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl MapCoordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the coordinate is finite and within WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A geo-tagged whep as received from the backend.
///
/// Every field is optional on the wire. A point only takes part in
/// clustering when it has an identifier and both coordinates; see
/// [`GeoPoint::located`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    /// Stable whep identifier, used for ordering and de-duplication
    #[cfg_attr(feature = "serde", serde(rename = "whepId"))]
    pub id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoPoint {
    /// Create a fully populated point.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Some(id.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Identifier and coordinates, if all three are present.
    pub fn located(&self) -> Option<(&str, MapCoordinate)> {
        let id = self.id.as_deref()?;
        let latitude = self.latitude?;
        let longitude = self.longitude?;
        Some((id, MapCoordinate::new(latitude, longitude)))
    }
}

/// The visible map area as a south-west / north-east bounding box.
///
/// Any corner may be missing (nothing committed yet). A west longitude
/// greater than the east longitude means the box straddles the ±180°
/// meridian.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub latitude_sw: Option<f64>,
    pub longitude_sw: Option<f64>,
    pub latitude_ne: Option<f64>,
    pub longitude_ne: Option<f64>,
}

/// A region with all four corners present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl RegionBounds {
    /// True when the box crosses the antimeridian.
    pub fn wraps_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn latitude_delta(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees, measured eastwards across ±180° when wrapping.
    pub fn longitude_delta(&self) -> f64 {
        if self.wraps_antimeridian() {
            (180.0 - self.west) + (self.east + 180.0)
        } else {
            self.east - self.west
        }
    }

    /// Center of the box, with the longitude wrapped back into -180..180.
    pub fn center(&self) -> MapCoordinate {
        MapCoordinate::new(
            (self.south + self.north) / 2.0,
            geo_utils::wrap_longitude(self.west + self.longitude_delta() / 2.0),
        )
    }
}

impl Region {
    /// Create a region with all corners present.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            latitude_sw: Some(south),
            longitude_sw: Some(west),
            latitude_ne: Some(north),
            longitude_ne: Some(east),
        }
    }

    /// Create a region around a center with the given full spans.
    ///
    /// Latitudes are clamped to the poles; longitudes wrap across ±180°.
    ///
    /// # Example
    /// ```
    /// use whep_density::{MapCoordinate, Region};
    ///
    /// let region = Region::from_center_span(MapCoordinate::new(0.0, 179.0), 2.0, 4.0);
    /// let bounds = region.bounds().unwrap();
    /// assert!(bounds.wraps_antimeridian());
    /// assert!((bounds.longitude_delta() - 4.0).abs() < 1e-9);
    /// ```
    pub fn from_center_span(center: MapCoordinate, latitude_delta: f64, longitude_delta: f64) -> Self {
        let half_lat = latitude_delta / 2.0;
        let half_lng = longitude_delta / 2.0;
        Self::new(
            (center.latitude - half_lat).max(-90.0),
            geo_utils::wrap_longitude(center.longitude - half_lng),
            (center.latitude + half_lat).min(90.0),
            geo_utils::wrap_longitude(center.longitude + half_lng),
        )
    }

    /// All four corners, or `None` if any is missing.
    pub fn bounds(&self) -> Option<RegionBounds> {
        Some(RegionBounds {
            south: self.latitude_sw?,
            west: self.longitude_sw?,
            north: self.latitude_ne?,
            east: self.longitude_ne?,
        })
    }

    /// Keep the region within the zoom limits of the map screen.
    ///
    /// A region whose latitude span is above the maximum (or below the
    /// minimum) is re-centred with the maximum (or minimum) spans. Any
    /// other region is returned unchanged.
    pub fn clamp_span(&self, limits: &SpanLimits) -> Option<Region> {
        let bounds = self.bounds()?;
        let latitude_delta = bounds.latitude_delta();

        let clamped = if latitude_delta > limits.max_latitude_delta {
            Region::from_center_span(bounds.center(), limits.max_latitude_delta, limits.max_longitude_delta)
        } else if latitude_delta < limits.min_latitude_delta {
            Region::from_center_span(bounds.center(), limits.min_latitude_delta, limits.min_longitude_delta)
        } else {
            self.clone()
        };

        Some(clamped)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            Some(b) => write!(f, "[{:.5},{:.5}]-[{:.5},{:.5}]", b.south, b.west, b.north, b.east),
            None => write!(f, "[incomplete region]"),
        }
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::info;

    /// Cluster the wheps in a region into overlay records.
    #[uniffi::export]
    pub fn ffi_build_density_overlays(region: Region, points: Vec<GeoPoint>) -> Option<Vec<DensityOverlay>> {
        init_logging();
        info!("[WhepDensityRust] build_density_overlays called for {} with {} points", region, points.len());

        let start = std::time::Instant::now();
        let grids = build_density_grids_parallel(&region, &points, &DensityConfig::default())?;
        let overlays = overlays_from_grids(&grids);

        info!("[WhepDensityRust] Built {} overlays in {:?}", overlays.len(), start.elapsed());
        Some(overlays)
    }

    /// Legend entries for a set of overlays, highest count first.
    #[uniffi::export]
    pub fn ffi_density_legend(overlays: Vec<DensityOverlay>) -> Vec<LegendEntry> {
        legend_from_overlays(&overlays)
    }

    /// Clamp a region to the given zoom limits.
    #[uniffi::export]
    pub fn ffi_clamp_region(region: Region, limits: SpanLimits) -> Option<Region> {
        init_logging();
        let clamped = region.clamp_span(&limits)?;
        if clamped != region {
            info!("[WhepDensityRust] Region {} clamped to {}", region, clamped);
        }
        Some(clamped)
    }

    /// Zoom limits used by the map screen.
    #[uniffi::export]
    pub fn ffi_default_span_limits() -> SpanLimits {
        SpanLimits::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
