//! Overlay records and the density legend.
//!
//! Flattens density grids into what the map layer draws: a circle (center
//! and radius) or a rectangle (polygon ring), weighted by
//! `count / max_count_for_all_grids`.

use crate::{DensityGrid, MapCoordinate};

/// A grid ready for rendering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DensityOverlay {
    /// Center whep id
    pub center_id: Option<String>,
    pub center: MapCoordinate,
    /// Circle radius in meters
    pub radius_meters: f64,
    /// Closed rectangle ring: south-west, south-east, north-east, north-west, south-west
    pub polygon: Vec<MapCoordinate>,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
    /// Wheps in the grid (center included)
    pub count: u32,
    pub max_count_for_all_grids: u32,
    /// Normalized density (0.0-1.0) for color mapping
    pub density: f32,
    /// Ids of every whep in the grid, center first
    pub point_ids: Vec<String>,
}

impl DensityOverlay {
    pub fn from_grid(grid: &DensityGrid) -> Self {
        let polygon = grid
            .polygon()
            .exterior()
            .coords()
            .map(|c| MapCoordinate::new(c.y, c.x))
            .collect();

        Self {
            center_id: grid.center().id.clone(),
            center: grid.center_coordinate(),
            radius_meters: grid.radius_meters(),
            polygon,
            latitude_delta: grid.latitude_delta(),
            longitude_delta: grid.longitude_delta(),
            count: grid.count(),
            max_count_for_all_grids: grid.max_count_for_all_grids(),
            density: grid.density(),
            point_ids: grid.point_ids().map(str::to_string).collect(),
        }
    }
}

/// One overlay per grid, in grid order.
pub fn overlays_from_grids(grids: &[DensityGrid]) -> Vec<DensityOverlay> {
    grids.iter().map(DensityOverlay::from_grid).collect()
}

/// One row of the color legend.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegendEntry {
    pub count: u32,
    pub max_count_for_all_grids: u32,
    pub density: f32,
}

fn legend_from_counts(counts: impl Iterator<Item = (u32, u32)>) -> Vec<LegendEntry> {
    let mut pairs: Vec<(u32, u32)> = counts.collect();
    pairs.sort_unstable_by(|a, b| b.cmp(a));
    pairs.dedup();

    pairs
        .into_iter()
        .map(|(count, max)| LegendEntry {
            count,
            max_count_for_all_grids: max,
            density: if max == 0 { 0.0 } else { count as f32 / max as f32 },
        })
        .collect()
}

/// Distinct `(count, max_count_for_all_grids)` pairs, highest count first.
///
/// # Example
/// ```
/// use whep_density::{GeoPoint, Region, build_density_grids, density_legend};
///
/// let region = Region::new(0.0, 0.0, 4.0, 4.0);
/// let points = vec![
///     GeoPoint::new("a", 1.0, 1.0),
///     GeoPoint::new("b", 1.01, 1.0),
///     GeoPoint::new("c", 3.0, 3.0),
///     GeoPoint::new("d", 3.01, 3.0),
///     GeoPoint::new("e", 3.02, 3.0),
/// ];
///
/// let grids = build_density_grids(&region, &points).unwrap();
/// let legend = density_legend(&grids);
/// assert_eq!(legend.len(), 2);
/// assert_eq!(legend[0].count, 3);
/// assert_eq!(legend[1].count, 2);
/// ```
pub fn density_legend(grids: &[DensityGrid]) -> Vec<LegendEntry> {
    legend_from_counts(grids.iter().map(|g| (g.count(), g.max_count_for_all_grids())))
}

/// Same as [`density_legend`], from overlay records.
pub fn legend_from_overlays(overlays: &[DensityOverlay]) -> Vec<LegendEntry> {
    legend_from_counts(overlays.iter().map(|o| (o.count, o.max_count_for_all_grids)))
}

/// Every whep id in a result, sorted.
pub fn clustered_point_ids(grids: &[DensityGrid]) -> Vec<String> {
    let mut ids: Vec<String> = grids
        .iter()
        .flat_map(|g| g.point_ids().map(str::to_string))
        .collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_density_grids, GeoPoint, Region};

    fn sample_grids() -> Vec<DensityGrid> {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![
            GeoPoint::new("s2", 1.0, 1.0),
            GeoPoint::new("s1", 1.01, 1.0),
            GeoPoint::new("d3", 3.0, 3.0),
            GeoPoint::new("d1", 3.01, 3.0),
            GeoPoint::new("d2", 3.02, 3.0),
        ];
        build_density_grids(&region, &points).unwrap()
    }

    #[test]
    fn test_overlay_from_grid() {
        let grids = sample_grids();
        let overlays = overlays_from_grids(&grids);

        assert_eq!(overlays.len(), 2);
        let first = &overlays[0];
        assert_eq!(first.center_id.as_deref(), Some("d3"));
        assert_eq!(first.center, MapCoordinate::new(3.0, 3.0));
        assert_eq!(first.count, 3);
        assert_eq!(first.max_count_for_all_grids, 3);
        assert_eq!(first.density, 1.0);
        assert_eq!(first.point_ids, vec!["d3", "d1", "d2"]);
        assert_eq!(first.polygon.len(), 5);
        assert!(first.radius_meters > 0.0);

        // South-west corner
        assert!((first.polygon[0].latitude - (3.0 - first.latitude_delta / 2.0)).abs() < 1e-12);
        assert!((first.polygon[0].longitude - (3.0 - first.longitude_delta / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_legend_distinct_pairs() {
        let grids = sample_grids();
        let legend = density_legend(&grids);
        assert_eq!(legend.len(), 2);
        assert_eq!((legend[0].count, legend[0].max_count_for_all_grids), (3, 3));
        assert_eq!((legend[1].count, legend[1].max_count_for_all_grids), (2, 3));
        assert_eq!(legend_from_overlays(&overlays_from_grids(&grids)), legend);
    }

    #[test]
    fn test_legend_dedups_equal_counts() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![
            GeoPoint::new("a1", 1.0, 1.0),
            GeoPoint::new("a2", 1.01, 1.0),
            GeoPoint::new("b1", 3.0, 3.0),
            GeoPoint::new("b2", 3.01, 3.0),
        ];
        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids.len(), 2);

        let legend = density_legend(&grids);
        assert_eq!(legend, vec![LegendEntry { count: 2, max_count_for_all_grids: 2, density: 1.0 }]);
    }

    #[test]
    fn test_legend_empty() {
        assert!(density_legend(&[]).is_empty());
        assert!(legend_from_overlays(&[]).is_empty());
    }

    #[test]
    fn test_clustered_point_ids_sorted() {
        let grids = sample_grids();
        assert_eq!(clustered_point_ids(&grids), vec!["d1", "d2", "d3", "s1", "s2"]);
    }
}
