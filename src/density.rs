//! Whep density grids.
//!
//! Repeatedly picks the whep with the most neighbours inside a small
//! lat/long window, turns it and its neighbours into a grid, removes them
//! and goes around again. The number of passes bounds the number of
//! overlays that end up on the map.
//!
//! A window is `window_fraction` of the region's span on each axis. When
//! the tighter axis would exceed `max_window_delta` both axes are scaled
//! down by the same ratio, so grids stay local on a zoomed-out map.
//!
//! Membership is half-open: a neighbour must lie in
//! `(center - delta/2, center + delta/2]` on both axes.

use std::collections::HashSet;

use log::debug;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

use crate::{geo_utils, GeoPoint, MapCoordinate, Region, RegionBounds};

/// Fewer usable points than this and there is nothing to cluster.
pub const MIN_POINTS_TO_CLUSTER: u32 = 1;
/// Maximum number of passes, and so of grids on the map.
pub const MAX_PASSES: u32 = 2;
/// Share of the region span used for the grid window.
pub const WINDOW_FRACTION: f64 = 0.15;
/// Upper bound on the tighter window axis, in degrees.
pub const MAX_WINDOW_DELTA: f64 = 0.10;

/// Configuration for density grid building.
#[derive(Debug, Clone)]
pub struct DensityConfig {
    /// Stop when fewer points than this remain. Default: 1
    pub min_points_to_cluster: u32,
    /// Maximum number of grids produced. Default: 2
    pub max_passes: u32,
    /// Window size as a fraction of the region span. Default: 0.15
    pub window_fraction: f64,
    /// Largest allowed window on its tighter axis (degrees). Default: 0.10
    pub max_window_delta: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            min_points_to_cluster: MIN_POINTS_TO_CLUSTER,
            max_passes: MAX_PASSES,
            window_fraction: WINDOW_FRACTION,
            max_window_delta: MAX_WINDOW_DELTA,
        }
    }
}

/// Full lat/long extent of the window around a grid center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridWindow {
    /// Full window height in degrees. Membership uses half of it either side of the center.
    pub latitude_delta: f64,
    /// Full window width in degrees. Membership uses half of it either side of the center.
    pub longitude_delta: f64,
}

impl GridWindow {
    /// Half-open membership test around `center`.
    fn contains(&self, center: &MapCoordinate, other: &MapCoordinate) -> bool {
        let (south, north, west, east) = self.edges(center);
        other.latitude > south
            && other.latitude <= north
            && other.longitude > west
            && other.longitude <= east
    }

    fn edges(&self, center: &MapCoordinate) -> (f64, f64, f64, f64) {
        (
            center.latitude - self.latitude_delta / 2.0,
            center.latitude + self.latitude_delta / 2.0,
            center.longitude - self.longitude_delta / 2.0,
            center.longitude + self.longitude_delta / 2.0,
        )
    }
}

/// Compute the grid window for a region.
///
/// # Example
/// ```
/// use whep_density::{DensityConfig, Region, grid_window};
///
/// // 10° x 20° region: 1.5° x 3.0° before rescaling, tighter axis capped at 0.1°
/// let bounds = Region::new(0.0, 0.0, 10.0, 20.0).bounds().unwrap();
/// let window = grid_window(&bounds, &DensityConfig::default());
/// assert!((window.latitude_delta - 0.1).abs() < 1e-12);
/// assert!((window.longitude_delta - 0.2).abs() < 1e-12);
/// ```
pub fn grid_window(bounds: &RegionBounds, config: &DensityConfig) -> GridWindow {
    let mut latitude_delta = bounds.latitude_delta() * config.window_fraction;
    let mut longitude_delta = bounds.longitude_delta() * config.window_fraction;

    debug!("grid window before rescale: lat={} lng={}", latitude_delta, longitude_delta);

    let smallest = latitude_delta.min(longitude_delta);
    if smallest > config.max_window_delta {
        let ratio = config.max_window_delta / smallest;
        latitude_delta *= ratio;
        longitude_delta *= ratio;
        debug!("grid window after rescale: lat={} lng={}", latitude_delta, longitude_delta);
    }

    GridWindow { latitude_delta, longitude_delta }
}

/// One cluster: a center whep plus the wheps in its window.
///
/// Values are built once the whole result is known and are not changed
/// afterwards; `count` is always derived from the membership.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DensityGrid {
    center: GeoPoint,
    other_points: Vec<GeoPoint>,
    center_latitude: f64,
    center_longitude: f64,
    latitude_delta: f64,
    longitude_delta: f64,
    max_count_for_all_grids: u32,
}

impl DensityGrid {
    /// The anchor whep.
    pub fn center(&self) -> &GeoPoint {
        &self.center
    }

    /// Neighbours of the anchor, in input order (anchor excluded).
    pub fn other_points(&self) -> &[GeoPoint] {
        &self.other_points
    }

    pub fn center_coordinate(&self) -> MapCoordinate {
        MapCoordinate::new(self.center_latitude, self.center_longitude)
    }

    pub fn center_latitude(&self) -> f64 {
        self.center_latitude
    }

    pub fn center_longitude(&self) -> f64 {
        self.center_longitude
    }

    /// Full window height in degrees; members were tested against half of it.
    pub fn latitude_delta(&self) -> f64 {
        self.latitude_delta
    }

    /// Full window width in degrees; members were tested against half of it.
    pub fn longitude_delta(&self) -> f64 {
        self.longitude_delta
    }

    /// Largest `count` among the grids of the same result.
    pub fn max_count_for_all_grids(&self) -> u32 {
        self.max_count_for_all_grids
    }

    /// Anchor plus neighbours.
    pub fn count(&self) -> u32 {
        1 + self.other_points.len() as u32
    }

    /// `count / max_count_for_all_grids`, for colour intensity.
    pub fn density(&self) -> f32 {
        if self.max_count_for_all_grids == 0 {
            return 0.0;
        }
        self.count() as f32 / self.max_count_for_all_grids as f32
    }

    /// Radius of the overlay circle in meters.
    pub fn radius_meters(&self) -> f64 {
        geo_utils::window_radius_meters(&self.center_coordinate(), self.latitude_delta)
    }

    /// Overlay rectangle covering the window.
    pub fn polygon(&self) -> geo::Polygon<f64> {
        geo_utils::window_polygon(&self.center_coordinate(), self.latitude_delta, self.longitude_delta)
    }

    /// Ids of the anchor and every neighbour.
    pub fn point_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(&self.center)
            .chain(self.other_points.iter())
            .filter_map(|p| p.id.as_deref())
    }
}

// ============================================================================
// Builder internals
// ============================================================================

/// A point that has an id and finite coordinates.
#[derive(Debug, Clone, Copy)]
struct Located<'a> {
    point: &'a GeoPoint,
    id: &'a str,
    coord: MapCoordinate,
}

impl<'a> Located<'a> {
    fn from_point(point: &'a GeoPoint) -> Option<Self> {
        let (id, coord) = point.located()?;
        // A non-finite point never falls inside any window
        if !coord.latitude.is_finite() || !coord.longitude.is_finite() {
            return None;
        }
        Some(Self { point, id, coord })
    }
}

/// Candidate grid during a pass. Indices point into the located list.
#[derive(Debug, Clone)]
struct Candidate {
    center: usize,
    members: Vec<usize>,
}

impl Candidate {
    fn count(&self) -> usize {
        1 + self.members.len()
    }
}

/// Spatial index over the points still in play for one pass.
///
/// Each entry carries its position in `remaining` so query results can be
/// put back in input order.
struct NeighbourIndex<'a> {
    located: &'a [Located<'a>],
    remaining: &'a [usize],
    tree: RTree<GeomWithData<[f64; 2], usize>>,
    window: GridWindow,
}

impl<'a> NeighbourIndex<'a> {
    fn new(located: &'a [Located<'a>], remaining: &'a [usize], window: GridWindow) -> Self {
        let entries: Vec<GeomWithData<[f64; 2], usize>> = remaining
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let c = located[i].coord;
                GeomWithData::new([c.longitude, c.latitude], pos)
            })
            .collect();

        Self {
            located,
            remaining,
            tree: RTree::bulk_load(entries),
            window,
        }
    }

    /// Candidate grid centered on `remaining[pos]`.
    fn candidate_at(&self, pos: usize) -> Candidate {
        let center_index = self.remaining[pos];
        let center = &self.located[center_index];
        let (south, north, west, east) = self.window.edges(&center.coord);

        // The closed envelope is a superset of the half-open window
        let envelope = AABB::from_corners([west, south], [east, north]);

        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .filter(|&p| {
                let other = &self.located[self.remaining[p]];
                other.id != center.id && self.window.contains(&center.coord, &other.coord)
            })
            .collect();
        positions.sort_unstable();

        Candidate {
            center: center_index,
            members: positions.into_iter().map(|p| self.remaining[p]).collect(),
        }
    }

    fn len(&self) -> usize {
        self.remaining.len()
    }
}

/// Highest count wins; on a tie the earliest candidate stays.
fn densest(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(best) if candidate.count() <= best.count() => Some(best),
        _ => Some(candidate),
    })
}

/// Run the removing passes. `score` produces one candidate per remaining
/// point, in `remaining` order.
fn extract_grids<'a, F>(
    located: &'a [Located<'a>],
    window: GridWindow,
    config: &DensityConfig,
    score: F,
) -> Vec<Candidate>
where
    F: Fn(&NeighbourIndex<'_>) -> Vec<Candidate>,
{
    let mut remaining: Vec<usize> = (0..located.len()).collect();
    let mut selected: Vec<Candidate> = Vec::new();
    let mut consumed: HashSet<&str> = HashSet::new();

    debug!("density grid start: remaining={}", remaining.len());

    for pass in 1..=config.max_passes {
        let candidates = {
            let index = NeighbourIndex::new(located, &remaining, window);
            score(&index)
        };
        debug!("pass {}: {} candidates", pass, candidates.len());

        let best = match densest(candidates) {
            Some(best) => best,
            None => {
                debug!("pass {}: no candidates, stopping", pass);
                break;
            }
        };

        debug!("pass {}: densest count={} center={}", pass, best.count(), located[best.center].id);

        if best.count() == 1 {
            debug!("pass {}: densest is a singleton, stopping", pass);
            break;
        }

        consumed.insert(located[best.center].id);
        consumed.extend(best.members.iter().map(|&i| located[i].id));
        selected.push(best);

        remaining.retain(|&i| !consumed.contains(located[i].id));
        debug!("pass {}: remaining={}", pass, remaining.len());

        if remaining.len() < config.min_points_to_cluster as usize {
            debug!("pass {}: too few points left, stopping", pass);
            break;
        }
    }

    selected
}

/// Turn the selected candidates into grids once the max count is known.
fn finalize(located: &[Located<'_>], selected: Vec<Candidate>, window: GridWindow) -> Vec<DensityGrid> {
    let max_count = selected.iter().map(|c| c.count() as u32).max().unwrap_or(0);

    selected
        .into_iter()
        .map(|candidate| {
            let center = &located[candidate.center];
            DensityGrid {
                center: center.point.clone(),
                other_points: candidate.members.iter().map(|&i| located[i].point.clone()).collect(),
                center_latitude: center.coord.latitude,
                center_longitude: center.coord.longitude,
                latitude_delta: window.latitude_delta,
                longitude_delta: window.longitude_delta,
                max_count_for_all_grids: max_count,
            }
        })
        .collect()
}

fn build_with<F>(region: &Region, points: &[GeoPoint], config: &DensityConfig, score: F) -> Option<Vec<DensityGrid>>
where
    F: Fn(&NeighbourIndex<'_>) -> Vec<Candidate>,
{
    let bounds = match region.bounds() {
        Some(bounds) => bounds,
        None => {
            debug!("density grid: region is incomplete");
            return None;
        }
    };

    if points.len() < config.min_points_to_cluster as usize {
        debug!("density grid: {} points, nothing to cluster", points.len());
        return None;
    }

    let window = grid_window(&bounds, config);
    let located: Vec<Located<'_>> = points.iter().filter_map(Located::from_point).collect();

    let selected = extract_grids(&located, window, config, score);
    let grids = finalize(&located, selected, window);

    debug!("density grid end: {} grids", grids.len());
    Some(grids)
}

// ============================================================================
// Public entry points
// ============================================================================

/// Build density grids with the default configuration.
///
/// Returns `None` when the region is missing a corner or there are fewer
/// than [`MIN_POINTS_TO_CLUSTER`] input points. An empty list means no
/// whep had a neighbour.
///
/// # Example
/// ```
/// use whep_density::{GeoPoint, Region, build_density_grids};
///
/// let region = Region::new(0.0, 0.0, 10.0, 10.0);
/// let points: Vec<GeoPoint> = (0..5)
///     .map(|i| GeoPoint::new(format!("w{}", i), 5.0 + i as f64 * 0.002, 5.0))
///     .collect();
///
/// let grids = build_density_grids(&region, &points).unwrap();
/// assert_eq!(grids.len(), 1);
/// assert_eq!(grids[0].count(), 5);
/// ```
pub fn build_density_grids(region: &Region, points: &[GeoPoint]) -> Option<Vec<DensityGrid>> {
    build_density_grids_with_config(region, points, &DensityConfig::default())
}

/// Build density grids with a custom configuration.
pub fn build_density_grids_with_config(
    region: &Region,
    points: &[GeoPoint],
    config: &DensityConfig,
) -> Option<Vec<DensityGrid>> {
    build_with(region, points, config, |index| {
        (0..index.len()).map(|pos| index.candidate_at(pos)).collect()
    })
}

/// Build density grids, scoring candidates in parallel.
///
/// Same output as [`build_density_grids_with_config`]: candidates are
/// collected in input order and the winner is picked sequentially.
#[cfg(feature = "parallel")]
pub fn build_density_grids_parallel(
    region: &Region,
    points: &[GeoPoint],
    config: &DensityConfig,
) -> Option<Vec<DensityGrid>> {
    use rayon::prelude::*;

    build_with(region, points, config, |index| {
        (0..index.len()).into_par_iter().map(|pos| index.candidate_at(pos)).collect()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(id, lat, lng)
    }

    fn ids(grid: &DensityGrid) -> Vec<&str> {
        grid.point_ids().collect()
    }

    #[test]
    fn test_incomplete_region() {
        let region = Region { longitude_sw: None, ..Region::new(0.0, 0.0, 10.0, 10.0) };
        let points = vec![point("a", 5.0, 5.0), point("b", 5.001, 5.0)];
        assert!(build_density_grids(&region, &points).is_none());
    }

    #[test]
    fn test_no_points() {
        let region = Region::new(0.0, 0.0, 10.0, 10.0);
        assert!(build_density_grids(&region, &[]).is_none());
    }

    #[test]
    fn test_single_point_gives_empty_result() {
        let region = Region::new(0.0, 0.0, 10.0, 10.0);
        let grids = build_density_grids(&region, &[point("a", 5.0, 5.0)]).unwrap();
        assert!(grids.is_empty());
    }

    #[test]
    fn test_unusable_points_are_skipped() {
        let region = Region::new(0.0, 0.0, 10.0, 10.0);
        let points = vec![
            GeoPoint { id: None, latitude: Some(5.0), longitude: Some(5.0) },
            GeoPoint { id: Some("x".into()), latitude: None, longitude: Some(5.0) },
            point("a", 5.0, 5.0),
            point("b", 5.001, 5.001),
        ];
        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].count(), 2);
        assert_eq!(ids(&grids[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_non_finite_points_are_skipped() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let mut points: Vec<GeoPoint> = (0..40)
            .map(|i| point(&format!("p{}", i), 1.0 + (i % 8) as f64 * 0.005, 1.0 + (i / 8) as f64 * 0.005))
            .collect();
        let clean = build_density_grids(&region, &points).unwrap();

        points.push(point("nan", f64::NAN, 1.0));
        points.push(point("inf", f64::INFINITY, 1.0));
        points.insert(0, point("nan-lng", 1.0, f64::NAN));

        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids, clean);
        assert!(grids.iter().all(|g| g.point_ids().all(|id| !id.starts_with("nan") && id != "inf")));
    }

    #[test]
    fn test_only_non_finite_points() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![point("a", f64::NAN, 1.0), point("b", f64::NAN, 1.0)];
        assert_eq!(build_density_grids(&region, &points), Some(vec![]));
    }

    #[test]
    fn test_only_unusable_points() {
        let region = Region::new(0.0, 0.0, 10.0, 10.0);
        let points = vec![GeoPoint::default(), GeoPoint::default()];
        assert_eq!(build_density_grids(&region, &points), Some(vec![]));
    }

    #[test]
    fn test_window_rescale() {
        let bounds = Region::new(0.0, 0.0, 4.0, 8.0).bounds().unwrap();
        let window = grid_window(&bounds, &DensityConfig::default());
        // 0.6 x 1.2, smaller axis scaled to 0.1
        assert!((window.latitude_delta - 0.1).abs() < 1e-12);
        assert!((window.longitude_delta - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_window_not_rescaled_when_small() {
        let bounds = Region::new(0.0, 0.0, 0.4, 2.0).bounds().unwrap();
        let window = grid_window(&bounds, &DensityConfig::default());
        // 0.06 x 0.3: tighter axis already under the cap
        assert!((window.latitude_delta - 0.06).abs() < 1e-12);
        assert!((window.longitude_delta - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_window_wraparound_region() {
        let bounds = Region::new(-1.0, 170.0, 1.0, -170.0).bounds().unwrap();
        let window = grid_window(&bounds, &DensityConfig::default());
        // 2° x 20° span: 0.3 x 3.0 scaled by 1/3
        assert!(window.longitude_delta > 0.0);
        assert!((window.latitude_delta - 0.1).abs() < 1e-12);
        assert!((window.longitude_delta - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_tight_cluster() {
        let region = Region::new(0.0, 0.0, 10.0, 10.0);
        let points: Vec<GeoPoint> = (0..5)
            .map(|i| point(&format!("w{}", i), 5.0 + i as f64 * 0.002, 5.0 + i as f64 * 0.002))
            .collect();

        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].count(), 5);
        assert_eq!(grids[0].max_count_for_all_grids(), 5);
        assert_eq!(grids[0].density(), 1.0);
    }

    #[test]
    fn test_pass_limit_caps_grid_count() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![
            point("a1", 1.0, 1.0),
            point("a2", 1.01, 1.01),
            point("b1", 2.5, 2.5),
            point("b2", 2.51, 2.51),
            point("c1", 3.8, 0.2),
            point("c2", 3.81, 0.21),
        ];

        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(ids(&grids[0]), vec!["a1", "a2"]);
        assert_eq!(ids(&grids[1]), vec!["b1", "b2"]);
        assert!(grids.iter().all(|g| g.count() == 2 && g.max_count_for_all_grids() == 2));
    }

    #[test]
    fn test_scattered_points_give_empty_result() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![
            point("a", 0.5, 0.5),
            point("b", 1.5, 1.5),
            point("c", 2.5, 2.5),
            point("d", 3.5, 3.5),
        ];
        assert_eq!(build_density_grids(&region, &points), Some(vec![]));
    }

    #[test]
    fn test_densest_grid_comes_first() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![
            point("s1", 1.0, 1.0),
            point("s2", 1.01, 1.0),
            point("d1", 3.0, 3.0),
            point("d2", 3.01, 3.0),
            point("d3", 3.02, 3.0),
        ];

        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].count(), 3);
        assert_eq!(grids[1].count(), 2);
        assert!(grids.iter().all(|g| g.max_count_for_all_grids() == 3));
        assert!((grids[1].density() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        // Window 0.1 x 0.1, half-width 0.05. Each point sees only the other.
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![point("first", 2.0, 2.0), point("second", 2.02, 2.02)];
        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids[0].center().id.as_deref(), Some("first"));
        assert_eq!(ids(&grids[0]), vec!["first", "second"]);
    }

    #[test]
    fn test_half_open_window_boundary() {
        // 0.4° x 0.4° region: window 0.06 x 0.06, half-width 0.03
        let region = Region::new(0.0, 0.0, 0.4, 0.4);
        let config = DensityConfig { max_passes: 1, ..DensityConfig::default() };
        let window = grid_window(&region.bounds().unwrap(), &config);
        let half = window.latitude_delta / 2.0;

        // "low" is exactly on the lower (exclusive) edge of "c"'s window,
        // "high" exactly on the upper (inclusive) edge.
        let c = 0.2;
        let points = vec![
            point("c", c, c),
            point("low", c - half, c),
            point("high", c + half, c),
        ];

        let grids = build_density_grids_with_config(&region, &points, &config).unwrap();
        assert_eq!(grids.len(), 1);
        // "c" sees only "high". No other candidate beats a count of 2 and "c" is scored first.
        assert_eq!(grids[0].center().id.as_deref(), Some("c"));
        assert_eq!(ids(&grids[0]), vec!["c", "high"]);
    }

    #[test]
    fn test_points_never_shared_between_grids() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points: Vec<GeoPoint> = (0..20)
            .map(|i| point(&format!("p{}", i), 1.0 + (i % 5) as f64 * 0.015, 1.0 + (i / 5) as f64 * 0.02))
            .collect();

        let grids = build_density_grids(&region, &points).unwrap();
        assert!(!grids.is_empty());
        assert!(grids.len() as u32 <= MAX_PASSES);

        let mut seen = HashSet::new();
        for grid in &grids {
            assert!(grid.count() >= 2);
            for id in grid.point_ids() {
                assert!(seen.insert(id.to_string()), "{} appears twice", id);
            }
        }

        let max = grids.iter().map(|g| g.count()).max().unwrap();
        assert!(grids.iter().all(|g| g.max_count_for_all_grids() == max));
    }

    #[test]
    fn test_duplicate_ids_removed_together() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![
            point("a", 1.0, 1.0),
            point("b", 1.01, 1.01),
            // Same id far away: consumed with "a"
            point("a", 3.0, 3.0),
            point("c", 3.01, 3.01),
        ];

        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(ids(&grids[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_antimeridian_region() {
        let region = Region::new(-1.0, 170.0, 1.0, -170.0);
        let points = vec![point("a", 0.0, 175.0), point("b", 0.01, 175.01)];
        let grids = build_density_grids(&region, &points).unwrap();
        assert_eq!(grids.len(), 1);
        assert!((grids[0].longitude_delta() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_geometry() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points = vec![point("a", 2.0, 2.0), point("b", 2.01, 2.01)];
        let grids = build_density_grids(&region, &points).unwrap();
        let grid = &grids[0];

        assert_eq!(grid.center_coordinate(), MapCoordinate::new(2.0, 2.0));
        // Half of a 0.1° window is ~5.56km
        assert!((grid.radius_meters() - 5_560.0).abs() < 50.0);
        assert_eq!(grid.polygon().exterior().coords().count(), 5);
    }

    #[test]
    fn test_build_is_repeatable() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points: Vec<GeoPoint> = (0..12)
            .map(|i| point(&format!("p{}", i), 1.0 + (i % 4) as f64 * 0.03, 1.0 + (i / 4) as f64 * 0.03))
            .collect();

        let first = build_density_grids(&region, &points);
        let second = build_density_grids(&region, &points);
        assert_eq!(first, second);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let region = Region::new(0.0, 0.0, 4.0, 4.0);
        let points: Vec<GeoPoint> = (0..40)
            .map(|i| point(&format!("p{}", i), 1.0 + (i % 7) as f64 * 0.013, 1.0 + (i / 7) as f64 * 0.017))
            .collect();
        let config = DensityConfig::default();

        assert_eq!(
            build_density_grids_parallel(&region, &points, &config),
            build_density_grids_with_config(&region, &points, &config),
        );
    }
}
