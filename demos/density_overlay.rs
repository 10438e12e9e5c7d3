//! Cluster a handful of wheps and print the overlays and legend.
//!
//! Run with: cargo run --example density_overlay

use whep_density::{
    build_density_grids, clustered_point_ids, density_legend, overlays_from_grids,
    GeoPoint, MapCoordinate, Region, SpanLimits,
};

fn main() {
    // A zoomed-out view of London gets pulled back to the maximum span
    let requested = Region::from_center_span(MapCoordinate::new(51.5074, -0.1278), 6.0, 6.0);
    let region = match requested.clamp_span(&SpanLimits::default()) {
        Some(region) => region,
        None => {
            println!("No region yet, nothing to show");
            return;
        }
    };
    println!("Requested region: {}", requested);
    println!("Clamped region:   {}\n", region);

    let points = vec![
        // Soho
        GeoPoint::new("w01", 51.5136, -0.1365),
        GeoPoint::new("w02", 51.5140, -0.1340),
        GeoPoint::new("w03", 51.5120, -0.1310),
        GeoPoint::new("w04", 51.5150, -0.1380),
        // Greenwich
        GeoPoint::new("w05", 51.4826, -0.0077),
        GeoPoint::new("w06", 51.4810, -0.0050),
        // Oxford, on its own
        GeoPoint::new("w07", 51.7520, -1.2577),
        // Missing coordinates: skipped
        GeoPoint { id: Some("w08".to_string()), latitude: None, longitude: None },
    ];

    let grids = match build_density_grids(&region, &points) {
        Some(grids) => grids,
        None => {
            println!("Nothing to show");
            return;
        }
    };

    println!("Density overlays:");
    for overlay in overlays_from_grids(&grids) {
        println!(
            "  {:?}: {} wheps ({:.0}% of max) at {:.4},{:.4} radius {:.0}m",
            overlay.center_id,
            overlay.count,
            overlay.density * 100.0,
            overlay.center.latitude,
            overlay.center.longitude,
            overlay.radius_meters,
        );
    }

    println!("\nLegend:");
    for entry in density_legend(&grids) {
        println!("  {} / {}", entry.count, entry.max_count_for_all_grids);
    }

    println!("\nClustered wheps: {}", clustered_point_ids(&grids).join(", "));
}
