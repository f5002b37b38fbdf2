//! Reduce a synthetic contour drawing and print the per-layer summary.
//!
//! Run with: cargo run -p mesh-reduce --example reduce_contours

use mesh_reduce::{PipelineParams, Polyline, PolylineSet, run_pipeline};
use nalgebra::Point3;

fn main() -> Result<(), mesh_reduce::ReduceError> {
    // Synthetic survey drawing: dense elevation contours plus a closed
    // site boundary, offset far from the origin the way national-grid
    // coordinates are.
    let mut polylines = Vec::new();

    for contour in 0..10 {
        let z = contour as f64 * 2.0;
        let points = (0..400)
            .map(|i| {
                let t = i as f64 * 0.02;
                Point3::new(
                    500_000.0 + t * 50.0,
                    250_000.0 + (t * 3.0).sin() * 20.0 + contour as f64,
                    z,
                )
            })
            .collect();
        polylines.push(Polyline::with_layer(points, false, "Contours"));
    }

    let boundary = (0..4)
        .map(|i| {
            let (x, y) = match i {
                0 => (0.0, 0.0),
                1 => (500.0, 0.0),
                2 => (500.0, 300.0),
                _ => (0.0, 300.0),
            };
            Point3::new(500_000.0 + x, 250_000.0 + y, 0.0)
        })
        .collect();
    polylines.push(Polyline::with_layer(boundary, true, "Boundary"));

    let set = PolylineSet::from_polylines(polylines);
    let result = run_pipeline(&set, &PipelineParams::default())?;

    println!("center: {:.1?}", result.center);
    for layer in &result.meshes {
        let c = &layer.report.counts;
        println!(
            "{:<12} {:>7} -> {:>6} vertices ({} welded, {} dissolved, ratio {:.2})",
            layer.name,
            c.initial,
            c.after_decimate,
            layer.report.vertices_welded,
            layer.report.vertices_dissolved,
            layer.report.achieved_ratio,
        );
    }
    println!(
        "overall: {} -> {} vertices ({:.1}% reduction)",
        result.telemetry.initial_vertices,
        result.telemetry.final_vertices,
        result.telemetry.reduction() * 100.0
    );

    Ok(())
}
