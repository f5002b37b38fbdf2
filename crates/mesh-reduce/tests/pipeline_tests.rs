//! End-to-end integration tests: load -> center -> group -> sweep ->
//! reduce, exercising the full pipeline the way an exporter host would.

use std::io::Write;

use mesh_reduce::{
    DecimateParams, PipelineParams, Polyline, PolylineSet, SimplifyParams, SweepParams,
    load_polylines, run_pipeline,
};
use nalgebra::Point3;
use tempfile::NamedTempFile;

/// A drawing with one straight run and one closed triangle, both on the
/// default layer.
fn contour_document() -> &'static str {
    r#"{
        "polylines": [
            {
                "points": [[0, 0, 0], [1, 0, 0], [2, 0, 0], [3, 0, 0]],
                "closed": false
            },
            {
                "points": [[0, 5, 0], [4, 5, 0], [2, 8, 0]],
                "closed": true
            }
        ],
        "stats": { "source_entities": 2 }
    }"#
}

fn reference_params() -> PipelineParams {
    PipelineParams {
        sweep: SweepParams::tube(8, 0.5),
        simplify: SimplifyParams {
            weld_distance: 0.001,
            angle_limit: 0.1,
            decimate: DecimateParams::with_target_ratio(1.0),
        },
        ..Default::default()
    }
}

#[test]
fn full_run_from_file() {
    let mut file = NamedTempFile::with_suffix(".json").unwrap();
    file.write_all(contour_document().as_bytes()).unwrap();

    let set = load_polylines(file.path()).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.stats.as_ref().unwrap()["source_entities"], 2);

    let result = run_pipeline(&set, &reference_params()).unwrap();
    assert_eq!(result.meshes.len(), 1);
    assert_eq!(result.meshes[0].name, "Default");
}

#[test]
fn contour_scenario_counts() {
    let set = mesh_reduce::polylines_from_str(contour_document(), "inline").unwrap();
    let result = run_pipeline(&set, &reference_params()).unwrap();

    // Both polylines merge into one network with two strands.
    assert_eq!(result.telemetry.strand_count, 2);

    let mesh = &result.meshes[0].mesh;

    // Before reduction: 4 rings + 3 rings of 8 vertices each.
    assert_eq!(result.meshes[0].report.counts.initial, 56);

    // The straight run's interior rings dissolve away; the triangle's
    // corner rings all survive. 2 rings + 3 rings remain.
    assert_eq!(mesh.vertex_count(), 40);

    // Ratio 1.0 leaves decimation a no-op.
    assert_eq!(result.meshes[0].report.achieved_ratio, 1.0);
}

#[test]
fn closed_strand_has_no_boundary_gap() {
    let set = mesh_reduce::polylines_from_str(contour_document(), "inline").unwrap();
    let result = run_pipeline(&set, &reference_params()).unwrap();

    let report = result.meshes[0].mesh.validate();
    assert!(report.is_valid());

    // The only boundary edges are the open run's two end rings; the
    // closed triangle tube contributes none.
    assert_eq!(report.boundary_edge_count, 16);
    assert_eq!(report.non_manifold_edge_count, 0);
}

#[test]
fn layer_grouping_order_and_counts() {
    let json = r#"{
        "polylines": [
            { "points": [[0,0,0],[1,0,0]], "layer": "A" },
            { "points": [[0,1,0],[1,1,0]], "layer": "B" },
            { "points": [[0,2,0],[1,2,0]], "layer": "A" }
        ]
    }"#;
    let set = mesh_reduce::polylines_from_str(json, "inline").unwrap();

    let groups = set.group_by_layer();
    let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys, ["A", "B"]);
    assert_eq!(groups["A"].len(), 2);
    assert_eq!(groups["B"].len(), 1);

    let result = run_pipeline(&set, &PipelineParams::default()).unwrap();
    let names: Vec<&str> = result.meshes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);
}

#[test]
fn short_polylines_are_skipped_not_fatal() {
    let mut polylines = vec![
        Polyline::with_layer(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            false,
            "L",
        );
        3
    ];
    polylines.push(Polyline::with_layer(vec![Point3::origin()], false, "L"));
    polylines.push(Polyline::with_layer(vec![], false, "L"));
    let set = PolylineSet::from_polylines(polylines);

    let result = run_pipeline(&set, &PipelineParams::default()).unwrap();

    assert_eq!(result.telemetry.strand_count, 3);
    assert_eq!(result.telemetry.degenerate_dropped, 2);
}

#[test]
fn empty_document_aborts_before_any_stage() {
    let set = mesh_reduce::polylines_from_str(r#"{ "polylines": [] }"#, "inline").unwrap();
    let err = run_pipeline(&set, &PipelineParams::default()).unwrap_err();
    assert_eq!(err.code(), mesh_reduce::ErrorCode::EmptyInput);
}

#[test]
fn centering_keeps_layers_aligned() {
    // Two layers far from the origin; after centering, their relative
    // offset must be exactly preserved.
    let json = r#"{
        "polylines": [
            { "points": [[500000, 0, 0], [500010, 0, 0]], "layer": "A" },
            { "points": [[500000, 7, 0], [500010, 7, 0]], "layer": "B" }
        ]
    }"#;
    let set = mesh_reduce::polylines_from_str(json, "inline").unwrap();

    let params = PipelineParams {
        simplify: SimplifyParams::disabled(),
        ..Default::default()
    };
    let result = run_pipeline(&set, &params).unwrap();

    let center_y = |mesh: &mesh_reduce::Mesh| {
        mesh.vertices.iter().map(|v| v.y).sum::<f64>() / mesh.vertex_count() as f64
    };
    let dy = center_y(&result.meshes[1].mesh) - center_y(&result.meshes[0].mesh);
    assert!((dy - 7.0).abs() < 1e-9);

    // Coordinates are re-centered near the origin.
    let (min, max) = result.meshes[0].mesh.bounds().unwrap();
    assert!(min.x.abs() < 100.0 && max.x.abs() < 100.0);
}

#[test]
fn scale_is_applied_after_centering() {
    let json = r#"{ "polylines": [ { "points": [[0, 0, 0], [10, 0, 0]] } ] }"#;
    let set = mesh_reduce::polylines_from_str(json, "inline").unwrap();

    let params = PipelineParams {
        scale: 0.1,
        sweep: SweepParams::wire(),
        simplify: SimplifyParams::disabled(),
        ..Default::default()
    };
    let result = run_pipeline(&set, &params).unwrap();

    let (min, max) = result.meshes[0].mesh.bounds().unwrap();
    assert!((max.x - min.x - 1.0).abs() < 1e-12);
}

#[test]
fn wireframe_run_produces_edges() {
    let set = mesh_reduce::polylines_from_str(contour_document(), "inline").unwrap();
    let result = run_pipeline(&set, &PipelineParams::wireframe()).unwrap();

    let mesh = &result.meshes[0].mesh;
    assert!(mesh.is_wire());
    assert_eq!(mesh.face_count(), 0);
    // 3 open segments + 3 closed-loop segments.
    assert_eq!(mesh.edge_count(), 6);
}

#[test]
fn aggressive_preview_reduces_more() {
    // A dense wavy contour where decimation has room to work.
    let points: Vec<[f64; 3]> = (0..200)
        .map(|i| {
            let t = i as f64 * 0.1;
            [t, t.sin() * 5.0, (t * 0.3).cos()]
        })
        .collect();
    let doc = serde_json::json!({ "polylines": [ { "points": points } ] }).to_string();
    let set = mesh_reduce::polylines_from_str(&doc, "inline").unwrap();

    let default_run = run_pipeline(&set, &PipelineParams::default()).unwrap();
    let preview_run = run_pipeline(&set, &PipelineParams::preview()).unwrap();

    assert!(
        preview_run.telemetry.final_vertices <= default_run.telemetry.final_vertices,
        "preview preset should reduce at least as much as the default"
    );
    assert!(preview_run.telemetry.reduction() > 0.0);
}

#[test]
fn run_twice_is_deterministic() {
    let set = mesh_reduce::polylines_from_str(contour_document(), "inline").unwrap();
    let params = PipelineParams::default();

    let a = run_pipeline(&set, &params).unwrap();
    let b = run_pipeline(&set, &params).unwrap();

    assert_eq!(a.telemetry.initial_vertices, b.telemetry.initial_vertices);
    assert_eq!(a.telemetry.final_vertices, b.telemetry.final_vertices);
    for (ma, mb) in a.meshes.iter().zip(&b.meshes) {
        assert_eq!(ma.mesh.vertex_count(), mb.mesh.vertex_count());
        assert_eq!(ma.mesh.face_count(), mb.mesh.face_count());
    }
}
