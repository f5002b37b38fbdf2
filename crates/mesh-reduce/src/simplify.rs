//! The three-stage reduction pipeline: weld, dissolve, decimate.
//!
//! Stages run strictly in this order on one mesh; each consumes and
//! produces a valid mesh. Every stage is independently toggleable through
//! its zero value (`weld_distance`, `angle_limit`) or identity value
//! (`target_ratio = 1.0`). Vertex counts are sampled around every stage
//! for the cumulative reduction report.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimate::{DecimateParams, decimate_mesh};
use crate::dissolve::dissolve_collinear;
use crate::tracing_ext::{OperationTimer, log_stage_result};
use crate::types::Mesh;
use crate::weld::weld_vertices;

/// Parameters for the reduction stages.
///
/// Defaults match the values tuned for large survey drawings: weld within
/// a millimeter-scale tolerance, dissolve below ~5 degrees, keep half the
/// faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimplifyParams {
    /// Per-axis distance below which vertices merge. `0` skips welding.
    pub weld_distance: f64,

    /// Angular tolerance in radians for the dissolve stage. `0` skips it.
    pub angle_limit: f64,

    /// Polygon reduction settings; a target ratio of `1.0` skips
    /// decimation.
    pub decimate: DecimateParams,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            weld_distance: 0.001,
            angle_limit: 0.0872, // ~5 degrees
            decimate: DecimateParams::default(),
        }
    }
}

impl SimplifyParams {
    /// Disable all three stages.
    pub fn disabled() -> Self {
        Self {
            weld_distance: 0.0,
            angle_limit: 0.0,
            decimate: DecimateParams::disabled(),
        }
    }

    /// Aggressive settings for preview output: coarse welding, ~10 degree
    /// dissolve, quarter of the faces kept.
    pub fn aggressive() -> Self {
        Self {
            weld_distance: 0.01,
            angle_limit: 0.1745,
            decimate: DecimateParams::with_target_ratio(0.25),
        }
    }

    /// Shape-preserving settings: welding only.
    pub fn weld_only(weld_distance: f64) -> Self {
        Self {
            weld_distance,
            angle_limit: 0.0,
            decimate: DecimateParams::disabled(),
        }
    }
}

/// Vertex counts sampled around each reduction stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    /// Vertices before any reduction.
    pub initial: usize,
    /// Vertices after welding.
    pub after_weld: usize,
    /// Vertices after the dissolve stage.
    pub after_dissolve: usize,
    /// Vertices after decimation.
    pub after_decimate: usize,
}

impl StageCounts {
    /// Overall reduction fraction, `0.0` for an empty input.
    pub fn reduction(&self) -> f64 {
        if self.initial == 0 {
            0.0
        } else {
            1.0 - self.after_decimate as f64 / self.initial as f64
        }
    }
}

/// Report from one mesh's trip through the reduction stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifyReport {
    /// Vertex counts around each stage.
    pub counts: StageCounts,
    /// Vertices merged by welding.
    pub vertices_welded: usize,
    /// Vertices removed by the dissolve stage.
    pub vertices_dissolved: usize,
    /// Faces before decimation.
    pub faces_before_decimate: usize,
    /// Fraction of faces kept by decimation (`1.0` when skipped or
    /// stopped immediately).
    pub achieved_ratio: f64,
}

/// Run the weld, dissolve, and decimate stages on a mesh in place.
pub fn simplify_mesh(mesh: &mut Mesh, params: &SimplifyParams) -> SimplifyReport {
    let _timer = OperationTimer::with_context("simplify", mesh.face_count(), mesh.vertex_count());

    let mut report = SimplifyReport {
        achieved_ratio: 1.0,
        ..Default::default()
    };
    report.counts.initial = mesh.vertex_count();

    let weld_stats = weld_vertices(mesh, params.weld_distance);
    report.vertices_welded = weld_stats.vertices_merged;
    report.counts.after_weld = mesh.vertex_count();
    log_stage_result("weld", report.counts.initial, report.counts.after_weld);

    let dissolve_stats = dissolve_collinear(mesh, params.angle_limit);
    report.vertices_dissolved = dissolve_stats.vertices_removed;
    report.counts.after_dissolve = mesh.vertex_count();
    log_stage_result("dissolve", report.counts.after_weld, report.counts.after_dissolve);

    report.faces_before_decimate = mesh.face_count();
    let decimate_stats = decimate_mesh(mesh, &params.decimate);
    report.achieved_ratio = decimate_stats.achieved_ratio();
    report.counts.after_decimate = mesh.vertex_count();
    log_stage_result(
        "decimate",
        report.counts.after_dissolve,
        report.counts.after_decimate,
    );

    debug!(
        target: "mesh_reduce::simplify",
        initial = report.counts.initial,
        after_weld = report.counts.after_weld,
        after_dissolve = report.counts.after_dissolve,
        after_decimate = report.counts.after_decimate,
        "Reduction stages complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Strand;
    use crate::sweep::{SweepParams, sweep_strand_into};
    use nalgebra::Point3;

    fn collinear_tube() -> Mesh {
        let strand = Strand {
            points: (0..8).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect(),
            closed: false,
        };
        let mut mesh = Mesh::new();
        sweep_strand_into(&mut mesh, &strand, &SweepParams::tube(8, 0.5));
        mesh
    }

    #[test]
    fn test_stage_counts_are_monotonic() {
        let mut mesh = collinear_tube();
        let report = simplify_mesh(&mut mesh, &SimplifyParams::default());

        let c = report.counts;
        assert!(c.after_weld <= c.initial);
        assert!(c.after_dissolve <= c.after_weld);
        assert!(c.after_decimate <= c.after_dissolve);
        assert!(c.reduction() > 0.0);
    }

    #[test]
    fn test_disabled_params_change_nothing() {
        let mut mesh = collinear_tube();
        let snapshot = mesh.clone();

        let report = simplify_mesh(&mut mesh, &SimplifyParams::disabled());

        assert_eq!(mesh, snapshot);
        assert_eq!(report.counts.initial, report.counts.after_decimate);
        assert_eq!(report.achieved_ratio, 1.0);
    }

    #[test]
    fn test_pipeline_determinism() {
        let mut a = collinear_tube();
        let mut b = a.clone();
        let params = SimplifyParams::default();

        let ra = simplify_mesh(&mut a, &params);
        let rb = simplify_mesh(&mut b, &params);

        assert_eq!(ra.counts, rb.counts);
        assert_eq!(a.vertex_count(), b.vertex_count());
        assert_eq!(a.face_count(), b.face_count());
    }

    #[test]
    fn test_dissolve_strips_straight_runs() {
        let mut mesh = collinear_tube();
        let report = simplify_mesh(
            &mut mesh,
            &SimplifyParams {
                weld_distance: 0.001,
                angle_limit: 0.1,
                decimate: DecimateParams::disabled(),
            },
        );

        assert!(report.vertices_dissolved > 0);
        // The straight tube reduces to its two end rings.
        assert_eq!(mesh.vertex_count(), 16);
    }
}
