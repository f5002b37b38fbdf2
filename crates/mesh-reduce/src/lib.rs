//! Geometry reduction for large CAD line drawings.
//!
//! This crate ingests polylines extracted from drawing data (terrain
//! contours, survey lines, utility corridors) and produces compact
//! triangle meshes suitable for binary scene interchange: thousands to
//! millions of polyline vertices are merged, decimated, and re-centered
//! into meshes with orders of magnitude fewer vertices while preserving
//! visual shape and per-layer grouping.
//!
//! # Pipeline
//!
//! 1. **Centering**: one reference origin from a sampled bounding box,
//!    frozen for the whole run, keeps coordinates well-conditioned.
//! 2. **Layer grouping**: polylines bucket by layer tag, preserving
//!    first-appearance order.
//! 3. **Curve networks**: each layer's polylines become centered,
//!    scaled strands.
//! 4. **Sweeping**: strands extrude into tubes (or wires at zero
//!    radius).
//! 5. **Reduction**: vertex welding, angle-limited dissolve, and
//!    ratio-based decimation, in that order.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_reduce::{PipelineParams, load_polylines, run_pipeline};
//!
//! let set = load_polylines("drawing.json")?;
//! let result = run_pipeline(&set, &PipelineParams::default())?;
//!
//! for layer in &result.meshes {
//!     println!(
//!         "{}: {} vertices, {} faces",
//!         layer.name,
//!         layer.mesh.vertex_count(),
//!         layer.mesh.face_count()
//!     );
//! }
//! println!("overall reduction: {:.1}%", result.telemetry.reduction() * 100.0);
//! # Ok::<(), mesh_reduce::ReduceError>(())
//! ```
//!
//! Individual stages are available as free functions for callers that
//! bring their own meshes:
//!
//! ```
//! use mesh_reduce::{Mesh, SimplifyParams, simplify_mesh};
//!
//! let mut mesh = Mesh::new();
//! // ... fill vertex and face buffers ...
//! let report = simplify_mesh(&mut mesh, &SimplifyParams::default());
//! println!("kept {} of {} vertices", report.counts.after_decimate, report.counts.initial);
//! ```
//!
//! # Input
//!
//! A JSON document with a `polylines` array; each entry carries `points`
//! (arrays of `[x, y, z]`), an optional `closed` flag, and an optional
//! `layer` tag. See [`load_polylines`].
//!
//! # Error Handling
//!
//! Operations that can fail return [`ReduceResult`]. Document-level
//! problems (unreadable file, malformed entries, no usable geometry)
//! abort the run with no partial output. Stage-local conditions, such as
//! polylines too short to render or decimation targets unreachable
//! without breaking mesh validity, are recovered locally and reported
//! through telemetry.
//!
//! # Logging
//!
//! All stages emit structured `tracing` events. Install a subscriber in
//! the host application and filter with e.g. `RUST_LOG=mesh_reduce=debug`
//! or `RUST_LOG=mesh_reduce::timing=debug`.

mod error;
mod types;

pub mod center;
pub mod decimate;
pub mod dissolve;
pub mod io;
pub mod network;
pub mod pipeline;
pub mod polyline;
pub mod simplify;
pub mod sweep;
pub mod tracing_ext;
pub mod validate;
pub mod weld;

// Re-export core types at the crate root.
pub use error::{ErrorCode, RecoverySuggestion, ReduceError, ReduceResult};
pub use types::{Mesh, Triangle};

pub use center::{DEFAULT_SAMPLE_CAP, compute_center};
pub use decimate::{DecimateParams, DecimatePolicy, DecimateStats, decimate_mesh};
pub use dissolve::{DissolveStats, dissolve_collinear};
pub use io::{load_polylines, polylines_from_reader, polylines_from_str};
pub use network::{CurveNetwork, NetworkBuildResult, Strand, build_network};
pub use pipeline::{
    LayerMesh, PipelineParams, PipelineResult, PipelineTelemetry, Progress, ProgressCallback,
    run_pipeline, run_pipeline_with_progress,
};
pub use polyline::{DEFAULT_LAYER, Polyline, PolylineSet, group_by_layer};
pub use simplify::{SimplifyParams, SimplifyReport, StageCounts, simplify_mesh};
pub use sweep::{MIN_RESOLUTION, SweepParams, sweep_network, sweep_strand_into};
pub use validate::{MeshReport, validate_mesh};
pub use weld::{WeldStats, weld_vertices};

// Convenience methods on the core types.
impl Mesh {
    /// Validate the mesh and return a report of any issues.
    pub fn validate(&self) -> MeshReport {
        validate::validate_mesh(self)
    }

    /// Merge vertices within `weld_distance` on each axis.
    pub fn weld(&mut self, weld_distance: f64) -> WeldStats {
        weld::weld_vertices(self, weld_distance)
    }

    /// Remove vertices on near-straight runs within `angle_limit` radians.
    pub fn dissolve(&mut self, angle_limit: f64) -> DissolveStats {
        dissolve::dissolve_collinear(self, angle_limit)
    }

    /// Reduce the face count with the given parameters.
    pub fn decimate(&mut self, params: &DecimateParams) -> DecimateStats {
        decimate::decimate_mesh(self, params)
    }

    /// Run all three reduction stages.
    pub fn simplify(&mut self, params: &SimplifyParams) -> SimplifyReport {
        simplify::simplify_mesh(self, params)
    }
}

impl PolylineSet {
    /// Load a polyline document from a file path.
    pub fn load(path: impl AsRef<std::path::Path>) -> ReduceResult<Self> {
        io::load_polylines(path)
    }
}
