//! End-to-end orchestration: polylines in, named reduced meshes out.
//!
//! The run sequences one frozen reference origin, per-layer grouping,
//! curve network construction, tube extrusion, and the three reduction
//! stages, then aggregates per-layer meshes and reduction telemetry for
//! an external exporter.
//!
//! Layers are independent once the origin is frozen, so they fan out
//! across a rayon thread pool. Within one mesh the reduction stages stay
//! strictly sequential.
//!
//! # Example
//!
//! ```no_run
//! use mesh_reduce::{PipelineParams, load_polylines, run_pipeline};
//!
//! let set = load_polylines("drawing.json")?;
//! let result = run_pipeline(&set, &PipelineParams::default())?;
//!
//! for layer in &result.meshes {
//!     println!("{}: {} vertices", layer.name, layer.mesh.vertex_count());
//! }
//! println!("reduction: {:.1}%", result.telemetry.reduction() * 100.0);
//! # Ok::<(), mesh_reduce::ReduceError>(())
//! ```

use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::center::{DEFAULT_SAMPLE_CAP, compute_center};
use crate::error::{ReduceError, ReduceResult};
use crate::network::build_network;
use crate::polyline::{Polyline, PolylineSet, group_by_layer};
use crate::simplify::{SimplifyParams, SimplifyReport, simplify_mesh};
use crate::sweep::{SweepParams, sweep_network};
use crate::tracing_ext::{OperationTimer, log_reduction_summary};
use crate::types::Mesh;

/// Configuration for a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Uniform scale applied after centering.
    pub scale: f64,

    /// Process only the first N polylines (partial runs on huge inputs).
    pub max_polylines: Option<usize>,

    /// Merge each layer's polylines into one curve network (the default).
    /// When disabled, every polyline becomes its own network and mesh,
    /// named `"{layer}.{ordinal}"`.
    pub merge_per_layer: bool,

    /// Number of points sampled when computing the reference origin.
    pub center_sample_cap: usize,

    /// Cross-section profile for tube extrusion.
    pub sweep: SweepParams,

    /// Reduction stage settings.
    pub simplify: SimplifyParams,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            max_polylines: None,
            merge_per_layer: true,
            center_sample_cap: DEFAULT_SAMPLE_CAP,
            sweep: SweepParams::default(),
            simplify: SimplifyParams::default(),
        }
    }
}

impl PipelineParams {
    /// Aggressive settings for fast preview output.
    pub fn preview() -> Self {
        Self {
            sweep: SweepParams::tube(6, 0.5),
            simplify: SimplifyParams::aggressive(),
            ..Default::default()
        }
    }

    /// Wire output: no tube surface, welding only.
    pub fn wireframe() -> Self {
        Self {
            sweep: SweepParams::wire(),
            simplify: SimplifyParams::weld_only(0.001),
            ..Default::default()
        }
    }
}

/// Progress information passed to callbacks between layer jobs.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Completed jobs so far.
    pub current: u64,
    /// Total number of jobs.
    pub total: u64,
    /// Name of the job that just finished.
    pub message: String,
}

impl Progress {
    /// Completion fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Callback invoked between layer jobs. Return `false` to stop the run
/// after the current job.
pub type ProgressCallback = Box<dyn Fn(&Progress) -> bool + Send + Sync>;

/// One named output mesh.
#[derive(Debug, Clone)]
pub struct LayerMesh {
    /// Output name, derived from the layer tag.
    pub name: String,

    /// The reduced mesh.
    pub mesh: Mesh,

    /// Reduction report for this mesh.
    pub report: SimplifyReport,
}

/// Aggregate counters for a pipeline run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineTelemetry {
    /// Vertices across all meshes before reduction.
    pub initial_vertices: usize,

    /// Vertices across all meshes after reduction.
    pub final_vertices: usize,

    /// Output meshes produced.
    pub mesh_count: usize,

    /// Strands across all curve networks.
    pub strand_count: usize,

    /// Polylines skipped for carrying fewer than two points.
    pub degenerate_dropped: usize,

    /// Whether a progress callback stopped the run early.
    pub cancelled: bool,
}

impl PipelineTelemetry {
    /// Overall reduction fraction, `1 - final / initial`.
    pub fn reduction(&self) -> f64 {
        if self.initial_vertices == 0 {
            0.0
        } else {
            1.0 - self.final_vertices as f64 / self.initial_vertices as f64
        }
    }
}

/// Result of a pipeline run, handed to an external exporter.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Output meshes in layer-first-appearance order.
    pub meshes: Vec<LayerMesh>,

    /// Aggregate reduction counters.
    pub telemetry: PipelineTelemetry,

    /// The frozen reference origin subtracted from all geometry, for
    /// exporters that need to restore source coordinates.
    pub center: Point3<f64>,
}

/// Run the full pipeline over a polyline set.
///
/// Layer jobs are processed in parallel; output order follows layer
/// first appearance regardless.
///
/// # Errors
///
/// Returns [`ReduceError::EmptyInput`] when the set carries no polylines
/// with at least two points. Nothing is processed in that case.
pub fn run_pipeline(set: &PolylineSet, params: &PipelineParams) -> ReduceResult<PipelineResult> {
    run_pipeline_with_progress(set, params, None)
}

/// Run the full pipeline, reporting between layer jobs.
///
/// When a callback is supplied, jobs run sequentially and the callback is
/// invoked after each one; returning `false` stops the run and marks the
/// partial result as cancelled. Without a callback, jobs fan out across
/// the rayon thread pool.
pub fn run_pipeline_with_progress(
    set: &PolylineSet,
    params: &PipelineParams,
    progress: Option<&ProgressCallback>,
) -> ReduceResult<PipelineResult> {
    let _timer = OperationTimer::new("pipeline");

    if set.is_empty() {
        return Err(ReduceError::empty_input("document contains no polylines"));
    }

    let cap = params.max_polylines.unwrap_or(usize::MAX).min(set.len());
    let polylines = &set.polylines[..cap];
    if cap < set.len() {
        info!(
            target: "mesh_reduce::pipeline",
            processing = cap,
            total = set.len(),
            "Limiting polyline count for partial run"
        );
    }

    if !polylines.iter().any(Polyline::is_renderable) {
        return Err(ReduceError::empty_input(
            "no polyline carries two or more points",
        ));
    }

    // Frozen for the whole run; recomputing per layer would shift layers
    // relative to each other.
    let center = compute_center(polylines, params.center_sample_cap)?;

    let jobs = build_jobs(polylines, params.merge_per_layer);
    info!(
        target: "mesh_reduce::pipeline",
        polylines = polylines.len(),
        jobs = jobs.len(),
        merge_per_layer = params.merge_per_layer,
        "Starting reduction run"
    );

    let mut telemetry = PipelineTelemetry::default();
    let mut meshes = Vec::with_capacity(jobs.len());

    match progress {
        None => {
            let outputs: Vec<JobOutput> = jobs
                .par_iter()
                .map(|job| process_job(job, center, params))
                .collect();
            for output in outputs {
                record_output(output, &mut meshes, &mut telemetry);
            }
        }
        Some(callback) => {
            let total = jobs.len() as u64;
            for (i, job) in jobs.iter().enumerate() {
                let output = process_job(job, center, params);
                let message = output.layer.name.clone();
                record_output(output, &mut meshes, &mut telemetry);

                let keep_going = callback(&Progress {
                    current: i as u64 + 1,
                    total,
                    message,
                });
                if !keep_going && i + 1 < jobs.len() {
                    warn!(
                        target: "mesh_reduce::pipeline",
                        completed = i + 1,
                        total = jobs.len(),
                        "Run stopped by progress callback"
                    );
                    telemetry.cancelled = true;
                    break;
                }
            }
        }
    }

    log_reduction_summary(telemetry.initial_vertices, telemetry.final_vertices);

    Ok(PipelineResult {
        meshes,
        telemetry,
        center,
    })
}

struct LayerJob<'a> {
    name: String,
    polylines: Vec<&'a Polyline>,
}

struct JobOutput {
    layer: LayerMesh,
    strand_count: usize,
    degenerate_dropped: usize,
}

fn build_jobs(polylines: &[Polyline], merge_per_layer: bool) -> Vec<LayerJob<'_>> {
    let groups = group_by_layer(polylines);

    if merge_per_layer {
        groups
            .into_iter()
            .map(|(name, polylines)| LayerJob { name, polylines })
            .collect()
    } else {
        groups
            .into_iter()
            .flat_map(|(layer, polylines)| {
                polylines
                    .into_iter()
                    .enumerate()
                    .map(move |(i, pl)| LayerJob {
                        name: format!("{layer}.{i:03}"),
                        polylines: vec![pl],
                    })
            })
            .collect()
    }
}

fn process_job(job: &LayerJob<'_>, center: Point3<f64>, params: &PipelineParams) -> JobOutput {
    let built = build_network(&job.name, &job.polylines, center, params.scale);
    let strand_count = built.network.strand_count();

    let mut mesh = sweep_network(&built.network, &params.sweep);
    crate::tracing_ext::log_mesh_stats(&mesh, &job.name);
    let report = simplify_mesh(&mut mesh, &params.simplify);

    info!(
        target: "mesh_reduce::pipeline",
        layer = job.name.as_str(),
        strands = strand_count,
        vertices_before = report.counts.initial,
        vertices_after = report.counts.after_decimate,
        "Processed layer"
    );

    JobOutput {
        layer: LayerMesh {
            name: job.name.clone(),
            mesh,
            report,
        },
        strand_count,
        degenerate_dropped: built.degenerate_dropped,
    }
}

fn record_output(
    output: JobOutput,
    meshes: &mut Vec<LayerMesh>,
    telemetry: &mut PipelineTelemetry,
) {
    telemetry.initial_vertices += output.layer.report.counts.initial;
    telemetry.final_vertices += output.layer.report.counts.after_decimate;
    telemetry.strand_count += output.strand_count;
    telemetry.degenerate_dropped += output.degenerate_dropped;
    telemetry.mesh_count += 1;
    meshes.push(output.layer);
}
