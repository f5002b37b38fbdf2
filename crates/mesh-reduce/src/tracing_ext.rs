//! Structured logging helpers for pipeline operations.
//!
//! Integrates with the `tracing` ecosystem. Enable output by installing a
//! subscriber in the host application, e.g. `RUST_LOG=mesh_reduce=debug`
//! with `tracing_subscriber::fmt`.

use std::time::Instant;
use tracing::{Span, debug, info};

/// A performance timer that logs its duration on drop.
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    #[allow(dead_code)]
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("reduce_operation", operation = name);
        debug!(target: "mesh_reduce::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer with mesh-size context fields.
    pub fn with_context(name: &'static str, face_count: usize, vertex_count: usize) -> Self {
        let span = tracing::info_span!(
            "reduce_operation",
            operation = name,
            faces = face_count,
            vertices = vertex_count
        );
        debug!(
            target: "mesh_reduce::timing",
            operation = name,
            faces = face_count,
            vertices = vertex_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        info!(
            target: "mesh_reduce::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "Operation completed"
        );
    }
}

/// Log mesh statistics at debug level.
pub fn log_mesh_stats(mesh: &crate::Mesh, context: &str) {
    let dims = mesh
        .bounds()
        .map(|(min, max)| max - min)
        .unwrap_or_else(nalgebra::Vector3::zeros);

    debug!(
        target: "mesh_reduce::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        edges = mesh.edge_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log one reduction stage's before/after vertex counts.
pub fn log_stage_result(stage: &str, vertices_before: usize, vertices_after: usize) {
    info!(
        target: "mesh_reduce::stages",
        stage = stage,
        before = vertices_before,
        after = vertices_after,
        "Stage completed"
    );
}

/// Log the overall reduction summary for a run.
pub fn log_reduction_summary(initial_vertices: usize, final_vertices: usize) {
    let reduction = if initial_vertices > 0 {
        (1.0 - final_vertices as f64 / initial_vertices as f64) * 100.0
    } else {
        0.0
    };
    info!(
        target: "mesh_reduce::summary",
        before = initial_vertices,
        after = final_vertices,
        reduction_percent = format!("{:.2}", reduction),
        "Reduction summary"
    );
}
