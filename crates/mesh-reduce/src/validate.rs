//! Mesh validation and reporting.

use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::debug;

use crate::types::Mesh;

/// Validation report for a mesh.
#[derive(Debug, Clone)]
pub struct MeshReport {
    /// Total vertex count.
    pub vertex_count: usize,

    /// Total wire segment count.
    pub edge_count: usize,

    /// Total face count.
    pub face_count: usize,

    /// Faces or edges referencing a vertex index past the buffer.
    pub dangling_index_count: usize,

    /// Faces with fewer than three distinct corners.
    pub degenerate_face_count: usize,

    /// Face edges with a single adjacent face.
    pub boundary_edge_count: usize,

    /// Face edges shared by more than two faces.
    pub non_manifold_edge_count: usize,

    /// Bounding box as (min_corner, max_corner).
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,
}

impl MeshReport {
    /// Every index resolves to a vertex and no face is degenerate.
    pub fn is_valid(&self) -> bool {
        self.dangling_index_count == 0 && self.degenerate_face_count == 0
    }

    /// The surface closes on itself with no boundary edges.
    pub fn is_watertight(&self) -> bool {
        self.face_count > 0 && self.boundary_edge_count == 0
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Dangling indices: {}", self.dangling_index_count)?;
        writeln!(f, "  Degenerate faces: {}", self.degenerate_face_count)?;
        writeln!(f, "  Boundary edges: {}", self.boundary_edge_count)?;
        writeln!(f, "  Non-manifold edges: {}", self.non_manifold_edge_count)?;
        if let Some((min, max)) = &self.bounds {
            writeln!(
                f,
                "  Bounds: [{:.2}, {:.2}, {:.2}] to [{:.2}, {:.2}, {:.2}]",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }
        Ok(())
    }
}

/// Validate a mesh and collect an issue report.
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let nverts = mesh.vertices.len() as u32;

    let mut dangling_index_count = 0usize;
    let mut degenerate_face_count = 0usize;

    for face in &mesh.faces {
        if face.iter().any(|&i| i >= nverts) {
            dangling_index_count += 1;
            continue;
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            degenerate_face_count += 1;
        }
    }
    for edge in &mesh.edges {
        if edge.iter().any(|&i| i >= nverts) {
            dangling_index_count += 1;
        }
    }

    let mut edge_faces: HashMap<(u32, u32), u32> = HashMap::new();
    for face in &mesh.faces {
        if face.iter().any(|&i| i >= nverts) {
            continue;
        }
        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            let key = if a < b { (a, b) } else { (b, a) };
            *edge_faces.entry(key).or_insert(0) += 1;
        }
    }

    let boundary_edge_count = edge_faces.values().filter(|&&c| c == 1).count();
    let non_manifold_edge_count = edge_faces.values().filter(|&&c| c > 2).count();

    let report = MeshReport {
        vertex_count: mesh.vertex_count(),
        edge_count: mesh.edge_count(),
        face_count: mesh.face_count(),
        dangling_index_count,
        degenerate_face_count,
        boundary_edge_count,
        non_manifold_edge_count,
        bounds: mesh.bounds(),
    };

    debug!(
        target: "mesh_reduce::validate",
        vertices = report.vertex_count,
        faces = report.face_count,
        dangling = report.dangling_index_count,
        boundary_edges = report.boundary_edge_count,
        "Validated mesh"
    );

    report
}
