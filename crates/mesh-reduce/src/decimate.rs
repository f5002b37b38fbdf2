//! Ratio-based polygon reduction using edge collapse with quadric error
//! metrics.
//!
//! Repeatedly collapses the edge whose removal introduces the least
//! geometric deviation until the target face count is reached or no
//! further collapse is possible without breaking mesh validity. Running
//! out of valid collapses stops the stage early; the achieved ratio is
//! reported, never escalated to an error.

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, warn};

use crate::dissolve::dissolve_collinear;
use crate::types::Mesh;

/// Reduction policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DecimatePolicy {
    /// Greedy error-bounded edge collapse toward the target ratio.
    Collapse,
    /// Dissolve faces across near-flat dihedral angles instead of
    /// following a ratio.
    Planar {
        /// Dihedral angle threshold in radians.
        angle_limit: f64,
    },
}

/// Parameters for polygon reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecimateParams {
    /// Fraction of faces to keep, in `(0, 1]`. A ratio of `1.0` leaves
    /// the mesh untouched. Only used by the `Collapse` policy.
    pub target_ratio: f64,

    /// Reduction policy. Default: `Collapse`.
    pub policy: DecimatePolicy,

    /// Whether to refuse collapsing boundary edges (edges with a single
    /// adjacent face), keeping open tube ends crisp. Default: `false`.
    pub preserve_boundary: bool,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_ratio: 0.5,
            policy: DecimatePolicy::Collapse,
            preserve_boundary: false,
        }
    }
}

impl DecimateParams {
    /// Create params targeting a fraction of the original face count.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Create params that leave the mesh untouched.
    pub fn disabled() -> Self {
        Self::with_target_ratio(1.0)
    }

    /// Create params using the dihedral-angle policy.
    pub fn planar(angle_limit: f64) -> Self {
        Self {
            policy: DecimatePolicy::Planar { angle_limit },
            ..Default::default()
        }
    }
}

/// Statistics from a decimation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimateStats {
    /// Face count before reduction.
    pub original_faces: usize,
    /// Face count after reduction.
    pub final_faces: usize,
    /// Edge collapses performed.
    pub collapses_performed: usize,
    /// Edge collapses rejected (would break mesh validity).
    pub collapses_rejected: usize,
}

impl DecimateStats {
    /// Fraction of faces kept, `1.0` for an untouched or empty mesh.
    pub fn achieved_ratio(&self) -> f64 {
        if self.original_faces == 0 {
            1.0
        } else {
            self.final_faces as f64 / self.original_faces as f64
        }
    }
}

/// Reduce the face count of a mesh in place.
///
/// Wire meshes carry no faces and pass through untouched. With the
/// `Collapse` policy a `target_ratio` of `1.0` is an exact no-op: the
/// buffers are not rebuilt and vertex and face counts are unchanged.
pub fn decimate_mesh(mesh: &mut Mesh, params: &DecimateParams) -> DecimateStats {
    let original_faces = mesh.faces.len();
    let mut stats = DecimateStats {
        original_faces,
        final_faces: original_faces,
        ..Default::default()
    };

    if original_faces == 0 {
        return stats;
    }

    match params.policy {
        DecimatePolicy::Planar { angle_limit } => {
            dissolve_collinear(mesh, angle_limit);
            stats.final_faces = mesh.faces.len();
            stats
        }
        DecimatePolicy::Collapse => {
            if params.target_ratio >= 1.0 {
                return stats;
            }
            collapse_to_ratio(mesh, params, stats)
        }
    }
}

fn collapse_to_ratio(
    mesh: &mut Mesh,
    params: &DecimateParams,
    mut stats: DecimateStats,
) -> DecimateStats {
    let original_faces = stats.original_faces;
    let target = ((original_faces as f64) * params.target_ratio).ceil() as usize;
    if original_faces <= target {
        return stats;
    }

    let mut vertices: Vec<Option<Point3<f64>>> = mesh.vertices.iter().copied().map(Some).collect();
    let mut faces: Vec<Option<[u32; 3]>> = mesh.faces.iter().copied().map(Some).collect();
    let mut active_faces = original_faces;

    let mut quadrics = compute_vertex_quadrics(mesh);
    let boundary_edges = find_boundary_edges(&mesh.faces);

    let mut heap = build_collapse_queue(mesh, &quadrics, &boundary_edges, params);

    // Maps collapsed vertices to their survivors.
    let mut vertex_remap: HashMap<u32, u32> = HashMap::new();

    while active_faces > target {
        let Some(collapse) = heap.pop() else {
            warn!(
                target: "mesh_reduce::decimate",
                target_faces = target,
                remaining_faces = active_faces,
                "Reduction target unreachable without breaking mesh validity; stopping early"
            );
            break;
        };

        let v1 = resolve_vertex(collapse.v1, &vertex_remap);
        let v2 = resolve_vertex(collapse.v2, &vertex_remap);

        // Stale queue entry: the edge no longer exists as queued.
        if v1 == v2 || vertices[v1 as usize].is_none() || vertices[v2 as usize].is_none() {
            continue;
        }

        if params.preserve_boundary && boundary_edges.contains(&normalize_edge(v1, v2)) {
            stats.collapses_rejected += 1;
            continue;
        }

        if !is_collapse_valid(&faces, v1, v2) {
            stats.collapses_rejected += 1;
            continue;
        }

        // Merge v2 into v1 at the optimal position.
        vertices[v1 as usize] = Some(Point3::new(
            collapse.optimal_pos[0],
            collapse.optimal_pos[1],
            collapse.optimal_pos[2],
        ));
        let q2 = quadrics[v2 as usize];
        quadrics[v1 as usize].add(&q2);

        vertices[v2 as usize] = None;
        vertex_remap.insert(v2, v1);

        for face_opt in faces.iter_mut() {
            let Some(face) = face_opt else { continue };
            let mut changed = false;
            for idx in face.iter_mut() {
                let actual = resolve_vertex(*idx, &vertex_remap);
                if actual != *idx {
                    *idx = actual;
                    changed = true;
                }
            }
            if changed && (face[0] == face[1] || face[1] == face[2] || face[0] == face[2]) {
                *face_opt = None;
                active_faces -= 1;
            }
        }

        stats.collapses_performed += 1;

        requeue_vertex_edges(v1, &vertices, &faces, &quadrics, &boundary_edges, params, &mut heap);
    }

    rebuild_mesh(mesh, &vertices, &faces);
    stats.final_faces = mesh.faces.len();

    debug!(
        target: "mesh_reduce::decimate",
        original = original_faces,
        remaining = stats.final_faces,
        performed = stats.collapses_performed,
        rejected = stats.collapses_rejected,
        "Decimated mesh"
    );

    stats
}

/// Quadric error matrix (symmetric 4x4 stored as its upper triangle).
#[derive(Debug, Clone, Copy, Default)]
struct Quadric {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
    j: f64,
}

impl Quadric {
    /// Create a quadric from a plane equation `ax + by + cz + d = 0`.
    fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            a: a * a,
            b: a * b,
            c: a * c,
            d: a * d,
            e: b * b,
            f: b * c,
            g: b * d,
            h: c * c,
            i: c * d,
            j: d * d,
        }
    }

    fn add(&mut self, other: &Quadric) {
        self.a += other.a;
        self.b += other.b;
        self.c += other.c;
        self.d += other.d;
        self.e += other.e;
        self.f += other.f;
        self.g += other.g;
        self.h += other.h;
        self.i += other.i;
        self.j += other.j;
    }

    /// Evaluate `v^T Q v` for `v = [x, y, z, 1]`.
    fn evaluate(&self, x: f64, y: f64, z: f64) -> f64 {
        self.a * x * x
            + 2.0 * self.b * x * y
            + 2.0 * self.c * x * z
            + 2.0 * self.d * x
            + self.e * y * y
            + 2.0 * self.f * y * z
            + 2.0 * self.g * y
            + self.h * z * z
            + 2.0 * self.i * z
            + self.j
    }

    /// Find the point minimizing the error, or `None` when the system is
    /// singular (flat or under-constrained neighborhoods).
    fn optimal_point(&self) -> Option<[f64; 3]> {
        let det = self.a * (self.e * self.h - self.f * self.f)
            - self.b * (self.b * self.h - self.f * self.c)
            + self.c * (self.b * self.f - self.e * self.c);

        if det.abs() < 1e-10 {
            return None;
        }

        let inv_det = 1.0 / det;
        let m00 = (self.e * self.h - self.f * self.f) * inv_det;
        let m01 = (self.c * self.f - self.b * self.h) * inv_det;
        let m02 = (self.b * self.f - self.c * self.e) * inv_det;
        let m11 = (self.a * self.h - self.c * self.c) * inv_det;
        let m12 = (self.b * self.c - self.a * self.f) * inv_det;
        let m22 = (self.a * self.e - self.b * self.b) * inv_det;

        let x = m00 * (-self.d) + m01 * (-self.g) + m02 * (-self.i);
        let y = m01 * (-self.d) + m11 * (-self.g) + m12 * (-self.i);
        let z = m02 * (-self.d) + m12 * (-self.g) + m22 * (-self.i);

        Some([x, y, z])
    }
}

/// An edge collapse candidate in the priority queue.
#[derive(Debug, Clone)]
struct EdgeCollapse {
    v1: u32,
    v2: u32,
    cost: f64,
    optimal_pos: [f64; 3],
}

impl PartialEq for EdgeCollapse {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for EdgeCollapse {}

impl PartialOrd for EdgeCollapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCollapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest collapse first.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

fn compute_vertex_quadrics(mesh: &Mesh) -> Vec<Quadric> {
    let mut quadrics = vec![Quadric::default(); mesh.vertices.len()];

    for (face, tri) in mesh.faces.iter().zip(mesh.triangles()) {
        let Some(n) = tri.normal() else {
            continue; // degenerate face contributes no plane
        };
        let d = -(n.x * tri.v0.x + n.y * tri.v0.y + n.z * tri.v0.z);
        let q = Quadric::from_plane(n.x, n.y, n.z, d);
        for &vi in face {
            quadrics[vi as usize].add(&q);
        }
    }

    quadrics
}

fn find_boundary_edges(faces: &[[u32; 3]]) -> HashSet<(u32, u32)> {
    let mut edge_count: HashMap<(u32, u32), u32> = HashMap::new();
    for face in faces {
        for k in 0..3 {
            *edge_count
                .entry(normalize_edge(face[k], face[(k + 1) % 3]))
                .or_insert(0) += 1;
        }
    }
    edge_count
        .into_iter()
        .filter(|&(_, count)| count != 2)
        .map(|(edge, _)| edge)
        .collect()
}

fn build_collapse_queue(
    mesh: &Mesh,
    quadrics: &[Quadric],
    boundary_edges: &HashSet<(u32, u32)>,
    params: &DecimateParams,
) -> BinaryHeap<EdgeCollapse> {
    let mut heap = BinaryHeap::new();
    let mut seen_edges = HashSet::new();

    for face in &mesh.faces {
        for k in 0..3 {
            let v1 = face[k];
            let v2 = face[(k + 1) % 3];
            let edge = normalize_edge(v1, v2);
            if !seen_edges.insert(edge) {
                continue;
            }
            if params.preserve_boundary && boundary_edges.contains(&edge) {
                continue;
            }
            heap.push(compute_edge_collapse(
                v1,
                v2,
                &mesh.vertices[v1 as usize],
                &mesh.vertices[v2 as usize],
                quadrics,
            ));
        }
    }

    heap
}

fn compute_edge_collapse(
    v1: u32,
    v2: u32,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    quadrics: &[Quadric],
) -> EdgeCollapse {
    let mut combined = quadrics[v1 as usize];
    combined.add(&quadrics[v2 as usize]);

    let midpoint = [
        (p1.x + p2.x) / 2.0,
        (p1.y + p2.y) / 2.0,
        (p1.z + p2.z) / 2.0,
    ];
    let optimal_pos = combined.optimal_point().unwrap_or(midpoint);
    let cost = combined.evaluate(optimal_pos[0], optimal_pos[1], optimal_pos[2]);

    EdgeCollapse {
        v1,
        v2,
        cost,
        optimal_pos,
    }
}

#[inline]
fn normalize_edge(v1: u32, v2: u32) -> (u32, u32) {
    if v1 < v2 { (v1, v2) } else { (v2, v1) }
}

/// Follow the remap chain to the surviving vertex.
fn resolve_vertex(v: u32, remap: &HashMap<u32, u32>) -> u32 {
    let mut current = v;
    while let Some(&next) = remap.get(&current) {
        current = next;
    }
    current
}

/// Collapsing `v1`-`v2` stays manifold when the two vertices share at
/// most two neighbors (the opposite corners of the faces on either side
/// of the edge).
fn is_collapse_valid(faces: &[Option<[u32; 3]>], v1: u32, v2: u32) -> bool {
    let mut neighbors_v1 = HashSet::new();
    let mut neighbors_v2 = HashSet::new();

    for face in faces.iter().flatten() {
        if face.contains(&v1) {
            for &vi in face {
                if vi != v1 {
                    neighbors_v1.insert(vi);
                }
            }
        }
        if face.contains(&v2) {
            for &vi in face {
                if vi != v2 {
                    neighbors_v2.insert(vi);
                }
            }
        }
    }

    neighbors_v1.intersection(&neighbors_v2).count() <= 2
}

/// Re-queue all edges around a surviving vertex with refreshed costs.
fn requeue_vertex_edges(
    v: u32,
    vertices: &[Option<Point3<f64>>],
    faces: &[Option<[u32; 3]>],
    quadrics: &[Quadric],
    boundary_edges: &HashSet<(u32, u32)>,
    params: &DecimateParams,
    heap: &mut BinaryHeap<EdgeCollapse>,
) {
    let mut neighbors: Vec<u32> = Vec::new();
    for face in faces.iter().flatten() {
        if face.contains(&v) {
            for &vi in face {
                if vi != v && vertices[vi as usize].is_some() && !neighbors.contains(&vi) {
                    neighbors.push(vi);
                }
            }
        }
    }

    let Some(p_v) = vertices[v as usize] else {
        return;
    };

    for &neighbor in &neighbors {
        let edge = normalize_edge(v, neighbor);
        if params.preserve_boundary && boundary_edges.contains(&edge) {
            continue;
        }
        let Some(p_n) = vertices[neighbor as usize] else {
            continue;
        };
        heap.push(compute_edge_collapse(v, neighbor, &p_v, &p_n, quadrics));
    }
}

/// Rebuild the mesh from tombstoned working buffers, compacting indices.
fn rebuild_mesh(mesh: &mut Mesh, vertices: &[Option<Point3<f64>>], faces: &[Option<[u32; 3]>]) {
    let mut remap = vec![u32::MAX; vertices.len()];
    let mut new_vertices = Vec::with_capacity(vertices.len());

    for (old_idx, vertex) in vertices.iter().enumerate() {
        if let Some(p) = vertex {
            remap[old_idx] = new_vertices.len() as u32;
            new_vertices.push(*p);
        }
    }

    let new_faces = faces
        .iter()
        .flatten()
        .map(|face| [remap[face[0] as usize], remap[face[1] as usize], remap[face[2] as usize]])
        .collect();

    mesh.vertices = new_vertices;
    mesh.faces = new_faces;
    // Tube geometry carries no wire segments; any present belong to
    // vertices untouched by face collapses.
    mesh.edges.retain(|&[a, b]| {
        remap[a as usize] != u32::MAX && remap[b as usize] != u32::MAX
    });
    for edge in &mut mesh.edges {
        edge[0] = remap[edge[0] as usize];
        edge[1] = remap[edge[1] as usize];
    }
}
