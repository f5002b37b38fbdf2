//! Angle-limited dissolve of collinear and coplanar vertices.
//!
//! Dense drawings produce long near-straight runs of points; after tube
//! extrusion these become redundant cross-section rings. This stage
//! removes them without changing the silhouette beyond the angular
//! tolerance.
//!
//! On wire geometry a vertex joining exactly two segments is removed when
//! the segment directions deviate by no more than the angle limit, and
//! the segments are merged. On surface geometry the same intent is
//! expressed through the edge graph: an edge is a *feature* edge when it
//! borders a boundary or a crease (adjacent face normals deviating beyond
//! the limit). A vertex is removable when its feature edges number zero
//! (interior of a flat region) or exactly two nearly-collinear ones (on a
//! straight crease run); removal is a half-edge collapse into a
//! neighbor, rejected when it would create non-manifold geometry. Only
//! boundary-preserving removals are performed.

use hashbrown::HashMap;
use nalgebra::Vector3;
use tracing::info;

use crate::types::Mesh;

/// Statistics from a dissolve pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DissolveStats {
    /// Vertices removed.
    pub vertices_removed: usize,
    /// Number of sweeps over the mesh until no removal was possible.
    pub passes: usize,
}

/// Remove vertices that lie on near-straight runs, within `angle_limit`
/// radians.
///
/// An `angle_limit` of zero skips the stage entirely. Passes repeat until
/// a full sweep removes nothing; vertices are visited in ascending index
/// order and collapse targets are chosen by lowest index, so the result
/// is deterministic for identical input.
pub fn dissolve_collinear(mesh: &mut Mesh, angle_limit: f64) -> DissolveStats {
    let mut stats = DissolveStats::default();
    if angle_limit <= 0.0 || mesh.vertices.is_empty() {
        return stats;
    }

    let cos_limit = angle_limit.cos();

    loop {
        let mut removed = 0usize;
        if !mesh.faces.is_empty() {
            removed += dissolve_surface_pass(mesh, cos_limit);
        }
        if !mesh.edges.is_empty() {
            removed += dissolve_wire_pass(mesh, cos_limit);
        }
        if removed == 0 {
            break;
        }
        stats.vertices_removed += removed;
        stats.passes += 1;
    }

    if stats.vertices_removed > 0 {
        mesh.compact();
        info!(
            target: "mesh_reduce::dissolve",
            removed = stats.vertices_removed,
            passes = stats.passes,
            angle_limit,
            "Dissolved collinear vertices"
        );
    }

    stats
}

/// One sweep over the face graph. Adjacency is built from the sweep-start
/// state; any vertex whose neighborhood was modified during the sweep is
/// skipped until the next pass.
fn dissolve_surface_pass(mesh: &mut Mesh, cos_limit: f64) -> usize {
    let nverts = mesh.vertices.len();

    let mut edge_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
    for (fi, face) in mesh.faces.iter().enumerate() {
        for k in 0..3 {
            let e = normalize_edge(face[k], face[(k + 1) % 3]);
            edge_faces.entry(e).or_default().push(fi as u32);
        }
    }

    let normals: Vec<Option<Vector3<f64>>> = mesh.triangles().map(|t| t.normal()).collect();

    let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); nverts];
    for &(a, b) in edge_faces.keys() {
        neighbors[a as usize].push(b);
        neighbors[b as usize].push(a);
    }
    // Hash iteration order is arbitrary; sorted lists keep the sweep
    // deterministic.
    for list in &mut neighbors {
        list.sort_unstable();
    }

    let mut live: Vec<Option<[u32; 3]>> = mesh.faces.iter().copied().map(Some).collect();
    let mut touched = vec![false; nverts];
    let mut removed = 0usize;

    'vertices: for v in 0..nverts as u32 {
        if touched[v as usize] {
            continue;
        }
        let nbrs = &neighbors[v as usize];
        if nbrs.is_empty() {
            continue;
        }
        for &n in nbrs {
            if touched[n as usize] {
                continue 'vertices;
            }
        }

        let mut feature = [0u32; 2];
        let mut feature_count = 0usize;
        for &n in nbrs {
            let fs = &edge_faces[&normalize_edge(v, n)];
            let is_feature = if fs.len() == 2 {
                match (normals[fs[0] as usize], normals[fs[1] as usize]) {
                    (Some(na), Some(nb)) => na.dot(&nb) < cos_limit,
                    // Degenerate neighbor face: leave this vertex alone.
                    _ => {
                        continue 'vertices;
                    }
                }
            } else {
                true
            };
            if is_feature {
                if feature_count == 2 {
                    continue 'vertices; // corner or crossing, keep
                }
                feature[feature_count] = n;
                feature_count += 1;
            }
        }

        let target = match feature_count {
            // Interior of a flat region: collapse toward the lowest neighbor.
            0 => nbrs[0],
            2 => {
                let (a, b) = (feature[0], feature[1]);
                let d1 = mesh.vertices[v as usize] - mesh.vertices[a as usize];
                let d2 = mesh.vertices[b as usize] - mesh.vertices[v as usize];
                if !directions_within(&d1, &d2, cos_limit) {
                    continue;
                }
                a.min(b)
            }
            _ => continue,
        };

        if !collapse_is_manifold(&live, v, target) {
            continue;
        }

        for face_opt in live.iter_mut() {
            let Some(face) = face_opt else { continue };
            if !face.contains(&v) {
                continue;
            }
            for i in face.iter_mut() {
                if *i == v {
                    *i = target;
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                *face_opt = None;
            }
        }

        removed += 1;
        touched[v as usize] = true;
        touched[target as usize] = true;
        for &n in nbrs {
            touched[n as usize] = true;
        }
    }

    mesh.faces = live.into_iter().flatten().collect();
    removed
}

/// One sweep over the wire segment graph, merging through-vertices on
/// near-straight chains.
fn dissolve_wire_pass(mesh: &mut Mesh, cos_limit: f64) -> usize {
    let nverts = mesh.vertices.len();

    // Vertices also used by faces stay put; removing them would dangle
    // face indices.
    let mut face_referenced = vec![false; nverts];
    for face in &mesh.faces {
        for &i in face {
            face_referenced[i as usize] = true;
        }
    }

    let mut edges: Vec<Option<[u32; 2]>> = mesh.edges.iter().copied().map(Some).collect();
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); nverts];
    for (ei, e) in mesh.edges.iter().enumerate() {
        incident[e[0] as usize].push(ei);
        incident[e[1] as usize].push(ei);
    }

    let mut removed = 0usize;
    for v in 0..nverts as u32 {
        if face_referenced[v as usize] {
            continue;
        }

        let live: Vec<usize> = incident[v as usize]
            .iter()
            .copied()
            .filter(|&ei| edges[ei].is_some_and(|e| e[0] == v || e[1] == v))
            .collect();
        if live.len() != 2 {
            continue;
        }

        let a = other_endpoint(edges[live[0]].expect("live edge"), v);
        let b = other_endpoint(edges[live[1]].expect("live edge"), v);
        if a == b {
            continue; // two-segment loop
        }

        let d1 = mesh.vertices[v as usize] - mesh.vertices[a as usize];
        let d2 = mesh.vertices[b as usize] - mesh.vertices[v as usize];
        if !directions_within(&d1, &d2, cos_limit) {
            continue;
        }

        edges[live[0]] = Some([a, b]);
        edges[live[1]] = None;
        incident[b as usize].push(live[0]);
        removed += 1;
    }

    mesh.edges = edges.into_iter().flatten().collect();
    removed
}

/// Collapsing `v` into `target` is manifold-safe when the two vertices
/// share at most two neighbors (the opposite corners of the faces on
/// either side of the collapsed edge).
fn collapse_is_manifold(faces: &[Option<[u32; 3]>], v: u32, target: u32) -> bool {
    let mut neighbors_v = hashbrown::HashSet::new();
    let mut neighbors_t = hashbrown::HashSet::new();

    for face in faces.iter().flatten() {
        if face.contains(&v) {
            for &i in face {
                if i != v {
                    neighbors_v.insert(i);
                }
            }
        }
        if face.contains(&target) {
            for &i in face {
                if i != target {
                    neighbors_t.insert(i);
                }
            }
        }
    }

    neighbors_v.intersection(&neighbors_t).count() <= 2
}

#[inline]
fn normalize_edge(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

#[inline]
fn other_endpoint(edge: [u32; 2], v: u32) -> u32 {
    if edge[0] == v { edge[1] } else { edge[0] }
}

#[inline]
fn directions_within(d1: &Vector3<f64>, d2: &Vector3<f64>, cos_limit: f64) -> bool {
    let l1 = d1.norm();
    let l2 = d2.norm();
    if l1 < 1e-12 || l2 < 1e-12 {
        return false; // zero-length runs are the welding stage's problem
    }
    d1.dot(d2) / (l1 * l2) >= cos_limit
}
