//! Distance-based vertex welding.

use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::info;

use crate::types::Mesh;

/// Statistics from a welding pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeldStats {
    /// Vertices merged into a surviving representative.
    pub vertices_merged: usize,
    /// Faces discarded because they collapsed below three distinct corners.
    pub faces_dropped: usize,
    /// Wire segments discarded because both endpoints merged.
    pub edges_dropped: usize,
}

/// Merge vertices whose positions differ by no more than `weld_distance`
/// along each axis.
///
/// Uses a spatial hash over cells of `weld_distance` size; candidates are
/// gathered from the 3x3x3 cell neighborhood, so no qualifying pair is
/// missed. The surviving representative of each cluster is the lowest
/// vertex index, keeping its own position. Faces and edges are re-indexed
/// to survivors; faces with fewer than three distinct corners and edges
/// with identical endpoints are discarded, and the vertex buffer is
/// compacted.
///
/// A `weld_distance` of zero skips the stage entirely.
pub fn weld_vertices(mesh: &mut Mesh, weld_distance: f64) -> WeldStats {
    let mut stats = WeldStats::default();
    if weld_distance <= 0.0 || mesh.vertices.is_empty() {
        return stats;
    }

    let cell_size = weld_distance;
    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, p) in mesh.vertices.iter().enumerate() {
        spatial_hash
            .entry(pos_to_cell(p, cell_size))
            .or_default()
            .push(idx as u32);
    }

    // Cluster into the lowest index of each group.
    let mut vertex_remap: Vec<u32> = (0..mesh.vertices.len() as u32).collect();

    for (idx, p) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        if vertex_remap[idx as usize] != idx {
            continue; // already merged into an earlier vertex
        }

        let cell = pos_to_cell(p, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (cell.0 + dx, cell.1 + dy, cell.2 + dz);
                    let Some(candidates) = spatial_hash.get(&neighbor) else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || vertex_remap[other as usize] != other {
                            continue;
                        }
                        let q = &mesh.vertices[other as usize];
                        if within_axis_distance(p, q, weld_distance) {
                            vertex_remap[other as usize] = idx;
                            stats.vertices_merged += 1;
                        }
                    }
                }
            }
        }
    }

    if stats.vertices_merged == 0 {
        return stats;
    }

    // Resolve transitive merges (A->B, B->C => A->C).
    for i in 0..vertex_remap.len() {
        let mut target = vertex_remap[i];
        while vertex_remap[target as usize] != target {
            target = vertex_remap[target as usize];
        }
        vertex_remap[i] = target;
    }

    for face in &mut mesh.faces {
        for i in face.iter_mut() {
            *i = vertex_remap[*i as usize];
        }
    }
    for edge in &mut mesh.edges {
        for i in edge.iter_mut() {
            *i = vertex_remap[*i as usize];
        }
    }

    let faces_before = mesh.faces.len();
    mesh.faces
        .retain(|&[i0, i1, i2]| i0 != i1 && i1 != i2 && i0 != i2);
    stats.faces_dropped = faces_before - mesh.faces.len();

    let edges_before = mesh.edges.len();
    mesh.edges.retain(|&[a, b]| a != b);
    stats.edges_dropped = edges_before - mesh.edges.len();

    mesh.compact();

    info!(
        target: "mesh_reduce::weld",
        merged = stats.vertices_merged,
        faces_dropped = stats.faces_dropped,
        distance = weld_distance,
        "Welded vertices"
    );

    stats
}

#[inline]
fn within_axis_distance(p: &Point3<f64>, q: &Point3<f64>, d: f64) -> bool {
    (p.x - q.x).abs() <= d && (p.y - q.y).abs() <= d && (p.z - q.z).abs() <= d
}

#[inline]
fn pos_to_cell(p: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles_touching() -> Mesh {
        let mut mesh = Mesh::new();
        // Two triangles sharing an edge geometrically, but with duplicated
        // vertices the way independent tube strands produce them.
        mesh.vertices.push(Point3::new(0.0, 0.0, 0.0)); // 0
        mesh.vertices.push(Point3::new(1.0, 0.0, 0.0)); // 1
        mesh.vertices.push(Point3::new(0.5, 1.0, 0.0)); // 2
        mesh.vertices.push(Point3::new(1.0000001, 0.0, 0.0)); // dup of 1
        mesh.vertices.push(Point3::new(0.5000001, 1.0, 0.0)); // dup of 2
        mesh.vertices.push(Point3::new(1.5, 1.0, 0.0)); // 5
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([3, 5, 4]);
        mesh
    }

    #[test]
    fn test_weld_merges_duplicates() {
        let mut mesh = two_triangles_touching();
        let stats = weld_vertices(&mut mesh, 0.001);

        assert_eq!(stats.vertices_merged, 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        // Both faces survive and now share vertices.
        assert_eq!(stats.faces_dropped, 0);
    }

    #[test]
    fn test_weld_zero_distance_is_noop() {
        let mut mesh = two_triangles_touching();
        let before_vertices = mesh.vertex_count();
        let before_faces = mesh.face_count();

        let stats = weld_vertices(&mut mesh, 0.0);

        assert_eq!(stats.vertices_merged, 0);
        assert_eq!(mesh.vertex_count(), before_vertices);
        assert_eq!(mesh.face_count(), before_faces);
    }

    #[test]
    fn test_weld_drops_collapsed_faces() {
        let mut mesh = Mesh::new();
        // Sliver triangle whose corners all sit within the weld distance.
        mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.0001, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.0, 0.0001, 0.0));
        mesh.faces.push([0, 1, 2]);

        let stats = weld_vertices(&mut mesh, 0.001);

        assert_eq!(stats.faces_dropped, 1);
        assert_eq!(mesh.face_count(), 0);
        // All vertices merged then compacted away with the face.
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_weld_uses_per_axis_distance() {
        let mut mesh = Mesh::new();
        // Within 0.001 on each axis even though the Euclidean distance is larger.
        mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.0009, 0.0009, 0.0009));
        mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.5, 1.0, 0.0));
        mesh.faces.push([0, 2, 3]);
        mesh.faces.push([1, 2, 3]);

        let stats = weld_vertices(&mut mesh, 0.001);
        assert_eq!(stats.vertices_merged, 1);
    }

    #[test]
    fn test_weld_keeps_lowest_index_position() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.0005, 0.0, 0.0));
        mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.5, 1.0, 0.0));
        mesh.faces.push([1, 2, 3]);
        mesh.faces.push([0, 2, 3]);

        weld_vertices(&mut mesh, 0.001);

        // Representative keeps the position of vertex 0.
        assert_eq!(mesh.vertices[0], Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_weld_wire_edges() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(1.0000005, 0.0, 0.0)); // dup of 1
        mesh.vertices.push(Point3::new(2.0, 0.0, 0.0));
        mesh.edges.push([0, 1]);
        mesh.edges.push([2, 3]);

        let stats = weld_vertices(&mut mesh, 0.001);

        assert_eq!(stats.vertices_merged, 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.edge_count(), 2);
        // The two runs are now a connected chain.
        assert_eq!(mesh.edges[1], [1, 2]);
    }
}
