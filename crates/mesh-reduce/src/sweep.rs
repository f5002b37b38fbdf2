//! Mesh generation: sweeping a cross-section profile along curve strands.
//!
//! Each strand is extruded into a tube by sweeping a regular polygon
//! perpendicular to the local strand direction. Cross-section frames are
//! propagated with the double-reflection parallel transport method
//! (Wang et al., 2008), which keeps tubes from twisting at inflections.
//! Strands never share vertices here; merging identical positions is the
//! welding stage's job, which keeps this stage strand-local.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::network::{CurveNetwork, Strand};
use crate::types::Mesh;

/// Minimum number of cross-section sides for tube geometry.
pub const MIN_RESOLUTION: u32 = 3;

/// Cross-section profile for the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepParams {
    /// Number of sides of the swept polygon. Values below 3 are clamped.
    pub resolution: u32,

    /// Radius of the swept polygon. Zero produces wire geometry
    /// (vertices and segments, no surface).
    pub bevel_radius: f64,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            resolution: 8,
            bevel_radius: 0.5,
        }
    }
}

impl SweepParams {
    /// Profile producing wire geometry with no surface.
    pub fn wire() -> Self {
        Self {
            resolution: MIN_RESOLUTION,
            bevel_radius: 0.0,
        }
    }

    /// Profile with the given side count and radius.
    pub fn tube(resolution: u32, bevel_radius: f64) -> Self {
        Self {
            resolution: resolution.max(MIN_RESOLUTION),
            bevel_radius: bevel_radius.max(0.0),
        }
    }
}

/// Convert a curve network into a single mesh.
///
/// Every strand contributes an independent tube (or wire run); no
/// vertices are shared across strands.
pub fn sweep_network(network: &CurveNetwork, params: &SweepParams) -> Mesh {
    let mut mesh = Mesh::new();
    for strand in &network.strands {
        sweep_strand_into(&mut mesh, strand, params);
    }

    debug!(
        target: "mesh_reduce::sweep",
        network = network.name.as_str(),
        strands = network.strand_count(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        edges = mesh.edge_count(),
        "Swept curve network"
    );

    mesh
}

/// Sweep a single strand, appending its geometry to `mesh`.
pub fn sweep_strand_into(mesh: &mut Mesh, strand: &Strand, params: &SweepParams) {
    let n = strand.points.len();
    if n < 2 {
        return;
    }

    if params.bevel_radius <= 0.0 {
        append_wire(mesh, strand);
        return;
    }

    let resolution = params.resolution.max(MIN_RESOLUTION) as usize;
    let tangents = strand_tangents(strand);
    let base = mesh.vertices.len() as u32;

    // Ring vertices, one cross-section per strand point.
    let mut prev_frame: Option<RingFrame> = None;
    for (point, tangent) in strand.points.iter().zip(&tangents) {
        let frame = match prev_frame {
            None => RingFrame::from_tangent(*point, *tangent),
            Some(ref prev) => prev.transport(*point, *tangent),
        };

        for k in 0..resolution {
            let theta = std::f64::consts::TAU * k as f64 / resolution as f64;
            let offset =
                (frame.normal * theta.cos() + frame.binormal * theta.sin()) * params.bevel_radius;
            mesh.vertices.push(point + offset);
        }

        prev_frame = Some(frame);
    }

    // Stitch consecutive rings with quads split into two triangles.
    let ring = |i: usize, k: usize| base + (i * resolution + k) as u32;
    let segments = strand.segment_count();
    for s in 0..segments {
        let i = s;
        let j = (s + 1) % n; // wraps to the first ring on closed strands
        for k in 0..resolution {
            let k1 = (k + 1) % resolution;
            let a = ring(i, k);
            let b = ring(i, k1);
            let c = ring(j, k1);
            let d = ring(j, k);
            mesh.faces.push([a, b, c]);
            mesh.faces.push([a, c, d]);
        }
    }
}

fn append_wire(mesh: &mut Mesh, strand: &Strand) {
    let base = mesh.vertices.len() as u32;
    let n = strand.points.len();
    mesh.vertices.extend_from_slice(&strand.points);

    for s in 0..strand.segment_count() {
        let a = base + s as u32;
        let b = base + ((s + 1) % n) as u32;
        mesh.edges.push([a, b]);
    }
}

/// Per-point sweep directions.
///
/// Interior points take the bisector of the incoming and outgoing segment
/// directions; endpoints of open strands take the single adjacent segment
/// direction. Closed strands treat every point as interior.
fn strand_tangents(strand: &Strand) -> Vec<Vector3<f64>> {
    let points = &strand.points;
    let n = points.len();

    let segment_dir = |from: usize, to: usize| -> Vector3<f64> {
        let d = points[to] - points[from];
        let len = d.norm();
        if len > 1e-12 { d / len } else { Vector3::zeros() }
    };

    (0..n)
        .map(|i| {
            let incoming = if i > 0 {
                Some(segment_dir(i - 1, i))
            } else if strand.closed {
                Some(segment_dir(n - 1, i))
            } else {
                None
            };
            let outgoing = if i + 1 < n {
                Some(segment_dir(i, i + 1))
            } else if strand.closed {
                Some(segment_dir(i, 0))
            } else {
                None
            };

            let dir = match (incoming, outgoing) {
                (Some(a), Some(b)) => a + b,
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => Vector3::zeros(),
            };

            let len = dir.norm();
            if len > 1e-12 {
                dir / len
            } else {
                // Hairpin or coincident points: fall back to whichever
                // adjacent direction exists.
                outgoing.or(incoming).unwrap_or_else(Vector3::x)
            }
        })
        .collect()
}

/// Orthonormal cross-section frame at one strand point.
#[derive(Debug, Clone, Copy)]
struct RingFrame {
    position: Point3<f64>,
    tangent: Vector3<f64>,
    normal: Vector3<f64>,
    binormal: Vector3<f64>,
}

impl RingFrame {
    /// Build the initial frame from a tangent and a world-up hint.
    fn from_tangent(position: Point3<f64>, tangent: Vector3<f64>) -> Self {
        let tangent = if tangent.norm() > 1e-12 {
            tangent.normalize()
        } else {
            Vector3::x()
        };

        let up = if tangent.z.abs() < 0.9 {
            Vector3::z()
        } else {
            Vector3::y()
        };

        let binormal = tangent.cross(&up);
        let binormal_norm = binormal.norm();
        let (normal, binormal) = if binormal_norm > 1e-10 {
            let binormal = binormal / binormal_norm;
            (binormal.cross(&tangent), binormal)
        } else {
            let perp = if tangent.x.abs() < 0.9 {
                Vector3::x()
            } else {
                Vector3::y()
            };
            let binormal = tangent.cross(&perp).normalize();
            (binormal.cross(&tangent), binormal)
        };

        Self {
            position,
            tangent,
            normal,
            binormal,
        }
    }

    /// Transport this frame to a new position and tangent using the
    /// double reflection method.
    fn transport(&self, position: Point3<f64>, tangent: Vector3<f64>) -> Self {
        let tangent = if tangent.norm() > 1e-12 {
            tangent.normalize()
        } else {
            self.tangent
        };

        let v1 = position - self.position;
        let c1 = v1.dot(&v1);

        if c1 < 1e-20 {
            // Coincident points: keep the previous orientation around the
            // new tangent.
            let binormal = tangent.cross(&self.normal);
            let binormal_norm = binormal.norm();
            let (normal, binormal) = if binormal_norm > 1e-10 {
                let binormal = binormal / binormal_norm;
                (binormal.cross(&tangent), binormal)
            } else {
                (self.normal, self.binormal)
            };
            return Self {
                position,
                tangent,
                normal,
                binormal,
            };
        }

        // First reflection across the plane perpendicular to the chord.
        let r_l = self.normal - v1 * (2.0 / c1) * v1.dot(&self.normal);
        let t_l = self.tangent - v1 * (2.0 / c1) * v1.dot(&self.tangent);

        // Second reflection aligns the transported tangent with the new one.
        let v2 = tangent - t_l;
        let c2 = v2.dot(&v2);
        let normal = if c2 < 1e-20 {
            r_l.normalize()
        } else {
            (r_l - v2 * (2.0 / c2) * v2.dot(&r_l)).normalize()
        };

        let binormal = tangent.cross(&normal);

        Self {
            position,
            tangent,
            normal,
            binormal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Strand;
    use approx::assert_relative_eq;

    fn strand(points: Vec<Point3<f64>>, closed: bool) -> Strand {
        Strand { points, closed }
    }

    fn sweep_one(strand: &Strand, params: &SweepParams) -> Mesh {
        let mut mesh = Mesh::new();
        sweep_strand_into(&mut mesh, strand, params);
        mesh
    }

    #[test]
    fn test_open_strand_counts() {
        let s = strand(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            false,
        );
        let mesh = sweep_one(&s, &SweepParams::tube(4, 0.1));

        // 2 rings of 4 vertices; 1 segment of 4 quads = 8 triangles.
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 8);
        assert!(mesh.edges.is_empty());
    }

    #[test]
    fn test_closed_strand_wraps_to_first_ring() {
        let s = strand(
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
            ],
            true,
        );
        let res = 8u32;
        let mesh = sweep_one(&s, &SweepParams::tube(res, 0.1));

        // 3 rings, 3 segments of quads.
        assert_eq!(mesh.vertex_count(), 3 * res as usize);
        assert_eq!(mesh.face_count(), 3 * res as usize * 2);

        // Some face must span the last ring and the first ring.
        let last_ring_start = 2 * res;
        let closing = mesh.faces.iter().any(|f| {
            f.iter().any(|&i| i >= last_ring_start) && f.iter().any(|&i| i < res)
        });
        assert!(closing, "no face connects the last ring back to the first");
    }

    #[test]
    fn test_zero_radius_produces_wire() {
        let s = strand(
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.5, 0.0),
            ],
            false,
        );
        let mesh = sweep_one(&s, &SweepParams::wire());

        assert!(mesh.is_wire());
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.edge_count(), 2);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_closed_wire_wraps() {
        let s = strand(
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
            ],
            true,
        );
        let mesh = sweep_one(&s, &SweepParams::wire());
        assert_eq!(mesh.edge_count(), 3);
        assert_eq!(mesh.edges[2], [2, 0]);
    }

    #[test]
    fn test_single_point_strand_is_skipped() {
        let s = strand(vec![Point3::origin()], false);
        let mesh = sweep_one(&s, &SweepParams::default());
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_ring_radius() {
        let s = strand(
            vec![Point3::origin(), Point3::new(10.0, 0.0, 0.0)],
            false,
        );
        let r = 0.5;
        let mesh = sweep_one(&s, &SweepParams::tube(6, r));

        // Every first-ring vertex sits at distance r from the strand point.
        for v in &mesh.vertices[..6] {
            assert_relative_eq!((v - Point3::origin()).norm(), r, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_frames_do_not_twist_on_straight_runs() {
        let s = strand(
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
            ],
            false,
        );
        let res = 4usize;
        let mesh = sweep_one(&s, &SweepParams::tube(res as u32, 0.25));

        // Corresponding vertices on consecutive rings differ only in x.
        for ring in 0..3 {
            for k in 0..res {
                let a = mesh.vertices[ring * res + k];
                let b = mesh.vertices[(ring + 1) * res + k];
                assert_relative_eq!(a.y, b.y, epsilon = 1e-10);
                assert_relative_eq!(a.z, b.z, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_strands_do_not_share_vertices() {
        let a = strand(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)], false);
        let b = strand(vec![Point3::origin(), Point3::new(0.0, 1.0, 0.0)], false);

        let network = CurveNetwork {
            name: "L".into(),
            strands: vec![a, b],
        };
        let mesh = sweep_network(&network, &SweepParams::tube(4, 0.1));

        // Two independent tubes even though the strands touch at the origin.
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 16);
    }

    #[test]
    fn test_resolution_clamped() {
        let params = SweepParams::tube(1, 0.2);
        assert_eq!(params.resolution, MIN_RESOLUTION);
    }
}
