//! Core mesh data types.

use nalgebra::{Point3, Vector3};

/// A triangle mesh with indexed vertices, produced by sweeping curve
/// networks and consumed by the reduction stages.
///
/// Vertices are addressed by their position in the vertex buffer. Tube
/// geometry populates `faces`; zero-radius (wire) geometry populates
/// `edges` instead and carries no faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Wire segments as index pairs into the vertex buffer.
    pub edges: Vec<[u32; 2]>,

    /// Triangle faces as index triples into the vertex buffer.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            edges: Vec::new(),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of wire segments in the mesh.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of triangle faces in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh carries no geometry at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check if the mesh is wire geometry (segments without surface).
    #[inline]
    pub fn is_wire(&self) -> bool {
        self.faces.is_empty() && !self.edges.is_empty()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns `(min_corner, max_corner)` or `None` if the mesh is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for p in &self.vertices[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Iterate over faces, yielding [`Triangle`] values with concrete positions.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize],
            v1: self.vertices[i1 as usize],
            v2: self.vertices[i2 as usize],
        })
    }

    /// Get a specific triangle by face index.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        self.faces.get(face_idx).map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize],
            v1: self.vertices[i1 as usize],
            v2: self.vertices[i2 as usize],
        })
    }

    /// Append another mesh, offsetting its indices past this mesh's vertices.
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.edges
            .extend(other.edges.iter().map(|&[a, b]| [a + offset, b + offset]));
        self.faces
            .extend(other.faces.iter().map(|&[a, b, c]| {
                [a + offset, b + offset, c + offset]
            }));
    }

    /// Remove vertices referenced by no face and no edge, compacting the
    /// vertex buffer and re-indexing faces and edges.
    ///
    /// Returns the number of vertices removed.
    pub fn compact(&mut self) -> usize {
        let original_count = self.vertices.len();

        let mut referenced = vec![false; original_count];
        for face in &self.faces {
            for &i in face {
                referenced[i as usize] = true;
            }
        }
        for edge in &self.edges {
            for &i in edge {
                referenced[i as usize] = true;
            }
        }

        if referenced.iter().all(|&r| r) {
            return 0;
        }

        let mut remap = vec![u32::MAX; original_count];
        let mut new_vertices = Vec::with_capacity(original_count);
        for (old_idx, &keep) in referenced.iter().enumerate() {
            if keep {
                remap[old_idx] = new_vertices.len() as u32;
                new_vertices.push(self.vertices[old_idx]);
            }
        }

        for face in &mut self.faces {
            for i in face.iter_mut() {
                *i = remap[*i as usize];
            }
        }
        for edge in &mut self.edges {
            for i in edge.iter_mut() {
                *i = remap[*i as usize];
            }
        }

        let removed = original_count - new_vertices.len();
        self.vertices = new_vertices;
        removed
    }
}

/// A triangle with concrete vertex positions.
///
/// Utility type for geometric calculations. Winding is counter-clockwise
/// when viewed from the front (normal points toward viewer).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    /// Returns `None` for degenerate triangles (zero area).
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Compute the area of the triangle.
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Compute the centroid.
    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::new(
            (self.v0.x + self.v1.x + self.v2.x) / 3.0,
            (self.v0.y + self.v1.y + self.v2.y) / 3.0,
            (self.v0.z + self.v1.z + self.v2.z) / 3.0,
        )
    }

    /// Check if the triangle is degenerate (zero or near-zero area).
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.area() < epsilon
    }
}
