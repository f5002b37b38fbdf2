//! Polyline data model and layer grouping.

use indexmap::IndexMap;
use nalgebra::Point3;

/// Layer tag assigned to polylines that carry none.
pub const DEFAULT_LAYER: &str = "Default";

/// An ordered run of 3D points extracted from a line drawing.
///
/// Immutable once loaded; owned by the [`PolylineSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// Ordered points of the run.
    pub points: Vec<Point3<f64>>,

    /// Whether the first and last point are implicitly connected.
    pub closed: bool,

    /// Layer tag from the source drawing.
    pub layer: String,
}

impl Polyline {
    /// Create an open polyline on the default layer.
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self {
            points,
            closed: false,
            layer: DEFAULT_LAYER.to_string(),
        }
    }

    /// Create a polyline with an explicit closed flag and layer tag.
    pub fn with_layer(points: Vec<Point3<f64>>, closed: bool, layer: impl Into<String>) -> Self {
        Self {
            points,
            closed,
            layer: layer.into(),
        }
    }

    /// Number of points in the run.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Whether the polyline carries renderable geometry.
    ///
    /// Runs with fewer than two points have no extent and are skipped by
    /// every downstream stage.
    #[inline]
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }
}

/// The full ordered collection of polylines read from an input document.
#[derive(Debug, Clone, Default)]
pub struct PolylineSet {
    /// Polylines in document order.
    pub polylines: Vec<Polyline>,

    /// Extraction statistics carried through unchanged for diagnostics.
    pub stats: Option<serde_json::Value>,
}

impl PolylineSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from polylines, with no diagnostics attached.
    pub fn from_polylines(polylines: Vec<Polyline>) -> Self {
        Self {
            polylines,
            stats: None,
        }
    }

    /// Number of polylines in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    /// Check if the set carries no polylines at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Total number of points across all polylines.
    pub fn total_points(&self) -> usize {
        self.polylines.iter().map(|pl| pl.points.len()).sum()
    }

    /// Partition polylines by layer tag.
    ///
    /// See [`group_by_layer`].
    pub fn group_by_layer(&self) -> IndexMap<String, Vec<&Polyline>> {
        group_by_layer(&self.polylines)
    }
}

/// Partition a polyline sequence by layer tag.
///
/// Buckets by exact string equality. Iteration order of the resulting
/// groups follows the first appearance of each tag in document order,
/// which fixes the processing and output order of every derived mesh.
pub fn group_by_layer(polylines: &[Polyline]) -> IndexMap<String, Vec<&Polyline>> {
    let mut groups: IndexMap<String, Vec<&Polyline>> = IndexMap::new();
    for pl in polylines {
        groups.entry(pl.layer.clone()).or_default().push(pl);
    }
    groups
}
