//! Curve network construction: centering, scaling, and per-layer merging.

use nalgebra::Point3;
use tracing::debug;

use crate::polyline::Polyline;

/// One centered, scaled point run inside a [`CurveNetwork`].
#[derive(Debug, Clone, PartialEq)]
pub struct Strand {
    /// Transformed points of the run.
    pub points: Vec<Point3<f64>>,

    /// Whether the last point connects back to the first.
    pub closed: bool,
}

impl Strand {
    /// Number of segments in the strand, honoring the closed flag.
    pub fn segment_count(&self) -> usize {
        match (self.points.len(), self.closed) {
            (0 | 1, _) => 0,
            (n, true) => n,
            (n, false) => n - 1,
        }
    }
}

/// A named multi-strand curve network, the unit of mesh generation.
///
/// One network per layer in merge mode; one per polyline otherwise.
#[derive(Debug, Clone)]
pub struct CurveNetwork {
    /// Network name, derived from the layer tag.
    pub name: String,

    /// Strands in source order.
    pub strands: Vec<Strand>,
}

impl CurveNetwork {
    /// Number of strands in the network.
    #[inline]
    pub fn strand_count(&self) -> usize {
        self.strands.len()
    }

    /// Total number of points across all strands.
    pub fn total_points(&self) -> usize {
        self.strands.iter().map(|s| s.points.len()).sum()
    }
}

/// Result of building a curve network from one polyline group.
#[derive(Debug, Clone)]
pub struct NetworkBuildResult {
    /// The built network.
    pub network: CurveNetwork,

    /// Polylines skipped because they carry fewer than two points.
    pub degenerate_dropped: usize,
}

/// Merge a group of polylines into one curve network.
///
/// Each renderable polyline becomes one strand with every point
/// transformed as `(input - center) * scale`, independently per axis.
/// Polylines with fewer than two points carry no renderable geometry and
/// are dropped silently (counted, never an error). Strands inherit the
/// `closed` flag of their source polyline.
pub fn build_network(
    name: impl Into<String>,
    polylines: &[&Polyline],
    center: Point3<f64>,
    scale: f64,
) -> NetworkBuildResult {
    let name = name.into();
    let mut strands = Vec::with_capacity(polylines.len());
    let mut degenerate_dropped = 0usize;

    for pl in polylines {
        if !pl.is_renderable() {
            degenerate_dropped += 1;
            continue;
        }

        let points = pl
            .points
            .iter()
            .map(|p| Point3::from((p - center) * scale))
            .collect();

        strands.push(Strand {
            points,
            closed: pl.closed,
        });
    }

    debug!(
        target: "mesh_reduce::network",
        network = name.as_str(),
        strands = strands.len(),
        dropped = degenerate_dropped,
        "Built curve network"
    );

    NetworkBuildResult {
        network: CurveNetwork { name, strands },
        degenerate_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyline::Polyline;

    #[test]
    fn test_centering_and_scale() {
        let pl = Polyline::new(vec![
            Point3::new(10.0, 20.0, 30.0),
            Point3::new(12.0, 20.0, 30.0),
        ]);
        let result = build_network("L", &[&pl], Point3::new(10.0, 20.0, 30.0), 2.0);

        let strand = &result.network.strands[0];
        assert_eq!(strand.points[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(strand.points[1], Point3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_degenerate_polylines_dropped() {
        let good = Polyline::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        let empty = Polyline::new(vec![]);
        let single = Polyline::new(vec![Point3::origin()]);

        let group: Vec<&Polyline> = vec![&good, &empty, &single, &good, &good];
        let result = build_network("L", &group, Point3::origin(), 1.0);

        assert_eq!(result.network.strand_count(), 3);
        assert_eq!(result.degenerate_dropped, 2);
    }

    #[test]
    fn test_closed_flag_inherited() {
        let pl = Polyline::with_layer(
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
            ],
            true,
            "L",
        );
        let result = build_network("L", &[&pl], Point3::origin(), 1.0);
        assert!(result.network.strands[0].closed);
    }

    #[test]
    fn test_segment_count() {
        let open = Strand {
            points: vec![Point3::origin(); 4],
            closed: false,
        };
        let closed = Strand {
            points: vec![Point3::origin(); 4],
            closed: true,
        };
        assert_eq!(open.segment_count(), 3);
        assert_eq!(closed.segment_count(), 4);
    }
}
