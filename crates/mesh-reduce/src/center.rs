//! Reference-origin calculation for auto-centering.
//!
//! Drawing coordinates often sit millions of units from the origin
//! (survey grids, national coordinate systems), which wrecks `f32`
//! precision in downstream viewers. The pipeline subtracts one reference
//! origin, the midpoint of a sampled bounding box, from all geometry.
//! The origin is computed once per run and frozen; recomputing it per
//! layer would break relative alignment between layers.

use nalgebra::Point3;
use tracing::debug;

use crate::error::{ReduceError, ReduceResult};
use crate::polyline::Polyline;

/// Default number of points sampled for the bounding box.
///
/// Sampling stops after this many points in document order. The cap
/// trades exactness for speed on multi-million-point inputs: extrema past
/// the cap shift the origin, which is acceptable because centering only
/// needs to keep coordinates numerically well-conditioned.
pub const DEFAULT_SAMPLE_CAP: usize = 100_000;

/// Compute the reference origin for a sequence of polylines.
///
/// Returns the midpoint of the axis-aligned bounding box of up to
/// `sample_cap` points, traversed in document order.
///
/// # Errors
///
/// Returns [`ReduceError::EmptyInput`] when the polylines contain no
/// points at all; the bounding box is undefined and the caller must
/// abort.
pub fn compute_center(polylines: &[Polyline], sample_cap: usize) -> ReduceResult<Point3<f64>> {
    let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
    let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);

    let mut sampled = 0usize;
    'outer: for pl in polylines {
        for p in &pl.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);

            sampled += 1;
            if sampled >= sample_cap {
                break 'outer;
            }
        }
    }

    if sampled == 0 {
        return Err(ReduceError::empty_input(
            "cannot compute a reference origin from zero points",
        ));
    }

    let center = Point3::new(
        (min.x + max.x) * 0.5,
        (min.y + max.y) * 0.5,
        (min.z + max.z) * 0.5,
    );

    debug!(
        target: "mesh_reduce::center",
        sampled,
        center_x = center.x,
        center_y = center.y,
        center_z = center.z,
        "Computed reference origin"
    );

    Ok(center)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_polyline(points: Vec<Point3<f64>>) -> Vec<Polyline> {
        vec![Polyline::new(points)]
    }

    #[test]
    fn test_center_is_bbox_midpoint() {
        let pls = one_polyline(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 4.0, -2.0),
        ]);
        let c = compute_center(&pls, DEFAULT_SAMPLE_CAP).unwrap();
        assert_eq!(c, Point3::new(5.0, 2.0, -1.0));
    }

    #[test]
    fn test_center_within_bounds() {
        let pls = one_polyline(vec![
            Point3::new(1000.0, -50.0, 3.0),
            Point3::new(1200.0, 80.0, 9.0),
            Point3::new(1100.0, 10.0, 5.0),
        ]);
        let c = compute_center(&pls, DEFAULT_SAMPLE_CAP).unwrap();
        assert!(c.x >= 1000.0 && c.x <= 1200.0);
        assert!(c.y >= -50.0 && c.y <= 80.0);
        assert!(c.z >= 3.0 && c.z <= 9.0);
    }

    #[test]
    fn test_sample_cap_ignores_trailing_points() {
        // Extremum lives past the cap and must not shift the origin.
        let pls = one_polyline(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1_000_000.0, 0.0, 0.0),
        ]);
        let c = compute_center(&pls, 2).unwrap();
        assert_eq!(c.x, 1.0);
    }

    #[test]
    fn test_empty_input_is_hard_error() {
        let err = compute_center(&[], DEFAULT_SAMPLE_CAP).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::EmptyInput);
    }

    #[test]
    fn test_zero_point_polylines_only() {
        let pls = one_polyline(vec![]);
        assert!(compute_center(&pls, DEFAULT_SAMPLE_CAP).is_err());
    }
}
