//! Loading of polyline documents.
//!
//! The input is a JSON document produced by the drawing-extraction step:
//!
//! ```json
//! {
//!   "polylines": [
//!     { "points": [[0.0, 0.0, 0.0], [1.0, 2.0, 0.0]], "closed": false, "layer": "Contours" }
//!   ],
//!   "stats": { "entities": 12405 }
//! }
//! ```
//!
//! `closed` defaults to `false` and `layer` to `"Default"` when absent.
//! The optional `stats` object is carried through untouched for
//! diagnostics. Malformed documents fail fast; a well-formed document
//! with no geometry loads successfully and is rejected later by the
//! pipeline's empty-input precondition.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ReduceError, ReduceResult};
use crate::polyline::{DEFAULT_LAYER, Polyline, PolylineSet};

#[derive(Debug, Deserialize)]
struct PolylineDocument {
    #[serde(default)]
    polylines: Vec<PolylineRecord>,
    #[serde(default)]
    stats: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PolylineRecord {
    #[serde(default)]
    points: Vec<[f64; 3]>,
    #[serde(default)]
    closed: bool,
    #[serde(default = "default_layer")]
    layer: String,
}

fn default_layer() -> String {
    DEFAULT_LAYER.to_string()
}

/// Load a polyline document from a file path.
pub fn load_polylines(path: impl AsRef<Path>) -> ReduceResult<PolylineSet> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ReduceError::io_read(path, e))?;
    let set = polylines_from_reader(BufReader::new(file), path)?;
    info!(
        target: "mesh_reduce::io",
        path = path.display().to_string(),
        polylines = set.len(),
        points = set.total_points(),
        "Loaded polyline document"
    );
    Ok(set)
}

/// Load a polyline document from any reader.
///
/// `origin` labels the source in error diagnostics (a path for files, any
/// descriptive name for in-memory readers).
pub fn polylines_from_reader(
    reader: impl Read,
    origin: impl AsRef<Path>,
) -> ReduceResult<PolylineSet> {
    let origin = origin.as_ref();
    let doc: PolylineDocument = serde_json::from_reader(reader)
        .map_err(|e| ReduceError::parse_error(origin, e.to_string()))?;
    convert_document(doc)
}

/// Load a polyline document from a JSON string.
pub fn polylines_from_str(json: &str, origin: impl AsRef<Path>) -> ReduceResult<PolylineSet> {
    let origin = origin.as_ref();
    let doc: PolylineDocument = serde_json::from_str(json)
        .map_err(|e| ReduceError::parse_error(origin, e.to_string()))?;
    convert_document(doc)
}

fn convert_document(doc: PolylineDocument) -> ReduceResult<PolylineSet> {
    let mut polylines = Vec::with_capacity(doc.polylines.len());

    for (pl_idx, record) in doc.polylines.into_iter().enumerate() {
        let mut points = Vec::with_capacity(record.points.len());
        for (pt_idx, [x, y, z]) in record.points.into_iter().enumerate() {
            for (axis, value) in [("x", x), ("y", y), ("z", z)] {
                if !value.is_finite() {
                    return Err(ReduceError::invalid_coordinate(pl_idx, pt_idx, axis, value));
                }
            }
            points.push(nalgebra::Point3::new(x, y, z));
        }
        polylines.push(Polyline::with_layer(points, record.closed, record.layer));
    }

    debug!(
        target: "mesh_reduce::io",
        polylines = polylines.len(),
        "Converted polyline records"
    );

    Ok(PolylineSet {
        polylines,
        stats: doc.stats,
    })
}
