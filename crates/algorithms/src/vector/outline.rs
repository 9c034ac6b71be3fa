//! Polygon outlines

use geo::{MultiLineString, MultiPolygon};

/// Every ring of `polygons` (exteriors and holes) as a line.
pub fn polygon_outline(polygons: &MultiPolygon<f64>) -> MultiLineString<f64> {
    MultiLineString(
        polygons
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .filter(|ring| ring.0.len() > 1)
            .cloned()
            .collect(),
    )
}
