//! Raster to polygon conversion
//!
//! Valid cells are grouped by value. Runs of equal cells in a row are
//! stacked into rectangles while the same run repeats in the next row,
//! then the rectangles of each value are dissolved.

use super::overlay::union_all;
use geo::{Coord, Geometry, LineString, Polygon};
use lakeflat_core::raster::{GeoTransform, Raster};
use lakeflat_core::vector::{AttributeValue, Feature, FeatureCollection};
use lakeflat_core::Result;
use std::collections::HashMap;

/// Attribute holding the cell value of a polygonized region
pub const DN_FIELD: &str = "DN";

/// Rectangle of cells: rows `row0..row1`, columns `col0..col1`
fn cell_rect(transform: &GeoTransform, row0: usize, row1: usize, col0: usize, col1: usize) -> Polygon<f64> {
    let corner = |col: usize, row: usize| {
        let (x, y) = transform.pixel_to_geo_corner(col, row);
        Coord { x, y }
    };
    Polygon::new(
        LineString::from(vec![
            corner(col0, row0),
            corner(col0, row1),
            corner(col1, row1),
            corner(col1, row0),
            corner(col0, row0),
        ]),
        vec![],
    )
}

/// Key for grouping cell values; -0.0 and 0.0 share a key
fn value_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Turn every connected region of equal valid cells into a polygon feature.
///
/// Each feature has a `DN` attribute with the cell value. Features are
/// ordered by value. No-data cells produce no geometry.
pub fn polygonize(raster: &Raster<f64>) -> Result<FeatureCollection> {
    let (rows, cols) = raster.shape();
    let transform = raster.transform();

    // value key -> (value, finished rectangles)
    let mut groups: HashMap<u64, (f64, Vec<Polygon<f64>>)> = HashMap::new();
    // (col0, col1, value key) -> (first row, value) of runs still growing downwards
    let mut open: HashMap<(usize, usize, u64), (usize, f64)> = HashMap::new();

    for row in 0..=rows {
        let mut runs: Vec<(usize, usize, f64)> = Vec::new();
        if row < rows {
            let mut col = 0;
            while col < cols {
                let value = unsafe { raster.get_unchecked(row, col) };
                if raster.is_nodata(value) {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < cols && value_key(unsafe { raster.get_unchecked(row, col) }) == value_key(value) {
                    col += 1;
                }
                runs.push((start, col, value));
            }
        }

        let mut still_open = HashMap::with_capacity(runs.len());
        for (col0, col1, value) in runs {
            let key = (col0, col1, value_key(value));
            let first_row = open.remove(&key).map_or(row, |(first, _)| first);
            still_open.insert(key, (first_row, value));
        }

        // Runs that did not continue into this row are finished
        for ((col0, col1, key), (first_row, value)) in open.drain() {
            groups
                .entry(key)
                .or_insert_with(|| (value, Vec::new()))
                .1
                .push(cell_rect(transform, first_row, row, col0, col1));
        }
        open = still_open;
    }

    let mut groups: Vec<(f64, Vec<Polygon<f64>>)> = groups.into_values().collect();
    groups.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut layer = FeatureCollection::new().with_crs(raster.crs().cloned());
    for (value, rects) in groups {
        for polygon in union_all(rects) {
            layer.push(
                Feature::new(Geometry::Polygon(polygon))
                    .with_property(DN_FIELD, AttributeValue::Float(value)),
            );
        }
    }

    Ok(layer)
}
