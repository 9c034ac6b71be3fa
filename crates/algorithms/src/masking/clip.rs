//! Clip a raster by a polygon mask

use super::rasterize::rasterize_mask;
use geo::{BoundingRect, MultiPolygon};
use lakeflat_core::raster::{Raster, RasterElement};
use lakeflat_core::{Error, Result};

/// Crop `dem` to the extent of `polygons` and blank everything outside them.
///
/// The extent is snapped outwards to the cell edges of `dem`, so the result
/// stays aligned with it. Cells whose centre is outside every polygon, and
/// cells that were already no-data, become NaN; the result's no-data value
/// is NaN.
///
/// # Errors
/// * `Vector` if `polygons` has no coordinates
/// * `Algorithm` if the polygons do not overlap the raster
pub fn clip_by_polygon(dem: &Raster<f64>, polygons: &MultiPolygon<f64>) -> Result<Raster<f64>> {
    let rect = polygons
        .bounding_rect()
        .ok_or_else(|| Error::Vector("mask has no polygons".into()))?;

    let (rows, cols) = dem.shape();
    let (c0, r0) = dem.geo_to_pixel(rect.min().x, rect.max().y);
    let (c1, r1) = dem.geo_to_pixel(rect.max().x, rect.min().y);

    let col_start = c0.min(c1).floor().max(0.0) as usize;
    let row_start = r0.min(r1).floor().max(0.0) as usize;
    let col_end = (c0.max(c1).ceil().max(0.0) as usize).min(cols);
    let row_end = (r0.max(r1).ceil().max(0.0) as usize).min(rows);

    if col_start >= col_end || row_start >= row_end {
        return Err(Error::Algorithm(format!(
            "mask extent ({}, {}, {}, {}) does not overlap the raster",
            rect.min().x,
            rect.min().y,
            rect.max().x,
            rect.max().y
        )));
    }

    let mut clipped = dem.window(row_start, col_start, row_end - row_start, col_end - col_start)?;
    let mask = rasterize_mask(&clipped, polygons)?;
    let nodata = clipped.nodata();

    ndarray::Zip::from(clipped.data_mut())
        .and(mask.data())
        .for_each(|value, &inside| {
            if inside == 0 || value.is_nodata(nodata) {
                *value = f64::NAN;
            }
        });
    clipped.set_nodata(Some(f64::NAN));

    Ok(clipped)
}
