//! Merge rasters that share a grid

use lakeflat_core::raster::Raster;
use lakeflat_core::{Error, Result};

/// Result of a mosaic
#[derive(Debug, Clone)]
pub struct Mosaic {
    /// Merged raster; cells no source covers are NaN
    pub raster: Raster<f64>,
    /// Number of cells written by more than one source
    pub overlapping_cells: usize,
}

/// Merge `sources` into one raster covering their union extent.
///
/// The output uses the grid of the first source. Sources are painted in
/// order and the last valid value wins, so no-data never overwrites data.
/// The CRS is taken from the first source that has one.
///
/// # Errors
/// * `InvalidParameter` when `sources` is empty
/// * `GridMismatch` when a source has a different cell size or is not
///   aligned with the first one
pub fn mosaic(sources: &[&Raster<f64>]) -> Result<Mosaic> {
    let first = sources.first().ok_or_else(|| Error::InvalidParameter {
        name: "sources",
        value: "[]".into(),
        reason: "at least one raster is required".into(),
    })?;
    let base = *first.transform();

    // Offsets of every source, in cells of the base grid
    let mut offsets = Vec::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        if !base.is_aligned_with(source.transform()) {
            return Err(Error::GridMismatch(format!(
                "raster {} ({:?}) is not aligned with raster 0 ({:?})",
                i,
                source.transform(),
                base
            )));
        }
        let (col, row) = base.geo_to_pixel(source.transform().origin_x, source.transform().origin_y);
        offsets.push((row.round() as isize, col.round() as isize));
    }

    let min_row = offsets.iter().map(|o| o.0).min().unwrap_or(0);
    let min_col = offsets.iter().map(|o| o.1).min().unwrap_or(0);
    let max_row = offsets
        .iter()
        .zip(sources)
        .map(|(o, s)| o.0 + s.rows() as isize)
        .max()
        .unwrap_or(0);
    let max_col = offsets
        .iter()
        .zip(sources)
        .map(|(o, s)| o.1 + s.cols() as isize)
        .max()
        .unwrap_or(0);

    let rows = (max_row - min_row) as usize;
    let cols = (max_col - min_col) as usize;

    let mut raster = Raster::filled(rows, cols, f64::NAN);
    raster.set_transform(base.window(min_col, min_row));
    raster.set_crs(sources.iter().find_map(|s| s.crs().cloned()));
    raster.set_nodata(Some(f64::NAN));

    let mut overlapping_cells = 0;
    let out = raster.data_mut();
    for (source, &(row_off, col_off)) in sources.iter().zip(&offsets) {
        let dr = (row_off - min_row) as usize;
        let dc = (col_off - min_col) as usize;

        for ((row, col), &value) in source.data().indexed_iter() {
            if source.is_nodata(value) {
                continue;
            }
            let cell = &mut out[(row + dr, col + dc)];
            if !cell.is_nan() {
                overlapping_cells += 1;
            }
            *cell = value;
        }
    }

    Ok(Mosaic {
        raster,
        overlapping_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeflat_core::{GeoTransform, CRS};

    fn tile(rows: usize, cols: usize, origin: (f64, f64), value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(origin.0, origin.1, 1.0, -1.0));
        r
    }

    #[test]
    fn test_union_extent() {
        let a = tile(2, 2, (0.0, 10.0), 1.0);
        let b = tile(2, 2, (3.0, 7.0), 2.0);

        let merged = mosaic(&[&a, &b]).unwrap();
        let r = &merged.raster;

        assert_eq!(r.shape(), (5, 5));
        assert_eq!(r.transform().origin_x, 0.0);
        assert_eq!(r.transform().origin_y, 10.0);
        assert_eq!(r.get(0, 0).unwrap(), 1.0);
        assert_eq!(r.get(4, 4).unwrap(), 2.0);
        assert!(r.get(0, 4).unwrap().is_nan());
        assert_eq!(merged.overlapping_cells, 0);
    }

    #[test]
    fn test_last_valid_wins() {
        let background = tile(4, 4, (0.0, 4.0), 5.0);
        let mut lake = tile(2, 2, (1.0, 3.0), 8.0);
        lake.set(0, 0, f64::NAN).unwrap();

        let merged = mosaic(&[&background, &lake]).unwrap();
        let r = &merged.raster;

        assert_eq!(r.shape(), (4, 4));
        assert_eq!(r.get(1, 1).unwrap(), 5.0);
        assert_eq!(r.get(1, 2).unwrap(), 8.0);
        assert_eq!(r.get(2, 2).unwrap(), 8.0);
        assert_eq!(merged.overlapping_cells, 3);
    }

    #[test]
    fn test_crs_from_first_source_with_one() {
        let a = tile(1, 1, (0.0, 1.0), 1.0);
        let mut b = tile(1, 1, (1.0, 1.0), 2.0);
        b.set_crs(Some(CRS::from_epsg(32634)));

        let merged = mosaic(&[&a, &b]).unwrap();
        assert_eq!(merged.raster.crs().and_then(|c| c.epsg()), Some(32634));
    }

    #[test]
    fn test_misaligned_sources() {
        let a = tile(2, 2, (0.0, 2.0), 1.0);
        let b = tile(2, 2, (0.5, 2.0), 1.0);
        assert!(matches!(mosaic(&[&a, &b]), Err(Error::GridMismatch(_))));
        assert!(mosaic(&[]).is_err());
    }
}
