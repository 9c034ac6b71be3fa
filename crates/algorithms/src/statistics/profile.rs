//! Elevation profiles along lines
//!
//! Lines are walked in steps of one cell size, starting at every vertex.
//! Consecutive steps that land in the same cell produce a single sample.
//! Elevations are interpolated bilinearly between cell centres, falling
//! back to the value of the containing cell near no-data or the border.

use geo::{LineString, MultiLineString};
use lakeflat_core::raster::Raster;
use serde::{Deserialize, Serialize};

/// One elevation sample on a line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Index of the line in the input
    pub line: usize,
    /// Distance from the start of the line
    pub distance: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Elevation at (x, y), or `None` outside the grid or on no-data
fn sample(dem: &Raster<f64>, x: f64, y: f64) -> Option<f64> {
    let (row, col) = dem.cell_at(x, y)?;
    let nearest = dem.get(row, col).ok().filter(|&v| !dem.is_nodata(v))?;

    let (fc, fr) = dem.geo_to_pixel(x, y);
    let (u, v) = (fc - 0.5, fr - 0.5);
    let (c0, r0) = (u.floor(), v.floor());
    if c0 < 0.0 || r0 < 0.0 {
        return Some(nearest);
    }
    let (c0, r0) = (c0 as usize, r0 as usize);
    if c0 + 1 >= dem.cols() || r0 + 1 >= dem.rows() {
        return Some(nearest);
    }

    let corners = [
        dem.get(r0, c0).ok(),
        dem.get(r0, c0 + 1).ok(),
        dem.get(r0 + 1, c0).ok(),
        dem.get(r0 + 1, c0 + 1).ok(),
    ];
    let mut z = [0.0; 4];
    for (slot, value) in z.iter_mut().zip(corners) {
        match value {
            Some(v) if !dem.is_nodata(v) => *slot = v,
            _ => return Some(nearest),
        }
    }

    let (tx, ty) = (u - c0 as f64, v - r0 as f64);
    let top = z[0] + (z[1] - z[0]) * tx;
    let bottom = z[2] + (z[3] - z[2]) * tx;
    Some(top + (bottom - top) * ty)
}

/// Parameter range `[t0, t1]` of the segment a..b inside `bounds`
fn clip(a: (f64, f64), b: (f64, f64), bounds: (f64, f64, f64, f64)) -> Option<(f64, f64)> {
    let (min_x, min_y, max_x, max_y) = bounds;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, a.0 - min_x), (dx, max_x - a.0), (-dy, a.1 - min_y), (dy, max_y - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

/// Sample positions along one line: (distance, x, y)
///
/// Only the parts of segments within `bounds` are stepped; distances still
/// count the full length of the line.
fn walk(line: &LineString<f64>, step: f64, bounds: (f64, f64, f64, f64)) -> Vec<(f64, f64, f64)> {
    let coords = &line.0;
    let mut points = Vec::new();
    let mut travelled = 0.0;

    for pair in coords.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = (b.x - a.x).hypot(b.y - a.y);
        if let Some((t0, t1)) = clip((a.x, a.y), (b.x, b.y), bounds) {
            let n = (length / step).ceil().max(1.0);
            let first = (t0 * n).ceil() as usize;
            let last = ((t1 * n).floor() as usize).min(n as usize - 1);
            for k in first..=last {
                let t = k as f64 / n;
                points.push((
                    travelled + t * length,
                    a.x + t * (b.x - a.x),
                    a.y + t * (b.y - a.y),
                ));
            }
        }
        travelled += length;
    }

    // A closed ring ends where it started
    if let Some(last) = coords.last() {
        if !line.is_closed() || coords.len() < 2 {
            points.push((travelled, last.x, last.y));
        }
    }
    points
}

/// Sample `dem` along every line of `lines`.
///
/// Samples outside the grid or on no-data cells are dropped.
pub fn profile_along_lines(dem: &Raster<f64>, lines: &MultiLineString<f64>) -> Vec<ProfilePoint> {
    let step = dem.cell_size();
    let (min_x, min_y, max_x, max_y) = dem.bounds();
    // One cell of margin keeps the steps around the border
    let bounds = (min_x - step, min_y - step, max_x + step, max_y + step);
    let mut profile = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let mut last_cell = None;
        for (distance, x, y) in walk(line, step, bounds) {
            let cell = dem.cell_at(x, y);
            if cell.is_some() && cell == last_cell {
                continue;
            }
            last_cell = cell;

            if let Some(z) = sample(dem, x, y) {
                profile.push(ProfilePoint {
                    line: index,
                    distance,
                    x,
                    y,
                    z,
                });
            }
        }
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lakeflat_core::GeoTransform;

    /// 10x10 grid, 1 unit cells, z = column index
    fn ramp() -> Raster<f64> {
        let values = (0..100).map(|i| (i % 10) as f64).collect();
        let mut dem = Raster::from_vec(values, 10, 10).unwrap();
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        dem
    }

    #[test]
    fn test_bilinear_samples_on_ramp() {
        let line = LineString::from(vec![(2.0, 5.0), (6.0, 5.0)]);
        let profile = profile_along_lines(&ramp(), &MultiLineString(vec![line]));

        let zs: Vec<f64> = profile.iter().map(|p| p.z).collect();
        assert_eq!(zs.len(), 5);
        for (z, expected) in zs.iter().zip([1.5, 2.5, 3.5, 4.5, 5.5]) {
            assert_relative_eq!(*z, expected, epsilon = 1e-9);
        }
        assert_relative_eq!(profile[4].distance, 4.0);
    }

    #[test]
    fn test_points_outside_grid_are_dropped() {
        let line = LineString::from(vec![(-5.0, 5.0), (2.0, 5.0)]);
        let profile = profile_along_lines(&ramp(), &MultiLineString(vec![line]));

        assert_eq!(profile.len(), 3);
        // Nearest-cell fallback at the grid border
        assert_relative_eq!(profile[0].z, 0.0);
    }

    #[test]
    fn test_closed_ring_on_constant_surface() {
        let mut dem = Raster::filled(10, 10, 7.0);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        let ring = LineString::from(vec![(3.0, 3.0), (6.0, 3.0), (6.0, 6.0), (3.0, 6.0), (3.0, 3.0)]);

        let profile = profile_along_lines(&dem, &MultiLineString(vec![ring]));

        assert_eq!(profile.len(), 12);
        assert!(profile.iter().all(|p| (p.z - 7.0).abs() < 1e-12));
        assert!(profile.windows(2).all(|w| w[0].distance < w[1].distance));
    }

    #[test]
    fn test_nodata_cells_are_dropped() {
        let mut dem = ramp();
        dem.set_nodata(Some(-1.0));
        for row in 0..10 {
            dem.set(row, 4, -1.0).unwrap();
        }
        let line = LineString::from(vec![(2.0, 5.0), (6.0, 5.0)]);
        let profile = profile_along_lines(&dem, &MultiLineString(vec![line]));

        assert_eq!(profile.len(), 4);
        assert!(profile.iter().all(|p| p.z != -1.0));
    }

    #[test]
    fn test_segments_off_the_grid_are_not_stepped() {
        // A continental line in grid units: billions of steps if walked in full
        let far = LineString::from(vec![(1.0e9, 1.0e9), (2.0e9, -1.0e9)]);
        assert!(walk(&far, 1.0, (-1.0, -1.0, 11.0, 11.0)).len() <= 1);

        let crossing = LineString::from(vec![(-1.0e9 + 0.5, 5.0), (1.0e9 + 0.5, 5.0)]);
        let profile = profile_along_lines(&ramp(), &MultiLineString(vec![crossing]));
        assert_eq!(profile.len(), 10);
        assert_relative_eq!(profile[0].distance, 1.0e9, epsilon = 1.0);
        assert_relative_eq!(profile[3].z, 3.0, epsilon = 1e-9);
    }
}
