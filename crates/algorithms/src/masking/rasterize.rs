//! Polygon rasterization
//!
//! A cell is inside a polygon when its centre is. Each polygon is scanned
//! with the even-odd rule over all of its rings, so holes are left out,
//! and the parts of a multipolygon are combined with OR.

use crate::maybe_rayon::*;
use geo::{MultiPolygon, Polygon};
use lakeflat_core::raster::{GeoTransform, Raster, RasterElement};
use lakeflat_core::{Error, Result};
use ndarray::Array2;

/// A ring edge, stored as its two end points
#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Edge {
    /// X coordinate where the edge crosses the horizontal line `y`.
    /// The lower end point counts as crossing, the upper one does not.
    fn crossing(&self, y: f64) -> Option<f64> {
        if (self.y0 <= y) == (self.y1 <= y) {
            return None;
        }
        let t = (y - self.y0) / (self.y1 - self.y0);
        Some(self.x0 + t * (self.x1 - self.x0))
    }
}

fn polygon_edges(polygon: &Polygon<f64>) -> Vec<Edge> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .flat_map(|ring| {
            ring.lines().map(|line| Edge {
                x0: line.start.x,
                y0: line.start.y,
                x1: line.end.x,
                y1: line.end.y,
            })
        })
        .collect()
}

/// Mark the cells of one row whose centres lie between crossing pairs
fn fill_scanline(line: &mut [u8], edges: &[Edge], y: f64, transform: &GeoTransform) {
    let mut xs: Vec<f64> = edges.iter().filter_map(|e| e.crossing(y)).collect();
    if xs.len() < 2 {
        return;
    }
    xs.sort_by(|a, b| a.total_cmp(b));

    let cols = line.len() as f64;
    let first_col = |x: f64| {
        ((x - transform.origin_x) / transform.pixel_width - 0.5)
            .ceil()
            .clamp(0.0, cols) as usize
    };

    for pair in xs.chunks_exact(2) {
        let start = first_col(pair[0]);
        let end = first_col(pair[1]);
        for cell in &mut line[start..end.max(start)] {
            *cell = 1;
        }
    }
}

/// Burn `polygons` into a 0/1 mask on the grid of `template`.
///
/// The mask has the template's shape, transform and CRS, with 1 for cells
/// whose centre lies inside any polygon.
///
/// # Errors
/// Returns `InvalidParameter` for rotated or south-up grids.
pub fn rasterize_mask<T: RasterElement>(
    template: &Raster<T>,
    polygons: &MultiPolygon<f64>,
) -> Result<Raster<u8>> {
    let transform = *template.transform();
    if !transform.is_north_up() || transform.pixel_width <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "transform",
            value: format!("{:?}", transform),
            reason: "polygon masks need a north-up grid".into(),
        });
    }

    let (rows, cols) = template.shape();
    let parts: Vec<Vec<Edge>> = polygons.0.iter().map(polygon_edges).collect();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut line = vec![0u8; cols];
            let (_, y) = transform.pixel_to_geo(0, row);
            for edges in &parts {
                fill_scanline(&mut line, edges, y, &transform);
            }
            line
        })
        .collect();

    let mut mask = template.with_same_meta::<u8>(0);
    *mask.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn grid(rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, 1.0);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    fn inside(mask: &Raster<u8>) -> usize {
        mask.data().iter().filter(|&&v| v == 1).count()
    }

    #[test]
    fn test_square_on_cell_edges() {
        let template = grid(10, 10);
        // x 3..6, y 4..7 -> rows 3..6, cols 3..6
        let square = polygon![(x: 3.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 7.0), (x: 3.0, y: 7.0)];
        let mask = rasterize_mask(&template, &MultiPolygon(vec![square])).unwrap();

        assert_eq!(inside(&mask), 9);
        for row in 3..6 {
            for col in 3..6 {
                assert_eq!(mask.get(row, col).unwrap(), 1);
            }
        }
        assert_eq!(mask.get(2, 3).unwrap(), 0);
        assert_eq!(mask.get(3, 6).unwrap(), 0);
    }

    #[test]
    fn test_hole_is_excluded() {
        let template = grid(10, 10);
        let ring = polygon![
            exterior: [(x: 1.0, y: 1.0), (x: 9.0, y: 1.0), (x: 9.0, y: 9.0), (x: 1.0, y: 9.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0)]],
        ];
        let mask = rasterize_mask(&template, &MultiPolygon(vec![ring])).unwrap();

        assert_eq!(inside(&mask), 64 - 4);
        assert_eq!(mask.get(4, 4).unwrap(), 0);
        assert_eq!(mask.get(1, 1).unwrap(), 1);
    }

    #[test]
    fn test_parts_are_combined() {
        let template = grid(10, 10);
        let a = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
        let b = polygon![(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)];
        let mask = rasterize_mask(&template, &MultiPolygon(vec![a, b])).unwrap();

        // Overlapping parts must not cancel each other
        assert_eq!(inside(&mask), 7);
        assert_eq!(mask.get(8, 1).unwrap(), 1);
    }

    #[test]
    fn test_polygon_outside_grid() {
        let template = grid(5, 5);
        let far = polygon![(x: 50.0, y: 50.0), (x: 60.0, y: 50.0), (x: 60.0, y: 60.0), (x: 50.0, y: 60.0)];
        let mask = rasterize_mask(&template, &MultiPolygon(vec![far])).unwrap();
        assert_eq!(inside(&mask), 0);
    }

    #[test]
    fn test_triangle_uses_cell_centres() {
        let template = grid(4, 4);
        let tri = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 0.0, y: 4.0)];
        let mask = rasterize_mask(&template, &MultiPolygon(vec![tri])).unwrap();

        // Centres strictly below the diagonal x + y = 4
        assert_eq!(inside(&mask), 6);
        assert_eq!(mask.get(3, 0).unwrap(), 1);
        assert_eq!(mask.get(0, 3).unwrap(), 0);
    }
}
