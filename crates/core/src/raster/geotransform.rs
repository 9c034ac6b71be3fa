//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Tolerance, in pixels, when deciding whether two grids line up
const ALIGN_TOLERANCE: f64 = 1e-6;

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images the rotations are 0 and `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Build from the six world-file lines `[A, D, B, E, C, F]`.
    ///
    /// World files reference the centre of the upper-left pixel, so the
    /// origin is shifted back by half a pixel.
    pub fn from_world_file(lines: [f64; 6]) -> Self {
        let [a, d, b, e, c, f] = lines;
        Self {
            origin_x: c - 0.5 * a - 0.5 * b,
            origin_y: f - 0.5 * d - 0.5 * e,
            pixel_width: a,
            pixel_height: e,
            row_rotation: b,
            col_rotation: d,
        }
    }

    /// The six world-file lines `[A, D, B, E, C, F]`
    pub fn to_world_file(&self) -> [f64; 6] {
        let (cx, cy) = self.pixel_to_geo(0, 0);
        [
            self.pixel_width,
            self.col_rotation,
            self.row_rotation,
            self.pixel_height,
            cx,
            cy,
        ]
    }

    /// Transform of a window whose upper-left cell is (`col`, `row`) in this grid
    pub fn window(&self, col: isize, row: isize) -> Self {
        let col_f = col as f64;
        let row_f = row as f64;
        Self {
            origin_x: self.origin_x + col_f * self.pixel_width + row_f * self.row_rotation,
            origin_y: self.origin_y + col_f * self.col_rotation + row_f * self.pixel_height,
            ..*self
        }
    }

    /// Convert pixel coordinates to geographic coordinates
    ///
    /// Returns the coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let col_f = col as f64 + 0.5;
        let row_f = row as f64 + 0.5;

        let x = self.origin_x + col_f * self.pixel_width + row_f * self.row_rotation;
        let y = self.origin_y + col_f * self.col_rotation + row_f * self.pixel_height;

        (x, y)
    }

    /// Convert pixel coordinates to geographic coordinates (top-left corner)
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        let col_f = col as f64;
        let row_f = row as f64;

        let x = self.origin_x + col_f * self.pixel_width + row_f * self.row_rotation;
        let y = self.origin_y + col_f * self.col_rotation + row_f * self.pixel_height;

        (x, y)
    }

    /// Convert geographic coordinates to fractional pixel coordinates (col, row)
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Get the cell size (assumes square pixels and no rotation)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Check if this is a north-up image (no rotation)
    pub fn is_north_up(&self) -> bool {
        self.row_rotation.abs() < 1e-10
            && self.col_rotation.abs() < 1e-10
            && self.pixel_height < 0.0
    }

    /// Whether `other` uses the same pixel size and its origin falls on a
    /// cell corner of this grid.
    pub fn is_aligned_with(&self, other: &GeoTransform) -> bool {
        if !self.is_north_up() || !other.is_north_up() {
            return false;
        }
        let same_size = (self.pixel_width - other.pixel_width).abs()
            <= ALIGN_TOLERANCE * self.pixel_width.abs()
            && (self.pixel_height - other.pixel_height).abs()
                <= ALIGN_TOLERANCE * self.pixel_height.abs();
        if !same_size {
            return false;
        }
        let (col, row) = self.geo_to_pixel(other.origin_x, other.origin_y);
        (col - col.round()).abs() < ALIGN_TOLERANCE && (row - row.round()).abs() < ALIGN_TOLERANCE
    }

    /// Calculate the bounding box (min_x, min_y, max_x, max_y) for a raster of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_geo_corner(0, 0);
        let (x1, y1) = self.pixel_to_geo_corner(width, 0);
        let (x2, y2) = self.pixel_to_geo_corner(0, height);
        let (x3, y3) = self.pixel_to_geo_corner(width, height);

        let min_x = x0.min(x1).min(x2).min(x3);
        let max_x = x0.max(x1).max(x2).max(x3);
        let min_y = y0.min(y1).min(y2).min(y3);
        let max_y = y0.max(y1).max(y2).max(y3);

        (min_x, min_y, max_x, max_y)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
