//! Raster masking by polygons
//!
//! - Rasterize: burn polygons into a 0/1 mask
//! - Clip: crop a raster to a polygon mask
//! - Constant: fill the valid cells of a raster with one value

mod clip;
mod constant;
mod rasterize;

pub use clip::clip_by_polygon;
pub use constant::constant_like;
pub use rasterize::rasterize_mask;
