//! # lakeflat algorithms
//!
//! Raster and vector operations for flattening DEMs over lakes.
//!
//! ## Available Algorithm Categories
//!
//! - **hydrology**: Fill sinks (Planchon-Darboux)
//! - **masking**: Polygon rasterization, clipping, constant surfaces
//! - **mosaic**: Merging aligned rasters
//! - **vector**: Split by attribute, dissolve, difference, outlines, polygonize
//! - **statistics**: Sample statistics, profiles along lines
//! - **lakes**: Elevation policies and per-lake flattening

pub mod hydrology;
pub mod lakes;
pub mod masking;
pub mod mosaic;
pub mod statistics;
pub mod vector;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{fill_sinks, FillSinks, FillSinksParams};
    pub use crate::lakes::{flatten_lake, ElevationEstimate, ElevationPolicy, FlattenLake, FlattenedLake};
    pub use crate::masking::{clip_by_polygon, constant_like, rasterize_mask};
    pub use crate::mosaic::{mosaic, Mosaic};
    pub use crate::statistics::{profile_along_lines, raster_statistics, ProfilePoint, SampleStatistics};
    pub use crate::vector::{
        difference, polygon_outline, polygonize, split_by_field, union_all, LayerPart, DN_FIELD,
    };
    pub use lakeflat_core::prelude::*;
}
