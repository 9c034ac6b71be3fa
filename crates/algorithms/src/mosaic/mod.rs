//! Mosaicking of aligned rasters
//!
//! - Merge: combine rasters on a common grid into their union extent

mod merge;

pub use merge::{mosaic, Mosaic};
