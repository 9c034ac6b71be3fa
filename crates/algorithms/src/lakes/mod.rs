//! Lake flattening
//!
//! - Policy: how the representative elevation of a lake is chosen
//! - Flatten: clip, estimate and rasterize one lake

mod flatten;
mod policy;

pub use flatten::{flatten_lake, FlattenLake, FlattenedLake};
pub use policy::{ElevationEstimate, ElevationPolicy};
