//! Vector operations on lake and area-of-interest layers
//!
//! - Split: one layer per distinct attribute value
//! - Overlay: dissolve (union) and difference of polygon layers
//! - Outline: polygon rings as lines
//! - Polygonize: regions of equal raster value as polygons

mod outline;
mod overlay;
mod polygonize;
mod split;

pub use outline::polygon_outline;
pub use overlay::{difference, union_all};
pub use polygonize::{polygonize, DN_FIELD};
pub use split::{split_by_field, LayerPart};
