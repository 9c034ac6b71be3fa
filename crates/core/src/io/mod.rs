//! I/O for rasters (GeoTIFF, world files) and vector layers (GeoJSON)

mod geojson_io;
mod native;
pub mod world_file;

pub use geojson_io::{read_features, read_features_from_str, write_features};
pub use native::{
    read_geotiff, read_geotiff_from_buffer, read_geotiff_typed, write_geotiff,
    write_geotiff_to_buffer, GeoTiffOptions,
};
pub use world_file::{read_world_file, world_file_path, write_world_file};
